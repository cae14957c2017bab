//! Import statements resolved against a real source tree on disk.

use std::fs;
use std::path::Path;

use py_entities::{ExtractorConfig, FileExtractor, ImportRecord, ImportResolver, Parser};
use tempfile::TempDir;

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(dir.path(), "pkg/sub.py", "def helper():\n    pass\n");
    write(
        dir.path(),
        "pkg/mod.py",
        "from .sub import helper\nfrom . import sub as s\nfrom .missing import thing\nimport os, pkg.sub\nfrom pkg.sub import helper as h\n",
    );
    write(dir.path(), "pkg/nested/deep.py", "from ..sub import helper\n");
    dir
}

fn imports_of(root: &Path, relative: &str) -> Vec<ImportRecord> {
    let config = ExtractorConfig::default();
    let resolver = ImportResolver::new(root);
    let file = FileExtractor::new(&config, &resolver)
        .extract_path(&Parser::default(), &root.join(relative))
        .unwrap();
    file.imports
}

#[test]
fn test_relative_sibling_import_resolves_to_file() {
    let dir = project();
    let imports = imports_of(dir.path(), "pkg/mod.py");

    match &imports[0] {
        ImportRecord::Resolved { path, names } => {
            assert_eq!(path, &dir.path().join("pkg/sub.py"));
            assert_eq!(names[0].name, "helper");
            assert!(names[0].alias.is_none());
        }
        other => panic!("expected resolved import, got {:?}", other),
    }
}

#[test]
fn test_relative_package_import_resolves_to_directory() {
    let dir = project();
    let imports = imports_of(dir.path(), "pkg/mod.py");

    match &imports[1] {
        ImportRecord::Resolved { path, names } => {
            assert_eq!(path, &dir.path().join("pkg"));
            assert_eq!(names[0].alias.as_deref(), Some("s"));
        }
        other => panic!("expected resolved import, got {:?}", other),
    }
}

#[test]
fn test_missing_module_is_kept_as_unresolved() {
    let dir = project();
    let imports = imports_of(dir.path(), "pkg/mod.py");

    assert!(matches!(
        &imports[2],
        ImportRecord::Unresolved { module, names } if module == ".missing" && names[0].name == "thing"
    ));
}

#[test]
fn test_plain_import_resolves_names_independently() {
    let dir = project();
    let imports = imports_of(dir.path(), "pkg/mod.py");

    assert!(matches!(&imports[3], ImportRecord::Unresolved { module, .. } if module == "os"));
    assert!(matches!(&imports[4], ImportRecord::Resolved { path, .. } if path == &dir.path().join("pkg/sub.py")));
    assert!(matches!(
        &imports[5],
        ImportRecord::Resolved { names, .. } if names[0].alias.as_deref() == Some("h")
    ));
    assert_eq!(imports.len(), 6);
}

#[test]
fn test_two_levels_up() {
    let dir = project();
    let imports = imports_of(dir.path(), "pkg/nested/deep.py");
    assert!(matches!(&imports[0], ImportRecord::Resolved { path, .. } if path == &dir.path().join("pkg/sub.py")));
}

#[test]
fn test_resolution_never_writes() {
    let dir = project();
    let before: Vec<_> = walk(dir.path());
    let _ = imports_of(dir.path(), "pkg/mod.py");
    assert_eq!(before, walk(dir.path()));
}

fn walk(root: &Path) -> Vec<std::path::PathBuf> {
    let mut entries = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            entries.push(path);
        }
    }
    entries.sort();
    entries
}
