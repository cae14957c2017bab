use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::Result;
use crate::languages::LanguageRegistry;

pub struct FileWalker {
    registry: LanguageRegistry,
    exclude: Vec<glob::Pattern>,
}

impl FileWalker {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            exclude: Vec::new(),
        }
    }

    /// Skips files whose path relative to the project root matches any pattern.
    pub fn with_exclude(mut self, patterns: Vec<glob::Pattern>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Supported source files under `root`, sorted by path.
    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        self.walk_from(root, root)
    }

    /// Walks `start` only; exclude patterns still apply relative to `root`.
    pub fn walk_from(&self, root: &Path, start: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(start)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file() && self.is_supported(path) && !self.is_excluded(root, path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.registry.get_for_file(path).is_some()
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.exclude.iter().any(|p| p.matches_path(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_walker() -> FileWalker {
        FileWalker::new(LanguageRegistry::new())
    }

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_walk_finds_python_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "main.py", "run()");
        create_file(temp_dir.path(), "types.pyi", "x: int");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_walk_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "root.py", "");
        create_file(temp_dir.path(), "pkg/__init__.py", "");
        create_file(temp_dir.path(), "pkg/deep/mod.py", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 3);
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_walk_ignores_unsupported_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "main.rs", "fn main() {}");
        create_file(temp_dir.path(), "README.md", "# Readme");
        create_file(temp_dir.path(), "script.py", "print('hello')");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files, vec![temp_dir.path().join("script.py")]);
    }

    #[test]
    fn test_walk_applies_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "app.py", "");
        create_file(temp_dir.path(), "venv/lib/site.py", "");
        create_file(temp_dir.path(), "tests/test_app.py", "");

        let walker = create_walker().with_exclude(vec![
            glob::Pattern::new("venv/**").unwrap(),
            glob::Pattern::new("tests/test_*.py").unwrap(),
        ]);
        let files = walker.walk(temp_dir.path()).unwrap();

        assert_eq!(files, vec![temp_dir.path().join("app.py")]);
    }

    #[test]
    fn test_walk_from_subdirectory_keeps_root_excludes() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "top.py", "");
        create_file(temp_dir.path(), "src/app.py", "");
        create_file(temp_dir.path(), "src/gen/out.py", "");

        let walker = create_walker().with_exclude(vec![glob::Pattern::new("src/gen/**").unwrap()]);
        let files = walker
            .walk_from(temp_dir.path(), &temp_dir.path().join("src"))
            .unwrap();

        assert_eq!(files, vec![temp_dir.path().join("src/app.py")]);
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(create_walker().walk(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_is_supported() {
        let walker = create_walker();
        assert!(walker.is_supported(Path::new("script.py")));
        assert!(walker.is_supported(Path::new("stubs.pyi")));
        assert!(!walker.is_supported(Path::new("main.rs")));
        assert!(!walker.is_supported(Path::new("Makefile")));
    }
}
