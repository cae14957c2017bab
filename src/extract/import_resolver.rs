//! Filesystem resolution of Python import statements.
//!
//! Resolution is read-only and conservative: an import either maps to an
//! existing package directory or `.py` file under the source root, or it is
//! recorded as unresolved. Nothing is guessed.

use std::path::{Component, Path, PathBuf};

use crate::entities::{ImportRecord, ImportedName};
use crate::syntax::{Alias, Stmt};

const SOURCE_SUFFIX: &str = "py";

/// Resolves dotted module paths against a fixed source root.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    root: PathBuf,
}

impl ImportResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Import records for one `import` / `from ... import` statement in `file`.
    /// Other statements yield nothing.
    pub fn resolve_statement(&self, stmt: &Stmt, file: &Path) -> Vec<ImportRecord> {
        match stmt {
            Stmt::ImportFrom {
                module,
                names,
                level,
                ..
            } => {
                let dotted = if *level > 0 {
                    self.relative_module(file, module.as_deref(), *level)
                } else {
                    module.clone().unwrap_or_default()
                };
                let shown = format!("{}{}", ".".repeat(*level), module.as_deref().unwrap_or(""));
                vec![self.record(&dotted, shown, imported_names(names))]
            }
            Stmt::Import { names, .. } => names
                .iter()
                .map(|alias| self.record(&alias.name, alias.name.clone(), imported_names(std::slice::from_ref(alias))))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn record(&self, dotted: &str, shown: String, names: Vec<ImportedName>) -> ImportRecord {
        match self.resolve_module(dotted) {
            Some(path) => ImportRecord::Resolved { path, names },
            None => {
                tracing::debug!("Unresolved import '{}' under {}", shown, self.root.display());
                ImportRecord::Unresolved { module: shown, names }
            }
        }
    }

    /// Dotted path of a relative import: the file's location (relative to the
    /// root when possible) with `level` trailing segments removed, then `module`.
    pub fn relative_module(&self, file: &Path, module: Option<&str>, level: usize) -> String {
        let relative = file.strip_prefix(&self.root).unwrap_or(file);
        let mut parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        parts.truncate(parts.len().saturating_sub(level));
        parts.push(module.unwrap_or("").to_string());
        parts.join(".")
    }

    /// Maps a dotted module path to a package directory or source file.
    pub fn resolve_module(&self, dotted: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
        let segments = &segments[self.absorbed_prefix(&segments)..];
        let (last, intermediate) = segments.split_last()?;

        let mut candidate = self.root.clone();
        for segment in intermediate {
            candidate.push(segment);
            if !candidate.is_dir() {
                return None;
            }
        }

        candidate.push(last);
        if candidate.is_dir() {
            return Some(candidate);
        }
        candidate.set_extension(SOURCE_SUFFIX);
        candidate.is_file().then_some(candidate)
    }

    /// Number of leading segments that already name the root's trailing
    /// directories (`proj.pkg.mod` under `/work/proj`).
    fn absorbed_prefix(&self, segments: &[&str]) -> usize {
        let root: Vec<String> = self
            .root
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        // Leave at least one segment to resolve.
        let max = root.len().min(segments.len().saturating_sub(1));
        (1..=max)
            .rev()
            .find(|&k| {
                root[root.len() - k..]
                    .iter()
                    .zip(&segments[..k])
                    .all(|(r, s)| r == s)
            })
            .unwrap_or(0)
    }
}

fn imported_names(aliases: &[Alias]) -> Vec<ImportedName> {
    aliases
        .iter()
        .map(|a| ImportedName {
            name: a.name.clone(),
            alias: a.asname.clone(),
        })
        .collect()
}
