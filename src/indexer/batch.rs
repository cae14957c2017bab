use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::ExtractorConfig;
use crate::entities::File;
use crate::error::Result;
use crate::extract::{FileExtractor, ImportResolver};
use crate::languages::LanguageRegistry;

use super::parser::Parser;
use super::progress::ExtractionProgress;
use super::walker::FileWalker;

/// Result of extracting one file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<File>,
}

/// Extracts every Python file under a source root.
///
/// Files are independent: each worker parses with its own parser, and a
/// failure in one file is reported in its [`FileOutcome`] without touching
/// the others.
pub struct ProjectExtractor {
    root: PathBuf,
    config: ExtractorConfig,
    registry: LanguageRegistry,
    progress: ExtractionProgress,
}

impl ProjectExtractor {
    pub fn new(root: impl Into<PathBuf>, config: ExtractorConfig) -> Self {
        Self {
            root: root.into(),
            config,
            registry: crate::REGISTRY.clone(),
            progress: ExtractionProgress::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn progress(&self) -> &ExtractionProgress {
        &self.progress
    }

    /// Source files under the root, honoring the configured excludes.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        self.discover_in(&self.root)
    }

    /// Source files under `dir`, which may be a subdirectory of the root.
    pub fn discover_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let walker = FileWalker::new(self.registry.clone()).with_exclude(self.config.exclude_patterns()?);
        walker.walk_from(&self.root, dir)
    }

    pub fn extract_all(&self) -> Result<Vec<FileOutcome>> {
        self.extract_dir(&self.root)
    }

    /// Extracts the files under `dir`; imports still resolve against the root.
    pub fn extract_dir(&self, dir: &Path) -> Result<Vec<FileOutcome>> {
        let files = self.discover_in(dir)?;
        tracing::info!("Found {} Python files under {}", files.len(), dir.display());
        Ok(self.extract_files(&files))
    }

    /// Outcomes are returned in the order of `files`.
    pub fn extract_files(&self, files: &[PathBuf]) -> Vec<FileOutcome> {
        self.progress.start(files.len());
        let resolver = ImportResolver::new(self.root.clone());

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|path| {
                let parser = Parser::new(self.registry.clone());
                let result = FileExtractor::new(&self.config, &resolver).extract_path(&parser, path);
                match &result {
                    Ok(file) => self.progress.inc(file.entity_count()),
                    Err(e) => {
                        tracing::warn!("Skipping {}: {}", path.display(), e);
                        self.progress.inc_error();
                    }
                }
                FileOutcome {
                    path: path.clone(),
                    result,
                }
            })
            .collect();

        self.progress.finish();
        outcomes
    }

    /// Extracts a single file against this project's root.
    pub fn extract_file(&self, path: &Path) -> Result<File> {
        let resolver = ImportResolver::new(self.root.clone());
        let parser = Parser::new(self.registry.clone());
        FileExtractor::new(&self.config, &resolver).extract_path(&parser, path)
    }
}
