//! Assembles the [`File`] entity for one source unit.

use std::path::Path;

use crate::config::ExtractorConfig;
use crate::entities::File;
use crate::error::Result;
use crate::indexer::Parser;
use crate::syntax::{Expr, Module, Stmt};

use super::declaration::DeclarationBuilder;
use super::import_resolver::ImportResolver;
use super::statement::StatementWalker;

pub struct FileExtractor<'a> {
    config: &'a ExtractorConfig,
    resolver: &'a ImportResolver,
}

impl<'a> FileExtractor<'a> {
    pub fn new(config: &'a ExtractorConfig, resolver: &'a ImportResolver) -> Self {
        Self { config, resolver }
    }

    /// Reads, parses and extracts the file at `path`.
    pub fn extract_path(&self, parser: &Parser, path: &Path) -> Result<File> {
        let parsed = parser.parse_file(path)?;
        if parsed.has_errors() {
            tracing::debug!("{} has syntax errors, extracting what parsed", path.display());
        }
        self.extract_module(path, &parsed.module())
    }

    pub fn extract_source(&self, parser: &Parser, path: &Path, source: &str) -> Result<File> {
        let parsed = parser.parse_python(source)?;
        self.extract_module(path, &parsed.module())
    }

    pub fn extract_module(&self, path: &Path, module: &Module) -> Result<File> {
        let declarations = DeclarationBuilder::new(self.config);

        let mut functions = Vec::new();
        let mut classes = Vec::new();
        let mut imports = Vec::new();
        let mut constants = Vec::new();
        let mut gaps = Vec::new();

        for stmt in &module.body {
            match stmt {
                Stmt::FunctionDef(def) => functions.push(declarations.build_function(def)?),
                Stmt::ClassDef(def) => {
                    let (class, class_gaps) = declarations.build_class(def)?;
                    classes.push(class);
                    gaps.extend(class_gaps);
                }
                Stmt::Import { .. } | Stmt::ImportFrom { .. } => {
                    imports.extend(self.resolver.resolve_statement(stmt, path));
                }
                Stmt::Assign { targets, .. } => {
                    for target in targets {
                        if let Expr::Name { id, .. } = target {
                            constants.push(id.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        // Declarations and imports are not process entities, so the walker
        // can take the whole top level.
        let process = StatementWalker::new(self.config).walk(&module.body, true)?;

        let file = File {
            path: path.to_path_buf(),
            process,
            functions,
            classes,
            constants,
            imports,
            gaps,
        };
        tracing::debug!(
            "Extracted {}: {} functions, {} classes, {} imports",
            path.display(),
            file.functions.len(),
            file.classes.len(),
            file.imports.len()
        );
        Ok(file)
    }
}
