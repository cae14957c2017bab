pub mod python;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::syntax::Module;

pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    /// Lowers a concrete tree produced by this grammar into the typed syntax tree.
    fn lower(&self, root: &tree_sitter::Node, source: &str) -> Module;
}

#[derive(Clone)]
pub struct LanguageRegistry {
    languages: HashMap<String, Arc<dyn LanguageGrammar>>,
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            languages: HashMap::new(),
            extension_map: HashMap::new(),
        };

        registry.register(Arc::new(python::PythonGrammar));

        registry
    }

    pub fn register(&mut self, grammar: Arc<dyn LanguageGrammar>) {
        let name = grammar.name().to_string();
        for ext in grammar.file_extensions() {
            self.extension_map.insert(ext.to_string(), name.clone());
        }
        self.languages.insert(name, grammar);
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.languages.get(name).cloned()
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.extension_map
            .get(ext)
            .and_then(|name| self.languages.get(name))
            .cloned()
    }

    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extension_map.keys().map(|s| s.as_str()).collect()
    }

    pub fn supported_languages(&self) -> Vec<&str> {
        self.languages.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
