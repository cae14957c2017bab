use super::LanguageGrammar;
use crate::syntax::{Lowerer, Module};

pub struct PythonGrammar;

impl LanguageGrammar for PythonGrammar {
    fn name(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["py", "pyi"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn lower(&self, root: &tree_sitter::Node, source: &str) -> Module {
        Lowerer::new(source).lower_module(root)
    }
}
