use std::path::Path;
use std::sync::Arc;

use crate::error::{ExtractError, Result};
use crate::languages::{LanguageGrammar, LanguageRegistry};
use crate::syntax::Module;

pub struct Parser {
    registry: LanguageRegistry,
}

impl Parser {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile> {
        let grammar = self
            .registry
            .get_for_file(path)
            .ok_or_else(|| ExtractError::UnsupportedLanguage(path.display().to_string()))?;

        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }
        let source = std::fs::read_to_string(path)?;
        self.parse_source(&source, grammar)
    }

    pub fn parse_source(&self, source: &str, grammar: Arc<dyn LanguageGrammar>) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::Parse("Failed to parse source".to_string()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
            language: grammar.name().to_string(),
            grammar,
        })
    }

    /// Parses Python source text directly.
    pub fn parse_python(&self, source: &str) -> Result<ParsedFile> {
        let grammar = self
            .registry
            .get_by_name("python")
            .ok_or_else(|| ExtractError::UnsupportedLanguage("python".to_string()))?;
        self.parse_source(source, grammar)
    }

    pub fn get_grammar(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        self.registry.get_for_file(path)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(LanguageRegistry::new())
    }
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub language: String,
    pub grammar: Arc<dyn LanguageGrammar>,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("tree", &self.tree)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }

    pub fn has_errors(&self) -> bool {
        self.root_node().has_error()
    }

    /// The typed syntax tree for this file.
    pub fn module(&self) -> Module {
        self.grammar.lower(&self.root_node(), &self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Constant, Expr, Stmt};

    fn module(source: &str) -> Module {
        Parser::default().parse_python(source).unwrap().module()
    }

    #[test]
    fn test_parse_source_python() {
        let parsed = Parser::default().parse_python("def f():\n    pass\n").unwrap();
        assert_eq!(parsed.language, "python");
        assert_eq!(parsed.root_node().kind(), "module");
        assert!(!parsed.has_errors());
    }

    #[test]
    fn test_parse_source_empty() {
        let parsed = Parser::default().parse_python("").unwrap();
        assert_eq!(parsed.source, "");
        assert!(parsed.module().body.is_empty());
    }

    #[test]
    fn test_parsed_file_node_text() {
        let source = "x = 1\n";
        let parsed = Parser::default().parse_python(source).unwrap();
        assert_eq!(parsed.node_text(&parsed.root_node()), source);
    }

    #[test]
    fn test_get_grammar() {
        let parser = Parser::default();
        assert_eq!(parser.get_grammar(Path::new("script.py")).unwrap().name(), "python");
        assert!(parser.get_grammar(Path::new("main.rs")).is_none());
    }

    #[test]
    fn test_parse_file_unsupported() {
        let err = Parser::default().parse_file(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_parse_file_missing() {
        let err = Parser::default().parse_file(Path::new("/nonexistent/mod.py")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }

    #[test]
    fn test_lower_function_parameters() {
        let m = module("async def f(a, /, b, c=1, *args, d, e: int = 2, **kw):\n    pass\n");
        let Stmt::FunctionDef(def) = &m.body[0] else {
            panic!("expected function");
        };
        assert!(def.is_async);
        assert_eq!(def.params.posonly, vec!["a"]);
        assert_eq!(def.params.args, vec!["b", "c"]);
        assert_eq!(def.params.vararg.as_deref(), Some("args"));
        assert_eq!(def.params.kwonly, vec!["d", "e"]);
        assert_eq!(def.params.kwarg.as_deref(), Some("kw"));
    }

    #[test]
    fn test_lower_chained_assignment() {
        let m = module("a = b = f()\n");
        match &m.body[0] {
            Stmt::Assign { targets, value, line } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(*line, 1);
                assert!(matches!(value, Expr::Call { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lower_elif_chain_nests() {
        let m = module("if a:\n    x()\nelif b:\n    y()\nelse:\n    z()\n");
        let Stmt::If { orelse, .. } = &m.body[0] else {
            panic!("expected if");
        };
        let Stmt::If { orelse: inner, line, .. } = &orelse[0] else {
            panic!("expected nested if");
        };
        assert_eq!(*line, 3);
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_lower_entry_guard_compare() {
        let m = module("if __name__ == \"main\":\n    run()\n");
        let Stmt::If { test, .. } = &m.body[0] else {
            panic!("expected if");
        };
        match test {
            Expr::Compare {
                left,
                ops,
                comparators,
                ..
            } => {
                assert!(matches!(left.as_ref(), Expr::Name { id, .. } if id == "__name__"));
                assert_eq!(ops, &vec!["==".to_string()]);
                assert!(matches!(
                    &comparators[0],
                    Expr::Constant { value: Constant::Str(s), .. } if s == "main"
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lower_fstring() {
        let m = module("x = f\"a {b} c {d.e}\"\n");
        let Stmt::Assign { value, .. } = &m.body[0] else {
            panic!("expected assign");
        };
        let Expr::JoinedStr { values, .. } = value else {
            panic!("expected f-string, got {:?}", value);
        };
        let formatted = values
            .iter()
            .filter(|v| matches!(v, Expr::FormattedValue { .. }))
            .count();
        assert_eq!(formatted, 2);
    }

    #[test]
    fn test_lower_relative_import() {
        let m = module("from ..pkg.sub import a, b as c\nfrom . import d\nimport os.path as p\n");
        match &m.body[0] {
            Stmt::ImportFrom {
                module,
                names,
                level,
                ..
            } => {
                assert_eq!(module.as_deref(), Some("pkg.sub"));
                assert_eq!(*level, 2);
                assert_eq!(names[1].asname.as_deref(), Some("c"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&m.body[1], Stmt::ImportFrom { module: None, level: 1, .. }));
        match &m.body[2] {
            Stmt::Import { names, .. } => {
                assert_eq!(names[0].name, "os.path");
                assert_eq!(names[0].asname.as_deref(), Some("p"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lower_decorated_class_bases() {
        let m = module("@dataclass\nclass A(Base, mod.Other, metaclass=Meta):\n    pass\n");
        let Stmt::ClassDef(class) = &m.body[0] else {
            panic!("expected class");
        };
        assert_eq!(class.name, "A");
        assert_eq!(class.line, 2);
        assert_eq!(class.bases.len(), 2);
        assert_eq!(class.keywords.len(), 1);
        assert_eq!(class.decorators.len(), 1);
    }

    #[test]
    fn test_lower_try_handlers() {
        let m = module(
            "try:\n    a()\nexcept ValueError as e:\n    b()\nelse:\n    c()\nfinally:\n    d()\n",
        );
        match &m.body[0] {
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            } => {
                assert_eq!(body.len(), 1);
                assert_eq!(handlers.len(), 1);
                assert_eq!(handlers[0].name.as_deref(), Some("e"));
                assert_eq!(orelse.len(), 1);
                assert_eq!(finalbody.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lower_unknown_statement_is_other() {
        let m = module("pass\nglobal x\n");
        assert_eq!(m.body[0].kind_name(), "Pass");
        assert_eq!(m.body[1].kind_name(), "Global");
    }
}
