//! Typed syntax tree and the tree-sitter lowering that produces it.

pub mod ast;
pub mod lower;

pub use ast::{
    Alias, ClassDef, ComprehensionKind, Constant, ExceptHandler, Expr, FunctionDef, Keyword,
    Module, Parameters, Stmt,
};
pub use lower::Lowerer;
