//! Entity extraction over the typed syntax tree.
//!
//! Leaf first: expressions and calls, then assignments, statement bodies,
//! declarations and finally whole files. Import resolution is independent of
//! the rest and only touches the filesystem.

pub mod assignment;
pub mod call;
pub mod declaration;
pub mod expression;
pub mod file;
pub mod import_resolver;
pub mod statement;

pub use assignment::process_assignment;
pub use call::build_call;
pub use declaration::{docstring, function_outputs, DeclarationBuilder};
pub use expression::extract_expression;
pub use file::FileExtractor;
pub use import_resolver::ImportResolver;
pub use statement::StatementWalker;
