pub mod config;
pub mod entities;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod languages;
pub mod syntax;

use once_cell::sync::Lazy;

pub use config::ExtractorConfig;
pub use entities::{
    Call, Class, ConditionKind, CoverageGap, Entity, File, Function, ImportRecord, ImportedName,
    LogicStatement, Output, Receiver, Reference, SymbolRef, Target, Variable,
};
pub use error::{ExtractError, Result};
pub use extract::{FileExtractor, ImportResolver};
pub use indexer::{ExtractionProgress, FileOutcome, FileWalker, Parser, ProjectExtractor};
pub use languages::LanguageRegistry;

/// Global language registry instance (lazily initialized)
pub static REGISTRY: Lazy<LanguageRegistry> = Lazy::new(LanguageRegistry::new);
