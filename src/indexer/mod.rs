pub mod batch;
pub mod parser;
pub mod progress;
pub mod walker;

pub use batch::{FileOutcome, ProjectExtractor};
pub use parser::{ParsedFile, Parser};
pub use progress::{ExtractionProgress, ProgressSnapshot};
pub use walker::FileWalker;
