use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    /// A call whose callee has a shape the front end should never produce.
    #[error("Unexpected callee node `{kind}` at line {line}")]
    UnexpectedCallee { kind: String, line: usize },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
