//! Structural entities produced by extraction.

mod models;

pub use models::*;
