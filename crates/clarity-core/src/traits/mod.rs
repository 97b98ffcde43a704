//! Core traits for clarity collaborators.

mod document_source;
mod llm;

pub use document_source::*;
pub use llm::*;
