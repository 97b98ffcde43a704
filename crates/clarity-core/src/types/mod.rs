//! Core types for clarity.

mod message;
mod mode;
mod pattern;
mod spiral;

pub use message::*;
pub use mode::*;
pub use pattern::*;
pub use spiral::*;
