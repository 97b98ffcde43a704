//! Pattern loading and matching.
//!
//! - [`parser`] turns the pattern document into [`Pattern`](crate::types::Pattern)s
//! - [`scorer`] scores one narrative against one pattern
//! - [`PatternMatcher`] keeps a time-bounded cache and picks the best match

mod cache;
mod matcher;
pub mod parser;
pub mod scorer;

pub use cache::{PatternCache, PatternSet};
pub use matcher::PatternMatcher;
pub use parser::parse_patterns;
pub use scorer::{score_for, score_pattern, trigger_fires};
