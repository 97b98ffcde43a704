//! Reframe decision flow.
//!
//! Given a spiral, a [`PatternMode`](crate::types::PatternMode) and a match
//! threshold, decide between serving a stored reframe and asking the
//! generation service for a fresh one.

mod flow;

pub use flow::{ReframeDecisionFlow, KNOWN_PATTERNS_HEADING};
