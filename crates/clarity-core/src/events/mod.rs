//! Diagnostic events from pattern loading and matching.
//!
//! The engine reports what it does through a [`MatchObserver`] instead of
//! printing. [`TracingObserver`] is the default and forwards everything to
//! `tracing`; [`RecordingObserver`] keeps events for inspection.

mod observer;

pub use observer::{
    MatchEvent, MatchObserver, NoopObserver, RecordingObserver, SkipReason, TracingObserver,
};
