//! Inkframe — session core for a creative-writing studio.
//!
//! Holds the session state model and its mutation contracts (the store)
//! plus the data-shaping algorithms around it: mock scene generation,
//! sentence-level emotion analysis, bounded feedback-round history, and
//! story-bundle export. The "AI" operations are randomized placeholders
//! behind strategy traits, so a real inference backend can satisfy the
//! same contracts without touching the store.

pub mod core;
pub mod schema;

pub use crate::core::store::{SessionHandle, SessionState, FEEDBACK_HISTORY_LIMIT};
