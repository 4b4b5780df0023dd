//! Spoken mock-interview session engine.
//!
//! The orchestrator asks a candidate a fetched sequence of questions aloud,
//! captures each spoken answer, scores it through an external evaluator,
//! and aggregates the feedback. Speech devices, the evaluator and the
//! question source are all injected behind port traits, so whole sessions
//! run deterministically in tests with fake ports.

pub mod evaluator;
pub mod event;
mod machine;
pub mod orchestrator;
pub mod ports;
pub mod questions;
pub mod report;
pub mod session;
