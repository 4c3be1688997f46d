//! mpx Media Engine Library
//!
//! Serializes lifecycle commands per engine and keeps a property-level
//! status read-model that can be snapshotted and diffed.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod media;
pub mod playback;

pub use config::EngineConfig;
pub use diagnostics::{leak_report, ResourceRegistry};
pub use error::{Error, Result};
pub use playback::{
    CommandKind, CommandOutcome, MediaEngine, MediaEngineBuilder, PropertySnapshot, SkipReason,
    StateSummary, Status, StatusProperty,
};
