//! Playback session: commands, per-engine lane, engine state, status and workers

pub mod command;
pub mod engine;
pub mod queue;
pub mod status;
pub mod workers;

pub use command::{
    Command, CommandKind, CommandOutcome, SkipReason, MAX_SPEED_RATIO, MIN_SPEED_RATIO,
};
pub use engine::{MediaEngine, MediaEngineBuilder, StateSummary};
pub use queue::CommandQueue;
pub use status::{PropertySnapshot, Status, StatusProperty, StatusPublisher};
