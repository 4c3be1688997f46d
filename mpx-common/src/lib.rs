//! # MPX Common Library
//!
//! Shared code for the MPX media session engine:
//! - Error type
//! - Event types (MediaEvent enum) and the EventBus
//! - Status value types (MediaState, PropertyValue, ComponentKind)
//! - Configuration file resolution
//! - Time and timecode helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{ComponentKind, EventBus, MediaEvent, MediaState, PropertyValue};
