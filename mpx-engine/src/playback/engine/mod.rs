//! Media engine
//!
//! - `core`: engine handle, builder and submission API
//! - `state`: resources owned by one engine
//! - `lifecycle`: Open / Close / transport / Dispose command bodies

mod core;
mod lifecycle;
mod state;

pub use self::core::{EngineCore, MediaEngine, MediaEngineBuilder};
pub use state::{EngineState, StateSummary};
