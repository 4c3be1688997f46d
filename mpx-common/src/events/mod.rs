//! Event types for the MPX event system
//!
//! Provides the media session event definitions and the EventBus that
//! carries them to observers (UI bindings, loggers, the CLI).

mod status_types;

pub use status_types::{ComponentKind, MediaState, PropertyValue};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// One changed status property, as published to observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    /// Property name (snake_case, stable)
    pub name: &'static str,
    /// Value after the change
    pub value: PropertyValue,
}

/// Media session events
///
/// Every event carries the id of the engine that produced it, so one bus can
/// be shared by several engines.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum MediaEvent {
    /// Open command admitted; container not yet available
    MediaOpening {
        engine_id: Uuid,
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// Container open, buffers allocated and workers running
    MediaOpened {
        engine_id: Uuid,
        source: String,
        /// Container format short name
        format: String,
        /// Components present in the container
        components: Vec<ComponentKind>,
        timestamp: DateTime<Utc>,
    },

    /// Open command failed; engine is back in the closed state
    MediaFailed {
        engine_id: Uuid,
        source: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Close sequence finished; no native resources remain
    MediaClosed {
        engine_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Playback phase changed
    StateChanged {
        engine_id: Uuid,
        old_state: MediaState,
        new_state: MediaState,
        timestamp: DateTime<Utc>,
    },

    /// Seek command finished
    SeekCompleted {
        engine_id: Uuid,
        position_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Render clock reached the end of the media
    MediaEnded {
        engine_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Status properties that changed since the previous publication
    PropertiesChanged {
        engine_id: Uuid,
        changes: Vec<PropertyChange>,
        timestamp: DateTime<Utc>,
    },

    /// Engine torn down for good; further commands are rejected
    EngineDisposed {
        engine_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl MediaEvent {
    /// Id of the engine that produced the event
    pub fn engine_id(&self) -> Uuid {
        match self {
            MediaEvent::MediaOpening { engine_id, .. }
            | MediaEvent::MediaOpened { engine_id, .. }
            | MediaEvent::MediaFailed { engine_id, .. }
            | MediaEvent::MediaClosed { engine_id, .. }
            | MediaEvent::StateChanged { engine_id, .. }
            | MediaEvent::SeekCompleted { engine_id, .. }
            | MediaEvent::MediaEnded { engine_id, .. }
            | MediaEvent::PropertiesChanged { engine_id, .. }
            | MediaEvent::EngineDisposed { engine_id, .. } => *engine_id,
        }
    }

    /// Short event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::MediaOpening { .. } => "MediaOpening",
            MediaEvent::MediaOpened { .. } => "MediaOpened",
            MediaEvent::MediaFailed { .. } => "MediaFailed",
            MediaEvent::MediaClosed { .. } => "MediaClosed",
            MediaEvent::StateChanged { .. } => "StateChanged",
            MediaEvent::SeekCompleted { .. } => "SeekCompleted",
            MediaEvent::MediaEnded { .. } => "MediaEnded",
            MediaEvent::PropertiesChanged { .. } => "PropertiesChanged",
            MediaEvent::EngineDisposed { .. } => "EngineDisposed",
        }
    }
}

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`:
/// - Non-blocking publish (slow subscribers don't block the command lane)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mpx_common::events::{EventBus, MediaEvent};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(MediaEvent::MediaClosed {
///     engine_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(MediaEvent::MediaClosed { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MediaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MediaEvent,
    ) -> Result<usize, broadcast::error::SendError<MediaEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MediaEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
