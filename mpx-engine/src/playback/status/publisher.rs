//! Change publication for status observers

use super::{PropertySnapshot, Status};
use mpx_common::events::{EventBus, MediaEvent};
use tracing::debug;
use uuid::Uuid;

/// Tracks what observers last saw and publishes only what changed
///
/// A publisher created with `new` carries every property in its first
/// publication; `starting_from` only reports changes after the baseline.
pub struct StatusPublisher {
    engine_id: Uuid,
    published: PropertySnapshot,
}

impl StatusPublisher {
    pub fn new(engine_id: Uuid) -> Self {
        Self {
            engine_id,
            published: PropertySnapshot::new(),
        }
    }

    /// Publisher whose observers already know `baseline`
    pub fn starting_from(engine_id: Uuid, baseline: PropertySnapshot) -> Self {
        Self {
            engine_id,
            published: baseline,
        }
    }

    /// Properties that changed since the last publication, with new values
    pub fn pending_changes(&self, status: &Status) -> PropertySnapshot {
        let mut changes = self.published.clone();
        status.contrast_into(&mut changes);
        changes
    }

    /// Emit a `PropertiesChanged` event for the pending changes
    ///
    /// Returns the number of changed properties (0 means nothing was emitted).
    pub fn publish(&mut self, status: &Status, events: &EventBus) -> usize {
        let changes = self.pending_changes(status);
        if changes.is_empty() {
            return 0;
        }

        for (property, value) in changes.iter() {
            self.published.set(property, value.clone());
        }

        let count = changes.len();
        debug!("Engine {}: publishing {} changed properties", self.engine_id, count);
        events.emit_lossy(MediaEvent::PropertiesChanged {
            engine_id: self.engine_id,
            changes: changes.to_changes(),
            timestamp: mpx_common::time::now(),
        });
        count
    }

    /// Last published values
    pub fn published(&self) -> &PropertySnapshot {
        &self.published
    }
}
