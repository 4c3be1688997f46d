//! Status read-model
//!
//! `Status` exposes the externally observable playback properties. Most of
//! them are derived from the `MediaInfo` captured when a container opens; a
//! few are set directly by commands and workers (buffering progress, cache
//! length targets, seeking and ended flags).
//!
//! Every container-derived property falls back to its default (empty text,
//! zero, `false`, `None`) while no container is open or while one is still
//! opening.
//!
//! `is_seeking` lives outside the field lock as an atomic because workers
//! and the command lane touch it from different threads.

mod properties;
mod publisher;
mod snapshot;

pub use properties::{StatusProperty, PROPERTY_COUNT};
pub use publisher::StatusPublisher;
pub use snapshot::PropertySnapshot;

use crate::media::{AudioParams, ComponentInfo, MediaInfo, VideoParams};
use mpx_common::{ComponentKind, MediaState, PropertyValue};
use properties::ACCESSORS;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Speed ratio of a freshly opened or closed session
pub const DEFAULT_SPEED_RATIO: f64 = 1.0;

#[derive(Debug, Clone)]
struct StatusFields {
    source: Option<String>,
    media_state: MediaState,
    position: Duration,
    is_opening: bool,
    has_media_ended: bool,
    speed_ratio: f64,
    media: Option<MediaInfo>,
    buffering_progress: f64,
    download_progress: f64,
    is_buffering: bool,
    buffer_cache_length: Duration,
    download_cache_length: Duration,
}

impl Default for StatusFields {
    fn default() -> Self {
        Self {
            source: None,
            media_state: MediaState::Closed,
            position: Duration::ZERO,
            is_opening: false,
            has_media_ended: false,
            speed_ratio: DEFAULT_SPEED_RATIO,
            media: None,
            buffering_progress: 0.0,
            download_progress: 0.0,
            is_buffering: false,
            buffer_cache_length: Duration::ZERO,
            download_cache_length: Duration::ZERO,
        }
    }
}

/// Consistent view of all status inputs, taken under one read lock
pub(crate) struct StatusReading<'a> {
    fields: &'a StatusFields,
    is_seeking: bool,
}

impl StatusReading<'_> {
    /// Media info, hidden while the open is still in progress
    fn media(&self) -> Option<&MediaInfo> {
        if self.fields.is_opening {
            None
        } else {
            self.fields.media.as_ref()
        }
    }

    fn is_open(&self) -> bool {
        self.media().is_some()
    }

    fn component(&self, kind: ComponentKind) -> Option<&ComponentInfo> {
        self.media().and_then(|m| m.component(kind))
    }

    fn video(&self) -> Option<&VideoParams> {
        self.component(ComponentKind::Video).and_then(|c| c.video.as_ref())
    }

    fn audio(&self) -> Option<&AudioParams> {
        self.component(ComponentKind::Audio).and_then(|c| c.audio.as_ref())
    }
}

/// Read-model of one engine's observable playback state
pub struct Status {
    fields: RwLock<StatusFields>,
    is_seeking: AtomicBool,
    /// Working set for `contrast_into`
    scratch: Mutex<PropertySnapshot>,
}

impl Status {
    /// New status in the closed state
    pub fn new() -> Self {
        Self {
            fields: RwLock::new(StatusFields::default()),
            is_seeking: AtomicBool::new(false),
            scratch: Mutex::new(PropertySnapshot::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StatusFields> {
        self.fields.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StatusFields> {
        self.fields.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Snapshot / diff =====

    /// Write the current value of every property into `target`
    pub fn take_snapshot_into(&self, target: &mut PropertySnapshot) {
        let fields = self.read();
        let reading = StatusReading {
            fields: &fields,
            is_seeking: self.is_seeking(),
        };
        for (property, accessor) in ACCESSORS.iter() {
            target.set(*property, accessor(&reading));
        }
    }

    /// Reduce `target` to the properties that differ from the current state
    ///
    /// `target` is expected to hold a previous snapshot. Afterwards, every
    /// property whose value is unchanged has been removed, and every property
    /// that changed (or was missing) holds its current value.
    pub fn contrast_into(&self, target: &mut PropertySnapshot) {
        let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        self.take_snapshot_into(&mut scratch);

        for (property, current) in scratch.iter() {
            if target.get(property) == Some(current) {
                target.remove(property);
            } else {
                target.set(property, current.clone());
            }
        }
    }

    /// Full snapshot as a new table
    pub fn snapshot(&self) -> PropertySnapshot {
        let mut snapshot = PropertySnapshot::new();
        self.take_snapshot_into(&mut snapshot);
        snapshot
    }

    /// Current value of a single property
    pub fn get(&self, property: StatusProperty) -> PropertyValue {
        let fields = self.read();
        let reading = StatusReading {
            fields: &fields,
            is_seeking: self.is_seeking(),
        };
        (ACCESSORS[property.index()].1)(&reading)
    }

    // ===== Accessors =====

    pub fn source(&self) -> Option<String> {
        self.read().source.clone()
    }

    pub fn media_state(&self) -> MediaState {
        self.read().media_state
    }

    pub fn position(&self) -> Duration {
        self.read().position
    }

    /// Container open and usable (not while opening)
    pub fn is_open(&self) -> bool {
        let fields = self.read();
        fields.media.is_some() && !fields.is_opening
    }

    pub fn is_opening(&self) -> bool {
        self.read().is_opening
    }

    pub fn is_seeking(&self) -> bool {
        self.is_seeking.load(Ordering::Acquire)
    }

    pub fn has_media_ended(&self) -> bool {
        self.read().has_media_ended
    }

    pub fn speed_ratio(&self) -> f64 {
        self.read().speed_ratio
    }

    pub fn buffering_progress(&self) -> f64 {
        self.read().buffering_progress
    }

    pub fn download_progress(&self) -> f64 {
        self.read().download_progress
    }

    pub fn is_buffering(&self) -> bool {
        self.read().is_buffering
    }

    pub fn buffer_cache_length(&self) -> Duration {
        self.read().buffer_cache_length
    }

    pub fn download_cache_length(&self) -> Duration {
        self.read().download_cache_length
    }

    /// Metadata of the open container
    pub fn media_info(&self) -> Option<MediaInfo> {
        let fields = self.read();
        if fields.is_opening {
            None
        } else {
            fields.media.clone()
        }
    }

    pub fn natural_duration(&self) -> Option<Duration> {
        let fields = self.read();
        fields.media.as_ref().and_then(|m| m.duration)
    }

    pub fn is_seekable(&self) -> bool {
        self.is_open() && self.read().media.as_ref().is_some_and(|m| m.is_seekable)
    }

    // ===== Worker-visible setters =====

    /// Publish the seeking flag (release store)
    pub fn set_is_seeking(&self, value: bool) {
        self.is_seeking.store(value, Ordering::Release);
    }

    /// Set buffering progress, clamped to `[0, 1]`
    pub fn set_buffering_progress(&self, value: f64) {
        self.write().buffering_progress = clamp_fraction(value);
    }

    /// Set download progress, clamped to `[0, 1]`
    pub fn set_download_progress(&self, value: f64) {
        self.write().download_progress = clamp_fraction(value);
    }

    pub fn set_is_buffering(&self, value: bool) {
        self.write().is_buffering = value;
    }

    pub fn set_position(&self, position: Duration) {
        self.write().position = position;
    }

    pub fn set_has_media_ended(&self, value: bool) {
        self.write().has_media_ended = value;
    }

    /// Advance the position by `elapsed` while playing
    ///
    /// At the natural duration the position is clamped, the media is marked
    /// ended and the phase moves from `Playing` to `Stopped`, all under one
    /// lock. Returns whether the end was reached by this call.
    pub fn advance_position(&self, elapsed: Duration) -> bool {
        let mut fields = self.write();
        if fields.media_state != MediaState::Playing || fields.has_media_ended {
            return false;
        }

        let mut position = fields.position + elapsed.mul_f64(fields.speed_ratio.max(0.0));
        let duration = fields.media.as_ref().and_then(|m| m.duration);
        let ended = matches!(duration, Some(d) if position >= d);
        if let (true, Some(d)) = (ended, duration) {
            position = d;
            fields.has_media_ended = true;
            fields.media_state = MediaState::Stopped;
        }
        fields.position = position;
        ended
    }

    // ===== Command-side mutations =====

    /// Replace the playback phase, returning the previous one
    #[cfg(test)]
    pub(crate) fn set_media_state(&self, state: MediaState) -> MediaState {
        std::mem::replace(&mut self.write().media_state, state)
    }

    /// Move to `state` only if the current phase is in `from`
    ///
    /// Check and write happen under one lock. Returns the previous phase,
    /// or the current one when the move is not allowed.
    pub(crate) fn transition_from(
        &self,
        from: &[MediaState],
        state: MediaState,
    ) -> Result<MediaState, MediaState> {
        let mut fields = self.write();
        if !from.contains(&fields.media_state) {
            return Err(fields.media_state);
        }
        Ok(std::mem::replace(&mut fields.media_state, state))
    }

    pub(crate) fn set_speed_ratio(&self, ratio: f64) {
        self.write().speed_ratio = ratio;
    }

    /// Enter the opening phase for `source`
    pub(crate) fn begin_opening(&self, source: &str) -> MediaState {
        let mut fields = self.write();
        fields.source = Some(source.to_string());
        fields.is_opening = true;
        std::mem::replace(&mut fields.media_state, MediaState::Opening)
    }

    /// Capture container metadata and cache-length targets
    pub(crate) fn apply_media_info(
        &self,
        info: MediaInfo,
        buffer_cache: Duration,
        download_cache: Duration,
    ) {
        let mut fields = self.write();
        fields.media = Some(info);
        fields.buffer_cache_length = buffer_cache;
        fields.download_cache_length = download_cache;
        fields.position = Duration::ZERO;
        fields.has_media_ended = false;
    }

    /// Leave the opening phase in `state`
    pub(crate) fn finish_opening(&self, state: MediaState) -> MediaState {
        let mut fields = self.write();
        fields.is_opening = false;
        std::mem::replace(&mut fields.media_state, state)
    }

    /// Restore every field to its closed default, returning the previous phase
    pub(crate) fn reset_to_closed(&self) -> MediaState {
        let previous = {
            let mut fields = self.write();
            std::mem::take(&mut *fields).media_state
        };
        self.set_is_seeking(false);
        previous
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Status")
            .field("fields", &*self.read())
            .field("is_seeking", &self.is_seeking())
            .finish()
    }
}

fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
