//! Lifecycle command bodies
//!
//! Everything here runs on the engine's command lane with the state lock
//! held, so no two commands of one engine ever interleave.

use super::core::EngineCore;
use super::state::EngineState;
use crate::diagnostics::check_for_leaks;
use crate::error::{Error, Result};
use crate::media::{BlockBuffer, MediaInfo};
use crate::playback::command::{
    CommandKind, CommandOutcome, SkipReason, MAX_SPEED_RATIO, MIN_SPEED_RATIO,
};
use crate::playback::workers::WorkerContext;
use mpx_common::time::{duration_to_millis, now};
use mpx_common::{MediaEvent, MediaState};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

impl EngineCore {
    /// Run one command against this engine
    pub(crate) fn execute(&self, kind: &CommandKind) -> Result<CommandOutcome> {
        let mut state = self.lock_state();

        if let Some(reason) = kind.skip_reason(self.is_disposed(), self.status.media_state()) {
            return Ok(CommandOutcome::Skipped(reason));
        }

        match kind {
            CommandKind::Open { source } => self.open(&mut state, source),
            CommandKind::Close => {
                self.close(&mut state);
                Ok(CommandOutcome::Executed)
            }
            CommandKind::Play => self.play(&mut state),
            CommandKind::Pause => Ok(match self.guarded_transition(kind, MediaState::Paused) {
                Some(reason) => CommandOutcome::Skipped(reason),
                None => CommandOutcome::Executed,
            }),
            CommandKind::Stop => self.stop(&mut state),
            CommandKind::Seek { position } => self.seek(&mut state, *position),
            CommandKind::SetSpeed { ratio } => self.set_speed(*ratio),
            CommandKind::Dispose => self.dispose(&mut state),
        }
    }

    /// Move to `new_state` if the phase still admits `kind`
    ///
    /// The render clock ends playback without the state lock, so the phase
    /// is re-checked and written under the status lock.
    fn guarded_transition(&self, kind: &CommandKind, new_state: MediaState) -> Option<SkipReason> {
        match self.status.transition_from(kind.valid_from(), new_state) {
            Ok(old_state) => {
                self.emit_state_change(old_state, new_state);
                None
            }
            Err(current) => {
                debug!("Engine {}: {} overtaken, now {}", self.id, kind, current);
                Some(
                    kind.skip_reason(false, current)
                        .unwrap_or(SkipReason::InvalidState(current)),
                )
            }
        }
    }

    fn emit_state_change(&self, old_state: MediaState, new_state: MediaState) {
        if old_state != new_state {
            debug!("Engine {}: {} -> {}", self.id, old_state, new_state);
            self.emit(MediaEvent::StateChanged {
                engine_id: self.id,
                old_state,
                new_state,
                timestamp: now(),
            });
        }
    }

    // ===== Open =====

    fn open(&self, state: &mut EngineState, source: &str) -> Result<CommandOutcome> {
        let old_state = self.status.begin_opening(source);
        self.emit_state_change(old_state, MediaState::Opening);
        self.emit(MediaEvent::MediaOpening {
            engine_id: self.id,
            source: source.to_string(),
            timestamp: now(),
        });

        match self.acquire_resources(state, source) {
            Ok(info) => {
                let old_state = self.status.finish_opening(MediaState::Stopped);
                self.emit_state_change(old_state, MediaState::Stopped);
                info!(
                    "Engine {} opened {} ({}, {} components)",
                    self.id,
                    source,
                    info.format_name,
                    info.components.len()
                );
                self.emit(MediaEvent::MediaOpened {
                    engine_id: self.id,
                    source: source.to_string(),
                    format: info.format_name.clone(),
                    components: info.component_kinds(),
                    timestamp: now(),
                });
                Ok(CommandOutcome::Executed)
            }
            Err(e) => {
                error!("Engine {} failed to open {}: {}", self.id, source, e);
                self.release_resources(state);
                let old_state = self.status.reset_to_closed();
                self.emit_state_change(old_state, MediaState::Closed);
                self.emit(MediaEvent::MediaFailed {
                    engine_id: self.id,
                    source: source.to_string(),
                    error: e.to_string(),
                    timestamp: now(),
                });
                Err(match e {
                    Error::Open(message) => Error::Open(message),
                    other => Error::Open(format!("{}: {}", source, other)),
                })
            }
        }
    }

    /// Container, block buffers, status metadata and workers, in that order
    fn acquire_resources(&self, state: &mut EngineState, source: &str) -> Result<MediaInfo> {
        let container = self.opener.open(source, &self.registry)?;
        let info = container.info().clone();
        state.container = Some(container);

        {
            let mut blocks = state.blocks.write().unwrap_or_else(PoisonError::into_inner);
            for kind in info.component_kinds() {
                let capacity = self.config.block_capacity(kind);
                blocks.insert(kind, BlockBuffer::new(kind, capacity, &self.registry));
            }
        }

        self.status.apply_media_info(
            info.clone(),
            self.config.buffer_cache_length(),
            self.config.download_cache_length(),
        );

        let context = WorkerContext {
            engine_id: self.id,
            status: Arc::clone(&self.status),
            blocks: Arc::clone(&state.blocks),
            render_times: Arc::clone(&state.last_render_time),
            events: self.events.clone(),
            publisher: Arc::clone(&self.publisher),
            cycle: self.config.worker_cycle(),
        };
        for mut worker in self.worker_factory.create_workers() {
            worker.start(context.clone())?;
            state.workers.push(worker);
        }

        Ok(info)
    }

    // ===== Close =====

    /// Tear down an open session
    ///
    /// Ordering matters: workers are joined before anything they read is
    /// disposed. Disposal failures are logged and teardown continues.
    fn close(&self, state: &mut EngineState) {
        info!("Engine {} closing {:?}", self.id, self.status.source());

        self.release_resources(state);

        let old_state = self.status.reset_to_closed();
        self.emit_state_change(old_state, MediaState::Closed);
        self.emit(MediaEvent::MediaClosed {
            engine_id: self.id,
            timestamp: now(),
        });

        if self.config.leak_check_enabled() {
            check_for_leaks(&self.registry, self.id);
        }
    }

    fn release_resources(&self, state: &mut EngineState) {
        for worker in state.workers.iter_mut() {
            worker.stop();
            debug!("Engine {}: {} worker stopped", self.id, worker.role());
        }
        state.workers.clear();

        if let Some(container) = state.container.as_mut() {
            if let Err(e) = container.dispose() {
                error!("Engine {}: container dispose failed: {}", self.id, e);
            }
        }
        state.container = None;

        {
            let mut blocks = state.blocks.write().unwrap_or_else(PoisonError::into_inner);
            let kinds: Vec<_> = blocks.keys().copied().collect();
            for kind in kinds {
                if let Some(buffer) = blocks.get(&kind) {
                    if let Err(e) = buffer.dispose() {
                        error!("Engine {}: {} block buffer dispose failed: {}", self.id, kind, e);
                    }
                }
                blocks.remove(&kind);
            }
        }

        state.clear_render_times();
    }

    // ===== Transport =====

    fn play(&self, state: &mut EngineState) -> Result<CommandOutcome> {
        if let Some(reason) = self.guarded_transition(&CommandKind::Play, MediaState::Playing) {
            return Ok(CommandOutcome::Skipped(reason));
        }
        // The clock does not advance ended media, so rewinding after the move is safe
        if self.status.has_media_ended() {
            debug!("Engine {}: media ended, rewinding before play", self.id);
            self.rewind(state);
        }
        Ok(CommandOutcome::Executed)
    }

    fn stop(&self, state: &mut EngineState) -> Result<CommandOutcome> {
        // Leave Playing first so the render clock stops advancing
        if let Some(reason) = self.guarded_transition(&CommandKind::Stop, MediaState::Stopped) {
            return Ok(CommandOutcome::Skipped(reason));
        }
        self.rewind(state);
        Ok(CommandOutcome::Executed)
    }

    /// Back to zero with empty buffers; a container seek failure is only logged
    fn rewind(&self, state: &mut EngineState) {
        if self.status.is_seekable() {
            if let Some(container) = state.container.as_mut() {
                if let Err(e) = container.seek(Duration::ZERO) {
                    warn!("Engine {}: rewind seek failed: {}", self.id, e);
                }
            }
        }
        state.flush_blocks();
        state.clear_render_times();
        self.status.set_position(Duration::ZERO);
        self.status.set_has_media_ended(false);
    }

    fn seek(&self, state: &mut EngineState, position: Duration) -> Result<CommandOutcome> {
        if !self.status.is_seekable() {
            return Ok(CommandOutcome::Skipped(SkipReason::NotSeekable));
        }

        let target = match self.status.natural_duration() {
            Some(duration) => position.min(duration),
            None => position,
        };

        self.status.set_is_seeking(true);
        let reached = match state.container.as_mut() {
            Some(container) => container.seek(target),
            None => Err(Error::InvalidState("seek without an open container".to_string())),
        };
        let reached = match reached {
            Ok(reached) => reached,
            Err(e) => {
                self.status.set_is_seeking(false);
                return Err(e);
            }
        };

        state.flush_blocks();
        state.clear_render_times();
        self.status.set_position(reached);
        self.status.set_has_media_ended(false);
        self.status.set_is_seeking(false);

        debug!("Engine {}: seek to {:?} reached {:?}", self.id, target, reached);
        self.emit(MediaEvent::SeekCompleted {
            engine_id: self.id,
            position_ms: duration_to_millis(reached),
            timestamp: now(),
        });
        Ok(CommandOutcome::Executed)
    }

    fn set_speed(&self, ratio: f64) -> Result<CommandOutcome> {
        if !ratio.is_finite() || !(MIN_SPEED_RATIO..=MAX_SPEED_RATIO).contains(&ratio) {
            return Err(Error::InvalidInput(format!(
                "speed ratio {} outside {}..={}",
                ratio, MIN_SPEED_RATIO, MAX_SPEED_RATIO
            )));
        }
        self.status.set_speed_ratio(ratio);
        Ok(CommandOutcome::Executed)
    }

    // ===== Dispose =====

    fn dispose(&self, state: &mut EngineState) -> Result<CommandOutcome> {
        if state.container.is_some() || self.status.media_state().is_open() {
            self.close(state);
        }
        self.disposed.store(true, std::sync::atomic::Ordering::Release);

        info!("Engine {} disposed", self.id);
        self.emit(MediaEvent::EngineDisposed {
            engine_id: self.id,
            timestamp: now(),
        });
        Ok(CommandOutcome::Executed)
    }
}
