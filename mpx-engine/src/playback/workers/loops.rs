//! Default worker loop bodies

use super::{WorkerContext, WorkerLoop};
use mpx_common::{MediaEvent, MediaState};
use std::sync::PoisonError;
use std::time::{Duration, Instant};
use tracing::info;

/// Loop body that only keeps the thread alive
///
/// Stands in for pipeline stages whose work happens outside the engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleLoop;

impl WorkerLoop for IdleLoop {
    fn cycle(&mut self, _context: &WorkerContext) {}
}

/// Tracks how much decoded media is buffered ahead of the render position
///
/// Buffering progress is the smallest look-ahead over all components divided
/// by the buffer cache length target. A change of `is_buffering` is published
/// right away; progress alone waits for the next publication.
#[derive(Debug, Default, Clone, Copy)]
pub struct BufferingMonitor;

impl WorkerLoop for BufferingMonitor {
    fn cycle(&mut self, context: &WorkerContext) {
        let status = &context.status;
        if !status.is_open() || status.is_seeking() {
            return;
        }

        let position = status.position();
        let ahead = {
            let blocks = context.blocks.read().unwrap_or_else(PoisonError::into_inner);
            if blocks.is_empty() {
                return;
            }
            blocks
                .values()
                .map(|buffer| match buffer.range() {
                    Some((_, end)) => end.saturating_sub(position),
                    None => Duration::ZERO,
                })
                .min()
                .unwrap_or(Duration::ZERO)
        };

        let target = status.buffer_cache_length();
        let progress = if target.is_zero() {
            1.0
        } else {
            ahead.as_secs_f64() / target.as_secs_f64()
        };

        status.set_buffering_progress(progress);
        let buffering = status.media_state() == MediaState::Playing && progress < 1.0;
        if buffering != status.is_buffering() {
            status.set_is_buffering(buffering);
            context.publish_status();
        }
    }
}

/// Wall-clock driven render position
///
/// While playing, advances the position by the elapsed time times the speed
/// ratio, stamps every component's last render time, and stops the session
/// when the natural duration is reached. The end of media is published
/// without waiting for a command.
#[derive(Debug, Default)]
pub struct RenderClock {
    last_tick: Option<Instant>,
}

impl RenderClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerLoop for RenderClock {
    fn cycle(&mut self, context: &WorkerContext) {
        let now = Instant::now();
        let elapsed = self.last_tick.map_or(Duration::ZERO, |t| now.duration_since(t));
        self.last_tick = Some(now);

        let status = &context.status;
        if status.is_seeking() || status.media_state() != MediaState::Playing {
            return;
        }

        let ended = status.advance_position(elapsed);
        let position = status.position();

        {
            let blocks = context.blocks.read().unwrap_or_else(PoisonError::into_inner);
            let mut render_times =
                context.render_times.lock().unwrap_or_else(PoisonError::into_inner);
            for kind in blocks.keys() {
                render_times.insert(*kind, position);
            }
        }

        if ended {
            info!("Engine {}: media ended at {:?}", context.engine_id, position);
            context.events.emit_lossy(MediaEvent::MediaEnded {
                engine_id: context.engine_id,
                timestamp: mpx_common::time::now(),
            });
            context.events.emit_lossy(MediaEvent::StateChanged {
                engine_id: context.engine_id,
                old_state: MediaState::Playing,
                new_state: MediaState::Stopped,
                timestamp: mpx_common::time::now(),
            });
            context.publish_status();
        }
    }
}
