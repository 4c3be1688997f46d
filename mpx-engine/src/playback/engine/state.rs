//! Engine-owned resources
//!
//! `EngineState` is only touched from the command lane (behind the core's
//! mutex). Workers see the block map and render times through shared
//! handles, but only while they run; Close joins them before disposing.

use crate::media::Container;
use crate::playback::status::Status;
use crate::playback::workers::{BlockMap, RenderTimes, Worker};
use mpx_common::{ComponentKind, MediaState};
use std::sync::{Arc, PoisonError};

pub struct EngineState {
    pub(crate) status: Arc<Status>,
    /// Open container; `Some` iff media is open or opening
    pub(crate) container: Option<Box<dyn Container>>,
    /// One buffer per component of the open container
    pub(crate) blocks: BlockMap,
    pub(crate) last_render_time: RenderTimes,
    pub(crate) workers: Vec<Box<dyn Worker>>,
}

impl EngineState {
    pub(crate) fn new(status: Arc<Status>) -> Self {
        Self {
            status,
            container: None,
            blocks: BlockMap::default(),
            last_render_time: RenderTimes::default(),
            workers: Vec::new(),
        }
    }

    pub(crate) fn flush_blocks(&self) {
        let blocks = self.blocks.read().unwrap_or_else(PoisonError::into_inner);
        for buffer in blocks.values() {
            buffer.flush();
        }
    }

    pub(crate) fn clear_render_times(&self) {
        self.last_render_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn summary(&self, is_disposed: bool) -> StateSummary {
        let blocks = self.blocks.read().unwrap_or_else(PoisonError::into_inner);
        let mut block_components: Vec<ComponentKind> = blocks.keys().copied().collect();
        block_components.sort();
        let buffered_blocks = blocks.values().map(|buffer| buffer.len()).sum();
        drop(blocks);

        let mut render_time_components: Vec<ComponentKind> = self
            .last_render_time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        render_time_components.sort();

        StateSummary {
            is_disposed,
            media_state: self.status.media_state(),
            has_container: self.container.is_some(),
            block_components,
            buffered_blocks,
            render_time_components,
            running_workers: self.workers.iter().filter(|w| w.is_running()).count(),
        }
    }
}

/// Comparable view of the engine's owned resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSummary {
    pub is_disposed: bool,
    pub media_state: MediaState,
    pub has_container: bool,
    /// Components with a live block buffer, sorted
    pub block_components: Vec<ComponentKind>,
    pub buffered_blocks: usize,
    /// Components with a recorded render time, sorted
    pub render_time_components: Vec<ComponentKind>,
    pub running_workers: usize,
}

impl StateSummary {
    /// True when no media resources are held
    pub fn is_released(&self) -> bool {
        !self.has_container
            && self.block_components.is_empty()
            && self.render_time_components.is_empty()
            && self.running_workers == 0
    }
}
