//! Per-component decoded block buffer
//!
//! Bounded FIFO of decoded blocks awaiting render. Decode workers push, the
//! render worker reads; both go through the interior lock, so a buffer is
//! shared by reference while it sits in the engine's block map.
//!
//! The backing memory is a native resource from the engine's point of view:
//! it is registered in the `ResourceRegistry` on creation and must be freed
//! with an explicit `dispose()` before the buffer leaves the map.

use crate::diagnostics::{ResourceHandle, ResourceRegistry};
use crate::error::{Error, Result};
use mpx_common::ComponentKind;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// One decoded frame or sample block
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlock {
    /// Presentation start time
    pub start_time: Duration,
    /// Presentation duration
    pub duration: Duration,
    /// Decoded payload
    pub data: Vec<u8>,
}

impl MediaBlock {
    pub fn end_time(&self) -> Duration {
        self.start_time + self.duration
    }
}

/// Bounded decoded-block store for one component
pub struct BlockBuffer {
    kind: ComponentKind,
    capacity: usize,
    blocks: Mutex<VecDeque<MediaBlock>>,
    handle: Mutex<Option<ResourceHandle>>,
    disposed: AtomicBool,
}

impl BlockBuffer {
    /// Allocation-site tag used in the resource registry
    pub fn allocation_site(kind: ComponentKind) -> String {
        format!("block_buffer.{}", kind)
    }

    /// Create a buffer holding at most `capacity` blocks
    pub fn new(kind: ComponentKind, capacity: usize, registry: &ResourceRegistry) -> Self {
        let capacity = capacity.max(1);
        Self {
            kind,
            capacity,
            blocks: Mutex::new(VecDeque::with_capacity(capacity)),
            handle: Mutex::new(Some(registry.track(Self::allocation_site(kind)))),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a block, evicting the oldest one when full
    ///
    /// Returns the evicted block, if any.
    pub fn push(&self, block: MediaBlock) -> Result<Option<MediaBlock>> {
        self.ensure_live()?;
        let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        let evicted = if blocks.len() >= self.capacity {
            blocks.pop_front()
        } else {
            None
        };
        blocks.push_back(block);
        Ok(evicted)
    }

    /// Remove and return the oldest block
    pub fn pop(&self) -> Option<MediaBlock> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
    }

    /// Copy of the block covering `position`, if buffered
    pub fn block_at(&self, position: Duration) -> Option<MediaBlock> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|b| b.start_time <= position && position < b.end_time())
            .cloned()
    }

    /// Buffered time range `(start, end)`, `None` when empty
    pub fn range(&self) -> Option<(Duration, Duration)> {
        let blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        let first = blocks.front()?;
        let last = blocks.back()?;
        Some((first.start_time, last.end_time()))
    }

    pub fn len(&self) -> usize {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Drop all buffered blocks, keeping the backing allocation
    pub fn flush(&self) {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Release the backing memory. Valid at most once.
    pub fn dispose(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Err(Error::BlockBuffer(format!("{} buffer already disposed", self.kind)));
        }

        {
            let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
            blocks.clear();
            blocks.shrink_to_fit();
        }

        if let Some(handle) = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.release();
        }
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(Error::BlockBuffer(format!("{} buffer used after dispose", self.kind)))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for BlockBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockBuffer")
            .field("kind", &self.kind)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
