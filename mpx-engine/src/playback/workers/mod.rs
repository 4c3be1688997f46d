//! Background workers (read / decode / render)
//!
//! The engine only relies on the start/stop contract: `stop()` blocks until
//! the worker thread has exited and will not touch the block buffers again.
//! The concrete loop bodies are pluggable through `WorkerLoop`.

mod loops;
mod thread_worker;

pub use loops::{BufferingMonitor, IdleLoop, RenderClock};
pub use thread_worker::{ThreadWorker, WorkerLoop};

use crate::error::Result;
use crate::media::BlockBuffer;
use crate::playback::status::{Status, StatusPublisher};
use mpx_common::{ComponentKind, EventBus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// Per-component decoded block buffers, shared with the workers
pub type BlockMap = Arc<RwLock<HashMap<ComponentKind, BlockBuffer>>>;

/// Per-component last render timestamps, shared with the workers
pub type RenderTimes = Arc<Mutex<HashMap<ComponentKind, Duration>>>;

/// Engine status publisher, shared by the command lane and the workers
pub type SharedPublisher = Arc<Mutex<StatusPublisher>>;

/// What a worker does in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerRole {
    Reading,
    Decoding,
    Rendering,
}

impl std::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerRole::Reading => write!(f, "reading"),
            WorkerRole::Decoding => write!(f, "decoding"),
            WorkerRole::Rendering => write!(f, "rendering"),
        }
    }
}

/// Engine handles a worker may use while running
#[derive(Clone)]
pub struct WorkerContext {
    pub engine_id: Uuid,
    pub status: Arc<Status>,
    pub blocks: BlockMap,
    pub render_times: RenderTimes,
    pub events: EventBus,
    pub publisher: SharedPublisher,
    /// Sleep between two loop cycles
    pub cycle: Duration,
}

impl WorkerContext {
    /// Publish status changes made outside a command
    pub fn publish_status(&self) -> usize {
        self.publisher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .publish(&self.status, &self.events)
    }
}

/// Background worker contract
pub trait Worker: Send {
    fn role(&self) -> WorkerRole;

    /// Start the worker thread
    fn start(&mut self, context: WorkerContext) -> Result<()>;

    /// Signal the worker and block until its thread has exited
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Produces the worker set started by each Open
pub trait WorkerFactory: Send + Sync {
    fn create_workers(&self) -> Vec<Box<dyn Worker>>;
}

/// Reading (buffering monitor), decoding (idle) and rendering (clock) threads
#[derive(Debug, Default, Clone)]
pub struct DefaultWorkerFactory;

impl WorkerFactory for DefaultWorkerFactory {
    fn create_workers(&self) -> Vec<Box<dyn Worker>> {
        vec![
            Box::new(ThreadWorker::new(WorkerRole::Reading, BufferingMonitor)),
            Box::new(ThreadWorker::new(WorkerRole::Decoding, IdleLoop)),
            Box::new(ThreadWorker::new(WorkerRole::Rendering, RenderClock::new())),
        ]
    }
}
