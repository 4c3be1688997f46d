//! Media engine - construction and command submission
//!
//! **Responsibilities:**
//! - `MediaEngine` handle owned by callers
//! - `EngineCore` shared with queued commands through `Weak` references
//! - Injection seams (container opener, worker factory, registry, event bus)

use super::state::{EngineState, StateSummary};
use crate::config::EngineConfig;
use crate::diagnostics::ResourceRegistry;
use crate::error::{Error, Result};
use crate::media::{ContainerOpener, SymphoniaOpener};
use crate::playback::command::{Command, CommandKind, CommandOutcome};
use crate::playback::queue::CommandQueue;
use crate::playback::status::{Status, StatusPublisher};
use crate::playback::workers::{DefaultWorkerFactory, SharedPublisher, WorkerFactory};
use mpx_common::{EventBus, MediaEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

/// Engine internals reachable from queued commands
pub struct EngineCore {
    pub(super) id: Uuid,
    pub(super) config: EngineConfig,
    pub(super) status: Arc<Status>,
    pub(super) state: Mutex<EngineState>,
    /// Final teardown done; readable without the state lock
    pub(super) disposed: AtomicBool,
    pub(super) events: EventBus,
    pub(super) registry: ResourceRegistry,
    pub(super) opener: Arc<dyn ContainerOpener>,
    pub(super) worker_factory: Arc<dyn WorkerFactory>,
    pub(super) publisher: SharedPublisher,
}

impl EngineCore {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(super) fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit the properties changed since the previous publish
    pub(crate) fn publish_status(&self) -> usize {
        self.publisher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .publish(&self.status, &self.events)
    }

    pub(super) fn emit(&self, event: MediaEvent) {
        self.events.emit_lossy(event);
    }
}

/// A media session
///
/// All lifecycle changes go through the engine's command lane. Dropping the
/// engine disposes it (closing open media) and joins the lane.
pub struct MediaEngine {
    core: Arc<EngineCore>,
    queue: CommandQueue,
}

impl MediaEngine {
    /// Engine with the symphonia container and default workers
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> MediaEngineBuilder {
        MediaEngineBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.core.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    /// Shared status read-model
    pub fn status(&self) -> Arc<Status> {
        Arc::clone(&self.core.status)
    }

    pub fn events(&self) -> &EventBus {
        &self.core.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.core.events.subscribe()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.core.registry
    }

    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    /// Snapshot of owned resources
    ///
    /// Waits for the command currently executing, if any.
    pub fn summary(&self) -> StateSummary {
        let disposed = self.core.is_disposed();
        self.core.lock_state().summary(disposed)
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Build a command bound to this engine
    pub fn command(&self, kind: CommandKind) -> Command {
        Command::new(kind, &self.core)
    }

    /// Enqueue without waiting for the outcome
    pub fn submit(&self, kind: CommandKind) -> Result<()> {
        self.queue.submit(self.command(kind))
    }

    /// Enqueue and wait for the outcome
    pub async fn execute(&self, kind: CommandKind) -> Result<CommandOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.queue.submit(Command::with_reply(kind, &self.core, reply))?;
        outcome.await.map_err(|_| Error::QueueClosed)?
    }

    /// Enqueue and block the calling thread until the outcome arrives
    ///
    /// Must not be called from inside an async runtime.
    pub fn execute_blocking(&self, kind: CommandKind) -> Result<CommandOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.queue.submit(Command::with_reply(kind, &self.core, reply))?;
        outcome.blocking_recv().map_err(|_| Error::QueueClosed)?
    }

    pub async fn open(&self, source: impl Into<String>) -> Result<CommandOutcome> {
        self.execute(CommandKind::Open {
            source: source.into(),
        })
        .await
    }

    pub async fn close(&self) -> Result<CommandOutcome> {
        self.execute(CommandKind::Close).await
    }

    pub async fn play(&self) -> Result<CommandOutcome> {
        self.execute(CommandKind::Play).await
    }

    pub async fn pause(&self) -> Result<CommandOutcome> {
        self.execute(CommandKind::Pause).await
    }

    pub async fn stop(&self) -> Result<CommandOutcome> {
        self.execute(CommandKind::Stop).await
    }

    pub async fn seek(&self, position: Duration) -> Result<CommandOutcome> {
        self.execute(CommandKind::Seek { position }).await
    }

    pub async fn set_speed(&self, ratio: f64) -> Result<CommandOutcome> {
        self.execute(CommandKind::SetSpeed { ratio }).await
    }

    pub async fn dispose(&self) -> Result<CommandOutcome> {
        self.execute(CommandKind::Dispose).await
    }
}

impl Drop for MediaEngine {
    fn drop(&mut self) {
        if !self.core.is_disposed() {
            debug!("Engine {} dropped without dispose, disposing", self.core.id);
            // Err only when disposal already happened
            let _ = self.queue.submit(Command::new(CommandKind::Dispose, &self.core));
        }
        self.queue.shutdown();
    }
}

impl std::fmt::Debug for MediaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaEngine")
            .field("id", &self.core.id)
            .field("state", &self.core.status.media_state())
            .field("disposed", &self.core.is_disposed())
            .finish()
    }
}

/// Builder for `MediaEngine` with optional injected collaborators
#[derive(Default)]
pub struct MediaEngineBuilder {
    config: Option<EngineConfig>,
    opener: Option<Arc<dyn ContainerOpener>>,
    worker_factory: Option<Arc<dyn WorkerFactory>>,
    events: Option<EventBus>,
    registry: Option<ResourceRegistry>,
}

impl MediaEngineBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn ContainerOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn with_worker_factory(mut self, factory: Arc<dyn WorkerFactory>) -> Self {
        self.worker_factory = Some(factory);
        self
    }

    /// Share an existing event bus instead of creating one
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Share a resource registry (leak tracking) across engines
    pub fn with_registry(mut self, registry: ResourceRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<MediaEngine> {
        let config = self.config.unwrap_or_default();
        let id = Uuid::new_v4();
        let status = Arc::new(Status::new());
        let events = self
            .events
            .unwrap_or_else(|| EventBus::new(config.event_capacity.max(1)));

        let core = Arc::new(EngineCore {
            id,
            state: Mutex::new(EngineState::new(Arc::clone(&status))),
            disposed: AtomicBool::new(false),
            events,
            registry: self.registry.unwrap_or_default(),
            opener: self.opener.unwrap_or_else(|| Arc::new(SymphoniaOpener)),
            worker_factory: self
                .worker_factory
                .unwrap_or_else(|| Arc::new(DefaultWorkerFactory)),
            publisher: Arc::new(Mutex::new(StatusPublisher::starting_from(
                id,
                status.snapshot(),
            ))),
            status,
            config,
        });

        let queue = CommandQueue::start(id)?;
        info!("Media engine {} created", id);

        Ok(MediaEngine { core, queue })
    }
}
