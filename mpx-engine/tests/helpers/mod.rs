//! Test helpers for mpx-engine integration tests
//!
//! - `Probe`: shared ordered log of teardown steps plus ordering violations
//! - `FakeOpener` / `FakeContainer`: in-memory containers recording disposal
//! - `ProbeWorkerFactory`: workers that keep filling the block buffers, flag
//!   any access to a disposed buffer, and a real render clock
//! - Event draining and engine construction shortcuts

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mpx_common::{ComponentKind, MediaEvent};
use mpx_engine::diagnostics::{ResourceHandle, ResourceRegistry};
use mpx_engine::media::{ComponentInfo, Container, ContainerOpener, MediaBlock, MediaInfo};
use mpx_engine::playback::workers::{
    RenderClock, ThreadWorker, Worker, WorkerContext, WorkerFactory, WorkerLoop, WorkerRole,
};
use mpx_engine::{EngineConfig, Error, MediaEngine, Result};
use tokio::sync::broadcast;

pub const FAKE_CONTAINER_SITE: &str = "container.fake";

/// Shared record of what happened, in order
#[derive(Clone, Default)]
pub struct Probe {
    log: Arc<Mutex<Vec<String>>>,
    violations: Arc<Mutex<Vec<String>>>,
    running_workers: Arc<AtomicUsize>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    pub fn violation(&self, entry: impl Into<String>) {
        self.violations.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn violations(&self) -> Vec<String> {
        self.violations.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|e| e.as_str() == entry).count()
    }

    /// Index of the first log entry equal to `entry`
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.log.lock().unwrap().iter().position(|e| e == entry)
    }

    pub fn running_workers(&self) -> usize {
        self.running_workers.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

/// Media description handed out by `FakeOpener`
#[derive(Clone)]
pub struct FakeMedia {
    pub info: MediaInfo,
    pub fail_open: bool,
    pub fail_dispose: bool,
}

impl FakeMedia {
    /// 10 s seekable video + audio file
    pub fn video_and_audio() -> Self {
        Self::with_components(vec![
            ComponentInfo::new(ComponentKind::Video, 0, "h264")
                .with_bitrate(2_000_000)
                .with_video(1920, 1080, 25.0),
            ComponentInfo::new(ComponentKind::Audio, 1, "aac")
                .with_bitrate(128_000)
                .with_audio(48_000, 2, 16),
        ])
    }

    pub fn audio_only() -> Self {
        Self::with_components(vec![
            ComponentInfo::new(ComponentKind::Audio, 0, "flac").with_audio(44_100, 2, 16)
        ])
    }

    /// Video, audio and subtitle components
    pub fn full() -> Self {
        let mut media = Self::video_and_audio();
        media
            .info
            .components
            .push(ComponentInfo::new(ComponentKind::Subtitle, 2, "subrip"));
        media
    }

    pub fn with_components(components: Vec<ComponentInfo>) -> Self {
        Self {
            info: MediaInfo {
                format_name: "fake".to_string(),
                duration: Some(Duration::from_secs(10)),
                bitrate: 2_128_000,
                is_seekable: true,
                is_live_stream: false,
                hardware_decoder: None,
                components,
            },
            fail_open: false,
            fail_dispose: false,
        }
    }

    pub fn not_seekable(mut self) -> Self {
        self.info.is_seekable = false;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_dispose(mut self) -> Self {
        self.fail_dispose = true;
        self
    }
}

pub struct FakeOpener {
    media: FakeMedia,
    probe: Probe,
}

impl FakeOpener {
    pub fn new(media: FakeMedia, probe: Probe) -> Self {
        Self { media, probe }
    }
}

impl ContainerOpener for FakeOpener {
    fn open(&self, source: &str, registry: &ResourceRegistry) -> Result<Box<dyn Container>> {
        self.probe.record(format!("container.open {}", source));
        if self.media.fail_open {
            return Err(Error::Container(format!("cannot open {}", source)));
        }
        Ok(Box::new(FakeContainer {
            info: self.media.info.clone(),
            fail_dispose: self.media.fail_dispose,
            probe: self.probe.clone(),
            handle: Some(registry.track(FAKE_CONTAINER_SITE)),
            disposed: false,
        }))
    }
}

pub struct FakeContainer {
    info: MediaInfo,
    fail_dispose: bool,
    probe: Probe,
    handle: Option<ResourceHandle>,
    disposed: bool,
}

impl Container for FakeContainer {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn seek(&mut self, position: Duration) -> Result<Duration> {
        self.probe.record(format!("container.seek {}", position.as_millis()));
        Ok(position)
    }

    fn dispose(&mut self) -> Result<()> {
        self.probe.record("container.dispose");
        if self.probe.running_workers() > 0 {
            self.probe.violation("container disposed while workers running");
        }
        if self.disposed {
            self.probe.violation("container disposed twice");
            return Err(Error::Container("already disposed".to_string()));
        }
        self.disposed = true;
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
        if self.fail_dispose {
            return Err(Error::Container("injected dispose failure".to_string()));
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Keeps pushing one block per cycle into every buffer
struct BufferFiller {
    probe: Probe,
    next_start: Duration,
}

impl WorkerLoop for BufferFiller {
    fn cycle(&mut self, context: &WorkerContext) {
        let blocks = context.blocks.read().unwrap();
        for (kind, buffer) in blocks.iter() {
            if buffer.is_disposed() {
                self.probe.violation(format!("{} buffer touched after dispose", kind));
                continue;
            }
            let block = MediaBlock {
                start_time: self.next_start,
                duration: Duration::from_millis(20),
                data: vec![0; 16],
            };
            if buffer.push(block).is_err() {
                self.probe.violation(format!("{} buffer push failed", kind));
            }
        }
        self.next_start += Duration::from_millis(20);
    }
}

/// Thread worker that reports start/stop into a `Probe`
pub struct ProbeWorker {
    inner: ThreadWorker,
    probe: Probe,
}

impl Worker for ProbeWorker {
    fn role(&self) -> WorkerRole {
        self.inner.role()
    }

    fn start(&mut self, context: WorkerContext) -> Result<()> {
        self.inner.start(context)?;
        self.probe.running_workers.fetch_add(1, Ordering::SeqCst);
        self.probe.record(format!("worker.start {}", self.role()));
        Ok(())
    }

    fn stop(&mut self) {
        let was_running = self.inner.is_running();
        self.inner.stop();
        if was_running {
            self.probe.running_workers.fetch_sub(1, Ordering::SeqCst);
            self.probe.record(format!("worker.stop {}", self.role()));
        }
    }

    fn is_running(&self) -> bool {
        self.inner.is_running()
    }
}

pub struct ProbeWorkerFactory {
    probe: Probe,
}

impl ProbeWorkerFactory {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }
}

impl ProbeWorkerFactory {
    fn probed(&self, inner: ThreadWorker) -> Box<dyn Worker> {
        Box::new(ProbeWorker {
            inner,
            probe: self.probe.clone(),
        })
    }

    fn filler(&self) -> BufferFiller {
        BufferFiller {
            probe: self.probe.clone(),
            next_start: Duration::ZERO,
        }
    }
}

impl WorkerFactory for ProbeWorkerFactory {
    /// Two buffer fillers plus the real render clock
    fn create_workers(&self) -> Vec<Box<dyn Worker>> {
        vec![
            self.probed(ThreadWorker::new(WorkerRole::Reading, self.filler())),
            self.probed(ThreadWorker::new(WorkerRole::Decoding, self.filler())),
            self.probed(ThreadWorker::new(WorkerRole::Rendering, RenderClock::new())),
        ]
    }
}

/// Fast worker cycle, leak check on
pub fn test_config() -> EngineConfig {
    EngineConfig {
        worker_cycle_ms: 1,
        leak_check: Some(true),
        ..EngineConfig::default()
    }
}

/// Engine wired to fake media and probe workers
pub fn probe_engine(media: FakeMedia, probe: &Probe, registry: &ResourceRegistry) -> MediaEngine {
    MediaEngine::builder()
        .with_config(test_config())
        .with_opener(Arc::new(FakeOpener::new(media, probe.clone())))
        .with_worker_factory(Arc::new(ProbeWorkerFactory::new(probe.clone())))
        .with_registry(registry.clone())
        .build()
        .expect("engine builds")
}

/// Everything currently queued on the receiver
pub fn drain_events(rx: &mut broadcast::Receiver<MediaEvent>) -> Vec<MediaEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn event_names(events: &[MediaEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}

pub fn count_events(events: &[MediaEvent], name: &str) -> usize {
    events.iter().filter(|e| e.name() == name).count()
}

/// Let workers run a few cycles
pub async fn let_workers_run() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

/// Poll `condition` for up to one second
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
