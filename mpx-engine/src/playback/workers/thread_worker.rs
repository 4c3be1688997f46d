//! Worker backed by a dedicated OS thread

use super::{Worker, WorkerContext, WorkerRole};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Body of a worker thread, called once per cycle
pub trait WorkerLoop: Send + 'static {
    fn cycle(&mut self, context: &WorkerContext);
}

struct RunningThread {
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<Box<dyn WorkerLoop>>,
}

/// Runs a `WorkerLoop` on its own thread until stopped
///
/// The loop body is handed back when the thread exits, so a stopped worker
/// can be started again.
pub struct ThreadWorker {
    role: WorkerRole,
    body: Option<Box<dyn WorkerLoop>>,
    running: Option<RunningThread>,
}

impl ThreadWorker {
    pub fn new(role: WorkerRole, body: impl WorkerLoop) -> Self {
        Self {
            role,
            body: Some(Box::new(body)),
            running: None,
        }
    }

    fn run(
        mut body: Box<dyn WorkerLoop>,
        context: WorkerContext,
        stop_flag: Arc<AtomicBool>,
    ) -> Box<dyn WorkerLoop> {
        while !stop_flag.load(Ordering::Acquire) {
            body.cycle(&context);
            if stop_flag.load(Ordering::Acquire) {
                break;
            }
            thread::park_timeout(context.cycle);
        }
        body
    }
}

impl Worker for ThreadWorker {
    fn role(&self) -> WorkerRole {
        self.role
    }

    fn start(&mut self, context: WorkerContext) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::Worker(format!("{} worker already running", self.role)));
        }
        let body = self
            .body
            .take()
            .ok_or_else(|| Error::Worker(format!("{} worker lost its loop body", self.role)))?;

        let engine_id = context.engine_id;
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_flag);
        let handle = thread::Builder::new()
            .name(format!("mpx-{}", self.role))
            .spawn(move || Self::run(body, context, thread_stop))
            .map_err(|e| Error::Worker(format!("Failed to spawn {} worker: {}", self.role, e)))?;

        debug!("Engine {}: {} worker started", engine_id, self.role);
        self.running = Some(RunningThread { stop_flag, handle });
        Ok(())
    }

    fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.stop_flag.store(true, Ordering::Release);
        running.handle.thread().unpark();

        match running.handle.join() {
            Ok(body) => {
                self.body = Some(body);
                debug!("{} worker joined", self.role);
            }
            Err(e) => {
                error!("{} worker panicked: {:?}", self.role, e);
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
