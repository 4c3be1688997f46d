//! Per-engine command lane
//!
//! Every engine owns one lane: a dedicated OS thread draining an unbounded
//! channel. Commands for one engine therefore run one at a time in
//! submission order, and may block (worker joins) without stalling the async
//! runtime or other engines.

use super::command::{Command, CommandOutcome};
use crate::error::{Error, Result};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct CommandQueue {
    engine_id: Uuid,
    sender: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    lane: Mutex<Option<JoinHandle<()>>>,
}

impl CommandQueue {
    /// Spawn the lane thread for `engine_id`
    pub(crate) fn start(engine_id: Uuid) -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let short_id: String = engine_id.to_string().chars().take(8).collect();

        let lane = thread::Builder::new()
            .name(format!("mpx-commands-{}", short_id))
            .spawn(move || run_lane(engine_id, receiver))?;

        debug!("Command lane started for engine {}", engine_id);

        Ok(Self {
            engine_id,
            sender: Mutex::new(Some(sender)),
            lane: Mutex::new(Some(lane)),
        })
    }

    pub fn engine_id(&self) -> Uuid {
        self.engine_id
    }

    /// Enqueue a command for this queue's engine
    ///
    /// Fails with `EngineDisposed` when the target engine is gone or finally
    /// disposed, and with `InvalidInput` when the command was built for a
    /// different engine.
    pub fn submit(&self, command: Command) -> Result<()> {
        if command.engine_id() != self.engine_id {
            return Err(Error::InvalidInput(format!(
                "command {} targets engine {}, queue serves {}",
                command.kind(),
                command.engine_id(),
                self.engine_id
            )));
        }

        match command.target() {
            Some(core) if !core.is_disposed() => {}
            _ => return Err(Error::EngineDisposed),
        }

        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = sender.as_ref().ok_or(Error::QueueClosed)?;
        sender.send(command).map_err(|_| Error::QueueClosed)
    }

    /// Stop accepting commands, drain what is queued, then join the lane
    pub(crate) fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let lane = self.lane.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = lane {
            if handle.join().is_err() {
                error!("Command lane for engine {} panicked", self.engine_id);
            } else {
                debug!("Command lane stopped for engine {}", self.engine_id);
            }
        }
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let accepting = self
            .sender
            .lock()
            .map(|sender| sender.is_some())
            .unwrap_or(false);
        f.debug_struct("CommandQueue")
            .field("engine_id", &self.engine_id)
            .field("accepting", &accepting)
            .finish()
    }
}

fn run_lane(engine_id: Uuid, mut receiver: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = receiver.blocking_recv() {
        run_command(engine_id, command);
    }
}

fn run_command(engine_id: Uuid, command: Command) {
    let (kind, target, reply) = command.into_parts();

    let result = match target.upgrade() {
        Some(core) => {
            let result = core.execute(&kind);
            if !matches!(result, Ok(CommandOutcome::Skipped(_))) {
                core.publish_status();
            }
            result
        }
        None => Err(Error::EngineDisposed),
    };

    match &result {
        Ok(CommandOutcome::Executed) => info!("Engine {}: {} executed", engine_id, kind),
        Ok(CommandOutcome::Skipped(reason)) => {
            debug!("Engine {}: {} skipped ({})", engine_id, kind, reason)
        }
        Err(e) => error!("Engine {}: {} failed: {}", engine_id, kind, e),
    }

    if let Some(reply) = reply {
        if reply.send(result).is_err() {
            warn!("Engine {}: caller stopped waiting for {}", engine_id, kind);
        }
    }
}
