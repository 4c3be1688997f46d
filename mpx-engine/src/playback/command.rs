//! Lifecycle commands
//!
//! Each `CommandKind` declares the playback phases it is valid from. A
//! command submitted outside them is not an error: it completes as
//! `CommandOutcome::Skipped` with the reason, and touches nothing.

use super::engine::EngineCore;
use crate::error::Result;
use mpx_common::MediaState;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Slowest accepted playback speed
pub const MIN_SPEED_RATIO: f64 = 0.0625;
/// Fastest accepted playback speed
pub const MAX_SPEED_RATIO: f64 = 8.0;

const OPEN_STATES: &[MediaState] = &[MediaState::Stopped, MediaState::Playing, MediaState::Paused];
const ALL_STATES: &[MediaState] = &[
    MediaState::Closed,
    MediaState::Opening,
    MediaState::Stopped,
    MediaState::Playing,
    MediaState::Paused,
];

/// Requested lifecycle transition
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// Open a media source
    Open { source: String },
    /// Stop workers and release the container and block buffers
    Close,
    Play,
    Pause,
    /// Rewind to zero and stop advancing
    Stop,
    Seek { position: Duration },
    SetSpeed { ratio: f64 },
    /// Close if needed, then reject every later command
    Dispose,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Open { .. } => "Open",
            CommandKind::Close => "Close",
            CommandKind::Play => "Play",
            CommandKind::Pause => "Pause",
            CommandKind::Stop => "Stop",
            CommandKind::Seek { .. } => "Seek",
            CommandKind::SetSpeed { .. } => "SetSpeed",
            CommandKind::Dispose => "Dispose",
        }
    }

    /// Playback phases this command may run from
    pub fn valid_from(&self) -> &'static [MediaState] {
        match self {
            CommandKind::Open { .. } => &[MediaState::Closed],
            CommandKind::Close => OPEN_STATES,
            CommandKind::Play => &[MediaState::Stopped, MediaState::Paused],
            CommandKind::Pause => &[MediaState::Playing],
            CommandKind::Stop => &[MediaState::Playing, MediaState::Paused],
            CommandKind::Seek { .. } | CommandKind::SetSpeed { .. } => OPEN_STATES,
            CommandKind::Dispose => ALL_STATES,
        }
    }

    /// Why this command must be skipped, or `None` if it may run
    pub fn skip_reason(&self, is_disposed: bool, state: MediaState) -> Option<SkipReason> {
        if is_disposed {
            return Some(SkipReason::Disposed);
        }
        if self.valid_from().contains(&state) {
            return None;
        }
        Some(match state {
            MediaState::Closed => SkipReason::NotOpen,
            MediaState::Opening => SkipReason::Opening,
            _ if matches!(self, CommandKind::Open { .. }) => SkipReason::AlreadyOpen,
            other => SkipReason::InvalidState(other),
        })
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Open { source } => write!(f, "Open({})", source),
            CommandKind::Seek { position } => write!(f, "Seek({:?})", position),
            CommandKind::SetSpeed { ratio } => write!(f, "SetSpeed({})", ratio),
            other => f.write_str(other.name()),
        }
    }
}

/// Why a command did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Engine already torn down
    Disposed,
    /// No media open
    NotOpen,
    /// Media already open
    AlreadyOpen,
    /// An open is in progress
    Opening,
    /// Not valid from this phase
    InvalidState(MediaState),
    /// Container cannot seek
    NotSeekable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disposed => write!(f, "engine disposed"),
            SkipReason::NotOpen => write!(f, "no media open"),
            SkipReason::AlreadyOpen => write!(f, "media already open"),
            SkipReason::Opening => write!(f, "open in progress"),
            SkipReason::InvalidState(state) => write!(f, "not valid while {}", state),
            SkipReason::NotSeekable => write!(f, "media not seekable"),
        }
    }
}

/// Result of a command that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Executed,
    Skipped(SkipReason),
}

impl CommandOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, CommandOutcome::Executed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CommandOutcome::Skipped(_))
    }
}

/// Reply channel of a waited-on command
pub(crate) type CommandReply = oneshot::Sender<Result<CommandOutcome>>;

/// A single lifecycle request bound to one engine
///
/// Holds only a weak reference to its engine. Consumed by execution, so it
/// runs at most once.
pub struct Command {
    kind: CommandKind,
    engine_id: Uuid,
    target: Weak<EngineCore>,
    reply: Option<CommandReply>,
}

impl Command {
    pub(crate) fn new(kind: CommandKind, target: &Arc<EngineCore>) -> Self {
        Self {
            kind,
            engine_id: target.id(),
            target: Arc::downgrade(target),
            reply: None,
        }
    }

    pub(crate) fn with_reply(
        kind: CommandKind,
        target: &Arc<EngineCore>,
        reply: CommandReply,
    ) -> Self {
        Self {
            reply: Some(reply),
            ..Self::new(kind, target)
        }
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Id of the engine this command targets
    pub fn engine_id(&self) -> Uuid {
        self.engine_id
    }

    /// Target engine, if it still exists
    pub(crate) fn target(&self) -> Option<Arc<EngineCore>> {
        self.target.upgrade()
    }

    pub(crate) fn into_parts(self) -> (CommandKind, Weak<EngineCore>, Option<CommandReply>) {
        (self.kind, self.target, self.reply)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind)
            .field("engine_id", &self.engine_id)
            .field("awaited", &self.reply.is_some())
            .finish()
    }
}
