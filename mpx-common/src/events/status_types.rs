//! Status value types
//!
//! Supporting types for the engine read-model: playback phase, stream
//! component kinds and the tagged property value used by snapshots.

use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// Playback phase of a media session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaState {
    /// No media open
    #[default]
    Closed,
    /// Open command in progress
    Opening,
    /// Media open, positioned but not advancing
    Stopped,
    /// Media open and advancing
    Playing,
    /// Media open, advancing suspended at the current position
    Paused,
}

impl MediaState {
    /// True for the phases in which a container is open and usable
    pub fn is_open(self) -> bool {
        matches!(self, MediaState::Stopped | MediaState::Playing | MediaState::Paused)
    }
}

impl std::fmt::Display for MediaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaState::Closed => write!(f, "closed"),
            MediaState::Opening => write!(f, "opening"),
            MediaState::Stopped => write!(f, "stopped"),
            MediaState::Playing => write!(f, "playing"),
            MediaState::Paused => write!(f, "paused"),
        }
    }
}

/// Logical stream kind within a container
///
/// Used as the key of the per-component block buffer and render-time maps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Video,
    Audio,
    Subtitle,
}

impl ComponentKind {
    /// All component kinds in key order
    pub const ALL: [ComponentKind; 3] =
        [ComponentKind::Video, ComponentKind::Audio, ComponentKind::Subtitle];
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Video => write!(f, "video"),
            ComponentKind::Audio => write!(f, "audio"),
            ComponentKind::Subtitle => write!(f, "subtitle"),
        }
    }
}

/// Value of a single status property
///
/// Floats compare bitwise so that every value is equal to itself, which the
/// snapshot diff depends on.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Absent value (no open media)
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Serialized as fractional seconds
    #[serde(serialize_with = "serialize_secs")]
    Duration(Duration),
    State(MediaState),
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            PropertyValue::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<MediaState> {
        match self {
            PropertyValue::State(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PropertyValue::None)
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::None, PropertyValue::None) => true,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropertyValue::Text(a), PropertyValue::Text(b)) => a == b,
            (PropertyValue::Duration(a), PropertyValue::Duration(b)) => a == b,
            (PropertyValue::State(a), PropertyValue::State(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::None => write!(f, "-"),
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Integer(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{:.3}", v),
            PropertyValue::Text(v) => write!(f, "{}", v),
            PropertyValue::Duration(v) => write!(f, "{:.3}s", v.as_secs_f64()),
            PropertyValue::State(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<Duration> for PropertyValue {
    fn from(v: Duration) -> Self {
        PropertyValue::Duration(v)
    }
}

impl From<MediaState> for PropertyValue {
    fn from(v: MediaState) -> Self {
        PropertyValue::State(v)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(PropertyValue::None, Into::into)
    }
}
