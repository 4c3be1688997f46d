//! Demux container contract
//!
//! The engine never demuxes by itself. It opens a container through an
//! injected `ContainerOpener`, reads its metadata, seeks it, and disposes it
//! exactly once on teardown.

use crate::diagnostics::ResourceRegistry;
use crate::error::Result;
use mpx_common::ComponentKind;
use std::time::Duration;

/// Video stream parameters
#[derive(Debug, Clone, PartialEq)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    /// Frames per second
    pub frame_rate: f64,
}

/// Audio stream parameters
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u32,
}

/// One logical stream of an open container
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInfo {
    pub kind: ComponentKind,
    /// Stream index inside the container
    pub stream_index: usize,
    /// Codec short name (e.g. "flac", "h264")
    pub codec_name: String,
    /// Bits per second, 0 when unknown
    pub bitrate: u64,
    pub video: Option<VideoParams>,
    pub audio: Option<AudioParams>,
}

impl ComponentInfo {
    pub fn new(kind: ComponentKind, stream_index: usize, codec_name: impl Into<String>) -> Self {
        Self {
            kind,
            stream_index,
            codec_name: codec_name.into(),
            bitrate: 0,
            video: None,
            audio: None,
        }
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_video(mut self, width: u32, height: u32, frame_rate: f64) -> Self {
        self.video = Some(VideoParams {
            width,
            height,
            frame_rate,
        });
        self
    }

    pub fn with_audio(mut self, sample_rate: u32, channels: u16, bits_per_sample: u32) -> Self {
        self.audio = Some(AudioParams {
            sample_rate,
            channels,
            bits_per_sample,
        });
        self
    }
}

/// Read-only metadata of an open container
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaInfo {
    /// Container format short name
    pub format_name: String,
    /// Total duration, `None` for live or unknown-length sources
    pub duration: Option<Duration>,
    /// Overall bits per second, 0 when unknown
    pub bitrate: u64,
    pub is_seekable: bool,
    pub is_live_stream: bool,
    /// Hardware decoder selected for the video component, if any
    pub hardware_decoder: Option<String>,
    /// Selected components, at most one per kind
    pub components: Vec<ComponentInfo>,
}

impl MediaInfo {
    /// Selected component of a kind
    pub fn component(&self, kind: ComponentKind) -> Option<&ComponentInfo> {
        self.components.iter().find(|c| c.kind == kind)
    }

    /// Component kinds present, in key order
    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = self.components.iter().map(|c| c.kind).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

/// An open demux container owning native resources
pub trait Container: Send {
    /// Container metadata, stable for the lifetime of the container
    fn info(&self) -> &MediaInfo;

    /// Reposition the read cursor; returns the position actually reached
    fn seek(&mut self, position: Duration) -> Result<Duration>;

    /// Release all native resources. Valid once per successful open.
    fn dispose(&mut self) -> Result<()>;

    /// True once `dispose` succeeded
    fn is_disposed(&self) -> bool;
}

/// Opens containers for media sources
pub trait ContainerOpener: Send + Sync {
    /// Open `source`, registering native handles in `registry`
    fn open(&self, source: &str, registry: &ResourceRegistry) -> Result<Box<dyn Container>>;
}
