//! File-backed container using symphonia
//!
//! Probes a local media file, exposes its metadata as `MediaInfo`, and keeps
//! the format reader open (the native handle) until `dispose()`.
//! Symphonia only demuxes audio, so containers opened here have at most one
//! (audio) component.

use super::container::{ComponentInfo, Container, ContainerOpener, MediaInfo};
use crate::diagnostics::{ResourceHandle, ResourceRegistry};
use crate::error::{Error, Result};
use mpx_common::ComponentKind;
use std::path::Path;
use std::time::Duration;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;
use tracing::{debug, info};

/// Allocation-site tag for symphonia format readers
pub const CONTAINER_SITE: &str = "container.symphonia";

fn time_to_duration(time: Time) -> Duration {
    Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac.clamp(0.0, 1.0))
}

/// Opens local files with the default symphonia probe
#[derive(Debug, Default, Clone)]
pub struct SymphoniaOpener;

impl SymphoniaOpener {
    pub fn new() -> Self {
        Self
    }
}

impl ContainerOpener for SymphoniaOpener {
    fn open(&self, source: &str, registry: &ResourceRegistry) -> Result<Box<dyn Container>> {
        let container = SymphoniaContainer::open(Path::new(source), registry)?;
        Ok(Box::new(container))
    }
}

/// Open symphonia format reader plus the metadata read at open time
pub struct SymphoniaContainer {
    reader: Option<Box<dyn FormatReader>>,
    info: MediaInfo,
    track_id: u32,
    handle: Option<ResourceHandle>,
}

impl SymphoniaContainer {
    /// Probe and open a local media file
    pub fn open(path: &Path, registry: &ResourceRegistry) -> Result<Self> {
        if path.to_string_lossy().contains("://") {
            return Err(Error::Open(format!(
                "Unsupported source scheme: {}",
                path.display()
            )));
        }

        debug!("Probing container: {}", path.display());

        let file = std::fs::File::open(path)
            .map_err(|e| Error::Open(format!("Failed to open file {}: {}", path.display(), e)))?;
        let file_len = file.metadata().map(|m| m.len()).unwrap_or(0);

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint to help the format registry guess the format
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let mut hint = Hint::new();
        if let Some(ext) = extension.as_deref() {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Open(format!("Failed to probe format: {}", e)))?;
        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Open("No decodable track found".to_string()))?;

        let params = &track.codec_params;
        let codec_name = symphonia::default::get_codecs()
            .get_codec(params.codec)
            .map(|d| d.short_name.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let duration = match (params.time_base, params.n_frames) {
            (Some(tb), Some(frames)) => Some(time_to_duration(tb.calc_time(frames))),
            _ => None,
        };

        let bitrate = match duration {
            Some(d) if d > Duration::ZERO => (file_len as f64 * 8.0 / d.as_secs_f64()) as u64,
            _ => 0,
        };

        let audio = ComponentInfo::new(ComponentKind::Audio, 0, codec_name)
            .with_bitrate(bitrate)
            .with_audio(
                params.sample_rate.unwrap_or(0),
                params.channels.map(|c| c.count() as u16).unwrap_or(0),
                params.bits_per_sample.unwrap_or(0),
            );

        let info = MediaInfo {
            format_name: extension.unwrap_or_else(|| "unknown".to_string()),
            duration,
            bitrate,
            // URL sources are rejected in open, so every container is a local file
            is_seekable: true,
            is_live_stream: false,
            hardware_decoder: None,
            components: vec![audio],
        };

        let track_id = track.id;
        info!(
            "Opened container {} (format={}, duration={:?})",
            path.display(),
            info.format_name,
            info.duration
        );

        Ok(Self {
            reader: Some(reader),
            info,
            track_id,
            handle: Some(registry.track(CONTAINER_SITE)),
        })
    }
}

impl Container for SymphoniaContainer {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn seek(&mut self, position: Duration) -> Result<Duration> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::Container("Seek on disposed container".to_string()))?;

        let time = Time::new(position.as_secs(), position.subsec_nanos() as f64 / 1_000_000_000.0);
        let seeked = reader
            .seek(
                SeekMode::Coarse,
                SeekTo::Time {
                    time,
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| Error::Container(format!("Seek failed: {}", e)))?;

        let reached = reader
            .tracks()
            .iter()
            .find(|t| t.id == seeked.track_id)
            .and_then(|t| t.codec_params.time_base)
            .map(|tb| time_to_duration(tb.calc_time(seeked.actual_ts)))
            .unwrap_or(position);
        Ok(reached)
    }

    fn dispose(&mut self) -> Result<()> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| Error::Container("Container already disposed".to_string()))?;
        drop(reader);

        if let Some(handle) = self.handle.take() {
            handle.release();
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.reader.is_none()
    }
}
