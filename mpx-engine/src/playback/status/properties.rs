//! Enumerated status property set
//!
//! The property list is closed and ordered. `ACCESSORS` pairs every property
//! with the function computing it from a consistent `StatusReading`; it is a
//! static table, built once at compile time.

use super::StatusReading;
use mpx_common::time::smpte_timecode;
use mpx_common::{ComponentKind, MediaState, PropertyValue};

/// Number of enumerated status properties
pub const PROPERTY_COUNT: usize = 37;

/// One externally observable status property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusProperty {
    Source,
    MediaState,
    Position,
    IsOpen,
    IsOpening,
    IsSeeking,
    HasMediaEnded,
    IsPlaying,
    IsPaused,
    CanPause,
    SpeedRatio,
    MediaFormat,
    Bitrate,
    NaturalDuration,
    IsSeekable,
    IsLiveStream,
    HasVideo,
    VideoCodec,
    VideoBitrate,
    NaturalVideoWidth,
    NaturalVideoHeight,
    VideoFrameRate,
    VideoHardwareDecoder,
    VideoSmpteTimecode,
    HasAudio,
    AudioCodec,
    AudioBitrate,
    AudioSampleRate,
    AudioChannels,
    AudioBitsPerSample,
    HasSubtitles,
    SubtitleCodec,
    BufferingProgress,
    DownloadProgress,
    IsBuffering,
    BufferCacheLength,
    DownloadCacheLength,
}

impl StatusProperty {
    /// All properties in table order
    pub const ALL: [StatusProperty; PROPERTY_COUNT] = [
        StatusProperty::Source,
        StatusProperty::MediaState,
        StatusProperty::Position,
        StatusProperty::IsOpen,
        StatusProperty::IsOpening,
        StatusProperty::IsSeeking,
        StatusProperty::HasMediaEnded,
        StatusProperty::IsPlaying,
        StatusProperty::IsPaused,
        StatusProperty::CanPause,
        StatusProperty::SpeedRatio,
        StatusProperty::MediaFormat,
        StatusProperty::Bitrate,
        StatusProperty::NaturalDuration,
        StatusProperty::IsSeekable,
        StatusProperty::IsLiveStream,
        StatusProperty::HasVideo,
        StatusProperty::VideoCodec,
        StatusProperty::VideoBitrate,
        StatusProperty::NaturalVideoWidth,
        StatusProperty::NaturalVideoHeight,
        StatusProperty::VideoFrameRate,
        StatusProperty::VideoHardwareDecoder,
        StatusProperty::VideoSmpteTimecode,
        StatusProperty::HasAudio,
        StatusProperty::AudioCodec,
        StatusProperty::AudioBitrate,
        StatusProperty::AudioSampleRate,
        StatusProperty::AudioChannels,
        StatusProperty::AudioBitsPerSample,
        StatusProperty::HasSubtitles,
        StatusProperty::SubtitleCodec,
        StatusProperty::BufferingProgress,
        StatusProperty::DownloadProgress,
        StatusProperty::IsBuffering,
        StatusProperty::BufferCacheLength,
        StatusProperty::DownloadCacheLength,
    ];

    /// Position in the snapshot table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name published to observers
    pub fn name(self) -> &'static str {
        match self {
            StatusProperty::Source => "source",
            StatusProperty::MediaState => "media_state",
            StatusProperty::Position => "position",
            StatusProperty::IsOpen => "is_open",
            StatusProperty::IsOpening => "is_opening",
            StatusProperty::IsSeeking => "is_seeking",
            StatusProperty::HasMediaEnded => "has_media_ended",
            StatusProperty::IsPlaying => "is_playing",
            StatusProperty::IsPaused => "is_paused",
            StatusProperty::CanPause => "can_pause",
            StatusProperty::SpeedRatio => "speed_ratio",
            StatusProperty::MediaFormat => "media_format",
            StatusProperty::Bitrate => "bitrate",
            StatusProperty::NaturalDuration => "natural_duration",
            StatusProperty::IsSeekable => "is_seekable",
            StatusProperty::IsLiveStream => "is_live_stream",
            StatusProperty::HasVideo => "has_video",
            StatusProperty::VideoCodec => "video_codec",
            StatusProperty::VideoBitrate => "video_bitrate",
            StatusProperty::NaturalVideoWidth => "natural_video_width",
            StatusProperty::NaturalVideoHeight => "natural_video_height",
            StatusProperty::VideoFrameRate => "video_frame_rate",
            StatusProperty::VideoHardwareDecoder => "video_hardware_decoder",
            StatusProperty::VideoSmpteTimecode => "video_smpte_timecode",
            StatusProperty::HasAudio => "has_audio",
            StatusProperty::AudioCodec => "audio_codec",
            StatusProperty::AudioBitrate => "audio_bitrate",
            StatusProperty::AudioSampleRate => "audio_sample_rate",
            StatusProperty::AudioChannels => "audio_channels",
            StatusProperty::AudioBitsPerSample => "audio_bits_per_sample",
            StatusProperty::HasSubtitles => "has_subtitles",
            StatusProperty::SubtitleCodec => "subtitle_codec",
            StatusProperty::BufferingProgress => "buffering_progress",
            StatusProperty::DownloadProgress => "download_progress",
            StatusProperty::IsBuffering => "is_buffering",
            StatusProperty::BufferCacheLength => "buffer_cache_length",
            StatusProperty::DownloadCacheLength => "download_cache_length",
        }
    }

    /// Look up a property by its published name
    pub fn from_name(name: &str) -> Option<StatusProperty> {
        StatusProperty::ALL.iter().copied().find(|p| p.name() == name)
    }
}

impl std::fmt::Display for StatusProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Computes one property from a consistent reading
pub(super) type Accessor = fn(&StatusReading<'_>) -> PropertyValue;

fn codec(r: &StatusReading<'_>, kind: ComponentKind) -> PropertyValue {
    PropertyValue::Text(r.component(kind).map(|c| c.codec_name.clone()).unwrap_or_default())
}

fn component_bitrate(r: &StatusReading<'_>, kind: ComponentKind) -> PropertyValue {
    PropertyValue::Integer(r.component(kind).map_or(0, |c| c.bitrate as i64))
}

/// Property table in `StatusProperty::ALL` order
pub(super) static ACCESSORS: [(StatusProperty, Accessor); PROPERTY_COUNT] = [
    (StatusProperty::Source, |r| PropertyValue::from(r.fields.source.clone())),
    (StatusProperty::MediaState, |r| PropertyValue::State(r.fields.media_state)),
    (StatusProperty::Position, |r| PropertyValue::Duration(r.fields.position)),
    (StatusProperty::IsOpen, |r| PropertyValue::Bool(r.is_open())),
    (StatusProperty::IsOpening, |r| PropertyValue::Bool(r.fields.is_opening)),
    (StatusProperty::IsSeeking, |r| PropertyValue::Bool(r.is_seeking)),
    (StatusProperty::HasMediaEnded, |r| PropertyValue::Bool(r.fields.has_media_ended)),
    (StatusProperty::IsPlaying, |r| {
        PropertyValue::Bool(r.fields.media_state == MediaState::Playing)
    }),
    (StatusProperty::IsPaused, |r| PropertyValue::Bool(r.fields.media_state == MediaState::Paused)),
    (StatusProperty::CanPause, |r| {
        PropertyValue::Bool(r.media().is_some_and(|m| !m.is_live_stream))
    }),
    (StatusProperty::SpeedRatio, |r| PropertyValue::Float(r.fields.speed_ratio)),
    (StatusProperty::MediaFormat, |r| {
        PropertyValue::Text(r.media().map(|m| m.format_name.clone()).unwrap_or_default())
    }),
    (StatusProperty::Bitrate, |r| {
        PropertyValue::Integer(r.media().map_or(0, |m| m.bitrate as i64))
    }),
    (StatusProperty::NaturalDuration, |r| PropertyValue::from(r.media().and_then(|m| m.duration))),
    (StatusProperty::IsSeekable, |r| PropertyValue::Bool(r.media().is_some_and(|m| m.is_seekable))),
    (StatusProperty::IsLiveStream, |r| {
        PropertyValue::Bool(r.media().is_some_and(|m| m.is_live_stream))
    }),
    (StatusProperty::HasVideo, |r| {
        PropertyValue::Bool(r.component(ComponentKind::Video).is_some())
    }),
    (StatusProperty::VideoCodec, |r| codec(r, ComponentKind::Video)),
    (StatusProperty::VideoBitrate, |r| component_bitrate(r, ComponentKind::Video)),
    (StatusProperty::NaturalVideoWidth, |r| {
        PropertyValue::Integer(r.video().map_or(0, |v| v.width as i64))
    }),
    (StatusProperty::NaturalVideoHeight, |r| {
        PropertyValue::Integer(r.video().map_or(0, |v| v.height as i64))
    }),
    (StatusProperty::VideoFrameRate, |r| {
        PropertyValue::Float(r.video().map_or(0.0, |v| v.frame_rate))
    }),
    (StatusProperty::VideoHardwareDecoder, |r| {
        let has_video = r.component(ComponentKind::Video).is_some();
        PropertyValue::Text(
            r.media()
                .filter(|_| has_video)
                .and_then(|m| m.hardware_decoder.clone())
                .unwrap_or_default(),
        )
    }),
    (StatusProperty::VideoSmpteTimecode, |r| {
        PropertyValue::Text(
            r.video()
                .map(|v| smpte_timecode(r.fields.position, v.frame_rate))
                .unwrap_or_default(),
        )
    }),
    (StatusProperty::HasAudio, |r| {
        PropertyValue::Bool(r.component(ComponentKind::Audio).is_some())
    }),
    (StatusProperty::AudioCodec, |r| codec(r, ComponentKind::Audio)),
    (StatusProperty::AudioBitrate, |r| component_bitrate(r, ComponentKind::Audio)),
    (StatusProperty::AudioSampleRate, |r| {
        PropertyValue::Integer(r.audio().map_or(0, |a| a.sample_rate as i64))
    }),
    (StatusProperty::AudioChannels, |r| {
        PropertyValue::Integer(r.audio().map_or(0, |a| a.channels as i64))
    }),
    (StatusProperty::AudioBitsPerSample, |r| {
        PropertyValue::Integer(r.audio().map_or(0, |a| a.bits_per_sample as i64))
    }),
    (StatusProperty::HasSubtitles, |r| {
        PropertyValue::Bool(r.component(ComponentKind::Subtitle).is_some())
    }),
    (StatusProperty::SubtitleCodec, |r| codec(r, ComponentKind::Subtitle)),
    (StatusProperty::BufferingProgress, |r| PropertyValue::Float(r.fields.buffering_progress)),
    (StatusProperty::DownloadProgress, |r| PropertyValue::Float(r.fields.download_progress)),
    (StatusProperty::IsBuffering, |r| PropertyValue::Bool(r.fields.is_buffering)),
    (StatusProperty::BufferCacheLength, |r| PropertyValue::Duration(r.fields.buffer_cache_length)),
    (StatusProperty::DownloadCacheLength, |r| {
        PropertyValue::Duration(r.fields.download_cache_length)
    }),
];
