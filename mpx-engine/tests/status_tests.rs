//! Snapshot / diff tests against a live engine

mod helpers;

use std::time::Duration;

use helpers::*;
use mpx_common::{MediaEvent, MediaState, PropertyValue};
use mpx_engine::playback::status::PROPERTY_COUNT;
use mpx_engine::{PropertySnapshot, ResourceRegistry, StatusProperty};

#[tokio::test]
async fn test_snapshot_then_contrast_is_empty_in_every_phase() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::video_and_audio(), &probe, &registry);
    let status = engine.status();

    let check = |label: &str| {
        let mut snapshot = PropertySnapshot::new();
        status.take_snapshot_into(&mut snapshot);
        assert_eq!(snapshot.len(), PROPERTY_COUNT, "{}: snapshot incomplete", label);
        status.contrast_into(&mut snapshot);
        assert!(snapshot.is_empty(), "{}: diff not empty: {:?}", label, snapshot);
    };

    check("closed");
    engine.open("movie.mkv").await.unwrap();
    check("stopped");
    engine.seek(Duration::from_secs(3)).await.unwrap();
    check("after seek");
    engine.pause().await.unwrap();
    check("skipped pause");
    engine.close().await.unwrap();
    check("closed again");
}

#[tokio::test]
async fn test_single_change_yields_single_entry() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::video_and_audio(), &probe, &registry);
    engine.open("movie.mkv").await.unwrap();
    let status = engine.status();

    let mut snapshot = status.snapshot();
    status.set_download_progress(0.75);
    status.contrast_into(&mut snapshot);

    assert_eq!(snapshot.len(), 1);
    assert_eq!(
        snapshot.get(StatusProperty::DownloadProgress),
        Some(&PropertyValue::Float(0.75))
    );
}

#[tokio::test]
async fn test_seek_publishes_position_diff() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::video_and_audio(), &probe, &registry);
    engine.open("movie.mkv").await.unwrap();

    let mut rx = engine.subscribe();
    engine.seek(Duration::from_millis(2_100)).await.unwrap();

    let changes: Vec<_> = drain_events(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            MediaEvent::PropertiesChanged { changes, .. } => Some(changes),
            _ => None,
        })
        .flatten()
        .collect();

    let position = changes.iter().find(|c| c.name == "position").expect("position published");
    assert_eq!(position.value, PropertyValue::Duration(Duration::from_millis(2_100)));
    let timecode = changes
        .iter()
        .find(|c| c.name == "video_smpte_timecode")
        .expect("timecode published");
    assert_eq!(timecode.value, PropertyValue::Text("00:00:02:02".to_string()));
    assert!(changes.iter().all(|c| c.name != "is_seeking"), "seeking flag settles before publish");
}

#[tokio::test]
async fn test_skipped_command_publishes_nothing() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::audio_only(), &probe, &registry);
    let mut rx = engine.subscribe();

    engine.play().await.unwrap();

    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test]
async fn test_snapshot_serializes_to_json() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::audio_only(), &probe, &registry);
    engine.open("song.flac").await.unwrap();

    let changes = engine.status().snapshot().to_changes();
    let json = serde_json::to_value(&changes).unwrap();

    let source = json
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["name"] == "source")
        .unwrap();
    assert_eq!(source["value"], "song.flac");
}

#[tokio::test]
async fn test_media_end_is_published_without_a_command() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let mut media = FakeMedia::audio_only();
    media.info.duration = Some(Duration::from_millis(100));
    let engine = probe_engine(media, &probe, &registry);
    engine.open("clip.flac").await.unwrap();

    let mut rx = engine.subscribe();
    engine.play().await.unwrap();

    let mut changes = Vec::new();
    let published = wait_until(|| {
        for event in drain_events(&mut rx) {
            if let MediaEvent::PropertiesChanged { changes: batch, .. } = event {
                changes.extend(batch);
            }
        }
        changes
            .iter()
            .any(|c| c.name == "has_media_ended" && c.value == PropertyValue::Bool(true))
    })
    .await;
    assert!(published, "end of media never reached observers");

    let state = changes.iter().rev().find(|c| c.name == "media_state").expect("state published");
    assert_eq!(state.value, PropertyValue::State(MediaState::Stopped));
}
