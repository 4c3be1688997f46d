//! Integration tests for Open, transport commands, Dispose and lane routing

mod helpers;

use std::time::Duration;

use helpers::*;
use mpx_common::{ComponentKind, MediaEvent, MediaState, PropertyValue};
use mpx_engine::{
    CommandKind, CommandOutcome, Error, MediaEngine, ResourceRegistry, SkipReason, StatusProperty,
};

async fn opened_engine(media: FakeMedia) -> (MediaEngine, Probe, ResourceRegistry) {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(media, &probe, &registry);
    assert_eq!(engine.open("movie.mkv").await.unwrap(), CommandOutcome::Executed);
    (engine, probe, registry)
}

#[tokio::test]
async fn test_open_event_sequence_and_status() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::video_and_audio(), &probe, &registry);
    let mut rx = engine.subscribe();

    engine.open("movie.mkv").await.unwrap();

    let events = drain_events(&mut rx);
    assert_eq!(
        event_names(&events),
        vec!["StateChanged", "MediaOpening", "StateChanged", "MediaOpened", "PropertiesChanged"]
    );
    match &events[3] {
        MediaEvent::MediaOpened { format, components, .. } => {
            assert_eq!(format, "fake");
            assert_eq!(components, &vec![ComponentKind::Video, ComponentKind::Audio]);
        }
        other => panic!("unexpected event {:?}", other),
    }

    let status = engine.status();
    assert_eq!(status.media_state(), MediaState::Stopped);
    assert!(status.is_open());
    assert_eq!(status.source().as_deref(), Some("movie.mkv"));
    assert_eq!(status.natural_duration(), Some(Duration::from_secs(10)));
    assert_eq!(status.get(StatusProperty::HasVideo), PropertyValue::Bool(true));
    assert_eq!(status.get(StatusProperty::NaturalVideoWidth), PropertyValue::Integer(1920));
    assert_eq!(status.get(StatusProperty::AudioSampleRate), PropertyValue::Integer(48_000));
    assert_eq!(status.get(StatusProperty::HasSubtitles), PropertyValue::Bool(false));

    let summary = engine.summary();
    assert!(summary.has_container);
    assert_eq!(summary.running_workers, 3);
    assert_eq!(probe.count("container.open movie.mkv"), 1);
}

#[tokio::test]
async fn test_open_while_open_is_skipped() {
    let (engine, probe, _registry) = opened_engine(FakeMedia::audio_only()).await;

    let outcome = engine.open("other.flac").await.unwrap();

    assert_eq!(outcome, CommandOutcome::Skipped(SkipReason::AlreadyOpen));
    assert_eq!(engine.status().source().as_deref(), Some("movie.mkv"));
    assert_eq!(probe.count("container.open other.flac"), 0);
}

#[tokio::test]
async fn test_open_failure_releases_everything() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::video_and_audio().failing_open(), &probe, &registry);
    let mut rx = engine.subscribe();

    let result = engine.open("broken.mkv").await;

    assert!(matches!(result, Err(Error::Open(_))), "got {:?}", result);
    let events = drain_events(&mut rx);
    assert_eq!(count_events(&events, "MediaFailed"), 1);
    assert_eq!(count_events(&events, "MediaOpened"), 0);

    let status = engine.status();
    assert_eq!(status.media_state(), MediaState::Closed);
    assert!(!status.is_opening());
    assert_eq!(status.source(), None);
    assert!(engine.summary().is_released());
    assert_eq!(registry.total_outstanding(), 0);
}

#[tokio::test]
async fn test_transport_guards() {
    let (engine, _probe, _registry) = opened_engine(FakeMedia::video_and_audio()).await;

    assert_eq!(
        engine.pause().await.unwrap(),
        CommandOutcome::Skipped(SkipReason::InvalidState(MediaState::Stopped))
    );
    assert_eq!(engine.play().await.unwrap(), CommandOutcome::Executed);
    assert_eq!(
        engine.play().await.unwrap(),
        CommandOutcome::Skipped(SkipReason::InvalidState(MediaState::Playing))
    );
    assert_eq!(engine.pause().await.unwrap(), CommandOutcome::Executed);
    assert_eq!(engine.status().media_state(), MediaState::Paused);
    assert_eq!(engine.play().await.unwrap(), CommandOutcome::Executed);
    assert_eq!(engine.stop().await.unwrap(), CommandOutcome::Executed);
    assert_eq!(
        engine.stop().await.unwrap(),
        CommandOutcome::Skipped(SkipReason::InvalidState(MediaState::Stopped))
    );
}

#[tokio::test]
async fn test_transport_without_media_is_skipped() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::audio_only(), &probe, &registry);

    for kind in [
        CommandKind::Play,
        CommandKind::Pause,
        CommandKind::Stop,
        CommandKind::Seek {
            position: Duration::from_secs(1),
        },
        CommandKind::SetSpeed { ratio: 2.0 },
    ] {
        assert_eq!(
            engine.execute(kind).await.unwrap(),
            CommandOutcome::Skipped(SkipReason::NotOpen)
        );
    }
}

#[tokio::test]
async fn test_stop_rewinds_to_zero() {
    let (engine, _probe, _registry) = opened_engine(FakeMedia::video_and_audio()).await;
    let status = engine.status();

    engine.play().await.unwrap();
    assert!(wait_until(|| status.position() > Duration::ZERO).await);

    let mut rx = engine.subscribe();
    engine.stop().await.unwrap();

    assert_eq!(status.position(), Duration::ZERO);
    assert_eq!(status.media_state(), MediaState::Stopped);
    assert!(drain_events(&mut rx).iter().any(|e| matches!(
        e,
        MediaEvent::StateChanged {
            old_state: MediaState::Playing,
            new_state: MediaState::Stopped,
            ..
        }
    )));
}

#[tokio::test]
async fn test_seek_moves_position_and_clamps() {
    let (engine, probe, _registry) = opened_engine(FakeMedia::video_and_audio()).await;
    let mut rx = engine.subscribe();

    assert_eq!(engine.seek(Duration::from_secs(4)).await.unwrap(), CommandOutcome::Executed);
    assert_eq!(engine.status().position(), Duration::from_secs(4));
    assert!(!engine.status().is_seeking());
    assert_eq!(probe.count("container.seek 4000"), 1);
    assert!(drain_events(&mut rx)
        .iter()
        .any(|e| matches!(e, MediaEvent::SeekCompleted { position_ms: 4000, .. })));

    engine.seek(Duration::from_secs(60)).await.unwrap();
    assert_eq!(engine.status().position(), Duration::from_secs(10));
    assert_eq!(probe.count("container.seek 10000"), 1);
}

#[tokio::test]
async fn test_seek_on_unseekable_media_is_skipped() {
    let (engine, probe, _registry) = opened_engine(FakeMedia::audio_only().not_seekable()).await;

    let outcome = engine.seek(Duration::from_secs(1)).await.unwrap();

    assert_eq!(outcome, CommandOutcome::Skipped(SkipReason::NotSeekable));
    assert_eq!(engine.status().position(), Duration::ZERO);
    assert!(probe.entries().iter().all(|e| !e.starts_with("container.seek")));
}

#[tokio::test]
async fn test_set_speed_validates_ratio() {
    let (engine, _probe, _registry) = opened_engine(FakeMedia::audio_only()).await;

    assert_eq!(engine.set_speed(2.0).await.unwrap(), CommandOutcome::Executed);
    assert_eq!(engine.status().speed_ratio(), 2.0);

    for ratio in [0.0, -1.0, 9.0, f64::NAN, f64::INFINITY] {
        let result = engine.set_speed(ratio).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))), "ratio {} gave {:?}", ratio, result);
    }
    assert_eq!(engine.status().speed_ratio(), 2.0);

    // The lane keeps running after a failed command
    assert_eq!(engine.set_speed(0.5).await.unwrap(), CommandOutcome::Executed);
}

#[tokio::test]
async fn test_media_end_then_play_rewinds() {
    let mut media = FakeMedia::audio_only();
    media.info.duration = Some(Duration::from_millis(150));
    let (engine, probe, _registry) = opened_engine(media).await;
    let status = engine.status();
    let mut rx = engine.subscribe();

    engine.play().await.unwrap();
    assert!(wait_until(|| status.has_media_ended()).await);
    assert!(wait_until(|| status.media_state() == MediaState::Stopped).await);
    assert_eq!(status.position(), Duration::from_millis(150));

    let events = drain_events(&mut rx);
    assert_eq!(count_events(&events, "MediaEnded"), 1);

    engine.play().await.unwrap();
    assert_eq!(probe.count("container.seek 0"), 1);
}

#[tokio::test]
async fn test_dispose_closes_and_rejects_later_commands() {
    let (engine, probe, registry) = opened_engine(FakeMedia::video_and_audio()).await;
    let mut rx = engine.subscribe();

    assert_eq!(engine.dispose().await.unwrap(), CommandOutcome::Executed);

    let events = drain_events(&mut rx);
    assert_eq!(count_events(&events, "MediaClosed"), 1);
    assert_eq!(count_events(&events, "EngineDisposed"), 1);
    assert!(engine.is_disposed());
    assert!(engine.summary().is_disposed);
    assert!(engine.summary().is_released());
    assert_eq!(registry.total_outstanding(), 0);
    assert_eq!(probe.count("container.dispose"), 1);

    assert!(matches!(engine.open("again.mkv").await, Err(Error::EngineDisposed)));
    assert!(matches!(engine.submit(CommandKind::Close), Err(Error::EngineDisposed)));
    assert!(matches!(engine.dispose().await, Err(Error::EngineDisposed)));
}

#[tokio::test]
async fn test_dispose_when_closed_emits_no_close() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::audio_only(), &probe, &registry);
    let mut rx = engine.subscribe();

    engine.dispose().await.unwrap();

    let events = drain_events(&mut rx);
    assert_eq!(event_names(&events), vec!["EngineDisposed"]);
}

#[tokio::test]
async fn test_dropping_engine_releases_media() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::video_and_audio(), &probe, &registry);
    engine.open("movie.mkv").await.unwrap();
    engine.play().await.unwrap();

    drop(engine);

    assert_eq!(probe.count("container.dispose"), 1);
    assert_eq!(probe.running_workers(), 0);
    assert_eq!(registry.total_outstanding(), 0);
}

#[tokio::test]
async fn test_engines_have_independent_lanes() {
    let probe_a = Probe::new();
    let probe_b = Probe::new();
    let registry = ResourceRegistry::new();
    let engine_a = probe_engine(FakeMedia::audio_only(), &probe_a, &registry);
    let engine_b = probe_engine(FakeMedia::video_and_audio(), &probe_b, &registry);
    assert_ne!(engine_a.id(), engine_b.id());

    let (a, b) = tokio::join!(engine_a.open("a.flac"), engine_b.open("b.mkv"));
    assert!(a.unwrap().is_executed());
    assert!(b.unwrap().is_executed());

    engine_a.close().await.unwrap();
    assert!(engine_b.status().is_open(), "closing one engine leaves the other open");
    assert_eq!(probe_b.count("container.dispose"), 0);

    let foreign = engine_a.command(CommandKind::Play);
    assert!(matches!(engine_b.queue().submit(foreign), Err(Error::InvalidInput(_))));
}

#[test]
fn test_execute_blocking_outside_runtime() {
    let probe = Probe::new();
    let registry = ResourceRegistry::new();
    let engine = probe_engine(FakeMedia::audio_only(), &probe, &registry);

    let open = CommandKind::Open { source: "a.flac".into() };
    assert!(engine.execute_blocking(open).unwrap().is_executed());
    assert!(engine.execute_blocking(CommandKind::Close).unwrap().is_executed());
    assert!(engine.execute_blocking(CommandKind::Close).unwrap().is_skipped());
}
