//! Integration tests for sound generators against the headless graph.

use bridge_headless::HeadlessAudioGraph;
use bridge_traits::graph::PcmBuffer;
use core_runtime::events::{EventBus, GeneratorEvent, SonicEvent};
use core_sonics::{BufferSlot, ClipOptions, SoundClip, SoundPlayer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::timeout;

fn click() -> Arc<PcmBuffer> {
    Arc::new(PcmBuffer::new(vec![0.5, -0.5, 0.25, -0.25], 44_100, 1))
}

fn clip_on(graph: &Arc<HeadlessAudioGraph>, options: ClipOptions) -> SoundClip {
    SoundClip::new(graph.clone(), click(), options, EventBus::new(32))
}

/// Poll until `check` holds; instance teardown runs on background tasks.
async fn wait_until<F: Fn() -> bool>(what: &str, check: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !check() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn next_generator_event(sub: &mut broadcast::Receiver<SonicEvent>) -> GeneratorEvent {
    loop {
        let event = timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timed out waiting for generator event")
            .expect("event bus closed");
        if let SonicEvent::Generator(event) = event {
            return event;
        }
    }
}

#[tokio::test]
async fn one_shot_triggers_overlap() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let clip = clip_on(&graph, ClipOptions::default());

    clip.play().await;
    clip.play().await;
    clip.play().await;

    assert!(clip.is_playing());
    assert_eq!(clip.active_instances(), 3);
    assert_eq!(graph.playing_count(), 3);
    let voices = graph.playing_voices();

    assert_eq!(graph.complete_all(), 3);
    wait_until("instances to wind down", || clip.active_instances() == 0).await;
    assert!(!clip.is_playing());
    for voice in voices {
        wait_until("voice release", || graph.was_released(voice)).await;
    }
}

#[tokio::test]
async fn stop_silences_every_instance() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let clip = clip_on(&graph, ClipOptions::default());

    clip.play().await;
    clip.play().await;
    let voices = graph.playing_voices();
    assert_eq!(voices.len(), 2);

    clip.stop().await;

    assert_eq!(clip.active_instances(), 0);
    assert_eq!(graph.playing_count(), 0);
    for voice in voices {
        wait_until("voice release", || graph.was_released(voice)).await;
    }

    // Stopping again with nothing sounding is harmless.
    clip.stop().await;
    assert_eq!(clip.active_instances(), 0);
}

#[tokio::test]
async fn pre_decode_requests_collapse_to_the_last() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let slot = BufferSlot::empty();
    let clip = SoundClip::new(
        graph.clone(),
        slot.clone(),
        ClipOptions::default(),
        EventBus::new(32),
    );

    clip.play().await;
    clip.play().await;
    clip.stop().await;
    clip.play().await;
    assert!(!clip.is_playing());
    assert_eq!(graph.playing_count(), 0);

    slot.resolve(click());
    wait_until("deferred trigger to run", || clip.is_playing()).await;
    assert_eq!(clip.active_instances(), 1);
    assert_eq!(graph.playing_count(), 1);
}

#[tokio::test]
async fn pre_decode_stop_cancels_earlier_trigger() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let slot = BufferSlot::empty();
    let clip = SoundClip::new(
        graph.clone(),
        slot.clone(),
        ClipOptions::default(),
        EventBus::new(32),
    );

    clip.play().await;
    clip.stop().await;

    slot.resolve(click());
    wait_until("buffer to resolve", || clip.is_ready()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(clip.active_instances(), 0);
    assert_eq!(graph.playing_count(), 0);
}

#[tokio::test]
async fn deferred_one_shot_keeps_trigger_time_rate() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let slot = BufferSlot::empty();
    let clip = SoundClip::new(
        graph.clone(),
        slot.clone(),
        ClipOptions::default(),
        EventBus::new(32),
    );

    clip.set_playback_rate(2.0);
    clip.play().await;
    clip.set_playback_rate(1.0);

    slot.resolve(click());
    wait_until("deferred trigger to run", || clip.is_playing()).await;
    let voice = graph.playing_voices()[0];
    assert_eq!(graph.rate_of(voice), Some(2.0));
}

#[tokio::test]
async fn one_shot_rate_fixed_at_trigger() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let clip = clip_on(&graph, ClipOptions::default());

    clip.set_playback_rate(1.5);
    clip.play().await;
    clip.set_playback_rate(2.0);
    clip.play().await;

    let mut rates: Vec<f64> = graph
        .playing_voices()
        .iter()
        .filter_map(|&voice| graph.rate_of(voice))
        .collect();
    rates.sort_by(f64::total_cmp);
    assert_eq!(rates, vec![1.5, 2.0]);
}

#[tokio::test]
async fn loop_restart_replaces_the_instance() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let clip = clip_on(&graph, ClipOptions::default().with_looping(true));
    assert!(clip.is_looping());

    clip.start().await;
    assert!(clip.is_playing());
    let first = graph.playing_voices()[0];
    assert_eq!(graph.is_looping(first), Some(true));

    clip.start().await;
    assert_eq!(clip.active_instances(), 1);
    assert_eq!(graph.playing_count(), 1);
    let second = graph.playing_voices()[0];
    assert_ne!(first, second);
    wait_until("replaced instance release", || graph.was_released(first)).await;

    clip.stop().await;
    assert!(!clip.is_playing());
    assert_eq!(graph.playing_count(), 0);
}

#[tokio::test]
async fn instances_complete_when_their_buffer_runs_out() {
    let graph = Arc::new(HeadlessAudioGraph::auto_completing());
    let buffer = Arc::new(PcmBuffer::silence(8_000, 1, Duration::from_millis(20)));
    let clip = SoundClip::new(graph.clone(), buffer, ClipOptions::default(), EventBus::new(32));

    clip.play().await;
    assert!(clip.is_playing());
    wait_until("playback to finish", || !clip.is_playing()).await;
    assert_eq!(graph.playing_count(), 0);
}

#[tokio::test]
async fn natural_and_stopped_ends_are_distinguished() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let bus = EventBus::new(32);
    let mut sub = bus.subscribe();
    let clip = SoundClip::new(graph.clone(), click(), ClipOptions::default(), bus.clone());

    clip.play().await;
    let voice = graph.playing_voices()[0];
    graph.complete(voice).unwrap();
    wait_until("natural end", || clip.active_instances() == 0).await;

    clip.play().await;
    clip.stop().await;

    assert!(matches!(
        next_generator_event(&mut sub).await,
        GeneratorEvent::InstanceStarted { .. }
    ));
    match next_generator_event(&mut sub).await {
        GeneratorEvent::InstanceEnded { completed, .. } => assert!(completed),
        other => panic!("expected a completion, got {:?}", other),
    }
    assert!(matches!(
        next_generator_event(&mut sub).await,
        GeneratorEvent::InstanceStarted { .. }
    ));
    match next_generator_event(&mut sub).await {
        GeneratorEvent::InstanceEnded { completed, .. } => assert!(!completed),
        other => panic!("expected a stop, got {:?}", other),
    }
}

#[tokio::test]
async fn backend_failure_ends_the_instance() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let bus = EventBus::new(32);
    let mut sub = bus.subscribe();
    let clip = SoundClip::new(graph.clone(), click(), ClipOptions::default(), bus.clone());

    clip.play().await;
    let voice = graph.playing_voices()[0];
    graph.fail(voice, "device lost").unwrap();

    wait_until("failed instance to wind down", || {
        clip.active_instances() == 0
    })
    .await;
    assert!(!clip.is_playing());
    wait_until("voice release", || graph.was_released(voice)).await;

    assert!(matches!(
        next_generator_event(&mut sub).await,
        GeneratorEvent::InstanceStarted { .. }
    ));
    match next_generator_event(&mut sub).await {
        GeneratorEvent::InstanceEnded { completed, .. } => assert!(!completed),
        other => panic!("expected a failed end, got {:?}", other),
    }
}

#[tokio::test]
async fn a_resolved_slot_feeds_later_generators_immediately() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let bus = EventBus::new(32);
    let first = SoundClip::new(graph.clone(), click(), ClipOptions::default(), bus.clone());
    let second = SoundClip::new(
        graph.clone(),
        first.buffer_slot(),
        ClipOptions::default(),
        bus,
    );

    assert!(second.is_ready());
    second.play().await;
    assert_eq!(graph.playing_count(), 1);
}
