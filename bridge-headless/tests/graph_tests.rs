//! Integration tests for the headless audio graph.

use bridge_headless::HeadlessAudioGraph;
use bridge_traits::graph::{AudioGraphAdapter, PcmBuffer, VoiceEndReason, VoiceRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn click_buffer() -> Arc<PcmBuffer> {
    Arc::new(PcmBuffer::new(vec![0.5, -0.5, 0.25, -0.25], 44_100, 1))
}

fn short_buffer(millis: u64) -> Arc<PcmBuffer> {
    Arc::new(PcmBuffer::silence(8_000, 1, Duration::from_millis(millis)))
}

#[tokio::test]
async fn manual_voice_lifecycle() {
    let graph = HeadlessAudioGraph::new();
    let voice = graph
        .prepare(VoiceRequest::new(click_buffer()).with_gain(0.4))
        .await
        .unwrap();

    assert_eq!(graph.active_voices().await.unwrap(), 1);
    assert_eq!(graph.playing_count(), 0);
    assert_eq!(graph.gain_of(voice), Some(0.4));

    graph.start(voice).await.unwrap();
    assert_eq!(graph.playing_count(), 1);

    graph.complete(voice).unwrap();
    let reason = graph.wait_ended(voice).await.unwrap();
    assert_eq!(reason, VoiceEndReason::Completed);
    assert_eq!(graph.active_voices().await.unwrap(), 0);

    graph.release(voice).await.unwrap();
    assert!(graph.was_released(voice));
    assert_eq!(graph.gain_of(voice), None);
}

#[tokio::test]
async fn stop_resolves_pending_waiter() {
    let graph = Arc::new(HeadlessAudioGraph::new());
    let voice = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    graph.start(voice).await.unwrap();

    let waiter = {
        let graph = Arc::clone(&graph);
        tokio::spawn(async move { graph.wait_ended(voice).await })
    };

    graph.stop(voice).await.unwrap();
    let reason = timeout(Duration::from_secs(2), waiter)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reason, VoiceEndReason::Stopped);
}

#[tokio::test]
async fn wait_after_end_resolves_immediately() {
    let graph = HeadlessAudioGraph::new();
    let voice = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    graph.start(voice).await.unwrap();
    graph.complete(voice).unwrap();

    let reason = timeout(Duration::from_millis(100), graph.wait_ended(voice))
        .await
        .expect("already-ended voice must resolve without waiting")
        .unwrap();
    assert_eq!(reason, VoiceEndReason::Completed);
}

#[tokio::test]
async fn auto_mode_completes_voice_after_buffer_duration() {
    let graph = HeadlessAudioGraph::auto_completing();
    let voice = graph
        .prepare(VoiceRequest::new(short_buffer(20)))
        .await
        .unwrap();
    graph.start(voice).await.unwrap();

    let reason = timeout(Duration::from_secs(2), graph.wait_ended(voice))
        .await
        .expect("auto completion timer should fire")
        .unwrap();
    assert_eq!(reason, VoiceEndReason::Completed);
}

#[tokio::test]
async fn auto_mode_never_completes_looping_voice() {
    let graph = HeadlessAudioGraph::auto_completing();
    let voice = graph
        .prepare(VoiceRequest::new(short_buffer(5)).with_looping(true))
        .await
        .unwrap();
    graph.start(voice).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(graph.playing_count(), 1);

    graph.stop(voice).await.unwrap();
    assert_eq!(graph.wait_ended(voice).await.unwrap(), VoiceEndReason::Stopped);
}

#[tokio::test]
async fn gain_changes_are_observable() {
    let graph = HeadlessAudioGraph::new();
    let voice = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    graph.start(voice).await.unwrap();

    graph.set_gain(voice, 0.12).await.unwrap();
    assert_eq!(graph.gain_of(voice), Some(0.12));
}

#[tokio::test]
async fn release_is_idempotent_and_tolerates_unknown_voices() {
    let graph = HeadlessAudioGraph::new();
    let voice = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    graph.start(voice).await.unwrap();
    graph.stop(voice).await.unwrap();

    graph.release(voice).await.unwrap();
    graph.release(voice).await.unwrap();
    assert!(graph.was_released(voice));

    let unknown = bridge_traits::graph::VoiceId::new();
    graph.release(unknown).await.unwrap();
    assert!(!graph.was_released(unknown));
}

#[tokio::test]
async fn lifecycle_misuse_is_rejected() {
    let graph = HeadlessAudioGraph::new();
    let voice = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    graph.start(voice).await.unwrap();

    assert!(graph.start(voice).await.is_err());

    graph.stop(voice).await.unwrap();
    assert!(graph.stop(voice).await.is_err());

    let unknown = bridge_traits::graph::VoiceId::new();
    assert!(graph.set_gain(unknown, 1.0).await.is_err());
    assert!(graph.start(unknown).await.is_err());
}

#[tokio::test]
async fn complete_all_skips_looping_voices() {
    let graph = HeadlessAudioGraph::new();
    let one = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    let two = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    let looper = graph
        .prepare(VoiceRequest::new(click_buffer()).with_looping(true))
        .await
        .unwrap();
    for voice in [one, two, looper] {
        graph.start(voice).await.unwrap();
    }

    assert!(graph.complete(looper).is_err());
    assert_eq!(graph.complete_all(), 2);
    assert_eq!(graph.playing_count(), 1);
}

#[tokio::test]
async fn backend_failure_reaches_waiters() {
    let graph = HeadlessAudioGraph::new();
    let voice = graph.prepare(VoiceRequest::new(click_buffer())).await.unwrap();
    graph.start(voice).await.unwrap();

    graph.fail(voice, "buffer underrun").unwrap();
    match graph.wait_ended(voice).await.unwrap() {
        VoiceEndReason::Failed { message } => assert_eq!(message, "buffer underrun"),
        other => panic!("expected failure, got {:?}", other),
    }
}
