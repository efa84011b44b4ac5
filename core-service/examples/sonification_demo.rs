//! End-to-end demo of the sonification core on the bundled headless graph.
//!
//! Run with `cargo run --example sonification_demo` and watch the log
//! output. The headless graph completes one-shot voices on its own, so the
//! demo behaves like a host with a real audio device, minus the speakers.

use anyhow::Result;
use bridge_headless::HeadlessAudioGraph;
use bridge_traits::graph::PcmBuffer;
use core_runtime::config::SonificationConfig;
use core_runtime::events::{EventStream, SonicEvent};
use core_runtime::logging::{init_logging, LoggingConfig};
use core_service::SonificationService;
use core_sonics::{ClipOptions, ClipSource, SonificationLevel, SoundPlayer};
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A sine tone at `frequency` hertz.
fn tone(frequency: f32, duration: Duration) -> PcmBuffer {
    let sample_rate = 44_100u32;
    let frames = (sample_rate as f64 * duration.as_secs_f64()) as usize;
    let samples = (0..frames)
        .map(|i| (TAU * frequency * i as f32 / sample_rate as f32).sin() * 0.4)
        .collect();
    PcmBuffer::new(samples, sample_rate, 1)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default())?;

    let config = SonificationConfig::full().with_master_gain(0.8);
    let graph = Arc::new(HeadlessAudioGraph::auto_completing());
    let service = SonificationService::new(config, graph)?;

    // Mirror registry and gain changes into the log through a filtered stream.
    let mut manager_events = EventStream::new(service.events().subscribe())
        .filter(|event| matches!(event, SonicEvent::Manager(_)));
    tokio::spawn(async move {
        while let Ok(event) = manager_events.recv().await {
            info!(severity = ?event.severity(), "{}", event.description());
        }
    });

    // Named one-shots triggered from anywhere that can reach the catalog.
    let catalog = service.catalog();
    catalog.define(
        "confirm",
        tone(880.0, Duration::from_millis(120)),
        ClipOptions::default().with_output_level(0.9),
    );
    catalog.define(
        "notify",
        tone(660.0, Duration::from_millis(200)),
        ClipOptions::default().with_level(SonificationLevel::Enhanced),
    );

    catalog.play("confirm").await;
    catalog.play("notify").await;
    // Unknown names are logged and ignored.
    catalog.play("escape-hatch").await;

    // A looping ambience under everything else.
    let ambience = service
        .clip(
            tone(220.0, Duration::from_millis(500)),
            ClipOptions::default()
                .with_looping(true)
                .with_output_level(0.6),
        )
        .await;
    ambience.start().await;
    info!(playing = ambience.is_playing(), "ambience running");

    // A value-keyed family, the kind a list view triggers on edits.
    let edits = service
        .multi_clip(
            vec![
                ("added", ClipSource::from(tone(523.0, Duration::from_millis(90)))),
                ("removed", ClipSource::from(tone(392.0, Duration::from_millis(90)))),
            ],
            ClipOptions::default(),
        )
        .await;
    edits.play_value(&"added").await;
    edits.play_value(&"removed").await;
    edits.play_value(&"renamed").await;

    service.wait_ready().await;
    info!(
        registered = service.manager().registered_count(),
        "all assets ready"
    );

    // Let the one-shots run their course, then duck everything.
    tokio::time::sleep(Duration::from_millis(300)).await;
    service.manager().set_master_gain(0.4).await;
    info!(master = service.manager().master_gain(), "master ducked");

    tokio::time::sleep(Duration::from_millis(200)).await;
    ambience.stop().await;
    info!(playing = ambience.is_playing(), "ambience stopped");

    Ok(())
}
