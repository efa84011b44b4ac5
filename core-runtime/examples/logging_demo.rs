//! Logging system demonstration
//!
//! This example shows how to use the logging infrastructure in different modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use tracing::{debug, error, info, instrument, span, trace, warn, Level};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let format = if args.len() > 1 {
        match args[1].as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Pretty,
        }
    } else {
        LogFormat::default()
    };

    let filter = args.get(2).cloned();

    // Initialize logging
    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(Level::TRACE)
        .with_spans(true)
        .with_target(true);

    if let Some(f) = filter {
        config = config.with_filter(f);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!("=== Logging System Demo ===");
    info!(format = ?format, "Logging initialized");

    // Demonstrate different log levels
    demo_log_levels();

    // Demonstrate structured logging
    demo_structured_logging();

    // Demonstrate spans for tracing
    demo_spans().await;

    // Demonstrate instrumentation
    demo_instrumentation().await;

    info!("=== Demo Complete ===");
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("This is a TRACE level log");
    debug!("This is a DEBUG level log");
    info!("This is an INFO level log");
    warn!("This is a WARN level log");
    error!("This is an ERROR level log");
}

fn demo_structured_logging() {
    let span = span!(Level::INFO, "structured_logging");
    let _enter = span.enter();

    info!("Simple message without fields");

    info!(
        asset = "chime.ogg",
        frames = 4410,
        sample_rate = 44100,
        "Decoded asset information"
    );

    info!(
        registered_generators = 12,
        active_voices = 3,
        master_gain = 0.8,
        "Sonification state"
    );
}

async fn demo_spans() {
    let span = span!(Level::INFO, "decode_asset", asset = "notify.wav");
    let _enter = span.enter();

    info!("Starting asset decode");

    {
        let inner_span = span!(Level::DEBUG, "probe_container");
        let _inner = inner_span.enter();

        debug!(container = "wav", "Probed container format");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    {
        let inner_span = span!(Level::DEBUG, "decode_packets");
        let _inner = inner_span.enter();

        debug!(decoded = 50, total = 150, "Decoding packets");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    info!(frames = 66150, "Asset decode completed");
}

#[instrument]
async fn demo_instrumentation() {
    info!("Instrumented function automatically creates spans");

    let triggers = vec!["keypress", "boundary", "notify"];
    process_triggers(&triggers).await;
}

#[instrument(fields(count = triggers.len()))]
async fn process_triggers(triggers: &[&str]) {
    debug!("Processing triggers");

    for (idx, trigger) in triggers.iter().enumerate() {
        process_trigger(idx, trigger).await;
    }

    info!("All triggers processed");
}

#[instrument(fields(trigger_id = idx))]
async fn process_trigger(idx: usize, trigger: &str) {
    trace!(trigger = %trigger, "Processing individual trigger");
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
}
