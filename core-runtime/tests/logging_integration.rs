//! Integration tests for logging initialization.
//!
//! This file runs as its own process, so it can install the global
//! subscriber for real, which the unit tests cannot do safely.

use core_runtime::error::Error;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use tracing::Level;

#[test]
fn init_installs_the_global_subscriber_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(Level::DEBUG)
        .with_target(false);

    init_logging(config.clone()).expect("first initialization should succeed");

    // Records flow through the installed subscriber without panicking.
    tracing::debug!(source = "logging_integration", "subscriber active");
    tracing::info!(master_gain = 0.8, "structured fields accepted");

    let err = init_logging(config).expect_err("second initialization must fail");
    assert!(matches!(err, Error::Logging(_)));
}

#[test]
fn invalid_filter_surfaces_config_error() {
    let config = LoggingConfig::default().with_filter("core_sonics=notalevel,]]]");
    let err = init_logging(config).expect_err("malformed filter should be rejected");
    assert!(matches!(err, Error::Config(_)));
}
