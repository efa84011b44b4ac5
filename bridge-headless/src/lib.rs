//! # Headless Bridge Implementation
//!
//! In-process implementation of the audio graph bridge with no device
//! dependency.
//!
//! ## Overview
//!
//! This crate provides a production-ready [`AudioGraphAdapter`] that tracks
//! voices entirely in memory:
//! - Deterministic manual completion hooks for tests
//! - Optional wall-clock auto-completion scaled by buffer duration and rate
//! - Inspection helpers (`gain_of`, `rate_of`, `was_released`) so callers can
//!   observe exactly what the core asked the graph to do
//!
//! It backs test suites, demos, and hosts that run with sound disabled but
//! still want the sonification core's full control flow exercised.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_headless::HeadlessAudioGraph;
//! use bridge_traits::graph::{AudioGraphAdapter, VoiceRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let graph = HeadlessAudioGraph::new();
//!     let voice = graph.prepare(request).await.unwrap();
//!     graph.start(voice).await.unwrap();
//!     graph.complete(voice).unwrap(); // deterministic end-of-voice
//! }
//! ```
//!
//! [`AudioGraphAdapter`]: bridge_traits::graph::AudioGraphAdapter

mod graph;

pub use graph::HeadlessAudioGraph;
