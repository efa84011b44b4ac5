//! # Host Bridge Traits
//!
//! Audio output abstraction that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the sonification core and the
//! host's audio output machinery. The core decodes assets and decides what
//! should sound when; the [`AudioGraphAdapter`](graph::AudioGraphAdapter)
//! turns those decisions into audible voices on whatever backend the host
//! runs (native device graph, web audio, or a headless graph for tests and
//! silent environments).
//!
//! ## Types
//!
//! - [`AudioGraphAdapter`](graph::AudioGraphAdapter) - Voice provisioning,
//!   start/stop, live gain, end-of-voice notification
//! - [`PcmBuffer`](graph::PcmBuffer) - Decoded interleaved samples shared
//!   read-only between voices
//! - [`VoiceRequest`](graph::VoiceRequest) / [`VoiceId`](graph::VoiceId) -
//!   What to play and the handle to control it
//! - [`VoiceEndReason`](graph::VoiceEndReason) - Natural completion vs.
//!   explicit stop vs. backend failure
//!
//! ## Error Handling
//!
//! All graph operations use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert backend-specific errors to `BridgeError`
//! and provide actionable messages; the core treats every graph error as
//! recoverable and never lets one destabilize the running application.
//!
//! ## Thread Safety
//!
//! The adapter trait requires `Send + Sync` so voices can be driven from any
//! async task. Implementations must ensure thread safety internally.
//!
//! ## Examples
//!
//! ### Implementing AudioGraphAdapter
//!
//! ```ignore
//! use bridge_traits::error::Result;
//! use bridge_traits::graph::{AudioGraphAdapter, VoiceId, VoiceRequest};
//! use async_trait::async_trait;
//!
//! pub struct MyGraph {
//!     // backend handle
//! }
//!
//! #[async_trait]
//! impl AudioGraphAdapter for MyGraph {
//!     async fn prepare(&self, request: VoiceRequest) -> Result<VoiceId> {
//!         // allocate a source node and a gain node, wire them up
//!         todo!()
//!     }
//!
//!     // ...remaining methods
//! #    async fn start(&self, _: VoiceId) -> Result<()> { todo!() }
//! #    async fn stop(&self, _: VoiceId) -> Result<()> { todo!() }
//! #    async fn set_gain(&self, _: VoiceId, _: f32) -> Result<()> { todo!() }
//! #    async fn wait_ended(&self, _: VoiceId) -> Result<bridge_traits::graph::VoiceEndReason> { todo!() }
//! #    async fn release(&self, _: VoiceId) -> Result<()> { todo!() }
//! #    async fn active_voices(&self) -> Result<usize> { todo!() }
//! }
//! ```

pub mod error;
pub mod graph;

pub use error::BridgeError;

// Re-export commonly used types
pub use graph::{AudioGraphAdapter, PcmBuffer, VoiceEndReason, VoiceId, VoiceRequest};
