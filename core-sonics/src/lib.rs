//! # Sonification Core
//!
//! Decodes sound assets and drives their playback through an abstract
//! audio graph.
//!
//! ## Overview
//!
//! This crate provides:
//! - Asynchronous asset decoding via symphonia, with a silent fallback
//!   buffer when an asset cannot be decoded
//! - [`SoundClip`], a generator for one-shot and looping playback with
//!   deferred triggers while its buffer is still decoding
//! - [`SoundManager`], the registry that composes master and per-level
//!   gain policy onto every registered generator
//! - [`MultiClip`], a family of one-shot sounds keyed by host values
//! - [`SharedSoundClip`], a lazily built player shared across call sites
//!
//! Playback itself happens behind the [`AudioGraphAdapter`] trait from
//! `bridge-traits`; this crate never touches an audio device directly.
//!
//! [`AudioGraphAdapter`]: bridge_traits::graph::AudioGraphAdapter

pub mod buffer;
pub mod clip;
pub mod decode;
pub mod error;
pub mod manager;
pub mod multi;
pub mod options;
pub mod shared;

pub use buffer::BufferSlot;
pub use clip::{AmbientGain, GeneratorId, SoundClip, SoundGenerator, SoundPlayer};
pub use error::{Result, SonicsError};
pub use manager::{RegisterOptions, SoundManager};
pub use multi::{MultiClip, MultiClipBuilder};
pub use options::{ClipOptions, ClipSource, EncodedPayload, SonificationLevel};
pub use shared::SharedSoundClip;
