//! Audio graph bridge trait and supporting voice types.
//!
//! These abstractions let the sonification core drive a host audio output
//! graph without knowing how the host realizes sound. A voice is one playing
//! occurrence of a decoded buffer, routed through a per-voice gain stage that
//! can be adjusted while the voice is sounding. Host applications provide a
//! concrete implementation per backend (native device graph, web audio,
//! headless test graph).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Decoded PCM audio, shared read-only between every voice derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Interleaved samples in the range `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of audio channels.
    pub channels: u16,
}

impl PcmBuffer {
    /// Create a buffer from interleaved samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Create a silent buffer of the given duration.
    pub fn silence(sample_rate: u32, channels: u16, duration: Duration) -> Self {
        let frames = (sample_rate as f64 * duration.as_secs_f64()) as usize;
        Self {
            samples: vec![0.0; frames * channels.max(1) as usize],
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Number of frames (one sample per channel) in the buffer.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Playback duration of the buffer at its native rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Returns `true` if the buffer contains no sample data.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Unique identifier for voices managed by a graph adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(Uuid);

impl VoiceId {
    /// Generate a new voice identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VoiceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Request describing the voice a graph adapter should provision.
#[derive(Debug, Clone)]
pub struct VoiceRequest {
    /// Decoded audio to play.
    pub buffer: Arc<PcmBuffer>,
    /// Initial gain applied by the voice's gain stage (0.0 = silent,
    /// 1.0 = unity).
    pub gain: f32,
    /// Playback rate multiplier; 1.0 plays at the buffer's native rate.
    pub rate: f64,
    /// Whether the voice repeats from the start until explicitly stopped.
    pub looping: bool,
}

impl VoiceRequest {
    /// Construct a request with unity gain, native rate, no looping.
    pub fn new(buffer: Arc<PcmBuffer>) -> Self {
        Self {
            buffer,
            gain: 1.0,
            rate: 1.0,
            looping: false,
        }
    }

    /// Attach an initial gain.
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Attach a playback rate.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Mark the voice as looping.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

/// Why a voice stopped producing audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceEndReason {
    /// The buffer played through to its natural end.
    Completed,
    /// An explicit stop request ended the voice.
    Stopped,
    /// The backend failed while the voice was active.
    Failed { message: String },
}

impl VoiceEndReason {
    /// Returns `true` when the voice ran to completion on its own.
    pub fn is_natural(&self) -> bool {
        matches!(self, VoiceEndReason::Completed)
    }
}

/// Trait for host audio graph backends that realize voices as audible output.
///
/// Implementations own the device or engine connection. The core only holds
/// [`VoiceId`] handles and never assumes anything about timing beyond the
/// contract documented on each method.
#[async_trait::async_trait]
pub trait AudioGraphAdapter: Send + Sync {
    /// Allocate a voice for the request and connect it through a dedicated
    /// gain stage. The voice produces no audio until [`start`] is called.
    ///
    /// [`start`]: AudioGraphAdapter::start
    async fn prepare(&self, request: VoiceRequest) -> Result<VoiceId>;

    /// Begin playback of a prepared voice from the start of its buffer.
    async fn start(&self, voice: VoiceId) -> Result<()>;

    /// Stop a voice immediately. Pending [`wait_ended`] calls resolve with
    /// [`VoiceEndReason::Stopped`]. Stopping an already-ended voice is an
    /// error the caller is expected to tolerate.
    ///
    /// [`wait_ended`]: AudioGraphAdapter::wait_ended
    async fn stop(&self, voice: VoiceId) -> Result<()>;

    /// Adjust the voice's gain stage. Takes effect on audio that is already
    /// sounding, without reconnecting the voice.
    async fn set_gain(&self, voice: VoiceId, gain: f32) -> Result<()>;

    /// Wait until the voice ends, naturally or by stop. Looping voices only
    /// end via [`stop`]. Resolves immediately if the voice already ended.
    ///
    /// [`stop`]: AudioGraphAdapter::stop
    async fn wait_ended(&self, voice: VoiceId) -> Result<VoiceEndReason>;

    /// Release resources held by an ended voice. Releasing an unknown or
    /// already-released voice is a no-op.
    async fn release(&self, voice: VoiceId) -> Result<()>;

    /// Number of voices currently prepared or playing.
    async fn active_voices(&self) -> Result<usize>;
}
