//! Asset sources and per-generator options.

use crate::buffer::BufferSlot;
use crate::error::{Result, SonicsError};
use bridge_traits::graph::PcmBuffer;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use core_runtime::config::SonificationLevel;

/// An encoded audio asset plus the MIME type it was delivered with.
///
/// The MIME type seeds container detection; an inaccurate one is tolerated
/// because the decoder probes the byte stream itself.
#[derive(Clone, PartialEq)]
pub struct EncodedPayload {
    data: Bytes,
    mime_type: String,
}

impl EncodedPayload {
    /// Create a payload from encoded bytes and their MIME type.
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Create a payload backed by static data, e.g. an asset compiled in
    /// with `include_bytes!`.
    pub fn from_static(data: &'static [u8], mime_type: &str) -> Self {
        Self {
            data: Bytes::from_static(data),
            mime_type: mime_type.to_string(),
        }
    }

    /// The encoded bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The MIME type the asset was tagged with.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the encoded asset in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedPayload")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Where a sound generator gets its audio from.
#[derive(Debug, Clone)]
pub enum ClipSource {
    /// Audio that is already decoded.
    Decoded(Arc<PcmBuffer>),
    /// Encoded bytes to be decoded in the background.
    Encoded(EncodedPayload),
    /// A buffer cell owned elsewhere, possibly still unresolved. Lets many
    /// generators share one decode of the same asset.
    Slot(BufferSlot),
}

impl From<Arc<PcmBuffer>> for ClipSource {
    fn from(buffer: Arc<PcmBuffer>) -> Self {
        ClipSource::Decoded(buffer)
    }
}

impl From<PcmBuffer> for ClipSource {
    fn from(buffer: PcmBuffer) -> Self {
        ClipSource::Decoded(Arc::new(buffer))
    }
}

impl From<EncodedPayload> for ClipSource {
    fn from(payload: EncodedPayload) -> Self {
        ClipSource::Encoded(payload)
    }
}

impl From<BufferSlot> for ClipSource {
    fn from(slot: BufferSlot) -> Self {
        ClipSource::Slot(slot)
    }
}

fn default_output_level() -> f32 {
    1.0
}

fn default_level() -> SonificationLevel {
    SonificationLevel::Basic
}

fn default_initiate_when_disabled() -> bool {
    true
}

fn default_looping() -> bool {
    false
}

/// Options fixed at generator construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipOptions {
    /// Per-generator gain in `0.0..=1.0`. Multiplied with the master and
    /// level gains to produce the effective gain of each instance.
    #[serde(default = "default_output_level")]
    pub output_level: f32,

    /// The sonification level this generator belongs to.
    #[serde(default = "default_level")]
    pub level: SonificationLevel,

    /// When output is disabled, whether a trigger still starts an inaudible
    /// instance (`true`, suits short percussive sounds) or is dropped
    /// entirely (`false`, suits long or looping sounds).
    #[serde(default = "default_initiate_when_disabled")]
    pub initiate_when_disabled: bool,

    /// Whether the generator plays one repeating instance instead of
    /// overlapping one-shots.
    #[serde(default = "default_looping")]
    pub looping: bool,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            output_level: default_output_level(),
            level: default_level(),
            initiate_when_disabled: default_initiate_when_disabled(),
            looping: default_looping(),
        }
    }
}

impl ClipOptions {
    /// Set the per-generator output level.
    pub fn with_output_level(mut self, output_level: f32) -> Self {
        self.output_level = output_level;
        self
    }

    /// Set the sonification level.
    pub fn with_level(mut self, level: SonificationLevel) -> Self {
        self.level = level;
        self
    }

    /// Set whether triggers start inaudibly while output is disabled.
    pub fn with_initiate_when_disabled(mut self, initiate: bool) -> Self {
        self.initiate_when_disabled = initiate;
        self
    }

    /// Mark the generator as looping.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Validates option ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.output_level.is_finite() || !(0.0..=1.0).contains(&self.output_level) {
            return Err(SonicsError::InvalidOutputLevel(self.output_level));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = ClipOptions::default();
        assert_eq!(options.output_level, 1.0);
        assert_eq!(options.level, SonificationLevel::Basic);
        assert!(options.initiate_when_disabled);
        assert!(!options.looping);
    }

    #[test]
    fn builder_chain() {
        let options = ClipOptions::default()
            .with_output_level(0.7)
            .with_level(SonificationLevel::Enhanced)
            .with_initiate_when_disabled(false)
            .with_looping(true);
        assert_eq!(options.output_level, 0.7);
        assert_eq!(options.level, SonificationLevel::Enhanced);
        assert!(!options.initiate_when_disabled);
        assert!(options.looping);
    }

    #[test]
    fn validate_rejects_out_of_range_level() {
        assert!(ClipOptions::default().with_output_level(1.2).validate().is_err());
        assert!(ClipOptions::default().with_output_level(-0.1).validate().is_err());
        assert!(ClipOptions::default()
            .with_output_level(f32::NAN)
            .validate()
            .is_err());
        assert!(ClipOptions::default().with_output_level(0.0).validate().is_ok());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ClipOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ClipOptions::default());

        let options: ClipOptions =
            serde_json::from_str(r#"{"level":"enhanced","looping":true}"#).unwrap();
        assert_eq!(options.level, SonificationLevel::Enhanced);
        assert!(options.looping);
        assert_eq!(options.output_level, 1.0);
    }

    #[test]
    fn payload_reports_size_and_mime() {
        let payload = EncodedPayload::from_static(&[1, 2, 3, 4], "audio/wav");
        assert_eq!(payload.len(), 4);
        assert_eq!(payload.mime_type(), "audio/wav");
        assert!(!payload.is_empty());
    }

    #[test]
    fn sources_convert_from_assets() {
        let buffer = PcmBuffer::new(vec![0.0; 8], 44_100, 1);
        assert!(matches!(ClipSource::from(buffer), ClipSource::Decoded(_)));

        let payload = EncodedPayload::new(vec![0u8; 4], "audio/mpeg");
        assert!(matches!(ClipSource::from(payload), ClipSource::Encoded(_)));
    }
}
