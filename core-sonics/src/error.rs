//! Error types for the sonification core.

use thiserror::Error;

/// Errors produced while preparing or configuring sound generators.
///
/// Playback itself never surfaces these to callers. Triggering a sound is an
/// infallible operation by contract; failures along the playback path are
/// logged and absorbed so a missing or broken asset cannot take down the
/// host feature that sounds are decorating.
#[derive(Error, Debug)]
pub enum SonicsError {
    // ========================================================================
    // Decode Errors
    // ========================================================================
    /// The encoded payload contained no bytes.
    #[error("Audio payload is empty")]
    EmptyPayload,

    /// The container or codec could not be identified.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// The container was readable but held no decodable audio track.
    #[error("No supported audio track found")]
    NoAudioTrack,

    /// Decoding failed partway through the payload.
    #[error("Failed to decode audio payload: {0}")]
    DecodeFailed(String),

    /// Decoding succeeded but produced zero frames of audio.
    #[error("Decoded payload contains no audio frames")]
    EmptyDecode,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// An output level outside `0.0..=1.0` was supplied.
    #[error("Invalid output level {0} (expected 0.0..=1.0)")]
    InvalidOutputLevel(f32),

    /// A playback rate that is zero, negative, or non-finite was supplied.
    #[error("Invalid playback rate {0} (expected a finite value > 0)")]
    InvalidPlaybackRate(f64),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error that does not fit other categories.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SonicsError {
    /// Returns `true` for errors raised while decoding an asset. These are
    /// the errors the decode pipeline converts into a silent fallback.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            SonicsError::EmptyPayload
                | SonicsError::InvalidFormat(_)
                | SonicsError::NoAudioTrack
                | SonicsError::DecodeFailed(_)
                | SonicsError::EmptyDecode
        )
    }

    /// Returns `true` for errors caused by out-of-range caller configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SonicsError::InvalidOutputLevel(_) | SonicsError::InvalidPlaybackRate(_)
        )
    }
}

/// Result type alias for sonification core operations.
pub type Result<T> = std::result::Result<T, SonicsError>;
