//! Container detection hints derived from asset MIME types.

use symphonia::core::probe::Hint;

/// Maps the MIME type an asset was delivered with to probe hints.
///
/// Hints only steer which format readers the probe tries first; the probe
/// still inspects the byte stream, so a wrong or missing MIME type degrades
/// to a slower probe rather than a failure.
pub struct FormatDetector;

impl FormatDetector {
    /// Build a probe hint from a MIME type, tolerating parameters such as
    /// `;codecs=opus` and surrounding whitespace.
    pub fn hint_from_mime_type(mime_type: &str) -> Hint {
        let mut hint = Hint::new();
        let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();
        if essence.is_empty() {
            return hint;
        }
        hint.mime_type(essence);
        if let Some(extension) = Self::extension_for_mime(essence) {
            hint.with_extension(extension);
        }
        hint
    }

    /// The conventional file extension for a MIME type, if known.
    pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
        let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();
        match essence.to_ascii_lowercase().as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some("wav"),
            "audio/mpeg" | "audio/mp3" | "audio/x-mp3" => Some("mp3"),
            "audio/ogg" | "application/ogg" | "audio/vorbis" => Some("ogg"),
            "audio/opus" => Some("opus"),
            "audio/flac" | "audio/x-flac" => Some("flac"),
            "audio/aac" | "audio/aacp" => Some("aac"),
            "audio/mp4" | "audio/x-m4a" | "audio/m4a" => Some("m4a"),
            "audio/aiff" | "audio/x-aiff" => Some("aiff"),
            _ => None,
        }
    }
}
