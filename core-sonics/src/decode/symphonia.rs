//! Symphonia-backed decoding of in-memory encoded assets.

use super::convert::SampleConverter;
use super::format::FormatDetector;
use crate::error::{Result, SonicsError};
use crate::options::EncodedPayload;
use bridge_traits::graph::PcmBuffer;
use std::io::Cursor;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use tracing::{debug, instrument};

/// Decode an encoded payload to an interleaved PCM buffer.
///
/// The whole payload is decoded eagerly; sonification assets are short
/// notification sounds, not streamed media. Individual corrupt packets are
/// skipped so a damaged asset still yields whatever audio is recoverable.
#[instrument(skip(payload), fields(mime = %payload.mime_type(), bytes = payload.len()))]
pub fn decode_payload(payload: &EncodedPayload) -> Result<PcmBuffer> {
    if payload.is_empty() {
        return Err(SonicsError::EmptyPayload);
    }

    let hint = FormatDetector::hint_from_mime_type(payload.mime_type());
    let cursor = Cursor::new(payload.data().to_vec());
    let stream = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SonicsError::InvalidFormat(e.to_string()))?;
    let mut reader = probed.format;

    let (track_id, codec_params) = {
        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(SonicsError::NoAudioTrack)?;
        (track.id, track.codec_params.clone())
    };

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| SonicsError::InvalidFormat("track missing sample rate".to_string()))?;
    // Some containers only reveal the channel layout once the first packet
    // decodes, so this may be refined inside the loop.
    let mut channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| SonicsError::InvalidFormat(e.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(SonicsError::DecodeFailed(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let decoded_channels = decoded.spec().channels.count() as u16;
                if decoded_channels != 0 {
                    channels = decoded_channels;
                }
                SampleConverter::append_interleaved_f32(&decoded, &mut samples);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("skipping undecodable packet: {}", e);
            }
            Err(SymphoniaError::IoError(e)) => {
                debug!("skipping packet after i/o error: {}", e);
            }
            Err(e) => return Err(SonicsError::DecodeFailed(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(SonicsError::EmptyDecode);
    }

    let buffer = PcmBuffer::new(samples, sample_rate, channels.max(1));
    debug!(
        frames = buffer.frames(),
        sample_rate = buffer.sample_rate,
        channels = buffer.channels,
        "decoded payload"
    );
    Ok(buffer)
}
