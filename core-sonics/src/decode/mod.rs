//! # Asset Decoding
//!
//! Turns encoded sonification assets into shared PCM buffers.
//!
//! ## Pipeline
//!
//! ```text
//! EncodedPayload           spawn_blocking                BufferSlot
//! (bytes + MIME) ──> probe ──> decode ──> PcmBuffer ──> resolve()
//!                      │                                    ▲
//!                      └── any failure ──> silent fallback ─┘
//! ```
//!
//! Decoding happens off the async runtime because it is synchronous,
//! CPU-bound work. Failures never propagate to callers: the slot is
//! resolved with a short silent buffer, a warning is logged, and the
//! owning generator behaves exactly as if it had a real asset.

mod convert;
mod format;
mod symphonia;

pub use self::convert::SampleConverter;
pub use self::format::FormatDetector;
pub use self::symphonia::decode_payload;

use crate::buffer::BufferSlot;
use crate::options::EncodedPayload;
use bridge_traits::graph::PcmBuffer;
use core_runtime::events::{DecodeEvent, EventBus, SonicEvent};
use core_runtime::readiness::ReadinessTicket;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Sample rate of the silent fallback buffer.
pub const FALLBACK_SAMPLE_RATE: u32 = 44_100;

/// Duration of the silent fallback buffer.
pub const FALLBACK_DURATION: Duration = Duration::from_millis(100);

/// The buffer substituted when an asset cannot be decoded: a short run of
/// mono silence. Triggers against it exercise the full playback path
/// without producing sound.
pub fn fallback_buffer() -> PcmBuffer {
    PcmBuffer::silence(FALLBACK_SAMPLE_RATE, 1, FALLBACK_DURATION)
}

/// Decode `payload` in the background and resolve `slot` with the result.
///
/// The slot always resolves, with decoded audio or with the silent
/// fallback. If the slot was resolved by someone else first, that
/// resolution is kept. The ticket, when present, is completed on every
/// path so startup never waits on a failed decode.
pub(crate) fn spawn_decode(
    generator: Uuid,
    payload: EncodedPayload,
    slot: BufferSlot,
    ticket: Option<ReadinessTicket>,
    events: EventBus,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let decoded = tokio::task::spawn_blocking(move || decode_payload(&payload)).await;
        let buffer = match decoded {
            Ok(Ok(buffer)) => {
                events
                    .emit(SonicEvent::Decode(DecodeEvent::Completed {
                        generator,
                        frames: buffer.frames(),
                        sample_rate: buffer.sample_rate,
                        channels: buffer.channels,
                    }))
                    .ok();
                Arc::new(buffer)
            }
            Ok(Err(err)) => {
                warn!(generator = %generator, "decode failed, substituting silence: {}", err);
                events
                    .emit(SonicEvent::Decode(DecodeEvent::FellBack {
                        generator,
                        message: err.to_string(),
                    }))
                    .ok();
                Arc::new(fallback_buffer())
            }
            Err(join_err) => {
                warn!(
                    generator = %generator,
                    "decode task aborted, substituting silence: {}", join_err
                );
                events
                    .emit(SonicEvent::Decode(DecodeEvent::FellBack {
                        generator,
                        message: join_err.to_string(),
                    }))
                    .ok();
                Arc::new(fallback_buffer())
            }
        };

        if !slot.resolve(buffer) {
            debug!(generator = %generator, "slot already resolved, keeping first resolution");
        }
        if let Some(ticket) = ticket {
            ticket.complete();
        }
    })
}
