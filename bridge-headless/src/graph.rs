//! In-memory voice tracking with deterministic completion.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    graph::{AudioGraphAdapter, VoiceEndReason, VoiceId, VoiceRequest},
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
enum VoicePhase {
    Prepared,
    Playing,
    Ended(VoiceEndReason),
}

struct VoiceEntry {
    request: VoiceRequest,
    gain: f32,
    phase: VoicePhase,
    done: watch::Sender<Option<VoiceEndReason>>,
    timer_cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionMode {
    /// Voices end only via [`HeadlessAudioGraph::complete`] or `stop`.
    Manual,
    /// Non-looping voices end after their buffer duration scaled by rate.
    Auto,
}

struct GraphShared {
    mode: CompletionMode,
    voices: Mutex<HashMap<VoiceId, VoiceEntry>>,
    released: Mutex<HashSet<VoiceId>>,
}

impl GraphShared {
    fn end_entry(voice: VoiceId, entry: &mut VoiceEntry, reason: VoiceEndReason) -> Result<()> {
        if let VoicePhase::Ended(_) = entry.phase {
            return Err(BridgeError::OperationFailed(format!(
                "voice {} already ended",
                voice.as_uuid()
            )));
        }
        entry.phase = VoicePhase::Ended(reason.clone());
        entry.timer_cancel.cancel();
        entry.done.send(Some(reason)).ok();
        Ok(())
    }

    fn finish(&self, voice: VoiceId, reason: VoiceEndReason) -> Result<()> {
        let mut voices = self.voices.lock();
        let entry = voices
            .get_mut(&voice)
            .ok_or_else(|| BridgeError::UnknownVoice(voice.as_uuid().to_string()))?;
        Self::end_entry(voice, entry, reason)
    }
}

/// Audio graph that realizes voices as in-memory state instead of sound.
///
/// Two completion modes:
/// - [`HeadlessAudioGraph::new`]: manual, voices end only when a test calls
///   [`complete`](HeadlessAudioGraph::complete) or the core calls `stop`
/// - [`HeadlessAudioGraph::auto_completing`]: non-looping voices end on a
///   timer matching the buffer duration scaled by playback rate
pub struct HeadlessAudioGraph {
    shared: Arc<GraphShared>,
}

impl HeadlessAudioGraph {
    /// Create a graph with manual completion.
    pub fn new() -> Self {
        Self::with_mode(CompletionMode::Manual)
    }

    /// Create a graph whose non-looping voices complete on their own after
    /// the buffer's scaled duration elapses.
    pub fn auto_completing() -> Self {
        Self::with_mode(CompletionMode::Auto)
    }

    fn with_mode(mode: CompletionMode) -> Self {
        Self {
            shared: Arc::new(GraphShared {
                mode,
                voices: Mutex::new(HashMap::new()),
                released: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// End a playing voice as if its buffer ran out. Looping voices never
    /// complete naturally and are rejected here.
    pub fn complete(&self, voice: VoiceId) -> Result<()> {
        let mut voices = self.shared.voices.lock();
        let entry = voices
            .get_mut(&voice)
            .ok_or_else(|| BridgeError::UnknownVoice(voice.as_uuid().to_string()))?;
        if entry.request.looping {
            return Err(BridgeError::OperationFailed(
                "looping voices end only via stop".to_string(),
            ));
        }
        GraphShared::end_entry(voice, entry, VoiceEndReason::Completed)
    }

    /// Complete every playing non-looping voice. Returns how many ended.
    pub fn complete_all(&self) -> usize {
        let mut voices = self.shared.voices.lock();
        let mut ended = 0;
        for (voice, entry) in voices.iter_mut() {
            if entry.phase == VoicePhase::Playing && !entry.request.looping {
                GraphShared::end_entry(*voice, entry, VoiceEndReason::Completed).ok();
                ended += 1;
            }
        }
        ended
    }

    /// End a voice with a backend failure, for exercising recovery paths.
    pub fn fail(&self, voice: VoiceId, message: impl Into<String>) -> Result<()> {
        self.shared.finish(
            voice,
            VoiceEndReason::Failed {
                message: message.into(),
            },
        )
    }

    /// Current gain of a voice, if it has not been released.
    pub fn gain_of(&self, voice: VoiceId) -> Option<f32> {
        self.shared.voices.lock().get(&voice).map(|e| e.gain)
    }

    /// Playback rate the voice was prepared with.
    pub fn rate_of(&self, voice: VoiceId) -> Option<f64> {
        self.shared.voices.lock().get(&voice).map(|e| e.request.rate)
    }

    /// Whether the voice was prepared as looping.
    pub fn is_looping(&self, voice: VoiceId) -> Option<bool> {
        self.shared
            .voices
            .lock()
            .get(&voice)
            .map(|e| e.request.looping)
    }

    /// Number of voices currently in the playing phase.
    pub fn playing_count(&self) -> usize {
        self.shared
            .voices
            .lock()
            .values()
            .filter(|e| e.phase == VoicePhase::Playing)
            .count()
    }

    /// Identifiers of every voice currently in the playing phase.
    pub fn playing_voices(&self) -> Vec<VoiceId> {
        self.shared
            .voices
            .lock()
            .iter()
            .filter(|(_, e)| e.phase == VoicePhase::Playing)
            .map(|(voice, _)| *voice)
            .collect()
    }

    /// Whether [`release`](AudioGraphAdapter::release) freed this voice.
    pub fn was_released(&self, voice: VoiceId) -> bool {
        self.shared.released.lock().contains(&voice)
    }
}

impl Default for HeadlessAudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioGraphAdapter for HeadlessAudioGraph {
    async fn prepare(&self, request: VoiceRequest) -> Result<VoiceId> {
        let voice = VoiceId::new();
        let (done, _) = watch::channel(None);
        let entry = VoiceEntry {
            gain: request.gain,
            phase: VoicePhase::Prepared,
            done,
            timer_cancel: CancellationToken::new(),
            request,
        };
        debug!(
            voice = %voice.as_uuid(),
            frames = entry.request.buffer.frames(),
            rate = entry.request.rate,
            looping = entry.request.looping,
            "prepared voice"
        );
        self.shared.voices.lock().insert(voice, entry);
        Ok(voice)
    }

    async fn start(&self, voice: VoiceId) -> Result<()> {
        let timer = {
            let mut voices = self.shared.voices.lock();
            let entry = voices
                .get_mut(&voice)
                .ok_or_else(|| BridgeError::UnknownVoice(voice.as_uuid().to_string()))?;
            match entry.phase {
                VoicePhase::Prepared => {
                    entry.phase = VoicePhase::Playing;
                }
                VoicePhase::Playing => {
                    return Err(BridgeError::OperationFailed(format!(
                        "voice {} already started",
                        voice.as_uuid()
                    )));
                }
                VoicePhase::Ended(_) => {
                    return Err(BridgeError::OperationFailed(format!(
                        "voice {} already ended",
                        voice.as_uuid()
                    )));
                }
            }
            if self.shared.mode == CompletionMode::Auto && !entry.request.looping {
                let rate = if entry.request.rate > 0.0 {
                    entry.request.rate
                } else {
                    1.0
                };
                let scaled = entry.request.buffer.duration().as_secs_f64() / rate;
                Some((
                    Duration::from_secs_f64(scaled),
                    entry.timer_cancel.clone(),
                ))
            } else {
                None
            }
        };
        trace!(voice = %voice.as_uuid(), "voice started");

        if let Some((delay, cancel)) = timer {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {
                        // An explicit stop may have ended the voice first; the
                        // already-ended error is discarded.
                        shared.finish(voice, VoiceEndReason::Completed).ok();
                    }
                }
            });
        }
        Ok(())
    }

    async fn stop(&self, voice: VoiceId) -> Result<()> {
        self.shared.finish(voice, VoiceEndReason::Stopped)?;
        trace!(voice = %voice.as_uuid(), "voice stopped");
        Ok(())
    }

    async fn set_gain(&self, voice: VoiceId, gain: f32) -> Result<()> {
        let mut voices = self.shared.voices.lock();
        let entry = voices
            .get_mut(&voice)
            .ok_or_else(|| BridgeError::UnknownVoice(voice.as_uuid().to_string()))?;
        entry.gain = gain;
        trace!(voice = %voice.as_uuid(), gain, "voice gain updated");
        Ok(())
    }

    async fn wait_ended(&self, voice: VoiceId) -> Result<VoiceEndReason> {
        let mut rx = {
            let voices = self.shared.voices.lock();
            let entry = voices
                .get(&voice)
                .ok_or_else(|| BridgeError::UnknownVoice(voice.as_uuid().to_string()))?;
            entry.done.subscribe()
        };
        loop {
            let ended = rx.borrow_and_update().clone();
            if let Some(reason) = ended {
                return Ok(reason);
            }
            rx.changed().await.map_err(|_| {
                BridgeError::OperationFailed(format!(
                    "voice {} released before ending",
                    voice.as_uuid()
                ))
            })?;
        }
    }

    async fn release(&self, voice: VoiceId) -> Result<()> {
        let mut voices = self.shared.voices.lock();
        match voices.remove(&voice) {
            Some(entry) => {
                entry.timer_cancel.cancel();
                self.shared.released.lock().insert(voice);
                debug!(voice = %voice.as_uuid(), "released voice");
            }
            None => {
                trace!(voice = %voice.as_uuid(), "release of unknown voice ignored");
            }
        }
        Ok(())
    }

    async fn active_voices(&self) -> Result<usize> {
        let voices = self.shared.voices.lock();
        Ok(voices
            .values()
            .filter(|e| !matches!(e.phase, VoicePhase::Ended(_)))
            .count())
    }
}
