//! Sound generators: the objects that turn triggers into playing audio.
//!
//! A [`SoundClip`] owns one asset and realizes triggers on the host's audio
//! graph under one of two disciplines:
//!
//! - one-shot: every trigger starts a fresh instance; simultaneous triggers
//!   overlap and each instance removes exactly itself when it ends
//! - looping: at most one repeating instance exists; a second start tears
//!   the old instance down and rebuilds it from the beginning
//!
//! Triggers that arrive before the asset's buffer resolves are not lost and
//! not queued: the clip keeps a single pending request, and each new
//! pre-decode call replaces it wholesale. Whatever was requested last is
//! what runs once the buffer arrives.
//!
//! Playback never returns errors. A generator whose asset failed to decode,
//! or whose backend refuses a voice, logs the problem and stays usable.

use crate::buffer::BufferSlot;
use crate::decode;
use crate::error::SonicsError;
use crate::options::{ClipOptions, ClipSource, SonificationLevel};
use async_trait::async_trait;
use bridge_traits::graph::{AudioGraphAdapter, PcmBuffer, VoiceEndReason, VoiceId, VoiceRequest};
use core_runtime::events::{EventBus, GeneratorEvent, SonicEvent};
use core_runtime::readiness::ReadinessTicket;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique identifier for sound generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorId(Uuid);

impl GeneratorId {
    /// Generate a new generator identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GeneratorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The master and level gain contribution pushed down by the manager.
///
/// `factor` is the product of the master and level gains, already zeroed
/// when either side is disabled. `audible` says whether both sides are
/// enabled, which drives the trigger suppression policy independently of
/// the numeric gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientGain {
    /// Master gain times level gain.
    pub factor: f32,
    /// Whether master output and the generator's level are both enabled.
    pub audible: bool,
}

impl AmbientGain {
    /// Master and level both enabled at unity gain. The state of a
    /// generator that is not registered with any manager.
    pub const UNITY: AmbientGain = AmbientGain {
        factor: 1.0,
        audible: true,
    };

    /// Master or level disabled.
    pub const SILENT: AmbientGain = AmbientGain {
        factor: 0.0,
        audible: false,
    };
}

/// The minimal contract for anything that can be triggered.
///
/// Callers that just want to make a sound depend on this and nothing else.
/// Both operations are infallible: problems along the playback path are
/// logged, never surfaced.
#[async_trait]
pub trait SoundPlayer: Send + Sync {
    /// Trigger the sound.
    async fn play(&self);

    /// Stop every sounding instance of this sound.
    async fn stop(&self);
}

/// A playable sound that participates in manager gain policy.
#[async_trait]
pub trait SoundGenerator: SoundPlayer {
    /// Stable identity for registry bookkeeping.
    fn id(&self) -> GeneratorId;

    /// The sonification level gating this generator.
    fn level(&self) -> SonificationLevel;

    /// Receive updated master and level gain factors. Applies to instances
    /// that are already sounding.
    async fn apply_ambient(&self, ambient: AmbientGain);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discipline {
    OneShot,
    Looping,
}

/// A request recorded while the buffer is still decoding. One slot, last
/// writer wins.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DeferredCommand {
    /// Fire a one-shot at the rate captured when the trigger arrived.
    Play { rate: f64 },
    /// Start or restart the loop.
    Start,
    /// Stop everything, including any earlier pending request.
    Stop,
}

#[derive(Debug, Clone, Copy)]
struct ActiveVoice {
    id: VoiceId,
    /// Started inaudibly while output was disabled. Stays silent for its
    /// whole life; only instances started audible follow gain changes.
    muted: bool,
}

struct ClipState {
    output_level: f32,
    rate: f64,
    enabled: bool,
    ambient: AmbientGain,
    pending: Option<DeferredCommand>,
    voices: Vec<ActiveVoice>,
}

impl ClipState {
    fn effective_gain(&self) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        self.ambient.factor * self.output_level
    }
}

struct ClipShared {
    id: GeneratorId,
    graph: Arc<dyn AudioGraphAdapter>,
    slot: BufferSlot,
    level: SonificationLevel,
    initiate_when_disabled: bool,
    discipline: Discipline,
    state: Mutex<ClipState>,
    events: EventBus,
}

/// A sound generator bound to one asset. Cheap to clone; clones share all
/// state.
#[derive(Clone)]
pub struct SoundClip {
    shared: Arc<ClipShared>,
}

impl SoundClip {
    /// Create a clip from any asset source.
    ///
    /// Encoded sources start decoding immediately in the background; the
    /// clip is usable right away and defers triggers until the buffer
    /// resolves. Must be called from within a Tokio runtime.
    pub fn new(
        graph: Arc<dyn AudioGraphAdapter>,
        source: impl Into<ClipSource>,
        options: ClipOptions,
        events: EventBus,
    ) -> Self {
        Self::build(graph, source.into(), options, events, None)
    }

    /// Like [`new`](SoundClip::new), completing `ticket` once the clip's
    /// buffer is available (decoded, fallen back to silence, or resolved
    /// by the owner of a shared slot).
    pub fn with_readiness(
        graph: Arc<dyn AudioGraphAdapter>,
        source: impl Into<ClipSource>,
        options: ClipOptions,
        events: EventBus,
        ticket: ReadinessTicket,
    ) -> Self {
        Self::build(graph, source.into(), options, events, Some(ticket))
    }

    fn build(
        graph: Arc<dyn AudioGraphAdapter>,
        source: ClipSource,
        options: ClipOptions,
        events: EventBus,
        ticket: Option<ReadinessTicket>,
    ) -> Self {
        let id = GeneratorId::new();

        let output_level = if options.output_level.is_finite() {
            options.output_level.clamp(0.0, 1.0)
        } else {
            1.0
        };
        if output_level != options.output_level {
            warn!(
                generator = %id,
                requested = options.output_level,
                used = output_level,
                "output level out of range, clamped"
            );
        }

        let (slot, payload) = match source {
            ClipSource::Decoded(buffer) => (BufferSlot::resolved(buffer), None),
            ClipSource::Encoded(payload) => (BufferSlot::empty(), Some(payload)),
            ClipSource::Slot(slot) => (slot, None),
        };

        let discipline = if options.looping {
            Discipline::Looping
        } else {
            Discipline::OneShot
        };

        let shared = Arc::new(ClipShared {
            id,
            graph,
            slot,
            level: options.level,
            initiate_when_disabled: options.initiate_when_disabled,
            discipline,
            state: Mutex::new(ClipState {
                output_level,
                rate: 1.0,
                enabled: true,
                ambient: AmbientGain::UNITY,
                pending: None,
                voices: Vec::new(),
            }),
            events: events.clone(),
        });

        let resolved_at_build = shared.slot.is_resolved();

        match (payload, ticket) {
            (Some(payload), ticket) => {
                decode::spawn_decode(*id.as_uuid(), payload, shared.slot.clone(), ticket, events);
            }
            (None, Some(ticket)) => {
                if resolved_at_build {
                    ticket.complete();
                } else {
                    // Shared slot resolved by its owner; mirror that into
                    // this clip's readiness.
                    let slot = shared.slot.clone();
                    tokio::spawn(async move {
                        slot.wait().await;
                        ticket.complete();
                    });
                }
            }
            (None, None) => {}
        }

        if !resolved_at_build {
            let drain = SoundClip {
                shared: Arc::clone(&shared),
            };
            tokio::spawn(async move {
                drain.shared.slot.wait().await;
                let pending = drain.shared.state.lock().pending.take();
                if let Some(command) = pending {
                    debug!(
                        generator = %drain.shared.id,
                        ?command,
                        "running request deferred during decode"
                    );
                    drain.execute(command).await;
                }
            });
        }

        Self { shared }
    }

    /// Stable identity of this generator.
    pub fn id(&self) -> GeneratorId {
        self.shared.id
    }

    /// The sonification level this generator belongs to.
    pub fn level(&self) -> SonificationLevel {
        self.shared.level
    }

    /// Whether this clip plays a repeating loop instead of one-shots.
    pub fn is_looping(&self) -> bool {
        self.shared.discipline == Discipline::Looping
    }

    /// Start the loop, or trigger a one-shot. Alias for
    /// [`play`](SoundPlayer::play) that reads better on looping clips.
    pub async fn start(&self) {
        self.play().await;
    }

    /// The per-generator output level.
    pub fn output_level(&self) -> f32 {
        self.shared.state.lock().output_level
    }

    /// Set the per-generator output level. Applies immediately to sounding
    /// instances. Out-of-range values are logged and ignored.
    pub async fn set_output_level(&self, output_level: f32) {
        if !output_level.is_finite() || !(0.0..=1.0).contains(&output_level) {
            warn!(
                generator = %self.shared.id,
                "ignoring setting: {}", SonicsError::InvalidOutputLevel(output_level)
            );
            return;
        }
        self.shared.state.lock().output_level = output_level;
        self.refresh_voice_gains().await;
    }

    /// The playback rate applied to future instances.
    pub fn playback_rate(&self) -> f64 {
        self.shared.state.lock().rate
    }

    /// Set the playback rate for future instances. Instances already
    /// sounding keep the rate they started with. Non-finite or non-positive
    /// rates are logged and ignored.
    pub fn set_playback_rate(&self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!(
                generator = %self.shared.id,
                "ignoring setting: {}", SonicsError::InvalidPlaybackRate(rate)
            );
            return;
        }
        self.shared.state.lock().rate = rate;
    }

    /// Whether this generator's own enable flag is set.
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().enabled
    }

    /// Enable or disable this generator. Disabling silences sounding
    /// instances without stopping them and zeroes the effective gain;
    /// the stored output level is untouched.
    pub async fn set_enabled(&self, enabled: bool) {
        self.shared.state.lock().enabled = enabled;
        self.refresh_voice_gains().await;
    }

    /// Whether at least one instance is actually sounding. Stays `false`
    /// while a trigger is deferred waiting for the buffer.
    pub fn is_playing(&self) -> bool {
        !self.shared.state.lock().voices.is_empty()
    }

    /// Number of instances currently sounding.
    pub fn active_instances(&self) -> usize {
        self.shared.state.lock().voices.len()
    }

    /// The gain new audible instances would start with: master gain times
    /// level gain times this generator's output level, or zero while any
    /// layer is disabled.
    pub fn effective_output_level(&self) -> f32 {
        self.shared.state.lock().effective_gain()
    }

    /// Whether the backing buffer has resolved.
    pub fn is_ready(&self) -> bool {
        self.shared.slot.is_resolved()
    }

    /// The buffer cell backing this clip. Hand it to another clip as a
    /// [`ClipSource::Slot`] to share one decode between generators.
    pub fn buffer_slot(&self) -> BufferSlot {
        self.shared.slot.clone()
    }

    /// Route a request through the pending slot if the buffer has not
    /// resolved, otherwise run it, first flushing any request the drain
    /// task has not picked up yet so ordering is preserved.
    async fn submit(&self, command: DeferredCommand) {
        let ready = {
            let mut state = self.shared.state.lock();
            if self.shared.slot.is_resolved() {
                Some(state.pending.take())
            } else {
                state.pending = Some(command);
                None
            }
        };

        let Some(inherited) = ready else {
            debug!(generator = %self.shared.id, ?command, "buffer not ready, deferring request");
            self.shared
                .events
                .emit(SonicEvent::Generator(GeneratorEvent::RequestDeferred {
                    generator: *self.shared.id.as_uuid(),
                }))
                .ok();
            return;
        };

        if let Some(previous) = inherited {
            if command == DeferredCommand::Stop {
                debug!(generator = %self.shared.id, ?previous, "pending request superseded by stop");
            } else {
                self.execute(previous).await;
            }
        }
        self.execute(command).await;
    }

    async fn execute(&self, command: DeferredCommand) {
        match command {
            DeferredCommand::Play { rate } => self.fire_one_shot(rate).await,
            DeferredCommand::Start => self.restart_loop().await,
            DeferredCommand::Stop => self.halt_all().await,
        }
    }

    /// Gain and mute flag for a new instance, or `None` when the trigger
    /// must be dropped outright.
    fn launch_params(&self) -> Option<(f32, bool)> {
        let state = self.shared.state.lock();
        let audible = state.enabled && state.ambient.audible;
        if !audible && !self.shared.initiate_when_disabled {
            return None;
        }
        let gain = if audible {
            state.ambient.factor * state.output_level
        } else {
            0.0
        };
        Some((gain, !audible))
    }

    fn note_suppressed(&self) {
        debug!(generator = %self.shared.id, "output disabled, dropping trigger");
        self.shared
            .events
            .emit(SonicEvent::Generator(GeneratorEvent::PlaySuppressed {
                generator: *self.shared.id.as_uuid(),
            }))
            .ok();
    }

    async fn fire_one_shot(&self, rate: f64) {
        let Some(buffer) = self.shared.slot.get() else {
            return;
        };
        let Some((gain, muted)) = self.launch_params() else {
            self.note_suppressed();
            return;
        };
        self.launch(buffer, gain, muted, rate, false).await;
    }

    async fn restart_loop(&self) {
        let Some(buffer) = self.shared.slot.get() else {
            return;
        };
        let Some((gain, muted)) = self.launch_params() else {
            self.note_suppressed();
            return;
        };
        // A restart always rebuilds the instance from the beginning.
        self.halt_all().await;
        let rate = self.playback_rate();
        self.launch(buffer, gain, muted, rate, true).await;
    }

    async fn halt_all(&self) {
        let stopped = {
            let mut state = self.shared.state.lock();
            std::mem::take(&mut state.voices)
        };
        for active in stopped {
            if let Err(err) = self.shared.graph.stop(active.id).await {
                debug!(generator = %self.shared.id, "instance already ended: {}", err);
            }
            self.shared
                .events
                .emit(SonicEvent::Generator(GeneratorEvent::InstanceEnded {
                    generator: *self.shared.id.as_uuid(),
                    voice: *active.id.as_uuid(),
                    completed: false,
                }))
                .ok();
        }
    }

    async fn launch(
        &self,
        buffer: Arc<PcmBuffer>,
        gain: f32,
        muted: bool,
        rate: f64,
        looping: bool,
    ) {
        let request = VoiceRequest::new(buffer)
            .with_gain(gain)
            .with_rate(rate)
            .with_looping(looping);

        let voice = match self.shared.graph.prepare(request).await {
            Ok(voice) => voice,
            Err(err) => {
                warn!(generator = %self.shared.id, "failed to prepare instance: {}", err);
                return;
            }
        };
        if let Err(err) = self.shared.graph.start(voice).await {
            warn!(generator = %self.shared.id, "failed to start instance: {}", err);
            self.shared.graph.release(voice).await.ok();
            return;
        }

        self.shared
            .state
            .lock()
            .voices
            .push(ActiveVoice { id: voice, muted });
        self.shared
            .events
            .emit(SonicEvent::Generator(GeneratorEvent::InstanceStarted {
                generator: *self.shared.id.as_uuid(),
                voice: *voice.as_uuid(),
                muted,
            }))
            .ok();
        self.watch_until_ended(voice);
    }

    /// Follow one instance to its end, then remove exactly that instance
    /// and free its graph resources.
    fn watch_until_ended(&self, voice: VoiceId) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let reason = match shared.graph.wait_ended(voice).await {
                Ok(reason) => reason,
                Err(err) => VoiceEndReason::Failed {
                    message: err.to_string(),
                },
            };
            let was_tracked = {
                let mut state = shared.state.lock();
                let before = state.voices.len();
                state.voices.retain(|active| active.id != voice);
                state.voices.len() != before
            };
            shared.graph.release(voice).await.ok();
            // An explicit stop already removed the voice and reported it;
            // only natural ends are announced here.
            if was_tracked {
                shared
                    .events
                    .emit(SonicEvent::Generator(GeneratorEvent::InstanceEnded {
                        generator: *shared.id.as_uuid(),
                        voice: *voice.as_uuid(),
                        completed: reason.is_natural(),
                    }))
                    .ok();
            }
        });
    }

    async fn refresh_voice_gains(&self) {
        let (gain, voices) = {
            let state = self.shared.state.lock();
            (state.effective_gain(), state.voices.clone())
        };
        for active in voices {
            if active.muted {
                continue;
            }
            if let Err(err) = self.shared.graph.set_gain(active.id, gain).await {
                debug!(generator = %self.shared.id, "gain update raced instance end: {}", err);
            }
        }
    }
}

impl fmt::Debug for SoundClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundClip")
            .field("id", &self.shared.id)
            .field("level", &self.shared.level)
            .field("discipline", &self.shared.discipline)
            .field("ready", &self.is_ready())
            .field("active_instances", &self.active_instances())
            .finish()
    }
}

#[async_trait]
impl SoundPlayer for SoundClip {
    async fn play(&self) {
        let command = match self.shared.discipline {
            Discipline::OneShot => DeferredCommand::Play {
                rate: self.playback_rate(),
            },
            Discipline::Looping => DeferredCommand::Start,
        };
        self.submit(command).await;
    }

    async fn stop(&self) {
        self.submit(DeferredCommand::Stop).await;
    }
}

#[async_trait]
impl SoundGenerator for SoundClip {
    fn id(&self) -> GeneratorId {
        self.shared.id
    }

    fn level(&self) -> SonificationLevel {
        self.shared.level
    }

    async fn apply_ambient(&self, ambient: AmbientGain) {
        self.shared.state.lock().ambient = ambient;
        self.refresh_voice_gains().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use mockall::mock;

    mock! {
        Graph {}

        #[async_trait]
        impl AudioGraphAdapter for Graph {
            async fn prepare(&self, request: VoiceRequest) -> BridgeResult<VoiceId>;
            async fn start(&self, voice: VoiceId) -> BridgeResult<()>;
            async fn stop(&self, voice: VoiceId) -> BridgeResult<()>;
            async fn set_gain(&self, voice: VoiceId, gain: f32) -> BridgeResult<()>;
            async fn wait_ended(&self, voice: VoiceId) -> BridgeResult<VoiceEndReason>;
            async fn release(&self, voice: VoiceId) -> BridgeResult<()>;
            async fn active_voices(&self) -> BridgeResult<usize>;
        }
    }

    fn buffer() -> Arc<PcmBuffer> {
        Arc::new(PcmBuffer::new(vec![0.1; 64], 44_100, 1))
    }

    #[test]
    fn generator_ids_are_unique() {
        assert_ne!(GeneratorId::new(), GeneratorId::new());
    }

    #[tokio::test]
    async fn suppressed_trigger_never_touches_the_graph() {
        // No expectations on the mock: any graph call fails the test.
        let graph = Arc::new(MockGraph::new());
        let options = ClipOptions::default().with_initiate_when_disabled(false);
        let clip = SoundClip::new(graph, buffer(), options, EventBus::new(8));

        clip.set_enabled(false).await;
        clip.play().await;

        assert_eq!(clip.active_instances(), 0);
        assert!(!clip.is_playing());
    }

    #[tokio::test]
    async fn deferred_trigger_waits_without_graph_calls() {
        let graph = Arc::new(MockGraph::new());
        let bus = EventBus::new(8);
        let mut sub = bus.subscribe();
        let slot = BufferSlot::empty();
        let clip = SoundClip::new(graph, slot, ClipOptions::default(), bus.clone());

        clip.play().await;

        assert!(!clip.is_ready());
        assert_eq!(clip.active_instances(), 0);
        let event = sub.recv().await.unwrap();
        assert!(matches!(
            event,
            SonicEvent::Generator(GeneratorEvent::RequestDeferred { .. })
        ));
    }

    #[tokio::test]
    async fn ambient_and_instance_levels_compose() {
        let graph = Arc::new(MockGraph::new());
        let options = ClipOptions::default().with_output_level(0.7);
        let clip = SoundClip::new(graph, buffer(), options, EventBus::new(8));

        clip.apply_ambient(AmbientGain {
            factor: 0.5 * 0.8,
            audible: true,
        })
        .await;
        assert!((clip.effective_output_level() - 0.28).abs() < 1e-6);

        clip.set_enabled(false).await;
        assert_eq!(clip.effective_output_level(), 0.0);
        // The stored level survives disablement.
        assert_eq!(clip.output_level(), 0.7);
    }

    #[tokio::test]
    async fn setters_reject_out_of_range_values() {
        let graph = Arc::new(MockGraph::new());
        let clip = SoundClip::new(graph, buffer(), ClipOptions::default(), EventBus::new(8));

        clip.set_playback_rate(1.5);
        assert_eq!(clip.playback_rate(), 1.5);
        clip.set_playback_rate(0.0);
        assert_eq!(clip.playback_rate(), 1.5);
        clip.set_playback_rate(f64::NAN);
        assert_eq!(clip.playback_rate(), 1.5);

        clip.set_output_level(0.4).await;
        assert_eq!(clip.output_level(), 0.4);
        clip.set_output_level(1.4).await;
        assert_eq!(clip.output_level(), 0.4);
    }

    #[tokio::test]
    async fn construction_clamps_output_level() {
        let graph = Arc::new(MockGraph::new());
        let options = ClipOptions::default().with_output_level(3.0);
        let clip = SoundClip::new(graph, buffer(), options, EventBus::new(8));
        assert_eq!(clip.output_level(), 1.0);
    }
}
