//! Central registry and gain policy for sound generators.
//!
//! The manager owns the master output settings and the per-level settings,
//! and pushes their product down to every registered generator whenever
//! something changes. Generators never poll; by the time a setter returns,
//! instances that are already sounding have their new gain.
//!
//! Disabling is not forgetting: muting the master output or a level zeroes
//! the contributed factor while every stored gain stays exactly as
//! configured, so re-enabling restores the previous audible state.

use crate::clip::{AmbientGain, GeneratorId, SoundGenerator};
use crate::options::SonificationLevel;
use core_runtime::config::SonificationConfig;
use core_runtime::events::{EventBus, ManagerEvent, SonicEvent};
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options for registering a generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    /// File the generator under this level instead of its own.
    pub level: Option<SonificationLevel>,
}

impl RegisterOptions {
    /// Override the level the generator is filed under.
    pub fn with_level(mut self, level: SonificationLevel) -> Self {
        self.level = Some(level);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct LevelSettings {
    enabled: bool,
    gain: f32,
}

struct RegisteredEntry {
    generator: Arc<dyn SoundGenerator>,
    level: SonificationLevel,
}

struct ManagerState {
    master_enabled: bool,
    master_gain: f32,
    basic: LevelSettings,
    enhanced: LevelSettings,
    registry: HashMap<GeneratorId, RegisteredEntry>,
}

impl ManagerState {
    fn level_settings(&self, level: SonificationLevel) -> LevelSettings {
        match level {
            SonificationLevel::Basic => self.basic,
            SonificationLevel::Enhanced => self.enhanced,
        }
    }

    fn level_settings_mut(&mut self, level: SonificationLevel) -> &mut LevelSettings {
        match level {
            SonificationLevel::Basic => &mut self.basic,
            SonificationLevel::Enhanced => &mut self.enhanced,
        }
    }

    fn ambient_for(&self, level: SonificationLevel) -> AmbientGain {
        let settings = self.level_settings(level);
        let master = if self.master_enabled {
            self.master_gain
        } else {
            0.0
        };
        let level_factor = if settings.enabled { settings.gain } else { 0.0 };
        AmbientGain {
            factor: master * level_factor,
            audible: self.master_enabled && settings.enabled,
        }
    }
}

struct ManagerShared {
    audio_enabled: bool,
    state: Mutex<ManagerState>,
    events: EventBus,
}

/// Registry of sound generators plus master and per-level gain policy.
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SoundManager {
    shared: Arc<ManagerShared>,
}

impl SoundManager {
    /// Manager with default settings: audio available, everything enabled
    /// at unity gain, enhanced level off.
    pub fn new(events: EventBus) -> Self {
        Self::with_config(&SonificationConfig::default(), events)
    }

    /// Manager seeded from host configuration.
    pub fn with_config(config: &SonificationConfig, events: EventBus) -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                audio_enabled: config.audio_enabled,
                state: Mutex::new(ManagerState {
                    master_enabled: config.master_enabled,
                    master_gain: config.master_gain,
                    basic: LevelSettings {
                        enabled: config.basic_enabled,
                        gain: config.basic_gain,
                    },
                    enhanced: LevelSettings {
                        enabled: config.enhanced_enabled,
                        gain: config.enhanced_gain,
                    },
                    registry: HashMap::new(),
                }),
                events,
            }),
        }
    }

    /// Whether the host reports audio output as available at all. Fixed at
    /// construction; shared players consult this before building their
    /// pipeline.
    pub fn audio_enabled(&self) -> bool {
        self.shared.audio_enabled
    }

    /// Register a generator and immediately apply the current gain
    /// settings to it. Registering an already-registered generator is
    /// logged and ignored.
    pub async fn register(&self, generator: Arc<dyn SoundGenerator>, options: RegisterOptions) {
        let id = generator.id();
        let level = options.level.unwrap_or_else(|| generator.level());
        let ambient = {
            let mut state = self.shared.state.lock();
            if state.registry.contains_key(&id) {
                drop(state);
                warn!(generator = %id, "generator already registered");
                return;
            }
            let ambient = state.ambient_for(level);
            state.registry.insert(
                id,
                RegisteredEntry {
                    generator: Arc::clone(&generator),
                    level,
                },
            );
            ambient
        };

        generator.apply_ambient(ambient).await;
        debug!(generator = %id, level = %level, "generator registered");
        self.shared
            .events
            .emit(SonicEvent::Manager(ManagerEvent::Registered {
                generator: *id.as_uuid(),
                level,
            }))
            .ok();
    }

    /// Remove a generator from the registry. Unknown generators are
    /// ignored, so unregistering twice, or after a registration that never
    /// happened, is harmless.
    pub fn unregister(&self, generator: GeneratorId) {
        let removed = self.shared.state.lock().registry.remove(&generator);
        if removed.is_some() {
            debug!(generator = %generator, "generator unregistered");
            self.shared
                .events
                .emit(SonicEvent::Manager(ManagerEvent::Unregistered {
                    generator: *generator.as_uuid(),
                }))
                .ok();
        } else {
            debug!(generator = %generator, "unregister of unknown generator ignored");
        }
    }

    /// Toggle master output. Disabling silences every registered generator
    /// while preserving stored gains; re-enabling restores them.
    pub async fn set_master_enabled(&self, enabled: bool) {
        self.shared.state.lock().master_enabled = enabled;
        self.push_ambient(None).await;
        info!(enabled, "master output toggled");
        self.shared
            .events
            .emit(SonicEvent::Manager(ManagerEvent::MasterEnabledChanged {
                enabled,
            }))
            .ok();
    }

    /// Set the master gain. Out-of-range values are logged and ignored.
    pub async fn set_master_gain(&self, gain: f32) {
        if !gain.is_finite() || !(0.0..=1.0).contains(&gain) {
            warn!(gain, "ignoring out-of-range master gain");
            return;
        }
        self.shared.state.lock().master_gain = gain;
        self.push_ambient(None).await;
        self.shared
            .events
            .emit(SonicEvent::Manager(ManagerEvent::MasterGainChanged { gain }))
            .ok();
    }

    /// Enable or disable one sonification level.
    pub async fn set_level_enabled(&self, level: SonificationLevel, enabled: bool) {
        self.shared.state.lock().level_settings_mut(level).enabled = enabled;
        self.push_ambient(Some(level)).await;
        info!(level = %level, enabled, "sonification level toggled");
        self.shared
            .events
            .emit(SonicEvent::Manager(ManagerEvent::LevelEnabledChanged {
                level,
                enabled,
            }))
            .ok();
    }

    /// Set the gain of one sonification level. Out-of-range values are
    /// logged and ignored.
    pub async fn set_level_gain(&self, level: SonificationLevel, gain: f32) {
        if !gain.is_finite() || !(0.0..=1.0).contains(&gain) {
            warn!(level = %level, gain, "ignoring out-of-range level gain");
            return;
        }
        self.shared.state.lock().level_settings_mut(level).gain = gain;
        self.push_ambient(Some(level)).await;
        self.shared
            .events
            .emit(SonicEvent::Manager(ManagerEvent::LevelGainChanged {
                level,
                gain,
            }))
            .ok();
    }

    /// Whether master output is enabled.
    pub fn master_enabled(&self) -> bool {
        self.shared.state.lock().master_enabled
    }

    /// The master gain.
    pub fn master_gain(&self) -> f32 {
        self.shared.state.lock().master_gain
    }

    /// Whether a sonification level is enabled.
    pub fn level_enabled(&self, level: SonificationLevel) -> bool {
        self.shared.state.lock().level_settings(level).enabled
    }

    /// The gain of a sonification level.
    pub fn level_gain(&self, level: SonificationLevel) -> f32 {
        self.shared.state.lock().level_settings(level).gain
    }

    /// Number of registered generators.
    pub fn registered_count(&self) -> usize {
        self.shared.state.lock().registry.len()
    }

    /// The master and level contribution a generator at `level` receives.
    pub fn ambient_for(&self, level: SonificationLevel) -> AmbientGain {
        self.shared.state.lock().ambient_for(level)
    }

    /// Push recomputed ambient gains to registered generators, either all
    /// of them or only those filed under one level. Works on a snapshot so
    /// generators may register or unregister while the push is in flight.
    async fn push_ambient(&self, only: Option<SonificationLevel>) {
        let updates: Vec<(Arc<dyn SoundGenerator>, AmbientGain)> = {
            let state = self.shared.state.lock();
            state
                .registry
                .values()
                .filter(|entry| only.map_or(true, |level| entry.level == level))
                .map(|entry| (Arc::clone(&entry.generator), state.ambient_for(entry.level)))
                .collect()
        };
        join_all(updates.into_iter().map(|(generator, ambient)| async move {
            generator.apply_ambient(ambient).await;
        }))
        .await;
    }
}

impl fmt::Debug for SoundManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SoundManager")
            .field("audio_enabled", &self.shared.audio_enabled)
            .field("master_enabled", &state.master_enabled)
            .field("master_gain", &state.master_gain)
            .field("registered", &state.registry.len())
            .finish()
    }
}
