//! # Sonification Service
//!
//! The façade host applications construct once at startup.
//!
//! ## Overview
//!
//! [`SonificationService`] wires the pieces of the sonification core
//! together: it validates host configuration, creates the event bus and the
//! [`SoundManager`], tracks asset decodes on a startup readiness gate, and
//! hands out ready-to-use generators. Hosts bring an [`AudioGraphAdapter`]
//! implementation; the `headless` feature (on by default) bundles the
//! in-process graph for tests, demos, and hosts without an audio device.
//!
//! [`AudioGraphAdapter`]: bridge_traits::graph::AudioGraphAdapter

pub mod catalog;
pub mod error;

pub use catalog::SharedCatalog;
pub use error::{CoreError, Result};

use bridge_traits::graph::{AudioGraphAdapter, PcmBuffer};
use core_runtime::config::SonificationConfig;
use core_runtime::events::EventBus;
use core_runtime::readiness::StartupGate;
use core_sonics::decode::decode_payload;
use core_sonics::{
    ClipOptions, ClipSource, EncodedPayload, MultiClip, RegisterOptions, SharedSoundClip,
    SonicsError, SoundClip, SoundManager,
};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{info, instrument};

/// Entry point into the sonification core.
///
/// Constructed once at application start and cloned freely; clones share
/// the manager, event bus, and readiness gate. There is no global state:
/// dropping the last clone tears everything down.
#[derive(Clone)]
pub struct SonificationService {
    graph: Arc<dyn AudioGraphAdapter>,
    manager: SoundManager,
    events: EventBus,
    gate: StartupGate,
}

impl SonificationService {
    /// Validate `config` and wire the core onto `graph`.
    pub fn new(config: SonificationConfig, graph: Arc<dyn AudioGraphAdapter>) -> Result<Self> {
        config.validate()?;
        let events = EventBus::new(config.event_capacity);
        let manager = SoundManager::with_config(&config, events.clone());
        info!(
            audio_enabled = config.audio_enabled,
            master_enabled = config.master_enabled,
            master_gain = config.master_gain,
            "sonification service started"
        );
        Ok(Self {
            graph,
            manager,
            events,
            gate: StartupGate::new(),
        })
    }

    /// Service on the bundled in-process graph, for tests and hosts that
    /// run without an audio device.
    ///
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> core_service::Result<()> {
    /// use core_runtime::config::SonificationConfig;
    /// use core_service::SonificationService;
    ///
    /// let service = SonificationService::headless(SonificationConfig::default())?;
    /// service.wait_ready().await;
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "headless")]
    pub fn headless(config: SonificationConfig) -> Result<Self> {
        Self::new(config, Arc::new(bridge_headless::HeadlessAudioGraph::new()))
    }

    /// Build a generator from `source`, track its decode on the readiness
    /// gate, and register it with the manager.
    pub async fn clip(&self, source: impl Into<ClipSource>, options: ClipOptions) -> SoundClip {
        let clip = SoundClip::with_readiness(
            Arc::clone(&self.graph),
            source,
            options,
            self.events.clone(),
            self.gate.ticket(),
        );
        self.manager
            .register(Arc::new(clip.clone()), RegisterOptions::default())
            .await;
        clip
    }

    /// Declare a lazily built shared player. Nothing decodes until its
    /// first trigger, and nothing at all happens when the host declared
    /// audio support disabled.
    pub fn shared_clip(
        &self,
        source: impl Into<ClipSource>,
        options: ClipOptions,
    ) -> SharedSoundClip {
        SharedSoundClip::new(
            Arc::clone(&self.graph),
            self.manager.clone(),
            self.events.clone(),
            source,
            options,
        )
    }

    /// Build a family of one-shot sounds keyed by host values, register
    /// every member, and track their decodes on the readiness gate.
    pub async fn multi_clip<K>(
        &self,
        entries: Vec<(K, ClipSource)>,
        options: ClipOptions,
    ) -> MultiClip<K>
    where
        K: Eq + Hash + fmt::Debug,
    {
        let mut builder = MultiClip::builder(Arc::clone(&self.graph), self.events.clone())
            .with_options(options)
            .with_readiness(self.gate.clone());
        for (value, source) in entries {
            builder = builder.with_asset(value, source);
        }
        let multi = builder.build();
        multi.register_all(&self.manager).await;
        multi
    }

    /// A named catalog of shared players backed by this service.
    pub fn catalog(&self) -> SharedCatalog {
        SharedCatalog::new(self.clone())
    }

    /// Decode a payload eagerly, surfacing the error the background path
    /// logs and absorbs. Suits asset validation in development and tests.
    #[instrument(skip(self, payload), fields(mime = %payload.mime_type(), bytes = payload.len()))]
    pub async fn decode_now(&self, payload: &EncodedPayload) -> Result<Arc<PcmBuffer>> {
        let payload = payload.clone();
        let buffer = tokio::task::spawn_blocking(move || decode_payload(&payload))
            .await
            .map_err(|e| SonicsError::Internal(format!("decode task halted: {}", e)))??;
        Ok(Arc::new(buffer))
    }

    /// Resolves once every tracked decode has finished, successfully or by
    /// fallback.
    pub async fn wait_ready(&self) {
        self.gate.wait_ready().await;
    }

    /// Number of tracked decodes still in flight.
    pub fn pending_decodes(&self) -> usize {
        self.gate.pending()
    }

    /// Whether the host reported audio output as available.
    pub fn audio_enabled(&self) -> bool {
        self.manager.audio_enabled()
    }

    /// The manager holding the registry and gain policy.
    pub fn manager(&self) -> &SoundManager {
        &self.manager
    }

    /// The bus carrying decode, generator, and manager events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The audio graph the service drives.
    pub fn graph(&self) -> Arc<dyn AudioGraphAdapter> {
        Arc::clone(&self.graph)
    }
}

impl fmt::Debug for SonificationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SonificationService")
            .field("audio_enabled", &self.audio_enabled())
            .field("registered", &self.manager.registered_count())
            .field("pending_decodes", &self.pending_decodes())
            .finish()
    }
}
