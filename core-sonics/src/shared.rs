//! Sound players shared across arbitrarily many call sites.

use crate::clip::{SoundClip, SoundPlayer};
use crate::manager::{RegisterOptions, SoundManager};
use crate::options::{ClipOptions, ClipSource};
use async_trait::async_trait;
use bridge_traits::graph::AudioGraphAdapter;
use core_runtime::events::EventBus;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// A sound player whose pipeline is built on first use and then shared.
///
/// Creation is cheap and does nothing: no decode, no registration. The
/// first trigger constructs the underlying [`SoundClip`] exactly once,
/// even under concurrent first access, and registers it with the manager
/// so callers never deal with registration themselves.
///
/// When the host declares audio globally unavailable, the pipeline is
/// never built and every operation is a quiet no-op.
#[derive(Clone)]
pub struct SharedSoundClip {
    inner: Arc<SharedInner>,
}

struct SharedInner {
    graph: Arc<dyn AudioGraphAdapter>,
    manager: SoundManager,
    events: EventBus,
    source: ClipSource,
    options: ClipOptions,
    cell: OnceCell<SoundClip>,
}

impl SharedSoundClip {
    /// Describe a shared sound without building anything yet.
    pub fn new(
        graph: Arc<dyn AudioGraphAdapter>,
        manager: SoundManager,
        events: EventBus,
        source: impl Into<ClipSource>,
        options: ClipOptions,
    ) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                graph,
                manager,
                events,
                source: source.into(),
                options,
                cell: OnceCell::new(),
            }),
        }
    }

    /// The underlying clip, constructing and registering it on first
    /// access. Returns `None` while audio is globally disabled.
    pub async fn clip(&self) -> Option<&SoundClip> {
        if !self.inner.manager.audio_enabled() {
            return None;
        }
        let clip = self
            .inner
            .cell
            .get_or_init(|| async {
                debug!("constructing shared sound on first use");
                let clip = SoundClip::new(
                    Arc::clone(&self.inner.graph),
                    self.inner.source.clone(),
                    self.inner.options.clone(),
                    self.inner.events.clone(),
                );
                self.inner
                    .manager
                    .register(Arc::new(clip.clone()), RegisterOptions::default())
                    .await;
                clip
            })
            .await;
        Some(clip)
    }

    /// Whether the pipeline has been built yet.
    pub fn is_constructed(&self) -> bool {
        self.inner.cell.initialized()
    }

    /// Trigger the sound, building the pipeline on first use.
    pub async fn play(&self) {
        match self.clip().await {
            Some(clip) => clip.play().await,
            None => debug!("audio disabled, ignoring shared sound trigger"),
        }
    }

    /// Stop the sound. Never builds the pipeline: with nothing built there
    /// is nothing to stop.
    pub async fn stop(&self) {
        if let Some(clip) = self.inner.cell.get() {
            clip.stop().await;
        }
    }
}

impl fmt::Debug for SharedSoundClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSoundClip")
            .field("constructed", &self.is_constructed())
            .field("audio_enabled", &self.inner.manager.audio_enabled())
            .finish()
    }
}

#[async_trait]
impl SoundPlayer for SharedSoundClip {
    async fn play(&self) {
        SharedSoundClip::play(self).await;
    }

    async fn stop(&self) {
        SharedSoundClip::stop(self).await;
    }
}
