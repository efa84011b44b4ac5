//! Families of one-shot sounds selected by value.

use crate::clip::{SoundClip, SoundPlayer};
use crate::manager::{RegisterOptions, SoundManager};
use crate::options::{ClipOptions, ClipSource};
use bridge_traits::graph::AudioGraphAdapter;
use core_runtime::events::EventBus;
use core_runtime::readiness::StartupGate;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::warn;

/// One-shot sounds keyed by an application value, e.g. a status enum where
/// each variant has its own notification sound.
///
/// Triggering an unmapped value is logged and ignored; it never disturbs
/// the sounds that are mapped.
pub struct MultiClip<K> {
    clips: HashMap<K, SoundClip>,
}

impl<K> MultiClip<K>
where
    K: Eq + Hash + fmt::Debug,
{
    /// Start building a family of clips sharing one graph and option set.
    pub fn builder(graph: Arc<dyn AudioGraphAdapter>, events: EventBus) -> MultiClipBuilder<K> {
        MultiClipBuilder {
            graph,
            events,
            options: ClipOptions::default(),
            assets: Vec::new(),
            gate: None,
        }
    }

    /// Trigger the sound mapped to `value`. Unmapped values are a logged
    /// no-op.
    pub async fn play_value(&self, value: &K) {
        match self.clips.get(value) {
            Some(clip) => clip.play().await,
            None => warn!(value = ?value, "no sound mapped for value"),
        }
    }

    /// Stop every sounding instance across the whole family.
    pub async fn stop_all(&self) {
        for clip in self.clips.values() {
            clip.stop().await;
        }
    }

    /// The clip mapped to `value`, if any.
    pub fn clip(&self, value: &K) -> Option<&SoundClip> {
        self.clips.get(value)
    }

    /// Number of mapped values.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Returns `true` if no values are mapped.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Total sounding instances across the family.
    pub fn active_instances(&self) -> usize {
        self.clips.values().map(|clip| clip.active_instances()).sum()
    }

    /// Register every clip in the family with `manager`, each under its
    /// own level.
    pub async fn register_all(&self, manager: &SoundManager) {
        for clip in self.clips.values() {
            manager
                .register(Arc::new(clip.clone()), RegisterOptions::default())
                .await;
        }
    }

    /// Remove every clip in the family from `manager`'s registry.
    pub fn unregister_all(&self, manager: &SoundManager) {
        for clip in self.clips.values() {
            manager.unregister(clip.id());
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for MultiClip<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiClip")
            .field("values", &self.clips.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`MultiClip`].
pub struct MultiClipBuilder<K> {
    graph: Arc<dyn AudioGraphAdapter>,
    events: EventBus,
    options: ClipOptions,
    assets: Vec<(K, ClipSource)>,
    gate: Option<StartupGate>,
}

impl<K> MultiClipBuilder<K>
where
    K: Eq + Hash + fmt::Debug,
{
    /// Options applied to every clip in the family. The family is one-shot
    /// by definition, so a looping option is ignored.
    pub fn with_options(mut self, options: ClipOptions) -> Self {
        self.options = options;
        self
    }

    /// Map `value` to an asset. Mapping the same value again replaces the
    /// earlier asset.
    pub fn with_asset(mut self, value: K, source: impl Into<ClipSource>) -> Self {
        self.assets.push((value, source.into()));
        self
    }

    /// Track every asset's decode on `gate`, one ticket per mapped value.
    pub fn with_readiness(mut self, gate: StartupGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Build the family, starting background decodes for encoded assets.
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> MultiClip<K> {
        let mut options = self.options;
        if options.looping {
            warn!("value-mapped sounds are one-shot, ignoring looping option");
            options.looping = false;
        }

        let mut clips = HashMap::with_capacity(self.assets.len());
        for (value, source) in self.assets {
            let clip = match &self.gate {
                Some(gate) => SoundClip::with_readiness(
                    Arc::clone(&self.graph),
                    source,
                    options.clone(),
                    self.events.clone(),
                    gate.ticket(),
                ),
                None => SoundClip::new(
                    Arc::clone(&self.graph),
                    source,
                    options.clone(),
                    self.events.clone(),
                ),
            };
            clips.insert(value, clip);
        }
        MultiClip { clips }
    }
}
