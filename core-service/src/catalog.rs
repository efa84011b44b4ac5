//! Named catalog of shared sound players.
//!
//! Hosts that trigger sounds from loosely coupled call sites (UI callbacks,
//! scripting hooks) often want a string name rather than a handle. The
//! catalog maps names to [`SharedSoundClip`]s declared up front, so a
//! trigger site needs nothing but the catalog and a name.

use crate::SonificationService;
use core_sonics::{ClipOptions, ClipSource, SharedSoundClip};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A name-to-player registry backed by one [`SonificationService`].
///
/// Clones share the registry. Players are the lazy shared kind: defining
/// one costs nothing until its first trigger.
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    service: SonificationService,
    players: Mutex<HashMap<String, SharedSoundClip>>,
}

impl SharedCatalog {
    pub(crate) fn new(service: SonificationService) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                service,
                players: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Declare a player under `name`. Redefining an existing name keeps
    /// the first definition and returns it.
    pub fn define(
        &self,
        name: impl Into<String>,
        source: impl Into<ClipSource>,
        options: ClipOptions,
    ) -> SharedSoundClip {
        let name = name.into();
        let mut players = self.inner.players.lock();
        if let Some(existing) = players.get(&name) {
            warn!(name = %name, "player already defined, keeping the first definition");
            return existing.clone();
        }
        let player = self.inner.service.shared_clip(source, options);
        players.insert(name.clone(), player.clone());
        debug!(name = %name, "defined shared player");
        player
    }

    /// Look up the player under `name`.
    pub fn player(&self, name: &str) -> Option<SharedSoundClip> {
        self.inner.players.lock().get(name).cloned()
    }

    /// Trigger the player under `name`. An unknown name is logged and
    /// ignored.
    pub async fn play(&self, name: &str) {
        let player = self.player(name);
        match player {
            Some(player) => player.play().await,
            None => warn!(name, "no player defined under this name"),
        }
    }

    /// Stop the player under `name`, if one is defined.
    pub async fn stop(&self, name: &str) {
        if let Some(player) = self.player(name) {
            player.stop().await;
        }
    }

    /// Defined names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.players.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.players.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.players.lock().is_empty()
    }
}

impl fmt::Debug for SharedCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCatalog")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::graph::PcmBuffer;
    use core_runtime::config::SonificationConfig;

    fn tone() -> PcmBuffer {
        PcmBuffer::new(vec![0.3; 32], 44_100, 1)
    }

    #[tokio::test]
    async fn defining_twice_keeps_the_first() {
        let service = SonificationService::headless(SonificationConfig::default()).unwrap();
        let catalog = service.catalog();

        catalog.define("ping", tone(), ClipOptions::default());
        let second = catalog.define("ping", tone(), ClipOptions::default());

        assert_eq!(catalog.len(), 1);
        second.play().await;
        assert_eq!(service.manager().registered_count(), 1);
    }

    #[tokio::test]
    async fn lookup_by_name() {
        let service = SonificationService::headless(SonificationConfig::default()).unwrap();
        let catalog = service.catalog();

        catalog.define("confirm", tone(), ClipOptions::default());

        assert!(catalog.player("confirm").is_some());
        assert!(catalog.player("missing").is_none());
        assert_eq!(catalog.names(), vec!["confirm".to_string()]);
    }
}
