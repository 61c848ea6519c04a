//! Asset loading
//!
//! Every catalog entry is fetched and decoded on its own tokio task. Tasks do
//! not wait on each other and a failure only marks that one asset as failed;
//! it stays unavailable for the rest of the engine's lifetime.

use crate::catalog::{SoundCatalog, SoundName, SourceLocation};
use crate::decode::{decode_audio, SoundBuffer};
use crate::fetch::AssetFetcher;
use crate::{AudioError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Load state of one asset
#[derive(Debug, Clone)]
pub enum AssetStatus {
    /// No load attempted yet
    Unloaded,
    /// Fetch or decode in flight
    Loading,
    /// Decoded and playable
    Ready(Arc<SoundBuffer>),
    /// Fetch or decode failed; never retried
    Failed(String),
}

impl AssetStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, AssetStatus::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AssetStatus::Failed(_))
    }
}

/// Counters over every load the loader has started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    /// Whether any load (or a preload of an empty catalog) was requested
    pub started: bool,
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadProgress {
    /// All requested loads have either succeeded or failed
    pub fn is_settled(&self) -> bool {
        self.started && self.loaded + self.failed == self.requested
    }
}

/// Fetches and decodes catalog assets into a shared buffer table
#[derive(Clone)]
pub struct AssetLoader {
    catalog: Arc<SoundCatalog>,
    fetcher: Arc<dyn AssetFetcher>,
    assets: Arc<RwLock<HashMap<SoundName, AssetStatus>>>,
    progress: Arc<watch::Sender<LoadProgress>>,
}

impl AssetLoader {
    /// Create a loader with every catalog entry in the `Unloaded` state
    pub fn new(catalog: Arc<SoundCatalog>, fetcher: Arc<dyn AssetFetcher>) -> Self {
        let assets = catalog
            .names()
            .map(|name| (name.clone(), AssetStatus::Unloaded))
            .collect();
        let (progress, _) = watch::channel(LoadProgress::default());

        AssetLoader {
            catalog,
            fetcher,
            assets: Arc::new(RwLock::new(assets)),
            progress: Arc::new(progress),
        }
    }

    pub fn catalog(&self) -> &Arc<SoundCatalog> {
        &self.catalog
    }

    /// Start loading every catalog entry concurrently
    ///
    /// Returns the number of loads started. Must be called from within a
    /// tokio runtime.
    pub fn preload_all(&self) -> usize {
        // Claim every unloaded entry and publish the full count before any
        // task runs, so a waiter never sees a partially requested preload.
        let pending: Vec<(SoundName, SourceLocation)> = {
            let mut assets = self.assets.write();
            self.catalog
                .entries()
                .filter_map(|(name, entry)| match assets.get_mut(name.as_str()) {
                    Some(status) if matches!(status, AssetStatus::Unloaded) => {
                        *status = AssetStatus::Loading;
                        Some((name.clone(), entry.location.clone()))
                    }
                    _ => None,
                })
                .collect()
        };

        let started = pending.len();
        self.progress.send_modify(|p| {
            p.started = true;
            p.requested += started;
        });

        for (name, location) in pending {
            self.spawn_load(name, location);
        }

        tracing::info!(sounds = started, "preloading sound assets");
        started
    }

    /// Start loading a single asset unless it was already attempted
    ///
    /// Returns `true` if a new load was started. Unknown names and assets that
    /// are loading, loaded or failed are left alone.
    pub fn load(&self, name: &str) -> bool {
        let Some(found) = self.catalog.lookup(name) else {
            return false;
        };
        let location = found.location.clone();

        {
            let mut assets = self.assets.write();
            match assets.get_mut(name) {
                Some(status) if matches!(status, AssetStatus::Unloaded) => {
                    *status = AssetStatus::Loading;
                }
                _ => return false,
            }
        }

        self.progress.send_modify(|p| {
            p.started = true;
            p.requested += 1;
        });

        self.spawn_load(SoundName::from(name), location);
        true
    }

    fn spawn_load(&self, name: SoundName, location: SourceLocation) {
        let loader = self.clone();
        tokio::spawn(async move {
            let result = loader.fetch_and_decode(&name, &location).await;
            loader.settle(name, result);
        });
    }

    async fn fetch_and_decode(&self, name: &SoundName, location: &SourceLocation) -> Result<SoundBuffer> {
        let bytes = self.fetcher.fetch(location).await.map_err(|e| {
            tracing::error!(sound = %name, %location, error = %e, "failed to fetch sound");
            e
        })?;

        let label = name.to_string();
        let extension = location.extension().map(str::to_string);
        let decoded = tokio::task::spawn_blocking(move || {
            decode_audio(bytes, &label, extension.as_deref())
        })
        .await
        .map_err(|e| AudioError::DecodeError(format!("Decode task failed: {}", e)))
        .and_then(|result| result);

        decoded.map_err(|e| {
            tracing::error!(sound = %name, %location, error = %e, "failed to decode sound");
            e
        })
    }

    fn settle(&self, name: SoundName, result: Result<SoundBuffer>) {
        let loaded = result.is_ok();
        let status = match result {
            Ok(buffer) => {
                tracing::debug!(
                    sound = %name,
                    frames = buffer.frames(),
                    sample_rate = buffer.sample_rate,
                    channels = buffer.channels,
                    "sound ready"
                );
                AssetStatus::Ready(Arc::new(buffer))
            }
            Err(e) => AssetStatus::Failed(e.to_string()),
        };

        self.assets.write().insert(name, status);
        self.progress.send_modify(|p| {
            if loaded {
                p.loaded += 1;
            } else {
                p.failed += 1;
            }
        });
    }

    /// Whether `name` has a decoded buffer
    pub fn ready(&self, name: &str) -> bool {
        self.assets
            .read()
            .get(name)
            .map(AssetStatus::is_ready)
            .unwrap_or(false)
    }

    /// The decoded buffer for `name`, if loading finished successfully
    pub fn buffer(&self, name: &str) -> Option<Arc<SoundBuffer>> {
        match self.assets.read().get(name) {
            Some(AssetStatus::Ready(buffer)) => Some(Arc::clone(buffer)),
            _ => None,
        }
    }

    /// Current status of `name`, `None` for names outside the catalog
    pub fn status(&self, name: &str) -> Option<AssetStatus> {
        self.assets.read().get(name).cloned()
    }

    pub fn progress(&self) -> LoadProgress {
        *self.progress.borrow()
    }

    /// Wait until every requested load has succeeded or failed
    pub async fn all_settled(&self) -> LoadProgress {
        let mut rx = self.progress.subscribe();
        if let Ok(progress) = rx.wait_for(LoadProgress::is_settled).await {
            return *progress;
        }
        self.progress()
    }
}
