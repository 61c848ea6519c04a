//! Application settings
//!
//! Settings come from an optional JSON file; without one the built-in game
//! catalog is used under the assets directory given on the command line.
//!
//! ```json
//! {
//!   "assets": "public",
//!   "defaultGain": 0.5,
//!   "sounds": { "button-click": { "path": "sounds/button-click.wav", "gain": 0.2 } },
//!   "engine": { "init": "deferred", "resume": "everyInteraction" },
//!   "autoplay": false
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use sfx_audio::{AssetBase, CatalogSpec, EngineConfig, LoadPolicy, SoundCatalog};
use std::path::Path;

/// Where the sound catalog comes from
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// The sounds bundled with the game, under this assets base
    Builtin { assets: String },
    /// A catalog read from the settings file
    Spec(CatalogSpec),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: CatalogSource,
    pub engine: EngineConfig,
    /// Let the output start without a user gesture
    pub autoplay: bool,
}

#[derive(Deserialize)]
struct SettingsFile {
    #[serde(flatten)]
    catalog: CatalogSpec,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    autoplay: bool,
}

impl Settings {
    /// Built-in catalog with default engine policies
    pub fn builtin(assets: impl Into<String>) -> Self {
        Settings {
            catalog: CatalogSource::Builtin {
                assets: assets.into(),
            },
            engine: EngineConfig::default(),
            autoplay: false,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: SettingsFile = serde_json::from_str(text)?;
        Ok(Settings {
            catalog: CatalogSource::Spec(file.catalog),
            engine: file.engine,
            autoplay: file.autoplay,
        })
    }

    /// Build the sound catalog these settings describe
    pub fn build_catalog(&self) -> Result<SoundCatalog> {
        let catalog = match &self.catalog {
            CatalogSource::Builtin { assets } => {
                let base = AssetBase::parse(assets)?;
                SoundCatalog::builtin(&base)?
            }
            CatalogSource::Spec(spec) => SoundCatalog::from_spec(spec)?,
        };
        Ok(catalog)
    }

    /// Whether loading has a completion point worth reporting
    ///
    /// Lazy loads trickle in one request at a time and never finish as a set.
    pub fn reports_preload(&self) -> bool {
        self.engine.load == LoadPolicy::Preload
    }
}
