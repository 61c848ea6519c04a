//! Sound catalog
//!
//! A fixed registry mapping sound names to the asset they are loaded from and
//! the gain they are played at. Built once, never mutated.

use crate::{AudioError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Sounds shipped with the game: (name, path under the assets base, gain)
const BUILTIN_SOUNDS: &[(&str, &str, Option<f32>)] = &[
    ("button-click", "sounds/button-click.wav", Some(0.2)),
    ("win", "sounds/win.wav", Some(0.5)),
    ("draw", "sounds/draw.mp3", Some(0.2)),
    ("move-x", "sounds/move-x.mp3", Some(0.2)),
    ("move-o", "sounds/move-o.mp3", Some(0.2)),
    ("error", "sounds/error.mp3", Some(0.5)),
    ("small-win", "sounds/small-win.mp3", Some(0.5)),
    ("play-online", "sounds/play-online.mp3", Some(0.2)),
    ("big-win", "sounds/big-win.mp3", Some(0.5)),
    ("lose", "sounds/lose.wav", Some(0.5)),
    ("sound-1", "sounds/1.wav", Some(0.2)),
    ("sound-2", "sounds/2.wav", Some(0.2)),
    ("sound-3", "sounds/3.wav", Some(0.2)),
    ("sound", "sounds/sound.wav", Some(0.2)),
];

/// Identifier of a sound in the catalog (e.g. "button-click", "win")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundName(String);

impl SoundName {
    pub fn new(name: impl Into<String>) -> Self {
        SoundName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SoundName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SoundName {
    fn from(name: &str) -> Self {
        SoundName(name.to_string())
    }
}

impl From<String> for SoundName {
    fn from(name: String) -> Self {
        SoundName(name)
    }
}

/// Where the bytes of an asset come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    File(PathBuf),
    Url(Url),
}

impl SourceLocation {
    /// File extension of the asset, used as a decoder hint
    pub fn extension(&self) -> Option<&str> {
        match self {
            SourceLocation::File(path) => path.extension().and_then(|ext| ext.to_str()),
            SourceLocation::Url(url) => {
                let file = url.path().rsplit('/').next()?;
                file.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
            }
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::File(path) => write!(f, "{}", path.display()),
            SourceLocation::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Fixed location every relative asset path is resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetBase {
    Dir(PathBuf),
    Url(Url),
}

impl AssetBase {
    /// Parse a base location: http(s) URLs become `Url`, anything else a directory
    pub fn parse(base: &str) -> Result<Self> {
        if is_remote(base) {
            // Url::join replaces the last segment unless the base ends in '/'
            let normalized = if base.ends_with('/') {
                base.to_string()
            } else {
                format!("{}/", base)
            };
            let url = Url::parse(&normalized).map_err(|e| {
                AudioError::InvalidCatalog(format!("Invalid assets URL {}: {}", base, e))
            })?;
            Ok(AssetBase::Url(url))
        } else {
            Ok(AssetBase::Dir(PathBuf::from(base)))
        }
    }

    /// Resolve an asset path against this base
    ///
    /// Absolute URLs are taken as-is. A leading '/' is treated as relative to
    /// the base, so web-root style paths ("/sounds/win.wav") stay inside it.
    pub fn resolve(&self, path: &str) -> Result<SourceLocation> {
        if is_remote(path) {
            let url = Url::parse(path)
                .map_err(|e| AudioError::InvalidCatalog(format!("Invalid asset URL {}: {}", path, e)))?;
            return Ok(SourceLocation::Url(url));
        }

        let relative = path.trim_start_matches('/');
        match self {
            AssetBase::Dir(dir) => Ok(SourceLocation::File(dir.join(relative))),
            AssetBase::Url(base) => base
                .join(relative)
                .map(SourceLocation::Url)
                .map_err(|e| AudioError::InvalidCatalog(format!("Invalid asset path {}: {}", path, e))),
        }
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Catalog description as written in a configuration file
///
/// ```json
/// {
///   "assets": "public",
///   "defaultGain": 0.5,
///   "sounds": {
///     "win": "sounds/win.wav",
///     "button-click": { "path": "sounds/button-click.wav", "gain": 0.2 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSpec {
    pub assets: String,
    #[serde(default = "default_gain")]
    pub default_gain: f32,
    #[serde(default)]
    pub sounds: BTreeMap<String, SoundSpec>,
}

fn default_gain() -> f32 {
    SoundCatalog::DEFAULT_GAIN
}

/// One sound in a [`CatalogSpec`]: either a bare path or a path with a gain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SoundSpec {
    Path(String),
    Entry {
        path: String,
        #[serde(default)]
        gain: Option<f32>,
    },
}

impl SoundSpec {
    fn path(&self) -> &str {
        match self {
            SoundSpec::Path(path) => path,
            SoundSpec::Entry { path, .. } => path,
        }
    }

    fn gain(&self) -> Option<f32> {
        match self {
            SoundSpec::Path(_) => None,
            SoundSpec::Entry { gain, .. } => *gain,
        }
    }
}

/// A catalog entry: asset location plus the explicitly configured gain, if any
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub location: SourceLocation,
    pub gain: Option<f32>,
}

/// Result of a catalog lookup with the gain already resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundLookup<'a> {
    pub location: &'a SourceLocation,
    pub gain: f32,
}

/// Static registry of playable sounds
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    entries: BTreeMap<SoundName, CatalogEntry>,
    default_gain: f32,
}

impl SoundCatalog {
    /// Gain used for sounds without an explicit entry
    pub const DEFAULT_GAIN: f32 = 0.5;

    /// Build a catalog from a static (name, path, gain) table
    pub fn from_table(
        base: &AssetBase,
        table: &[(&str, &str, Option<f32>)],
        default_gain: f32,
    ) -> Result<Self> {
        let default_gain = validate_gain("default", default_gain)?;
        let mut entries = BTreeMap::new();

        for (name, path, gain) in table {
            let gain = gain.map(|g| validate_gain(name, g)).transpose()?;
            let location = base.resolve(path)?;
            if entries
                .insert(SoundName::from(*name), CatalogEntry { location, gain })
                .is_some()
            {
                return Err(AudioError::InvalidCatalog(format!("Duplicate sound name: {}", name)));
            }
        }

        Ok(SoundCatalog {
            entries,
            default_gain,
        })
    }

    /// Build a catalog from its configuration file form
    pub fn from_spec(spec: &CatalogSpec) -> Result<Self> {
        let base = AssetBase::parse(&spec.assets)?;
        let table: Vec<(&str, &str, Option<f32>)> = spec
            .sounds
            .iter()
            .map(|(name, sound)| (name.as_str(), sound.path(), sound.gain()))
            .collect();
        Self::from_table(&base, &table, spec.default_gain)
    }

    /// The catalog of sounds bundled with the game, resolved against `base`
    pub fn builtin(base: &AssetBase) -> Result<Self> {
        Self::from_table(base, BUILTIN_SOUNDS, Self::DEFAULT_GAIN)
    }

    /// Look up a sound, resolving its gain (explicit entry or default)
    pub fn lookup(&self, name: &str) -> Option<SoundLookup<'_>> {
        self.entries.get(name).map(|entry| SoundLookup {
            location: &entry.location,
            gain: entry.gain.unwrap_or(self.default_gain),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &SoundName> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&SoundName, &CatalogEntry)> {
        self.entries.iter()
    }

    pub fn default_gain(&self) -> f32 {
        self.default_gain
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_gain(name: &str, gain: f32) -> Result<f32> {
    if gain.is_finite() && (0.0..=1.0).contains(&gain) {
        Ok(gain)
    } else {
        Err(AudioError::InvalidCatalog(format!(
            "Gain for {} must be within 0.0..=1.0, got {}",
            name, gain
        )))
    }
}
