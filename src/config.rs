use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::data::model::{BoundingBox, Coordinate};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "accident-map.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxPreset {
    Wide,
    Narrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Share link pre-filled in the side panel.
    pub default_link: String,
    /// Maximum number of individual markers drawn.
    pub max_markers: usize,
    /// Cell size in degrees for the cluster view.
    pub cluster_cell_deg: f64,
    /// Cell size in degrees for the heat-map view.
    pub heat_cell_deg: f64,
    pub map_center: MapCenter,
    /// Explicit validity box; wins over `bounding_box_preset`.
    pub bounding_box: Option<BoundingBox>,
    pub bounding_box_preset: BoxPreset,
    /// Download timeout.
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_link:
                "https://drive.google.com/uc?id=1R5JxWJZK_OvFYdGmE2mG3wUhFRb7StdD&export=download"
                    .to_string(),
            max_markers: 1000,
            cluster_cell_deg: 0.01,
            heat_cell_deg: 0.005,
            map_center: MapCenter {
                lat: 6.2442,
                lon: -75.5812,
            },
            bounding_box: None,
            bounding_box_preset: BoxPreset::Wide,
            timeout_secs: 60,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).context("parsing settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Explicit path if given (must exist), else `accident-map.toml` if present,
    /// else built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                p
            }
        };
        log::info!("Loading settings from {}", path.display());
        Self::load_from_file(path)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box.unwrap_or(match self.bounding_box_preset {
            BoxPreset::Wide => BoundingBox::MEDELLIN,
            BoxPreset::Narrow => BoundingBox::MEDELLIN_URBAN,
        })
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            lat: self.map_center.lat,
            lon: self.map_center.lon,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.cluster_cell_deg > 0.0) || !(self.heat_cell_deg > 0.0) {
            bail!("cell sizes must be positive");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        if let Some(b) = &self.bounding_box {
            if !(b.min_lat <= b.max_lat && b.min_lon <= b.max_lon) {
                bail!("bounding_box minimums must not exceed maximums");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
        assert_eq!(Settings::default().bounding_box(), BoundingBox::MEDELLIN);
    }

    #[test]
    fn preset_and_explicit_box() {
        let s = Settings::from_toml("bounding_box_preset = \"narrow\"\nmax_markers = 250\n").unwrap();
        assert_eq!(s.bounding_box(), BoundingBox::MEDELLIN_URBAN);
        assert_eq!(s.max_markers, 250);

        let s = Settings::from_toml(
            "bounding_box_preset = \"narrow\"\n\
             [bounding_box]\nmin_lat = 6.0\nmax_lat = 7.0\nmin_lon = -76.0\nmax_lon = -75.0\n",
        )
        .unwrap();
        assert_eq!(s.bounding_box().max_lat, 7.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Settings::from_toml("heat_cell_deg = 0.0").is_err());
        assert!(Settings::from_toml("timeout_secs = 0").is_err());
        assert!(Settings::from_toml("timeout_secs = 1").is_ok());
        assert!(Settings::from_toml("unknown_key = 1").is_err());
        assert!(Settings::from_toml(
            "[bounding_box]\nmin_lat = 7.0\nmax_lat = 6.0\nmin_lon = -76.0\nmax_lon = -75.0\n"
        )
        .is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accident-map.toml");
        std::fs::write(&path, "timeout_secs = 5\n[map_center]\nlat = 6.2\nlon = -75.6\n").unwrap();
        let s = Settings::resolve(Some(&path)).unwrap();
        assert_eq!(s.timeout_secs, 5);
        assert_eq!(s.center(), Coordinate { lat: 6.2, lon: -75.6 });

        assert!(Settings::resolve(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
