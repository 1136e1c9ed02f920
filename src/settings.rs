use dirs_next as dirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::set_analytics::SetAnalyticsOptions;
use crate::units::{DistanceUnit, LengthUnit, PaceUnit, SpeedUnit, WeightUnit};

/// User choices that shape how series are computed and labelled.
///
/// Stored as JSON in the user's config directory. Fields missing from an
/// older file fall back to their defaults thanks to `#[serde(default)]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSettings {
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub distance_unit: DistanceUnit,
    #[serde(default)]
    pub circumference_unit: LengthUnit,
    #[serde(default)]
    pub ignore_warmups: bool,
    #[serde(default)]
    pub ignore_multisets: bool,
    #[serde(default)]
    pub include_secondary_groups: bool,
    #[serde(default)]
    pub count_secondary_as_one: bool,
}

fn default_locale() -> String {
    "en-US".into()
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            weight_unit: WeightUnit::default(),
            distance_unit: DistanceUnit::default(),
            circumference_unit: LengthUnit::default(),
            ignore_warmups: false,
            ignore_multisets: false,
            include_secondary_groups: false,
            count_secondary_as_one: false,
        }
    }
}

impl AnalyticsSettings {
    const FILE: &'static str = "workout_chart_analytics.json";

    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    /// Load from the config directory, falling back to defaults.
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }

    /// Read settings from `path`. A missing or unreadable file yields the
    /// defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(data) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&data) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Ignoring malformed settings in {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
    }

    pub fn speed_unit(&self) -> SpeedUnit {
        SpeedUnit::for_distance(self.distance_unit)
    }

    pub fn pace_unit(&self) -> PaceUnit {
        PaceUnit::for_distance(self.distance_unit)
    }

    /// Starting units and filters for set aggregation.
    pub fn set_analytics_options(&self) -> SetAnalyticsOptions {
        SetAnalyticsOptions {
            weight_unit: self.weight_unit,
            distance_unit: self.distance_unit,
            speed_unit: self.speed_unit(),
            pace_unit: self.pace_unit(),
            ignore_warmups: self.ignore_warmups,
            ignore_multisets: self.ignore_multisets,
        }
    }
}
