use crate::allocator::AllocationPolicy;
use crate::models::{Kw, MAX_PRIORITY, MIN_PRIORITY};
use crate::LoadManagerError;
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Site-wide settings for the load manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Size of one indivisible block (kW)
    pub block_size_kw: Kw,

    /// Site ceiling in normal operation (kW)
    pub normal_ceiling_kw: Kw,

    /// Reduced ceiling while constrained (kW)
    pub constrained_ceiling_kw: Kw,

    /// Largest request a single consumer may hold (kW)
    pub max_per_consumer_kw: Kw,

    /// Number of consumers, ids run 1..=consumer_count
    pub consumer_count: u32,

    /// Priority given to new and disconnected consumers
    pub default_priority: u8,

    pub policy: AllocationPolicy,

    /// Windows during which the site runs constrained
    pub peak_windows: Vec<PeakWindow>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            block_size_kw: 50,
            normal_ceiling_kw: 400,      // 8 blocks
            constrained_ceiling_kw: 300, // 6 blocks
            max_per_consumer_kw: 300,
            consumer_count: 6,
            default_priority: 3,
            policy: AllocationPolicy::RoundRobin,
            peak_windows: Vec::new(),
        }
    }
}

impl SiteConfig {
    /// Six stalls sharing 400 kW in 50 kW blocks
    pub fn demo() -> Self {
        Self::default()
    }

    pub fn with_consumers(count: u32) -> Self {
        Self {
            consumer_count: count,
            ..Default::default()
        }
    }

    /// Higher tiers are fully served before lower ones see a block
    pub fn strict_priority() -> Self {
        Self {
            policy: AllocationPolicy::StrictPriority,
            ..Default::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, LoadManagerError> {
        let config: SiteConfig =
            toml::from_str(contents).map_err(|e| LoadManagerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadManagerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LoadManagerError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), LoadManagerError> {
        let invalid = |msg: String| Err(LoadManagerError::InvalidConfig(msg));

        if self.block_size_kw == 0 {
            return invalid("block size must be positive".into());
        }
        for (name, value) in [
            ("normal ceiling", self.normal_ceiling_kw),
            ("constrained ceiling", self.constrained_ceiling_kw),
            ("per-consumer maximum", self.max_per_consumer_kw),
        ] {
            if value % self.block_size_kw != 0 {
                return invalid(format!(
                    "{} of {} kW is not a multiple of the {} kW block",
                    name, value, self.block_size_kw
                ));
            }
        }
        if self.constrained_ceiling_kw > self.normal_ceiling_kw {
            return invalid(format!(
                "constrained ceiling {} kW exceeds normal ceiling {} kW",
                self.constrained_ceiling_kw, self.normal_ceiling_kw
            ));
        }
        if self.consumer_count == 0 {
            return invalid("site needs at least one consumer".into());
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.default_priority) {
            return invalid(format!(
                "default priority {} outside {}..={}",
                self.default_priority, MIN_PRIORITY, MAX_PRIORITY
            ));
        }
        for window in &self.peak_windows {
            window.validate()?;
        }
        Ok(())
    }

    /// True if any peak window covers the given instant
    pub fn is_peak<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        self.peak_windows.iter().any(|w| w.contains(at))
    }
}

/// Hours during which the site runs on its constrained ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    /// Day of week (0 = Sunday, 6 = Saturday), any day when absent
    #[serde(default)]
    pub day_of_week: Option<u8>,

    /// Start hour (0-23), inclusive
    pub start_hour: u8,

    /// End hour (0-23), inclusive
    pub end_hour: u8,
}

impl PeakWindow {
    /// Typical evening grid peak
    pub fn evening() -> Self {
        Self {
            day_of_week: None,
            start_hour: 17,
            end_hour: 20,
        }
    }

    pub fn validate(&self) -> Result<(), LoadManagerError> {
        if self.start_hour > 23 || self.end_hour > 23 {
            return Err(LoadManagerError::InvalidConfig(format!(
                "peak window hours {}-{} outside 0..=23",
                self.start_hour, self.end_hour
            )));
        }
        if matches!(self.day_of_week, Some(d) if d > 6) {
            return Err(LoadManagerError::InvalidConfig(
                "peak window day of week outside 0..=6".into(),
            ));
        }
        Ok(())
    }

    pub fn contains<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        let hour = at.hour() as u8;
        let day = at.weekday().num_days_from_sunday() as u8;

        let hour_match = if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour <= self.end_hour
        } else {
            // Window spans midnight
            hour >= self.start_hour || hour <= self.end_hour
        };

        let day_match = self.day_of_week.map(|d| d == day).unwrap_or(true);

        hour_match && day_match
    }
}
