use serde::{Deserialize, Serialize};
use std::str::FromStr;
use super::Kw;
use crate::config::SiteConfig;
use crate::LoadManagerError;

/// Named ceiling configuration for the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    #[default]
    Normal,
    /// Reduced ceiling, e.g. while peak shaving
    Constrained,
}

impl CapacityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityMode::Normal => "normal",
            CapacityMode::Constrained => "constrained",
        }
    }
}

impl std::fmt::Display for CapacityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapacityMode {
    type Err = LoadManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(CapacityMode::Normal),
            "constrained" | "peak-shave" | "peak_shave" => Ok(CapacityMode::Constrained),
            other => Err(LoadManagerError::InvalidArgument(format!(
                "unknown capacity mode '{}'",
                other
            ))),
        }
    }
}

/// Tracks the site ceiling for the active mode and how much of it is handed out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityPool {
    mode: CapacityMode,
    block_size_kw: Kw,
    normal_ceiling_kw: Kw,
    constrained_ceiling_kw: Kw,
    allocated_blocks: u32,
}

impl CapacityPool {
    pub fn new(block_size_kw: Kw, normal_ceiling_kw: Kw, constrained_ceiling_kw: Kw) -> Self {
        Self {
            mode: CapacityMode::Normal,
            block_size_kw,
            normal_ceiling_kw,
            constrained_ceiling_kw,
            allocated_blocks: 0,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.block_size_kw,
            config.normal_ceiling_kw,
            config.constrained_ceiling_kw,
        )
    }

    pub fn mode(&self) -> CapacityMode {
        self.mode
    }

    /// Returns true if the mode actually changed
    pub fn set_mode(&mut self, mode: CapacityMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn block_size_kw(&self) -> Kw {
        self.block_size_kw
    }

    pub fn ceiling_kw(&self) -> Kw {
        match self.mode {
            CapacityMode::Normal => self.normal_ceiling_kw,
            CapacityMode::Constrained => self.constrained_ceiling_kw,
        }
    }

    pub fn total_blocks(&self) -> u32 {
        if self.block_size_kw == 0 {
            return 0;
        }
        self.ceiling_kw() / self.block_size_kw
    }

    pub fn free_blocks(&self, allocated_total: u32) -> u32 {
        self.total_blocks().saturating_sub(allocated_total)
    }

    /// Blocks handed out by the last recompute
    pub fn allocated_blocks(&self) -> u32 {
        self.allocated_blocks
    }

    pub(crate) fn record_allocated(&mut self, blocks: u32) {
        self.allocated_blocks = blocks;
    }
}
