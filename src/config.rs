use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::GridCoord;

pub const DEFAULT_GRID_WIDTH: i32 = 20;
pub const DEFAULT_GRID_HEIGHT: i32 = 20;
pub const DEFAULT_BATTERY_CAPACITY: u32 = 100;
pub const DEFAULT_STORAGE_CAPACITY: u32 = 5;
pub const DEFAULT_REGROWTH_TICKS: u32 = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Behaviour family shared by every scout and picker in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PolicyMode {
    /// Random scouts, random pickers, no coordination.
    #[default]
    Basic,
    /// Random scouts that hand discoveries to the first idle picker.
    Broadcast,
    /// Sweeping scouts that hand discoveries to the nearest idle picker.
    Systematic,
}

/// How the coordinator picks a receiver for a discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentRule {
    FirstIdle,
    NearestIdle,
}

impl PolicyMode {
    pub const ALL: [PolicyMode; 3] = [PolicyMode::Basic, PolicyMode::Broadcast, PolicyMode::Systematic];

    pub fn assignment_rule(self) -> Option<AssignmentRule> {
        match self {
            PolicyMode::Basic => None,
            PolicyMode::Broadcast => Some(AssignmentRule::FirstIdle),
            PolicyMode::Systematic => Some(AssignmentRule::NearestIdle),
        }
    }

    pub fn broadcasts(self) -> bool {
        self.assignment_rule().is_some()
    }

    pub fn label(self) -> &'static str {
        match self {
            PolicyMode::Basic => "Basic",
            PolicyMode::Broadcast => "Broadcast",
            PolicyMode::Systematic => "Systematic",
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PolicyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(PolicyMode::Basic),
            // "extended" is the older name of the broadcast mode.
            "broadcast" | "extended" => Ok(PolicyMode::Broadcast),
            "systematic" => Ok(PolicyMode::Systematic),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "unknown policy mode '{}'",
                other
            ))),
        }
    }
}

/// Everything a run needs, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: i32,
    pub height: i32,
    pub battery_capacity: u32,
    pub storage_capacity: u32,
    pub regrowth_ticks: u32,
    pub policy: PolicyMode,
    pub num_scouts: u32,
    pub num_pickers: u32,
    /// Upper bound on clusters planted at setup.
    pub num_resource_cells: u32,
    pub base: GridCoord,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            battery_capacity: DEFAULT_BATTERY_CAPACITY,
            storage_capacity: DEFAULT_STORAGE_CAPACITY,
            regrowth_ticks: DEFAULT_REGROWTH_TICKS,
            policy: PolicyMode::Basic,
            num_scouts: 2,
            num_pickers: 3,
            num_resource_cells: 5,
            base: GridCoord::new(0, 0),
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn with_counts(num_scouts: u32, num_pickers: u32, num_resource_cells: u32, policy: PolicyMode) -> Self {
        Self {
            num_scouts,
            num_pickers,
            num_resource_cells,
            policy,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::InvalidConfiguration(msg)) };
        if self.width <= 0 || self.height <= 0 {
            return invalid(format!("grid must be non-empty, got {}x{}", self.width, self.height));
        }
        if self.num_scouts == 0 {
            return invalid("at least one scout is required".into());
        }
        if self.num_pickers == 0 {
            return invalid("at least one picker is required".into());
        }
        if self.num_resource_cells == 0 {
            return invalid("at least one resource cell is required".into());
        }
        if self.battery_capacity == 0 {
            return invalid("battery capacity must be positive".into());
        }
        if self.storage_capacity == 0 {
            return invalid("storage capacity must be positive".into());
        }
        if self.regrowth_ticks == 0 {
            return invalid("regrowth threshold must be positive".into());
        }
        let b = self.base;
        if b.x < 0 || b.y < 0 || b.x >= self.width || b.y >= self.height {
            return invalid(format!("base ({}, {}) lies outside the grid", b.x, b.y));
        }
        Ok(())
    }
}
