pub mod agent;
pub mod cluster;
pub mod config;
pub mod coordinator;
pub mod coords;
pub mod grid;
pub mod harvest;
pub mod hud;
pub mod occupant;
pub mod picker;
pub mod scheduler;
pub mod scout;
pub mod snapshot;
pub mod world;

// Re-exports for convenience in tests and integration users.
pub use cluster::ResourceCluster;
pub use config::{ConfigError, PolicyMode, SimConfig};
pub use coordinator::{AssignmentOutcome, Coordinator, Discovery};
pub use coords::{GridCoord, GridRect};
pub use grid::{Grid, GridError};
pub use harvest::HarvestTally;
pub use hud::{HudControls, format_hud, format_side_panel, hud_controls};
pub use occupant::{AgentId, ClusterId, Occupant};
pub use picker::{PickerAgent, PickerState};
pub use scout::{ScoutAgent, ScoutState};
pub use snapshot::WorldSnapshot;
pub use world::{Layout, SimError, World};
