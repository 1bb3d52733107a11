use serde::{Deserialize, Serialize};

use crate::cluster::ResourceCluster;
use crate::config::PolicyMode;
use crate::coordinator::{AssignmentOutcome, Discovery};
use crate::coords::GridCoord;
use crate::harvest::HarvestTally;
use crate::occupant::{AgentId, Occupant};
use crate::picker::PickerState;
use crate::scout::ScoutState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoutSnapshot {
    pub id: AgentId,
    pub pos: GridCoord,
    pub battery: u32,
    pub state: ScoutState,
    pub target: Option<GridCoord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerSnapshot {
    pub id: AgentId,
    pub pos: GridCoord,
    pub battery: u32,
    pub storage: u32,
    pub storage_capacity: u32,
    pub state: PickerState,
    pub target: Option<GridCoord>,
}

/// A non-empty cell. `tree_picked` mirrors whether a cluster growing on
/// this cell's tree is currently regrowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub pos: GridCoord,
    pub occupants: Vec<Occupant>,
    pub tree_picked: bool,
}

/// Read-only view of one tick, for renderers and run logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: i32,
    pub height: i32,
    pub policy: PolicyMode,
    pub base: GridCoord,
    pub scouts: Vec<ScoutSnapshot>,
    pub pickers: Vec<PickerSnapshot>,
    pub clusters: Vec<ResourceCluster>,
    pub cells: Vec<CellSnapshot>,
    pub harvest: HarvestTally,
    pub assignments_delivered: u32,
    pub assignments_dropped: u32,
    /// Recent routing decisions, oldest first.
    pub assignment_log: Vec<(Discovery, AssignmentOutcome)>,
}

impl WorldSnapshot {
    pub fn cell(&self, pos: GridCoord) -> Option<&CellSnapshot> {
        self.cells.iter().find(|c| c.pos == pos)
    }

    pub fn ripe_clusters(&self) -> usize {
        self.clusters.iter().filter(|c| c.ripe).count()
    }
}
