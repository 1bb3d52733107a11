use serde::{Deserialize, Serialize};

use crate::coords::GridCoord;
use crate::occupant::ClusterId;

/// A renewable strawberry cluster. It is either ripe, or picked and
/// regrowing; `age` counts ticks since it was last picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCluster {
    pub id: ClusterId,
    pub pos: GridCoord,
    pub age: u32,
    pub max_age: u32,
    pub ripe: bool,
    pub picked: bool,
}

impl ResourceCluster {
    /// Clusters are planted ripe.
    pub fn new(id: ClusterId, pos: GridCoord, max_age: u32) -> Self {
        Self { id, pos, age: 0, max_age, ripe: true, picked: false }
    }

    pub fn is_ripe(&self) -> bool {
        self.ripe
    }

    pub fn tick(&mut self) {
        if self.ripe {
            return;
        }
        self.age = self.age.saturating_add(1);
        if self.age >= self.max_age {
            self.ripe = true;
            self.picked = false;
            self.age = 0;
        }
    }

    /// Returns false when there was nothing to harvest.
    pub fn harvest(&mut self) -> bool {
        if !self.ripe {
            return false;
        }
        self.ripe = false;
        self.picked = true;
        self.age = 0;
        true
    }

    /// Ticks left until the cluster is ripe again; zero when ripe.
    pub fn ticks_to_ripe(&self) -> u32 {
        if self.ripe { 0 } else { self.max_age.saturating_sub(self.age) }
    }
}
