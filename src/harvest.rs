use serde::{Deserialize, Serialize};

/// Run-wide count of picked clusters and units offloaded at base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HarvestTally {
    pub picked: u32,
    pub delivered: u32,
}

impl HarvestTally {
    pub fn new() -> Self {
        Self { picked: 0, delivered: 0 }
    }

    pub fn add_picked(&mut self, amount: u32) {
        self.picked = self.picked.saturating_add(amount);
    }

    pub fn add_delivered(&mut self, amount: u32) {
        self.delivered = self.delivered.saturating_add(amount);
    }

    /// Units picked but still sitting in picker storage.
    pub fn in_transit(&self) -> u32 {
        self.picked.saturating_sub(self.delivered)
    }
}
