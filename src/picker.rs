use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::{Battery, random_neighbor, relocate};
use crate::config::PolicyMode;
use crate::coords::GridCoord;
use crate::grid::{Field, GridError};
use crate::occupant::{AgentId, ClusterId, Occupant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickerState {
    Idle,
    Moving,
    Picking,
    Returning,
}

/// What a picker activation produced, for the world's harvest tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEvent {
    Harvested(ClusterId),
    Docked { delivered: u32 },
}

/// Ground robot that harvests clusters and carries them back to base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerAgent {
    pub id: AgentId,
    pub pos: GridCoord,
    pub battery: Battery,
    pub storage: u32,
    pub storage_capacity: u32,
    pub state: PickerState,
    pub target: Option<GridCoord>,
    pub policy: PolicyMode,
}

impl PickerAgent {
    pub fn new(id: AgentId, pos: GridCoord, battery_capacity: u32, storage_capacity: u32, policy: PolicyMode) -> Self {
        Self {
            id,
            pos,
            battery: Battery::full(battery_capacity),
            storage: 0,
            storage_capacity,
            state: PickerState::Idle,
            target: None,
            policy,
        }
    }

    pub fn occupant(&self) -> Occupant {
        Occupant::Picker(self.id)
    }

    pub fn is_full(&self) -> bool {
        self.storage >= self.storage_capacity
    }

    /// Accepts a target from the coordinator. Broadcast pickers start moving
    /// right away; systematic pickers notice it on their next activation.
    pub fn assign(&mut self, target: GridCoord) {
        if self.state != PickerState::Idle {
            return;
        }
        self.target = Some(target);
        if self.policy == PolicyMode::Broadcast {
            self.state = PickerState::Moving;
        }
    }

    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        field: &mut Field<'_>,
        base: GridCoord,
        rng: &mut R,
    ) -> Result<Option<PickerEvent>, GridError> {
        let was_returning = self.state == PickerState::Returning;
        if !was_returning && (self.battery.is_empty() || self.is_full()) {
            debug!(picker = self.id, battery = self.battery.level, storage = self.storage, "returning to base");
            // An abandoned target goes back to the coordinator's pool.
            self.target = None;
            self.state = PickerState::Returning;
        }

        match self.state {
            PickerState::Idle => {
                self.idle(field, rng)?;
                Ok(None)
            }
            PickerState::Moving => {
                self.advance(field)?;
                Ok(None)
            }
            PickerState::Picking => self.pick(field, rng),
            PickerState::Returning => self.return_to_base(field, base, was_returning),
        }
    }

    fn idle<R: Rng + ?Sized>(&mut self, field: &mut Field<'_>, rng: &mut R) -> Result<(), GridError> {
        match self.policy {
            PolicyMode::Basic => {
                if let Some(next) = random_neighbor(field.grid, self.pos, rng) {
                    relocate(field.grid, self.occupant(), &mut self.pos, next)?;
                }
                self.battery.drain(1);
                if field.ripe_cluster_at(self.pos).is_some() {
                    self.target = Some(self.pos);
                    self.state = PickerState::Picking;
                }
            }
            PolicyMode::Broadcast | PolicyMode::Systematic => {
                if self.target.is_some() {
                    self.state = PickerState::Moving;
                }
            }
        }
        Ok(())
    }

    fn advance(&mut self, field: &mut Field<'_>) -> Result<(), GridError> {
        let Some(target) = self.target else {
            self.state = PickerState::Idle;
            return Ok(());
        };
        let next = self.pos.step_toward(target);
        relocate(field.grid, self.occupant(), &mut self.pos, next)?;
        self.battery.drain(1);
        if self.pos == target {
            self.state = PickerState::Picking;
        }
        Ok(())
    }

    fn pick<R: Rng + ?Sized>(&mut self, field: &mut Field<'_>, rng: &mut R) -> Result<Option<PickerEvent>, GridError> {
        let harvested = field.harvest_at(self.pos);
        self.battery.drain(1);
        self.target = None;

        let Some(cluster) = harvested else {
            self.state = PickerState::Idle;
            return Ok(None);
        };
        self.storage = self.storage.saturating_add(1).min(self.storage_capacity);
        debug!(picker = self.id, cluster, storage = self.storage, "harvested cluster");

        if self.is_full() {
            self.state = PickerState::Returning;
        } else {
            if self.policy.broadcasts() {
                self.step_off_tree(field, rng)?;
            }
            self.state = PickerState::Idle;
        }
        Ok(Some(PickerEvent::Harvested(cluster)))
    }

    /// Frees the tree cell for the next assignment.
    fn step_off_tree<R: Rng + ?Sized>(&mut self, field: &mut Field<'_>, rng: &mut R) -> Result<(), GridError> {
        let open: Vec<GridCoord> = field
            .grid
            .neighbors(self.pos)
            .into_iter()
            .filter(|c| !field.has_tree(*c))
            .collect();
        if let Some(next) = open.choose(rng).copied() {
            relocate(field.grid, self.occupant(), &mut self.pos, next)?;
        }
        Ok(())
    }

    fn return_to_base(
        &mut self,
        field: &mut Field<'_>,
        base: GridCoord,
        was_returning: bool,
    ) -> Result<Option<PickerEvent>, GridError> {
        let next = self.pos.step_toward(base);
        relocate(field.grid, self.occupant(), &mut self.pos, next)?;
        if !(was_returning && self.pos == base) {
            return Ok(None);
        }
        let delivered = self.storage;
        self.battery.recharge();
        self.storage = 0;
        self.target = None;
        self.state = PickerState::Idle;
        debug!(picker = self.id, delivered, "docked at base");
        Ok(Some(PickerEvent::Docked { delivered }))
    }
}
