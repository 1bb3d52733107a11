use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AssignmentRule, PolicyMode};
use crate::coords::GridCoord;
use crate::occupant::AgentId;
use crate::picker::{PickerAgent, PickerState};

/// Entries kept in the assignment log.
pub const LOG_CAPACITY: usize = 64;

/// A scout's report of a ripe cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub target: GridCoord,
    pub scout: AgentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOutcome {
    Delivered(AgentId),
    /// Some picker is already heading for this target.
    AlreadyAssigned(AgentId),
    /// No picker was free to take it.
    Dropped,
}

impl Discovery {
    pub fn description(&self) -> String {
        format!("Scout #{} found ripe cluster at ({},{})", self.scout, self.target.x, self.target.y)
    }
}

/// A picker can take a new target only while idle with nothing pending.
fn is_available(p: &PickerAgent) -> bool {
    p.state == PickerState::Idle && p.target.is_none()
}

/// Whether `p` will still act on its current target: pending while idle,
/// on the way, or about to harvest.
fn is_holding(p: &PickerAgent, target: GridCoord) -> bool {
    p.target == Some(target) && matches!(p.state, PickerState::Idle | PickerState::Moving | PickerState::Picking)
}

/// Pure lookup of the picker that should receive `discovery`.
pub fn select_picker(rule: AssignmentRule, discovery: &Discovery, pickers: &[PickerAgent]) -> AssignmentOutcome {
    if let Some(holder) = pickers.iter().find(|p| is_holding(p, discovery.target)) {
        return AssignmentOutcome::AlreadyAssigned(holder.id);
    }
    let mut candidates = pickers.iter().filter(|p| is_available(p));
    let chosen = match rule {
        AssignmentRule::FirstIdle => candidates.next(),
        // min_by_key keeps the first of equal keys, so ties go to population order.
        AssignmentRule::NearestIdle => candidates.min_by_key(|p| p.pos.manhattan(discovery.target)),
    };
    match chosen {
        Some(p) => AssignmentOutcome::Delivered(p.id),
        None => AssignmentOutcome::Dropped,
    }
}

/// Brokers discoveries from scouts to pickers and keeps a short log.
#[derive(Debug, Clone)]
pub struct Coordinator {
    rule: Option<AssignmentRule>,
    pub log: VecDeque<(Discovery, AssignmentOutcome)>,
    pub delivered: u32,
    pub dropped: u32,
}

impl Coordinator {
    pub fn new(policy: PolicyMode) -> Self {
        Self {
            rule: policy.assignment_rule(),
            log: VecDeque::with_capacity(LOG_CAPACITY),
            delivered: 0,
            dropped: 0,
        }
    }

    /// Selects a receiver and hands it the target in the same call, so
    /// pickers activated later in the tick already see the assignment.
    pub fn route(&mut self, discovery: Discovery, pickers: &mut [PickerAgent]) -> AssignmentOutcome {
        let outcome = match self.rule {
            Some(rule) => select_picker(rule, &discovery, pickers),
            None => AssignmentOutcome::Dropped,
        };
        match outcome {
            AssignmentOutcome::Delivered(id) => {
                if let Some(p) = pickers.iter_mut().find(|p| p.id == id) {
                    p.assign(discovery.target);
                }
                self.delivered = self.delivered.saturating_add(1);
                debug!(scout = discovery.scout, picker = id, x = discovery.target.x, y = discovery.target.y, "assignment delivered");
                self.record(discovery, outcome);
            }
            AssignmentOutcome::Dropped => {
                self.dropped = self.dropped.saturating_add(1);
                debug!(scout = discovery.scout, x = discovery.target.x, y = discovery.target.y, "no idle picker, discovery dropped");
                self.record(discovery, outcome);
            }
            // Repeats from a waiting scout; not worth a log entry.
            AssignmentOutcome::AlreadyAssigned(_) => {}
        }
        outcome
    }

    fn record(&mut self, discovery: Discovery, outcome: AssignmentOutcome) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back((discovery, outcome));
    }
}
