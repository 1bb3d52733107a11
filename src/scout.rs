use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::{Battery, random_neighbor, relocate};
use crate::config::PolicyMode;
use crate::coordinator::Discovery;
use crate::coords::{GridCoord, GridRect};
use crate::grid::{Field, GridError};
use crate::occupant::{AgentId, Occupant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoutState {
    Exploring,
    Waiting,
    Returning,
}

/// Aerial drone that finds ripe clusters and, depending on the policy,
/// reports them to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoutAgent {
    pub id: AgentId,
    pub pos: GridCoord,
    pub battery: Battery,
    pub state: ScoutState,
    pub target: Option<GridCoord>,
    pub policy: PolicyMode,
    /// Remaining sweep cells; built on the first systematic move.
    #[serde(skip)]
    sweep: Option<VecDeque<GridCoord>>,
}

impl ScoutAgent {
    pub fn new(id: AgentId, pos: GridCoord, battery_capacity: u32, policy: PolicyMode) -> Self {
        Self {
            id,
            pos,
            battery: Battery::full(battery_capacity),
            state: ScoutState::Exploring,
            target: None,
            policy,
            sweep: None,
        }
    }

    pub fn occupant(&self) -> Occupant {
        Occupant::Scout(self.id)
    }

    /// Cells left in the current sweep, if one has been planned.
    pub fn sweep_remaining(&self) -> Option<usize> {
        self.sweep.as_ref().map(VecDeque::len)
    }

    /// One activation. Returns a discovery for the coordinator when the
    /// policy broadcasts and a ripe cluster is in sight.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        field: &mut Field<'_>,
        base: GridCoord,
        rng: &mut R,
    ) -> Result<Option<Discovery>, GridError> {
        let was_returning = self.state == ScoutState::Returning;
        if self.battery.is_empty() && !was_returning {
            debug!(scout = self.id, "battery empty, returning to base");
            self.state = ScoutState::Returning;
        }

        match self.state {
            ScoutState::Exploring => self.explore(field, rng),
            ScoutState::Waiting => Ok(self.watch_target(field)),
            ScoutState::Returning => {
                self.return_to_base(field, base, was_returning)?;
                Ok(None)
            }
        }
    }

    fn explore<R: Rng + ?Sized>(&mut self, field: &mut Field<'_>, rng: &mut R) -> Result<Option<Discovery>, GridError> {
        let next = match self.policy {
            PolicyMode::Basic | PolicyMode::Broadcast => random_neighbor(field.grid, self.pos, rng),
            PolicyMode::Systematic => self.next_sweep_step(field.grid.bounds()),
        };
        if let Some(next) = next {
            relocate(field.grid, self.occupant(), &mut self.pos, next)?;
        }
        self.battery.drain(1);

        if field.ripe_cluster_at(self.pos).is_none() {
            return Ok(None);
        }
        debug!(scout = self.id, x = self.pos.x, y = self.pos.y, "ripe cluster found");
        self.target = Some(self.pos);
        self.state = ScoutState::Waiting;
        Ok(self.report(self.pos))
    }

    /// Stays on a found cluster until it is gone. Broadcasting scouts keep
    /// reporting it so a discovery dropped for lack of pickers is retried.
    fn watch_target(&mut self, field: &Field<'_>) -> Option<Discovery> {
        match self.target {
            Some(t) if field.ripe_cluster_at(t).is_some() => self.report(t),
            _ => {
                self.target = None;
                self.state = ScoutState::Exploring;
                None
            }
        }
    }

    fn report(&self, target: GridCoord) -> Option<Discovery> {
        self.policy
            .broadcasts()
            .then_some(Discovery { target, scout: self.id })
    }

    fn return_to_base(&mut self, field: &mut Field<'_>, base: GridCoord, was_returning: bool) -> Result<(), GridError> {
        let next = self.pos.step_toward(base);
        relocate(field.grid, self.occupant(), &mut self.pos, next)?;
        // Docking needs a full tick spent returning.
        if was_returning && self.pos == base {
            self.battery.recharge();
            self.target = None;
            self.state = ScoutState::Exploring;
            debug!(scout = self.id, "recharged at base");
        }
        Ok(())
    }

    /// Even ids sweep row by row, odd ids column by column. The scout walks
    /// toward the next path cell and consumes it on arrival; an exhausted
    /// sweep starts over.
    fn next_sweep_step(&mut self, bounds: GridRect) -> Option<GridCoord> {
        let pos = self.pos;
        let row_major = self.id % 2 == 0;
        let path = self.sweep.get_or_insert_with(|| bounds.sweep_path(row_major).into());
        while path.front() == Some(&pos) {
            path.pop_front();
        }
        if path.is_empty() {
            *path = bounds.sweep_path(row_major).into();
            while path.front() == Some(&pos) {
                path.pop_front();
            }
        }
        let waypoint = *path.front()?;
        let step = pos.step_toward(waypoint);
        if step == waypoint {
            path.pop_front();
        }
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ResourceCluster;
    use crate::grid::Grid;
    use rand::{SeedableRng, rngs::StdRng};

    struct Bench {
        grid: Grid,
        clusters: Vec<ResourceCluster>,
        rng: StdRng,
    }

    impl Bench {
        fn new(w: i32, h: i32) -> Self {
            Self { grid: Grid::new(w, h), clusters: Vec::new(), rng: StdRng::seed_from_u64(3) }
        }

        fn plant(&mut self, pos: GridCoord) {
            let id = self.clusters.len() as u32;
            self.clusters.push(ResourceCluster::new(id, pos, 50));
            self.grid.place(Occupant::Cluster(id), pos).unwrap();
        }

        fn scout(&mut self, id: AgentId, pos: GridCoord, policy: PolicyMode) -> ScoutAgent {
            let s = ScoutAgent::new(id, pos, 100, policy);
            self.grid.place(s.occupant(), pos).unwrap();
            s
        }

        fn tick(&mut self, s: &mut ScoutAgent) -> Option<Discovery> {
            let mut field = Field { grid: &mut self.grid, clusters: &mut self.clusters };
            s.tick(&mut field, GridCoord::new(0, 0), &mut self.rng).unwrap()
        }
    }

    #[test]
    fn exploring_drains_battery_each_move() {
        let mut b = Bench::new(10, 10);
        let mut s = b.scout(0, GridCoord::new(5, 5), PolicyMode::Basic);
        for i in 1..=5 {
            let before = s.pos;
            b.tick(&mut s);
            assert_eq!(s.battery.level, 100 - i);
            assert_eq!(before.step_toward(s.pos), s.pos);
            assert_eq!(b.grid.position_of(s.occupant()), Some(s.pos));
        }
    }

    #[test]
    fn empty_battery_forces_return_for_that_tick() {
        let mut b = Bench::new(10, 10);
        for state in [ScoutState::Exploring, ScoutState::Waiting] {
            let mut s = b.scout(0, GridCoord::new(0, 0), PolicyMode::Basic);
            s.state = state;
            s.battery.level = 0;
            b.tick(&mut s);
            assert_eq!(s.state, ScoutState::Returning);
            assert_eq!(s.battery.level, 0);
        }
    }

    #[test]
    fn returning_scout_walks_home_and_recharges() {
        let mut b = Bench::new(10, 10);
        let mut s = b.scout(0, GridCoord::new(3, 1), PolicyMode::Basic);
        s.battery.level = 0;
        b.tick(&mut s);
        assert_eq!(s.pos, GridCoord::new(2, 0));
        b.tick(&mut s);
        b.tick(&mut s);
        assert_eq!(s.pos, GridCoord::new(0, 0));
        assert_eq!(s.state, ScoutState::Exploring);
        assert_eq!(s.battery.level, 100);
    }

    #[test]
    fn silent_discovery_in_basic_mode() {
        let mut b = Bench::new(3, 3);
        for c in b.grid.bounds().iter_cells() {
            if c != GridCoord::new(1, 1) {
                b.plant(c);
            }
        }
        let mut s = b.scout(0, GridCoord::new(1, 1), PolicyMode::Basic);
        let report = b.tick(&mut s);
        assert!(report.is_none());
        assert_eq!(s.state, ScoutState::Waiting);
        assert_eq!(s.target, Some(s.pos));
    }

    #[test]
    fn broadcast_discovery_reports_target() {
        let mut b = Bench::new(3, 3);
        for c in b.grid.bounds().iter_cells() {
            if c != GridCoord::new(1, 1) {
                b.plant(c);
            }
        }
        let mut s = b.scout(7, GridCoord::new(1, 1), PolicyMode::Broadcast);
        let report = b.tick(&mut s).unwrap();
        assert_eq!(report.scout, 7);
        assert_eq!(report.target, s.pos);
        // Still ripe: the waiting scout repeats the report.
        assert_eq!(b.tick(&mut s), Some(report));
    }

    #[test]
    fn waiting_resumes_exploring_once_cluster_is_gone() {
        let mut b = Bench::new(5, 5);
        let spot = GridCoord::new(2, 2);
        b.plant(spot);
        let mut s = b.scout(0, spot, PolicyMode::Basic);
        s.state = ScoutState::Waiting;
        s.target = Some(spot);
        b.tick(&mut s);
        assert_eq!(s.state, ScoutState::Waiting);
        b.clusters[0].harvest();
        b.tick(&mut s);
        assert_eq!(s.state, ScoutState::Exploring);
        assert!(s.target.is_none());
    }

    #[test]
    fn waiting_without_target_goes_back_to_exploring() {
        let mut b = Bench::new(5, 5);
        let mut s = b.scout(0, GridCoord::new(1, 1), PolicyMode::Systematic);
        s.state = ScoutState::Waiting;
        assert!(b.tick(&mut s).is_none());
        assert_eq!(s.state, ScoutState::Exploring);
    }

    #[test]
    fn even_scout_sweeps_rows() {
        let mut b = Bench::new(3, 3);
        let mut s = b.scout(0, GridCoord::new(0, 0), PolicyMode::Systematic);
        let mut visited = Vec::new();
        for _ in 0..8 {
            b.tick(&mut s);
            visited.push((s.pos.x, s.pos.y));
        }
        assert_eq!(visited, [(1, 0), (2, 0), (2, 1), (1, 1), (0, 1), (0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn odd_scout_sweeps_columns_and_restarts() {
        let mut b = Bench::new(2, 2);
        let mut s = b.scout(1, GridCoord::new(0, 0), PolicyMode::Systematic);
        let mut visited = Vec::new();
        for _ in 0..6 {
            b.tick(&mut s);
            visited.push((s.pos.x, s.pos.y));
        }
        // (0,1) (1,1) (1,0), then the sweep restarts from (0,0).
        assert_eq!(visited, [(0, 1), (1, 1), (1, 0), (0, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn systematic_scout_walks_back_to_its_sweep() {
        let mut b = Bench::new(6, 6);
        let mut s = b.scout(0, GridCoord::new(0, 0), PolicyMode::Systematic);
        for _ in 0..5 {
            b.tick(&mut s);
        }
        assert_eq!(s.pos, GridCoord::new(5, 0));
        b.grid.move_to(s.occupant(), GridCoord::new(0, 3)).unwrap();
        s.pos = GridCoord::new(0, 3);
        b.tick(&mut s);
        assert_eq!(s.pos, GridCoord::new(1, 2));
        assert_eq!(s.sweep_remaining(), Some(30));
    }
}
