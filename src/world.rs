use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::cluster::ResourceCluster;
use crate::config::{ConfigError, PolicyMode, SimConfig};
use crate::coordinator::Coordinator;
use crate::coords::GridCoord;
use crate::grid::{Field, Grid, GridError};
use crate::harvest::HarvestTally;
use crate::occupant::{AgentId, ClusterId, Occupant};
use crate::picker::{PickerAgent, PickerEvent};
use crate::scheduler::{Activation, Scheduler};
use crate::scout::ScoutAgent;
use crate::snapshot::{CellSnapshot, PickerSnapshot, ScoutSnapshot, WorldSnapshot};

/// Chance that a planting cell starts with a cluster.
const PLANT_CHANCE: f64 = 0.5;
/// First planting column and spacing between columns.
const PLANT_COLUMN_START: i32 = 2;
const PLANT_COLUMN_STEP: usize = 3;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no such {} in this world: {:?}", .0.label(), .0)]
    UnknownAgent(Occupant),
}

/// What gets laid out besides the robots and the charging station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Tree rows with randomly planted clusters and a river down the middle.
    #[default]
    Farm,
    /// Empty field; clusters are planted by hand.
    Bare,
}

#[derive(Debug)]
pub struct World {
    config: SimConfig,
    grid: Grid,
    scouts: Vec<ScoutAgent>,
    pickers: Vec<PickerAgent>,
    clusters: Vec<ResourceCluster>,
    coordinator: Coordinator,
    scheduler: Scheduler,
    rng: StdRng,
    tick: u64,
    pub harvest: HarvestTally,
}

impl World {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        Self::with_layout(config, Layout::Farm)
    }

    pub fn from_counts(
        num_scouts: u32,
        num_pickers: u32,
        num_resource_cells: u32,
        policy: PolicyMode,
    ) -> Result<Self, SimError> {
        Self::new(SimConfig::with_counts(num_scouts, num_pickers, num_resource_cells, policy))
    }

    pub fn with_layout(config: SimConfig, layout: Layout) -> Result<Self, SimError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut world = Self {
            grid: Grid::new(config.width, config.height),
            scouts: Vec::new(),
            pickers: Vec::new(),
            clusters: Vec::new(),
            coordinator: Coordinator::new(config.policy),
            scheduler: Scheduler::new(),
            rng,
            tick: 0,
            harvest: HarvestTally::new(),
            config,
        };
        world.populate()?;
        if layout == Layout::Farm {
            world.plant_farm()?;
            world.dig_river()?;
        }
        info!(
            policy = %world.config.policy,
            scouts = world.scouts.len(),
            pickers = world.pickers.len(),
            clusters = world.clusters.len(),
            "world ready"
        );
        Ok(world)
    }

    fn populate(&mut self) -> Result<(), SimError> {
        let base = self.config.base;
        let cfg = &self.config;
        self.grid.place(Occupant::ChargingStation, base)?;
        for id in 0..cfg.num_scouts {
            let scout = ScoutAgent::new(id, base, cfg.battery_capacity, cfg.policy);
            self.grid.place(scout.occupant(), base)?;
            self.scouts.push(scout);
        }
        for n in 0..cfg.num_pickers {
            let id = cfg.num_scouts + n;
            let picker = PickerAgent::new(id, base, cfg.battery_capacity, cfg.storage_capacity, cfg.policy);
            self.grid.place(picker.occupant(), base)?;
            self.pickers.push(picker);
        }
        Ok(())
    }

    /// Trees on every planting cell; each cell independently may carry a
    /// cluster, up to the configured number of resource cells.
    fn plant_farm(&mut self) -> Result<(), SimError> {
        let (w, h) = (self.config.width, self.config.height);
        let mut seeded = Vec::new();
        for x in (PLANT_COLUMN_START..w).step_by(PLANT_COLUMN_STEP) {
            for y in (2..=h - 2).rev() {
                let c = GridCoord::new(x, y);
                self.grid.place(Occupant::Tree, c)?;
                if self.rng.gen_bool(PLANT_CHANCE) {
                    seeded.push(c);
                }
            }
        }
        let cap = self.config.num_resource_cells as usize;
        if seeded.len() > cap {
            seeded = seeded.choose_multiple(&mut self.rng, cap).copied().collect();
            seeded.sort();
        }
        for c in seeded {
            self.plant_cluster(c)?;
        }
        Ok(())
    }

    fn dig_river(&mut self) -> Result<(), SimError> {
        let x1 = self.config.width / 2;
        for x in [x1, x1 + 1] {
            if x >= self.config.width {
                continue;
            }
            for y in 0..self.config.height {
                self.grid.place(Occupant::River, GridCoord::new(x, y))?;
            }
        }
        Ok(())
    }

    /// Plants a ripe cluster; trees are left to the caller.
    pub fn plant_cluster(&mut self, pos: GridCoord) -> Result<ClusterId, SimError> {
        let id = self.clusters.len() as ClusterId;
        self.grid.place(Occupant::Cluster(id), pos)?;
        self.clusters.push(ResourceCluster::new(id, pos, self.config.regrowth_ticks));
        Ok(id)
    }

    /// Puts a scout or picker on `pos`, keeping grid and agent in sync.
    pub fn place_agent(&mut self, who: Occupant, pos: GridCoord) -> Result<(), SimError> {
        match who {
            Occupant::Scout(id) => {
                let scout = self.scouts.iter_mut().find(|s| s.id == id).ok_or(SimError::UnknownAgent(who))?;
                self.grid.move_to(who, pos)?;
                scout.pos = pos;
            }
            Occupant::Picker(id) => {
                let picker = self.pickers.iter_mut().find(|p| p.id == id).ok_or(SimError::UnknownAgent(who))?;
                self.grid.move_to(who, pos)?;
                picker.pos = pos;
            }
            _ => return Err(SimError::UnknownAgent(who)),
        }
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
    pub fn grid(&self) -> &Grid {
        &self.grid
    }
    pub fn scouts(&self) -> &[ScoutAgent] {
        &self.scouts
    }
    pub fn pickers(&self) -> &[PickerAgent] {
        &self.pickers
    }
    pub fn clusters(&self) -> &[ResourceCluster] {
        &self.clusters
    }
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn scout_mut(&mut self, id: AgentId) -> Option<&mut ScoutAgent> {
        self.scouts.iter_mut().find(|s| s.id == id)
    }
    pub fn picker_mut(&mut self, id: AgentId) -> Option<&mut PickerAgent> {
        self.pickers.iter_mut().find(|p| p.id == id)
    }
    pub fn cluster_mut(&mut self, id: ClusterId) -> Option<&mut ResourceCluster> {
        self.clusters.get_mut(id as usize)
    }

    /// One scheduler pass. Discoveries are routed as soon as the scout that
    /// made them finishes, so pickers later in the same pass see them.
    ///
    /// A grid error aborts the pass without advancing the tick counter, but
    /// agents already activated keep their changes. Agents only step to
    /// in-bounds cells, so this does not happen with a validated config.
    pub fn advance_tick(&mut self) -> Result<(), SimError> {
        let order = self
            .scheduler
            .plan(self.scouts.len(), self.pickers.len(), self.clusters.len(), &mut self.rng);
        let base = self.config.base;
        for activation in order {
            match activation {
                Activation::Scout(i) => {
                    let mut field = Field { grid: &mut self.grid, clusters: &mut self.clusters };
                    let discovery = self.scouts[i].tick(&mut field, base, &mut self.rng)?;
                    if let Some(d) = discovery {
                        self.coordinator.route(d, &mut self.pickers);
                    }
                }
                Activation::Picker(i) => {
                    let mut field = Field { grid: &mut self.grid, clusters: &mut self.clusters };
                    match self.pickers[i].tick(&mut field, base, &mut self.rng)? {
                        Some(PickerEvent::Harvested(_)) => self.harvest.add_picked(1),
                        Some(PickerEvent::Docked { delivered }) => self.harvest.add_delivered(delivered),
                        None => {}
                    }
                }
                Activation::Cluster(i) => self.clusters[i].tick(),
            }
        }
        self.tick += 1;
        debug!(tick = self.tick, picked = self.harvest.picked, delivered = self.harvest.delivered, "tick complete");
        Ok(())
    }

    pub fn run(&mut self, num_ticks: u64) -> Result<(), SimError> {
        for _ in 0..num_ticks {
            self.advance_tick()?;
        }
        Ok(())
    }

    /// Runs up to `num_ticks`, stopping early once `keep_going` says so.
    /// Returns the number of ticks actually run.
    pub fn run_while<F>(&mut self, num_ticks: u64, mut keep_going: F) -> Result<u64, SimError>
    where
        F: FnMut(&World) -> bool,
    {
        let mut ran = 0;
        while ran < num_ticks && keep_going(self) {
            self.advance_tick()?;
            ran += 1;
        }
        Ok(ran)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let cells = self
            .grid
            .iter_cells()
            .filter(|(_, occ)| !occ.is_empty())
            .map(|(pos, occ)| CellSnapshot {
                pos,
                occupants: occ.to_vec(),
                tree_picked: occ.contains(&Occupant::Tree)
                    && occ.iter().any(|o| match o {
                        Occupant::Cluster(id) => self.clusters.get(*id as usize).is_some_and(|c| c.picked),
                        _ => false,
                    }),
            })
            .collect();
        WorldSnapshot {
            tick: self.tick,
            width: self.grid.width(),
            height: self.grid.height(),
            policy: self.config.policy,
            base: self.config.base,
            scouts: self
                .scouts
                .iter()
                .map(|s| ScoutSnapshot {
                    id: s.id,
                    pos: s.pos,
                    battery: s.battery.level,
                    state: s.state,
                    target: s.target,
                })
                .collect(),
            pickers: self
                .pickers
                .iter()
                .map(|p| PickerSnapshot {
                    id: p.id,
                    pos: p.pos,
                    battery: p.battery.level,
                    storage: p.storage,
                    storage_capacity: p.storage_capacity,
                    state: p.state,
                    target: p.target,
                })
                .collect(),
            clusters: self.clusters.clone(),
            cells,
            harvest: self.harvest,
            assignments_delivered: self.coordinator.delivered,
            assignments_dropped: self.coordinator.dropped,
            assignment_log: self.coordinator.log.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{AssignmentOutcome, Discovery};
    use crate::picker::PickerState;
    use crate::scout::ScoutState;

    fn seeded(policy: PolicyMode) -> SimConfig {
        SimConfig::with_counts(2, 3, 200, policy).with_seed(42)
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = World::from_counts(0, 1, 1, PolicyMode::Basic).unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::InvalidConfiguration(_))));
    }

    #[test]
    fn farm_layout() {
        let world = World::new(seeded(PolicyMode::Basic)).unwrap();
        let g = world.grid();
        let base = GridCoord::new(0, 0);
        assert!(g.has_at(base, Occupant::ChargingStation));
        assert_eq!(g.occupants_at(base).iter().filter(|o| o.is_agent()).count(), 5);
        // Planting columns 2, 5, 8, 11, 14, 17 with rows 18 down to 2.
        for x in [2, 5, 8, 11, 14, 17] {
            for y in 2..=18 {
                assert!(g.has_at(GridCoord::new(x, y), Occupant::Tree), "missing tree at ({x},{y})");
            }
            assert!(!g.has_at(GridCoord::new(x, 1), Occupant::Tree));
            assert!(!g.has_at(GridCoord::new(x, 19), Occupant::Tree));
        }
        for y in 0..20 {
            assert!(g.has_at(GridCoord::new(10, y), Occupant::River));
            assert!(g.has_at(GridCoord::new(11, y), Occupant::River));
        }
        for c in world.clusters() {
            assert!(c.ripe);
            assert!(g.has_at(c.pos, Occupant::Tree));
            assert_eq!(c.max_age, 50);
        }
        let n = world.clusters().len();
        assert!(n > 10 && n < 92, "unexpected cluster count {n}");
    }

    #[test]
    fn cluster_count_is_capped() {
        let cfg = SimConfig::with_counts(1, 1, 5, PolicyMode::Basic).with_seed(7);
        let world = World::new(cfg).unwrap();
        assert_eq!(world.clusters().len(), 5);
        for (i, c) in world.clusters().iter().enumerate() {
            assert_eq!(c.id as usize, i);
            assert!(world.grid().has_at(c.pos, Occupant::Cluster(c.id)));
        }
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = World::new(seeded(PolicyMode::Broadcast)).unwrap();
        let mut b = World::new(seeded(PolicyMode::Broadcast)).unwrap();
        a.run(150).unwrap();
        b.run(150).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn tick_counter_and_run_while() {
        let mut w = World::new(seeded(PolicyMode::Systematic)).unwrap();
        w.run(3).unwrap();
        assert_eq!(w.tick(), 3);
        let ran = w.run_while(100, |w| w.tick() < 10).unwrap();
        assert_eq!(ran, 7);
        assert_eq!(w.tick(), 10);
    }

    #[test]
    fn place_agent_checks_bounds_and_identity() {
        let mut w = World::with_layout(seeded(PolicyMode::Basic), Layout::Bare).unwrap();
        w.place_agent(Occupant::Picker(2), GridCoord::new(4, 4)).unwrap();
        assert_eq!(w.pickers()[0].pos, GridCoord::new(4, 4));
        assert!(matches!(
            w.place_agent(Occupant::Picker(2), GridCoord::new(20, 4)),
            Err(SimError::Grid(GridError::OutOfBounds { .. }))
        ));
        assert_eq!(w.pickers()[0].pos, GridCoord::new(4, 4));
        assert!(matches!(w.place_agent(Occupant::Scout(99), GridCoord::new(1, 1)), Err(SimError::UnknownAgent(_))));
        assert!(matches!(w.place_agent(Occupant::Tree, GridCoord::new(1, 1)), Err(SimError::UnknownAgent(_))));
    }

    #[test]
    fn agents_stay_in_bounds_and_grid_agrees() {
        for policy in PolicyMode::ALL {
            let mut w = World::new(seeded(policy)).unwrap();
            for _ in 0..300 {
                w.advance_tick().unwrap();
                for s in w.scouts() {
                    assert!(w.grid().contains(s.pos));
                    assert_eq!(w.grid().position_of(s.occupant()), Some(s.pos));
                }
                for p in w.pickers() {
                    assert!(w.grid().contains(p.pos));
                    assert!(p.storage <= p.storage_capacity);
                    assert_eq!(w.grid().position_of(p.occupant()), Some(p.pos));
                }
            }
        }
    }

    #[test]
    fn broadcast_discovery_reaches_a_picker_in_the_same_tick() {
        let mut cfg = SimConfig::with_counts(1, 2, 1, PolicyMode::Broadcast).with_seed(1);
        cfg.width = 5;
        cfg.height = 5;
        let mut w = World::with_layout(cfg, Layout::Bare).unwrap();
        for c in w.grid().bounds().iter_cells().filter(|c| *c != GridCoord::new(0, 0)).collect::<Vec<_>>() {
            w.plant_cluster(c).unwrap();
        }
        w.advance_tick().unwrap();
        let scout = &w.scouts()[0];
        assert_eq!(scout.state, ScoutState::Waiting);
        let target = scout.target.unwrap();
        let holders: Vec<_> = w.pickers().iter().filter(|p| p.target == Some(target)).collect();
        assert_eq!(holders.len(), 1);
        assert!(matches!(holders[0].state, PickerState::Moving | PickerState::Picking));
        assert_eq!(w.coordinator().delivered, 1);
    }

    #[test]
    fn picker_out_of_charge_releases_its_target() {
        let mut cfg = SimConfig::with_counts(1, 2, 1, PolicyMode::Broadcast).with_seed(4);
        cfg.width = 10;
        cfg.height = 10;
        let mut w = World::with_layout(cfg, Layout::Bare).unwrap();
        let spot = GridCoord::new(5, 5);
        w.plant_cluster(spot).unwrap();
        w.place_agent(Occupant::Picker(1), GridCoord::new(9, 9)).unwrap();
        {
            let p = w.picker_mut(1).unwrap();
            p.battery.level = 1;
            p.assign(spot);
        }
        w.run(2).unwrap();
        assert_eq!(w.pickers()[0].state, PickerState::Returning);
        assert_eq!(w.pickers()[0].target, None);

        let out = w.coordinator.route(Discovery { target: spot, scout: 0 }, &mut w.pickers);
        assert_eq!(out, AssignmentOutcome::Delivered(2));
        assert_eq!(w.pickers()[1].target, Some(spot));
    }

    #[test]
    fn snapshot_reports_cells_and_tree_state() {
        let mut w = World::with_layout(seeded(PolicyMode::Basic), Layout::Bare).unwrap();
        let spot = GridCoord::new(3, 3);
        w.grid.place(Occupant::Tree, spot).unwrap();
        let id = w.plant_cluster(spot).unwrap();
        let snap = w.snapshot();
        assert_eq!(snap.scouts.len(), 2);
        assert_eq!(snap.pickers.len(), 3);
        assert!(!snap.cell(spot).unwrap().tree_picked);
        assert!(snap.cell(GridCoord::new(9, 9)).is_none());

        w.cluster_mut(id).unwrap().harvest();
        let snap = w.snapshot();
        assert!(snap.cell(spot).unwrap().tree_picked);
        assert_eq!(snap.ripe_clusters(), 0);
    }
}
