use std::collections::HashMap;

use thiserror::Error;

use crate::cluster::ResourceCluster;
use crate::coords::{GridCoord, GridRect};
use crate::occupant::{ClusterId, Occupant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("position ({}, {}) is outside the {width}x{height} grid", .pos.x, .pos.y)]
    OutOfBounds {
        pos: GridCoord,
        width: i32,
        height: i32,
    },
    #[error("{0:?} has not been placed on the grid")]
    NotPlaced(Occupant),
}

/// Bounded, non-wrapping multi-occupancy grid.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Vec<Occupant>>,
    locations: HashMap<Occupant, GridCoord>,
}

impl Grid {
    /// Dimensions are clamped to at least one cell each.
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let size = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Vec::new(); size],
            locations: HashMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }
    pub fn height(&self) -> i32 {
        self.height
    }
    pub fn bounds(&self) -> GridRect {
        GridRect::from_size(self.width, self.height)
    }

    fn index(&self, c: GridCoord) -> Option<usize> {
        if c.x < 0 || c.y < 0 || c.x >= self.width || c.y >= self.height {
            return None;
        }
        Some((c.y * self.width + c.x) as usize)
    }

    fn checked_index(&self, c: GridCoord) -> Result<usize, GridError> {
        self.index(c).ok_or(GridError::OutOfBounds {
            pos: c,
            width: self.width,
            height: self.height,
        })
    }

    pub fn contains(&self, c: GridCoord) -> bool {
        self.index(c).is_some()
    }

    pub fn place(&mut self, occupant: Occupant, pos: GridCoord) -> Result<(), GridError> {
        let i = self.checked_index(pos)?;
        if occupant.is_tracked() {
            if let Some(old) = self.locations.insert(occupant, pos) {
                self.detach(occupant, old);
            }
        }
        self.cells[i].push(occupant);
        Ok(())
    }

    /// Moves a placed occupant and returns the cell it left.
    pub fn move_to(&mut self, occupant: Occupant, pos: GridCoord) -> Result<GridCoord, GridError> {
        let i = self.checked_index(pos)?;
        let from = self
            .locations
            .get(&occupant)
            .copied()
            .ok_or(GridError::NotPlaced(occupant))?;
        if from == pos {
            return Ok(from);
        }
        self.detach(occupant, from);
        self.cells[i].push(occupant);
        self.locations.insert(occupant, pos);
        Ok(from)
    }

    pub fn remove(&mut self, occupant: Occupant) -> Result<GridCoord, GridError> {
        let from = self
            .locations
            .remove(&occupant)
            .ok_or(GridError::NotPlaced(occupant))?;
        self.detach(occupant, from);
        Ok(from)
    }

    fn detach(&mut self, occupant: Occupant, from: GridCoord) {
        if let Some(i) = self.index(from) {
            let cell = &mut self.cells[i];
            if let Some(slot) = cell.iter().position(|o| *o == occupant) {
                cell.remove(slot);
            }
        }
    }

    pub fn position_of(&self, occupant: Occupant) -> Option<GridCoord> {
        self.locations.get(&occupant).copied()
    }

    pub fn occupants_at(&self, pos: GridCoord) -> &[Occupant] {
        match self.index(pos) {
            Some(i) => &self.cells[i],
            None => &[],
        }
    }

    pub fn has_at(&self, pos: GridCoord, occupant: Occupant) -> bool {
        self.occupants_at(pos).contains(&occupant)
    }

    /// In-bounds Moore neighbors, row by row starting top-left.
    pub fn neighbors(&self, pos: GridCoord) -> Vec<GridCoord> {
        let mut out = Vec::with_capacity(8);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let c = GridCoord::new(pos.x + dx, pos.y + dy);
                if self.contains(c) {
                    out.push(c);
                }
            }
        }
        out
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (GridCoord, &[Occupant])> {
        self.bounds()
            .iter_cells()
            .map(move |c| (c, self.occupants_at(c)))
    }
}

/// Mutable view an agent acts on during its activation: the grid plus the
/// clusters whose state decides what a cell is worth.
pub struct Field<'a> {
    pub grid: &'a mut Grid,
    pub clusters: &'a mut [ResourceCluster],
}

impl Field<'_> {
    pub fn ripe_cluster_at(&self, pos: GridCoord) -> Option<ClusterId> {
        self.grid.occupants_at(pos).iter().find_map(|o| match o {
            Occupant::Cluster(id) => self
                .clusters
                .get(*id as usize)
                .filter(|c| c.is_ripe())
                .map(|c| c.id),
            _ => None,
        })
    }

    /// Harvests the first ripe cluster in the cell, at most one per call.
    pub fn harvest_at(&mut self, pos: GridCoord) -> Option<ClusterId> {
        let id = self.ripe_cluster_at(pos)?;
        let cluster = self.clusters.get_mut(id as usize)?;
        cluster.harvest().then_some(id)
    }

    pub fn has_tree(&self, pos: GridCoord) -> bool {
        self.grid.has_at(pos, Occupant::Tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_bounds() {
        let g = Grid::new(3, 2);
        assert!(g.index(GridCoord::new(0, 0)).is_some());
        assert!(g.index(GridCoord::new(2, 1)).is_some());
        assert!(g.index(GridCoord::new(-1, 0)).is_none());
        assert!(g.index(GridCoord::new(3, 0)).is_none());
        assert!(g.index(GridCoord::new(0, 2)).is_none());
    }

    #[test]
    fn degenerate_dimensions_clamp_to_one_cell() {
        let g = Grid::new(0, -3);
        assert_eq!((g.width(), g.height()), (1, 1));
        assert_eq!(g.bounds().iter_cells().count(), 1);
        assert_eq!(g.iter_cells().count(), 1);
        assert!(g.neighbors(GridCoord::new(0, 0)).is_empty());
    }

    #[test]
    fn place_rejects_out_of_bounds_without_mutating() {
        let mut g = Grid::new(4, 4);
        let err = g.place(Occupant::Scout(0), GridCoord::new(4, 0)).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { .. }));
        assert!(g.position_of(Occupant::Scout(0)).is_none());
        assert!(g.iter_cells().all(|(_, occ)| occ.is_empty()));
    }

    #[test]
    fn move_rejects_out_of_bounds_and_keeps_old_cell() {
        let mut g = Grid::new(4, 4);
        let a = Occupant::Picker(1);
        g.place(a, GridCoord::new(1, 1)).unwrap();
        let err = g.move_to(a, GridCoord::new(1, -1)).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { .. }));
        assert!(g.has_at(GridCoord::new(1, 1), a));
        assert_eq!(g.position_of(a), Some(GridCoord::new(1, 1)));
    }

    #[test]
    fn move_updates_both_cells() {
        let mut g = Grid::new(4, 4);
        let a = Occupant::Scout(3);
        g.place(a, GridCoord::new(0, 0)).unwrap();
        let from = g.move_to(a, GridCoord::new(1, 1)).unwrap();
        assert_eq!(from, GridCoord::new(0, 0));
        assert!(g.occupants_at(GridCoord::new(0, 0)).is_empty());
        assert_eq!(g.occupants_at(GridCoord::new(1, 1)), &[a]);
    }

    #[test]
    fn moving_unplaced_occupant_fails() {
        let mut g = Grid::new(2, 2);
        let err = g.move_to(Occupant::Scout(9), GridCoord::new(1, 1)).unwrap_err();
        assert_eq!(err, GridError::NotPlaced(Occupant::Scout(9)));
    }

    #[test]
    fn cells_hold_many_occupants() {
        let mut g = Grid::new(2, 2);
        let c = GridCoord::new(1, 0);
        g.place(Occupant::Tree, c).unwrap();
        g.place(Occupant::Cluster(0), c).unwrap();
        g.place(Occupant::Picker(4), c).unwrap();
        assert_eq!(g.occupants_at(c).len(), 3);
        assert!(g.occupants_at(GridCoord::new(9, 9)).is_empty());
    }

    #[test]
    fn neighbors_are_clipped_at_edges() {
        let g = Grid::new(5, 5);
        assert_eq!(g.neighbors(GridCoord::new(0, 0)).len(), 3);
        assert_eq!(g.neighbors(GridCoord::new(2, 0)).len(), 5);
        let inner = g.neighbors(GridCoord::new(2, 2));
        assert_eq!(inner.len(), 8);
        assert!(!inner.contains(&GridCoord::new(2, 2)));
        assert_eq!(inner, g.neighbors(GridCoord::new(2, 2)));
    }

    #[test]
    fn field_harvests_one_ripe_cluster_per_call() {
        let mut g = Grid::new(3, 3);
        let c = GridCoord::new(1, 1);
        let mut clusters = vec![ResourceCluster::new(0, c, 10), ResourceCluster::new(1, c, 10)];
        g.place(Occupant::Cluster(0), c).unwrap();
        g.place(Occupant::Cluster(1), c).unwrap();
        let mut field = Field { grid: &mut g, clusters: &mut clusters };
        assert_eq!(field.harvest_at(c), Some(0));
        assert_eq!(field.ripe_cluster_at(c), Some(1));
        assert!(clusters[0].picked);
        assert!(clusters[1].ripe);
    }
}
