use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::coords::GridCoord;
use crate::grid::{Grid, GridError};
use crate::occupant::Occupant;

/// Integer charge shared by scouts and pickers. Never drops below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battery {
	pub level: u32,
	pub capacity: u32,
}

impl Battery {
	pub fn full(capacity: u32) -> Self {
		Self { level: capacity, capacity }
	}

	pub fn drain(&mut self, amount: u32) {
		self.level = self.level.saturating_sub(amount);
	}

	pub fn recharge(&mut self) {
		self.level = self.capacity;
	}

	pub fn is_empty(&self) -> bool {
		self.level == 0
	}
}

/// Uniformly random in-bounds Moore neighbor, if any.
pub(crate) fn random_neighbor<R: Rng + ?Sized>(grid: &Grid, pos: GridCoord, rng: &mut R) -> Option<GridCoord> {
	grid.neighbors(pos).choose(rng).copied()
}

/// Moves `who` on the grid and mirrors the new cell into `pos`.
pub(crate) fn relocate(grid: &mut Grid, who: Occupant, pos: &mut GridCoord, to: GridCoord) -> Result<(), GridError> {
	if *pos != to {
		grid.move_to(who, to)?;
		*pos = to;
	}
	Ok(())
}
