use serde::{Deserialize, Serialize};

pub type AgentId = u32;
pub type ClusterId = u32;

/// Anything that can sit in a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
	Scout(AgentId),
	Picker(AgentId),
	Cluster(ClusterId),
	Tree,
	River,
	ChargingStation,
}

impl Occupant {
	/// Occupants the grid tracks individually so they can be moved.
	pub fn is_tracked(self) -> bool {
		matches!(self, Occupant::Scout(_) | Occupant::Picker(_) | Occupant::Cluster(_))
	}

	pub fn is_agent(self) -> bool {
		matches!(self, Occupant::Scout(_) | Occupant::Picker(_))
	}

	pub fn label(self) -> &'static str {
		match self {
			Occupant::Scout(_) => "scout",
			Occupant::Picker(_) => "picker",
			Occupant::Cluster(_) => "cluster",
			Occupant::Tree => "tree",
			Occupant::River => "river",
			Occupant::ChargingStation => "charging_station",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tracked_flags() {
		assert!(Occupant::Scout(1).is_tracked());
		assert!(Occupant::Picker(2).is_tracked());
		assert!(Occupant::Cluster(3).is_tracked());
		assert!(!Occupant::Tree.is_tracked());
		assert!(!Occupant::River.is_tracked());
		assert!(!Occupant::ChargingStation.is_tracked());
	}

	#[test]
	fn only_robots_are_agents() {
		assert!(Occupant::Scout(0).is_agent());
		assert!(!Occupant::Cluster(0).is_agent());
		assert_eq!(Occupant::ChargingStation.label(), "charging_station");
	}
}
