use crate::config::PolicyMode;
use crate::coordinator::AssignmentOutcome;
use crate::coords::GridCoord;
use crate::harvest::HarvestTally;
use crate::picker::PickerState;
use crate::scout::ScoutState;
use crate::snapshot::WorldSnapshot;

pub const SCOUT_PANEL_HEADING: &str = "Scouts";
pub const PICKER_PANEL_HEADING: &str = "Pickers";
pub const ASSIGNMENT_PANEL_HEADING: &str = "Assignments";

/// Labels for the viewer's top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudControls {
	pub pause_label: String,
	pub step_label: &'static str,
	pub reset_label: &'static str,
	pub speed_readout: String,
}

pub fn hud_controls(paused: bool, ticks_per_second: f32) -> HudControls {
	HudControls {
		pause_label: if paused { "Resume" } else { "Pause" }.to_string(),
		step_label: "Step",
		reset_label: "Reset",
		speed_readout: format!("{ticks_per_second:.0} ticks/s"),
	}
}

pub fn format_hud(harvest: &HarvestTally, tick: u64, policy: PolicyMode) -> String {
	format!(
		"Picked: {} | Delivered: {} | Tick {} | {}",
		harvest.picked,
		harvest.delivered,
		tick,
		policy.label()
	)
}

fn target_label(target: Option<GridCoord>) -> String {
	target.map(|t| format!("({},{})", t.x, t.y)).unwrap_or_else(|| "None".to_string())
}

pub fn format_side_panel(snap: &WorldSnapshot) -> Vec<String> {
	let mut out = Vec::new();
	out.push(format!("[{SCOUT_PANEL_HEADING}]"));
	for s in &snap.scouts {
		let state = match s.state {
			ScoutState::Exploring => "Exploring",
			ScoutState::Waiting => "Waiting",
			ScoutState::Returning => "Returning",
		};
		out.push(format!("Scout #{} – {} – battery {} – {}", s.id, state, s.battery, target_label(s.target)));
	}
	out.push(format!("[{PICKER_PANEL_HEADING}]"));
	for p in &snap.pickers {
		let state = match p.state {
			PickerState::Idle => "Idle",
			PickerState::Moving => "Moving",
			PickerState::Picking => "Picking",
			PickerState::Returning => "Returning",
		};
		out.push(format!(
			"Picker #{} – {} – battery {} – {}/{} – {}",
			p.id,
			state,
			p.battery,
			p.storage,
			p.storage_capacity,
			target_label(p.target)
		));
	}
	out.push(format!("[{ASSIGNMENT_PANEL_HEADING}]"));
	out.push(format!("Delivered: {} | Dropped: {}", snap.assignments_delivered, snap.assignments_dropped));
	for (d, outcome) in &snap.assignment_log {
		let result = match outcome {
			AssignmentOutcome::Delivered(id) => format!("Picker #{id}"),
			AssignmentOutcome::AlreadyAssigned(id) => format!("already with Picker #{id}"),
			AssignmentOutcome::Dropped => "Dropped".to_string(),
		};
		out.push(format!("{} – {}", d.description(), result));
	}
	out.push(format!("Ripe clusters: {}/{}", snap.ripe_clusters(), snap.clusters.len()));
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::world::World;

	#[test]
	fn hud_format() {
		let h = HarvestTally { picked: 3, delivered: 2 };
		let s = format_hud(&h, 17, PolicyMode::Systematic);
		assert!(s.contains("Picked: 3"));
		assert!(s.contains("Delivered: 2"));
		assert!(s.contains("Tick 17"));
		assert!(s.contains(PolicyMode::Systematic.label()));
	}

	#[test]
	fn controls_follow_pause_state() {
		let c = hud_controls(true, 4.0);
		assert_eq!(c.pause_label, "Resume");
		assert_eq!(c.speed_readout, "4 ticks/s");
		assert_eq!(hud_controls(false, 4.0).pause_label, "Pause");
	}

	#[test]
	fn side_panel_lists_agents_and_assignments() {
		let cfg = crate::config::SimConfig::with_counts(1, 2, 5, PolicyMode::Broadcast).with_seed(9);
		let world = World::new(cfg).unwrap();
		let lines = format_side_panel(&world.snapshot());
		assert_eq!(lines[0], "[Scouts]");
		assert!(lines.iter().any(|l| l.starts_with("Scout #0 – Exploring – battery 100")));
		assert!(lines.iter().any(|l| l.starts_with("Picker #1 – Idle")));
		assert!(lines.iter().any(|l| l.starts_with("Picker #2") && l.contains("0/5")));
		assert!(lines.iter().any(|l| l == "[Assignments]"));
		assert!(lines.iter().any(|l| l == "Delivered: 0 | Dropped: 0"));
	}
}
