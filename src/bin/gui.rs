use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use harvestforge::config::SimConfig;
use harvestforge::hud::{ASSIGNMENT_PANEL_HEADING, PICKER_PANEL_HEADING, SCOUT_PANEL_HEADING};
use harvestforge::world::World as FarmWorld;
use harvestforge::{GridCoord, Occupant, PolicyMode, format_hud, format_side_panel, hud_controls};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ---------- Constants ----------
const CELL_SIZE: f32 = 28.0;
const TICKS_PER_SECOND: f32 = 4.0;
const RNG_SEED: u64 = 42;
const MAX_AGENTS: u32 = 20;

// ---------- Components ----------
#[derive(Component)]
struct CellPos {
	x: i32,
	y: i32,
}

#[derive(Component)]
struct CellsLayer; // Marker to despawn/rebuild on reset

// ---------- Resources ----------
#[derive(Resource)]
struct UiState {
	paused: bool,
	step_requested: bool,
	reset_requested: bool,
	request_rebuild_cells: bool,
	tick_accumulator: f32,
	settings: SimConfig,
	toast: Option<(String, f32)>, // (message, remaining_seconds)
}

impl UiState {
	fn new(settings: SimConfig) -> Self {
		Self {
			paused: true,
			step_requested: false,
			reset_requested: false,
			request_rebuild_cells: true,
			tick_accumulator: 0.0,
			settings,
			toast: None,
		}
	}
}

#[derive(Resource)]
struct Simulation {
	world: FarmWorld,
}

// ---------- Entry ----------
fn main() {
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let settings = SimConfig::default().with_seed(RNG_SEED);
	let world = match FarmWorld::new(settings.clone()) {
		Ok(w) => w,
		Err(e) => {
			eprintln!("failed to build world: {e}");
			std::process::exit(1);
		}
	};

	App::new()
		.add_plugins(DefaultPlugins.set(WindowPlugin {
			primary_window: Some(Window {
				title: "Harvestforge".to_string(),
				resolution: (1280, 800).into(),
				..Default::default()
			}),
			..Default::default()
		}))
		.add_plugins(EguiPlugin::default())
		.insert_resource(UiState::new(settings))
		.insert_resource(Simulation { world })
		.add_systems(Startup, setup_camera)
		.add_systems(
			Update,
			(
				handle_pan_zoom,
				reset_when_requested,
				build_cells_when_needed,
				update_cell_colors_from_world,
				tick_world_when_running,
				update_toast_timer,
			)
				.chain(),
		)
		.add_systems(EguiPrimaryContextPass, draw_ui)
		.run();
}

// ---------- Setup ----------
fn setup_camera(mut commands: Commands, sim: Res<Simulation>) {
	let grid = sim.world.grid();
	let center_x = grid.width() as f32 * CELL_SIZE * 0.5;
	let center_y = grid.height() as f32 * CELL_SIZE * 0.5;
	commands.spawn((Camera2d, Transform::from_xyz(center_x, center_y, 1000.0)));
}

// ---------- Utilities ----------
/// Color of the most interesting occupant in a cell.
fn cell_color(world: &FarmWorld, occupants: &[Occupant]) -> Color {
	let ripe = |id: u32| world.clusters().get(id as usize).is_some_and(|c| c.ripe);
	if occupants.iter().any(|o| matches!(o, Occupant::Scout(_))) {
		return Color::srgb(0.25, 0.55, 1.0);
	}
	if occupants.iter().any(|o| matches!(o, Occupant::Picker(_))) {
		return Color::srgb(0.95, 0.6, 0.1);
	}
	for o in occupants {
		if let Occupant::Cluster(id) = o {
			return if ripe(*id) { Color::srgb(0.85, 0.1, 0.2) } else { Color::srgb(0.45, 0.3, 0.3) };
		}
	}
	if occupants.contains(&Occupant::Tree) {
		return Color::srgb(0.1, 0.45, 0.15);
	}
	if occupants.contains(&Occupant::ChargingStation) {
		return Color::srgb(0.9, 0.9, 0.2);
	}
	if occupants.contains(&Occupant::River) {
		return Color::srgb(0.15, 0.3, 0.6);
	}
	Color::srgb(0.35, 0.27, 0.18)
}

fn set_toast(ui: &mut UiState, msg: impl Into<String>) {
	ui.toast = Some((msg.into(), 2.0));
}

// ---------- Systems: Map Rendering ----------
fn build_cells_when_needed(
	mut commands: Commands,
	mut ui: ResMut<UiState>,
	sim: Res<Simulation>,
	existing_layers: Query<Entity, With<CellsLayer>>,
) {
	if !ui.request_rebuild_cells {
		return;
	}
	for e in &existing_layers {
		commands.entity(e).despawn();
	}
	for (pos, occupants) in sim.world.grid().iter_cells() {
		let color = cell_color(&sim.world, occupants);
		let translation = Vec3::new(
			pos.x as f32 * CELL_SIZE + CELL_SIZE * 0.5,
			pos.y as f32 * CELL_SIZE + CELL_SIZE * 0.5,
			0.0,
		);
		commands.spawn((
			Sprite::from_color(color, Vec2::new(CELL_SIZE - 1.0, CELL_SIZE - 1.0)),
			Transform::from_translation(translation),
			Visibility::Visible,
			ViewVisibility::HIDDEN,
			CellPos { x: pos.x, y: pos.y },
			CellsLayer,
		));
	}
	ui.request_rebuild_cells = false;
}

fn update_cell_colors_from_world(sim: Res<Simulation>, mut q: Query<(&CellPos, &mut Sprite)>) {
	if !sim.is_changed() {
		return;
	}
	for (pos, mut sprite) in &mut q {
		let occupants = sim.world.grid().occupants_at(GridCoord::new(pos.x, pos.y));
		sprite.color = cell_color(&sim.world, occupants);
	}
}

// ---------- Systems: Camera Pan/Zoom ----------
fn handle_pan_zoom(
	mut ev_motion: EventReader<bevy::input::mouse::MouseMotion>,
	mut ev_wheel: EventReader<bevy::input::mouse::MouseWheel>,
	mouse_buttons: Res<ButtonInput<MouseButton>>,
	mut q_cam: Query<(&mut Projection, &mut Transform), With<Camera>>,
) {
	let Ok((mut proj, mut cam_transform)) = q_cam.single_mut() else { return };

	if mouse_buttons.pressed(MouseButton::Middle) {
		let mut delta = Vec2::ZERO;
		for m in ev_motion.read() {
			delta += m.delta;
		}
		cam_transform.translation.x -= delta.x;
		cam_transform.translation.y += delta.y;
	}

	for w in ev_wheel.read() {
		let factor = 1.0 - w.y * 0.1;
		if let Projection::Orthographic(ortho) = &mut *proj {
			ortho.scale = (ortho.scale * factor).clamp(0.2, 10.0);
		}
	}
}

// ---------- Systems: Simulation ----------
fn tick_world_when_running(time: Res<Time>, mut sim: ResMut<Simulation>, mut ui: ResMut<UiState>) {
	let mut due = std::mem::take(&mut ui.step_requested) as u32;
	if !ui.paused {
		ui.tick_accumulator += time.delta_secs();
		let interval = 1.0 / TICKS_PER_SECOND;
		while ui.tick_accumulator >= interval {
			ui.tick_accumulator -= interval;
			due += 1;
		}
	}
	for _ in 0..due {
		if let Err(e) = sim.world.advance_tick() {
			warn!(error = %e, "tick failed, pausing");
			ui.paused = true;
			set_toast(&mut ui, format!("Tick failed: {e}"));
			break;
		}
	}
}

fn reset_when_requested(mut sim: ResMut<Simulation>, mut ui: ResMut<UiState>) {
	if !std::mem::take(&mut ui.reset_requested) {
		return;
	}
	match FarmWorld::new(ui.settings.clone()) {
		Ok(world) => {
			sim.world = world;
			ui.request_rebuild_cells = true;
			ui.tick_accumulator = 0.0;
			let msg = format!("Reset with {} policy", ui.settings.policy);
			set_toast(&mut ui, msg);
		}
		Err(e) => set_toast(&mut ui, format!("Reset failed: {e}")),
	}
}

// ---------- Systems: Toast ----------
fn update_toast_timer(time: Res<Time>, mut ui: ResMut<UiState>) {
	if let Some((_, ref mut remaining)) = ui.toast {
		*remaining -= time.delta_secs();
		if *remaining <= 0.0 {
			ui.toast = None;
		}
	}
}

// ---------- Systems: UI ----------
fn count_row(ui_row: &mut egui::Ui, label: &str, value: &mut u32) -> bool {
	let mut changed = false;
	ui_row.label(format!("{label}: {value}"));
	if ui_row.button("-").clicked() && *value > 1 {
		*value -= 1;
		changed = true;
	}
	if ui_row.button("+").clicked() && *value < MAX_AGENTS {
		*value += 1;
		changed = true;
	}
	changed
}

fn draw_ui(mut egui_ctx: EguiContexts, mut ui: ResMut<UiState>, sim: Res<Simulation>) {
	let Ok(ctx) = egui_ctx.ctx_mut() else { return };
	let snap = sim.world.snapshot();

	// Top HUD
	egui::TopBottomPanel::top("top_hud").show(&*ctx, |ui_top| {
		ui_top.horizontal(|ui_row| {
			let controls = hud_controls(ui.paused, TICKS_PER_SECOND);
			ui_row.label(format_hud(&snap.harvest, snap.tick, snap.policy));
			ui_row.separator();
			if ui_row.button(&controls.pause_label).clicked() {
				ui.paused = !ui.paused;
			}
			if ui_row.button(controls.step_label).clicked() {
				ui.step_requested = true;
			}
			if ui_row.button(controls.reset_label).clicked() {
				ui.reset_requested = true;
			}
			ui_row.label(&controls.speed_readout);
			if let Some((ref msg, _)) = ui.toast {
				ui_row.separator();
				ui_row.colored_label(egui::Color32::YELLOW, msg);
			}
		});
		ui_top.horizontal(|ui_row| {
			for mode in PolicyMode::ALL {
				let selected = ui.settings.policy == mode;
				if ui_row.selectable_label(selected, mode.label()).clicked() && !selected {
					ui.settings.policy = mode;
					ui.reset_requested = true;
				}
			}
			ui_row.separator();
			let settings = &mut ui.settings;
			let mut changed = count_row(ui_row, "Scouts", &mut settings.num_scouts);
			changed |= count_row(ui_row, "Pickers", &mut settings.num_pickers);
			changed |= count_row(ui_row, "Clusters", &mut settings.num_resource_cells);
			if changed {
				ui.reset_requested = true;
			}
		});
	});

	// Right panel (Scouts / Pickers / Assignments)
	egui::SidePanel::right("right_panel")
		.resizable(true)
		.default_width(300.0)
		.show(&*ctx, |ui_right| {
			let lines = format_side_panel(&snap);
			let section = |heading: &str| format!("[{heading}]");
			egui::ScrollArea::vertical().show(ui_right, |ui_scroll| {
				for line in &lines {
					if *line == section(SCOUT_PANEL_HEADING)
						|| *line == section(PICKER_PANEL_HEADING)
						|| *line == section(ASSIGNMENT_PANEL_HEADING)
					{
						ui_scroll.separator();
						ui_scroll.heading(line.trim_matches(['[', ']']));
					} else {
						ui_scroll.label(line);
					}
				}
			});
		});
}
