use engine::{
    Camera2D, HotspotDefDatabase, InputSnapshot, InteractionRuntime, InteractionSettings,
    Inventory, Notification, NotificationCounts, ObserverScope, PlayerCharacter, SceneCamera,
    Services, Vec2, Vec3, Viewport,
};
use tracing::{debug, info};

use super::demo_services::{DemoInventory, DemoPlayer, LoggingDispatcher};
use super::scenario::{build_scene, Scenario, ScenarioError, ScenarioStep};

#[derive(Debug, Clone, Default)]
pub(crate) struct DemoOutcome {
    pub(crate) steps_run: u32,
    pub(crate) notifications: Vec<Notification>,
    pub(crate) totals: NotificationCounts,
    pub(crate) invocations: Vec<String>,
    pub(crate) final_label: String,
    pub(crate) player_position: Vec3,
}

/// Drives the interaction runtime through every scenario step, advancing
/// the demo player between steps.
pub(crate) fn run_scenario(
    settings: InteractionSettings,
    defs: &HotspotDefDatabase,
    scenario: &Scenario,
) -> Result<DemoOutcome, ScenarioError> {
    let mut scene = build_scene(scenario, defs)?;
    let mut player = DemoPlayer::new(scenario.player_start, scenario.player_speed);
    let mut inventory = DemoInventory::new(
        scenario
            .items
            .iter()
            .map(|item| (item.id, item.label.clone())),
    );
    let mut dispatcher = LoggingDispatcher::default();
    let mut runtime = InteractionRuntime::new(settings);

    let viewport = Viewport::default();
    let camera = match scene.world.camera() {
        SceneCamera::Orthographic(camera) => *camera,
        SceneCamera::Perspective(_) => Camera2D::default(),
    };

    let mut outcome = DemoOutcome::default();
    {
        let mut services = Services {
            player: &mut player,
            pathfinder: Some(&scene.pathfinder),
            inventory: &mut inventory,
            dispatcher: &mut dispatcher,
        };
        runtime.on_scene_initialised(&mut scene.world, &mut services);
    }
    // on_scene_initialised releases scene-scoped observers.
    runtime.subscribe(ObserverScope::Scene, |notification| {
        info!(?notification, "notification");
    });
    info!(
        scenario = scenario.name.as_str(),
        hotspots = scene.hotspots.len(),
        steps = scenario.steps.len(),
        "scenario_started"
    );

    for step in &scenario.steps {
        if step.clear_item {
            inventory.set_null();
        }
        if let Some(item) = step.select_item {
            if !inventory.select(item) {
                debug!(item = item.0, "scenario_item_not_carried");
            }
        }
        if let Some(placement) = step.open_menu {
            match scene.hotspots.get(placement) {
                Some(&hotspot) => {
                    runtime.open_interaction_menu(&scene.world, &inventory, hotspot);
                }
                None => debug!(placement, "scenario_menu_hotspot_unknown"),
            }
        }
        if let Some(slot) = step.menu_slot {
            if !runtime.choose_menu_interaction(&scene.world, slot) {
                debug!(slot, "menu_choice_ignored");
            }
        }

        let pointer_px = step
            .pointer_world
            .map(|world| camera.world_to_screen(viewport, world));
        for repetition in 0..=step.hold {
            let input = step_input(step, pointer_px, viewport, repetition == 0);
            let mut services = Services {
                player: &mut player,
                pathfinder: Some(&scene.pathfinder),
                inventory: &mut inventory,
                dispatcher: &mut dispatcher,
            };
            if repetition == 0 {
                if let Some(state) = step.game_state {
                    runtime.set_game_state(state, &mut services);
                }
            }
            let report = runtime.step(&mut scene.world, &input, &mut services);
            debug!(
                step = outcome.steps_run,
                active = ?report.active_hotspot,
                action = ?report.action,
                session = ?report.session_state,
                label = report.label.as_str(),
                "step_completed"
            );
            accumulate(&mut outcome.totals, runtime.last_step_counts());
            outcome.notifications.extend(report.notifications);
            outcome.final_label = report.label;
            outcome.steps_run = outcome.steps_run.saturating_add(1);
            player.tick();
        }
    }

    outcome.invocations = dispatcher.invocations().to_vec();
    outcome.player_position = player.position();
    info!(
        steps = outcome.steps_run,
        notifications = outcome.totals.total,
        interactions_fired = outcome.totals.interaction_fired,
        handlers_invoked = outcome.invocations.len(),
        facing_x = player.facing().x,
        facing_y = player.facing().y,
        looking_at_target = player.head_target().is_some(),
        "scenario_finished"
    );
    Ok(outcome)
}

fn step_input(
    step: &ScenarioStep,
    pointer_px: Option<Vec2>,
    viewport: Viewport,
    first: bool,
) -> InputSnapshot {
    let snapshot = InputSnapshot::empty()
        .with_viewport(viewport)
        .with_pointer_px(pointer_px);
    if first {
        snapshot.with_event(step.event).with_cycle(step.cycle)
    } else {
        snapshot
    }
}

fn accumulate(totals: &mut NotificationCounts, step: NotificationCounts) {
    totals.total = totals.total.saturating_add(step.total);
    totals.hotspot_selected = totals.hotspot_selected.saturating_add(step.hotspot_selected);
    totals.hotspot_deselected = totals
        .hotspot_deselected
        .saturating_add(step.hotspot_deselected);
    totals.interaction_fired = totals.interaction_fired.saturating_add(step.interaction_fired);
    totals.double_click_fired = totals
        .double_click_fired
        .saturating_add(step.double_click_fired);
    totals.reached_target = totals.reached_target.saturating_add(step.reached_target);
    totals.movement_cancelled = totals
        .movement_cancelled
        .saturating_add(step.movement_cancelled);
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use engine::{
        parse_hotspot_defs, InteractionMethod, InteractionRef, SeeInteractions, SelectInteractions,
    };

    use super::super::scenario::parse_scenario;
    use super::*;

    fn defs(raw: &str) -> HotspotDefDatabase {
        let defs = parse_hotspot_defs(Path::new("test.xml"), raw).expect("defs");
        HotspotDefDatabase::from_hotspot_defs(defs)
    }

    const LAMP: &str = r#"<Defs>
        <HotspotDef>
            <defName>lamp</defName>
            <label>Lamp</label>
            <collider>Circle 0.5</collider>
            <use><callback>light_lamp</callback></use>
        </HotspotDef>
        <HotspotDef>
            <defName>door</defName>
            <label>Door</label>
            <collider>Rect 0.5 1.0</collider>
            <use><script>open_door</script><playerAction>WalkTo</playerAction></use>
            <inventory><item>7</item><script>unlock_door</script><itemParameter>0</itemParameter></inventory>
        </HotspotDef>
    </Defs>"#;

    fn scenario(steps: &str) -> Scenario {
        let raw = format!(
            r#"{{
                "name": "test",
                "tilemap": {{ "origin": {{ "x": -5.0, "y": -5.0 }}, "rows": [
                    "0 0 0 0 0 0 0 0 0 0", "0 0 0 0 0 0 0 0 0 0", "0 0 0 0 0 0 0 0 0 0",
                    "0 0 0 0 0 0 0 0 0 0", "0 0 0 0 0 0 0 0 0 0", "0 0 0 0 0 0 0 0 0 0",
                    "0 0 0 0 0 0 0 0 0 0", "0 0 0 0 0 0 0 0 0 0", "0 0 0 0 0 0 0 0 0 0",
                    "0 0 0 0 0 0 0 0 0 0"
                ] }},
                "player_speed": 0.5,
                "items": [ {{ "id": 7, "label": "Key" }} ],
                "hotspots": [
                    {{ "def": "lamp", "position": {{ "x": -2.0, "y": 0.0, "z": 0.0 }} }},
                    {{ "def": "door", "position": {{ "x": 2.0, "y": 0.0, "z": 0.0 }} }}
                ],
                "steps": {steps}
            }}"#
        );
        parse_scenario(Path::new("test.json"), &raw).expect("scenario")
    }

    #[test]
    fn clicking_in_place_hotspot_invokes_handler_same_step() {
        let outcome = run_scenario(
            InteractionSettings::default(),
            &defs(LAMP),
            &scenario(r#"[ { "pointer_world": { "x": -2.0, "y": 0.0 }, "event": "SingleClick" } ]"#),
        )
        .expect("run");
        assert_eq!(outcome.steps_run, 1);
        assert_eq!(outcome.invocations, vec!["light_lamp".to_string()]);
        assert_eq!(outcome.totals.interaction_fired, 1);
        assert_eq!(outcome.final_label, "Lamp");
    }

    #[test]
    fn walking_interaction_dispatches_after_arrival() {
        let outcome = run_scenario(
            InteractionSettings::default(),
            &defs(LAMP),
            &scenario(
                r#"[ { "pointer_world": { "x": 2.0, "y": 0.0 }, "event": "SingleClick", "hold": 5 } ]"#,
            ),
        )
        .expect("run");
        assert_eq!(outcome.steps_run, 6);
        assert_eq!(outcome.invocations, vec!["open_door".to_string()]);
        assert!(outcome
            .notifications
            .iter()
            .any(|notification| matches!(notification, Notification::ReachedTarget { .. })));
        assert_eq!(outcome.player_position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn held_item_runs_combine_interaction() {
        let outcome = run_scenario(
            InteractionSettings::default(),
            &defs(LAMP),
            &scenario(
                r#"[ { "select_item": 7, "pointer_world": { "x": 2.0, "y": 0.0 }, "event": "SingleClick" } ]"#,
            ),
        )
        .expect("run");
        assert!(outcome.notifications.iter().any(|notification| matches!(
            notification,
            Notification::InteractionFired {
                interaction: InteractionRef::Inventory(0),
                ..
            }
        )));
        assert_eq!(outcome.invocations, vec!["unlock_door".to_string()]);
        assert_eq!(outcome.final_label, "Use Key on Door");
    }

    #[test]
    fn script_opened_menu_dispatches_chosen_slot() {
        let settings = InteractionSettings {
            interaction_method: InteractionMethod::ChooseHotspotThenInteraction,
            see_interactions: SeeInteractions::ViaScriptOnly,
            select_interactions: SelectInteractions::ClickingMenu,
            ..InteractionSettings::default()
        };
        let outcome = run_scenario(
            settings,
            &defs(LAMP),
            &scenario(
                r#"[
                    { "pointer_world": { "x": -2.0, "y": 0.0 }, "event": "SingleClick" },
                    { "pointer_world": { "x": -2.0, "y": 0.0 }, "event": "SingleClick" },
                    { "menu_slot": 0 },
                    { "open_menu": 0 },
                    { "menu_slot": 0 }
                ]"#,
            ),
        )
        .expect("run");
        assert_eq!(outcome.steps_run, 5);
        assert_eq!(outcome.invocations, vec!["light_lamp".to_string()]);
    }

    #[test]
    fn cutscene_suppresses_clicks() {
        let outcome = run_scenario(
            InteractionSettings::default(),
            &defs(LAMP),
            &scenario(
                r#"[ { "game_state": "Cutscene", "pointer_world": { "x": -2.0, "y": 0.0 }, "event": "SingleClick" } ]"#,
            ),
        )
        .expect("run");
        assert!(outcome.invocations.is_empty());
        assert_eq!(outcome.final_label, "");
    }

    #[test]
    fn shipped_demo_assets_run_to_completion() {
        let assets = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("assets");
        let settings = engine::load_settings(&assets.join("settings.json")).expect("settings");
        let defs = engine::compile_hotspot_defs(&assets.join("hotspots")).expect("defs");
        let scenario = super::super::scenario::load_scenario(
            &assets.join("scenarios").join("demo.json"),
        )
        .expect("scenario");

        let outcome = run_scenario(settings, &defs, &scenario).expect("run");
        let expected_steps: u32 = scenario.steps.iter().map(|step| step.hold + 1).sum();
        assert_eq!(outcome.steps_run, expected_steps);
        assert!(outcome.invocations.contains(&"lamp_describe".to_string()));
        assert!(outcome.invocations.contains(&"desk_open_drawer".to_string()));
    }
}
