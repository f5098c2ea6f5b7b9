use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::detection::{HotspotDetector, ValidationContext};
use crate::events::{Notification, NotificationCounts, ObserverId, ObserverRegistry, ObserverScope};
use crate::hotspot::{
    DoubleClickPolicy, HotspotId, HotspotWorld, IconId, InteractionRef, ItemId,
};
use crate::indexer::CursorScope;
use crate::input::{CycleDirection, InputEvent, InputSnapshot};
use crate::label::{compose_label, LabelInput};
use crate::requests::{InteractionRequest, RequestQueue};
use crate::resolver::{
    build_resolver, resolve_held_item, ClickAction, ClickResolver, ResolveContext, SelectionState,
};
use crate::session::{DispatchSession, SessionEnv, SessionState, SessionStatus};
use crate::services::{Inventory, Services};
use crate::settings::InteractionSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum GameState {
    #[default]
    Normal,
    Cutscene,
    DialogOptions,
    Paused,
}

impl GameState {
    /// States that force any in-flight session to stop.
    pub fn disallows_gameplay(self) -> bool {
        matches!(self, Self::Cutscene | Self::Paused)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub active_hotspot: Option<HotspotId>,
    pub action: ClickAction,
    pub session_state: Option<SessionState>,
    pub notifications: Vec<Notification>,
    pub label: String,
}

/// Owns every piece of interaction state and advances it once per step.
pub struct InteractionRuntime {
    settings: InteractionSettings,
    resolver: Box<dyn ClickResolver>,
    detector: HotspotDetector,
    selection: SelectionState,
    active_hotspot: Option<HotspotId>,
    session: Option<DispatchSession>,
    observers: ObserverRegistry,
    requests: RequestQueue,
    game_state: GameState,
    language: usize,
    label: String,
}

impl InteractionRuntime {
    pub fn new(settings: InteractionSettings) -> Self {
        let resolver = build_resolver(&settings);
        info!(
            scheme = ?resolver.scheme(),
            detection = ?settings.hotspot_detection,
            "interaction_runtime_ready"
        );
        Self {
            settings,
            resolver,
            detector: HotspotDetector::default(),
            selection: SelectionState::default(),
            active_hotspot: None,
            session: None,
            observers: ObserverRegistry::default(),
            requests: RequestQueue::default(),
            game_state: GameState::Normal,
            language: 0,
            label: String::new(),
        }
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: InteractionSettings) {
        self.resolver = build_resolver(&settings);
        self.settings = settings;
        self.selection.examine_mode = false;
    }

    pub fn subscribe(
        &mut self,
        scope: ObserverScope,
        callback: impl FnMut(&Notification) + 'static,
    ) -> ObserverId {
        self.observers.subscribe(scope, callback)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn last_step_counts(&self) -> NotificationCounts {
        self.observers.last_step_counts()
    }

    pub fn requests_mut(&mut self) -> &mut RequestQueue {
        &mut self.requests
    }

    /// Runs `interaction` (or the click default when `None`) on the next step.
    pub fn request_interaction(&mut self, hotspot: HotspotId, interaction: Option<InteractionRef>) {
        self.requests.run_interaction(hotspot, interaction);
    }

    pub fn stop_moving_to_hotspot(&mut self) {
        self.requests.stop_moving_to_hotspot();
    }

    pub fn active_hotspot(&self) -> Option<HotspotId> {
        self.active_hotspot
    }

    pub fn selected_hotspot(&self) -> Option<HotspotId> {
        self.selection.selected_hotspot
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn session(&self) -> Option<&DispatchSession> {
        self.session.as_ref()
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_language(&mut self, language: usize) {
        self.language = language;
    }

    pub fn set_cursor_icon(&mut self, icon: Option<IconId>) {
        self.selection.cursor_icon = icon;
    }

    pub fn cursor_icon(&self) -> Option<IconId> {
        self.selection.cursor_icon
    }

    pub fn set_scripted_hotspot(&mut self, hotspot: Option<HotspotId>) {
        self.detector.set_scripted_hotspot(hotspot);
    }

    pub fn cycle_vicinity(&mut self, direction: CycleDirection) -> Option<HotspotId> {
        self.detector.cycle_vicinity(direction)
    }

    pub fn set_game_state(&mut self, state: GameState, services: &mut Services<'_>) {
        if self.game_state == state {
            return;
        }
        info!(from = ?self.game_state, to = ?state, "game_state_changed");
        self.game_state = state;
        if state.disallows_gameplay() {
            self.cancel_session(services);
        }
    }

    /// Opens `hotspot`'s interaction menu regardless of how `see_interactions`
    /// reveals menus; the only way in under `ViaScriptOnly`.
    pub fn open_interaction_menu(
        &mut self,
        world: &HotspotWorld,
        inventory: &dyn Inventory,
        hotspot: HotspotId,
    ) -> bool {
        let Some(target) = world.find(hotspot) else {
            debug!(hotspot = hotspot.0, "menu_hotspot_missing");
            return false;
        };
        self.select_hotspot(world, hotspot, inventory);
        let scope = self.cursor_scope(inventory);
        self.selection.interaction.sync(target, scope);
        self.selection.menu_open_for = Some(hotspot);
        true
    }

    /// Fires the interaction at `slot` of the open menu's indexer on the next step.
    pub fn choose_menu_interaction(&mut self, world: &HotspotWorld, slot: usize) -> bool {
        let Some(hotspot) = self.selection.menu_open_for.and_then(|id| world.find(id)) else {
            return false;
        };
        let Some(interaction) = self.selection.interaction.slot(hotspot, slot) else {
            debug!(hotspot = hotspot.id().0, slot, "menu_slot_out_of_range");
            return false;
        };
        self.requests
            .run_interaction(hotspot.id(), Some(interaction));
        true
    }

    /// Drops scene-bound state: the in-flight session, selection, highlights
    /// and scene-scoped observers.
    pub fn on_scene_initialised(&mut self, world: &mut HotspotWorld, services: &mut Services<'_>) {
        self.cancel_session(services);
        self.deselect_hotspot();
        self.active_hotspot = None;
        self.selection.interaction.clear();
        self.detector.reset();
        self.resolver.reset();
        self.requests.drain_current_step();
        world.apply_highlights(&[]);
        self.observers.flush();
        let released = self.observers.release_scope(ObserverScope::Scene);
        info!(released_observers = released, "scene_initialised");
    }

    pub fn step(
        &mut self,
        world: &mut HotspotWorld,
        input: &InputSnapshot,
        services: &mut Services<'_>,
    ) -> StepReport {
        self.apply_requests(world, services);
        self.drop_stale_references(world, &*services.inventory);

        let gameplay_blocked = self.game_state != GameState::Normal
            || self.session.as_ref().is_some_and(DispatchSession::is_blocking);
        let held_item = services.inventory.selected_item();

        let mut action = ClickAction::None;
        if gameplay_blocked {
            self.active_hotspot = None;
            world.apply_highlights(&[]);
        } else {
            let context = ValidationContext {
                settings: &self.settings,
                player_position: services.player.position(),
                held_item,
            };
            let detection = self.detector.detect(world, input, &context);
            world.apply_highlights(&detection.highlighted);
            self.active_hotspot = detection.active;

            if self.resolver.hover_selects() && self.selection.selected_hotspot != detection.active {
                match detection.active {
                    Some(hotspot) => self.select_hotspot(world, hotspot, &*services.inventory),
                    None => self.deselect_hotspot(),
                }
            }

            // A double-click on the hotspot the session is heading for belongs
            // to the session under every scheme.
            let event = input.effective_event();
            let consumed = match detection.active {
                Some(hotspot) if event == InputEvent::DoubleClick => {
                    self.apply_double_click(world, hotspot, services)
                }
                _ => false,
            };
            if !consumed {
                let resolve_context = ResolveContext {
                    settings: &self.settings,
                    world,
                    hotspot: detection.active.and_then(|id| world.find(id)),
                    inventory: &*services.inventory,
                    held_item,
                    event,
                    cycle: input.cycle(),
                };
                action = self.resolver.resolve(&resolve_context, &mut self.selection);
                if action != ClickAction::None {
                    debug!(action = ?action, "click_resolved");
                }
                self.apply_action(world, action, services);
            }
        }

        self.step_session(world, services);
        self.label = self.current_label(world, services, held_item);

        StepReport {
            active_hotspot: self.active_hotspot,
            action,
            session_state: self.session.as_ref().map(DispatchSession::state),
            notifications: self.observers.flush(),
            label: self.label.clone(),
        }
    }

    fn apply_requests(&mut self, world: &HotspotWorld, services: &mut Services<'_>) {
        for request in self.requests.drain_current_step() {
            match request {
                InteractionRequest::StopMovingToHotspot => self.cancel_session(services),
                InteractionRequest::Run {
                    hotspot,
                    interaction,
                } => {
                    let Some(target) = world.find(hotspot) else {
                        warn!(hotspot = hotspot.0, "requested_hotspot_missing");
                        continue;
                    };
                    let item = services.inventory.selected_item();
                    let resolved = match interaction {
                        Some(interaction @ InteractionRef::Inventory(_)) => target
                            .button(interaction)
                            .is_some()
                            .then(|| (interaction, target.interaction_item(interaction))),
                        Some(interaction) => target
                            .button(interaction)
                            .is_some()
                            .then_some((interaction, item)),
                        None => default_interaction(&self.settings, target, item),
                    };
                    match resolved {
                        Some((interaction, item)) => {
                            self.start_session(hotspot, interaction, item, services)
                        }
                        None => debug!(hotspot = hotspot.0, "requested_interaction_unavailable"),
                    }
                }
            }
        }
    }

    fn drop_stale_references(&mut self, world: &HotspotWorld, inventory: &dyn Inventory) {
        if let Some(selected) = self.selection.selected_hotspot {
            match world.find(selected) {
                Some(hotspot) => {
                    if self.selection.interaction.hotspot() == Some(selected) {
                        let scope = self.cursor_scope(inventory);
                        self.selection.interaction.sync(hotspot, scope);
                    }
                }
                None => {
                    debug!(hotspot = selected.0, "selected_hotspot_removed");
                    self.deselect_hotspot();
                }
            }
        }
        if self
            .selection
            .menu_open_for
            .is_some_and(|id| !world.contains(id))
        {
            self.selection.menu_open_for = None;
        }
        if self.active_hotspot.is_some_and(|id| !world.contains(id)) {
            self.active_hotspot = None;
        }
    }

    fn apply_action(
        &mut self,
        world: &HotspotWorld,
        action: ClickAction,
        services: &mut Services<'_>,
    ) {
        match action {
            ClickAction::None | ClickAction::CycleInteraction(_) => {}
            ClickAction::SelectHotspot(hotspot) => {
                self.select_hotspot(world, hotspot, &*services.inventory)
            }
            ClickAction::DeselectHotspot => self.deselect_hotspot(),
            ClickAction::OpenInteractionMenu(hotspot) => {
                self.select_hotspot(world, hotspot, &*services.inventory);
                self.selection.menu_open_for = Some(hotspot);
            }
            ClickAction::RunInteraction {
                hotspot,
                interaction,
                item,
            } => self.start_session(hotspot, interaction, item, services),
            ClickAction::WalkOnly(target) => {
                self.cancel_session(services);
                let start = services.player.position();
                let path = services
                    .pathfinder
                    .map(|pathfinder| pathfinder.compute_path(start, target))
                    .filter(|path| !path.is_empty())
                    .unwrap_or_else(|| vec![target]);
                services.player.move_along(&path, false);
            }
            ClickAction::DeselectItem => services.inventory.set_null(),
        }
    }

    /// Double-click on the hotspot an in-flight session is heading for.
    /// Returns true when the click was consumed by that session.
    fn apply_double_click(
        &mut self,
        world: &HotspotWorld,
        hotspot: HotspotId,
        services: &mut Services<'_>,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.hotspot() != hotspot || session.state().is_terminal() {
            return false;
        }
        let policy = world
            .find(hotspot)
            .map_or(DoubleClickPolicy::None, |target| target.double_click);
        match policy {
            DoubleClickPolicy::TriggersInstantly => session.request_skip(),
            DoubleClickPolicy::MakesPlayerRun => session.request_run(services.player),
            DoubleClickPolicy::None => {}
        }
        self.observers
            .emit(Notification::DoubleClickFired { hotspot });
        true
    }

    fn start_session(
        &mut self,
        hotspot: HotspotId,
        interaction: InteractionRef,
        item: Option<ItemId>,
        services: &mut Services<'_>,
    ) {
        self.cancel_session(services);
        self.observers.emit(Notification::InteractionFired {
            hotspot,
            interaction,
            item,
        });
        self.session = Some(DispatchSession::new(hotspot, interaction, item));
    }

    fn cancel_session(&mut self, services: &mut Services<'_>) {
        if let Some(mut session) = self.session.take() {
            if session.cancel(services.player) {
                self.observers.emit(Notification::MovementCancelled {
                    hotspot: session.hotspot(),
                });
            }
        }
    }

    fn step_session(&mut self, world: &HotspotWorld, services: &mut Services<'_>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let mut env = SessionEnv {
            world,
            settings: &self.settings,
            services,
            requests: &mut self.requests,
            observers: &mut self.observers,
        };
        match session.step(&mut env) {
            SessionStatus::Running => {}
            SessionStatus::Done => {
                let cleared = session.cleared_selection();
                self.session = None;
                if cleared {
                    self.deselect_hotspot();
                } else if self.settings.close_menu_after_dispatch {
                    self.selection.menu_open_for = None;
                }
            }
            SessionStatus::Cancelled => {
                let hotspot = session.hotspot();
                self.session = None;
                self.observers
                    .emit(Notification::MovementCancelled { hotspot });
            }
        }
    }

    fn cursor_scope<'a>(&self, inventory: &'a dyn Inventory) -> CursorScope<'a> {
        CursorScope::new(inventory, self.settings.preserve_interaction_index)
    }

    fn select_hotspot(
        &mut self,
        world: &HotspotWorld,
        hotspot: HotspotId,
        inventory: &dyn Inventory,
    ) {
        if self.selection.selected_hotspot == Some(hotspot) {
            return;
        }
        self.deselect_hotspot();
        self.selection.selected_hotspot = Some(hotspot);
        if let Some(target) = world.find(hotspot) {
            let scope = self.cursor_scope(inventory);
            self.selection.interaction.sync(target, scope);
        }
        self.observers
            .emit(Notification::HotspotSelected { hotspot });
    }

    fn deselect_hotspot(&mut self) {
        if let Some(previous) = self.selection.selected_hotspot {
            self.observers
                .emit(Notification::HotspotDeselected { hotspot: previous });
        }
        self.selection.clear_hotspot();
    }

    fn current_label(
        &self,
        world: &HotspotWorld,
        services: &Services<'_>,
        held_item: Option<ItemId>,
    ) -> String {
        let hotspot = self
            .active_hotspot
            .or(self.selection.menu_open_for)
            .and_then(|id| world.find(id));
        let item_label =
            held_item.and_then(|item| services.inventory.item_label(item, self.language));
        let blocking_cutscene = self
            .session
            .as_ref()
            .is_some_and(|session| session.is_blocking() || session.in_blocking_cutscene());
        compose_label(&LabelInput {
            settings: &self.settings,
            hotspot,
            held_item,
            item_label: item_label.as_deref(),
            selection: &self.selection,
            game_state: self.game_state,
            blocking_cutscene,
            language: self.language,
        })
    }
}

/// What a plain click would pick on `hotspot`, ignoring cursor state.
fn default_interaction(
    settings: &InteractionSettings,
    hotspot: &crate::hotspot::Hotspot,
    item: Option<ItemId>,
) -> Option<(InteractionRef, Option<ItemId>)> {
    if let Some(item) = item {
        return match resolve_held_item(settings, hotspot, item) {
            ClickAction::RunInteraction {
                interaction, item, ..
            } => Some((interaction, item)),
            _ => None,
        };
    }
    if let Some(index) = hotspot.first_enabled_use() {
        return Some((InteractionRef::Use(index), None));
    }
    hotspot
        .has_enabled_examine()
        .then_some((InteractionRef::Examine, None))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::events::NotificationKind;
    use crate::geometry::{Camera2D, Vec2, Vec3, Viewport};
    use crate::hotspot::{
        Button, Collider, DispatchTarget, Handler, Hotspot, Marker, PlayerAction,
    };
    use crate::services::Pathfinder;
    use crate::session::test_support::{
        LinePathfinder, RecordingDispatcher, RecordingPlayer, StubInventory,
    };
    use crate::settings::{
        HotspotDetection, HotspotsInVicinity, InteractionMethod, SeeInteractions,
        SelectInteractions,
    };

    struct Harness {
        runtime: InteractionRuntime,
        world: HotspotWorld,
        player: RecordingPlayer,
        inventory: StubInventory,
        dispatcher: RecordingDispatcher,
        pathfinder: Option<LinePathfinder>,
    }

    impl Harness {
        fn new(settings: InteractionSettings) -> Self {
            Self {
                runtime: InteractionRuntime::new(settings),
                world: HotspotWorld::default(),
                player: RecordingPlayer::default(),
                inventory: StubInventory::default(),
                dispatcher: RecordingDispatcher::default(),
                pathfinder: Some(LinePathfinder),
            }
        }

        fn step(&mut self, input: InputSnapshot) -> StepReport {
            let pathfinder = self.pathfinder.as_ref().map(|p| p as &dyn Pathfinder);
            let mut services = Services {
                player: &mut self.player,
                pathfinder,
                inventory: &mut self.inventory,
                dispatcher: &mut self.dispatcher,
            };
            self.runtime.step(&mut self.world, &input, &mut services)
        }

        fn services_do<R>(&mut self, f: impl FnOnce(&mut InteractionRuntime, &mut HotspotWorld, &mut Services<'_>) -> R) -> R {
            let mut services = Services {
                player: &mut self.player,
                pathfinder: None,
                inventory: &mut self.inventory,
                dispatcher: &mut self.dispatcher,
            };
            f(&mut self.runtime, &mut self.world, &mut services)
        }
    }

    fn screen_of(world_x: f32, world_y: f32) -> Vec2 {
        Camera2D::default().world_to_screen(Viewport::default(), Vec2::new(world_x, world_y))
    }

    fn click_at(x: f32, y: f32, event: InputEvent) -> InputSnapshot {
        InputSnapshot::empty()
            .with_pointer_px(Some(screen_of(x, y)))
            .with_event(event)
    }

    fn handler(name: &str) -> Handler {
        Handler::new(DispatchTarget::ScriptAsset(name.to_string()))
    }

    fn lamp(x: f32, action: PlayerAction) -> Hotspot {
        Hotspot::new(
            "Lamp",
            Vec3::new(x, 0.0, 0.0),
            Collider::Rect {
                half_extents: Vec2::new(0.5, 0.5),
            },
        )
        .with_walk_to_marker(Marker {
            position: Vec3::new(x, -2.0, 0.0),
            forward: Vec3::new(0.0, 1.0, 0.0),
        })
        .with_use(
            Button::new()
                .with_player_action(action)
                .with_handler(handler("light_lamp")),
        )
        .with_examine(Button::new().with_handler(handler("look_lamp")))
    }

    #[test]
    fn context_sensitive_click_runs_use_in_same_step() {
        let mut harness = Harness::new(InteractionSettings::default());
        let id = harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        let report = harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(
            report.action,
            ClickAction::RunInteraction {
                hotspot: id,
                interaction: InteractionRef::Use(0),
                item: None,
            }
        );
        assert_eq!(report.session_state, None);
        assert_eq!(harness.dispatcher.calls.len(), 1);
        let kinds: Vec<_> = report.notifications.iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::HotspotSelected,
                NotificationKind::InteractionFired
            ]
        );
        assert_eq!(report.label, "Lamp");
    }

    #[test]
    fn new_session_cancels_previous_first() {
        let mut harness = Harness::new(InteractionSettings::default());
        let first = harness.world.register(lamp(0.0, PlayerAction::WalkToMarker));
        let second = harness.world.register(lamp(6.0, PlayerAction::WalkToMarker));
        let report = harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(report.session_state, Some(SessionState::MovingToAnchor));

        let report = harness.step(click_at(6.0, 0.0, InputEvent::SingleClick));
        let cancelled = report
            .notifications
            .iter()
            .position(|n| *n == Notification::MovementCancelled { hotspot: first })
            .expect("cancelled");
        let fired = report
            .notifications
            .iter()
            .position(|n| matches!(n, Notification::InteractionFired { hotspot, .. } if *hotspot == second))
            .expect("fired");
        assert!(cancelled < fired);
        assert_eq!(
            harness.runtime.session().map(DispatchSession::hotspot),
            Some(second)
        );
        assert_eq!(harness.player.end_path_calls, 1);
    }

    #[test]
    fn double_click_skip_lands_on_final_waypoint() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(
            lamp(0.0, PlayerAction::WalkToMarker).with_double_click(DoubleClickPolicy::TriggersInstantly),
        );
        harness.player.position = Vec3::new(-4.0, -2.0, 0.0);
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        harness.player.tick();
        let report = harness.step(click_at(0.0, 0.0, InputEvent::DoubleClick));
        assert_eq!(harness.player.position, Vec3::new(0.0, -2.0, 0.0));
        assert!(report
            .notifications
            .iter()
            .any(|n| n.kind() == NotificationKind::DoubleClickFired));
        assert_eq!(harness.dispatcher.calls.len(), 1);
    }

    #[test]
    fn double_click_skips_walk_under_menu_scheme() {
        let settings = InteractionSettings {
            interaction_method: InteractionMethod::ChooseHotspotThenInteraction,
            select_interactions: SelectInteractions::ClickingMenu,
            ..InteractionSettings::default()
        };
        let mut harness = Harness::new(settings);
        let id = harness.world.register(
            lamp(0.0, PlayerAction::WalkToMarker).with_double_click(DoubleClickPolicy::TriggersInstantly),
        );
        harness.player.position = Vec3::new(-4.0, -2.0, 0.0);
        harness
            .runtime
            .request_interaction(id, Some(InteractionRef::Use(0)));
        let report = harness.step(InputSnapshot::empty());
        assert_eq!(report.session_state, Some(SessionState::MovingToAnchor));
        harness.player.tick();

        let report = harness.step(click_at(0.0, 0.0, InputEvent::DoubleClick));
        assert_eq!(report.action, ClickAction::None);
        assert_eq!(harness.player.position, Vec3::new(0.0, -2.0, 0.0));
        assert!(report
            .notifications
            .iter()
            .any(|n| n.kind() == NotificationKind::DoubleClickFired));
        assert_eq!(harness.runtime.selected_hotspot(), None);
        assert_eq!(harness.dispatcher.calls.len(), 1);
    }

    #[test]
    fn double_click_run_policy_speeds_up_player() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(
            lamp(0.0, PlayerAction::WalkToMarker).with_double_click(DoubleClickPolicy::MakesPlayerRun),
        );
        harness.player.position = Vec3::new(-4.0, -2.0, 0.0);
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert!(!harness.player.running);
        let report = harness.step(click_at(0.0, 0.0, InputEvent::DoubleClick));
        assert!(harness.player.running);
        assert_eq!(report.session_state, Some(SessionState::MovingToAnchor));
    }

    #[test]
    fn observers_hear_fire_before_handler_runs() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        let log = Rc::new(RefCell::new(Vec::new()));
        harness.dispatcher.log = Some(Rc::clone(&log));
        let sink = Rc::clone(&log);
        harness
            .runtime
            .subscribe(ObserverScope::Persistent, move |notification| {
                if notification.kind() == NotificationKind::InteractionFired {
                    sink.borrow_mut().push("interaction_fired".to_string());
                }
            });

        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(
            *log.borrow(),
            vec![
                "interaction_fired".to_string(),
                "dispatch:light_lamp".to_string()
            ]
        );
    }

    #[test]
    fn unreadable_pointer_is_ignored() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        let report = harness.step(
            click_at(0.0, 0.0, InputEvent::SingleClick).with_pointer_readable(false),
        );
        assert_eq!(report.active_hotspot, None);
        assert_eq!(report.action, ClickAction::None);
        assert_eq!(report.label, "");
        assert_eq!(harness.runtime.selected_hotspot(), None);
        assert!(report.notifications.is_empty());
        assert!(harness.dispatcher.calls.is_empty());
    }

    #[test]
    fn held_item_without_handler_starts_nothing() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        harness.inventory.selected = Some(ItemId(42));
        let report = harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(report.action, ClickAction::None);
        assert!(harness.runtime.session().is_none());
        assert!(harness.dispatcher.calls.is_empty());
        assert_eq!(report.label, "Use item 42 on Lamp");
    }

    #[test]
    fn handler_requests_run_on_following_step() {
        let mut harness = Harness::new(InteractionSettings::default());
        let id = harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        harness.dispatcher.follow_up = Some((id, InteractionRef::Examine));
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(harness.dispatcher.calls.len(), 1);
        harness.step(InputSnapshot::empty());
        assert_eq!(harness.dispatcher.calls.len(), 2);
        assert_eq!(harness.dispatcher.calls[1].0.name(), "look_lamp");
    }

    #[test]
    fn stop_request_cancels_walk() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(lamp(0.0, PlayerAction::WalkToMarker));
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        harness.runtime.stop_moving_to_hotspot();
        let report = harness.step(InputSnapshot::empty());
        assert!(report
            .notifications
            .iter()
            .any(|n| n.kind() == NotificationKind::MovementCancelled));
        assert!(harness.runtime.session().is_none());
        assert!(harness.player.path.is_empty());
    }

    #[test]
    fn cutscene_cancels_and_hides_label() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(lamp(0.0, PlayerAction::WalkToMarker));
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        harness.services_do(|runtime, _, services| {
            runtime.set_game_state(GameState::Cutscene, services)
        });
        assert!(harness.runtime.session().is_none());
        let report = harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(report.action, ClickAction::None);
        assert_eq!(report.active_hotspot, None);
        assert_eq!(report.label, "");
    }

    #[test]
    fn scene_initialisation_releases_scene_observers() {
        let mut harness = Harness::new(InteractionSettings::default());
        harness.world.register(lamp(0.0, PlayerAction::WalkToMarker));
        let scene_seen = Rc::new(RefCell::new(0u32));
        let persistent_seen = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&scene_seen);
        harness
            .runtime
            .subscribe(ObserverScope::Scene, move |_| *sink.borrow_mut() += 1);
        let sink = Rc::clone(&persistent_seen);
        harness
            .runtime
            .subscribe(ObserverScope::Persistent, move |_| *sink.borrow_mut() += 1);

        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        harness.services_do(|runtime, world, services| runtime.on_scene_initialised(world, services));
        let scene_count = *scene_seen.borrow();
        assert!(scene_count >= 3);
        assert!(harness.runtime.session().is_none());
        assert_eq!(harness.runtime.selected_hotspot(), None);

        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(*scene_seen.borrow(), scene_count);
        assert!(*persistent_seen.borrow() > scene_count);
    }

    #[test]
    fn removed_selected_hotspot_is_dropped() {
        let settings = InteractionSettings {
            interaction_method: InteractionMethod::ChooseHotspotThenInteraction,
            ..InteractionSettings::default()
        };
        let mut harness = Harness::new(settings);
        let id = harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(harness.runtime.selected_hotspot(), Some(id));
        harness.world.unregister(id);
        let report = harness.step(InputSnapshot::empty());
        assert_eq!(harness.runtime.selected_hotspot(), None);
        assert_eq!(
            report.notifications,
            vec![Notification::HotspotDeselected { hotspot: id }]
        );
    }

    #[test]
    fn menu_choice_runs_and_closes_menu() {
        let settings = InteractionSettings {
            interaction_method: InteractionMethod::ChooseHotspotThenInteraction,
            see_interactions: SeeInteractions::ClickOnHotspot,
            select_interactions: SelectInteractions::ClickingMenu,
            ..InteractionSettings::default()
        };
        let mut harness = Harness::new(settings);
        let id = harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        let report = harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(report.action, ClickAction::OpenInteractionMenu(id));
        assert_eq!(harness.runtime.selection().menu_open_for, Some(id));

        assert!(harness.runtime.choose_menu_interaction(&harness.world, 0));
        assert!(!harness.runtime.choose_menu_interaction(&harness.world, 5));
        harness.step(InputSnapshot::empty());
        assert_eq!(harness.dispatcher.calls.len(), 1);
        assert_eq!(harness.runtime.selection().menu_open_for, None);
    }

    #[test]
    fn script_only_menu_opens_through_runtime_call() {
        let settings = InteractionSettings {
            interaction_method: InteractionMethod::ChooseHotspotThenInteraction,
            see_interactions: SeeInteractions::ViaScriptOnly,
            select_interactions: SelectInteractions::ClickingMenu,
            ..InteractionSettings::default()
        };
        let mut harness = Harness::new(settings);
        let id = harness.world.register(lamp(0.0, PlayerAction::DoNothing));
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        let report = harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(report.action, ClickAction::None);
        assert_eq!(harness.runtime.selection().menu_open_for, None);
        assert!(!harness.runtime.choose_menu_interaction(&harness.world, 0));

        assert!(harness
            .runtime
            .open_interaction_menu(&harness.world, &harness.inventory, id));
        assert!(!harness
            .runtime
            .open_interaction_menu(&harness.world, &harness.inventory, HotspotId(99)));
        assert_eq!(harness.runtime.selection().menu_open_for, Some(id));
        assert_eq!(harness.runtime.selection().interaction.index(), Some(0));

        assert!(harness.runtime.choose_menu_interaction(&harness.world, 0));
        harness.step(InputSnapshot::empty());
        assert_eq!(harness.dispatcher.calls.len(), 1);
        assert_eq!(harness.dispatcher.calls[0].0.name(), "light_lamp");
    }

    #[test]
    fn menu_combine_slot_needs_the_item_in_pockets() {
        let settings = InteractionSettings {
            interaction_method: InteractionMethod::ChooseHotspotThenInteraction,
            see_interactions: SeeInteractions::ViaScriptOnly,
            select_interactions: SelectInteractions::ClickingMenu,
            ..InteractionSettings::default()
        };
        let mut harness = Harness::new(settings);
        let id = harness.world.register(
            lamp(0.0, PlayerAction::DoNothing).with_inventory(
                Button::new()
                    .with_item(ItemId(5))
                    .with_handler(handler("oil_lamp")),
            ),
        );
        harness
            .runtime
            .open_interaction_menu(&harness.world, &harness.inventory, id);
        assert!(!harness.runtime.choose_menu_interaction(&harness.world, 1));

        harness.inventory.carried.push(ItemId(5));
        harness
            .runtime
            .open_interaction_menu(&harness.world, &harness.inventory, id);
        assert!(harness.runtime.choose_menu_interaction(&harness.world, 1));
        harness.step(InputSnapshot::empty());
        assert_eq!(harness.dispatcher.calls.len(), 1);
        assert_eq!(harness.dispatcher.calls[0].0.name(), "oil_lamp");
        assert_eq!(harness.dispatcher.calls[0].1.item, Some(ItemId(5)));
    }

    #[test]
    fn vicinity_show_all_highlights_without_active() {
        let settings = InteractionSettings {
            hotspot_detection: HotspotDetection::PlayerVicinity,
            hotspots_in_vicinity: HotspotsInVicinity::ShowAll,
            vicinity_radius: 3.0,
            ..InteractionSettings::default()
        };
        let mut harness = Harness::new(settings);
        let a = harness.world.register(lamp(1.0, PlayerAction::DoNothing));
        let b = harness.world.register(lamp(-1.0, PlayerAction::DoNothing));
        let report = harness.step(InputSnapshot::empty().with_event(InputEvent::SingleClick));
        assert_eq!(report.active_hotspot, None);
        assert!(harness.world.find(a).expect("a").is_highlighted());
        assert!(harness.world.find(b).expect("b").is_highlighted());
        assert!(harness.dispatcher.calls.is_empty());
    }

    #[test]
    fn explicit_request_prefers_combine_for_held_item() {
        let settings = InteractionSettings {
            interaction_method: InteractionMethod::CustomScript,
            ..InteractionSettings::default()
        };
        let mut harness = Harness::new(settings);
        let id = harness.world.register(
            lamp(0.0, PlayerAction::DoNothing).with_inventory(
                Button::new()
                    .with_item(ItemId(5))
                    .with_handler(handler("oil_lamp")),
            ),
        );
        harness.inventory.selected = Some(ItemId(5));
        let report = harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        assert_eq!(report.action, ClickAction::SelectHotspot(id));
        assert!(harness.dispatcher.calls.is_empty());

        harness.runtime.request_interaction(id, None);
        harness.step(InputSnapshot::empty());
        assert_eq!(harness.dispatcher.calls.len(), 1);
        assert_eq!(harness.dispatcher.calls[0].0.name(), "oil_lamp");
        assert_eq!(harness.dispatcher.calls[0].1.item, Some(ItemId(5)));
    }

    #[test]
    fn blocking_session_ignores_clicks() {
        let mut harness = Harness::new(InteractionSettings::default());
        let mut blocking = lamp(0.0, PlayerAction::WalkToMarker);
        blocking.use_buttons[0].blocking = true;
        let first = harness.world.register(blocking);
        harness.world.register(lamp(6.0, PlayerAction::DoNothing));
        harness.step(click_at(0.0, 0.0, InputEvent::SingleClick));
        let report = harness.step(click_at(6.0, 0.0, InputEvent::SingleClick));
        assert_eq!(report.action, ClickAction::None);
        assert_eq!(
            harness.runtime.session().map(DispatchSession::hotspot),
            Some(first)
        );
        assert_eq!(report.label, "");
    }
}
