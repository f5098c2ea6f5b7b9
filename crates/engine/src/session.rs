//! The walk-turn-dispatch sequence for one chosen interaction.

use tracing::{debug, info, warn};

use crate::events::{Notification, ObserverRegistry};
use crate::geometry::Vec3;
use crate::hotspot::{
    Button, Handler, Hotspot, HotspotId, HotspotWorld, InteractionKind, InteractionRef, ItemId,
    PlayerAction,
};
use crate::requests::RequestQueue;
use crate::services::{DispatchParams, ParameterValue, PlayerCharacter, Services};
use crate::settings::InteractionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    FacingTarget,
    MovingToAnchor,
    FacingAfterArrival,
    Dispatching,
    Done,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Done,
    Cancelled,
}

pub struct SessionEnv<'s, 'a> {
    pub world: &'s HotspotWorld,
    pub settings: &'s InteractionSettings,
    pub services: &'s mut Services<'a>,
    pub requests: &'s mut RequestQueue,
    pub observers: &'s mut ObserverRegistry,
}

#[derive(Debug, Clone)]
pub struct DispatchSession {
    hotspot: HotspotId,
    interaction: InteractionRef,
    item: Option<ItemId>,
    state: SessionState,
    skip: bool,
    run: bool,
    turn_started: bool,
    path_end: Option<Vec3>,
    blocking: bool,
    first_person_cutscene: bool,
    cleared_selection: bool,
}

impl DispatchSession {
    pub fn new(hotspot: HotspotId, interaction: InteractionRef, item: Option<ItemId>) -> Self {
        Self {
            hotspot,
            interaction,
            item,
            state: SessionState::Init,
            skip: false,
            run: false,
            turn_started: false,
            path_end: None,
            blocking: false,
            first_person_cutscene: false,
            cleared_selection: false,
        }
    }

    pub fn hotspot(&self) -> HotspotId {
        self.hotspot
    }

    pub fn interaction(&self) -> InteractionRef {
        self.interaction
    }

    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking && !self.state.is_terminal()
    }

    /// Set while a first-person player turns to face after arrival.
    pub fn in_blocking_cutscene(&self) -> bool {
        self.first_person_cutscene
    }

    /// True once an unhandled fallback cleared the item and hotspot selection.
    pub fn cleared_selection(&self) -> bool {
        self.cleared_selection
    }

    pub fn path_end(&self) -> Option<Vec3> {
        self.path_end
    }

    /// Completes any in-progress turn or walk on the next step.
    pub fn request_skip(&mut self) {
        self.skip = true;
    }

    pub fn request_run(&mut self, player: &mut dyn PlayerCharacter) {
        self.run = true;
        if self.state == SessionState::MovingToAnchor {
            player.set_running(true);
        }
    }

    pub fn cancel(&mut self, player: &mut dyn PlayerCharacter) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if matches!(
            self.state,
            SessionState::MovingToAnchor | SessionState::FacingTarget
        ) {
            player.end_path();
        }
        player.set_head_target(None);
        self.first_person_cutscene = false;
        self.state = SessionState::Cancelled;
        info!(
            hotspot = self.hotspot.0,
            interaction = ?self.interaction,
            "session_cancelled"
        );
        true
    }

    pub fn step(&mut self, env: &mut SessionEnv<'_, '_>) -> SessionStatus {
        let world = env.world;
        loop {
            match self.state {
                SessionState::Done => return SessionStatus::Done,
                SessionState::Cancelled => return SessionStatus::Cancelled,
                _ => {}
            }

            let Some(hotspot) = world.find(self.hotspot) else {
                warn!(hotspot = self.hotspot.0, "session_target_missing");
                self.cancel(env.services.player);
                return SessionStatus::Cancelled;
            };
            let Some(button) = hotspot.button(self.interaction) else {
                warn!(
                    hotspot = self.hotspot.0,
                    interaction = ?self.interaction,
                    "session_interaction_missing"
                );
                self.cancel(env.services.player);
                return SessionStatus::Cancelled;
            };

            match self.state {
                SessionState::Init => self.enter(hotspot, button, env),
                SessionState::FacingTarget => {
                    if env.services.player.is_turning() {
                        if !self.skip {
                            return SessionStatus::Running;
                        }
                        let direction = facing_direction(
                            env.services.player.position(),
                            hotspot.facing_position(),
                            env.settings.act_in_screen_space,
                        );
                        env.services.player.turn_to(direction, true);
                    }
                    if button.player_action.walks() {
                        self.begin_movement(hotspot, button, env);
                    } else {
                        self.state = SessionState::FacingAfterArrival;
                    }
                }
                SessionState::MovingToAnchor => {
                    if self.skip {
                        if let Some(end) = self.path_end {
                            env.services.player.teleport(end);
                        }
                        env.services.player.end_path();
                    } else if env.services.player.is_moving() {
                        return SessionStatus::Running;
                    }
                    env.observers.emit(Notification::ReachedTarget {
                        hotspot: self.hotspot,
                    });
                    self.state = SessionState::FacingAfterArrival;
                }
                SessionState::FacingAfterArrival => {
                    if !button.face_after {
                        self.state = SessionState::Dispatching;
                        continue;
                    }
                    if !self.turn_started {
                        let direction = hotspot
                            .walk_to_marker
                            .map(|marker| marker.forward)
                            .unwrap_or_else(|| {
                                facing_direction(
                                    env.services.player.position(),
                                    hotspot.facing_position(),
                                    env.settings.act_in_screen_space,
                                )
                            });
                        env.services.player.turn_to(direction, self.skip);
                        self.first_person_cutscene = env.services.player.in_first_person();
                        self.turn_started = true;
                    }
                    if env.services.player.is_turning() && !self.skip {
                        return SessionStatus::Running;
                    }
                    self.first_person_cutscene = false;
                    self.state = SessionState::Dispatching;
                }
                SessionState::Dispatching => {
                    self.dispatch(hotspot, button, env);
                    env.services.player.set_head_target(None);
                    self.state = SessionState::Done;
                }
                SessionState::Done | SessionState::Cancelled => {}
            }
        }
    }

    fn enter(&mut self, hotspot: &Hotspot, button: &Button, env: &mut SessionEnv<'_, '_>) {
        self.blocking = button.blocking;
        info!(
            hotspot = self.hotspot.0,
            interaction = ?self.interaction,
            item = self.item.map(|item| item.0),
            action = ?button.player_action,
            "session_started"
        );
        if button.player_action == PlayerAction::DoNothing {
            self.state = SessionState::Dispatching;
            return;
        }

        let player = &mut *env.services.player;
        let direction = facing_direction(
            player.position(),
            hotspot.facing_position(),
            env.settings.act_in_screen_space,
        );
        player.set_head_target(Some(hotspot.facing_position()));

        let turn_first = button.player_action == PlayerAction::TurnToFace
            || env.settings.turn_before_walking;
        if turn_first {
            if !direction.is_zero() {
                player.turn_to(direction, self.skip);
            }
            self.state = SessionState::FacingTarget;
        } else {
            if !direction.is_zero() {
                player.turn_to(direction, false);
            }
            self.begin_movement(hotspot, button, env);
        }
    }

    fn begin_movement(&mut self, hotspot: &Hotspot, button: &Button, env: &mut SessionEnv<'_, '_>) {
        let start = env.services.player.position();
        let Some((target, threshold)) = walk_target(hotspot, button, env.settings, start) else {
            self.state = SessionState::FacingAfterArrival;
            return;
        };
        if start.distance(target) <= threshold {
            debug!(hotspot = self.hotspot.0, "already_at_target");
            env.observers.emit(Notification::ReachedTarget {
                hotspot: self.hotspot,
            });
            self.state = SessionState::FacingAfterArrival;
            return;
        }

        let waypoints = match env.services.pathfinder {
            Some(pathfinder) => {
                let path = pathfinder.compute_path(start, target);
                if path.is_empty() {
                    debug!(
                        hotspot = self.hotspot.0,
                        "no_usable_path_moving_directly"
                    );
                    vec![target]
                } else {
                    path
                }
            }
            None => {
                warn!(hotspot = self.hotspot.0, "no_pathfinder_moving_directly");
                vec![target]
            }
        };
        self.path_end = waypoints.last().copied();
        env.services.player.move_along(&waypoints, self.run);
        self.state = SessionState::MovingToAnchor;
    }

    fn dispatch(&mut self, hotspot: &Hotspot, button: &Button, env: &mut SessionEnv<'_, '_>) {
        if let Some(handler) = &button.handler {
            self.invoke(handler, button.blocking, env);
            return;
        }

        let fallback = match self.interaction.kind() {
            _ if self.interaction.is_fallback() => None,
            InteractionKind::Use => Some(InteractionRef::UnhandledUse),
            InteractionKind::Inventory => Some(InteractionRef::UnhandledInventory),
            InteractionKind::Examine => None,
        };
        let fallback_button = fallback
            .filter(|interaction| hotspot.is_interaction_enabled(*interaction))
            .and_then(|interaction| hotspot.button(interaction));
        match fallback_button.and_then(|button| button.handler.as_ref().map(|h| (button, h))) {
            Some((fallback_button, handler)) => {
                if env.settings.clear_selection_before_unhandled {
                    env.services.inventory.set_null();
                    self.cleared_selection = true;
                }
                self.invoke(handler, fallback_button.blocking, env);
            }
            None => {
                debug!(
                    hotspot = self.hotspot.0,
                    interaction = ?self.interaction,
                    "interaction_has_no_handler"
                );
            }
        }
    }

    fn invoke(&mut self, handler: &Handler, blocking: bool, env: &mut SessionEnv<'_, '_>) {
        let params = dispatch_params(handler, self.hotspot, self.item, blocking);
        info!(
            hotspot = self.hotspot.0,
            target = handler.target.name(),
            "interaction_dispatched"
        );
        if let Err(err) = env
            .services
            .dispatcher
            .invoke(&handler.target, &params, env.requests)
        {
            warn!(hotspot = self.hotspot.0, error = %err, "interaction_dispatch_failed");
        }
    }
}

pub fn dispatch_params(
    handler: &Handler,
    hotspot: HotspotId,
    item: Option<ItemId>,
    blocking: bool,
) -> DispatchParams {
    let mut slots = Vec::new();
    if let Some(slot) = handler.hotspot_parameter {
        slots.push((slot, ParameterValue::Hotspot(hotspot)));
    }
    if let (Some(slot), Some(item)) = (handler.item_parameter, item) {
        slots.push((slot, ParameterValue::Item(item)));
    }
    DispatchParams {
        hotspot,
        item,
        slots,
        blocking,
    }
}

/// Where the player should stop and how close counts as arrived.
fn walk_target(
    hotspot: &Hotspot,
    button: &Button,
    settings: &InteractionSettings,
    start: Vec3,
) -> Option<(Vec3, f32)> {
    if button.player_action == PlayerAction::WalkToMarker {
        if let Some(marker) = hotspot.walk_to_marker {
            return Some((marker.position, settings.marker_arrival_threshold));
        }
    }
    if !button.player_action.walks() {
        return None;
    }
    let proximity = button
        .proximity
        .unwrap_or(settings.default_proximity)
        .max(0.0);
    let focus = hotspot.facing_position();
    let offset = start - focus;
    if offset.length() <= proximity {
        return Some((start, proximity));
    }
    let target = focus + offset.normalize_or_zero() * proximity;
    Some((target, settings.marker_arrival_threshold))
}

/// Direction from `from` towards `to`, flattened onto the screen plane (xy)
/// when acting in screen space, else onto the ground plane (xz).
pub fn facing_direction(from: Vec3, to: Vec3, screen_space: bool) -> Vec3 {
    let delta = to - from;
    let flat = if screen_space {
        Vec3::new(delta.x, delta.y, 0.0)
    } else {
        Vec3::new(delta.x, 0.0, delta.z)
    };
    flat.normalize_or_zero()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::events::NotificationKind;
    use crate::geometry::Vec2;
    use crate::hotspot::{Collider, DispatchTarget, Marker};
    use crate::services::{DispatchError, Pathfinder};

    struct Rig {
        world: HotspotWorld,
        settings: InteractionSettings,
        player: RecordingPlayer,
        inventory: StubInventory,
        dispatcher: RecordingDispatcher,
        requests: RequestQueue,
        observers: ObserverRegistry,
    }

    impl Rig {
        fn new(hotspot: Hotspot) -> (Self, HotspotId) {
            let mut world = HotspotWorld::default();
            let id = world.register(hotspot);
            (
                Self {
                    world,
                    settings: InteractionSettings::default(),
                    player: RecordingPlayer::default(),
                    inventory: StubInventory::default(),
                    dispatcher: RecordingDispatcher::default(),
                    requests: RequestQueue::default(),
                    observers: ObserverRegistry::default(),
                },
                id,
            )
        }

        fn step(&mut self, session: &mut DispatchSession, pathfinder: Option<&dyn Pathfinder>) -> SessionStatus {
            let mut services = Services {
                player: &mut self.player,
                pathfinder,
                inventory: &mut self.inventory,
                dispatcher: &mut self.dispatcher,
            };
            let mut env = SessionEnv {
                world: &self.world,
                settings: &self.settings,
                services: &mut services,
                requests: &mut self.requests,
                observers: &mut self.observers,
            };
            session.step(&mut env)
        }
    }

    fn lever(action: PlayerAction) -> Hotspot {
        Hotspot::new(
            "Lever",
            Vec3::new(4.0, 0.0, 0.0),
            Collider::Rect {
                half_extents: Vec2::new(0.5, 0.5),
            },
        )
        .with_walk_to_marker(Marker {
            position: Vec3::new(3.0, 0.0, 0.0),
            forward: Vec3::new(1.0, 0.0, 0.0),
        })
        .with_use(
            Button::new()
                .with_player_action(action)
                .with_handler(
                    Handler::new(DispatchTarget::ScriptAsset("pull_lever".to_string()))
                        .with_hotspot_parameter(0)
                        .with_item_parameter(1),
                ),
        )
    }

    #[test]
    fn do_nothing_dispatches_in_the_same_step() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::DoNothing));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        assert_eq!(rig.step(&mut session, None), SessionStatus::Done);
        assert_eq!(rig.dispatcher.calls.len(), 1);
        assert!(rig.player.turns.is_empty());
    }

    #[test]
    fn walk_to_marker_follows_path_then_dispatches() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::WalkToMarker));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        assert_eq!(
            rig.step(&mut session, Some(&LinePathfinder)),
            SessionStatus::Running
        );
        assert_eq!(session.state(), SessionState::MovingToAnchor);
        assert_eq!(session.path_end(), Some(Vec3::new(3.0, 0.0, 0.0)));

        for _ in 0..2 {
            rig.player.tick();
            assert_eq!(
                rig.step(&mut session, Some(&LinePathfinder)),
                SessionStatus::Running
            );
        }
        rig.player.tick();
        assert_eq!(
            rig.step(&mut session, Some(&LinePathfinder)),
            SessionStatus::Done
        );
        assert_eq!(rig.player.position, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(rig.dispatcher.calls.len(), 1);
        assert_eq!(rig.player.head_target, None);
        let delivered = rig.observers.flush();
        assert!(delivered
            .iter()
            .any(|n| n.kind() == NotificationKind::ReachedTarget));
    }

    #[test]
    fn skip_teleports_to_final_waypoint() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::WalkToMarker));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        rig.step(&mut session, Some(&LinePathfinder));
        rig.player.tick();
        session.request_skip();
        assert_eq!(
            rig.step(&mut session, Some(&LinePathfinder)),
            SessionStatus::Done
        );
        assert_eq!(rig.player.position, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(rig.player.teleports, vec![Vec3::new(3.0, 0.0, 0.0)]);
        assert!(rig.player.path.is_empty());
    }

    #[test]
    fn missing_path_moves_directly() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::WalkToMarker));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        rig.step(&mut session, Some(&NoPathfinder));
        assert_eq!(
            rig.player.path.iter().copied().collect::<Vec<_>>(),
            vec![Vec3::new(3.0, 0.0, 0.0)]
        );

        let (mut rig, id) = Rig::new(lever(PlayerAction::WalkToMarker));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        rig.step(&mut session, None);
        assert_eq!(rig.player.path.len(), 1);
    }

    #[test]
    fn walk_to_stops_at_proximity() {
        let mut hotspot = lever(PlayerAction::WalkTo);
        hotspot.use_buttons[0].proximity = Some(1.5);
        let (mut rig, id) = Rig::new(hotspot);
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        rig.step(&mut session, None);
        let end = session.path_end().expect("path end");
        assert!((end.x - 2.5).abs() < 1e-5);
    }

    #[test]
    fn turn_to_face_waits_for_turn() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::TurnToFace));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        assert_eq!(rig.step(&mut session, None), SessionStatus::Running);
        assert_eq!(session.state(), SessionState::FacingTarget);
        assert_eq!(rig.player.turns, vec![(Vec3::new(1.0, 0.0, 0.0), false)]);
        rig.player.tick();
        assert_eq!(rig.step(&mut session, None), SessionStatus::Done);
        assert!(rig.player.path.is_empty());
    }

    #[test]
    fn face_after_turns_to_marker_forward_and_flags_first_person() {
        let mut hotspot = lever(PlayerAction::WalkToMarker);
        hotspot.use_buttons[0].face_after = true;
        let (mut rig, id) = Rig::new(hotspot);
        rig.player.position = Vec3::new(3.0, 0.0, 0.0);
        rig.player.first_person = true;
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        assert_eq!(rig.step(&mut session, None), SessionStatus::Running);
        assert_eq!(session.state(), SessionState::FacingAfterArrival);
        assert!(session.in_blocking_cutscene());
        rig.player.tick();
        assert_eq!(rig.step(&mut session, None), SessionStatus::Done);
        assert!(!session.in_blocking_cutscene());
    }

    #[test]
    fn cancel_during_walk_halts_path() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::WalkToMarker));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        rig.step(&mut session, Some(&LinePathfinder));
        assert!(session.cancel(&mut rig.player));
        assert!(!session.cancel(&mut rig.player));
        assert_eq!(rig.player.end_path_calls, 1);
        assert!(rig.player.path.is_empty());
        assert_eq!(rig.step(&mut session, None), SessionStatus::Cancelled);
        assert!(rig.dispatcher.calls.is_empty());
    }

    #[test]
    fn parameter_slots_only_fill_declared_entries() {
        let handler = Handler::new(DispatchTarget::Callback("cb".to_string())).with_item_parameter(2);
        let params = dispatch_params(&handler, HotspotId(1), Some(ItemId(5)), false);
        assert_eq!(params.slots, vec![(2, ParameterValue::Item(ItemId(5)))]);
        let params = dispatch_params(&handler, HotspotId(1), None, false);
        assert!(params.slots.is_empty());
    }

    #[test]
    fn missing_handler_uses_unhandled_fallback_and_clears_item() {
        let hotspot = Hotspot::new("Crate", Vec3::ZERO, Collider::Circle { radius: 0.5 })
            .with_inventory(Button::new().with_item(ItemId(3)))
            .with_unhandled_inventory(Button::new().with_handler(Handler::new(
                DispatchTarget::SceneActionList("shrug".to_string()),
            )));
        let (mut rig, id) = Rig::new(hotspot);
        rig.settings.clear_selection_before_unhandled = true;
        rig.inventory.selected = Some(ItemId(3));
        let mut session = DispatchSession::new(id, InteractionRef::Inventory(0), Some(ItemId(3)));
        assert_eq!(rig.step(&mut session, None), SessionStatus::Done);
        assert_eq!(rig.dispatcher.calls.len(), 1);
        assert_eq!(rig.dispatcher.calls[0].0.name(), "shrug");
        assert_eq!(rig.inventory.selected, None);
        assert!(session.cleared_selection());
    }

    #[test]
    fn dispatch_errors_do_not_fail_the_session() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::DoNothing));
        rig.dispatcher.fail_with = Some(DispatchError::TargetNotFound {
            name: "pull_lever".to_string(),
        });
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        assert_eq!(rig.step(&mut session, None), SessionStatus::Done);
    }

    #[test]
    fn removed_hotspot_cancels() {
        let (mut rig, id) = Rig::new(lever(PlayerAction::WalkToMarker));
        let mut session = DispatchSession::new(id, InteractionRef::Use(0), None);
        rig.step(&mut session, Some(&LinePathfinder));
        rig.world.unregister(id);
        assert_eq!(rig.step(&mut session, None), SessionStatus::Cancelled);
        assert_eq!(session.state(), SessionState::Cancelled);
    }
}
