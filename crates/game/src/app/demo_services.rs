use std::collections::{BTreeMap, VecDeque};

use engine::{
    DispatchError, DispatchParams, DispatchTarget, InteractionDispatcher, Inventory, ItemId,
    PlayerCharacter, RequestQueue, Vec3,
};
use tracing::{debug, info};

const TURN_STEPS: u32 = 2;
const RUN_SPEED_MULTIPLIER: f32 = 2.0;

/// Player that walks its waypoints at a fixed distance per step.
#[derive(Debug, Clone)]
pub(crate) struct DemoPlayer {
    position: Vec3,
    speed: f32,
    path: VecDeque<Vec3>,
    running: bool,
    facing: Vec3,
    turn_steps_left: u32,
    head_target: Option<Vec3>,
}

impl DemoPlayer {
    pub(crate) fn new(position: Vec3, speed: f32) -> Self {
        Self {
            position,
            speed,
            path: VecDeque::new(),
            running: false,
            facing: Vec3::FORWARD,
            turn_steps_left: 0,
            head_target: None,
        }
    }

    pub(crate) fn facing(&self) -> Vec3 {
        self.facing
    }

    pub(crate) fn head_target(&self) -> Option<Vec3> {
        self.head_target
    }

    pub(crate) fn tick(&mut self) {
        self.turn_steps_left = self.turn_steps_left.saturating_sub(1);

        let multiplier = if self.running {
            RUN_SPEED_MULTIPLIER
        } else {
            1.0
        };
        let mut budget = self.speed * multiplier;
        while budget > 0.0 {
            let Some(next) = self.path.front().copied() else {
                break;
            };
            let to_next = next - self.position;
            let distance = to_next.length();
            if distance <= budget {
                self.position = next;
                self.path.pop_front();
                budget -= distance;
            } else {
                self.position = self.position + to_next.normalize_or_zero() * budget;
                budget = 0.0;
            }
        }
        if self.path.is_empty() {
            self.running = false;
        }
    }
}

impl PlayerCharacter for DemoPlayer {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn move_along(&mut self, waypoints: &[Vec3], run: bool) {
        self.path = waypoints.iter().copied().collect();
        self.running = run;
        debug!(waypoints = waypoints.len(), run, "player_path_started");
    }

    fn set_running(&mut self, run: bool) {
        self.running = run;
    }

    fn turn_to(&mut self, direction: Vec3, instant: bool) {
        if direction.is_zero() {
            return;
        }
        self.facing = direction.normalize_or_zero();
        self.turn_steps_left = if instant { 0 } else { TURN_STEPS };
    }

    fn end_path(&mut self) {
        self.path.clear();
        self.running = false;
    }

    fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.path.clear();
    }

    fn is_turning(&self) -> bool {
        self.turn_steps_left > 0
    }

    fn is_moving(&self) -> bool {
        !self.path.is_empty()
    }

    fn set_head_target(&mut self, target: Option<Vec3>) {
        self.head_target = target;
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DemoInventory {
    labels: BTreeMap<ItemId, String>,
    selected: Option<ItemId>,
}

impl DemoInventory {
    pub(crate) fn new(items: impl IntoIterator<Item = (ItemId, String)>) -> Self {
        Self {
            labels: items.into_iter().collect(),
            selected: None,
        }
    }

    /// Selects a carried item; unknown items are ignored.
    pub(crate) fn select(&mut self, item: ItemId) -> bool {
        if !self.labels.contains_key(&item) {
            return false;
        }
        self.selected = Some(item);
        true
    }
}

impl Inventory for DemoInventory {
    fn selected_item(&self) -> Option<ItemId> {
        self.selected
    }

    fn set_null(&mut self) {
        self.selected = None;
    }

    fn is_carrying(&self, item: ItemId) -> bool {
        self.labels.contains_key(&item)
    }

    fn item_label(&self, item: ItemId, _language: usize) -> Option<String> {
        self.labels.get(&item).cloned()
    }
}

/// Stands in for the action/script engine: every invocation is logged and
/// kept so the run can be inspected afterwards.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoggingDispatcher {
    invocations: Vec<String>,
}

impl LoggingDispatcher {
    pub(crate) fn invocations(&self) -> &[String] {
        &self.invocations
    }
}

impl InteractionDispatcher for LoggingDispatcher {
    fn invoke(
        &mut self,
        target: &DispatchTarget,
        params: &DispatchParams,
        _requests: &mut RequestQueue,
    ) -> Result<(), DispatchError> {
        if target.name().is_empty() {
            return Err(DispatchError::TargetNotFound {
                name: String::new(),
            });
        }
        let kind = match target {
            DispatchTarget::ScriptAsset(_) => "script",
            DispatchTarget::SceneActionList(_) => "action_list",
            DispatchTarget::Callback(_) => "callback",
        };
        info!(
            kind,
            target = target.name(),
            hotspot = params.hotspot.0,
            item = params.item.map(|item| item.0),
            slots = params.slots.len(),
            blocking = params.blocking,
            "handler_invoked"
        );
        self.invocations.push(target.name().to_string());
        Ok(())
    }
}
