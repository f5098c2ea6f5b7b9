//! Contracts for the collaborators the engine drives but does not own:
//! the player character, pathfinding, inventory and the action/script engine.

use thiserror::Error;

use crate::geometry::Vec3;
use crate::hotspot::{DispatchTarget, HotspotId, ItemId};
use crate::requests::RequestQueue;

pub trait PlayerCharacter {
    fn position(&self) -> Vec3;
    fn move_along(&mut self, waypoints: &[Vec3], run: bool);
    fn set_running(&mut self, run: bool);
    fn turn_to(&mut self, direction: Vec3, instant: bool);
    fn end_path(&mut self);
    fn teleport(&mut self, position: Vec3);
    fn is_turning(&self) -> bool;
    fn is_moving(&self) -> bool;
    fn set_head_target(&mut self, target: Option<Vec3>);
    fn in_first_person(&self) -> bool {
        false
    }
}

pub trait Pathfinder {
    /// Ordered waypoints from `from` to `to`; empty when no usable path exists.
    fn compute_path(&self, from: Vec3, to: Vec3) -> Vec<Vec3>;
}

pub trait Inventory {
    fn selected_item(&self) -> Option<ItemId>;
    fn set_null(&mut self);
    fn is_carrying(&self, item: ItemId) -> bool;
    fn item_label(&self, _item: ItemId, _language: usize) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterValue {
    Hotspot(HotspotId),
    Item(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchParams {
    pub hotspot: HotspotId,
    pub item: Option<ItemId>,
    /// Values for the slots the handler declared, keyed by slot index.
    pub slots: Vec<(u32, ParameterValue)>,
    pub blocking: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatch target '{name}' was not found")]
    TargetNotFound { name: String },
    #[error("dispatch target '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// The external action/script engine. Handlers that want to start another
/// interaction push into `requests`; those apply on the next step.
pub trait InteractionDispatcher {
    fn invoke(
        &mut self,
        target: &DispatchTarget,
        params: &DispatchParams,
        requests: &mut RequestQueue,
    ) -> Result<(), DispatchError>;
}

pub struct Services<'a> {
    pub player: &'a mut dyn PlayerCharacter,
    pub pathfinder: Option<&'a dyn Pathfinder>,
    pub inventory: &'a mut dyn Inventory,
    pub dispatcher: &'a mut dyn InteractionDispatcher,
}
