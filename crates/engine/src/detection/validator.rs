use tracing::trace;

use crate::geometry::Vec3;
use crate::hotspot::{Hotspot, HotspotId, HotspotWorld, ItemId};
use crate::settings::{HotspotDetection, InteractionSettings};

#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub settings: &'a InteractionSettings,
    pub player_position: Vec3,
    pub held_item: Option<ItemId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Missing,
    Disabled,
    OutsideBoundary,
    UnhandledItem,
    OutOfVicinity,
}

pub fn check(hotspot: &Hotspot, context: &ValidationContext<'_>) -> Result<(), Rejection> {
    if !hotspot.is_enabled() {
        return Err(Rejection::Disabled);
    }
    if let Some(boundary) = hotspot.boundary {
        if !boundary.contains(context.player_position) {
            return Err(Rejection::OutsideBoundary);
        }
    }
    if let Some(item) = context.held_item {
        if context.settings.disable_unhandled_hotspots && !hotspot.handles_item(item) {
            return Err(Rejection::UnhandledItem);
        }
    }
    if context.settings.hotspot_detection == HotspotDetection::PlayerVicinity
        && hotspot.position.distance(context.player_position) > context.settings.vicinity_radius
    {
        return Err(Rejection::OutOfVicinity);
    }
    Ok(())
}

/// Applies the same gate to every detection mode's candidate.
pub fn validate(
    world: &HotspotWorld,
    candidate: Option<HotspotId>,
    context: &ValidationContext<'_>,
) -> Option<HotspotId> {
    let id = candidate?;
    let result = world
        .find(id)
        .ok_or(Rejection::Missing)
        .and_then(|hotspot| check(hotspot, context));
    match result {
        Ok(()) => Some(id),
        Err(reason) => {
            trace!(hotspot = id.0, reason = ?reason, "hotspot_rejected");
            None
        }
    }
}
