use crate::geometry::Vec3;
use crate::hotspot::{HotspotId, HotspotWorld};
use crate::input::CycleDirection;

/// Tracks which hotspots sit inside a radius around the player.
#[derive(Debug, Clone, Default)]
pub struct VicinityDetector {
    in_range: Vec<HotspotId>,
    cycled: Option<HotspotId>,
}

impl VicinityDetector {
    /// Rebuilds the in-range list, nearest first. Equal distances keep
    /// registration order.
    pub fn update(&mut self, world: &HotspotWorld, player_position: Vec3, radius: f32) {
        let mut in_range: Vec<(f32, u64, HotspotId)> = world
            .hotspots()
            .iter()
            .filter(|hotspot| hotspot.is_enabled())
            .filter_map(|hotspot| {
                let distance = hotspot.position.distance(player_position);
                (distance <= radius).then_some((
                    distance,
                    hotspot.registration_order,
                    hotspot.id(),
                ))
            })
            .collect();
        in_range.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        self.in_range = in_range.into_iter().map(|(_, _, id)| id).collect();

        if self
            .cycled
            .is_some_and(|cycled| !self.in_range.contains(&cycled))
        {
            self.cycled = None;
        }
    }

    pub fn in_range(&self) -> &[HotspotId] {
        &self.in_range
    }

    pub fn nearest(&self) -> Option<HotspotId> {
        self.in_range.first().copied()
    }

    /// The cycled-to hotspot while it stays in range, otherwise the nearest.
    pub fn current(&self) -> Option<HotspotId> {
        self.cycled.or_else(|| self.nearest())
    }

    pub fn cycle(&mut self, direction: CycleDirection) -> Option<HotspotId> {
        let count = self.in_range.len();
        if count == 0 {
            return None;
        }
        let position = self
            .current()
            .and_then(|current| self.in_range.iter().position(|id| *id == current))
            .unwrap_or(0);
        let next = match direction {
            CycleDirection::Next => (position + 1) % count,
            CycleDirection::Previous => (position + count - 1) % count,
        };
        self.cycled = Some(self.in_range[next]);
        self.cycled
    }

    pub fn clear(&mut self) {
        self.in_range.clear();
        self.cycled = None;
    }
}
