//! Decides which hotspot the player is addressing this step.

mod query;
mod validator;
mod vicinity;

use crate::hotspot::{HotspotId, HotspotWorld};
use crate::input::{CycleDirection, InputSnapshot};
use crate::settings::{HotspotDetection, HotspotsInVicinity};

pub use query::{find_candidate, query_2d, query_3d, PointerHit};
pub use validator::{check, validate, Rejection, ValidationContext};
pub use vicinity::VicinityDetector;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub active: Option<HotspotId>,
    pub highlighted: Vec<HotspotId>,
    pub anything_under_pointer: bool,
}

impl Detection {
    fn single(active: Option<HotspotId>, anything_under_pointer: bool) -> Self {
        Self {
            active,
            highlighted: active.into_iter().collect(),
            anything_under_pointer,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HotspotDetector {
    vicinity: VicinityDetector,
    scripted: Option<HotspotId>,
}

impl HotspotDetector {
    /// Hotspot supplied by game code when detection is script-driven.
    pub fn set_scripted_hotspot(&mut self, hotspot: Option<HotspotId>) {
        self.scripted = hotspot;
    }

    pub fn vicinity(&self) -> &VicinityDetector {
        &self.vicinity
    }

    pub fn cycle_vicinity(&mut self, direction: CycleDirection) -> Option<HotspotId> {
        self.vicinity.cycle(direction)
    }

    pub fn reset(&mut self) {
        self.vicinity.clear();
        self.scripted = None;
    }

    pub fn detect(
        &mut self,
        world: &HotspotWorld,
        input: &InputSnapshot,
        context: &ValidationContext<'_>,
    ) -> Detection {
        let settings = context.settings;
        match settings.hotspot_detection {
            HotspotDetection::MouseOver => {
                let hit = find_candidate(world, input, settings);
                Detection::single(
                    validate(world, hit.hotspot, context),
                    hit.anything_under_pointer,
                )
            }
            HotspotDetection::CustomScript => {
                let hit = find_candidate(world, input, settings);
                Detection::single(
                    validate(world, self.scripted, context),
                    hit.anything_under_pointer,
                )
            }
            HotspotDetection::PlayerVicinity => self.detect_vicinity(world, input, context),
        }
    }

    fn detect_vicinity(
        &mut self,
        world: &HotspotWorld,
        input: &InputSnapshot,
        context: &ValidationContext<'_>,
    ) -> Detection {
        let settings = context.settings;
        self.vicinity
            .update(world, context.player_position, settings.vicinity_radius);
        let qualifying: Vec<HotspotId> = self
            .vicinity
            .in_range()
            .iter()
            .copied()
            .filter(|id| validate(world, Some(*id), context).is_some())
            .collect();
        let hit = find_candidate(world, input, settings);

        if settings.hotspots_in_vicinity == HotspotsInVicinity::ShowAll && qualifying.len() > 1 {
            return Detection {
                active: None,
                highlighted: qualifying,
                anything_under_pointer: hit.anything_under_pointer,
            };
        }

        let preferred = match settings.hotspots_in_vicinity {
            HotspotsInVicinity::CycleMultiple => self.vicinity.current(),
            _ => self.vicinity.nearest(),
        };
        let mut candidate = preferred
            .filter(|id| qualifying.contains(id))
            .or_else(|| qualifying.first().copied());

        if settings.vicinity_requires_pointer && candidate != hit.hotspot {
            candidate = None;
        }
        Detection::single(candidate, hit.anything_under_pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Vec2, Vec3, Viewport};
    use crate::hotspot::{Collider, Hotspot};
    use crate::settings::InteractionSettings;

    fn vicinity_settings(policy: HotspotsInVicinity) -> InteractionSettings {
        InteractionSettings {
            hotspot_detection: HotspotDetection::PlayerVicinity,
            hotspots_in_vicinity: policy,
            vicinity_radius: 2.0,
            ..InteractionSettings::default()
        }
    }

    fn two_levers() -> (HotspotWorld, HotspotId, HotspotId) {
        let mut world = HotspotWorld::default();
        let a = world.register(Hotspot::new(
            "lever a",
            Vec3::new(0.5, 0.0, 0.0),
            Collider::Circle { radius: 0.25 },
        ));
        let b = world.register(Hotspot::new(
            "lever b",
            Vec3::new(-1.0, 0.0, 0.0),
            Collider::Circle { radius: 0.25 },
        ));
        (world, a, b)
    }

    fn context(settings: &InteractionSettings) -> ValidationContext<'_> {
        ValidationContext {
            settings,
            player_position: Vec3::ZERO,
            held_item: None,
        }
    }

    #[test]
    fn show_all_highlights_every_candidate_without_activating() {
        let (world, a, b) = two_levers();
        let settings = vicinity_settings(HotspotsInVicinity::ShowAll);
        let mut detector = HotspotDetector::default();
        let detection = detector.detect(&world, &InputSnapshot::empty(), &context(&settings));
        assert_eq!(detection.active, None);
        assert_eq!(detection.highlighted, vec![a, b]);
    }

    #[test]
    fn nearest_only_activates_closest() {
        let (world, a, _) = two_levers();
        let settings = vicinity_settings(HotspotsInVicinity::NearestOnly);
        let mut detector = HotspotDetector::default();
        let detection = detector.detect(&world, &InputSnapshot::empty(), &context(&settings));
        assert_eq!(detection.active, Some(a));
        assert_eq!(detection.highlighted, vec![a]);
    }

    #[test]
    fn cycle_multiple_follows_cycled_hotspot() {
        let (world, _, b) = two_levers();
        let settings = vicinity_settings(HotspotsInVicinity::CycleMultiple);
        let mut detector = HotspotDetector::default();
        detector.detect(&world, &InputSnapshot::empty(), &context(&settings));
        detector.cycle_vicinity(CycleDirection::Next);
        let detection = detector.detect(&world, &InputSnapshot::empty(), &context(&settings));
        assert_eq!(detection.active, Some(b));
    }

    #[test]
    fn requiring_pointer_drops_unpointed_candidate() {
        let (world, a, _) = two_levers();
        let settings = InteractionSettings {
            vicinity_requires_pointer: true,
            ..vicinity_settings(HotspotsInVicinity::NearestOnly)
        };
        let mut detector = HotspotDetector::default();
        let detection = detector.detect(&world, &InputSnapshot::empty(), &context(&settings));
        assert_eq!(detection.active, None);

        let viewport = Viewport::default();
        let camera = crate::geometry::Camera2D::default();
        let over_a = camera.world_to_screen(viewport, Vec2::new(0.5, 0.0));
        let input = InputSnapshot::empty().with_pointer_px(Some(over_a));
        let detection = detector.detect(&world, &input, &context(&settings));
        assert_eq!(detection.active, Some(a));
    }

    #[test]
    fn scripted_detection_uses_supplied_hotspot() {
        let (world, _, b) = two_levers();
        let settings = InteractionSettings {
            hotspot_detection: HotspotDetection::CustomScript,
            ..InteractionSettings::default()
        };
        let mut detector = HotspotDetector::default();
        detector.set_scripted_hotspot(Some(b));
        let detection = detector.detect(&world, &InputSnapshot::empty(), &context(&settings));
        assert_eq!(detection.active, Some(b));
    }
}
