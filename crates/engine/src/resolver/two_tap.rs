use crate::hotspot::HotspotId;
use crate::settings::InteractionMethod;

use super::{ClickAction, ClickResolver, ResolveContext, SelectionState};

/// Touch input where the first tap on a hotspot only selects it and a second
/// tap on the same hotspot performs whatever the wrapped scheme decides.
pub struct TwoTapGate {
    inner: Box<dyn ClickResolver>,
    armed: Option<HotspotId>,
}

impl TwoTapGate {
    pub fn new(inner: Box<dyn ClickResolver>) -> Self {
        Self { inner, armed: None }
    }

    pub fn armed(&self) -> Option<HotspotId> {
        self.armed
    }
}

impl ClickResolver for TwoTapGate {
    fn scheme(&self) -> InteractionMethod {
        self.inner.scheme()
    }

    fn hover_selects(&self) -> bool {
        false
    }

    fn resolve(
        &mut self,
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
    ) -> ClickAction {
        if !context.event.is_left_click() {
            return self.inner.resolve(context, selection);
        }
        match context.hotspot {
            Some(hotspot) if self.armed == Some(hotspot.id()) => {
                self.armed = None;
                self.inner.resolve(context, selection)
            }
            Some(hotspot) => {
                self.armed = Some(hotspot.id());
                ClickAction::SelectHotspot(hotspot.id())
            }
            None => {
                self.armed = None;
                self.inner.resolve(context, selection)
            }
        }
    }

    fn reset(&mut self) {
        self.armed = None;
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::ContextSensitive;
    use super::*;
    use crate::hotspot::{Button, Collider, Hotspot, InteractionRef};
    use crate::geometry::Vec3;
    use crate::input::InputEvent;
    use crate::settings::InteractionSettings;

    #[test]
    fn second_tap_on_same_hotspot_performs_action() {
        let settings = InteractionSettings::default();
        let (world, id) = world_with(door());
        let mut gate = TwoTapGate::new(Box::new(ContextSensitive));
        let mut selection = SelectionState::default();
        let tap = context(&settings, &world, Some(id), InputEvent::SingleClick);

        assert_eq!(gate.resolve(&tap, &mut selection), ClickAction::SelectHotspot(id));
        assert_eq!(gate.armed(), Some(id));
        assert!(matches!(
            gate.resolve(&tap, &mut selection),
            ClickAction::RunInteraction {
                interaction: InteractionRef::Use(0),
                ..
            }
        ));
        assert_eq!(gate.armed(), None);
    }

    #[test]
    fn tapping_elsewhere_rearms() {
        let settings = InteractionSettings::default();
        let mut world = crate::hotspot::HotspotWorld::default();
        let first = world.register(door());
        let second = world.register(
            Hotspot::new("Lamp", Vec3::ZERO, Collider::Circle { radius: 0.5 })
                .with_use(Button::new()),
        );
        let mut gate = TwoTapGate::new(Box::new(ContextSensitive));
        let mut selection = SelectionState::default();

        gate.resolve(
            &context(&settings, &world, Some(first), InputEvent::SingleClick),
            &mut selection,
        );
        assert_eq!(
            gate.resolve(
                &context(&settings, &world, Some(second), InputEvent::SingleClick),
                &mut selection
            ),
            ClickAction::SelectHotspot(second)
        );
        gate.reset();
        assert_eq!(gate.armed(), None);
    }
}
