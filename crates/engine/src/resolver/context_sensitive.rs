use crate::hotspot::InteractionRef;
use crate::input::{CycleDirection, InputEvent};
use crate::settings::InteractionMethod;

use super::{
    context_sensitive_click, resolve_empty_click, ClickAction, ClickResolver, ResolveContext,
    SelectionState,
};

/// Left click runs the most sensible interaction; right click examines or
/// toggles examine mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSensitive;

impl ClickResolver for ContextSensitive {
    fn scheme(&self) -> InteractionMethod {
        InteractionMethod::ContextSensitive
    }

    fn resolve(
        &mut self,
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
    ) -> ClickAction {
        let settings = context.settings;
        match context.event {
            InputEvent::SingleClick | InputEvent::DoubleClick => match context.hotspot {
                Some(hotspot) => context_sensitive_click(context, selection, hotspot),
                None => resolve_empty_click(context),
            },
            InputEvent::RightClick => {
                if context.held_item.is_some() {
                    return resolve_empty_click(context);
                }
                if settings.right_click_cycles_cursor {
                    selection.examine_mode = !selection.examine_mode;
                    return ClickAction::CycleInteraction(CycleDirection::Next);
                }
                match context.hotspot {
                    Some(hotspot) if settings.right_click_examine && hotspot.has_enabled_examine() => {
                        ClickAction::RunInteraction {
                            hotspot: hotspot.id(),
                            interaction: InteractionRef::Examine,
                            item: None,
                        }
                    }
                    _ => ClickAction::None,
                }
            }
            InputEvent::None | InputEvent::LetGo => match context.cycle {
                Some(direction) if settings.right_click_cycles_cursor => {
                    selection.examine_mode = !selection.examine_mode;
                    ClickAction::CycleInteraction(direction)
                }
                _ => ClickAction::None,
            },
        }
    }
}
