use crate::input::InputEvent;
use crate::settings::InteractionMethod;

use super::{resolve_empty_click, ClickAction, ClickResolver, ResolveContext, SelectionState};

/// Clicks only select; game code decides when anything runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomScriptResolver;

impl ClickResolver for CustomScriptResolver {
    fn scheme(&self) -> InteractionMethod {
        InteractionMethod::CustomScript
    }

    fn hover_selects(&self) -> bool {
        false
    }

    fn resolve(
        &mut self,
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
    ) -> ClickAction {
        match (context.event, context.hotspot) {
            (InputEvent::SingleClick | InputEvent::DoubleClick, Some(hotspot)) => {
                if selection.selected_hotspot == Some(hotspot.id()) {
                    ClickAction::None
                } else {
                    ClickAction::SelectHotspot(hotspot.id())
                }
            }
            (InputEvent::SingleClick | InputEvent::DoubleClick | InputEvent::RightClick, None) => {
                let dropped = resolve_empty_click(context);
                if dropped == ClickAction::None && selection.selected_hotspot.is_some() {
                    ClickAction::DeselectHotspot
                } else {
                    dropped
                }
            }
            (InputEvent::RightClick, Some(_)) => resolve_empty_click(context),
            _ => ClickAction::None,
        }
    }
}
