use tracing::debug;

use crate::hotspot::{IconId, IconMatch, InteractionRef};
use crate::input::{CycleDirection, InputEvent};
use crate::settings::{InteractionMethod, InteractionSettings};

use super::{
    resolve_empty_click, resolve_held_item, ClickAction, ClickResolver, ResolveContext,
    SelectionState,
};

/// The player picks a cursor icon first; clicking a hotspot runs the Use
/// interaction carrying that icon.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChooseInteractionThenHotspot;

/// Steps through the icon table. The bare walk cursor (`None`) is part of
/// the cycle when walking is permitted.
pub(crate) fn cycle_cursor_icon(
    settings: &InteractionSettings,
    current: Option<IconId>,
    direction: CycleDirection,
) -> Option<IconId> {
    let mut cycle: Vec<Option<IconId>> = Vec::with_capacity(settings.cursor_icons.len() + 1);
    if settings.allow_walk_cursor {
        cycle.push(None);
    }
    cycle.extend(settings.cursor_icons.iter().map(|icon| Some(icon.id)));
    if cycle.is_empty() {
        return current;
    }
    let count = cycle.len();
    let position = cycle.iter().position(|entry| *entry == current);
    let next = match (position, direction) {
        (Some(index), CycleDirection::Next) => (index + 1) % count,
        (Some(index), CycleDirection::Previous) => (index + count - 1) % count,
        (None, _) => 0,
    };
    cycle[next]
}

impl ClickResolver for ChooseInteractionThenHotspot {
    fn scheme(&self) -> InteractionMethod {
        InteractionMethod::ChooseInteractionThenHotspot
    }

    fn resolve(
        &mut self,
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
    ) -> ClickAction {
        let settings = context.settings;
        match context.event {
            InputEvent::RightClick => {
                if context.held_item.is_some() {
                    return resolve_empty_click(context);
                }
                if settings.right_click_cycles_cursor {
                    selection.cursor_icon =
                        cycle_cursor_icon(settings, selection.cursor_icon, CycleDirection::Next);
                    return ClickAction::CycleInteraction(CycleDirection::Next);
                }
                ClickAction::None
            }
            InputEvent::None | InputEvent::LetGo => match context.cycle {
                Some(direction) if context.held_item.is_none() => {
                    selection.cursor_icon =
                        cycle_cursor_icon(settings, selection.cursor_icon, direction);
                    ClickAction::CycleInteraction(direction)
                }
                _ => ClickAction::None,
            },
            InputEvent::SingleClick | InputEvent::DoubleClick => {
                let Some(hotspot) = context.hotspot else {
                    return resolve_empty_click(context);
                };
                if let Some(item) = context.held_item {
                    return resolve_held_item(settings, hotspot, item);
                }
                let Some(icon) = selection.cursor_icon else {
                    if settings.allow_walk_cursor {
                        return ClickAction::WalkOnly(
                            hotspot.walk_anchor().unwrap_or(hotspot.position),
                        );
                    }
                    return ClickAction::None;
                };
                if settings.examine_icon == Some(icon) && hotspot.has_enabled_examine() {
                    return ClickAction::run(hotspot, InteractionRef::Examine, None);
                }
                match hotspot.use_for_icon(icon) {
                    IconMatch::Enabled(index) => {
                        ClickAction::run(hotspot, InteractionRef::Use(index), None)
                    }
                    IconMatch::Disabled => {
                        debug!(hotspot = hotspot.id().0, icon = icon.0, "interaction_disabled");
                        ClickAction::None
                    }
                    IconMatch::Missing => {
                        if hotspot.is_interaction_enabled(InteractionRef::UnhandledUse) {
                            return ClickAction::run(hotspot, InteractionRef::UnhandledUse, None);
                        }
                        debug!(hotspot = hotspot.id().0, icon = icon.0, "no_interaction_for_icon");
                        ClickAction::None
                    }
                }
            }
        }
    }
}
