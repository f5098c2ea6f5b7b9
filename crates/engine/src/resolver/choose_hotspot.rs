use tracing::debug;

use crate::hotspot::{Hotspot, InteractionRef};
use crate::input::{CycleDirection, InputEvent};
use crate::settings::{InteractionMethod, SeeInteractions, SelectInteractions};

use super::{
    context_sensitive_click, resolve_empty_click, resolve_held_item, ClickAction, ClickResolver,
    ResolveContext, SelectionState,
};

/// The player picks a hotspot first, then one of its interactions from a
/// menu or by cycling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChooseHotspotThenInteraction;

impl ChooseHotspotThenInteraction {
    fn resolve_on_hotspot(
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
        hotspot: &Hotspot,
    ) -> ClickAction {
        let settings = context.settings;
        let event = context.event;

        if event.is_left_click() {
            if let Some(item) = context.held_item {
                return resolve_held_item(settings, hotspot, item);
            }
            if hotspot.single_interaction {
                return context_sensitive_click(context, selection, hotspot);
            }
        }

        match settings.select_interactions {
            SelectInteractions::CyclingCursorAndClickingHotspot => {
                Self::cycle_on_hover(context, selection, hotspot)
            }
            SelectInteractions::CyclingMenuAndClickingHotspot => {
                Self::cycle_on_selection(context, selection, hotspot)
            }
            SelectInteractions::ClickingMenu => Self::clicking_menu(context, selection, hotspot),
        }
    }

    /// Cursor cycling: the hovered hotspot's interactions cycle directly and
    /// a click fires the current one.
    fn cycle_on_hover(
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
        hotspot: &Hotspot,
    ) -> ClickAction {
        let scope = context.cursor_scope();
        selection.interaction.sync(hotspot, scope);
        match context.event {
            InputEvent::SingleClick | InputEvent::DoubleClick => fire_current(selection, hotspot),
            InputEvent::RightClick => {
                if context.held_item.is_some() {
                    return resolve_empty_click(context);
                }
                selection
                    .interaction
                    .advance(hotspot, CycleDirection::Next, scope);
                ClickAction::CycleInteraction(CycleDirection::Next)
            }
            InputEvent::None | InputEvent::LetGo => match context.cycle {
                Some(direction) => {
                    selection.interaction.advance(hotspot, direction, scope);
                    ClickAction::CycleInteraction(direction)
                }
                None => ClickAction::None,
            },
        }
    }

    /// Menu cycling: the first click selects, cycling advances, the next
    /// click on the same hotspot confirms.
    fn cycle_on_selection(
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
        hotspot: &Hotspot,
    ) -> ClickAction {
        let scope = context.cursor_scope();
        let is_selected = selection.selected_hotspot == Some(hotspot.id());
        match context.event {
            InputEvent::SingleClick | InputEvent::DoubleClick if !is_selected => {
                selection.interaction.sync(hotspot, scope);
                ClickAction::SelectHotspot(hotspot.id())
            }
            InputEvent::SingleClick | InputEvent::DoubleClick => {
                selection.interaction.sync(hotspot, scope);
                fire_current(selection, hotspot)
            }
            InputEvent::RightClick if context.held_item.is_some() => resolve_empty_click(context),
            InputEvent::RightClick if is_selected => {
                selection
                    .interaction
                    .advance(hotspot, CycleDirection::Next, scope);
                ClickAction::CycleInteraction(CycleDirection::Next)
            }
            InputEvent::None | InputEvent::LetGo if is_selected => match context.cycle {
                Some(direction) => {
                    selection.interaction.advance(hotspot, direction, scope);
                    ClickAction::CycleInteraction(direction)
                }
                None => ClickAction::None,
            },
            _ => ClickAction::None,
        }
    }

    fn clicking_menu(
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
        hotspot: &Hotspot,
    ) -> ClickAction {
        let settings = context.settings;
        let id = hotspot.id();
        let is_selected = selection.selected_hotspot == Some(id);
        let menu_open = selection.menu_open_for == Some(id);
        match context.event {
            InputEvent::SingleClick | InputEvent::DoubleClick => {
                if !is_selected {
                    return ClickAction::SelectHotspot(id);
                }
                if !menu_open && settings.see_interactions == SeeInteractions::ClickOnHotspot {
                    selection.interaction.sync(hotspot, context.cursor_scope());
                    return ClickAction::OpenInteractionMenu(id);
                }
                ClickAction::None
            }
            InputEvent::None | InputEvent::LetGo => {
                if settings.see_interactions == SeeInteractions::CursorOverHotspot && !menu_open {
                    selection.interaction.sync(hotspot, context.cursor_scope());
                    return ClickAction::OpenInteractionMenu(id);
                }
                ClickAction::None
            }
            InputEvent::RightClick => {
                if context.held_item.is_some() {
                    return resolve_empty_click(context);
                }
                if menu_open {
                    return ClickAction::DeselectHotspot;
                }
                if settings.right_click_examine && hotspot.has_enabled_examine() {
                    return ClickAction::run(hotspot, InteractionRef::Examine, None);
                }
                ClickAction::None
            }
        }
    }
}

fn fire_current(selection: &SelectionState, hotspot: &Hotspot) -> ClickAction {
    match selection.interaction.current(hotspot) {
        Some(interaction) => {
            ClickAction::run(hotspot, interaction, hotspot.interaction_item(interaction))
        }
        None => {
            debug!(hotspot = hotspot.id().0, "no_enabled_interaction");
            ClickAction::None
        }
    }
}

impl ClickResolver for ChooseHotspotThenInteraction {
    fn scheme(&self) -> InteractionMethod {
        InteractionMethod::ChooseHotspotThenInteraction
    }

    fn hover_selects(&self) -> bool {
        false
    }

    fn resolve(
        &mut self,
        context: &ResolveContext<'_>,
        selection: &mut SelectionState,
    ) -> ClickAction {
        if let Some(hotspot) = context.hotspot {
            return Self::resolve_on_hotspot(context, selection, hotspot);
        }

        // Cycling keeps working on the selected hotspot while the pointer is elsewhere.
        if let (Some(direction), Some(selected)) = (context.cycle, selection.selected_hotspot) {
            if context.settings.select_interactions.is_cycling() {
                if let Some(hotspot) = context.world.find(selected) {
                    selection
                        .interaction
                        .advance(hotspot, direction, context.cursor_scope());
                    return ClickAction::CycleInteraction(direction);
                }
            }
        }

        match context.event {
            InputEvent::SingleClick | InputEvent::DoubleClick | InputEvent::RightClick => {
                let dropped = resolve_empty_click(context);
                if dropped != ClickAction::None {
                    return dropped;
                }
                if selection.selected_hotspot.is_some() || selection.menu_open_for.is_some() {
                    return ClickAction::DeselectHotspot;
                }
                ClickAction::None
            }
            InputEvent::None | InputEvent::LetGo => ClickAction::None,
        }
    }
}
