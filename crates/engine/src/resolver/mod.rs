//! Click resolution, one strategy per interaction scheme.

mod choose_hotspot;
mod choose_interaction;
mod context_sensitive;
mod custom_script;
mod two_tap;

use tracing::debug;

use crate::geometry::Vec3;
use crate::hotspot::{Hotspot, HotspotId, HotspotWorld, IconId, InteractionRef, ItemId};
use crate::indexer::{CursorScope, InteractionSelection};
use crate::input::{CycleDirection, InputEvent};
use crate::services::Inventory;
use crate::settings::{InteractionMethod, InteractionSettings};

pub use choose_hotspot::ChooseHotspotThenInteraction;
pub use choose_interaction::ChooseInteractionThenHotspot;
pub use context_sensitive::ContextSensitive;
pub use custom_script::CustomScriptResolver;
pub use two_tap::TwoTapGate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickAction {
    None,
    SelectHotspot(HotspotId),
    DeselectHotspot,
    OpenInteractionMenu(HotspotId),
    CycleInteraction(CycleDirection),
    RunInteraction {
        hotspot: HotspotId,
        interaction: InteractionRef,
        item: Option<ItemId>,
    },
    WalkOnly(Vec3),
    DeselectItem,
}

impl ClickAction {
    fn run(hotspot: &Hotspot, interaction: InteractionRef, item: Option<ItemId>) -> Self {
        Self::RunInteraction {
            hotspot: hotspot.id(),
            interaction,
            item,
        }
    }
}

#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub settings: &'a InteractionSettings,
    pub world: &'a HotspotWorld,
    pub hotspot: Option<&'a Hotspot>,
    pub inventory: &'a dyn Inventory,
    pub held_item: Option<ItemId>,
    pub event: InputEvent,
    pub cycle: Option<CycleDirection>,
}

impl<'a> ResolveContext<'a> {
    pub fn cursor_scope(&self) -> CursorScope<'a> {
        CursorScope {
            inventory: self.inventory,
            held_item: self.held_item,
            preserve: self.settings.preserve_interaction_index,
        }
    }
}

/// Engine-owned cursor state that resolvers read and advance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_hotspot: Option<HotspotId>,
    pub menu_open_for: Option<HotspotId>,
    pub interaction: InteractionSelection,
    pub cursor_icon: Option<IconId>,
    /// Context-sensitive right-click toggle: the next left click examines.
    pub examine_mode: bool,
}

impl SelectionState {
    pub fn clear_hotspot(&mut self) {
        self.selected_hotspot = None;
        self.menu_open_for = None;
    }
}

pub trait ClickResolver {
    fn scheme(&self) -> InteractionMethod;

    /// Whether the hovered hotspot counts as selected without a click.
    fn hover_selects(&self) -> bool {
        true
    }

    fn resolve(&mut self, context: &ResolveContext<'_>, selection: &mut SelectionState)
        -> ClickAction;

    fn reset(&mut self) {}
}

pub fn build_resolver(settings: &InteractionSettings) -> Box<dyn ClickResolver> {
    let resolver: Box<dyn ClickResolver> = match settings.interaction_method {
        InteractionMethod::ContextSensitive => Box::new(ContextSensitive),
        InteractionMethod::ChooseInteractionThenHotspot => Box::new(ChooseInteractionThenHotspot),
        InteractionMethod::ChooseHotspotThenInteraction => {
            Box::new(ChooseHotspotThenInteraction)
        }
        InteractionMethod::CustomScript => Box::new(CustomScriptResolver),
    };
    if settings.uses_two_tap_touch() {
        Box::new(TwoTapGate::new(resolver))
    } else {
        resolver
    }
}

/// A held item on a hotspot: its combine wins, then the unhandled-inventory
/// fallback, otherwise nothing (or the item is dropped, if configured).
pub(crate) fn resolve_held_item(
    settings: &InteractionSettings,
    hotspot: &Hotspot,
    item: ItemId,
) -> ClickAction {
    if let Some(index) = hotspot.combine_for(item) {
        return ClickAction::run(hotspot, InteractionRef::Inventory(index), Some(item));
    }
    if hotspot.is_interaction_enabled(InteractionRef::UnhandledInventory) {
        return ClickAction::run(hotspot, InteractionRef::UnhandledInventory, Some(item));
    }
    debug!(
        hotspot = hotspot.id().0,
        item = item.0,
        "no_inventory_interaction"
    );
    if settings.deselect_item_on_unhandled {
        ClickAction::DeselectItem
    } else {
        ClickAction::None
    }
}

/// Click over empty space.
pub(crate) fn resolve_empty_click(context: &ResolveContext<'_>) -> ClickAction {
    let settings = context.settings;
    let drops_item = match context.event {
        InputEvent::SingleClick | InputEvent::DoubleClick => settings.empty_click_deselects_item,
        InputEvent::RightClick => settings.right_click_deselects_item,
        InputEvent::None | InputEvent::LetGo => false,
    };
    if context.held_item.is_some() && drops_item {
        ClickAction::DeselectItem
    } else {
        ClickAction::None
    }
}

/// Single-click behaviour shared by the context-sensitive scheme and
/// single-interaction hotspots under choose-hotspot-then-interaction.
pub(crate) fn context_sensitive_click(
    context: &ResolveContext<'_>,
    selection: &SelectionState,
    hotspot: &Hotspot,
) -> ClickAction {
    if let Some(item) = context.held_item {
        return resolve_held_item(context.settings, hotspot, item);
    }
    if selection.examine_mode && hotspot.has_enabled_examine() {
        return ClickAction::run(hotspot, InteractionRef::Examine, None);
    }
    if let Some(index) = hotspot.first_enabled_use() {
        return ClickAction::run(hotspot, InteractionRef::Use(index), None);
    }
    if context.settings.left_click_examine && hotspot.has_enabled_examine() {
        return ClickAction::run(hotspot, InteractionRef::Examine, None);
    }
    if let Some(anchor) = hotspot.walk_anchor() {
        return ClickAction::WalkOnly(anchor);
    }
    debug!(hotspot = hotspot.id().0, "no_enabled_interaction");
    ClickAction::None
}
