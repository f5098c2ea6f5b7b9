mod button;
mod collider;
mod world;

use serde::Deserialize;

use crate::geometry::Vec3;

pub use button::{Button, DispatchTarget, Handler, PlayerAction};
pub use collider::Collider;
pub use world::{Draggable, DraggableId, HotspotWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HotspotId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct ItemId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct IconId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Use,
    Examine,
    Inventory,
}

/// Names one button on a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionRef {
    Use(usize),
    Examine,
    Inventory(usize),
    UnhandledUse,
    UnhandledInventory,
}

impl InteractionRef {
    pub fn kind(self) -> InteractionKind {
        match self {
            Self::Use(_) | Self::UnhandledUse => InteractionKind::Use,
            Self::Examine => InteractionKind::Examine,
            Self::Inventory(_) | Self::UnhandledInventory => InteractionKind::Inventory,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::UnhandledUse | Self::UnhandledInventory)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DoubleClickPolicy {
    #[default]
    None,
    TriggersInstantly,
    MakesPlayerRun,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Region the player must stand inside for the hotspot to be usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractiveBoundary {
    pub center: Vec3,
    pub shape: Collider,
}

impl InteractiveBoundary {
    pub fn contains(&self, point: Vec3) -> bool {
        self.shape.contains_point_3d(self.center, point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconMatch {
    Enabled(usize),
    Disabled,
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub(crate) id: HotspotId,
    pub labels: Vec<String>,
    pub position: Vec3,
    pub collider: Collider,
    pub facing_target: Option<Vec3>,
    pub walk_to_marker: Option<Marker>,
    pub boundary: Option<InteractiveBoundary>,
    pub use_buttons: Vec<Button>,
    pub examine_button: Option<Button>,
    pub inventory_buttons: Vec<Button>,
    pub unhandled_use: Option<Button>,
    pub unhandled_inventory: Option<Button>,
    pub double_click: DoubleClickPolicy,
    pub single_interaction: bool,
    pub(crate) enabled: bool,
    pub(crate) highlighted: bool,
    pub(crate) revision: u64,
    pub(crate) registration_order: u64,
}

impl Hotspot {
    pub fn new(label: impl Into<String>, position: Vec3, collider: Collider) -> Self {
        Self {
            id: HotspotId(0),
            labels: vec![label.into()],
            position,
            collider,
            facing_target: None,
            walk_to_marker: None,
            boundary: None,
            use_buttons: Vec::new(),
            examine_button: None,
            inventory_buttons: Vec::new(),
            unhandled_use: None,
            unhandled_inventory: None,
            double_click: DoubleClickPolicy::None,
            single_interaction: false,
            enabled: true,
            highlighted: false,
            revision: 0,
            registration_order: 0,
        }
    }

    pub fn with_use(mut self, button: Button) -> Self {
        self.use_buttons.push(button);
        self
    }

    pub fn with_examine(mut self, button: Button) -> Self {
        self.examine_button = Some(button);
        self
    }

    pub fn with_inventory(mut self, button: Button) -> Self {
        self.inventory_buttons.push(button);
        self
    }

    pub fn with_unhandled_use(mut self, button: Button) -> Self {
        self.unhandled_use = Some(button);
        self
    }

    pub fn with_unhandled_inventory(mut self, button: Button) -> Self {
        self.unhandled_inventory = Some(button);
        self
    }

    pub fn with_walk_to_marker(mut self, marker: Marker) -> Self {
        self.walk_to_marker = Some(marker);
        self
    }

    pub fn with_facing_target(mut self, facing_target: Vec3) -> Self {
        self.facing_target = Some(facing_target);
        self
    }

    pub fn with_boundary(mut self, boundary: InteractiveBoundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn with_double_click(mut self, policy: DoubleClickPolicy) -> Self {
        self.double_click = policy;
        self
    }

    pub fn with_single_interaction(mut self, single_interaction: bool) -> Self {
        self.single_interaction = single_interaction;
        self
    }

    pub fn id(&self) -> HotspotId {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Bumped whenever any interaction is enabled or disabled.
    pub fn interaction_revision(&self) -> u64 {
        self.revision
    }

    /// Label for `language`, falling back to the original text.
    pub fn display_name(&self, language: usize) -> &str {
        self.labels
            .get(language)
            .filter(|label| !label.is_empty())
            .or_else(|| self.labels.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn facing_position(&self) -> Vec3 {
        self.facing_target.unwrap_or(self.position)
    }

    pub fn button(&self, interaction: InteractionRef) -> Option<&Button> {
        match interaction {
            InteractionRef::Use(index) => self.use_buttons.get(index),
            InteractionRef::Examine => self.examine_button.as_ref(),
            InteractionRef::Inventory(index) => self.inventory_buttons.get(index),
            InteractionRef::UnhandledUse => self.unhandled_use.as_ref(),
            InteractionRef::UnhandledInventory => self.unhandled_inventory.as_ref(),
        }
    }

    /// Item a combine slot is bound to; `None` for every other interaction.
    pub fn interaction_item(&self, interaction: InteractionRef) -> Option<ItemId> {
        match interaction {
            InteractionRef::Inventory(_) => self.button(interaction).and_then(|button| button.item),
            _ => None,
        }
    }

    fn button_mut(&mut self, interaction: InteractionRef) -> Option<&mut Button> {
        match interaction {
            InteractionRef::Use(index) => self.use_buttons.get_mut(index),
            InteractionRef::Examine => self.examine_button.as_mut(),
            InteractionRef::Inventory(index) => self.inventory_buttons.get_mut(index),
            InteractionRef::UnhandledUse => self.unhandled_use.as_mut(),
            InteractionRef::UnhandledInventory => self.unhandled_inventory.as_mut(),
        }
    }

    pub(crate) fn set_interaction_enabled(
        &mut self,
        interaction: InteractionRef,
        enabled: bool,
    ) -> bool {
        let Some(button) = self.button_mut(interaction) else {
            return false;
        };
        if button.enabled != enabled {
            button.enabled = enabled;
            self.revision = self.revision.wrapping_add(1);
        }
        true
    }

    pub fn is_interaction_enabled(&self, interaction: InteractionRef) -> bool {
        self.button(interaction).is_some_and(Button::is_enabled)
    }

    pub fn first_enabled_use(&self) -> Option<usize> {
        self.use_buttons.iter().position(Button::is_enabled)
    }

    pub fn has_enabled_examine(&self) -> bool {
        self.is_interaction_enabled(InteractionRef::Examine)
    }

    pub fn combine_for(&self, item: ItemId) -> Option<usize> {
        self.inventory_buttons
            .iter()
            .position(|button| button.enabled && button.item == Some(item))
    }

    pub fn use_for_icon(&self, icon: IconId) -> IconMatch {
        let mut saw_disabled = false;
        for (index, button) in self.use_buttons.iter().enumerate() {
            if button.icon != Some(icon) {
                continue;
            }
            if button.enabled {
                return IconMatch::Enabled(index);
            }
            saw_disabled = true;
        }
        if saw_disabled {
            IconMatch::Disabled
        } else {
            IconMatch::Missing
        }
    }

    /// True when holding `item` would run something on this hotspot.
    pub fn handles_item(&self, item: ItemId) -> bool {
        self.combine_for(item).is_some()
            || self.is_interaction_enabled(InteractionRef::UnhandledInventory)
    }

    pub fn walk_anchor(&self) -> Option<Vec3> {
        self.walk_to_marker.map(|marker| marker.position)
    }
}
