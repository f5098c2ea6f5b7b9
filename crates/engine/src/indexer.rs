use crate::hotspot::{Hotspot, HotspotId, InteractionRef, ItemId};
use crate::input::CycleDirection;
use crate::services::Inventory;

/// Ordered view over a hotspot's enabled Use buttons followed by its enabled
/// inventory-combine buttons for items the player carries. Indices address
/// this filtered list only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionIndexer {
    slots: Vec<InteractionRef>,
}

impl InteractionIndexer {
    pub fn for_hotspot(hotspot: &Hotspot, inventory: &dyn Inventory) -> Self {
        let uses = hotspot
            .use_buttons
            .iter()
            .enumerate()
            .filter(|(_, button)| button.is_enabled())
            .map(|(index, _)| InteractionRef::Use(index));
        let combines = hotspot
            .inventory_buttons
            .iter()
            .enumerate()
            .filter(|(_, button)| {
                button.is_enabled() && button.item.is_some_and(|item| inventory.is_carrying(item))
            })
            .map(|(index, _)| InteractionRef::Inventory(index));
        Self {
            slots: uses.chain(combines).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn first_enabled(&self) -> Option<usize> {
        (!self.slots.is_empty()).then_some(0)
    }

    pub fn next(&self, index: Option<usize>) -> Option<usize> {
        let count = self.slots.len();
        if count == 0 {
            return index;
        }
        match index {
            Some(current) if current < count => Some((current + 1) % count),
            _ => self.first_enabled(),
        }
    }

    pub fn previous(&self, index: Option<usize>) -> Option<usize> {
        let count = self.slots.len();
        if count == 0 {
            return index;
        }
        match index {
            Some(0) => Some(count - 1),
            Some(current) if current < count => Some(current - 1),
            _ => Some(count - 1),
        }
    }

    pub fn step(&self, index: Option<usize>, direction: CycleDirection) -> Option<usize> {
        match direction {
            CycleDirection::Next => self.next(index),
            CycleDirection::Previous => self.previous(index),
        }
    }

    pub fn resolve(&self, index: usize) -> Option<InteractionRef> {
        self.slots.get(index).copied()
    }

    pub fn position_of(&self, interaction: InteractionRef) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == interaction)
    }

    pub fn slots(&self) -> &[InteractionRef] {
        &self.slots
    }
}

/// Signed form used by callers that expect -1 for "no interaction".
pub fn signed_index(index: Option<usize>) -> i64 {
    index.map_or(-1, |value| value as i64)
}

/// What a cursor is computed against besides the hotspot itself.
#[derive(Clone, Copy)]
pub struct CursorScope<'a> {
    pub inventory: &'a dyn Inventory,
    pub held_item: Option<ItemId>,
    pub preserve: bool,
}

impl<'a> CursorScope<'a> {
    pub fn new(inventory: &'a dyn Inventory, preserve: bool) -> Self {
        Self {
            held_item: inventory.selected_item(),
            inventory,
            preserve,
        }
    }
}

/// Persistent cursor into an `InteractionIndexer`. Remembers the hotspot,
/// the held item and the enabled-set revision it was computed against, and
/// the slot list it resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionSelection {
    hotspot: Option<HotspotId>,
    item: Option<ItemId>,
    revision: u64,
    slots: Vec<InteractionRef>,
    index: Option<usize>,
}

impl InteractionSelection {
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn hotspot(&self) -> Option<HotspotId> {
        self.hotspot
    }

    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Re-targets the cursor at `hotspot` and the scope's held item. A
    /// different hotspot or held item resets to the first enabled slot
    /// unless `preserve` is set and the old index still fits; a changed
    /// slot list always resets.
    pub fn sync(&mut self, hotspot: &Hotspot, scope: CursorScope<'_>) -> Option<usize> {
        let indexer = InteractionIndexer::for_hotspot(hotspot, scope.inventory);
        let same_target = self.hotspot == Some(hotspot.id()) && self.item == scope.held_item;
        let same_slots = same_target
            && self.revision == hotspot.interaction_revision()
            && self.slots == indexer.slots();
        let index_valid = self.index.is_some_and(|index| index < indexer.len());

        if !same_slots || !index_valid {
            let keep = !same_target && scope.preserve && index_valid;
            if !keep {
                self.index = indexer.first_enabled();
            }
        }
        self.hotspot = Some(hotspot.id());
        self.item = scope.held_item;
        self.revision = hotspot.interaction_revision();
        self.slots = indexer.slots;
        self.index
    }

    pub fn advance(&mut self, hotspot: &Hotspot, direction: CycleDirection, scope: CursorScope<'_>) {
        self.sync(hotspot, scope);
        let indexer = InteractionIndexer {
            slots: self.slots.clone(),
        };
        self.index = indexer.step(self.index, direction);
    }

    pub fn set(&mut self, hotspot: &Hotspot, scope: CursorScope<'_>, index: Option<usize>) {
        self.sync(hotspot, scope);
        self.index = index.filter(|index| *index < self.slots.len());
    }

    pub fn current(&self, hotspot: &Hotspot) -> Option<InteractionRef> {
        self.slot(hotspot, self.index?)
    }

    /// Interaction at `index` of the slot list last synced for `hotspot`.
    pub fn slot(&self, hotspot: &Hotspot, index: usize) -> Option<InteractionRef> {
        if self.hotspot != Some(hotspot.id()) || self.revision != hotspot.interaction_revision() {
            return None;
        }
        self.slots.get(index).copied()
    }
}
