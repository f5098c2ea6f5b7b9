use std::collections::HashMap;

use crate::geometry::Vec3;
use crate::hotspot::{
    Button, Collider, DoubleClickPolicy, Hotspot, HotspotId, HotspotWorld, InteractiveBoundary,
    Marker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotspotDefId(pub u32);

/// Hotspot template. Offsets and the boundary are relative to the position
/// the hotspot is spawned at.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotDef {
    pub id: HotspotDefId,
    pub def_name: String,
    pub labels: Vec<String>,
    pub collider: Collider,
    pub facing_offset: Option<Vec3>,
    pub walk_to_marker: Option<Marker>,
    pub boundary: Option<Collider>,
    pub use_buttons: Vec<Button>,
    pub examine_button: Option<Button>,
    pub inventory_buttons: Vec<Button>,
    pub unhandled_use: Option<Button>,
    pub unhandled_inventory: Option<Button>,
    pub double_click: DoubleClickPolicy,
    pub single_interaction: bool,
}

impl HotspotDef {
    pub fn instantiate(&self, position: Vec3) -> Hotspot {
        let label = self.labels.first().cloned().unwrap_or_default();
        let mut hotspot = Hotspot::new(label, position, self.collider)
            .with_double_click(self.double_click)
            .with_single_interaction(self.single_interaction);
        hotspot.labels = self.labels.clone();
        hotspot.facing_target = self.facing_offset.map(|offset| position + offset);
        hotspot.walk_to_marker = self.walk_to_marker.map(|marker| Marker {
            position: position + marker.position,
            forward: marker.forward,
        });
        hotspot.boundary = self.boundary.map(|shape| InteractiveBoundary {
            center: position,
            shape,
        });
        hotspot.use_buttons = self.use_buttons.clone();
        hotspot.examine_button = self.examine_button.clone();
        hotspot.inventory_buttons = self.inventory_buttons.clone();
        hotspot.unhandled_use = self.unhandled_use.clone();
        hotspot.unhandled_inventory = self.unhandled_inventory.clone();
        hotspot
    }
}

#[derive(Debug, Default, Clone)]
pub struct HotspotDefDatabase {
    hotspot_defs: Vec<HotspotDef>,
    hotspot_ids_by_name: HashMap<String, HotspotDefId>,
}

impl HotspotDefDatabase {
    /// Ids follow the order of `hotspot_defs`.
    pub fn from_hotspot_defs(mut hotspot_defs: Vec<HotspotDef>) -> Self {
        let mut hotspot_ids_by_name = HashMap::with_capacity(hotspot_defs.len());
        for (idx, def) in hotspot_defs.iter_mut().enumerate() {
            let id = HotspotDefId(idx as u32);
            def.id = id;
            hotspot_ids_by_name.insert(def.def_name.clone(), id);
        }
        Self {
            hotspot_defs,
            hotspot_ids_by_name,
        }
    }

    pub fn hotspot_def_id_by_name(&self, name: &str) -> Option<HotspotDefId> {
        self.hotspot_ids_by_name.get(name).copied()
    }

    pub fn hotspot_def(&self, id: HotspotDefId) -> Option<&HotspotDef> {
        self.hotspot_defs.get(id.0 as usize)
    }

    pub fn hotspot_defs(&self) -> &[HotspotDef] {
        &self.hotspot_defs
    }

    pub fn len(&self) -> usize {
        self.hotspot_defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspot_defs.is_empty()
    }

    /// Instantiates the named template at `position` and registers it.
    pub fn spawn(
        &self,
        world: &mut HotspotWorld,
        def_name: &str,
        position: Vec3,
    ) -> Option<HotspotId> {
        let id = self.hotspot_def_id_by_name(def_name)?;
        let def = self.hotspot_def(id)?;
        Some(world.register(def.instantiate(position)))
    }
}
