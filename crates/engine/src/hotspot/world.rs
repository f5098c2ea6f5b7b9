use tracing::debug;

use crate::geometry::{SceneCamera, Vec3};

use super::{Collider, Hotspot, HotspotId, InteractionRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraggableId(pub u64);

/// Non-hotspot physical object that still counts as "something under the pointer".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draggable {
    pub id: DraggableId,
    pub position: Vec3,
    pub collider: Collider,
}

#[derive(Debug, Default)]
struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct HotspotWorld {
    allocator: IdAllocator,
    hotspots: Vec<Hotspot>,
    draggables: Vec<Draggable>,
    next_registration_order: u64,
    camera: SceneCamera,
}

impl HotspotWorld {
    pub fn new(camera: SceneCamera) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn register(&mut self, mut hotspot: Hotspot) -> HotspotId {
        let id = HotspotId(self.allocator.allocate());
        hotspot.id = id;
        hotspot.highlighted = false;
        hotspot.registration_order = self.next_registration_order;
        self.next_registration_order = self.next_registration_order.saturating_add(1);
        debug!(hotspot = id.0, label = hotspot.display_name(0), "hotspot_registered");
        self.hotspots.push(hotspot);
        id
    }

    pub fn unregister(&mut self, id: HotspotId) -> bool {
        let before = self.hotspots.len();
        self.hotspots.retain(|hotspot| hotspot.id != id);
        before != self.hotspots.len()
    }

    pub fn register_draggable(&mut self, position: Vec3, collider: Collider) -> DraggableId {
        let id = DraggableId(self.allocator.allocate());
        self.draggables.push(Draggable {
            id,
            position,
            collider,
        });
        id
    }

    pub fn clear(&mut self) {
        self.hotspots.clear();
        self.draggables.clear();
        self.next_registration_order = 0;
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn draggables(&self) -> &[Draggable] {
        &self.draggables
    }

    pub fn hotspot_count(&self) -> usize {
        self.hotspots.len()
    }

    pub fn find(&self, id: HotspotId) -> Option<&Hotspot> {
        self.hotspots.iter().find(|hotspot| hotspot.id == id)
    }

    pub fn find_mut(&mut self, id: HotspotId) -> Option<&mut Hotspot> {
        self.hotspots.iter_mut().find(|hotspot| hotspot.id == id)
    }

    pub fn contains(&self, id: HotspotId) -> bool {
        self.find(id).is_some()
    }

    pub fn camera(&self) -> &SceneCamera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: SceneCamera) {
        self.camera = camera;
    }

    pub fn set_enabled(&mut self, id: HotspotId, enabled: bool) -> bool {
        let Some(hotspot) = self.find_mut(id) else {
            return false;
        };
        hotspot.enabled = enabled;
        if !enabled {
            hotspot.highlighted = false;
        }
        true
    }

    pub fn set_interaction_enabled(
        &mut self,
        id: HotspotId,
        interaction: InteractionRef,
        enabled: bool,
    ) -> bool {
        self.find_mut(id)
            .is_some_and(|hotspot| hotspot.set_interaction_enabled(interaction, enabled))
    }

    /// Highlights exactly the given hotspots and clears every other flag.
    pub(crate) fn apply_highlights(&mut self, highlighted: &[HotspotId]) {
        for hotspot in &mut self.hotspots {
            hotspot.highlighted = highlighted.contains(&hotspot.id);
        }
    }
}
