use std::cmp::Ordering;

use crate::geometry::{Ray, SceneCamera, Vec2, Vec3};
use crate::hotspot::{Hotspot, HotspotId, HotspotWorld};
use crate::input::InputSnapshot;
use crate::settings::{InteractionSettings, OverlapTieBreak, SceneMode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerHit {
    pub hotspot: Option<HotspotId>,
    /// True when any hotspot or draggable sits under the pointer.
    pub anything_under_pointer: bool,
}

/// Finds the hotspot under the pointer, or nothing when the pointer cannot
/// be trusted this step.
pub fn find_candidate(
    world: &HotspotWorld,
    input: &InputSnapshot,
    settings: &InteractionSettings,
) -> PointerHit {
    let Some(pointer_px) = input.pointer_px() else {
        return PointerHit::default();
    };
    if !input.pointer_readable()
        || !input.viewport().contains(pointer_px)
        || input.camera_drag_active()
    {
        return PointerHit::default();
    }
    if input.drag_drop_active() && pointer_px == Vec2::ZERO {
        return PointerHit::default();
    }

    match settings.scene_mode {
        SceneMode::TwoD => {
            let point = pointer_world_2d(world.camera(), input, pointer_px);
            query_2d(world, point, settings)
        }
        SceneMode::ThreeD => {
            let ray = pointer_ray(world.camera(), input, pointer_px);
            query_3d(world, &ray, settings.ray_length)
        }
    }
}

fn pointer_world_2d(camera: &SceneCamera, input: &InputSnapshot, pointer_px: Vec2) -> Vec2 {
    match camera {
        SceneCamera::Orthographic(camera) => camera.screen_to_world(input.viewport(), pointer_px),
        SceneCamera::Perspective(camera) => {
            let ray = camera.ray_through_pixel(input.viewport(), pointer_px);
            if ray.direction.z.abs() <= f32::EPSILON {
                return ray.origin.truncate();
            }
            let distance = -ray.origin.z / ray.direction.z;
            ray.at(distance.max(0.0)).truncate()
        }
    }
}

fn pointer_ray(camera: &SceneCamera, input: &InputSnapshot, pointer_px: Vec2) -> Ray {
    match camera {
        SceneCamera::Perspective(camera) => camera.ray_through_pixel(input.viewport(), pointer_px),
        SceneCamera::Orthographic(camera) => {
            let point = camera.screen_to_world(input.viewport(), pointer_px);
            Ray {
                origin: Vec3::new(point.x, point.y, -1.0e4),
                direction: Vec3::FORWARD,
            }
        }
    }
}

pub fn query_2d(world: &HotspotWorld, point: Vec2, settings: &InteractionSettings) -> PointerHit {
    let padding = settings.pointer_pick_radius;
    let best = world
        .hotspots()
        .iter()
        .filter(|hotspot| hotspot.collider.overlaps_circle_2d(hotspot.position, point, padding))
        .min_by(|a, b| compare_overlap(a, b, point, settings.overlap_tie_break));

    let draggable_hit = world
        .draggables()
        .iter()
        .any(|draggable| draggable.collider.overlaps_circle_2d(draggable.position, point, padding));

    PointerHit {
        hotspot: best.map(Hotspot::id),
        anything_under_pointer: best.is_some() || draggable_hit,
    }
}

fn compare_overlap(a: &Hotspot, b: &Hotspot, point: Vec2, tie_break: OverlapTieBreak) -> Ordering {
    let primary = match tie_break {
        OverlapTieBreak::Nearest => {
            let da = a.position.truncate().distance(point);
            let db = b.position.truncate().distance(point);
            da.total_cmp(&db)
        }
        OverlapTieBreak::Lowest => a.position.y.total_cmp(&b.position.y),
    };
    // Later registrations draw on top.
    primary.then_with(|| b.registration_order.cmp(&a.registration_order))
}

pub fn query_3d(world: &HotspotWorld, ray: &Ray, max_distance: f32) -> PointerHit {
    let best = world
        .hotspots()
        .iter()
        .filter_map(|hotspot| {
            hotspot
                .collider
                .ray_hit(hotspot.position, ray, max_distance)
                .map(|distance| (distance, hotspot))
        })
        .min_by(|(da, a), (db, b)| {
            da.total_cmp(db)
                .then_with(|| b.registration_order.cmp(&a.registration_order))
        });

    let draggable_hit = world.draggables().iter().any(|draggable| {
        draggable
            .collider
            .ray_hit(draggable.position, ray, max_distance)
            .is_some()
    });

    PointerHit {
        hotspot: best.map(|(_, hotspot)| hotspot.id()),
        anything_under_pointer: best.is_some() || draggable_hit,
    }
}
