use crate::geometry::{Ray, Vec2, Vec3};

/// Collision shape centred on its owner's position. 2D shapes live in the
/// xy plane; 3D shapes are axis-aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Rect { half_extents: Vec2 },
    Circle { radius: f32 },
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

impl Collider {
    pub fn contains_point_2d(&self, center: Vec3, point: Vec2) -> bool {
        let local = point - center.truncate();
        match *self {
            Self::Rect { half_extents } => {
                local.x.abs() <= half_extents.x && local.y.abs() <= half_extents.y
            }
            Self::Box { half_extents } => {
                local.x.abs() <= half_extents.x && local.y.abs() <= half_extents.y
            }
            Self::Circle { radius } | Self::Sphere { radius } => {
                local.length_squared() <= radius * radius
            }
        }
    }

    /// Like `contains_point_2d`, but the shape is grown by `padding` on every side.
    pub fn overlaps_circle_2d(&self, center: Vec3, point: Vec2, padding: f32) -> bool {
        let padding = padding.max(0.0);
        let local = point - center.truncate();
        match *self {
            Self::Rect { half_extents } => {
                local.x.abs() <= half_extents.x + padding
                    && local.y.abs() <= half_extents.y + padding
            }
            Self::Box { half_extents } => {
                local.x.abs() <= half_extents.x + padding
                    && local.y.abs() <= half_extents.y + padding
            }
            Self::Circle { radius } | Self::Sphere { radius } => {
                let reach = radius + padding;
                local.length_squared() <= reach * reach
            }
        }
    }

    pub fn contains_point_3d(&self, center: Vec3, point: Vec3) -> bool {
        let local = point - center;
        match *self {
            Self::Rect { half_extents } => {
                local.x.abs() <= half_extents.x && local.y.abs() <= half_extents.y
            }
            Self::Circle { radius } => local.truncate().length_squared() <= radius * radius,
            Self::Box { half_extents } => {
                local.x.abs() <= half_extents.x
                    && local.y.abs() <= half_extents.y
                    && local.z.abs() <= half_extents.z
            }
            Self::Sphere { radius } => local.length_squared() <= radius * radius,
        }
    }

    /// Distance along the ray to the first intersection, if within `max_distance`.
    pub fn ray_hit(&self, center: Vec3, ray: &Ray, max_distance: f32) -> Option<f32> {
        let hit = match *self {
            Self::Sphere { radius } | Self::Circle { radius } => {
                ray_sphere(center, radius, ray)
            }
            Self::Box { half_extents } => ray_aabb(center, half_extents, ray),
            Self::Rect { half_extents } => ray_aabb(
                center,
                Vec3::new(half_extents.x, half_extents.y, 0.0),
                ray,
            ),
        }?;
        (hit <= max_distance).then_some(hit)
    }
}

fn ray_sphere(center: Vec3, radius: f32, ray: &Ray) -> Option<f32> {
    let offset = ray.origin - center;
    let b = offset.dot(ray.direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }
    let far = -b + root;
    (far >= 0.0).then_some(0.0)
}

fn ray_aabb(center: Vec3, half_extents: Vec3, ray: &Ray) -> Option<f32> {
    let min = center - half_extents;
    let max = center + half_extents;
    let mut t_min = 0.0f32;
    let mut t_max = f32::INFINITY;

    for (origin, direction, low, high) in [
        (ray.origin.x, ray.direction.x, min.x, max.x),
        (ray.origin.y, ray.direction.y, min.y, max.y),
        (ray.origin.z, ray.direction.z, min.z, max.z),
    ] {
        if direction.abs() <= f32::EPSILON {
            if origin < low || origin > high {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let (near, far) = {
            let a = (low - origin) * inv;
            let b = (high - origin) * inv;
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };
        t_min = t_min.max(near);
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }

    Some(t_min)
}
