use std::ops::{Add, Mul, Neg, Sub};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length_squared().sqrt()
    }

    pub fn extend(self, z: f32) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const FORWARD: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn truncate(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    pub fn normalize_or_zero(self) -> Vec3 {
        let length = self.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return Vec3::ZERO;
        }
        self * (1.0 / length)
    }

    pub fn is_zero(self) -> bool {
        self.length_squared() <= f32::EPSILON
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn contains(&self, screen_px: Vec2) -> bool {
        screen_px.x >= 0.0
            && screen_px.y >= 0.0
            && screen_px.x <= self.width as f32
            && screen_px.y <= self.height as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

pub const PIXELS_PER_WORLD: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera2D {
    fn pixels_per_world(&self) -> f32 {
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        };
        PIXELS_PER_WORLD * zoom
    }

    /// Screen y grows downward, world y grows upward.
    pub fn screen_to_world(&self, viewport: Viewport, screen_px: Vec2) -> Vec2 {
        let ppw = self.pixels_per_world();
        Vec2 {
            x: (screen_px.x - viewport.width as f32 * 0.5) / ppw + self.position.x,
            y: (viewport.height as f32 * 0.5 - screen_px.y) / ppw + self.position.y,
        }
    }

    pub fn world_to_screen(&self, viewport: Viewport, world: Vec2) -> Vec2 {
        let ppw = self.pixels_per_world();
        Vec2 {
            x: (world.x - self.position.x) * ppw + viewport.width as f32 * 0.5,
            y: viewport.height as f32 * 0.5 - (world.y - self.position.y) * ppw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub vertical_fov_radians: f32,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::FORWARD,
            up: Vec3::UP,
            vertical_fov_radians: std::f32::consts::FRAC_PI_3,
        }
    }
}

impl Camera3D {
    pub fn ray_through_pixel(&self, viewport: Viewport, screen_px: Vec2) -> Ray {
        let width = viewport.width.max(1) as f32;
        let height = viewport.height.max(1) as f32;
        let ndc_x = (screen_px.x / width) * 2.0 - 1.0;
        let ndc_y = 1.0 - (screen_px.y / height) * 2.0;
        let half_height = (self.vertical_fov_radians * 0.5).tan();
        let half_width = half_height * (width / height);

        let forward = self.forward.normalize_or_zero();
        let right = self.up.cross(forward).normalize_or_zero();
        let up = forward.cross(right);
        let direction =
            (forward + right * (ndc_x * half_width) + up * (ndc_y * half_height)).normalize_or_zero();

        Ray {
            origin: self.position,
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneCamera {
    Orthographic(Camera2D),
    Perspective(Camera3D),
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self::Orthographic(Camera2D::default())
    }
}
