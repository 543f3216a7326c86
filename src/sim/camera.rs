//! Render camera model
//!
//! The presentation layer owns the real camera; this mirrors its projection
//! so pointer clicks and tracked hands can be turned into world-space queries.

use glam::{Mat4, Vec2, Vec3};

use crate::consts::ROPE_PLANE_Z;
use crate::settings::CameraConfig;

const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// A half-line with unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Ray through `origin` toward `dir` (normalized here)
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Where the ray crosses the plane `z = plane_z`, if it does going forward
    pub fn intersect_plane_z(&self, plane_z: f32) -> Option<Vec3> {
        if self.dir.z.abs() <= f32::EPSILON {
            return None;
        }
        let t = (plane_z - self.origin.z) / self.dir.z;
        (t >= 0.0).then(|| self.at(t))
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    view_proj: Mat4,
    inv_view_proj: Mat4,
    viewport: Vec2,
    mirror_tracking: bool,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let viewport = Vec2::from(config.viewport);
        let aspect = viewport.x / viewport.y;
        let proj = Mat4::perspective_rh(config.fov_y_degrees.to_radians(), aspect, Z_NEAR, Z_FAR);
        let view = Mat4::look_at_rh(Vec3::from(config.eye), Vec3::from(config.target), Vec3::Y);
        let view_proj = proj * view;
        Self {
            view_proj,
            inv_view_proj: view_proj.inverse(),
            viewport,
            mirror_tracking: config.mirror_tracking,
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Pixel coordinates (origin top-left) to normalized device coordinates
    fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            2.0 * screen.x / self.viewport.x - 1.0,
            1.0 - 2.0 * screen.y / self.viewport.y,
        )
    }

    /// Ray from the camera through a pixel
    pub fn screen_ray(&self, screen: Vec2) -> Ray {
        let ndc = self.screen_to_ndc(screen);
        let near = self.inv_view_proj.project_point3(ndc.extend(0.0));
        let far = self.inv_view_proj.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }

    /// Pixel a world point lands on
    pub fn world_to_screen(&self, world: Vec3) -> Vec2 {
        let ndc = self.view_proj.project_point3(world);
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }

    /// Point on the rope plane under a normalized (0..1, origin top-left)
    /// tracking coordinate
    pub fn tracking_to_world(&self, normalized: Vec2) -> Option<Vec3> {
        let x = if self.mirror_tracking { 1.0 - normalized.x } else { normalized.x };
        let screen = Vec2::new(x, normalized.y) * self.viewport;
        self.screen_ray(screen).intersect_plane_z(ROPE_PLANE_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(mirror: bool) -> Camera {
        Camera::new(&CameraConfig {
            mirror_tracking: mirror,
            ..CameraConfig::default()
        })
    }

    #[test]
    fn test_center_ray_hits_target() {
        let cam = camera(false);
        let ray = cam.screen_ray(cam.viewport() * 0.5);
        let hit = ray.intersect_plane_z(0.0).expect("looks at the plane");
        assert!(hit.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-3), "hit {hit}");
    }

    #[test]
    fn test_screen_round_trip() {
        let cam = camera(false);
        let world = Vec3::new(-3.0, 2.5, 0.0);
        let screen = cam.world_to_screen(world);
        let back = cam.screen_ray(screen).intersect_plane_z(0.0).unwrap();
        assert!(back.abs_diff_eq(world, 1e-3), "{world} -> {screen} -> {back}");
    }

    #[test]
    fn test_screen_axes() {
        let cam = camera(false);
        let left = cam.world_to_screen(Vec3::new(-2.0, 1.0, 0.0));
        let up = cam.world_to_screen(Vec3::new(0.0, 3.0, 0.0));
        let center = cam.viewport() * 0.5;
        assert!(left.x < center.x);
        assert!(up.y < center.y, "screen y grows downward");
    }

    #[test]
    fn test_plane_intersection() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 10.0), Vec3::new(0.0, 0.0, -2.0));
        assert!(ray.intersect_plane_z(0.0).unwrap().abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));
        assert!(ray.intersect_plane_z(20.0).is_none());
        let flat = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(flat.intersect_plane_z(1.0).is_none());
    }

    #[test]
    fn test_tracking_mirror() {
        let plain = camera(false).tracking_to_world(Vec2::new(0.25, 0.5)).unwrap();
        let mirrored = camera(true).tracking_to_world(Vec2::new(0.25, 0.5)).unwrap();
        assert!(plain.x < 0.0);
        assert!(mirrored.x > 0.0);
        assert!((plain.x + mirrored.x).abs() < 1e-3);
    }
}
