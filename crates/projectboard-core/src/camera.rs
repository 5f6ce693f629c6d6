//! Viewport pan and zoom.

use crate::config::SessionConfig;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// View transform for the board: world to screen is translate after scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan)
    pub offset: Vec2,
    /// Current zoom factor (1.0 = 100%)
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Factor applied by one zoom step.
    pub zoom_step: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.1,
        }
    }
}

impl Camera {
    /// Camera with the configured limits. Unusable limits fall back to the
    /// defaults so zooming can never panic.
    pub fn from_config(config: &SessionConfig) -> Self {
        let mut camera = Self::default();
        if config.min_zoom > 0.0 && config.min_zoom <= config.max_zoom && config.max_zoom.is_finite()
        {
            camera.min_zoom = config.min_zoom;
            camera.max_zoom = config.max_zoom;
        } else {
            log::warn!(
                "Ignoring zoom limits {}..{}",
                config.min_zoom,
                config.max_zoom
            );
        }
        if config.zoom_step > 0.0 && config.zoom_step.is_finite() {
            camera.zoom_step = config.zoom_step;
        }
        camera
    }

    /// Get the affine transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom keeping the given screen point fixed. Returns whether the zoom
    /// actually changed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) -> bool {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
        true
    }

    /// One zoom step in, anchored at the surface origin.
    pub fn zoom_in(&mut self) -> bool {
        self.zoom_at(Point::ZERO, self.zoom_step)
    }

    /// One zoom step out, anchored at the surface origin.
    pub fn zoom_out(&mut self) -> bool {
        self.zoom_at(Point::ZERO, 1.0 / self.zoom_step)
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_steps() {
        let mut camera = Camera::default();
        assert!(camera.zoom_in());
        assert!((camera.zoom - 1.1).abs() < 1e-12);
        assert!(camera.zoom_out());
        assert!((camera.zoom - 1.0).abs() < 1e-12);
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::default();
        camera.zoom_at(Point::ZERO, 0.001);
        assert!((camera.zoom - camera.min_zoom).abs() < f64::EPSILON);
        assert!(!camera.zoom_out());

        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.zoom - camera.max_zoom).abs() < f64::EPSILON);
        assert!(!camera.zoom_in());
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut camera = Camera::default();
        let anchor = Point::new(200.0, 150.0);
        let world = camera.screen_to_world(anchor);
        camera.zoom_at(anchor, 2.0);
        let back = camera.world_to_screen(world);
        assert!((back - anchor).hypot() < 1e-9);
    }

    #[test]
    fn test_config_limits() {
        let config = SessionConfig {
            max_zoom: 2.0,
            zoom_step: 1.5,
            ..SessionConfig::default()
        };
        let mut camera = Camera::from_config(&config);
        camera.zoom_in();
        camera.zoom_in();
        assert!((camera.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_limits_fall_back() {
        let config = SessionConfig {
            min_zoom: 5.0,
            max_zoom: 1.0,
            zoom_step: f64::NAN,
            ..SessionConfig::default()
        };
        let mut camera = Camera::from_config(&config);
        assert!((camera.min_zoom - 0.1).abs() < f64::EPSILON);
        assert!((camera.max_zoom - 10.0).abs() < f64::EPSILON);
        assert!(camera.zoom_in());
        assert!((camera.zoom - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::default();
        camera.pan(Vec2::new(30.0, -20.0));
        camera.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));
        assert!((back - original).hypot() < 1e-10);
    }
}
