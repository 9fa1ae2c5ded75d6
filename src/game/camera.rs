//! Camera and Map View
//!
//! The game camera tracks the hero ship. The map view has its own zoom that
//! eases toward a target and a pulsing phase for map icons; both run on real
//! time so they keep animating while the game is paused.

use macroquad::math::Vec2;

/// World units visible across the screen height at zoom 1
pub const VIEW_HEIGHT: f32 = 12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GameCamera {
    pub position: Vec2,
    pub zoom: f32,
    /// How quickly the camera catches up, per second
    pub follow_rate: f32,
}

impl Default for GameCamera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            follow_rate: 8.0,
        }
    }
}

impl GameCamera {
    /// Ease toward `target`. A large step snaps straight to it.
    pub fn follow(&mut self, target: Vec2, time_step: f32) {
        let t = (self.follow_rate * time_step).clamp(0.0, 1.0);
        self.position = self.position.lerp(target, t);
    }

    pub fn snap_to(&mut self, target: Vec2) {
        self.position = target;
    }

    /// World-space height of the visible area
    pub fn view_height(&self) -> f32 {
        VIEW_HEIGHT / self.zoom.max(0.01)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub visible: bool,
    pub zoom: f32,
    pub target_zoom: f32,
    /// 0..1, drives map icon blinking
    pub icon_phase: f32,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            visible: false,
            zoom: 1.0,
            target_zoom: 1.0,
            icon_phase: 0.0,
        }
    }
}

const MAP_ZOOM_MIN: f32 = 0.25;
const MAP_ZOOM_MAX: f32 = 4.0;
const MAP_ZOOM_RATE: f32 = 4.0;
const ICON_PERIOD: f32 = 1.2;

impl MapView {
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn zoom_in(&mut self) {
        self.target_zoom = (self.target_zoom * 2.0).min(MAP_ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.target_zoom = (self.target_zoom * 0.5).max(MAP_ZOOM_MIN);
    }

    /// Advance by real (unscaled) time
    pub fn update(&mut self, real_step: f32) {
        let t = (MAP_ZOOM_RATE * real_step).clamp(0.0, 1.0);
        self.zoom += (self.target_zoom - self.zoom) * t;
        if (self.zoom - self.target_zoom).abs() < 1e-3 {
            self.zoom = self.target_zoom;
        }
        self.icon_phase = (self.icon_phase + real_step / ICON_PERIOD).fract();
    }

    /// Icon alpha for the current blink phase
    pub fn icon_alpha(&self) -> f32 {
        0.5 + 0.5 * (self.icon_phase * std::f32::consts::TAU).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_converges() {
        let mut camera = GameCamera::default();
        let target = Vec2::new(10.0, -4.0);
        for _ in 0..200 {
            camera.follow(target, 1.0 / 60.0);
        }
        assert!(camera.position.distance(target) < 1e-3);
    }

    #[test]
    fn test_big_step_snaps() {
        let mut camera = GameCamera::default();
        camera.follow(Vec2::new(3.0, 3.0), 1.0);
        assert_eq!(camera.position, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_map_zoom_eases_and_clamps() {
        let mut map = MapView::default();
        for _ in 0..10 {
            map.zoom_in();
        }
        assert_eq!(map.target_zoom, MAP_ZOOM_MAX);
        map.update(1.0 / 60.0);
        assert!(map.zoom > 1.0 && map.zoom < MAP_ZOOM_MAX);
        for _ in 0..600 {
            map.update(1.0 / 60.0);
        }
        assert_eq!(map.zoom, MAP_ZOOM_MAX);
    }

    #[test]
    fn test_icon_phase_wraps() {
        let mut map = MapView::default();
        map.update(ICON_PERIOD * 1.5);
        assert!((map.icon_phase - 0.5).abs() < 1e-4);
        assert!(map.icon_alpha() < 0.01);
    }
}
