//! Drawable Parts
//!
//! World objects export what they look like as a list of `Drawable`s in world
//! space. The renderer knows nothing about ships or projectiles.

use macroquad::color::Color;
use macroquad::math::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    /// Fixed-size textured quad
    Sprite {
        texture: String,
        position: Vec2,
        size: f32,
        angle: f32,
        tint: Color,
    },
    /// Quad stretched along the direction of travel
    Beam {
        texture: String,
        /// Leading end of the beam
        position: Vec2,
        length: f32,
        width: f32,
        angle: f32,
        tint: Color,
    },
    /// Soft light around a point
    Light {
        position: Vec2,
        radius: f32,
        intensity: f32,
        color: Color,
    },
    /// Shield bubble or engine glow
    Glow {
        position: Vec2,
        radius: f32,
        color: Color,
    },
}

impl Drawable {
    pub fn position(&self) -> Vec2 {
        match self {
            Drawable::Sprite { position, .. }
            | Drawable::Beam { position, .. }
            | Drawable::Light { position, .. }
            | Drawable::Glow { position, .. } => *position,
        }
    }
}

/// Length of a stretched beam for one frame of travel, never shorter than wide
pub fn beam_length(speed: f32, time_step: f32, width: f32) -> f32 {
    (speed * time_step).max(width)
}

/// A point light that fades in while its owner keeps working
#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    pub radius: f32,
    pub color: Color,
    pub intensity: f32,
    pub position: Vec2,
    fade_time: f32,
}

impl LightSource {
    pub fn new(radius: f32, color: Color, fade_time: f32) -> Self {
        Self {
            radius,
            color,
            intensity: 0.0,
            position: Vec2::ZERO,
            fade_time,
        }
    }

    pub fn update(&mut self, working: bool, position: Vec2, time_step: f32) {
        self.position = position;
        let delta = if self.fade_time > 0.0 { time_step / self.fade_time } else { 1.0 };
        self.intensity = if working {
            (self.intensity + delta).min(1.0)
        } else {
            (self.intensity - delta).max(0.0)
        };
    }

    pub fn drawable(&self) -> Drawable {
        Drawable::Light {
            position: self.position,
            radius: self.radius,
            intensity: self.intensity,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::color::WHITE;

    #[test]
    fn test_beam_never_shorter_than_width() {
        assert_eq!(beam_length(0.0, 1.0 / 60.0, 0.1), 0.1);
        assert_eq!(beam_length(60.0, 1.0 / 60.0, 0.1), 1.0);
    }

    #[test]
    fn test_light_fades_in_and_follows() {
        let mut light = LightSource::new(0.5, WHITE, 0.1);
        light.update(true, Vec2::new(1.0, 1.0), 0.05);
        assert!(light.intensity > 0.0 && light.intensity < 1.0);
        light.update(true, Vec2::new(2.0, 1.0), 0.1);
        assert_eq!(light.intensity, 1.0);
        assert_eq!(light.drawable().position(), Vec2::new(2.0, 1.0));
    }
}
