//! Fade-in interpolation for rooms and doors.
//!
//! A fade is sampled, never driven: the owner calls [`Fade::advance`] once
//! per tick with the elapsed time and reads [`Fade::alpha`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fade {
    pub elapsed: f32,
    pub duration: f32,
    pub start_alpha: f32,
}

impl Fade {
    pub fn start(duration: f32, start_alpha: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            start_alpha: start_alpha.clamp(0.0, 1.0),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        if dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Current opacity in `[start_alpha, 1]`. A zero-length fade is fully opaque.
    pub fn alpha(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.start_alpha + self.elapsed / self.duration).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.alpha() >= 1.0
    }
}
