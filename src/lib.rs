//! Particle Universe - a real-time particle-survival simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, update rules, wave and Big Bang state machines)
//! - `config`: Baseline gameplay tables
//! - `game`: Simulation context that owns the state and drives collaborators
//! - `highscores`: Score service and leaderboard
//! - `audio`, `collaborators`: Narrow interfaces to the host (sound, rendering, HUD)

pub mod audio;
pub mod collaborators;
pub mod config;
pub mod game;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use config::GameConfig;
pub use game::Game;
pub use highscores::{LeaderboardEntry, ScoreService};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Length of one nominal frame in milliseconds (60 Hz)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Fixed simulation timestep in milliseconds
    pub const SIM_DT_MS: f32 = FRAME_MS;
    /// Largest wall-clock delta accepted per rendered frame (tab resume, debugger pauses)
    pub const MAX_FRAME_DELTA_MS: f64 = 250.0;

    /// Viewport used when the host cannot report one
    pub const FALLBACK_VIEWPORT_WIDTH: f32 = 800.0;
    pub const FALLBACK_VIEWPORT_HEIGHT: f32 = 600.0;

    /// Maximum number of trail points kept per particle
    pub const PARTICLE_TRAIL_LENGTH: usize = 5;
    /// Particles processed per physics step (round-robin)
    pub const PARTICLE_UPDATES_PER_STEP: usize = 100;
}

/// Playable area in screen pixels, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: consts::FALLBACK_VIEWPORT_WIDTH,
            height: consts::FALLBACK_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    /// Build a viewport, falling back to the default size for degenerate input
    pub fn new(width: f32, height: f32) -> Self {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Self { width, height }
        } else {
            log::warn!("Invalid viewport {}x{}, using fallback", width, height);
            Self::default()
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Strictly inside the viewport (edges excluded)
    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x > 0.0 && pos.x < self.width && pos.y > 0.0 && pos.y < self.height
    }

    /// Inside the viewport grown by `margin` on every side
    #[inline]
    pub fn contains_with_margin(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }
}

/// Fraction of a nominal frame covered by `dt_ms`
#[inline]
pub fn frame_scale(dt_ms: f32) -> f32 {
    dt_ms / consts::FRAME_MS
}

/// Unit vector pointing from `from` toward `to` plus the distance between them.
///
/// Coincident points yield a zero direction instead of NaN.
#[inline]
pub fn direction_and_distance(from: Vec2, to: Vec2) -> (Vec2, f32) {
    let delta = to - from;
    let dist = delta.length();
    (delta.normalize_or_zero(), dist)
}
