//! Particle reuse pool
//!
//! Absorbed particles are parked here and handed back out by `get_particle`
//! with fresh position, size, color and velocity.

use glam::Vec2;
use rand::Rng;

use super::spawn::create_particle;
use super::state::{DEFAULT_TARGET_SIZE, Particle};
use crate::Viewport;
use crate::config::{ColorRange, ParticleConfig};

/// Parked particles beyond this are dropped
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct ParticlePool {
    free: Vec<Particle>,
    capacity: usize,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }
}

impl ParticlePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }

    /// Park a retired particle; returns false when it was dropped instead
    pub fn recycle(&mut self, particle: Particle) -> bool {
        if !particle.kind.is_poolable() || self.free.len() >= self.capacity {
            return false;
        }
        self.free.push(particle);
        true
    }

    /// Hand out a particle at `at`, or at a random spot away from the player
    pub fn get_particle<R: Rng>(
        &mut self,
        player_pos: Option<Vec2>,
        at: Option<Vec2>,
        viewport: &Viewport,
        colors: &ColorRange,
        config: &ParticleConfig,
        rng: &mut R,
    ) -> Particle {
        let pos = match at {
            Some(pos) => pos,
            None => spawn_position(player_pos, viewport, config, rng),
        };

        match self.free.pop() {
            Some(mut p) => {
                p.pos = pos;
                p.size = rng.random::<f32>() * 4.0 + 2.0;
                p.target_size = DEFAULT_TARGET_SIZE;
                p.color = colors.sample(rng);
                p.vel = Vec2::new(
                    (rng.random::<f32>() - 0.5) * 3.0,
                    (rng.random::<f32>() - 0.5) * 3.0,
                );
                p.trail.clear();
                p
            }
            None => create_particle(pos, colors, rng),
        }
    }
}

fn in_exclusion_zone(pos: Vec2, player: Vec2, padding: f32) -> bool {
    (pos.x - player.x).abs() < padding && (pos.y - player.y).abs() < padding
}

/// Uniform point in the viewport outside the square around the player.
///
/// Sampling gives up after `max_spawn_attempts` and uses the viewport corner
/// farthest from the player.
pub fn spawn_position<R: Rng>(
    player_pos: Option<Vec2>,
    viewport: &Viewport,
    config: &ParticleConfig,
    rng: &mut R,
) -> Vec2 {
    let sample = |rng: &mut R| {
        Vec2::new(
            rng.random::<f32>() * viewport.width,
            rng.random::<f32>() * viewport.height,
        )
    };

    let Some(player) = player_pos else {
        return sample(&mut *rng);
    };

    for _ in 0..config.max_spawn_attempts {
        let pos = sample(&mut *rng);
        if !in_exclusion_zone(pos, player, config.spawn_padding) {
            return pos;
        }
    }

    let corners = [
        Vec2::ZERO,
        Vec2::new(viewport.width, 0.0),
        Vec2::new(0.0, viewport.height),
        Vec2::new(viewport.width, viewport.height),
    ];
    let fallback = corners
        .into_iter()
        .max_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player)))
        .unwrap_or(Vec2::ZERO);
    log::warn!(
        "No particle spawn point outside the player zone after {} attempts, using {:?}",
        config.max_spawn_attempts,
        fallback
    );
    fallback
}
