//! Particle step
//!
//! At most `PARTICLE_UPDATES_PER_STEP` particles are advanced per call,
//! starting at a rotating index so large fields are covered round-robin.

use glam::Vec2;
use rand::Rng;

use super::pool::ParticlePool;
use super::state::{DEFAULT_TARGET_SIZE, Particle, ParticleKind, Player};
use crate::config::{ColorRange, ParticleConfig, PlayerMode};
use crate::consts::PARTICLE_UPDATES_PER_STEP;
use crate::{Viewport, direction_and_distance, frame_scale};

/// Contact damage of a hostile particle
pub const HOSTILE_CONTACT_DAMAGE: f32 = 5.0;

const SIZE_SHRINK_PER_STEP: f32 = 0.1;
const ATTRACT_FRICTION: f32 = 0.9;
const RADIAL_FORCE: f32 = 0.6;
const TANGENTIAL_FORCE: f32 = 0.3;
const REPEL_FORCE: f32 = 0.2;
/// Absorption needs the particle inside this fraction of the effective radius
const SUCTION_FRACTION: f32 = 0.2;
/// ...and inside this fraction of the player's body
const CORE_FRACTION: f32 = 0.8;
const EDGE_DAMPING: f32 = 0.8;

/// Aggregates produced by one particle step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleUpdate {
    pub absorbed_xp: u32,
    pub absorbed_count: u32,
    pub powerup_collected: bool,
    pub health_restored: f32,
    pub damage_to_player: f32,
    pub hostile_hits: u32,
    /// Where the next step should start
    pub next_update_index: usize,
}

enum Outcome {
    Keep,
    Absorbed,
    Expired,
}

/// Advance one batch of particles. Absorbed particles are recycled into `pool`.
pub fn update_particles(
    particles: &mut Vec<Particle>,
    player: &Player,
    pool: &mut ParticlePool,
    viewport: &Viewport,
    start_index: usize,
    dt_ms: f32,
) -> ParticleUpdate {
    let mut result = ParticleUpdate {
        next_update_index: start_index,
        ..Default::default()
    };
    let Some(player_pos) = player.pos else {
        return result;
    };
    let len = particles.len();
    if len == 0 {
        result.next_update_index = 0;
        return result;
    }

    let scale = frame_scale(dt_ms);
    let updates = len.min(PARTICLE_UPDATES_PER_STEP);
    let start = start_index % len;

    // Only visited particles can leave, so this stays within one batch
    let mut removed: Vec<(usize, Outcome)> = Vec::new();
    for i in 0..updates {
        let idx = (start + i) % len;
        match step_particle(&mut particles[idx], player, player_pos, viewport, scale, &mut result) {
            Outcome::Keep => {}
            outcome => removed.push((idx, outcome)),
        }
    }

    // Descending order keeps the pending indices valid across swap_remove
    removed.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    for (idx, outcome) in removed {
        let particle = particles.swap_remove(idx);
        if matches!(outcome, Outcome::Absorbed) {
            pool.recycle(particle);
        }
    }

    let next = (start + updates) % len;
    result.next_update_index = if next < particles.len() { next } else { 0 };
    result
}

fn step_particle(
    p: &mut Particle,
    player: &Player,
    player_pos: Vec2,
    viewport: &Viewport,
    scale: f32,
    result: &mut ParticleUpdate,
) -> Outcome {
    if let ParticleKind::Hostile { lifespan_ticks } = &mut p.kind {
        p.pos += p.vel * scale;
        *lifespan_ticks = lifespan_ticks.saturating_sub(1);
        if p.pos.distance(player_pos) < player.size + p.size {
            result.damage_to_player += HOSTILE_CONTACT_DAMAGE;
            result.hostile_hits += 1;
            *lifespan_ticks = 0;
        }
        return if *lifespan_ticks == 0 {
            Outcome::Expired
        } else {
            Outcome::Keep
        };
    }

    if p.size > p.target_size {
        p.size = (p.size - SIZE_SHRINK_PER_STEP).max(p.target_size).max(0.0);
    }

    let (dir, dist) = direction_and_distance(p.pos, player_pos);
    let radius = player.effective_radius();

    if dist < radius {
        let falloff = 1.0 - dist / radius;
        match player.mode {
            PlayerMode::Attract => {
                p.vel *= ATTRACT_FRICTION;
                let tangent = Vec2::new(-dir.y, dir.x);
                p.vel += (dir * RADIAL_FORCE + tangent * TANGENTIAL_FORCE) * falloff * scale;

                if dist < radius * SUCTION_FRACTION && dist < player.size * CORE_FRACTION {
                    match p.kind {
                        ParticleKind::PowerUp => result.powerup_collected = true,
                        ParticleKind::Heal { amount } if amount.is_finite() => {
                            result.health_restored += amount;
                        }
                        _ => {}
                    }
                    result.absorbed_xp += p.xp_value.max(1);
                    result.absorbed_count += 1;
                    return Outcome::Absorbed;
                }
            }
            PlayerMode::Repel => {
                p.vel -= dir * REPEL_FORCE * falloff * scale;
            }
            PlayerMode::Vortex | PlayerMode::Normal => {}
        }
    }

    p.pos += p.vel * scale;

    if p.pos.x < 0.0 || p.pos.x > viewport.width {
        p.vel.x *= -EDGE_DAMPING;
    }
    if p.pos.y < 0.0 || p.pos.y > viewport.height {
        p.vel.y *= -EDGE_DAMPING;
    }

    p.record_trail();
    Outcome::Keep
}

/// Top the field back up when it falls below the configured minimum.
///
/// Returns how many particles were added.
pub fn auto_respawn_particles<R: Rng>(
    particles: &mut Vec<Particle>,
    pool: &mut ParticlePool,
    player_pos: Option<Vec2>,
    viewport: &Viewport,
    colors: &ColorRange,
    config: &ParticleConfig,
    rng: &mut R,
) -> usize {
    if particles.len() >= config.respawn_min_particles {
        return 0;
    }
    for _ in 0..config.respawn_amount {
        let mut p = pool.get_particle(player_pos, None, viewport, colors, config, rng);
        p.size = DEFAULT_TARGET_SIZE;
        p.target_size = DEFAULT_TARGET_SIZE;
        particles.push(p);
    }
    config.respawn_amount
}

/// Add up to `batch` particles toward `target`; returns how many were added
pub fn fill_particles<R: Rng>(
    particles: &mut Vec<Particle>,
    pool: &mut ParticlePool,
    player_pos: Option<Vec2>,
    viewport: &Viewport,
    colors: &ColorRange,
    config: &ParticleConfig,
    target: usize,
    batch: usize,
    rng: &mut R,
) -> usize {
    let missing = target.saturating_sub(particles.len()).min(batch);
    for _ in 0..missing {
        let p = pool.get_particle(player_pos, None, viewport, colors, config, rng);
        particles.push(p);
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use crate::config::{Color, GameConfig, PlayerConfig};
    use crate::consts::SIM_DT_MS;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player_at(pos: Vec2, mode: PlayerMode) -> Player {
        let mut player = Player::from_config(&PlayerConfig::default());
        player.pos = Some(pos);
        player.mode = mode;
        player
    }

    fn particle_at(pos: Vec2, xp_value: u32) -> Particle {
        Particle {
            pos,
            vel: Vec2::ZERO,
            size: 3.0,
            target_size: 3.0,
            color: Color::GOLD,
            xp_value,
            kind: ParticleKind::Xp,
            trail: VecDeque::new(),
        }
    }

    #[test]
    fn test_absorb_at_player_position() {
        let center = Vec2::new(400.0, 300.0);
        let player = player_at(center, PlayerMode::Attract);
        let mut particles = vec![particle_at(center, 5)];
        let mut pool = ParticlePool::default();

        let result = update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 0, SIM_DT_MS);
        assert_eq!(result.absorbed_xp, 5);
        assert_eq!(result.absorbed_count, 1);
        assert!(particles.is_empty());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_repel_never_absorbs() {
        let center = Vec2::new(400.0, 300.0);
        let player = player_at(center, PlayerMode::Repel);
        let mut particles = vec![particle_at(center + Vec2::new(5.0, 0.0), 5)];
        let mut pool = ParticlePool::default();

        let result = update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 0, SIM_DT_MS);
        assert_eq!(result.absorbed_count, 0);
        assert_eq!(particles.len(), 1);
        assert!(particles[0].vel.x > 0.0, "pushed away from the player");
    }

    #[test]
    fn test_attract_pulls_inward() {
        let center = Vec2::new(400.0, 300.0);
        let player = player_at(center, PlayerMode::Attract);
        let mut particles = vec![particle_at(center - Vec2::new(100.0, 0.0), 2)];
        let mut pool = ParticlePool::default();

        update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 0, SIM_DT_MS);
        assert!(particles[0].vel.x > 0.0);
        // Tangential component spins the particle
        assert!(particles[0].vel.y.abs() > 0.0);
    }

    #[test]
    fn test_special_absorption_effects() {
        let center = Vec2::new(400.0, 300.0);
        let player = player_at(center, PlayerMode::Attract);
        let mut power = particle_at(center, 50);
        power.kind = ParticleKind::PowerUp;
        let mut heal = particle_at(center, 0);
        heal.kind = ParticleKind::Heal { amount: 5.0 };
        let mut particles = vec![power, heal];
        let mut pool = ParticlePool::default();

        let result = update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 0, SIM_DT_MS);
        assert!(result.powerup_collected);
        assert_eq!(result.health_restored, 5.0);
        // Heal counts as 1 XP
        assert_eq!(result.absorbed_xp, 51);
        assert!(pool.is_empty(), "specials are not pooled");
    }

    #[test]
    fn test_hostile_hits_and_expires() {
        let center = Vec2::new(400.0, 300.0);
        let player = player_at(center, PlayerMode::Normal);
        let mut hit = particle_at(center, 0);
        hit.kind = ParticleKind::Hostile { lifespan_ticks: 100 };
        let mut fading = particle_at(Vec2::new(10.0, 10.0), 0);
        fading.kind = ParticleKind::Hostile { lifespan_ticks: 1 };
        let mut alive = particle_at(Vec2::new(700.0, 500.0), 0);
        alive.kind = ParticleKind::Hostile { lifespan_ticks: 50 };
        let mut particles = vec![hit, fading, alive];
        let mut pool = ParticlePool::default();

        let result = update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 0, SIM_DT_MS);
        assert_eq!(result.damage_to_player, HOSTILE_CONTACT_DAMAGE);
        assert_eq!(particles.len(), 1);
        assert_eq!(particles[0].kind, ParticleKind::Hostile { lifespan_ticks: 49 });
    }

    #[test]
    fn test_round_robin_batches() {
        let player = player_at(Vec2::new(-5000.0, -5000.0), PlayerMode::Normal);
        let mut particles: Vec<Particle> = (0..250)
            .map(|i| particle_at(Vec2::new(100.0 + i as f32, 100.0), 2))
            .collect();
        let mut pool = ParticlePool::default();
        let vp = Viewport::new(2000.0, 2000.0);

        let r1 = update_particles(&mut particles, &player, &mut pool, &vp, 0, SIM_DT_MS);
        assert_eq!(r1.next_update_index, 100);
        assert_eq!(particles[99].trail.len(), 1);
        assert!(particles[100].trail.is_empty());

        let r2 = update_particles(&mut particles, &player, &mut pool, &vp, r1.next_update_index, SIM_DT_MS);
        assert_eq!(r2.next_update_index, 200);
        let r3 = update_particles(&mut particles, &player, &mut pool, &vp, r2.next_update_index, SIM_DT_MS);
        assert_eq!(r3.next_update_index, 50);
        assert!(particles.iter().all(|p| !p.trail.is_empty()));
    }

    #[test]
    fn test_batch_leaves_the_rest_in_place() {
        let center = Vec2::new(400.0, 300.0);
        let player = player_at(center, PlayerMode::Attract);
        let mut particles: Vec<Particle> = (0..300)
            .map(|i| particle_at(Vec2::new(10.0 + (i % 20) as f32, 10.0 + (i / 20) as f32), 2))
            .collect();
        particles[5] = particle_at(center, 4);
        let before = particles.clone();
        let mut pool = ParticlePool::default();
        let vp = Viewport::default();

        let result = update_particles(&mut particles, &player, &mut pool, &vp, 0, SIM_DT_MS);
        assert_eq!(result.absorbed_count, 1);
        assert_eq!(result.next_update_index, 100);
        assert_eq!(particles.len(), 299);

        // The tail particle fills the absorbed slot untouched
        assert_eq!(particles[5], before[299]);
        // Everything outside the batch is unchanged and in order
        assert_eq!(&particles[100..299], &before[100..299]);
        assert!(particles[..100].iter().enumerate().filter(|(i, _)| *i != 5).all(|(_, p)| p.trail.len() == 1));
    }

    #[test]
    fn test_next_index_wraps_after_tail_removal() {
        let center = Vec2::new(400.0, 300.0);
        let player = player_at(center, PlayerMode::Attract);
        let mut particles: Vec<Particle> = (0..150)
            .map(|i| particle_at(Vec2::new(10.0 + i as f32, 10.0), 2))
            .collect();
        particles[149] = particle_at(center, 4);
        let mut pool = ParticlePool::default();

        let result = update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 100, SIM_DT_MS);
        assert_eq!(result.absorbed_count, 1);
        assert_eq!(particles.len(), 149);
        assert_eq!(result.next_update_index, 50);
    }

    #[test]
    fn test_size_shrinks_to_target() {
        let player = player_at(Vec2::new(-5000.0, -5000.0), PlayerMode::Normal);
        let mut p = particle_at(Vec2::new(100.0, 100.0), 2);
        p.size = 3.05;
        let mut particles = vec![p];
        let mut pool = ParticlePool::default();
        update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 0, SIM_DT_MS);
        assert_eq!(particles[0].size, 3.0);
    }

    #[test]
    fn test_edge_bounce_damps() {
        let player = player_at(Vec2::new(-5000.0, -5000.0), PlayerMode::Normal);
        let mut p = particle_at(Vec2::new(1.0, 100.0), 2);
        p.vel = Vec2::new(-2.0, 0.0);
        let mut particles = vec![p];
        let mut pool = ParticlePool::default();
        update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 0, SIM_DT_MS);
        assert!((particles[0].vel.x - 1.6).abs() < 1e-4);
    }

    #[test]
    fn test_uninitialized_player_is_noop() {
        let player = Player::from_config(&PlayerConfig::default());
        let mut particles = vec![particle_at(Vec2::new(1.0, 1.0), 2)];
        let mut pool = ParticlePool::default();
        let result = update_particles(&mut particles, &player, &mut pool, &Viewport::default(), 7, SIM_DT_MS);
        assert_eq!(result.next_update_index, 7);
        assert!(particles[0].trail.is_empty());
    }

    #[test]
    fn test_auto_respawn_below_minimum() {
        let config = GameConfig::default();
        let colors = config.galaxy_colors(crate::config::GalaxyKind::Classic);
        let mut rng = Pcg32::seed_from_u64(6);
        let mut pool = ParticlePool::default();
        let mut particles = Vec::new();
        let vp = Viewport::new(1600.0, 1200.0);

        let added = auto_respawn_particles(
            &mut particles,
            &mut pool,
            Some(vp.center()),
            &vp,
            &colors,
            &config.particles,
            &mut rng,
        );
        assert_eq!(added, 50);
        assert!(particles.iter().all(|p| p.size == 3.0));

        particles.extend((0..150).map(|_| particle_at(Vec2::ONE, 2)));
        let added = auto_respawn_particles(
            &mut particles,
            &mut pool,
            Some(vp.center()),
            &vp,
            &colors,
            &config.particles,
            &mut rng,
        );
        assert_eq!(added, 0);
    }
}
