//! Entity factories
//!
//! Pure constructors for enemies, particles and projectiles. Randomness comes
//! from the caller's RNG so a seeded run replays identically.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::state::{
    DEFAULT_TARGET_SIZE, Enemy, Particle, ParticleKind, Projectile, ProjectileEffect,
};
use crate::Viewport;
use crate::config::{Color, ColorRange, EnemyBehavior, EnemyKind, GameConfig, ProjectileKind};

/// Projectile flight speed per nominal frame
pub const PROJECTILE_SPEED: f32 = 5.0;
pub const PROJECTILE_SIZE: f32 = 5.0;
pub const PROJECTILE_DAMAGE: f32 = 10.0;
pub const PROJECTILE_LIFESPAN_TICKS: u32 = 180;
pub const EXPLOSIVE_RADIUS: f32 = 50.0;

/// Hostile burst fired by bosses
pub const HOSTILE_BURST_COUNT: usize = 20;
pub const HOSTILE_BURST_SPEED: f32 = 5.0;
pub const HOSTILE_LIFESPAN_TICKS: u32 = 120;
pub const HOSTILE_SIZE: f32 = 5.0;

/// Chance a fresh particle is a power-up
const POWER_UP_CHANCE: f64 = 0.02;
/// Chance a normal particle is drawn from the full palette instead of the common type
const VARIANT_CHANCE: f64 = 0.2;

/// Inputs enemy spawning depends on besides the config
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub wave: u32,
    pub viewport: Viewport,
}

/// Screen edge an enemy enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    pub fn opposite(self) -> Self {
        match self {
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
            Edge::Top => Edge::Bottom,
            Edge::Bottom => Edge::Top,
        }
    }

    /// Random point `margin` outside this edge
    pub fn point<R: Rng>(self, viewport: &Viewport, margin: f32, rng: &mut R) -> Vec2 {
        match self {
            Edge::Left => Vec2::new(-margin, rng.random::<f32>() * viewport.height),
            Edge::Right => Vec2::new(
                viewport.width + margin,
                rng.random::<f32>() * viewport.height,
            ),
            Edge::Top => Vec2::new(rng.random::<f32>() * viewport.width, -margin),
            Edge::Bottom => Vec2::new(
                rng.random::<f32>() * viewport.width,
                viewport.height + margin,
            ),
        }
    }
}

/// Create an enemy of the given type; `None` when the type is not configured
pub fn spawn_enemy<R: Rng>(
    kind: EnemyKind,
    config: &GameConfig,
    ctx: &SpawnContext,
    rng: &mut R,
) -> Option<Enemy> {
    let def = config.enemy_type(kind)?;
    let sys = &config.enemies;
    let wave = ctx.wave as f32;

    let mut health = def
        .health
        .unwrap_or(sys.base_health + wave * sys.health_increase_per_wave);
    let mut damage = def
        .damage
        .unwrap_or(sys.base_damage + wave * sys.damage_increase_per_wave);
    let mut speed = def.speed.unwrap_or(sys.base_speed);
    let mut radius = def.size.unwrap_or(sys.base_size);

    let elite = kind.is_boss() || rng.random::<f32>() < sys.elite_chance;
    if elite {
        health *= sys.elite_health_multiplier;
        damage *= sys.elite_damage_multiplier;
        speed *= sys.elite_speed_multiplier;
        radius *= sys.elite_size_multiplier;
    }

    let margin = sys.spawn_margin;
    let edge = Edge::ALL[rng.random_range(0..Edge::ALL.len())];
    let pos = edge.point(&ctx.viewport, margin, rng);

    let vel = if def.behavior == EnemyBehavior::CrossScreen {
        let target = edge.opposite().point(&ctx.viewport, margin, rng);
        (target - pos).normalize_or_zero() * speed
    } else {
        Vec2::ZERO
    };

    Some(Enemy {
        kind,
        behavior: def.behavior,
        pos,
        vel,
        base_speed: speed,
        health,
        max_health: health,
        damage,
        radius,
        color: if elite { Color::GOLD } else { def.color },
        elite,
        collision_ticks: 0,
        shoot_cooldown_ms: 0.0,
        burst_cooldown_ms: def.burst_interval_ms.unwrap_or(0.0),
    })
}

/// String-keyed entry point for hosts; unknown keys are a no-op
pub fn spawn_enemy_by_key<R: Rng>(
    key: &str,
    config: &GameConfig,
    ctx: &SpawnContext,
    rng: &mut R,
) -> Option<Enemy> {
    let Some(kind) = EnemyKind::from_key(key) else {
        log::warn!("Unknown enemy type '{}'", key);
        return None;
    };
    spawn_enemy(kind, config, ctx, rng)
}

/// Pick an enemy type using the configured chances as relative weights
pub fn pick_enemy_kind<R: Rng>(config: &GameConfig, rng: &mut R) -> Option<EnemyKind> {
    let weighted: Vec<(EnemyKind, f32)> = config
        .enemies
        .types
        .iter()
        .filter(|(_, def)| def.chance.is_finite() && def.chance > 0.0)
        .map(|(kind, def)| (*kind, def.chance))
        .collect();

    match weighted.choose_weighted(rng, |(_, chance)| *chance) {
        Ok((kind, _)) => Some(*kind),
        Err(e) => {
            log::debug!("Weighted enemy pick failed ({}), using first type", e);
            config.enemies.types.keys().next().copied()
        }
    }
}

/// Spawn an enemy of a randomly weighted type
pub fn spawn_random_enemy<R: Rng>(
    config: &GameConfig,
    ctx: &SpawnContext,
    rng: &mut R,
) -> Option<Enemy> {
    let kind = pick_enemy_kind(config, rng)?;
    spawn_enemy(kind, config, ctx, rng)
}

fn drift_velocity<R: Rng>(rng: &mut R, scale: f32) -> Vec2 {
    Vec2::new(
        (rng.random::<f32>() - 0.5) * scale,
        (rng.random::<f32>() - 0.5) * scale,
    )
}

/// Create a fresh field particle at `pos`
pub fn create_particle<R: Rng>(pos: Vec2, colors: &ColorRange, rng: &mut R) -> Particle {
    let (kind, size, xp_value, color) = if rng.random_bool(POWER_UP_CHANCE) {
        (ParticleKind::PowerUp, 10.0, 50, Color::GOLD)
    } else {
        let color = colors.sample(rng);
        let variant = if rng.random_bool(VARIANT_CHANCE) {
            rng.random_range(0..3)
        } else {
            0
        };
        match variant {
            1 => (ParticleKind::Xp, 5.0, 5, color),
            2 => (ParticleKind::Speed, 2.0, 7, color),
            _ => (ParticleKind::Xp, 3.0, 2, color),
        }
    };

    let speed_scale = if kind == ParticleKind::Speed { 6.0 } else { 3.0 };

    Particle {
        pos,
        vel: drift_velocity(rng, speed_scale),
        size,
        target_size: DEFAULT_TARGET_SIZE,
        color,
        xp_value,
        kind,
        trail: VecDeque::new(),
    }
}

/// Healing drop left by a defeated enemy
pub fn create_heal_particle<R: Rng>(pos: Vec2, amount: f32, rng: &mut R) -> Particle {
    Particle {
        pos,
        vel: drift_velocity(rng, 2.0),
        size: 7.0,
        target_size: 7.0,
        color: Color::LIGHT_GREEN,
        xp_value: 0,
        kind: ParticleKind::Heal { amount },
        trail: VecDeque::new(),
    }
}

/// Radial burst of hostile particles at evenly spaced angles
pub fn create_particle_explosion<R: Rng>(center: Vec2, count: usize, rng: &mut R) -> Vec<Particle> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * TAU;
            let speed = HOSTILE_BURST_SPEED * (rng.random::<f32>() * 0.5 + 0.75);
            Particle {
                pos: center,
                vel: Vec2::from_angle(angle) * speed,
                size: HOSTILE_SIZE,
                target_size: HOSTILE_SIZE,
                color: Color::HOSTILE_RED,
                xp_value: 0,
                kind: ParticleKind::Hostile {
                    lifespan_ticks: HOSTILE_LIFESPAN_TICKS,
                },
                trail: VecDeque::new(),
            }
        })
        .collect()
}

/// Aimed enemy shot from `from` toward `target`
pub fn create_projectile(from: Vec2, target: Vec2, kind: ProjectileKind) -> Projectile {
    let dir = (target - from).normalize_or_zero();
    let (color, effect) = match kind {
        ProjectileKind::Normal => (Color::PROJECTILE_MAGENTA, ProjectileEffect::None),
        ProjectileKind::Explosive => (
            Color::PROJECTILE_ORANGE,
            ProjectileEffect::Explode {
                radius: EXPLOSIVE_RADIUS,
            },
        ),
    };
    Projectile {
        pos: from,
        vel: dir * PROJECTILE_SPEED,
        size: PROJECTILE_SIZE,
        color,
        damage: PROJECTILE_DAMAGE,
        lifespan_ticks: PROJECTILE_LIFESPAN_TICKS,
        effect,
    }
}
