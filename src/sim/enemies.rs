//! Enemy step
//!
//! Cooldowns, deaths, behavior-specific motion, attraction and contact damage
//! and screen containment. Effects on the rest of the world are returned as
//! aggregates instead of being applied here.

use glam::Vec2;
use rand::Rng;

use super::spawn::{HOSTILE_BURST_COUNT, create_heal_particle, create_particle_explosion, create_projectile};
use super::state::{Enemy, Explosion, Particle, Player, Projectile};
use crate::config::{EnemyBehavior, EnemyTypeDef, GameConfig, PlayerMode, ProjectileKind};
use crate::{Viewport, direction_and_distance, frame_scale};

const HOVER_FRICTION: f32 = 0.9;
const DEFAULT_PREFERRED_DISTANCE: f32 = 100.0;
const DEFAULT_SHOOT_DISTANCE: f32 = 200.0;
const DEFAULT_SHOOT_COOLDOWN_MS: f32 = 2000.0;
const SHOOTER_FLEE_FACTOR: f32 = 0.7;
const SHOOTER_APPROACH_FACTOR: f32 = 0.5;
const BOUNCE_DAMPING: f32 = 0.8;
/// Extra slack beyond the spawn margin before a screen-crosser is dropped
const CROSS_SCREEN_SLACK: f32 = 10.0;

/// Aggregates produced by one enemy step
#[derive(Debug, Clone, Default)]
pub struct EnemyUpdate {
    pub new_projectiles: Vec<Projectile>,
    pub new_explosions: Vec<Explosion>,
    /// Boss bursts
    pub hostile_particles: Vec<Particle>,
    pub heal_particles: Vec<Particle>,
    pub damage_to_player: f32,
    pub contact_hits: u32,
    pub xp_gained: u32,
    pub big_bang_charge_gained: f32,
    pub enemies_defeated: u32,
    pub bosses_defeated: u32,
    /// Non-boss enemies killed by a mass-kill pulse
    pub removed_by_pulse: usize,
}

/// Replace a corrupt damage value with the fallback
pub fn sanitize_damage(damage: f32, fallback: f32) -> f32 {
    if damage.is_finite() && damage >= 0.0 {
        damage
    } else if fallback.is_finite() && fallback > 0.0 {
        fallback
    } else {
        1.0
    }
}

/// Advance every enemy by one step.
///
/// With `mass_kill` set, non-boss enemies die outright and bosses lose the
/// configured fraction of max health. Pulse kills, bosses included, go through
/// the normal death pipeline but grant no Big Bang charge.
pub fn update_enemies<R: Rng>(
    enemies: &mut Vec<Enemy>,
    player: &Player,
    config: &GameConfig,
    viewport: &Viewport,
    dt_ms: f32,
    mass_kill: bool,
    rng: &mut R,
) -> EnemyUpdate {
    let mut out = EnemyUpdate::default();
    let Some(player_pos) = player.pos else {
        return out;
    };
    let fallback_def = EnemyTypeDef::default();
    let scale = frame_scale(dt_ms);
    let sys = &config.enemies;

    enemies.retain_mut(|enemy| {
        let def = config.enemy_type(enemy.kind).unwrap_or(&fallback_def);

        enemy.collision_ticks = enemy.collision_ticks.saturating_sub(1);
        if enemy.shoot_cooldown_ms > 0.0 {
            enemy.shoot_cooldown_ms -= dt_ms;
        }

        let mut pulse_kill = false;
        if mass_kill {
            if enemy.is_boss() {
                enemy.health -= enemy.max_health * config.big_bang.boss_damage_fraction;
                pulse_kill = enemy.is_dead();
            } else {
                enemy.health = 0.0;
                pulse_kill = true;
                out.removed_by_pulse += 1;
            }
        }

        if enemy.is_dead() {
            on_enemy_death(enemy, def, config, pulse_kill, &mut out, rng);
            return false;
        }

        if let Some(interval) = def.burst_interval_ms {
            enemy.burst_cooldown_ms -= dt_ms;
            if enemy.burst_cooldown_ms <= 0.0 {
                out.hostile_particles
                    .extend(create_particle_explosion(enemy.pos, HOSTILE_BURST_COUNT, rng));
                enemy.burst_cooldown_ms = interval;
            }
        }

        let (dir, dist) = direction_and_distance(enemy.pos, player_pos);
        apply_behavior(enemy, def, player_pos, dir, dist, &mut out);

        enemy.pos += enemy.vel * scale;

        if player.mode == PlayerMode::Attract && dist < player.radius && !def.ignores_attraction {
            enemy.health -= player.attraction_damage * dt_ms / 1000.0;
        }

        if enemy.pos.distance(player_pos) < enemy.radius + player.size {
            if player.invincible_ticks == 0 {
                out.damage_to_player += sanitize_damage(enemy.damage, sys.base_damage);
                out.contact_hits += 1;
            }
            if enemy.collision_ticks == 0 && !def.ignores_collision {
                enemy.health -= player.collision_damage;
                enemy.collision_ticks = sys.collision_cooldown_ticks;
            }
        }

        if enemy.behavior == EnemyBehavior::CrossScreen {
            let margin = sys.spawn_margin + CROSS_SCREEN_SLACK;
            return viewport.contains_with_margin(enemy.pos, margin);
        }

        bounce(enemy, viewport);
        true
    });

    out
}

fn on_enemy_death<R: Rng>(
    enemy: &Enemy,
    def: &EnemyTypeDef,
    config: &GameConfig,
    pulse_kill: bool,
    out: &mut EnemyUpdate,
    rng: &mut R,
) {
    out.new_explosions.push(Explosion::new(
        enemy.pos,
        enemy.radius * 2.0,
        enemy.color,
        sanitize_damage(enemy.damage, config.enemies.base_damage),
    ));
    out.xp_gained += def.xp_value.unwrap_or(config.enemies.default_xp_value);
    if !pulse_kill {
        out.big_bang_charge_gained += config.big_bang.charge_per_kill;
    }
    out.enemies_defeated += 1;
    if enemy.is_boss() {
        out.bosses_defeated += 1;
    }

    let chance = config.particles.heal_drop_chance.clamp(0.0, 1.0);
    if rng.random_bool(chance) {
        out.heal_particles.push(create_heal_particle(
            enemy.pos,
            config.particles.heal_amount,
            rng,
        ));
    }
    log::debug!("{} defeated at {:?}", enemy.kind.as_key(), enemy.pos);
}

fn apply_behavior(
    enemy: &mut Enemy,
    def: &EnemyTypeDef,
    player_pos: Vec2,
    dir: Vec2,
    dist: f32,
    out: &mut EnemyUpdate,
) {
    match enemy.behavior {
        EnemyBehavior::Hunt => {
            enemy.vel = dir * enemy.base_speed;
        }
        EnemyBehavior::HuntAndShoot => {
            let preferred = def.preferred_distance.unwrap_or(DEFAULT_PREFERRED_DISTANCE);
            if dist > preferred {
                enemy.vel = dir * enemy.base_speed;
            } else {
                enemy.vel *= HOVER_FRICTION;
            }
            try_shoot(enemy, def, player_pos, ProjectileKind::Normal, out);
        }
        EnemyBehavior::Shooter => {
            let keep_away = def.shoot_distance.unwrap_or(DEFAULT_SHOOT_DISTANCE);
            enemy.vel = if dist < keep_away {
                -dir * enemy.base_speed * SHOOTER_FLEE_FACTOR
            } else {
                dir * enemy.base_speed * SHOOTER_APPROACH_FACTOR
            };
            try_shoot(enemy, def, player_pos, ProjectileKind::Explosive, out);
        }
        EnemyBehavior::Stationary => {
            enemy.vel = Vec2::ZERO;
        }
        EnemyBehavior::CrossScreen => {}
    }
}

fn try_shoot(
    enemy: &mut Enemy,
    def: &EnemyTypeDef,
    target: Vec2,
    default_kind: ProjectileKind,
    out: &mut EnemyUpdate,
) {
    if enemy.shoot_cooldown_ms > 0.0 {
        return;
    }
    let kind = def.projectile.unwrap_or(default_kind);
    out.new_projectiles
        .push(create_projectile(enemy.pos, target, kind));
    enemy.shoot_cooldown_ms = def.shoot_cooldown_ms.unwrap_or(DEFAULT_SHOOT_COOLDOWN_MS);
}

fn bounce(enemy: &mut Enemy, viewport: &Viewport) {
    let r = enemy.radius;
    if (enemy.pos.x - r < 0.0 && enemy.vel.x < 0.0)
        || (enemy.pos.x + r > viewport.width && enemy.vel.x > 0.0)
    {
        enemy.vel.x *= -BOUNCE_DAMPING;
    }
    if (enemy.pos.y - r < 0.0 && enemy.vel.y < 0.0)
        || (enemy.pos.y + r > viewport.height && enemy.vel.y > 0.0)
    {
        enemy.vel.y *= -BOUNCE_DAMPING;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Color, EnemyKind, PlayerConfig};
    use crate::consts::SIM_DT_MS;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player_at(pos: Vec2, mode: PlayerMode) -> Player {
        let mut player = Player::from_config(&PlayerConfig::default());
        player.pos = Some(pos);
        player.mode = mode;
        player
    }

    fn enemy(kind: EnemyKind, behavior: EnemyBehavior, pos: Vec2) -> Enemy {
        Enemy {
            kind,
            behavior,
            pos,
            vel: Vec2::ZERO,
            base_speed: 2.0,
            health: 20.0,
            max_health: 20.0,
            damage: 4.0,
            radius: 20.0,
            color: Color::Rgb(0xFF0000),
            elite: false,
            collision_ticks: 0,
            shoot_cooldown_ms: 0.0,
            burst_cooldown_ms: 0.0,
        }
    }

    fn no_heal_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.particles.heal_drop_chance = 0.0;
        config
    }

    #[test]
    fn test_hunter_pursues() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut enemies = vec![enemy(EnemyKind::Fast, EnemyBehavior::Hunt, Vec2::new(100.0, 300.0))];
        let mut rng = Pcg32::seed_from_u64(1);
        update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert!((enemies[0].pos.x - 102.0).abs() < 1e-4);
    }

    #[test]
    fn test_hover_inside_preferred_distance() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut e = enemy(EnemyKind::Hunter, EnemyBehavior::HuntAndShoot, Vec2::new(300.0, 300.0));
        e.vel = Vec2::new(1.0, 0.0);
        let mut enemies = vec![e];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert!((enemies[0].vel.x - 0.9).abs() < 1e-5);
        assert_eq!(out.new_projectiles.len(), 1);
        assert_eq!(enemies[0].shoot_cooldown_ms, 2000.0);

        // Cooldown blocks the next shot
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert!(out.new_projectiles.is_empty());
    }

    #[test]
    fn test_shooter_flees_and_fires_explosive() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut enemies = vec![enemy(EnemyKind::Shooter, EnemyBehavior::Shooter, Vec2::new(300.0, 300.0))];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert!(enemies[0].vel.x < 0.0);
        assert_eq!(out.new_projectiles.len(), 1);
        assert!(matches!(
            out.new_projectiles[0].effect,
            crate::sim::state::ProjectileEffect::Explode { .. }
        ));
    }

    #[test]
    fn test_stationary_and_cross_screen() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut still = enemy(EnemyKind::Fast, EnemyBehavior::Stationary, Vec2::new(100.0, 100.0));
        still.vel = Vec2::new(3.0, 3.0);
        let mut crosser = enemy(EnemyKind::Cosmic, EnemyBehavior::CrossScreen, Vec2::new(100.0, 500.0));
        crosser.vel = Vec2::new(4.0, 0.0);
        let mut enemies = vec![still, crosser];
        let mut rng = Pcg32::seed_from_u64(1);
        update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert_eq!(enemies[0].vel, Vec2::ZERO);
        assert_eq!(enemies[1].vel, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_cross_screen_removed_off_bounds() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut crosser = enemy(EnemyKind::Cosmic, EnemyBehavior::CrossScreen, Vec2::new(909.0, 300.0));
        crosser.vel = Vec2::new(4.5, 0.0);
        let mut enemies = vec![crosser];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert!(enemies.is_empty());
        assert_eq!(out.enemies_defeated, 0);
    }

    #[test]
    fn test_death_pipeline() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut dead = enemy(EnemyKind::Fast, EnemyBehavior::Hunt, Vec2::new(50.0, 50.0));
        dead.health = 0.0;
        let mut enemies = vec![dead];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert!(enemies.is_empty());
        assert_eq!(out.xp_gained, 10);
        assert_eq!(out.enemies_defeated, 1);
        assert_eq!(out.big_bang_charge_gained, config.big_bang.charge_per_kill);
        assert_eq!(out.new_explosions.len(), 1);
        assert_eq!(out.new_explosions[0].radius, 40.0);
    }

    #[test]
    fn test_mass_kill_spares_bosses_and_grants_no_charge() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut boss = enemy(EnemyKind::Boss, EnemyBehavior::Hunt, Vec2::new(700.0, 100.0));
        boss.health = 300.0;
        boss.max_health = 300.0;
        let grunt = enemy(EnemyKind::Fast, EnemyBehavior::Hunt, Vec2::new(100.0, 100.0));
        let mut enemies = vec![boss, grunt];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, true, &mut rng);
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].kind, EnemyKind::Boss);
        assert!((enemies[0].health - 210.0).abs() < 1e-3);
        assert_eq!(out.removed_by_pulse, 1);
        assert_eq!(out.xp_gained, 10);
        assert_eq!(out.big_bang_charge_gained, 0.0);
    }

    #[test]
    fn test_pulse_finishing_a_boss_grants_no_charge() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut boss = enemy(EnemyKind::Boss, EnemyBehavior::Hunt, Vec2::new(700.0, 100.0));
        boss.max_health = 300.0;
        boss.health = 60.0;
        let mut enemies = vec![boss];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, true, &mut rng);
        assert!(enemies.is_empty());
        assert_eq!(out.bosses_defeated, 1);
        assert_eq!(out.enemies_defeated, 1);
        assert_eq!(out.big_bang_charge_gained, 0.0);
        assert_eq!(out.new_explosions.len(), 1);
        // Bosses are not counted as swept away by the pulse
        assert_eq!(out.removed_by_pulse, 0);
    }

    #[test]
    fn test_contact_damage_and_cooldown() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut enemies = vec![enemy(EnemyKind::Fast, EnemyBehavior::Stationary, Vec2::new(410.0, 300.0))];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert_eq!(out.damage_to_player, 4.0);
        assert_eq!(enemies[0].health, 10.0);
        assert_eq!(enemies[0].collision_ticks, 30);

        // Player keeps taking damage, enemy is shielded by its cooldown
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert_eq!(out.damage_to_player, 4.0);
        assert_eq!(enemies[0].health, 10.0);
    }

    #[test]
    fn test_nan_damage_is_sanitized() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut e = enemy(EnemyKind::Fast, EnemyBehavior::Stationary, Vec2::new(400.0, 300.0));
        e.damage = f32::NAN;
        let mut enemies = vec![e];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert_eq!(out.damage_to_player, config.enemies.base_damage);
    }

    #[test]
    fn test_invincible_player_takes_no_contact_damage() {
        let config = no_heal_config();
        let mut player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        player.invincible_ticks = 10;
        let mut enemies = vec![enemy(EnemyKind::Fast, EnemyBehavior::Stationary, Vec2::new(400.0, 300.0))];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert_eq!(out.damage_to_player, 0.0);
    }

    #[test]
    fn test_attraction_damage() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Attract);
        let mut enemies = vec![
            enemy(EnemyKind::Fast, EnemyBehavior::Stationary, Vec2::new(500.0, 300.0)),
            enemy(EnemyKind::Cosmic, EnemyBehavior::Stationary, Vec2::new(300.0, 300.0)),
        ];
        let mut rng = Pcg32::seed_from_u64(1);
        update_enemies(&mut enemies, &player, &config, &Viewport::default(), 1000.0, false, &mut rng);
        assert!((enemies[0].health - 18.0).abs() < 1e-4);
        // Cosmic ignores attraction
        assert_eq!(enemies[1].health, 20.0);
    }

    #[test]
    fn test_boss_bursts_hostile_particles() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(400.0, 300.0), PlayerMode::Normal);
        let mut boss = enemy(EnemyKind::Boss, EnemyBehavior::Hunt, Vec2::new(700.0, 100.0));
        boss.burst_cooldown_ms = 10.0;
        let mut enemies = vec![boss];
        let mut rng = Pcg32::seed_from_u64(1);
        let out = update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert_eq!(out.hostile_particles.len(), HOSTILE_BURST_COUNT);
        assert_eq!(enemies[0].burst_cooldown_ms, 4000.0);
    }

    #[test]
    fn test_bounce_off_edges() {
        let config = no_heal_config();
        let player = player_at(Vec2::new(-500.0, 300.0), PlayerMode::Normal);
        let mut enemies = vec![enemy(EnemyKind::Fast, EnemyBehavior::Hunt, Vec2::new(10.0, 300.0))];
        let mut rng = Pcg32::seed_from_u64(1);
        update_enemies(&mut enemies, &player, &config, &Viewport::default(), SIM_DT_MS, false, &mut rng);
        assert!(enemies[0].vel.x > 0.0);
    }
}
