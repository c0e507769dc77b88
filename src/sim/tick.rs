//! Fixed timestep simulation tick
//!
//! One physics step: runs every update rule in order, then folds the
//! returned aggregates back into the state.

use glam::Vec2;

use super::enemies::update_enemies;
use super::particles::{auto_respawn_particles, update_particles};
use super::progression::{advance_quest, check_galaxy_unlocks, grant_xp, update_wave};
use super::projectiles::{explosion_damage, resolve_projectile_hits, update_explosions, update_projectiles};
use super::state::{GameEvent, GameOverSummary, GameState};
use crate::audio::SoundEffect;
use crate::config::{GameConfig, PlayerMode, QuestKind};

/// Aura ring growth per tick
const AURA_PULSE_STEP: f32 = 2.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Cursor position in screen pixels
    pub player_pos: Option<Vec2>,
    /// Mode change
    pub mode: Option<PlayerMode>,
    /// Spend a full Big Bang charge
    pub activate_big_bang: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Start the Big Bang if fully charged; returns whether it started
pub fn activate_big_bang(state: &mut GameState, config: &GameConfig) -> bool {
    if !state.big_bang.activate(&config.big_bang) {
        return false;
    }
    state.emit(GameEvent::BigBangActivated);
    state.emit(GameEvent::Sound(SoundEffect::Explosion));
    true
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, config: &GameConfig, input: &TickInput, dt: f32) {
    if input.pause && state.game_over.is_none() {
        state.paused = !state.paused;
        log::info!("{}", if state.paused { "Paused" } else { "Resumed" });
    }
    if state.paused || state.game_over.is_some() {
        return;
    }

    if let Some(pos) = input.player_pos {
        state.player.pos = Some(pos);
    }
    if let Some(mode) = input.mode {
        state.player.mode = mode;
    }
    if input.activate_big_bang {
        activate_big_bang(state, config);
    }
    if state.player.pos.is_none() {
        return;
    }

    // Big Bang animation
    let signal = state.big_bang.advance(dt, &config.big_bang);
    if signal.finished {
        log::debug!("Big Bang finished");
    }

    // Player timers
    let player = &mut state.player;
    if player.powered_up && player.power_up_ticks > 0 {
        player.power_up_ticks -= 1;
        if player.power_up_ticks == 0 {
            player.powered_up = false;
        }
    }
    player.invincible_ticks = player.invincible_ticks.saturating_sub(1);

    state.aura_pulse_radius += AURA_PULSE_STEP;
    if state.aura_pulse_radius > state.player.effective_radius() {
        state.aura_pulse_radius = 0.0;
    }

    step_particles(state, config, dt);

    state.time_ticks += 1;
    let interval = config.particles.respawn_check_interval_ticks.max(1);
    if state.time_ticks % interval == 0 {
        let added = auto_respawn_particles(
            &mut state.particles,
            &mut state.pool,
            state.player.pos,
            &state.viewport,
            &state.particle_colors,
            &config.particles,
            &mut state.rng,
        );
        if added > 0 {
            state.emit(GameEvent::Sound(SoundEffect::Respawn));
        }
    }

    let detonations = update_projectiles(&mut state.projectiles, &state.viewport, dt);
    if !detonations.is_empty() {
        state.explosions.extend(detonations);
        state.emit(GameEvent::Sound(SoundEffect::EnemyDefeat));
    }
    update_explosions(&mut state.explosions);

    step_enemies(state, config, dt, signal.pulse);

    update_wave(state, config);

    let hits = resolve_projectile_hits(&mut state.projectiles, &state.player);
    if hits.hits > 0 {
        state.player.take_damage(hits.damage);
        state.emit(GameEvent::Sound(SoundEffect::Hit));
    }
    if !hits.detonations.is_empty() {
        state.explosions.extend(hits.detonations);
        state.emit(GameEvent::Sound(SoundEffect::EnemyDefeat));
    }

    let blast = explosion_damage(&state.explosions, &state.player, dt);
    state.player.take_damage(blast);

    if state.player.health <= 0.0 {
        end_game(state);
    }
}

fn step_particles(state: &mut GameState, config: &GameConfig, dt: f32) {
    let result = update_particles(
        &mut state.particles,
        &state.player,
        &mut state.pool,
        &state.viewport,
        state.last_update_index,
        dt,
    );
    state.last_update_index = result.next_update_index;

    if result.powerup_collected {
        state.player.powered_up = true;
        state.player.power_up_ticks = config.player.power_up_ticks;
        state.emit(GameEvent::Sound(SoundEffect::LevelUp));
    }
    if result.health_restored > 0.0 {
        state.player.heal(result.health_restored);
        state.emit(GameEvent::Sound(SoundEffect::LevelUp));
    }
    if result.hostile_hits > 0 {
        state.player.take_damage(result.damage_to_player);
        state.emit(GameEvent::Sound(SoundEffect::Hit));
    }
    if result.absorbed_count > 0 {
        state.progress.particles_absorbed += result.absorbed_count as u64;
        state.emit(GameEvent::Sound(SoundEffect::Absorb));
        grant_xp(state, result.absorbed_xp, config);
        advance_quest(state, config, QuestKind::AbsorbParticles, result.absorbed_count);
    }
}

fn step_enemies(state: &mut GameState, config: &GameConfig, dt: f32, pulse: bool) {
    let out = update_enemies(
        &mut state.enemies,
        &state.player,
        config,
        &state.viewport,
        dt,
        pulse,
        &mut state.rng,
    );

    if pulse {
        log::info!("Big Bang pulse removed {} enemies", out.removed_by_pulse);
        state.emit(GameEvent::BigBangPulse {
            enemies_removed: out.removed_by_pulse,
        });
    }

    state.projectiles.extend(out.new_projectiles);
    state.explosions.extend(out.new_explosions);
    state.particles.extend(out.hostile_particles);
    state.particles.extend(out.heal_particles);

    if out.contact_hits > 0 && state.player.invincible_ticks == 0 {
        state.player.take_damage(out.damage_to_player);
        state.player.invincible_ticks = state.player.invincibility_cooldown_ticks;
        state.emit(GameEvent::Sound(SoundEffect::Hit));
    }

    state
        .big_bang
        .add_charge(out.big_bang_charge_gained, &config.big_bang);

    if out.enemies_defeated > 0 {
        state.progress.enemies_destroyed += out.enemies_defeated as u64;
        state.emit(GameEvent::Sound(SoundEffect::EnemyDefeat));
        advance_quest(state, config, QuestKind::DefeatEnemies, out.enemies_defeated);
        check_galaxy_unlocks(state, config);
    }

    grant_xp(state, out.xp_gained, config);
}

fn end_game(state: &mut GameState) {
    state.player.health = 0.0;
    if state.game_over.is_some() {
        return;
    }
    let summary = GameOverSummary::from_progress(&state.progress, state.wave.number);
    log::info!(
        "Game over: level {}, wave {}, score {}",
        summary.level,
        summary.wave,
        summary.final_score
    );
    state.game_over = Some(summary.clone());
    state.paused = true;
    state.emit(GameEvent::Sound(SoundEffect::GameOver));
    state.emit(GameEvent::StopMusic);
    state.emit(GameEvent::GameOver(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;
    use crate::config::EnemyKind;
    use crate::consts::SIM_DT_MS;
    use crate::sim::spawn::{SpawnContext, spawn_enemy};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn started(config: &GameConfig, seed: u64) -> GameState {
        let mut state = GameState::new(config, Viewport::default(), seed);
        state.player.pos = Some(state.viewport.center());
        state
    }

    #[test]
    fn test_tick_waits_for_player_position() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, Viewport::default(), 1);
        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.time_ticks, 0);

        let input = TickInput {
            player_pos: Some(Vec2::new(10.0, 10.0)),
            ..Default::default()
        };
        tick(&mut state, &config, &input, SIM_DT_MS);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_tick_pause() {
        let config = GameConfig::default();
        let mut state = started(&config, 12345);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &config, &pause, SIM_DT_MS);
        assert!(state.paused);
        assert_eq!(state.time_ticks, 0);

        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.time_ticks, 0);

        tick(&mut state, &config, &pause, SIM_DT_MS);
        assert!(!state.paused);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_power_up_expires() {
        let config = GameConfig::default();
        let mut state = started(&config, 3);
        state.player.powered_up = true;
        state.player.power_up_ticks = 2;
        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert!(state.player.powered_up);
        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert!(!state.player.powered_up);
    }

    #[test]
    fn test_aura_wraps() {
        let config = GameConfig::default();
        let mut state = started(&config, 3);
        state.aura_pulse_radius = 149.0;
        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.aura_pulse_radius, 0.0);
        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.aura_pulse_radius, 2.0);
    }

    #[test]
    fn test_game_over_fires_once() {
        let config = GameConfig::default();
        let mut state = started(&config, 3);
        state.player.health = 0.5;
        let blast = crate::sim::state::Explosion::new(
            state.viewport.center(),
            100.0,
            crate::config::Color::GOLD,
            10.0,
        );
        state.set_explosions(vec![blast]);
        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.player.health, 0.0);
        let summary = state.game_over.clone().expect("game over");
        assert_eq!(summary.final_score, 50 + 20);

        let events = state.drain_events();
        let count = events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver(_)))
            .count();
        assert_eq!(count, 1);

        tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_lingering_explosion_damages_every_tick() {
        let mut config = GameConfig::default();
        config.particles.respawn_min_particles = 0;
        config.waves.spawn_interval_ticks = u32::MAX;
        let mut state = started(&config, 8);
        let damage = 0.5;
        let blast = crate::sim::state::Explosion::new(
            state.viewport.center() + Vec2::new(20.0, 0.0),
            100.0,
            crate::config::Color::GOLD,
            damage,
        );
        state.set_explosions(vec![blast]);
        let full = state.player.health;
        let per_tick = damage * crate::frame_scale(SIM_DT_MS);

        let live_ticks = crate::sim::state::EXPLOSION_DURATION_TICKS - 1;
        for n in 1..=live_ticks {
            tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
            let expected = full - per_tick * n as f32;
            assert!(
                (state.player.health - expected).abs() < 1e-3,
                "tick {}: {} vs {}",
                n,
                state.player.health,
                expected
            );
        }
        assert_eq!(state.explosions().len(), 1);

        let after_last_hit = state.player.health;
        for _ in 0..10 {
            tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
        }
        assert!(state.explosions().is_empty());
        assert_eq!(state.player.health, after_last_hit);
        assert!(state.game_over.is_none());
    }

    #[test]
    fn test_big_bang_through_tick() {
        let mut config = GameConfig::default();
        config.particles.heal_drop_chance = 0.0;
        let mut state = started(&config, 77);
        let mut rng = Pcg32::seed_from_u64(5);
        let ctx = SpawnContext {
            wave: 1,
            viewport: state.viewport,
        };
        let mut grunt = spawn_enemy(EnemyKind::Fast, &config, &ctx, &mut rng).expect("fast");
        grunt.pos = Vec2::new(-90.0, -90.0);
        grunt.base_speed = 0.0;
        let mut boss = spawn_enemy(EnemyKind::Boss, &config, &ctx, &mut rng).expect("boss");
        boss.pos = Vec2::new(890.0, 690.0);
        boss.base_speed = 0.0;
        boss.burst_cooldown_ms = 1.0e9;
        let boss_max = boss.max_health;
        state.set_enemies(vec![grunt, boss]);
        state.wave.spawned = state.wave.quota;
        state.big_bang.charge = 100.0;

        let input = TickInput {
            activate_big_bang: true,
            ..Default::default()
        };
        tick(&mut state, &config, &input, SIM_DT_MS);
        assert_eq!(state.big_bang.charge, 0.0);
        assert!(state.big_bang.animating);

        let mut pulses = 0;
        for _ in 0..240 {
            tick(&mut state, &config, &TickInput::default(), SIM_DT_MS);
            pulses += state
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::BigBangPulse { .. }))
                .count();
        }
        assert_eq!(pulses, 1);
        assert!(!state.big_bang.animating);
        assert_eq!(state.enemies().len(), 1);
        let boss = &state.enemies()[0];
        assert!(boss.is_boss());
        assert!((boss.health - boss_max * 0.7).abs() < 1e-3);
        assert_eq!(state.big_bang.charge, 0.0);
        assert_eq!(state.progress.enemies_destroyed, 1);
    }

    #[test]
    fn test_determinism() {
        let config = GameConfig::default();
        let mut state1 = started(&config, 99999);
        let mut state2 = started(&config, 99999);
        crate::sim::particles::fill_particles(
            &mut state1.particles,
            &mut state1.pool,
            state1.player.pos,
            &state1.viewport,
            &state1.particle_colors,
            &config.particles,
            300,
            300,
            &mut state1.rng,
        );
        crate::sim::particles::fill_particles(
            &mut state2.particles,
            &mut state2.pool,
            state2.player.pos,
            &state2.viewport,
            &state2.particle_colors,
            &config.particles,
            300,
            300,
            &mut state2.rng,
        );

        for i in 0..600 {
            let input = TickInput {
                player_pos: Some(Vec2::new(400.0 + (i as f32 * 0.05).sin() * 200.0, 300.0)),
                ..Default::default()
            };
            tick(&mut state1, &config, &input, SIM_DT_MS);
            tick(&mut state2, &config, &input, SIM_DT_MS);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.particles().len(), state2.particles().len());
        assert_eq!(state1.enemies().len(), state2.enemies().len());
        assert_eq!(state1.progress, state2.progress);
        assert_eq!(state1.player.health, state2.player.health);
    }
}
