//! Wave and progression state machine
//!
//! Leveling, wave pacing, boss encounters, quests, skills and galaxy unlocks.
//! `check_level_up` is pure; the `apply_*`/`update_*` functions mutate the
//! state and queue events for the host.

use thiserror::Error;

use super::spawn::{SpawnContext, spawn_enemy, spawn_random_enemy};
use super::state::{EncounterPhase, GameEvent, GameState};
use crate::audio::{MusicTrack, SoundEffect};
use crate::config::{
    EnemyKind, GalaxyKind, GameConfig, ProgressionConfig, QuestKind, SkillKind, UnlockCondition,
};

/// Result of a level-up check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelUpOutcome {
    pub new_level: u32,
    pub new_xp: u32,
    pub skill_points_gained: u32,
    pub leveled_up: bool,
    /// Level whose boss should be summoned
    pub boss_to_trigger: Option<u32>,
    pub messages: Vec<String>,
}

/// Resolve pending level-ups for the given XP.
///
/// Levels keep rising while the XP covers `level * xp_per_level`. Every
/// `boss_level_interval`-th level requests a boss. Once a call starts at the
/// max level, XP is pinned and an empty field with no boss fight requests the
/// final boss.
pub fn check_level_up(
    level: u32,
    xp: u32,
    live_enemies: usize,
    boss_fight_active: bool,
    config: &ProgressionConfig,
) -> LevelUpOutcome {
    let mut out = LevelUpOutcome {
        new_level: level,
        new_xp: xp,
        ..Default::default()
    };

    while out.new_level < config.max_level {
        let needed = out.new_level * config.xp_per_level;
        if out.new_xp < needed {
            break;
        }
        out.new_xp -= needed;
        out.new_level += 1;
        out.skill_points_gained += 1;
        out.leveled_up = true;
        out.messages
            .push(format!("Level {} reached! +1 Skill Point", out.new_level));
        if config.boss_level_interval > 0 && out.new_level % config.boss_level_interval == 0 {
            out.boss_to_trigger = Some(out.new_level);
        }
    }

    if level >= config.max_level {
        out.new_xp = level * config.xp_per_level;
        if live_enemies == 0 && !boss_fight_active {
            out.boss_to_trigger = Some(config.max_level);
        }
    }

    out
}

/// Scale raw XP by the skill and global multipliers
pub fn scaled_xp(raw: u32, xp_multiplier: f32, config: &ProgressionConfig) -> u32 {
    let scaled = raw as f32 * xp_multiplier * config.global_xp_multiplier;
    if scaled.is_finite() && scaled > 0.0 {
        scaled.round() as u32
    } else {
        0
    }
}

/// Grant scaled XP and resolve level-ups; returns the XP actually added
pub fn grant_xp(state: &mut GameState, raw: u32, config: &GameConfig) -> u32 {
    if raw == 0 {
        return 0;
    }
    let gained = scaled_xp(raw, state.progress.xp_multiplier, &config.progression);
    state.progress.xp = state.progress.xp.saturating_add(gained);
    apply_level_up(state, config);
    gained
}

/// Run `check_level_up` against the state and apply its outcome
pub fn apply_level_up(state: &mut GameState, config: &GameConfig) {
    let outcome = check_level_up(
        state.progress.level,
        state.progress.xp,
        state.enemies.len(),
        state.wave.boss_fight_active(),
        &config.progression,
    );

    state.progress.level = outcome.new_level;
    state.progress.xp = outcome.new_xp;

    if outcome.leveled_up {
        state.progress.skill_points += outcome.skill_points_gained;
        log::info!("Level up: {}", outcome.new_level);
        for message in outcome.messages {
            state.notify(message);
        }
        state.emit(GameEvent::LevelUp {
            level: outcome.new_level,
        });
        state.emit(GameEvent::Sound(SoundEffect::LevelUp));
        check_galaxy_unlocks(state, config);
    }

    if let Some(level) = outcome.boss_to_trigger {
        trigger_boss_fight(state, config, level);
    }
}

/// Replace the field with the boss for `level`. The field is left alone when
/// the boss type is not configured.
pub fn trigger_boss_fight(state: &mut GameState, config: &GameConfig, level: u32) {
    let max_level = config.progression.max_level;
    let kind = EnemyKind::boss_for_level(level, max_level);
    let ctx = SpawnContext {
        wave: state.wave.number,
        viewport: state.viewport,
    };

    let Some(boss) = spawn_enemy(kind, config, &ctx, &mut state.rng) else {
        log::warn!("Boss type '{}' is not configured", kind.as_key());
        return;
    };
    state.enemies.clear();
    state.enemies.push(boss);
    state.wave.phase = EncounterPhase::BossFight { boss: kind };

    let track = if kind == EnemyKind::FinalBoss {
        MusicTrack::FinalBossTheme
    } else {
        MusicTrack::BossBattle
    };
    log::info!("Boss fight: {} (level {})", kind.as_key(), level);
    state.notify("A BOSS HAS APPEARED!");
    state.emit(GameEvent::BossSpawned { kind });
    state.emit(GameEvent::Music(track));
}

/// Advance wave pacing by one tick
pub fn update_wave(state: &mut GameState, config: &GameConfig) {
    if state.wave.boss_fight_active() {
        if state.enemies.is_empty() {
            state.wave.phase = EncounterPhase::NormalWave;
            log::info!("Boss defeated");
            state.notify("Boss defeated!");
            state.emit(GameEvent::BossDefeated);
            state.emit(GameEvent::Music(MusicTrack::MainTheme));
        }
        return;
    }

    state.wave.timer += 1;

    if state.enemies.is_empty() && state.wave.quota_exhausted() {
        let wave = &mut state.wave;
        wave.number += 1;
        wave.quota = config.waves.quota_for_wave(wave.number);
        wave.spawned = 0;
        wave.timer = 0;
        let number = wave.number;
        log::info!("Wave {} starting ({} enemies)", number, state.wave.quota);
        state.notify(format!("Wave {} starting!", number));
        state.emit(GameEvent::WaveStarted { wave: number });
        advance_quest(state, config, QuestKind::ReachWave, 1);
    } else if !state.wave.quota_exhausted() && state.wave.timer > config.waves.spawn_interval_ticks {
        let ctx = SpawnContext {
            wave: state.wave.number,
            viewport: state.viewport,
        };
        if let Some(enemy) = spawn_random_enemy(config, &ctx, &mut state.rng) {
            state.enemies.push(enemy);
        }
        state.wave.spawned += 1;
        state.wave.timer = 0;
    }
}

/// Add progress to a quest; completion grants its raw XP reward
pub fn advance_quest(state: &mut GameState, config: &GameConfig, kind: QuestKind, amount: u32) {
    let Some(quest) = state.quests.advance(kind, amount) else {
        return;
    };
    log::info!("Quest completed: {}", quest.title);
    state.progress.xp = state.progress.xp.saturating_add(quest.reward);
    state.notify(format!("Quest complete! +{}XP", quest.reward));
    state.emit(GameEvent::QuestCompleted {
        quest: kind,
        reward: quest.reward,
    });
    apply_level_up(state, config);
}

fn unlock_condition_met(condition: UnlockCondition, state: &GameState) -> bool {
    match condition {
        UnlockCondition::Initial => true,
        UnlockCondition::Level(level) => state.progress.level >= level,
        UnlockCondition::EnemiesDestroyed(count) => state.progress.enemies_destroyed >= count,
    }
}

/// Unlock every galaxy whose condition is now met
pub fn check_galaxy_unlocks(state: &mut GameState, config: &GameConfig) {
    for (kind, def) in &config.galaxies {
        if state.galaxies.unlocked.contains(kind) || !unlock_condition_met(def.unlock, state) {
            continue;
        }
        state.galaxies.unlocked.push(*kind);
        log::info!("Galaxy unlocked: {}", def.name);
        state.notify(format!("New galaxy unlocked: {}!", def.name));
        state.emit(GameEvent::GalaxyUnlocked(*kind));
    }
}

/// Switch the active galaxy; new particles use its palette
pub fn select_galaxy(state: &mut GameState, config: &GameConfig, kind: GalaxyKind) -> bool {
    if !state.galaxies.unlocked.contains(&kind) {
        return false;
    }
    state.galaxies.current = kind;
    state.particle_colors = config.galaxy_colors(kind);
    if let Some(def) = config.galaxies.get(&kind) {
        state.notify(format!("Galaxy {} selected!", def.name));
    }
    true
}

/// Why a skill upgrade was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkillError {
    #[error("Unknown skill: {0:?}")]
    Unknown(SkillKind),

    #[error("Requirement not met: {skill:?} level {level}")]
    Locked { skill: SkillKind, level: u32 },

    #[error("Not enough skill points (need {needed}, have {available})")]
    NotEnoughPoints { needed: u32, available: u32 },

    #[error("Max level already reached")]
    MaxLevel,
}

/// Spend skill points on `skill`; returns its new level
pub fn upgrade_skill(
    state: &mut GameState,
    config: &GameConfig,
    skill: SkillKind,
) -> Result<u32, SkillError> {
    let def = config.skills.get(&skill).ok_or(SkillError::Unknown(skill))?;

    if let Some((required, level)) = def.requires {
        if state.progress.skill_level(required) < level {
            return Err(SkillError::Locked {
                skill: required,
                level,
            });
        }
    }
    if state.progress.skill_points < def.cost {
        return Err(SkillError::NotEnoughPoints {
            needed: def.cost,
            available: state.progress.skill_points,
        });
    }
    let current = state.progress.skill_level(skill);
    if current >= def.max_level {
        return Err(SkillError::MaxLevel);
    }

    state.progress.skill_points -= def.cost;
    let new_level = current + 1;
    state.progress.skills.insert(skill, new_level);

    let bonus = def.bonus_per_level;
    let player = &mut state.player;
    match skill {
        SkillKind::HealthBoost => {
            let increase = player.base_max_health * bonus;
            player.max_health += increase;
            player.heal(increase);
        }
        SkillKind::AttractRadius => {
            player.radius = player.base_radius * (1.0 + bonus * new_level as f32);
        }
        SkillKind::VortexPower => {
            player.attraction_damage =
                player.base_attraction_damage * (1.0 + bonus * new_level as f32);
        }
        SkillKind::ParticleMastery => {
            state.progress.xp_multiplier = 1.0 + bonus * new_level as f32;
        }
    }

    log::info!("Skill {:?} upgraded to {}", skill, new_level);
    state.emit(GameEvent::Sound(SoundEffect::LevelUp));
    Ok(new_level)
}
