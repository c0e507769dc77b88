//! Game state and core simulation types
//!
//! `GameState` is the single container that owns every entity collection.
//! Only the physics step (and the functions it calls) mutate it; hosts read
//! it after the step completes.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::big_bang::BigBang;
use super::pool::ParticlePool;
use crate::Viewport;
use crate::audio::{MusicTrack, SoundEffect};
use crate::config::{
    Color, ColorRange, EnemyBehavior, EnemyKind, GalaxyKind, GameConfig, PlayerConfig,
    PlayerMode, QuestKind, SkillKind,
};
use crate::consts::PARTICLE_TRAIL_LENGTH;

/// The player-controlled attractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// `None` until the host places the cursor
    pub pos: Option<Vec2>,
    pub mode: PlayerMode,
    pub base_radius: f32,
    /// Interaction radius after skill bonuses
    pub radius: f32,
    /// Body (hitbox) radius
    pub size: f32,
    pub health: f32,
    pub base_max_health: f32,
    pub max_health: f32,
    pub collision_damage: f32,
    pub base_attraction_damage: f32,
    pub attraction_damage: f32,
    pub powered_up: bool,
    pub power_up_ticks: u32,
    pub invincible_ticks: u32,
    pub invincibility_cooldown_ticks: u32,
}

impl Player {
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            pos: None,
            mode: config.mode,
            base_radius: config.radius,
            radius: config.radius,
            size: config.size,
            health: config.max_health,
            base_max_health: config.max_health,
            max_health: config.max_health,
            collision_damage: config.collision_damage,
            base_attraction_damage: config.attraction_damage,
            attraction_damage: config.attraction_damage,
            powered_up: false,
            power_up_ticks: 0,
            invincible_ticks: 0,
            invincibility_cooldown_ticks: config.invincibility_cooldown_ticks,
        }
    }

    /// Interaction radius, boosted while powered up
    #[inline]
    pub fn effective_radius(&self) -> f32 {
        if self.powered_up {
            self.radius * 1.5
        } else {
            self.radius
        }
    }

    /// Subtract health, keeping it in `[0, max_health]`
    pub fn take_damage(&mut self, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
    }

    pub fn heal(&mut self, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Recent position kept for rendering trails
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub size: f32,
}

/// Particle variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Plain XP particle
    Xp,
    /// Fast-moving XP particle
    Speed,
    /// Powers the player up when absorbed
    PowerUp,
    /// Restores health when absorbed
    Heal { amount: f32 },
    /// Boss burst fragment; damages the player and expires
    Hostile { lifespan_ticks: u32 },
}

impl ParticleKind {
    /// Plain particles go back to the pool; one-shot specials are dropped
    pub fn is_poolable(&self) -> bool {
        matches!(self, ParticleKind::Xp | ParticleKind::Speed)
    }
}

/// A particle in the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Size shrinks toward this value
    pub target_size: f32,
    pub color: Color,
    pub xp_value: u32,
    pub kind: ParticleKind,
    /// Oldest first, at most `PARTICLE_TRAIL_LENGTH` entries
    pub trail: VecDeque<TrailPoint>,
}

/// Size normal particles settle at
pub const DEFAULT_TARGET_SIZE: f32 = 3.0;

impl Particle {
    /// Record current position to trail (call each update)
    pub fn record_trail(&mut self) {
        self.trail.push_back(TrailPoint {
            pos: self.pos,
            size: self.size,
        });
        if self.trail.len() > PARTICLE_TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self.kind, ParticleKind::Hostile { .. })
    }
}

/// An enemy entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub behavior: EnemyBehavior,
    pub pos: Vec2,
    pub vel: Vec2,
    pub base_speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Contact damage dealt to the player
    pub damage: f32,
    pub radius: f32,
    pub color: Color,
    pub elite: bool,
    /// Ticks until player contact can hurt this enemy again
    pub collision_ticks: u32,
    pub shoot_cooldown_ms: f32,
    pub burst_cooldown_ms: f32,
}

impl Enemy {
    pub fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// What happens when a projectile dies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileEffect {
    None,
    Explode { radius: f32 },
}

/// An enemy shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub color: Color,
    pub damage: f32,
    pub lifespan_ticks: u32,
    pub effect: ProjectileEffect,
}

impl Projectile {
    /// Blast left behind when this projectile dies, if any
    pub fn detonation(&self) -> Option<Explosion> {
        match self.effect {
            ProjectileEffect::Explode { radius } => Some(Explosion::new(
                self.pos,
                radius,
                self.color,
                self.damage,
            )),
            ProjectileEffect::None => None,
        }
    }
}

/// Explosions linger for this many ticks
pub const EXPLOSION_DURATION_TICKS: u32 = 30;

/// A lingering blast zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
    /// Damage per nominal frame while the player is inside
    pub damage: f32,
    pub duration_ticks: u32,
}

impl Explosion {
    pub fn new(pos: Vec2, radius: f32, color: Color, damage: f32) -> Self {
        Self {
            pos,
            radius,
            color,
            damage,
            duration_ticks: EXPLOSION_DURATION_TICKS,
        }
    }

    /// 0 at creation, approaching 1 as the blast fades
    pub fn progress(&self) -> f32 {
        1.0 - self.duration_ticks as f32 / EXPLOSION_DURATION_TICKS as f32
    }
}

/// Encounter mode; boss fights suspend wave spawning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterPhase {
    NormalWave,
    BossFight { boss: EnemyKind },
}

/// Wave bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    pub number: u32,
    /// Enemies this wave will spawn
    pub quota: u32,
    pub spawned: u32,
    /// Ticks since the last spawn
    pub timer: u32,
    pub phase: EncounterPhase,
}

impl WaveState {
    pub fn new(initial_quota: u32) -> Self {
        Self {
            number: 1,
            quota: initial_quota,
            spawned: 0,
            timer: 0,
            phase: EncounterPhase::NormalWave,
        }
    }

    pub fn boss_fight_active(&self) -> bool {
        matches!(self.phase, EncounterPhase::BossFight { .. })
    }

    pub fn quota_exhausted(&self) -> bool {
        self.spawned >= self.quota
    }
}

/// A named counter with a one-time reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub kind: QuestKind,
    pub title: String,
    pub current: u32,
    pub target: u32,
    pub reward: u32,
}

/// Active and completed quests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestLog {
    pub active: Vec<Quest>,
    pub completed: Vec<QuestKind>,
}

impl QuestLog {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            active: config
                .quests
                .iter()
                .map(|q| Quest {
                    kind: q.kind,
                    title: q.title.clone(),
                    current: q.start,
                    target: q.target,
                    reward: q.reward,
                })
                .collect(),
            completed: Vec::new(),
        }
    }

    /// Advance a quest; returns the completed quest when its target is crossed
    pub fn advance(&mut self, kind: QuestKind, amount: u32) -> Option<Quest> {
        let idx = self.active.iter().position(|q| q.kind == kind)?;
        let quest = &mut self.active[idx];
        quest.current = quest.current.saturating_add(amount);
        if quest.current < quest.target {
            return None;
        }
        let done = self.active.remove(idx);
        self.completed.push(done.kind);
        Some(done)
    }

    pub fn progress(&self, kind: QuestKind) -> Option<(u32, u32)> {
        self.active
            .iter()
            .find(|q| q.kind == kind)
            .map(|q| (q.current, q.target))
    }
}

/// Level, experience and lifetime counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub level: u32,
    pub xp: u32,
    pub skill_points: u32,
    /// Skill-driven XP multiplier (1.0 at baseline)
    pub xp_multiplier: f32,
    pub skills: BTreeMap<SkillKind, u32>,
    pub particles_absorbed: u64,
    pub enemies_destroyed: u64,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            skill_points: 0,
            xp_multiplier: 1.0,
            skills: BTreeMap::new(),
            particles_absorbed: 0,
            enemies_destroyed: 0,
        }
    }
}

impl Progress {
    pub fn skill_level(&self, skill: SkillKind) -> u32 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }
}

/// Unlocked galaxies and the active one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxyState {
    pub unlocked: Vec<GalaxyKind>,
    pub current: GalaxyKind,
}

impl Default for GalaxyState {
    fn default() -> Self {
        Self {
            unlocked: vec![GalaxyKind::Classic],
            current: GalaxyKind::Classic,
        }
    }
}

/// Final run statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOverSummary {
    pub level: u32,
    pub wave: u32,
    pub particles_absorbed: u64,
    pub enemies_destroyed: u64,
    pub final_score: u64,
}

impl GameOverSummary {
    pub fn from_progress(progress: &Progress, wave: u32) -> Self {
        let final_score = progress.particles_absorbed
            + progress.enemies_destroyed * 10
            + progress.level as u64 * 50
            + wave as u64 * 20;
        Self {
            level: progress.level,
            wave,
            particles_absorbed: progress.particles_absorbed,
            enemies_destroyed: progress.enemies_destroyed,
            final_score,
        }
    }
}

/// Side effects for the host, drained after each frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundEffect),
    Music(MusicTrack),
    StopMusic,
    /// Transient on-screen message
    Notification(String),
    WaveStarted { wave: u32 },
    BossSpawned { kind: EnemyKind },
    BossDefeated,
    LevelUp { level: u32 },
    QuestCompleted { quest: QuestKind, reward: u32 },
    GalaxyUnlocked(GalaxyKind),
    BigBangActivated,
    BigBangPulse { enemies_removed: usize },
    GameOver(GameOverSummary),
}

/// Complete game state (deterministic for a given seed)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub viewport: Viewport,
    pub player: Player,
    pub(crate) particles: Vec<Particle>,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) projectiles: Vec<Projectile>,
    pub(crate) explosions: Vec<Explosion>,
    pub pool: ParticlePool,
    /// Palette new particles are drawn from
    pub particle_colors: ColorRange,
    /// Round-robin cursor of the particle step
    pub last_update_index: usize,
    pub wave: WaveState,
    pub big_bang: BigBang,
    pub progress: Progress,
    pub quests: QuestLog,
    pub galaxies: GalaxyState,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub paused: bool,
    pub game_over: Option<GameOverSummary>,
    /// Cosmetic aura ring radius
    pub aura_pulse_radius: f32,
    /// Particles still owed by the initial batched fill
    pub pending_fill: usize,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Build the baseline state for a new run
    pub fn new(config: &GameConfig, viewport: Viewport, seed: u64) -> Self {
        let galaxies = GalaxyState::default();
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            viewport,
            player: Player::from_config(&config.player),
            particles: Vec::new(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            explosions: Vec::new(),
            pool: ParticlePool::default(),
            particle_colors: config.galaxy_colors(galaxies.current),
            last_update_index: 0,
            wave: WaveState::new(config.waves.initial_quota),
            big_bang: BigBang::default(),
            progress: Progress::default(),
            quests: QuestLog::from_config(config),
            galaxies,
            time_ticks: 0,
            paused: false,
            game_over: None,
            aura_pulse_radius: 0.0,
            pending_fill: 0,
            events: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn set_particles(&mut self, particles: Vec<Particle>) {
        self.particles = particles;
        if self.last_update_index >= self.particles.len() {
            self.last_update_index = 0;
        }
    }

    pub fn set_enemies(&mut self, enemies: Vec<Enemy>) {
        self.enemies = enemies;
    }

    pub fn set_projectiles(&mut self, projectiles: Vec<Projectile>) {
        self.projectiles = projectiles;
    }

    pub fn set_explosions(&mut self, explosions: Vec<Explosion>) {
        self.explosions = explosions;
    }

    /// Queue a side effect for the host
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.events.push(GameEvent::Notification(message.into()));
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }
}
