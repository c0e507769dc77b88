//! Gameplay tables and tunables
//!
//! `GameConfig::default()` is the fixed baseline every new or restarted game
//! starts from. Tables are keyed by enums so lookups are resolved once and
//! dispatch in the update rules never goes through strings.

use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Display color carried by entities (the renderer decides how to draw it)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Color {
    /// Hue in degrees, saturation and lightness in percent
    Hsl { h: f32, s: f32, l: f32 },
    /// Packed 0xRRGGBB
    Rgb(u32),
}

impl Color {
    pub const GOLD: Color = Color::Rgb(0xFFD700);
    pub const LIGHT_GREEN: Color = Color::Rgb(0x90EE90);
    pub const HOSTILE_RED: Color = Color::Hsl { h: 0.0, s: 100.0, l: 70.0 };
    pub const PROJECTILE_MAGENTA: Color = Color::Rgb(0xFF00FF);
    pub const PROJECTILE_ORANGE: Color = Color::Rgb(0xFFA500);
}

/// Hue/saturation/lightness min-max triples for particle tinting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub hue: [f32; 2],
    pub saturation: [f32; 2],
    pub lightness: [f32; 2],
}

impl ColorRange {
    /// Draw a color uniformly from the range
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Color {
        let lerp = |range: [f32; 2], t: f32| range[0] + t * (range[1] - range[0]);
        Color::Hsl {
            h: lerp(self.hue, rng.random()),
            s: lerp(self.saturation, rng.random()),
            l: lerp(self.lightness, rng.random()),
        }
    }
}

/// Player interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerMode {
    #[default]
    Attract,
    Repel,
    /// Selectable, but behaves like `Normal` in the update rules
    Vortex,
    Normal,
}

impl PlayerMode {
    /// Map the mode hotkeys (1/2/3) to a mode
    pub fn from_hotkey(key: char) -> Option<Self> {
        match key {
            '1' => Some(PlayerMode::Attract),
            '2' => Some(PlayerMode::Repel),
            '3' => Some(PlayerMode::Vortex),
            _ => None,
        }
    }
}

/// Enemy type keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnemyKind {
    Fast,
    Hunter,
    Cosmic,
    Shooter,
    Boss,
    FinalBoss,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Fast,
        EnemyKind::Hunter,
        EnemyKind::Cosmic,
        EnemyKind::Shooter,
        EnemyKind::Boss,
        EnemyKind::FinalBoss,
    ];

    pub fn as_key(&self) -> &'static str {
        match self {
            EnemyKind::Fast => "fast",
            EnemyKind::Hunter => "hunter",
            EnemyKind::Cosmic => "cosmic",
            EnemyKind::Shooter => "shooter",
            EnemyKind::Boss => "boss",
            EnemyKind::FinalBoss => "finalBoss",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_key() == key)
    }

    /// Bosses survive the Big Bang pulse and are always elite
    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyKind::Boss | EnemyKind::FinalBoss)
    }

    /// Boss type summoned when reaching `level`
    pub fn boss_for_level(level: u32, max_level: u32) -> Self {
        if level >= max_level {
            EnemyKind::FinalBoss
        } else {
            EnemyKind::Boss
        }
    }
}

/// Movement/attack rule an enemy type follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnemyBehavior {
    /// Direct pursuit at base speed
    Hunt,
    /// Hover at a preferred distance and fire on cooldown
    HuntAndShoot,
    /// Straight line fixed at spawn time
    CrossScreen,
    /// Keep distance and lob explosive shots
    Shooter,
    Stationary,
}

/// Projectile variants enemies can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectileKind {
    #[default]
    Normal,
    Explosive,
}

/// Static definition of an enemy type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTypeDef {
    pub name: String,
    /// Relative spawn weight (0 = never picked at random)
    pub chance: f32,
    pub speed: Option<f32>,
    pub behavior: EnemyBehavior,
    pub color: Color,
    /// Fixed health, replaces the wave formula
    pub health: Option<f32>,
    /// Fixed contact damage, replaces the wave formula
    pub damage: Option<f32>,
    pub size: Option<f32>,
    pub xp_value: Option<u32>,
    pub preferred_distance: Option<f32>,
    pub shoot_distance: Option<f32>,
    pub shoot_cooldown_ms: Option<f32>,
    pub projectile: Option<ProjectileKind>,
    /// Interval between hostile particle bursts (bosses)
    pub burst_interval_ms: Option<f32>,
    pub ignores_attraction: bool,
    pub ignores_collision: bool,
}

impl Default for EnemyTypeDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            chance: 0.0,
            speed: None,
            behavior: EnemyBehavior::Hunt,
            color: Color::Rgb(0xFF0000),
            health: None,
            damage: None,
            size: None,
            xp_value: None,
            preferred_distance: None,
            shoot_distance: None,
            shoot_cooldown_ms: None,
            projectile: None,
            burst_interval_ms: None,
            ignores_attraction: false,
            ignores_collision: false,
        }
    }
}

/// Enemy stat scaling and the type table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySystemConfig {
    /// Distance outside the screen edge where enemies appear
    pub spawn_margin: f32,
    pub base_health: f32,
    pub health_increase_per_wave: f32,
    pub base_damage: f32,
    pub damage_increase_per_wave: f32,
    /// Speed used when a type has none
    pub base_speed: f32,
    pub base_size: f32,
    pub elite_chance: f32,
    pub elite_health_multiplier: f32,
    pub elite_damage_multiplier: f32,
    pub elite_speed_multiplier: f32,
    pub elite_size_multiplier: f32,
    /// Ticks an enemy ignores further player collision damage
    pub collision_cooldown_ticks: u32,
    pub default_xp_value: u32,
    pub types: BTreeMap<EnemyKind, EnemyTypeDef>,
}

impl Default for EnemySystemConfig {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        types.insert(
            EnemyKind::Fast,
            EnemyTypeDef {
                name: "Fast".into(),
                chance: 0.55,
                speed: Some(3.5),
                behavior: EnemyBehavior::Hunt,
                color: Color::Rgb(0xFFDD00),
                ..Default::default()
            },
        );
        types.insert(
            EnemyKind::Hunter,
            EnemyTypeDef {
                name: "Hunter".into(),
                chance: 0.25,
                speed: Some(2.0),
                behavior: EnemyBehavior::HuntAndShoot,
                color: Color::Rgb(0xFF9900),
                preferred_distance: Some(250.0),
                shoot_cooldown_ms: Some(2000.0),
                projectile: Some(ProjectileKind::Normal),
                ..Default::default()
            },
        );
        types.insert(
            EnemyKind::Cosmic,
            EnemyTypeDef {
                name: "Cosmic".into(),
                chance: 0.10,
                speed: Some(4.5),
                behavior: EnemyBehavior::CrossScreen,
                color: Color::Rgb(0x00AAFF),
                damage: Some(25.0),
                ignores_attraction: true,
                ignores_collision: true,
                ..Default::default()
            },
        );
        types.insert(
            EnemyKind::Shooter,
            EnemyTypeDef {
                name: "Shooter".into(),
                chance: 0.05,
                speed: Some(1.5),
                behavior: EnemyBehavior::Shooter,
                color: Color::Rgb(0x00FFFF),
                shoot_cooldown_ms: Some(2000.0),
                projectile: Some(ProjectileKind::Explosive),
                ..Default::default()
            },
        );
        types.insert(
            EnemyKind::Boss,
            EnemyTypeDef {
                name: "Boss".into(),
                chance: 0.0,
                speed: Some(2.5),
                behavior: EnemyBehavior::Hunt,
                color: Color::Rgb(0xFF8C00),
                size: Some(40.0),
                health: Some(200.0),
                xp_value: Some(100),
                burst_interval_ms: Some(4000.0),
                ..Default::default()
            },
        );
        types.insert(
            EnemyKind::FinalBoss,
            EnemyTypeDef {
                name: "Final Boss".into(),
                chance: 0.0,
                speed: Some(3.0),
                behavior: EnemyBehavior::Hunt,
                color: Color::Rgb(0xDC143C),
                size: Some(60.0),
                health: Some(600.0),
                xp_value: Some(500),
                burst_interval_ms: Some(2500.0),
                ..Default::default()
            },
        );

        Self {
            spawn_margin: 100.0,
            base_health: 15.0,
            health_increase_per_wave: 0.05,
            base_damage: 3.0,
            damage_increase_per_wave: 0.2,
            base_speed: 2.0,
            base_size: 20.0,
            elite_chance: 0.02,
            elite_health_multiplier: 1.5,
            elite_damage_multiplier: 1.3,
            elite_speed_multiplier: 1.1,
            elite_size_multiplier: 1.3,
            collision_cooldown_ticks: 30,
            default_xp_value: 10,
            types,
        }
    }
}

/// Player baseline stats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Interaction radius
    pub radius: f32,
    /// Body (hitbox) radius
    pub size: f32,
    pub max_health: f32,
    /// Damage dealt to an enemy on contact
    pub collision_damage: f32,
    /// Damage per second dealt to enemies inside the attract field
    pub attraction_damage: f32,
    /// Ticks of invincibility after taking contact damage
    pub invincibility_cooldown_ticks: u32,
    /// Ticks a collected power-up lasts
    pub power_up_ticks: u32,
    pub mode: PlayerMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 150.0,
            size: 30.0,
            max_health: 100.0,
            collision_damage: 10.0,
            attraction_damage: 2.0,
            invincibility_cooldown_ticks: 0,
            power_up_ticks: 300,
            mode: PlayerMode::Attract,
        }
    }
}

/// Particle field population and drops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Population the initial fill aims for
    pub count: usize,
    /// Particles added per rendered frame during the initial fill
    pub initial_batch: usize,
    pub respawn_min_particles: usize,
    pub respawn_amount: usize,
    pub respawn_check_interval_ticks: u64,
    /// Chance a defeated enemy drops a healing particle
    pub heal_drop_chance: f64,
    pub heal_amount: f32,
    /// Half-width of the square around the player where fresh particles never appear
    pub spawn_padding: f32,
    /// Rejection-sampling attempts before falling back to a forced placement
    pub max_spawn_attempts: u32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 300,
            initial_batch: 25,
            respawn_min_particles: 150,
            respawn_amount: 50,
            respawn_check_interval_ticks: 30,
            heal_drop_chance: 0.1,
            heal_amount: 5.0,
            spawn_padding: 200.0,
            max_spawn_attempts: 64,
        }
    }
}

/// Wave pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Spawn quota of wave 1
    pub initial_quota: u32,
    pub quota_base: u32,
    pub quota_per_wave: f32,
    /// Ticks between spawns inside a wave
    pub spawn_interval_ticks: u32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            initial_quota: 3,
            quota_base: 5,
            quota_per_wave: 1.5,
            spawn_interval_ticks: 90,
        }
    }
}

impl WaveConfig {
    /// Spawn quota for a given wave number (waves after the first)
    pub fn quota_for_wave(&self, wave: u32) -> u32 {
        self.quota_base + (wave as f32 * self.quota_per_wave).floor() as u32
    }
}

/// Big Bang ability timing and strength
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BigBangConfig {
    pub max_charge: f32,
    /// Charge granted per defeated enemy
    pub charge_per_kill: f32,
    /// Total animation length
    pub duration_ms: f32,
    /// Shake runs while remaining time is above this; the pulse fires at it
    pub shake_threshold_ms: f32,
    /// Fraction of max health a boss loses to the pulse
    pub boss_damage_fraction: f32,
}

impl Default for BigBangConfig {
    fn default() -> Self {
        Self {
            max_charge: 100.0,
            charge_per_kill: 5.0,
            duration_ms: 3500.0,
            shake_threshold_ms: 2000.0,
            boss_damage_fraction: 0.3,
        }
    }
}

/// Leveling curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub xp_per_level: u32,
    pub max_level: u32,
    /// Every n-th level summons a boss
    pub boss_level_interval: u32,
    pub global_xp_multiplier: f32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_per_level: 100,
            max_level: 50,
            boss_level_interval: 10,
            global_xp_multiplier: 2.5,
        }
    }
}

/// Galaxy (biome) keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GalaxyKind {
    Classic,
    Neon,
    Fire,
}

/// Condition that unlocks a galaxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnlockCondition {
    Initial,
    Level(u32),
    EnemiesDestroyed(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalaxyDef {
    pub name: String,
    pub colors: ColorRange,
    pub unlock: UnlockCondition,
}

/// Skill tree keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillKind {
    AttractRadius,
    HealthBoost,
    VortexPower,
    ParticleMastery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    pub cost: u32,
    pub max_level: u32,
    /// Relative bonus per level applied to the matching base stat
    pub bonus_per_level: f32,
    /// Another skill that must reach a level first
    pub requires: Option<(SkillKind, u32)>,
}

/// Quest counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestKind {
    AbsorbParticles,
    DefeatEnemies,
    ReachWave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    pub kind: QuestKind,
    pub title: String,
    pub start: u32,
    pub target: u32,
    /// Unscaled XP granted on completion
    pub reward: u32,
}

/// Complete gameplay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub enemies: EnemySystemConfig,
    pub particles: ParticleConfig,
    pub waves: WaveConfig,
    pub big_bang: BigBangConfig,
    pub progression: ProgressionConfig,
    pub galaxies: BTreeMap<GalaxyKind, GalaxyDef>,
    pub skills: BTreeMap<SkillKind, SkillDef>,
    pub quests: Vec<QuestDef>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut galaxies = BTreeMap::new();
        galaxies.insert(
            GalaxyKind::Classic,
            GalaxyDef {
                name: "Classic".into(),
                colors: ColorRange {
                    hue: [0.0, 360.0],
                    saturation: [80.0, 90.0],
                    lightness: [50.0, 70.0],
                },
                unlock: UnlockCondition::Initial,
            },
        );
        galaxies.insert(
            GalaxyKind::Neon,
            GalaxyDef {
                name: "Neon".into(),
                colors: ColorRange {
                    hue: [280.0, 320.0],
                    saturation: [100.0, 100.0],
                    lightness: [60.0, 80.0],
                },
                unlock: UnlockCondition::Level(5),
            },
        );
        galaxies.insert(
            GalaxyKind::Fire,
            GalaxyDef {
                name: "Inferno".into(),
                colors: ColorRange {
                    hue: [10.0, 40.0],
                    saturation: [80.0, 100.0],
                    lightness: [50.0, 70.0],
                },
                unlock: UnlockCondition::EnemiesDestroyed(50),
            },
        );

        let mut skills = BTreeMap::new();
        skills.insert(
            SkillKind::AttractRadius,
            SkillDef {
                name: "Attraction Radius".into(),
                cost: 2,
                max_level: 5,
                bonus_per_level: 0.20,
                requires: None,
            },
        );
        skills.insert(
            SkillKind::HealthBoost,
            SkillDef {
                name: "Vitality".into(),
                cost: 1,
                max_level: 10,
                bonus_per_level: 0.10,
                requires: None,
            },
        );
        skills.insert(
            SkillKind::VortexPower,
            SkillDef {
                name: "Vortex Power".into(),
                cost: 2,
                max_level: 5,
                bonus_per_level: 0.30,
                requires: None,
            },
        );
        skills.insert(
            SkillKind::ParticleMastery,
            SkillDef {
                name: "Particle Mastery".into(),
                cost: 4,
                max_level: 3,
                bonus_per_level: 0.20,
                requires: Some((SkillKind::AttractRadius, 3)),
            },
        );

        let quests = vec![
            QuestDef {
                kind: QuestKind::AbsorbParticles,
                title: "Absorb 100 particles".into(),
                start: 0,
                target: 100,
                reward: 50,
            },
            QuestDef {
                kind: QuestKind::DefeatEnemies,
                title: "Defeat 20 enemies".into(),
                start: 0,
                target: 20,
                reward: 100,
            },
            QuestDef {
                kind: QuestKind::ReachWave,
                title: "Reach wave 5".into(),
                start: 1,
                target: 5,
                reward: 200,
            },
        ];

        Self {
            player: PlayerConfig::default(),
            enemies: EnemySystemConfig::default(),
            particles: ParticleConfig::default(),
            waves: WaveConfig::default(),
            big_bang: BigBangConfig::default(),
            progression: ProgressionConfig::default(),
            galaxies,
            skills,
            quests,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) config; missing fields keep their baseline values
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    pub fn enemy_type(&self, kind: EnemyKind) -> Option<&EnemyTypeDef> {
        self.enemies.types.get(&kind)
    }

    /// Color range of a galaxy, falling back to the first configured one
    pub fn galaxy_colors(&self, galaxy: GalaxyKind) -> ColorRange {
        self.galaxies
            .get(&galaxy)
            .or_else(|| self.galaxies.values().next())
            .map(|g| g.colors)
            .unwrap_or(ColorRange {
                hue: [0.0, 360.0],
                saturation: [80.0, 90.0],
                lightness: [50.0, 70.0],
            })
    }
}
