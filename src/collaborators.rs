//! Host-facing collaborator interfaces
//!
//! The simulation never draws or touches widgets itself. Once per rendered
//! frame, after the physics steps, the game hands a read-only view to the
//! renderer and a HUD snapshot to the UI.

use crate::config::{GameConfig, QuestKind};
use crate::highscores::LeaderboardEntry;
use crate::sim::state::{Enemy, Explosion, GameOverSummary, GameState, Particle, Player, Projectile};

/// Read-only view of everything a renderer may draw
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    pub player: &'a Player,
    pub particles: &'a [Particle],
    pub enemies: &'a [Enemy],
    pub projectiles: &'a [Projectile],
    pub explosions: &'a [Explosion],
    pub aura_pulse_radius: f32,
    /// Big Bang is in its shake window and the user allows shaking
    pub shake: bool,
    /// White flash overlay (0 = none)
    pub flash_opacity: f32,
    pub time_ticks: u64,
}

impl<'a> RenderView<'a> {
    pub fn new(state: &'a GameState, config: &GameConfig, allow_shake: bool) -> Self {
        let shaking = state.big_bang.is_shaking(&config.big_bang);
        Self {
            player: &state.player,
            particles: state.particles(),
            enemies: state.enemies(),
            projectiles: state.projectiles(),
            explosions: state.explosions(),
            aura_pulse_radius: state.aura_pulse_radius,
            shake: allow_shake && shaking,
            flash_opacity: state.big_bang.flash_opacity(&config.big_bang),
            time_ticks: state.time_ticks,
        }
    }
}

/// Progress line for one active quest
#[derive(Debug, Clone, PartialEq)]
pub struct QuestProgress {
    pub kind: QuestKind,
    pub title: String,
    pub current: u32,
    pub target: u32,
}

/// Scalar values shown by the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub health: f32,
    pub max_health: f32,
    /// 0.0 - 1.0
    pub health_fraction: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_needed: u32,
    /// 0.0 - 1.0
    pub xp_fraction: f32,
    pub skill_points: u32,
    pub wave: u32,
    pub boss_fight: bool,
    /// 0.0 - 1.0
    pub big_bang_charge: f32,
    pub big_bang_ready: bool,
    pub quests: Vec<QuestProgress>,
    pub particle_count: usize,
    pub enemy_count: usize,
    pub particles_absorbed: u64,
    pub enemies_destroyed: u64,
    pub powered_up: bool,
    pub paused: bool,
}

impl HudSnapshot {
    pub fn from_state(state: &GameState, config: &GameConfig) -> Self {
        let progress = &state.progress;
        let xp_needed = progress.level.saturating_mul(config.progression.xp_per_level);
        let xp_fraction = if xp_needed == 0 {
            0.0
        } else {
            (progress.xp as f32 / xp_needed as f32).clamp(0.0, 1.0)
        };

        let quests = state
            .quests
            .active
            .iter()
            .map(|q| QuestProgress {
                kind: q.kind,
                title: q.title.clone(),
                current: q.current,
                target: q.target,
            })
            .collect();

        Self {
            health: state.player.health,
            max_health: state.player.max_health,
            health_fraction: state.player.health_fraction(),
            level: progress.level,
            xp: progress.xp,
            xp_needed,
            xp_fraction,
            skill_points: progress.skill_points,
            wave: state.wave.number,
            boss_fight: state.wave.boss_fight_active(),
            big_bang_charge: state.big_bang.charge_fraction(&config.big_bang),
            big_bang_ready: state.big_bang.is_ready(&config.big_bang),
            quests,
            particle_count: state.particles().len(),
            enemy_count: state.enemies().len(),
            particles_absorbed: progress.particles_absorbed,
            enemies_destroyed: progress.enemies_destroyed,
            powered_up: state.player.powered_up,
            paused: state.paused,
        }
    }
}

/// Draws one frame; must not mutate the simulation
pub trait Renderer {
    fn render(&mut self, view: &RenderView<'_>);
}

/// Display widgets. Every method defaults to a no-op so hosts implement only what they show.
pub trait UiUpdater {
    fn update_hud(&mut self, _hud: &HudSnapshot) {}

    fn notify(&mut self, _message: &str) {}

    fn update_fps(&mut self, _fps: u32) {}

    fn show_game_over(&mut self, _summary: &GameOverSummary) {}

    /// `None` while the leaderboard request is still in flight
    fn show_leaderboard(&mut self, _entries: Option<&[LeaderboardEntry]>) {}
}

/// Renderer that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _view: &RenderView<'_>) {}
}

/// UI that ignores every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NullUi;

impl UiUpdater for NullUi {}
