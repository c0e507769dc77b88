//! Game context
//!
//! Owns the simulation state, the gameplay config and the frame scheduler.
//! Host input is queued into a [`TickInput`] and applied inside the physics
//! step; everything the step reports comes back out as events that are routed
//! to audio, UI and the score reporter once per rendered frame.

use std::sync::Arc;

use glam::Vec2;

use crate::Viewport;
use crate::audio::{AudioManager, MusicTrack};
use crate::collaborators::{HudSnapshot, RenderView, Renderer, UiUpdater};
use crate::config::{GalaxyKind, GameConfig, PlayerMode, SkillKind};
use crate::highscores::{LeaderboardEntry, ScoreReporter, ScoreService};
use crate::settings::Settings;
use crate::sim::particles::fill_particles;
use crate::sim::progression::{self, SkillError};
use crate::sim::schedule::{FixedStepScheduler, FrameTiming};
use crate::sim::spawn::{SpawnContext, spawn_enemy_by_key, spawn_random_enemy};
use crate::sim::state::{GameEvent, GameOverSummary, GameState};
use crate::sim::tick::{TickInput, tick};

/// Hotkey that spends the Big Bang charge
pub const BIG_BANG_HOTKEY: char = '4';

pub struct Game {
    /// Live gameplay tunables
    pub config: GameConfig,
    /// Restored on every restart
    baseline: GameConfig,
    pub settings: Settings,
    state: GameState,
    scheduler: FixedStepScheduler,
    input: TickInput,
    audio: AudioManager,
    reporter: Option<ScoreReporter>,
    seed: u64,
}

impl Game {
    /// Create a game and run [`Game::init_game`]
    pub fn new(config: GameConfig, settings: Settings, viewport: Viewport, seed: u64) -> Self {
        let state = GameState::new(&config, viewport, seed);
        let mut game = Self {
            baseline: config.clone(),
            config,
            settings,
            state,
            scheduler: FixedStepScheduler::new(),
            input: TickInput::default(),
            audio: AudioManager::silent(),
            reporter: None,
            seed,
        };
        game.init_game();
        game
    }

    pub fn with_audio(mut self, mut audio: AudioManager) -> Self {
        audio.apply_settings(&self.settings);
        self.audio = audio;
        self
    }

    pub fn with_score_service(mut self, service: Arc<dyn ScoreService>) -> Self {
        self.reporter = Some(ScoreReporter::new(service));
        self
    }

    /// Build a fresh run: baseline state, cursor at the center, empty field
    /// that fills over the next frames
    pub fn init_game(&mut self) {
        let viewport = self.state.viewport;
        self.state = GameState::new(&self.config, viewport, self.seed);
        self.state.player.pos = Some(viewport.center());
        self.state.pending_fill = self.particle_target();
        self.scheduler.reset();
        self.input = TickInput::default();
        if let Some(reporter) = &mut self.reporter {
            reporter.reset();
        }
        self.state.emit(GameEvent::Music(MusicTrack::MainTheme));
        log::info!(
            "Game initialized (seed {}, viewport {}x{})",
            self.seed,
            viewport.width,
            viewport.height
        );
    }

    /// Reset config to its baseline and start over with the same seed
    pub fn restart_game(&mut self) {
        self.config = self.baseline.clone();
        self.audio.stop_music();
        self.init_game();
        log::info!("Game restarted");
    }

    /// Start over with a different seed
    pub fn restart_with_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.restart_game();
    }

    /// Particle population the initial fill aims for
    pub fn particle_target(&self) -> usize {
        self.config
            .particles
            .count
            .min(self.settings.quality.particle_budget())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn fps(&self) -> u32 {
        self.scheduler.fps()
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over.is_some()
    }

    pub fn game_over_summary(&self) -> Option<&GameOverSummary> {
        self.state.game_over.as_ref()
    }

    /// Latest leaderboard, `None` while loading or without a score service
    pub fn leaderboard(&mut self) -> Option<&[LeaderboardEntry]> {
        self.reporter.as_mut().and_then(|r| r.poll())
    }

    /// The score reporter, for hosts that need to wait on it at shutdown
    pub fn reporter_mut(&mut self) -> Option<&mut ScoreReporter> {
        self.reporter.as_mut()
    }

    // === Input ===

    pub fn set_player_position(&mut self, pos: Vec2) {
        if pos.is_finite() {
            self.input.player_pos = Some(pos);
        }
    }

    pub fn set_mode(&mut self, mode: PlayerMode) {
        self.input.mode = Some(mode);
    }

    /// `1`/`2`/`3` pick attract, repel and vortex; `4` fires the Big Bang
    pub fn handle_hotkey(&mut self, key: char) {
        if key == BIG_BANG_HOTKEY {
            self.activate_big_bang();
        } else if let Some(mode) = PlayerMode::from_hotkey(key) {
            self.set_mode(mode);
        }
    }

    /// Releasing a mode key returns the player to normal
    pub fn handle_hotkey_release(&mut self, key: char) {
        if PlayerMode::from_hotkey(key).is_some() {
            self.set_mode(PlayerMode::Normal);
        }
    }

    /// Queue the Big Bang for the next step; false when not fully charged
    pub fn activate_big_bang(&mut self) -> bool {
        if self.state.big_bang.is_ready(&self.config.big_bang) {
            self.input.activate_big_bang = true;
            true
        } else {
            false
        }
    }

    pub fn toggle_pause(&mut self) {
        self.input.pause = !self.input.pause;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.input.pause = self.state.paused != paused;
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.viewport = Viewport::new(width, height);
        log::debug!(
            "Viewport resized to {}x{}",
            self.state.viewport.width,
            self.state.viewport.height
        );
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        self.audio.apply_settings(&settings);
        self.settings = settings;
    }

    // === Menus ===

    pub fn upgrade_skill(&mut self, skill: SkillKind) -> Result<u32, SkillError> {
        progression::upgrade_skill(&mut self.state, &self.config, skill)
    }

    pub fn select_galaxy(&mut self, kind: GalaxyKind) -> bool {
        progression::select_galaxy(&mut self.state, &self.config, kind)
    }

    /// Spawn one enemy by type key; false for unknown or unconfigured keys
    pub fn spawn_enemy(&mut self, key: &str) -> bool {
        let ctx = self.spawn_context();
        match spawn_enemy_by_key(key, &self.config, &ctx, &mut self.state.rng) {
            Some(enemy) => {
                self.state.enemies.push(enemy);
                true
            }
            None => false,
        }
    }

    pub fn spawn_random_enemy(&mut self) -> bool {
        let ctx = self.spawn_context();
        match spawn_random_enemy(&self.config, &ctx, &mut self.state.rng) {
            Some(enemy) => {
                self.state.enemies.push(enemy);
                true
            }
            None => false,
        }
    }

    fn spawn_context(&self) -> SpawnContext {
        SpawnContext {
            wave: self.state.wave.number,
            viewport: self.state.viewport,
        }
    }

    // === Frame ===

    /// One rendered frame: fill, zero or more physics steps, then effects,
    /// rendering and HUD refresh
    pub fn frame(
        &mut self,
        timestamp_ms: f64,
        renderer: &mut dyn Renderer,
        ui: &mut dyn UiUpdater,
    ) -> FrameTiming {
        self.fill_step();

        let Self {
            state,
            config,
            input,
            scheduler,
            ..
        } = self;
        let timing = scheduler.frame(timestamp_ms, |dt| {
            tick(state, config, input, dt);

            // Clear one-shot inputs after processing
            input.activate_big_bang = false;
            input.pause = false;
        });

        self.dispatch_events(ui);

        if timing.fps_updated && self.settings.show_fps {
            ui.update_fps(self.scheduler.fps());
        }

        let view = RenderView::new(
            &self.state,
            &self.config,
            self.settings.effective_screen_shake(),
        );
        renderer.render(&view);
        ui.update_hud(&HudSnapshot::from_state(&self.state, &self.config));

        if self.state.game_over.is_some() {
            let board = self.reporter.as_mut().and_then(|r| r.poll());
            ui.show_leaderboard(board);
        }

        timing
    }

    /// Add the next batch of the initial particle fill
    fn fill_step(&mut self) {
        if self.state.pending_fill == 0 {
            return;
        }
        let batch = self.config.particles.initial_batch.min(self.state.pending_fill);
        let target = self.particle_target();
        let state = &mut self.state;
        let added = fill_particles(
            &mut state.particles,
            &mut state.pool,
            state.player.pos,
            &state.viewport,
            &state.particle_colors,
            &self.config.particles,
            target,
            batch,
            &mut state.rng,
        );
        state.pending_fill = if added == 0 {
            0
        } else {
            state.pending_fill.saturating_sub(batch)
        };
        if state.pending_fill == 0 {
            log::debug!("Initial particle fill complete ({})", state.particles.len());
        }
    }

    fn dispatch_events(&mut self, ui: &mut dyn UiUpdater) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::Sound(effect) => self.audio.play(effect),
                GameEvent::Music(track) => self.audio.play_music(track),
                GameEvent::StopMusic => self.audio.stop_music(),
                GameEvent::Notification(message) => ui.notify(&message),
                GameEvent::GameOver(summary) => {
                    if let Some(reporter) = &mut self.reporter {
                        reporter.submit_once(self.settings.display_name(), summary.final_score);
                    }
                    ui.show_game_over(&summary);
                }
                other => log::debug!("Event: {:?}", other),
            }
        }
    }
}
