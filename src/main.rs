//! Particle Universe headless driver
//!
//! Runs the simulation without a window: an autopilot steers the cursor,
//! cycles modes and fires the Big Bang when charged. HUD snapshots are logged
//! once per simulated second.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec2;

use particle_universe::collaborators::{HudSnapshot, NullRenderer, UiUpdater};
use particle_universe::config::{ConfigError, PlayerMode};
use particle_universe::consts::FRAME_MS;
use particle_universe::highscores::{FileScoreService, InMemoryScoreService, LeaderboardEntry, ScoreService};
use particle_universe::settings::QualityPreset;
use particle_universe::sim::state::GameOverSummary;
use particle_universe::{Game, GameConfig, Settings, Viewport};

#[derive(Parser, Debug)]
#[command(name = "particle-universe")]
#[command(about = "Headless particle-survival simulation with an autopilot cursor")]
struct Cli {
    /// RNG seed for the run
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Simulated seconds to run
    #[arg(long, default_value_t = 60.0)]
    duration: f64,
    /// Run as fast as possible instead of at a real 60 Hz
    #[arg(long, default_value_t = false)]
    fast: bool,
    #[arg(long, default_value_t = 800.0)]
    width: f32,
    #[arg(long, default_value_t = 600.0)]
    height: f32,
    /// JSON file overriding gameplay tunables
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Quality preset (low, medium, high)
    #[arg(long)]
    quality: Option<String>,
    /// JSON file used as the score store (in-memory when omitted)
    #[arg(long)]
    scores: Option<PathBuf>,
    /// Name submitted with the final score
    #[arg(long)]
    username: Option<String>,
    /// Keep running after game over by restarting
    #[arg(long, default_value_t = false)]
    restart: bool,
}

/// UI that writes everything to the log
#[derive(Default)]
struct LogUi {
    last_hud: Option<HudSnapshot>,
    fps: u32,
}

impl UiUpdater for LogUi {
    fn update_hud(&mut self, hud: &HudSnapshot) {
        self.last_hud = Some(hud.clone());
    }

    fn notify(&mut self, message: &str) {
        log::info!("[notice] {}", message);
    }

    fn update_fps(&mut self, fps: u32) {
        self.fps = fps;
    }

    fn show_game_over(&mut self, summary: &GameOverSummary) {
        log::info!(
            "GAME OVER - level {}, wave {}, absorbed {}, destroyed {}, score {}",
            summary.level,
            summary.wave,
            summary.particles_absorbed,
            summary.enemies_destroyed,
            summary.final_score
        );
    }
}

impl LogUi {
    fn log_hud(&self) {
        let Some(hud) = &self.last_hud else {
            return;
        };
        log::info!(
            "lvl {} xp {}/{} | hp {:.0}/{:.0} | wave {}{} | particles {} enemies {} | big bang {:.0}% | fps {}",
            hud.level,
            hud.xp,
            hud.xp_needed,
            hud.health,
            hud.max_health,
            hud.wave,
            if hud.boss_fight { " (boss)" } else { "" },
            hud.particle_count,
            hud.enemy_count,
            hud.big_bang_charge * 100.0,
            self.fps
        );
    }
}

/// Cursor path and mode schedule for unattended runs
struct Autopilot {
    center: Vec2,
    reach: Vec2,
}

impl Autopilot {
    fn new(viewport: Viewport) -> Self {
        Self {
            center: viewport.center(),
            reach: Vec2::new(viewport.width * 0.35, viewport.height * 0.35),
        }
    }

    /// Lissajous path through the field
    fn cursor(&self, t_secs: f64) -> Vec2 {
        let t = t_secs as f32;
        self.center + Vec2::new((t * 0.7).sin() * self.reach.x, (t * 1.1).sin() * self.reach.y)
    }

    /// Mostly attract, with short repel bursts
    fn mode(&self, t_secs: f64) -> PlayerMode {
        if (t_secs as u64) % 10 >= 8 {
            PlayerMode::Repel
        } else {
            PlayerMode::Attract
        }
    }
}

fn print_leaderboard(board: &[LeaderboardEntry]) {
    if board.is_empty() {
        log::info!("Leaderboard is empty");
        return;
    }
    log::info!("Leaderboard:");
    for (i, entry) in board.iter().enumerate() {
        log::info!("{:>2}. {:<20} {}", i + 1, entry.username, entry.score);
    }
}

fn run(cli: Cli) -> Result<(), ConfigError> {
    let config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let mut settings = match &cli.settings {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if let Some(name) = &cli.quality {
        match QualityPreset::parse(name) {
            Some(q) => settings.quality = q,
            None => log::warn!("Unknown quality preset '{}', keeping {}", name, settings.quality.as_str()),
        }
    }
    if let Some(name) = &cli.username {
        settings.username = name.clone();
    }

    let service: Arc<dyn ScoreService> = match &cli.scores {
        Some(path) => Arc::new(FileScoreService::new(path)),
        None => Arc::new(InMemoryScoreService::new()),
    };

    let viewport = Viewport::new(cli.width, cli.height);
    let mut game = Game::new(config, settings, viewport, cli.seed).with_score_service(service);
    let autopilot = Autopilot::new(game.state().viewport);
    let mut ui = LogUi::default();
    let mut renderer = NullRenderer;

    log::info!(
        "Particle Universe starting (seed {}, {:.0}s, {})",
        cli.seed,
        cli.duration,
        if cli.fast { "fast" } else { "real time" }
    );

    let frame_ms = FRAME_MS as f64;
    let total_frames = (cli.duration * 1000.0 / frame_ms).ceil() as u64;
    let started = Instant::now();
    let mut next_report = 1000.0;

    for frame in 0..total_frames {
        let now_ms = frame as f64 * frame_ms;
        let t_secs = now_ms / 1000.0;

        game.set_player_position(autopilot.cursor(t_secs));
        game.set_mode(autopilot.mode(t_secs));
        if game.state().big_bang.is_ready(&game.config.big_bang) {
            game.activate_big_bang();
        }

        game.frame(now_ms, &mut renderer, &mut ui);

        if now_ms >= next_report {
            ui.log_hud();
            next_report += 1000.0;
        }

        if game.is_game_over() {
            if let Some(reporter) = game.reporter_mut() {
                if let Some(board) = reporter.wait(Duration::from_secs(2)) {
                    print_leaderboard(board);
                }
            }
            if !cli.restart {
                break;
            }
            game.restart_with_seed(game.seed().wrapping_add(1));
        }

        if !cli.fast {
            let target = started + Duration::from_secs_f64(now_ms / 1000.0);
            if let Some(wait) = target.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }

    ui.log_hud();
    log::info!("Finished after {:.1}s wall clock", started.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
