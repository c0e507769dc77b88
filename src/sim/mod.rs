//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (owned by the state)
//! - Effects reported as queued events, never performed inline
//! - No rendering, audio or platform dependencies

pub mod big_bang;
pub mod enemies;
pub mod particles;
pub mod pool;
pub mod progression;
pub mod projectiles;
pub mod schedule;
pub mod spawn;
pub mod state;
pub mod tick;

pub use big_bang::{BigBang, BigBangPhase};
pub use pool::ParticlePool;
pub use progression::SkillError;
pub use schedule::{FixedStepScheduler, FrameTiming};
pub use spawn::{SpawnContext, spawn_enemy, spawn_enemy_by_key};
pub use state::{
    EncounterPhase, Enemy, Explosion, GameEvent, GameOverSummary, GameState, Particle,
    ParticleKind, Player, Projectile, WaveState,
};
pub use tick::{TickInput, activate_big_bang, tick};
