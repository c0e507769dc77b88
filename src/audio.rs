//! Audio collaborator
//!
//! The simulation only names sounds; a host-provided backend plays them.
//! Playback is fire-and-forget: a disabled system, a missing backend or a
//! missing asset all degrade to silence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Particle absorbed
    Absorb,
    /// Level up, power-up, heal or skill upgrade
    LevelUp,
    /// Player took damage
    Hit,
    /// Big Bang activated
    Explosion,
    /// Enemy destroyed or projectile detonated
    EnemyDefeat,
    /// Particle field replenished
    Respawn,
    /// Player died
    GameOver,
}

impl SoundEffect {
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundEffect::Absorb => "absorb",
            SoundEffect::LevelUp => "levelUp",
            SoundEffect::Hit => "hit",
            SoundEffect::Explosion => "explosion",
            SoundEffect::EnemyDefeat => "enemyDefeat",
            SoundEffect::Respawn => "respawn",
            SoundEffect::GameOver => "gameOver",
        }
    }
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    MainTheme,
    BossBattle,
    FinalBossTheme,
}

impl MusicTrack {
    pub fn asset_name(&self) -> &'static str {
        match self {
            MusicTrack::MainTheme => "mainTheme",
            MusicTrack::BossBattle => "bossBattle",
            MusicTrack::FinalBossTheme => "finalBossTheme",
        }
    }
}

/// Backend failures (never surfaced past the manager)
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Missing audio asset: {0}")]
    MissingAsset(&'static str),

    #[error("Audio device unavailable: {0}")]
    Device(String),
}

/// Host audio output
pub trait AudioBackend {
    fn play_effect(&mut self, effect: SoundEffect, volume: f32) -> Result<(), AudioError>;
    fn play_music(&mut self, track: MusicTrack, volume: f32) -> Result<(), AudioError>;
    fn stop_music(&mut self);
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    enabled: bool,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    current_track: Option<MusicTrack>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::silent()
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn AudioBackend>, settings: &Settings) -> Self {
        let mut manager = Self::silent();
        manager.backend = Some(backend);
        manager.apply_settings(settings);
        manager
    }

    /// Manager without output; every call is a no-op
    pub fn silent() -> Self {
        Self {
            backend: None,
            enabled: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            current_track: None,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.enabled = settings.sound_enabled;
        self.master_volume = settings.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = settings.music_volume.clamp(0.0, 1.0);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop_music();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Track most recently requested, even if it could not be played
    pub fn current_track(&self) -> Option<MusicTrack> {
        self.current_track
    }

    fn effective_volume(&self, channel: f32) -> f32 {
        if self.enabled {
            self.master_volume * channel
        } else {
            0.0
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume(self.sfx_volume);
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = self.backend.as_mut() else { return };
        if let Err(e) = backend.play_effect(effect, vol) {
            log::debug!("Sound {} skipped: {}", effect.asset_name(), e);
        }
    }

    /// Switch background music
    pub fn play_music(&mut self, track: MusicTrack) {
        self.current_track = Some(track);
        let vol = self.effective_volume(self.music_volume);
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = self.backend.as_mut() else { return };
        if let Err(e) = backend.play_music(track, vol) {
            log::debug!("Music {} skipped: {}", track.asset_name(), e);
        }
    }

    pub fn stop_music(&mut self) {
        self.current_track = None;
        if let Some(backend) = self.backend.as_mut() {
            backend.stop_music();
        }
    }
}
