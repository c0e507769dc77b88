//! Player preferences
//!
//! Kept apart from the gameplay config: settings survive restarts, the
//! gameplay config is rebuilt from its baseline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Upper bound on the particle field population for this preset
    pub fn particle_budget(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 300,
            QualityPreset::High => 600,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Name submitted with final scores
    pub username: String,

    // === Audio ===
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Visual Effects ===
    /// Screen shake during the Big Bang
    pub screen_shake: bool,

    // === HUD ===
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            username: "Traveler".into(),
            sound_enabled: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            screen_shake: true,
            show_fps: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Name to submit, never empty
    pub fn display_name(&self) -> &str {
        let name = self.username.trim();
        if name.is_empty() { "Traveler" } else { name }
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut settings = Settings::default();
        assert!(settings.effective_screen_shake());
        settings.reduced_motion = true;
        assert!(!settings.effective_screen_shake());
    }

    #[test]
    fn test_display_name_fallback() {
        let settings = Settings {
            username: "   ".into(),
            ..Settings::default()
        };
        assert_eq!(settings.display_name(), "Traveler");
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!(QualityPreset::parse("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::parse("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert!(QualityPreset::Low.particle_budget() < QualityPreset::High.particle_budget());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = std::env::temp_dir().join("particle-universe-missing-settings.json");
        let _ = std::fs::remove_file(&path);
        let settings = Settings::load_or_default(&path);
        assert_eq!(settings.username, "Traveler");
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!(
            "particle-universe-settings-{}.json",
            std::process::id()
        ));
        let settings = Settings {
            username: "Nova".into(),
            quality: QualityPreset::High,
            ..Settings::default()
        };
        settings.save(&path).expect("save settings");
        let loaded = Settings::load(&path).expect("load settings");
        assert_eq!(loaded.username, "Nova");
        assert_eq!(loaded.quality, QualityPreset::High);
        let _ = std::fs::remove_file(&path);
    }
}
