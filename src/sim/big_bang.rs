//! Big Bang ability state machine
//!
//! Charge accumulates from enemy kills. A full charge can be spent to start
//! the animation; the mass-damage pulse fires exactly once per activation when
//! the remaining time crosses the shake threshold.

use serde::{Deserialize, Serialize};

use crate::config::BigBangConfig;

/// Observable phase of the ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BigBangPhase {
    Idle,
    Charging,
    Animating,
}

/// What the enemy step should do this step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BigBangSignal {
    /// Apply the mass-damage pulse now
    pub pulse: bool,
    /// Animation ended this step
    pub finished: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BigBang {
    /// 0..=max_charge
    pub charge: f32,
    pub animating: bool,
    /// Remaining animation time
    pub timer_ms: f32,
    /// Pulse already fired during this activation
    pub effect_triggered: bool,
}

impl BigBang {
    pub fn phase(&self) -> BigBangPhase {
        if self.animating {
            BigBangPhase::Animating
        } else if self.charge > 0.0 {
            BigBangPhase::Charging
        } else {
            BigBangPhase::Idle
        }
    }

    pub fn is_ready(&self, config: &BigBangConfig) -> bool {
        !self.animating && self.charge >= config.max_charge
    }

    /// Charge as a 0..=1 fraction for the HUD
    pub fn charge_fraction(&self, config: &BigBangConfig) -> f32 {
        if config.max_charge > 0.0 {
            (self.charge / config.max_charge).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Add charge, capped at the maximum
    pub fn add_charge(&mut self, amount: f32, config: &BigBangConfig) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.charge = (self.charge + amount).min(config.max_charge);
    }

    /// Still in the shake window before the pulse
    pub fn is_shaking(&self, config: &BigBangConfig) -> bool {
        self.animating && self.timer_ms > config.shake_threshold_ms
    }

    /// Start the animation if fully charged; returns whether it started
    pub fn activate(&mut self, config: &BigBangConfig) -> bool {
        if !self.is_ready(config) {
            return false;
        }
        self.animating = true;
        self.timer_ms = config.duration_ms;
        self.charge = 0.0;
        self.effect_triggered = false;
        log::info!("Big Bang activated");
        true
    }

    /// Advance the animation timer by `dt_ms`
    pub fn advance(&mut self, dt_ms: f32, config: &BigBangConfig) -> BigBangSignal {
        let mut signal = BigBangSignal::default();
        if !self.animating {
            return signal;
        }

        self.timer_ms -= dt_ms;

        if !self.is_shaking(config) && !self.effect_triggered {
            self.effect_triggered = true;
            signal.pulse = true;
        }

        if self.timer_ms <= 0.0 {
            self.animating = false;
            self.timer_ms = 0.0;
            self.effect_triggered = false;
            signal.finished = true;
        }

        signal
    }

    /// White-flash opacity for the dissipate phase (0 when not animating)
    pub fn flash_opacity(&self, config: &BigBangConfig) -> f32 {
        if !self.animating || self.is_shaking(config) {
            return 0.0;
        }
        if config.shake_threshold_ms <= 0.0 {
            return 0.0;
        }
        (self.timer_ms / config.shake_threshold_ms).clamp(0.0, 1.0)
    }
}
