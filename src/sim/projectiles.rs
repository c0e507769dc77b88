//! Projectile flight and explosion decay

use super::state::{Explosion, Player, Projectile};
use crate::{Viewport, frame_scale};

/// Move projectiles and drop the ones that expired or left the screen.
///
/// Returns the explosions left behind by dying explosive projectiles.
pub fn update_projectiles(
    projectiles: &mut Vec<Projectile>,
    viewport: &Viewport,
    dt_ms: f32,
) -> Vec<Explosion> {
    let scale = frame_scale(dt_ms);
    let mut detonations = Vec::new();

    projectiles.retain_mut(|p| {
        p.pos += p.vel * scale;
        p.lifespan_ticks = p.lifespan_ticks.saturating_sub(1);

        if p.lifespan_ticks > 0 && viewport.contains(p.pos) {
            return true;
        }
        detonations.extend(p.detonation());
        false
    });

    detonations
}

/// Count down explosion lifetimes, removing finished ones
pub fn update_explosions(explosions: &mut Vec<Explosion>) {
    explosions.retain_mut(|e| {
        e.duration_ticks = e.duration_ticks.saturating_sub(1);
        e.duration_ticks > 0
    });
}

/// Projectiles that struck the player this step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectileHits {
    pub damage: f32,
    pub hits: u32,
    pub detonations: Vec<Explosion>,
}

/// Remove projectiles touching the player and total their damage
pub fn resolve_projectile_hits(projectiles: &mut Vec<Projectile>, player: &Player) -> ProjectileHits {
    let mut out = ProjectileHits::default();
    let Some(player_pos) = player.pos else {
        return out;
    };

    projectiles.retain(|p| {
        if p.pos.distance(player_pos) >= player.size + p.size {
            return true;
        }
        if p.damage.is_finite() {
            out.damage += p.damage;
        }
        out.hits += 1;
        out.detonations.extend(p.detonation());
        false
    });

    out
}

/// Damage from every explosion the player is standing in
pub fn explosion_damage(explosions: &[Explosion], player: &Player, dt_ms: f32) -> f32 {
    let Some(player_pos) = player.pos else {
        return 0.0;
    };
    let scale = frame_scale(dt_ms);
    explosions
        .iter()
        .filter(|e| e.pos.distance(player_pos) < e.radius)
        .filter(|e| e.damage.is_finite())
        .map(|e| e.damage * scale)
        .sum()
}
