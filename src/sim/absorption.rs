//! Player-versus-sun absorption.
//!
//! Drives the gravity blend factor and the win transition. The blend only
//! ever moves continuously: it decays at a fixed rate when the player is not
//! absorbing and follows absorption progress while it is.

use bevy::prelude::*;

use super::error::ResetReason;
use super::registry::BodyRegistry;
use super::settings::SimSettings;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AbsorptionState {
    #[default]
    NotEligible,
    OutOfRange,
    Absorbing,
    Won,
}

/// Blend, progress and state carried between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbsorptionStatus {
    pub state: AbsorptionState,
    pub gravity_blend: f32,
    pub progress: f32,
}

impl Default for AbsorptionStatus {
    fn default() -> Self {
        Self {
            state: AbsorptionState::NotEligible,
            gravity_blend: 0.0,
            progress: 0.0,
        }
    }
}

impl AbsorptionStatus {
    pub fn is_won(&self) -> bool {
        self.state == AbsorptionState::Won
    }
}

/// `1` at touching distance, `0` at the edge of absorption range.
pub fn proximity(dist: f32, touch: f32, range: f32) -> f32 {
    if range <= touch {
        return if dist <= touch { 1.0 } else { 0.0 };
    }
    (1.0 - (dist - touch) / (range - touch)).clamp(0.0, 1.0)
}

/// How far past the eligibility threshold the player is, normalized and
/// capped at twice the threshold.
pub fn advantage(mass_ratio: f32, start_ratio: f32) -> f32 {
    ((mass_ratio - start_ratio) / start_ratio).clamp(0.0, 2.0)
}

fn approach(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
}

/// Runs one tick of the absorption machine.
pub fn update_absorption(
    registry: &mut BodyRegistry,
    status: &mut AbsorptionStatus,
    settings: &SimSettings,
    dt: f32,
) -> Result<(), ResetReason> {
    if status.is_won() {
        status.gravity_blend = 1.0;
        return Ok(());
    }
    let (Some(si), Some(pi)) = (registry.sun_index(), registry.player_index()) else {
        return Ok(());
    };

    let (sun_pos, sun_vel, sun_radius, remaining) = {
        let Some(sun) = registry.get(si) else {
            return Ok(());
        };
        (sun.pos, sun.vel, sun.radius(), sun.mass())
    };
    let Some(player) = registry.get_mut(pi) else {
        return Ok(());
    };

    let initial = settings.initial_sun_game_mass;
    let mass_ratio = player.mass() / initial;
    let dist = player.pos.distance(sun_pos);
    let touch = player.radius() + sun_radius;
    let range = touch * settings.absorption_range_multiplier;
    let previous = status.state;

    if mass_ratio < settings.absorption_start_ratio {
        if dist < settings.lethal_touch_fraction * touch {
            return Err(ResetReason::TouchedSunUnderweight { mass_ratio });
        }
        status.state = AbsorptionState::NotEligible;
        status.gravity_blend = (status.gravity_blend - settings.blend_decay_rate * dt).max(0.0);
    } else if dist > range {
        status.state = AbsorptionState::OutOfRange;
        status.gravity_blend = (status.gravity_blend - settings.blend_relax_rate * dt).max(0.0);
    } else {
        status.state = AbsorptionState::Absorbing;
        let rate = settings.base_absorption_rate
            * proximity(dist, touch, range)
            * advantage(mass_ratio, settings.absorption_start_ratio).max(0.2);
        let amount = (remaining * rate * dt).min(remaining).max(0.0);

        let total = player.mass() + amount;
        if total > 0.0 {
            player.vel = (player.vel * player.mass() + sun_vel * amount) / total;
        }
        player.set_mass(total);
        let left = remaining - amount;
        if let Some(sun) = registry.get_mut(si) {
            sun.set_mass(left);
        }

        status.progress = (1.0 - left / initial).clamp(0.0, 1.0);
        // Follows progress, but re-entering range after a relax must not snap.
        let target = status.progress.min(1.0);
        let step = settings.max_blend_rate() * dt;
        status.gravity_blend = approach(status.gravity_blend, target, step);

        if left < settings.win_fraction * initial {
            complete_absorption(registry, status);
            return Ok(());
        }
    }

    if status.state != previous {
        debug!("absorption {:?} -> {:?}", previous, status.state);
    }
    Ok(())
}

/// Terminal transition: the player swallows what is left of the sun and
/// becomes the only gravitational center.
pub fn complete_absorption(registry: &mut BodyRegistry, status: &mut AbsorptionStatus) {
    let Some(si) = registry.sun_index() else {
        return;
    };
    let sun = registry.remove_at(si);
    for b in registry.iter_mut() {
        b.gravitational_center = false;
    }
    if let Some(pi) = registry.player_index() {
        if let Some(player) = registry.get_mut(pi) {
            player.set_mass(player.mass() + sun.mass());
            player.gravitational_center = true;
            info!(
                "sun {} consumed, player {} is the new center at mass {:.1}",
                sun.id,
                player.id,
                player.mass()
            );
        }
    }
    status.state = AbsorptionState::Won;
    status.gravity_blend = 1.0;
    status.progress = 1.0;
}
