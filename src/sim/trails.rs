use bevy::prelude::*;

use super::orbit::{orbit_around, OrbitParams};
use super::registry::BodyRegistry;
use super::settings::SimSettings;

/// Refreshes orbit caches near the player and eases trail opacity toward
/// visibility. Bodies out of range keep a stale cache and fade out.
pub fn update_orbits_and_trails(
    registry: &mut BodyRegistry,
    settings: &SimSettings,
    blend: f32,
    real_dt: f32,
) {
    let Some(center) = registry.center_index().and_then(|i| registry.get(i)).cloned() else {
        return;
    };
    let Some(player) = registry.player().map(|p| (p.pos, p.mass())) else {
        return;
    };
    let (player_pos, player_mass) = player;
    let range2 = settings.orbit_update_radius * settings.orbit_update_radius;
    let step = settings.trail_fade_rate * real_dt;

    for b in registry.iter_mut() {
        let target = if b.gravitational_center {
            b.orbit = OrbitParams::DEGENERATE;
            0.0
        } else if b.is_player() || b.pos.distance_squared(player_pos) <= range2 {
            b.orbit = orbit_around(b, &center, player_mass, settings, blend);
            if b.orbit.is_degenerate() {
                0.0
            } else {
                1.0
            }
        } else {
            0.0
        };
        b.trail_opacity = approach(b.trail_opacity, target, step);
    }
}

fn approach(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else {
        (current - step).max(target)
    }
    .clamp(0.0, 1.0)
}
