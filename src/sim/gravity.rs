use bevy::prelude::*;

use super::error::ResetReason;
use super::registry::BodyRegistry;
use super::settings::SimSettings;

/// One point source of the blended field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravitySource {
    pub index: usize,
    pub pos: Vec2,
    pub effective_mass: f32,
}

/// Resolves which bodies pull this tick and how hard.
///
/// At most two sources exist: the sun weighted by `1 - blend` and the player
/// weighted by `blend`. After the win the player is the sole source.
pub fn gravity_sources(
    registry: &BodyRegistry,
    settings: &SimSettings,
    blend: f32,
    game_won: bool,
) -> Result<Vec<GravitySource>, ResetReason> {
    let sun = registry.iter().enumerate().find(|(_, b)| b.is_sun());
    let player = registry.iter().enumerate().find(|(_, b)| b.is_player());
    if sun.is_none() && player.is_none() && !game_won {
        return Err(ResetReason::NoGravitySource);
    }

    let crossover = settings.crossover_multiplier();
    let mut sources = Vec::with_capacity(2);

    if let Some((index, b)) = sun {
        if blend < 1.0 {
            sources.push(GravitySource {
                index,
                pos: b.pos,
                effective_mass: b.gravitational_mass().unwrap_or_default() * (1.0 - blend),
            });
        }
    }

    if let Some((index, b)) = player {
        let weight = if sun.is_none() && game_won { 1.0 } else { blend };
        if weight > 0.0 {
            sources.push(GravitySource {
                index,
                pos: b.pos,
                effective_mass: b.mass() * crossover * weight,
            });
        }
    }

    Ok(sources)
}

/// Acceleration toward a point mass, softened so zero separation is finite.
pub fn acceleration_toward(from: Vec2, source: Vec2, g: f32, mass: f32, softening: f32) -> Vec2 {
    let delta = source - from;
    let dist = (delta.length_squared() + softening).sqrt();
    delta * (g * mass / (dist * dist * dist))
}

/// Applies the blended field to every body, clamps speed and integrates
/// positions with explicit Euler.
pub fn apply_gravity(
    registry: &mut BodyRegistry,
    settings: &SimSettings,
    blend: f32,
    game_won: bool,
    dt: f32,
) -> Result<(), ResetReason> {
    let sources = gravity_sources(registry, settings, blend, game_won)?;
    let sun = registry.sun_index();

    for (i, b) in registry.iter_mut().enumerate() {
        // The sun is pinned; nothing pulls on it.
        if Some(i) != sun {
            for s in sources.iter().filter(|s| s.index != i) {
                let acc = acceleration_toward(
                    b.pos,
                    s.pos,
                    settings.g,
                    s.effective_mass,
                    settings.softening,
                );
                b.vel += acc * dt;
            }
            b.vel = b.vel.clamp_length_max(settings.max_speed);
        }
        b.pos += b.vel * dt;
    }
    Ok(())
}
