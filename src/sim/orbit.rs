//! Two-body Keplerian ellipse reconstruction from instantaneous state.
//!
//! The solver treats a body and a chosen center as an isolated two-body
//! problem, even though the real field is dual-sourced. It is re-run every
//! tick rather than integrated, so it follows blend-factor changes at once.

use bevy::prelude::*;

use super::body::Body;
use super::settings::SimSettings;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct OrbitParams {
    pub semi_major_axis: f32,
    pub semi_minor_axis: f32,
    pub eccentricity: f32,
    pub periapsis_angle: f32,
    pub collides_with_center: bool,
}

impl OrbitParams {
    /// Unbound or non-finite orbit. Consumers skip drawing these.
    pub const DEGENERATE: OrbitParams = OrbitParams {
        semi_major_axis: f32::INFINITY,
        semi_minor_axis: f32::INFINITY,
        eccentricity: 1.0,
        periapsis_angle: 0.0,
        collides_with_center: false,
    };

    pub fn is_degenerate(&self) -> bool {
        !self.semi_major_axis.is_finite()
    }

    pub fn periapsis(&self) -> f32 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    pub fn apoapsis(&self) -> f32 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }
}

/// Gravitational parameter of `center` as the force model currently sees it.
pub fn effective_mu(center: &Body, player_mass: f32, settings: &SimSettings, blend: f32) -> f32 {
    let crossover = settings.crossover_multiplier();
    let mass = if let Some(gravitational_mass) = center.gravitational_mass() {
        gravitational_mass * (1.0 - blend) + player_mass * crossover * blend
    } else if center.is_player() && center.gravitational_center {
        center.mass() * crossover
    } else {
        center.mass()
    };
    settings.g * mass
}

pub fn solve_orbit(rel_pos: Vec2, rel_vel: Vec2, mu: f32, radii_sum: f32) -> OrbitParams {
    let r = rel_pos.length();
    if r <= 0.0 || mu <= 0.0 {
        return OrbitParams::DEGENERATE;
    }
    let v2 = rel_vel.length_squared();
    let energy = 0.5 * v2 - mu / r;
    if !(energy < 0.0) {
        return OrbitParams::DEGENERATE;
    }

    let a = -mu / (2.0 * energy);
    let e_vec = ((v2 - mu / r) * rel_pos - rel_pos.dot(rel_vel) * rel_vel) / mu;
    let e = e_vec.length();
    let b = a * (1.0 - e * e).max(0.0).sqrt();
    let angle = e_vec.y.atan2(e_vec.x);

    if !(a.is_finite() && b.is_finite() && e.is_finite() && angle.is_finite()) || e >= 1.0 {
        return OrbitParams::DEGENERATE;
    }

    OrbitParams {
        semi_major_axis: a,
        semi_minor_axis: b,
        eccentricity: e,
        periapsis_angle: angle,
        collides_with_center: a * (1.0 - e) <= radii_sum,
    }
}

/// Orbit of `body` around `center`, using the blended force model.
pub fn orbit_around(
    body: &Body,
    center: &Body,
    player_mass: f32,
    settings: &SimSettings,
    blend: f32,
) -> OrbitParams {
    let mu = effective_mu(center, player_mass, settings, blend);
    solve_orbit(
        body.pos - center.pos,
        body.vel - center.vel,
        mu,
        body.radius() + center.radius(),
    )
}
