use bevy::prelude::*;
use rand::Rng;

use super::body::Body;
use super::registry::BodyRegistry;
use super::settings::SimSettings;

/// Speed of a circular orbit at `r` around a body of `mass`.
pub fn circular_speed(g: f32, mass: f32, r: f32) -> f32 {
    if r <= 0.0 {
        return 0.0;
    }
    (g * mass / r).sqrt()
}

fn orbital_velocity(pos: Vec2, g: f32, mass: f32) -> Vec2 {
    pos.perp().normalize_or_zero() * circular_speed(g, mass, pos.length())
}

/// Builds a fresh session: sun at the origin, the player on a circular orbit
/// and a belt of ordinary masses orbiting the sun.
pub fn populate(settings: &SimSettings, rng: &mut impl Rng, now: f64) -> BodyRegistry {
    let mut registry = BodyRegistry::new();
    let g = settings.g;
    let sun_mass = settings.sun_gravitational_mass;

    registry.add(Body::sun(
        Vec2::ZERO,
        settings.initial_sun_game_mass,
        sun_mass,
        settings.sun_density,
        now,
        rng,
    ));

    let player_pos = Vec2::new(settings.player_orbit_radius, 0.0);
    registry.add(Body::player(
        player_pos,
        orbital_velocity(player_pos, g, sun_mass),
        settings.player_start_mass,
        settings.body_density,
        now,
        rng,
    ));

    let clear2 = settings.player_clear_radius * settings.player_clear_radius;
    for _ in 0..settings.population_count {
        let pos = loop {
            let ang = rng.gen::<f32>() * std::f32::consts::TAU;
            let r = rng.gen_range(settings.belt_inner_radius..settings.belt_outer_radius);
            let pos = Vec2::from_angle(ang) * r;
            if pos.distance_squared(player_pos) > clear2 {
                break pos;
            }
        };
        let mass = rng.gen_range(settings.population_min_mass..settings.population_max_mass);
        registry.add(Body::mass_body(
            pos,
            orbital_velocity(pos, g, sun_mass),
            mass,
            settings.body_density,
            now,
            rng,
        ));
    }

    info!(
        "populated session with {} bodies (sun game mass {:.0}, player mass {:.0})",
        registry.len(),
        settings.initial_sun_game_mass,
        settings.player_start_mass
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn session_has_one_sun_one_player_one_center() {
        let settings = SimSettings::default();
        let mut rng = StdRng::seed_from_u64(51);
        let reg = populate(&settings, &mut rng, 0.0);

        assert_eq!(reg.len(), settings.population_count + 2);
        assert_eq!(reg.iter().filter(|b| b.is_sun()).count(), 1);
        assert_eq!(reg.iter().filter(|b| b.is_player()).count(), 1);
        assert_eq!(reg.iter().filter(|b| b.gravitational_center).count(), 1);
        assert!(reg.sun().unwrap().gravitational_center);
    }

    #[test]
    fn belt_respects_bounds_and_player_clearance() {
        let settings = SimSettings::default();
        let mut rng = StdRng::seed_from_u64(52);
        let reg = populate(&settings, &mut rng, 0.0);
        let player = reg.player().unwrap().pos;
        for b in reg.iter().filter(|b| b.kind == crate::sim::body::BodyKind::Mass) {
            let r = b.pos.length();
            assert!(r >= settings.belt_inner_radius - 1e-2 && r <= settings.belt_outer_radius + 1e-2);
            assert!(b.pos.distance(player) > settings.player_clear_radius);
            assert!(b.mass() >= settings.population_min_mass);
            assert!(b.mass() < settings.population_max_mass);
        }
    }

    #[test]
    fn player_starts_on_circular_orbit() {
        let settings = SimSettings::default();
        let mut rng = StdRng::seed_from_u64(53);
        let reg = populate(&settings, &mut rng, 0.0);
        let p = reg.player().unwrap();
        let expected = circular_speed(settings.g, settings.sun_gravitational_mass, settings.player_orbit_radius);
        assert!((p.vel.length() - expected).abs() < 1e-2);
        assert!(p.vel.dot(p.pos).abs() < 1e-2);
    }

    #[test]
    fn same_seed_same_session() {
        let settings = SimSettings::default();
        let a = populate(&settings, &mut StdRng::seed_from_u64(54), 0.0);
        let b = populate(&settings, &mut StdRng::seed_from_u64(54), 0.0);
        let pa: Vec<_> = a.iter().map(|b| (b.pos, b.mass())).collect();
        let pb: Vec<_> = b.iter().map(|b| (b.pos, b.mass())).collect();
        assert_eq!(pa, pb);
    }
}
