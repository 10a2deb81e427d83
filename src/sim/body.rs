use std::f32::consts::PI;
use std::fmt;

use bevy::prelude::*;
use rand::Rng;

use super::orbit::OrbitParams;

/// Floor applied to the raw cube-root radius so no body is ever a point.
pub const MIN_RADIUS: f32 = 0.1;
pub const MIN_VISIBLE_RADIUS: f32 = 0.5;
pub const MIN_SUN_RADIUS: f32 = 1.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BodyKind {
    /// The sun's `mass` is its depletable game mass; `gravitational_mass`
    /// is only ever read by force calculations.
    Sun { gravitational_mass: f32 },
    Player,
    Mass,
    Spark { lifespan: f32 },
}

impl BodyKind {
    fn prefix(&self) -> &'static str {
        match self {
            BodyKind::Sun { .. } => "sun",
            BodyKind::Player => "player",
            BodyKind::Mass => "mass",
            BodyKind::Spark { .. } => "spark",
        }
    }
}

/// Bookkeeping id, `<role>-<millis>-<suffix>`. Not used by the physics.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BodyId(String);

impl BodyId {
    pub fn new(kind: &BodyKind, now: f64, rng: &mut impl Rng) -> Self {
        let millis = (now.max(0.0) * 1000.0) as u64;
        let suffix: u32 = rng.gen_range(0..0x10000);
        Self(format!("{}-{}-{:04x}", kind.prefix(), millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn radius_for_mass(mass: f32, density: f32) -> f32 {
    (3.0 * mass.max(0.0) / (4.0 * PI * density)).cbrt().max(MIN_RADIUS)
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    mass: f32,
    radius: f32,
    density: f32,
    pub gravitational_center: bool,
    pub created_at: f64,
    pub orbit: OrbitParams,
    pub trail_opacity: f32,
}

impl Body {
    pub fn new(
        kind: BodyKind,
        pos: Vec2,
        vel: Vec2,
        mass: f32,
        density: f32,
        now: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let mut body = Self {
            id: BodyId::new(&kind, now, rng),
            kind,
            pos,
            vel,
            mass: 0.0,
            radius: 0.0,
            density,
            gravitational_center: false,
            created_at: now,
            orbit: OrbitParams::DEGENERATE,
            trail_opacity: 0.0,
        };
        body.set_mass(mass);
        body
    }

    pub fn sun(
        pos: Vec2,
        game_mass: f32,
        gravitational_mass: f32,
        density: f32,
        now: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let mut sun = Self::new(
            BodyKind::Sun { gravitational_mass },
            pos,
            Vec2::ZERO,
            game_mass,
            density,
            now,
            rng,
        );
        sun.gravitational_center = true;
        sun
    }

    pub fn player(
        pos: Vec2,
        vel: Vec2,
        mass: f32,
        density: f32,
        now: f64,
        rng: &mut impl Rng,
    ) -> Self {
        Self::new(BodyKind::Player, pos, vel, mass, density, now, rng)
    }

    pub fn mass_body(
        pos: Vec2,
        vel: Vec2,
        mass: f32,
        density: f32,
        now: f64,
        rng: &mut impl Rng,
    ) -> Self {
        Self::new(BodyKind::Mass, pos, vel, mass, density, now, rng)
    }

    pub fn spark(
        pos: Vec2,
        vel: Vec2,
        mass: f32,
        lifespan: f32,
        density: f32,
        now: f64,
        rng: &mut impl Rng,
    ) -> Self {
        Self::new(
            BodyKind::Spark { lifespan },
            pos,
            vel,
            mass,
            density,
            now,
            rng,
        )
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Sets the mass (clamped at zero) and recomputes the radius.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass.max(0.0);
        let floor = if self.is_sun() {
            MIN_SUN_RADIUS
        } else {
            MIN_VISIBLE_RADIUS
        };
        self.radius = radius_for_mass(self.mass, self.density).max(floor);
    }

    pub fn is_sun(&self) -> bool {
        matches!(self.kind, BodyKind::Sun { .. })
    }

    pub fn is_player(&self) -> bool {
        self.kind == BodyKind::Player
    }

    pub fn is_spark(&self) -> bool {
        matches!(self.kind, BodyKind::Spark { .. })
    }

    pub fn gravitational_mass(&self) -> Option<f32> {
        match self.kind {
            BodyKind::Sun { gravitational_mass } => Some(gravitational_mass),
            _ => None,
        }
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.created_at
    }

    pub fn is_expired(&self, now: f64) -> bool {
        match self.kind {
            BodyKind::Spark { lifespan } => self.age(now) > lifespan as f64,
            _ => false,
        }
    }

    /// Freshly created masses and sparks cannot be eaten straight away.
    /// The sun and the player are never immune.
    pub fn is_immune(&self, now: f64, window: f32) -> bool {
        matches!(self.kind, BodyKind::Mass | BodyKind::Spark { .. })
            && self.age(now) < window as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn radius_tracks_mass() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = Body::mass_body(Vec2::ZERO, Vec2::ZERO, 100.0, 0.05, 0.0, &mut rng);
        let r0 = b.radius();
        assert!((r0 - radius_for_mass(100.0, 0.05)).abs() < 1e-5);
        b.set_mass(800.0);
        assert!((b.radius() - 2.0 * r0).abs() < 1e-3);
    }

    #[test]
    fn radius_has_visible_floor() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = Body::mass_body(Vec2::ZERO, Vec2::ZERO, 0.0, 0.05, 0.0, &mut rng);
        assert_eq!(b.radius(), MIN_VISIBLE_RADIUS);
        b.set_mass(-5.0);
        assert_eq!(b.mass(), 0.0);

        let sun = Body::sun(Vec2::ZERO, 0.0, 1e7, 0.01, 0.0, &mut rng);
        assert_eq!(sun.radius(), MIN_SUN_RADIUS);
    }

    #[test]
    fn sun_is_center_and_keeps_gravitational_mass() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut sun = Body::sun(Vec2::ZERO, 32_400.0, 4e7, 0.01, 0.0, &mut rng);
        assert!(sun.gravitational_center);
        sun.set_mass(100.0);
        assert_eq!(sun.gravitational_mass(), Some(4e7));
        assert_eq!(sun.mass(), 100.0);
    }

    #[test]
    fn ids_are_role_prefixed() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = Body::player(Vec2::ZERO, Vec2::ZERO, 180.0, 0.05, 1.25, &mut rng);
        assert!(p.id.as_str().starts_with("player-1250-"));
    }

    #[test]
    fn sparks_expire_and_are_immune_while_young() {
        let mut rng = StdRng::seed_from_u64(4);
        let s = Body::spark(Vec2::ZERO, Vec2::ZERO, 1.0, 1.0, 0.05, 0.0, &mut rng);
        assert!(s.is_immune(0.1, 0.5));
        assert!(!s.is_immune(0.6, 0.5));
        assert!(!s.is_expired(0.9));
        assert!(s.is_expired(1.1));

        let p = Body::player(Vec2::ZERO, Vec2::ZERO, 180.0, 0.05, 0.0, &mut rng);
        assert!(!p.is_immune(0.0, 0.5));
        assert!(!p.is_expired(100.0));
    }
}
