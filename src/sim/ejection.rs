use bevy::prelude::*;
use rand::Rng;

use super::body::Body;
use super::registry::BodyRegistry;
use super::settings::SimSettings;

/// Where the player wants to go. Mass is thrown the opposite way.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum EjectAim {
    /// World-space angle in radians.
    Angle(f32),
    /// World-space point.
    Target(Vec2),
}

impl EjectAim {
    pub fn direction_from(&self, origin: Vec2) -> Option<Vec2> {
        let dir = match *self {
            EjectAim::Angle(a) => Vec2::from_angle(a),
            EjectAim::Target(p) => (p - origin).normalize_or_zero(),
        };
        (dir != Vec2::ZERO && dir.is_finite()).then_some(dir)
    }
}

/// Rapid-fire multiplier state, reset with the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EjectionCombo {
    pub multiplier: f32,
    pub last_eject_at: Option<f64>,
    pub last_decay_at: f64,
}

impl Default for EjectionCombo {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            last_eject_at: None,
            last_decay_at: 0.0,
        }
    }
}

impl EjectionCombo {
    /// Multiplier a click at `now` would get, without recording it.
    pub fn next_multiplier(&self, now: f64, settings: &SimSettings) -> f32 {
        let quick = self
            .last_eject_at
            .is_some_and(|t| now - t < settings.quick_click_threshold as f64);
        if quick {
            (self.multiplier * settings.combo_growth).min(settings.max_ejection_multiplier)
        } else {
            1.0
        }
    }

    /// Grows the multiplier on a quick follow-up click, otherwise resets it.
    pub fn register(&mut self, now: f64, settings: &SimSettings) -> f32 {
        self.multiplier = self.next_multiplier(now, settings);
        self.last_eject_at = Some(now);
        self.last_decay_at = now;
        self.multiplier
    }

    /// Relaxes the multiplier toward 1 in fixed steps once clicks stop.
    pub fn decay(&mut self, now: f64, settings: &SimSettings) {
        if self.multiplier <= 1.0 {
            return;
        }
        let Some(last) = self.last_eject_at else {
            return;
        };
        if now - last <= settings.quick_click_threshold as f64 {
            return;
        }
        while now - self.last_decay_at >= settings.combo_decay_interval as f64 {
            self.last_decay_at += settings.combo_decay_interval as f64;
            self.multiplier = 1.0 + (self.multiplier - 1.0) * settings.combo_decay_rate;
            if self.multiplier - 1.0 < 0.01 {
                self.multiplier = 1.0;
                break;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EjectionReport {
    pub ejected_mass: f32,
    pub intensity: f32,
    pub multiplier: f32,
    pub main_speed: f32,
    pub sparks: usize,
}

/// Mass the player may throw right now, or `None` if the floor leaves less
/// than a body that would survive cleanup.
pub fn ejectable_mass(player_mass: f32, multiplier: f32, settings: &SimSettings) -> Option<f32> {
    let wanted = (player_mass * settings.base_ejection_percent * multiplier)
        .min(player_mass * settings.max_ejection_percent);
    let amount = wanted.min(player_mass - settings.min_player_mass);
    (amount > 0.0 && amount >= settings.min_body_mass).then_some(amount)
}

/// Spark count and the total mass they share. Sparks that would fall under
/// `min_body_mass` are dropped and their mass stays with the main ejecta.
pub fn spark_split(ejected: f32, intensity: f32, settings: &SimSettings) -> (usize, f32) {
    if settings.spark_mass_fraction <= 0.0 {
        return (0, 0.0);
    }
    let span = settings.max_sparks.saturating_sub(settings.min_sparks) as f32;
    let wanted = (settings.min_sparks as f32 + span * intensity).round() as usize;
    let total = ejected * settings.spark_mass_fraction;
    let affordable = (total / settings.min_body_mass).floor() as usize;
    let count = wanted.min(affordable);
    if count == 0 || ejected - total < settings.min_body_mass {
        return (0, 0.0);
    }
    (count, total)
}

/// Where the ejected fraction falls between the base and max percentages.
pub fn ejection_intensity(ejected: f32, player_mass: f32, settings: &SimSettings) -> f32 {
    let fraction = ejected / player_mass;
    let span = settings.max_ejection_percent - settings.base_ejection_percent;
    ((fraction - settings.base_ejection_percent) / span).clamp(0.0, 1.0)
}

/// Splits mass off the player, spawning the main ejecta and cosmetic sparks
/// behind it and kicking the player toward `aim`.
pub fn eject(
    registry: &mut BodyRegistry,
    combo: &mut EjectionCombo,
    settings: &SimSettings,
    aim: EjectAim,
    now: f64,
    rng: &mut impl Rng,
) -> Option<EjectionReport> {
    let pi = registry.player_index()?;
    let (player_pos, player_vel, mass) = {
        let p = registry.get(pi)?;
        (p.pos, p.vel, p.mass())
    };
    if mass <= settings.min_player_mass {
        return None;
    }
    let aim_dir = aim.direction_from(player_pos)?;
    let dir = -aim_dir;

    let multiplier = combo.next_multiplier(now, settings);
    let ejected = ejectable_mass(mass, multiplier, settings)?;
    combo.register(now, settings);
    let intensity = ejection_intensity(ejected, mass, settings);
    let remaining = mass - ejected;

    let base_mass = mass * settings.base_ejection_percent;
    let main_speed = settings.base_ejection_speed * (base_mass / ejected).sqrt();

    let (spark_count, spark_total) = spark_split(ejected, intensity, settings);
    let main_mass = ejected - spark_total;

    let player_radius = {
        let p = registry.get_mut(pi)?;
        p.set_mass(remaining);
        p.vel -= dir * (ejected * main_speed / remaining) * settings.propulsion_multiplier;
        p.radius()
    };

    let mut main = Body::mass_body(
        player_pos,
        player_vel + dir * main_speed,
        main_mass,
        settings.body_density,
        now,
        rng,
    );
    main.pos = player_pos + dir * (player_radius + main.radius());
    registry.add(main);

    let base_angle = dir.y.atan2(dir.x);
    let spread = settings.spark_spread * intensity.max(0.2);
    for _ in 0..spark_count {
        let angle = base_angle + (rng.gen::<f32>() * 2.0 - 1.0) * spread;
        let jitter = 1.0 + (rng.gen::<f32>() * 2.0 - 1.0) * settings.spark_speed_jitter;
        let speed = main_speed * (1.0 + intensity) * jitter.max(0.1);
        let lifespan = settings.spark_lifespan * (0.75 + 0.5 * rng.gen::<f32>());
        let sdir = Vec2::from_angle(angle);
        let mut spark = Body::spark(
            player_pos,
            player_vel + sdir * speed,
            spark_total / spark_count as f32,
            lifespan,
            settings.body_density,
            now,
            rng,
        );
        spark.pos = player_pos + sdir * (player_radius + spark.radius());
        registry.add(spark);
    }

    debug!(
        "ejected {:.2} (x{:.2}, intensity {:.2}) with {} sparks",
        ejected, multiplier, intensity, spark_count
    );
    Some(EjectionReport {
        ejected_mass: ejected,
        intensity,
        multiplier,
        main_speed,
        sparks: spark_count,
    })
}
