use bevy::prelude::*;

use super::error::SettingsError;

/// Every tuned constant of a play session.
///
/// Units are stylized world units and seconds; nothing here is physical.
#[derive(Resource, Clone, Debug)]
pub struct SimSettings {
    pub g: f32,
    /// Fixed mass the sun uses in force calculations. Never depleted.
    pub sun_gravitational_mass: f32,
    /// Depletable sun mass at session start, the player-facing progress pool.
    pub initial_sun_game_mass: f32,
    pub player_start_mass: f32,
    pub body_density: f32,
    pub sun_density: f32,
    pub softening: f32,
    pub max_speed: f32,
    pub max_dt: f32,
    pub base_game_speed: f32,
    pub fast_game_speed: f32,

    // Collisions
    pub min_body_mass: f32,
    pub min_player_mass: f32,
    pub collision_transfer_rate: f32, // fraction of the small body per second
    pub immunity_window: f32,

    // Absorption
    pub absorption_start_ratio: f32,
    pub absorption_range_multiplier: f32,
    pub base_absorption_rate: f32,
    pub lethal_touch_fraction: f32,
    pub blend_decay_rate: f32,
    pub blend_relax_rate: f32,
    pub win_fraction: f32,

    // Ejection
    pub base_ejection_percent: f32,
    pub max_ejection_percent: f32,
    pub quick_click_threshold: f32,
    pub combo_growth: f32,
    pub max_ejection_multiplier: f32,
    pub combo_decay_interval: f32,
    pub combo_decay_rate: f32,
    pub base_ejection_speed: f32,
    pub propulsion_multiplier: f32,
    pub spark_mass_fraction: f32,
    pub min_sparks: u32,
    pub max_sparks: u32,
    pub spark_spread: f32, // radians at full intensity
    pub spark_speed_jitter: f32,
    pub spark_lifespan: f32,

    // Population
    pub population_count: usize,
    pub belt_inner_radius: f32,
    pub belt_outer_radius: f32,
    pub population_min_mass: f32,
    pub population_max_mass: f32,
    pub player_orbit_radius: f32,
    pub player_clear_radius: f32,

    // Orbit cache and trails
    pub orbit_update_radius: f32,
    pub trail_fade_rate: f32,

    pub deterministic: bool,
    pub seed: u64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            g: 1.0,
            sun_gravitational_mass: 4.0e7,
            initial_sun_game_mass: 32_400.0, // 180 * 180
            player_start_mass: 180.0,
            body_density: 0.05,
            sun_density: 0.01,
            softening: 1.0,
            max_speed: 15_000.0,
            max_dt: 0.1,
            base_game_speed: 1.0,
            fast_game_speed: 4.0,

            min_body_mass: 0.05,
            min_player_mass: 10.0,
            collision_transfer_rate: 4.0,
            immunity_window: 0.5,

            absorption_start_ratio: 0.4,
            absorption_range_multiplier: 3.0,
            base_absorption_rate: 0.15,
            lethal_touch_fraction: 0.8,
            blend_decay_rate: 0.5,
            blend_relax_rate: 0.1,
            win_fraction: 0.02,

            base_ejection_percent: 0.02,
            max_ejection_percent: 0.15,
            quick_click_threshold: 0.3,
            combo_growth: 1.5,
            max_ejection_multiplier: 5.0,
            combo_decay_interval: 0.25,
            combo_decay_rate: 0.8,
            base_ejection_speed: 120.0,
            propulsion_multiplier: 1.0,
            spark_mass_fraction: 0.1,
            min_sparks: 2,
            max_sparks: 12,
            spark_spread: 0.6,
            spark_speed_jitter: 0.5,
            spark_lifespan: 1.2,

            population_count: 150,
            belt_inner_radius: 400.0,
            belt_outer_radius: 2500.0,
            population_min_mass: 1.0,
            population_max_mass: 40.0,
            player_orbit_radius: 900.0,
            player_clear_radius: 120.0,

            orbit_update_radius: 1500.0,
            trail_fade_rate: 2.0,

            deterministic: false,
            seed: 0,
        }
    }
}

impl SimSettings {
    /// Scale that makes the player's game-scale mass pull like the sun's
    /// gravitational mass at the same game-mass fraction.
    pub fn crossover_multiplier(&self) -> f32 {
        self.sun_gravitational_mass / self.initial_sun_game_mass
    }

    /// Fastest the gravity blend may move, per second of game time.
    pub fn max_blend_rate(&self) -> f32 {
        self.blend_decay_rate
            .max(self.blend_relax_rate)
            .max(2.0 * self.base_absorption_rate)
    }

    /// Game speed for the current fast-mode input.
    pub fn game_speed(&self, fast_mode: bool) -> f32 {
        if fast_mode {
            self.fast_game_speed
        } else {
            self.base_game_speed
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("g", self.g),
            ("sun_gravitational_mass", self.sun_gravitational_mass),
            ("initial_sun_game_mass", self.initial_sun_game_mass),
            ("player_start_mass", self.player_start_mass),
            ("body_density", self.body_density),
            ("sun_density", self.sun_density),
            ("max_speed", self.max_speed),
            ("max_dt", self.max_dt),
            ("base_game_speed", self.base_game_speed),
            ("fast_game_speed", self.fast_game_speed),
            ("min_body_mass", self.min_body_mass),
            ("min_player_mass", self.min_player_mass),
            ("collision_transfer_rate", self.collision_transfer_rate),
            ("absorption_range_multiplier", self.absorption_range_multiplier),
            ("base_absorption_rate", self.base_absorption_rate),
            ("blend_decay_rate", self.blend_decay_rate),
            ("blend_relax_rate", self.blend_relax_rate),
            ("combo_growth", self.combo_growth),
            ("combo_decay_interval", self.combo_decay_interval),
            ("base_ejection_speed", self.base_ejection_speed),
            ("spark_lifespan", self.spark_lifespan),
            ("orbit_update_radius", self.orbit_update_radius),
            ("trail_fade_rate", self.trail_fade_rate),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::NotPositive { name, value });
            }
        }

        let fractions = [
            ("absorption_start_ratio", self.absorption_start_ratio),
            ("lethal_touch_fraction", self.lethal_touch_fraction),
            ("win_fraction", self.win_fraction),
            ("base_ejection_percent", self.base_ejection_percent),
            ("max_ejection_percent", self.max_ejection_percent),
            ("combo_decay_rate", self.combo_decay_rate),
            ("spark_mass_fraction", self.spark_mass_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..1.0).contains(&value) {
                return Err(SettingsError::NotAFraction { name, value });
            }
        }

        if self.base_ejection_percent >= self.max_ejection_percent {
            return Err(SettingsError::InvertedRange {
                name: "ejection_percent",
                min: self.base_ejection_percent,
                max: self.max_ejection_percent,
            });
        }
        if self.min_sparks > self.max_sparks {
            return Err(SettingsError::InvertedRange {
                name: "sparks",
                min: self.min_sparks as f32,
                max: self.max_sparks as f32,
            });
        }
        if self.population_min_mass >= self.population_max_mass {
            return Err(SettingsError::InvertedRange {
                name: "population_mass",
                min: self.population_min_mass,
                max: self.population_max_mass,
            });
        }
        if self.belt_inner_radius >= self.belt_outer_radius {
            return Err(SettingsError::InvertedRange {
                name: "belt_radius",
                min: self.belt_inner_radius,
                max: self.belt_outer_radius,
            });
        }
        // The farthest belt point from the player sits opposite it across the sun.
        let belt_reach = self.belt_outer_radius + self.player_orbit_radius;
        if self.player_clear_radius >= belt_reach {
            return Err(SettingsError::BeltFullyCleared {
                clear_radius: self.player_clear_radius,
                belt_reach,
            });
        }
        if self.max_ejection_multiplier < 1.0 {
            return Err(SettingsError::NotPositive {
                name: "max_ejection_multiplier",
                value: self.max_ejection_multiplier,
            });
        }
        if self.player_start_mass <= self.min_player_mass {
            return Err(SettingsError::InvertedRange {
                name: "player_mass",
                min: self.min_player_mass,
                max: self.player_start_mass,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SimSettings::default().validate().is_ok());
    }

    #[test]
    fn crossover_matches_mass_ratio() {
        let s = SimSettings::default();
        let expected = s.sun_gravitational_mass / 32_400.0;
        assert!((s.crossover_multiplier() - expected).abs() < 1e-3);
    }

    #[test]
    fn rejects_inverted_ejection_range() {
        let s = SimSettings {
            base_ejection_percent: 0.2,
            max_ejection_percent: 0.1,
            ..SimSettings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SettingsError::InvertedRange { name: "ejection_percent", .. })
        ));
    }

    #[test]
    fn rejects_non_positive_rates() {
        let s = SimSettings {
            collision_transfer_rate: 0.0,
            ..SimSettings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SettingsError::NotPositive { name: "collision_transfer_rate", .. })
        ));
    }

    #[test]
    fn rejects_inverted_spark_and_mass_ranges() {
        let s = SimSettings {
            min_sparks: 5,
            max_sparks: 2,
            ..SimSettings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SettingsError::InvertedRange { name: "sparks", .. })
        ));

        let s = SimSettings {
            population_min_mass: 40.0,
            population_max_mass: 1.0,
            ..SimSettings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SettingsError::InvertedRange { name: "population_mass", .. })
        ));
    }

    #[test]
    fn rejects_clear_radius_covering_the_belt() {
        let s = SimSettings {
            player_clear_radius: 5_000.0,
            ..SimSettings::default()
        };
        assert!(matches!(
            s.validate(),
            Err(SettingsError::BeltFullyCleared { .. })
        ));
    }

    #[test]
    fn blend_rate_bounds_every_blend_rule() {
        let s = SimSettings::default();
        let r = s.max_blend_rate();
        assert!(r >= s.blend_decay_rate);
        assert!(r >= s.blend_relax_rate);
        assert!(r >= 2.0 * s.base_absorption_rate);
    }

    #[test]
    fn rejects_win_fraction_outside_unit_interval() {
        let s = SimSettings {
            win_fraction: 1.5,
            ..SimSettings::default()
        };
        assert!(s.validate().is_err());
    }
}
