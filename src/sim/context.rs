use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::absorption::{update_absorption, AbsorptionState, AbsorptionStatus};
use super::collision::resolve_collisions;
use super::ejection::{eject, EjectAim, EjectionCombo, EjectionReport};
use super::error::{ResetReason, SettingsError};
use super::gravity::apply_gravity;
use super::population::populate;
use super::registry::BodyRegistry;
use super::settings::SimSettings;
use super::trails::update_orbits_and_trails;

/// External inputs consumed by one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickInput {
    pub eject: Option<EjectAim>,
    pub fast_mode: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub reset: Option<ResetReason>,
    pub won_this_tick: bool,
    pub ejection: Option<EjectionReport>,
}

impl TickOutcome {
    pub fn reset_requested(&self) -> bool {
        self.reset.is_some()
    }
}

/// Scalars a HUD reads between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    pub sun_absorption_progress: f32,
    pub gravity_blend: f32,
    pub game_won: bool,
    pub player_mass: Option<f32>,
    pub body_count: usize,
    pub ejection_multiplier: f32,
    pub absorption_state: AbsorptionState,
}

/// Everything one play session owns. Replaced wholesale on reset.
#[derive(Clone, Debug)]
pub struct SimContext {
    pub settings: SimSettings,
    pub registry: BodyRegistry,
    pub absorption: AbsorptionStatus,
    pub combo: EjectionCombo,
    /// Session clock in seconds of clamped real time.
    pub now: f64,
    rng: StdRng,
}

impl Default for SimContext {
    /// A session on the stock settings.
    fn default() -> Self {
        Self::seeded(SimSettings::default())
    }
}

impl SimContext {
    /// Validates `settings` and populates a fresh session.
    pub fn new(settings: SimSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::seeded(settings))
    }

    /// A context over a caller-built registry, with no population pass.
    /// `reset()` repopulates from `settings`, so they are validated here too.
    pub fn from_registry(
        settings: SimSettings,
        registry: BodyRegistry,
        seed: u64,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            registry,
            absorption: AbsorptionStatus::default(),
            combo: EjectionCombo::default(),
            now: 0.0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn seeded(settings: SimSettings) -> Self {
        let rng = if settings.deterministic {
            StdRng::seed_from_u64(settings.seed)
        } else {
            StdRng::from_entropy()
        };
        Self::with_rng(settings, rng)
    }

    fn with_rng(settings: SimSettings, mut rng: StdRng) -> Self {
        let registry = populate(&settings, &mut rng, 0.0);
        Self {
            settings,
            registry,
            absorption: AbsorptionStatus::default(),
            combo: EjectionCombo::default(),
            now: 0.0,
            rng,
        }
    }

    /// Rebuilds sun, player and population from scratch, continuing the same
    /// random stream.
    pub fn reset(&mut self) {
        info!("resetting session after {:.1}s", self.now);
        let fresh = Self::with_rng(self.settings.clone(), self.rng.clone());
        *self = fresh;
    }

    pub fn gravity_blend(&self) -> f32 {
        self.absorption.gravity_blend
    }

    pub fn game_won(&self) -> bool {
        self.absorption.is_won()
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            sun_absorption_progress: self.absorption.progress,
            gravity_blend: self.absorption.gravity_blend,
            game_won: self.game_won(),
            player_mass: self.registry.player().map(|p| p.mass()),
            body_count: self.registry.len(),
            ejection_multiplier: self.combo.multiplier,
            absorption_state: self.absorption.state,
        }
    }

    /// Handles one discrete eject input at the current clock.
    pub fn eject(&mut self, aim: EjectAim) -> Option<EjectionReport> {
        eject(
            &mut self.registry,
            &mut self.combo,
            &self.settings,
            aim,
            self.now,
            &mut self.rng,
        )
    }

    /// Advances the session by one frame.
    ///
    /// `real_dt` is clamped to `max_dt`; physics runs on that clamped value
    /// scaled by the game speed. A reset reason short-circuits the remaining
    /// stages; the caller is expected to `reset()` before the next tick.
    pub fn tick(&mut self, real_dt: f32, input: &TickInput) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let real_dt = if real_dt.is_finite() {
            real_dt.clamp(0.0, self.settings.max_dt)
        } else {
            0.0
        };
        let dt = real_dt * self.settings.game_speed(input.fast_mode);
        self.now += real_dt as f64;

        self.combo.decay(self.now, &self.settings);
        if let Some(aim) = input.eject {
            outcome.ejection = self.eject(aim);
        }

        let was_won = self.game_won();
        if let Err(reason) = self.step(dt, real_dt) {
            warn!("reset requested: {reason}");
            outcome.reset = Some(reason);
            return outcome;
        }
        outcome.won_this_tick = !was_won && self.game_won();
        outcome
    }

    fn step(&mut self, dt: f32, real_dt: f32) -> Result<(), ResetReason> {
        let settings = &self.settings;
        self.registry.cleanup(self.now, settings.min_body_mass);
        apply_gravity(
            &mut self.registry,
            settings,
            self.absorption.gravity_blend,
            self.absorption.is_won(),
            dt,
        )?;
        resolve_collisions(&mut self.registry, settings, self.now, dt)?;
        update_absorption(&mut self.registry, &mut self.absorption, settings, dt)?;
        update_orbits_and_trails(
            &mut self.registry,
            settings,
            self.absorption.gravity_blend,
            real_dt,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SimContext {
        SimContext::new(SimSettings {
            deterministic: true,
            seed: 7,
            ..SimSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn telemetry_reflects_fresh_session() {
        let ctx = seeded();
        let t = ctx.telemetry();
        assert_eq!(t.gravity_blend, 0.0);
        assert_eq!(t.sun_absorption_progress, 0.0);
        assert!(!t.game_won);
        assert_eq!(t.player_mass, Some(ctx.settings.player_start_mass));
        assert_eq!(t.body_count, ctx.settings.population_count + 2);
        assert_eq!(t.ejection_multiplier, 1.0);
    }

    #[test]
    fn invalid_settings_are_rejected_up_front() {
        let inverted = SimSettings {
            min_sparks: 5,
            max_sparks: 2,
            ..SimSettings::default()
        };
        assert!(matches!(
            SimContext::new(inverted.clone()),
            Err(SettingsError::InvertedRange { name: "sparks", .. })
        ));
        assert!(SimContext::from_registry(inverted, BodyRegistry::new(), 1).is_err());

        let swallowed = SimSettings {
            player_clear_radius: 10_000.0,
            ..SimSettings::default()
        };
        assert!(matches!(
            SimContext::new(swallowed),
            Err(SettingsError::BeltFullyCleared { .. })
        ));
    }

    #[test]
    fn default_context_uses_stock_settings() {
        let ctx = SimContext::default();
        assert_eq!(ctx.settings.population_count, SimSettings::default().population_count);
        assert_eq!(ctx.registry.len(), ctx.settings.population_count + 2);
    }

    #[test]
    fn dt_is_clamped() {
        let mut ctx = seeded();
        ctx.tick(5.0, &TickInput::default());
        assert!((ctx.now - ctx.settings.max_dt as f64).abs() < 1e-9);
        ctx.tick(f32::NAN, &TickInput::default());
        assert!((ctx.now - ctx.settings.max_dt as f64).abs() < 1e-9);
    }

    #[test]
    fn eject_input_spawns_bodies() {
        let mut ctx = seeded();
        let before = ctx.registry.len();
        let out = ctx.tick(
            0.016,
            &TickInput {
                eject: Some(EjectAim::Angle(0.0)),
                fast_mode: false,
            },
        );
        assert!(out.ejection.is_some());
        assert!(ctx.registry.len() > before);
        assert!(ctx.telemetry().player_mass.unwrap() < ctx.settings.player_start_mass);
    }

    #[test]
    fn reset_rebuilds_session() {
        let mut ctx = seeded();
        for _ in 0..10 {
            ctx.tick(0.016, &TickInput::default());
        }
        ctx.absorption.gravity_blend = 0.4;
        ctx.combo.multiplier = 3.0;
        ctx.reset();
        assert_eq!(ctx.now, 0.0);
        assert_eq!(ctx.gravity_blend(), 0.0);
        assert_eq!(ctx.combo.multiplier, 1.0);
        assert_eq!(ctx.registry.len(), ctx.settings.population_count + 2);
    }

    #[test]
    fn seeded_sessions_replay_identically() {
        let run = || {
            let mut ctx = seeded();
            for k in 0..120 {
                let input = TickInput {
                    eject: (k % 15 == 0).then_some(EjectAim::Angle(k as f32 * 0.1)),
                    fast_mode: k % 2 == 0,
                };
                ctx.tick(1.0 / 60.0, &input);
            }
            ctx.registry
                .iter()
                .map(|b| (b.id.clone(), b.pos, b.mass()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
