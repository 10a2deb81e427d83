use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::rngs::StdRng;
use rand::SeedableRng;

use solar_core::sim::{Body, BodyRegistry, PlayerDied};
use solar_core::{
    AppState, EjectAim, EjectRequest, ResetEvent, SimContext, SimPlugin, SimSettings, SimStats,
    Simulation,
};

fn settings() -> SimSettings {
    SimSettings {
        deterministic: true,
        seed: 42,
        population_count: 40,
        ..SimSettings::default()
    }
}

fn app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(settings())
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)))
        .add_plugins(SimPlugin);
    app
}

/// Sun and player stacked at the origin, the player already heavy enough to
/// absorb.
fn close_to_win(settings: &SimSettings, sun_left: f32, player_mass: f32) -> SimContext {
    let mut rng = StdRng::seed_from_u64(8);
    let mut reg = BodyRegistry::new();
    reg.add(Body::sun(
        Vec2::ZERO,
        sun_left,
        settings.sun_gravitational_mass,
        settings.sun_density,
        0.0,
        &mut rng,
    ));
    reg.add(Body::player(
        Vec2::ZERO,
        Vec2::ZERO,
        player_mass,
        settings.body_density,
        0.0,
        &mut rng,
    ));
    let mut ctx = SimContext::from_registry(settings.clone(), reg, 8).unwrap();
    let progress = 1.0 - sun_left / settings.initial_sun_game_mass;
    ctx.absorption.progress = progress;
    ctx.absorption.gravity_blend = progress;
    ctx
}

fn state(app: &App) -> AppState {
    app.world().resource::<State<AppState>>().get().clone()
}

#[test]
fn plugin_builds_a_session() {
    let mut app = app();
    app.update();

    let expected = settings().population_count + 2;
    assert_eq!(app.world().resource::<SimStats>().0, expected);
    assert_eq!(app.world().resource::<Simulation>().registry.len(), expected);
    assert_eq!(state(&app), AppState::Playing);
}

#[test]
fn invalid_settings_fall_back_to_defaults() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(SimSettings {
            max_dt: -1.0,
            ..settings()
        })
        .add_plugins(SimPlugin);

    assert!(app.world().resource::<SimSettings>().validate().is_ok());
    assert_eq!(
        app.world().resource::<Simulation>().settings.max_dt,
        SimSettings::default().max_dt
    );
}

#[test]
fn eject_request_spends_player_mass() {
    let mut app = app();
    app.update();
    let before = app.world().resource::<Simulation>().telemetry().player_mass;

    app.world_mut().send_event(EjectRequest {
        aim: EjectAim::Angle(1.0),
    });
    app.update();

    let after = app.world().resource::<Simulation>().telemetry().player_mass;
    assert!(after.unwrap() < before.unwrap());
}

#[test]
fn reset_event_rebuilds_session() {
    let mut app = app();
    for _ in 0..5 {
        app.update();
    }
    {
        let mut sim = app.world_mut().resource_mut::<Simulation>();
        sim.combo.multiplier = 4.0;
        sim.absorption.gravity_blend = 0.3;
    }

    app.world_mut().send_event(ResetEvent);
    app.update();

    let sim = app.world().resource::<Simulation>();
    assert_eq!(sim.combo.multiplier, 1.0);
    assert!(sim.gravity_blend() < 0.3);
    assert!(sim.now <= 0.017);
    assert_eq!(sim.registry.len(), settings().population_count + 2);
}

#[test]
fn underweight_touch_resets_and_reports() {
    let mut app = app();
    app.update();

    let s = settings();
    let doomed = close_to_win(&s, s.initial_sun_game_mass, s.initial_sun_game_mass * 0.39);
    app.insert_resource(Simulation(doomed));
    app.update();

    let events = app.world().resource::<Events<PlayerDied>>();
    let mut reader = events.get_reader();
    assert_eq!(reader.read(events).count(), 1);

    let sim = app.world().resource::<Simulation>();
    assert_eq!(sim.registry.len(), s.population_count + 2);
    assert_eq!(state(&app), AppState::Playing);
}

#[test]
fn absorbing_the_sun_enters_won_state() {
    let mut app = app();
    app.update();

    let s = settings();
    let nearly = close_to_win(&s, s.initial_sun_game_mass * 0.021, 20_000.0);
    app.insert_resource(Simulation(nearly));

    for _ in 0..600 {
        app.update();
        if app.world().resource::<Simulation>().game_won() {
            break;
        }
    }
    // State transitions apply on the following frame.
    app.update();

    let sim = app.world().resource::<Simulation>();
    assert!(sim.game_won());
    assert!(sim.registry.sun().is_none());
    assert_eq!(sim.gravity_blend(), 1.0);
    assert_eq!(state(&app), AppState::Won);
}
