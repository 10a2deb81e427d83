use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use solar_core::{AppState, EjectAim, EjectRequest, SimPlugin, SimStats, Simulation};

/// Headless runner: steps the simulation at 60 Hz and logs telemetry. An
/// autopilot fires a prograde ejection every couple of seconds so the
/// propulsion path is exercised without any input device attached.
fn main() {
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / 60.0),
        )))
        .add_plugins(LogPlugin::default())
        .add_plugins(SimPlugin)
        .insert_resource(TelemetryTimer(Timer::from_seconds(
            1.0,
            TimerMode::Repeating,
        )))
        .insert_resource(AutopilotTimer(Timer::from_seconds(
            2.0,
            TimerMode::Repeating,
        )))
        .add_systems(Update, (autopilot, log_telemetry))
        .run();
}

#[derive(Resource)]
struct TelemetryTimer(Timer);

#[derive(Resource)]
struct AutopilotTimer(Timer);

fn autopilot(
    time: Res<Time>,
    mut timer: ResMut<AutopilotTimer>,
    sim: Res<Simulation>,
    mut ev_eject: EventWriter<EjectRequest>,
) {
    timer.0.tick(time.delta());
    if !timer.0.just_finished() {
        return;
    }
    let Some(player) = sim.registry.player() else {
        return;
    };
    if player.vel.length_squared() > 0.0 {
        ev_eject.send(EjectRequest {
            aim: EjectAim::Angle(player.vel.y.atan2(player.vel.x)),
        });
    }
}

fn log_telemetry(
    time: Res<Time>,
    mut timer: ResMut<TelemetryTimer>,
    sim: Res<Simulation>,
    stats: Res<SimStats>,
    state: Res<State<AppState>>,
) {
    timer.0.tick(time.delta());
    if !timer.0.just_finished() {
        return;
    }
    let t = sim.telemetry();
    info!(
        "[{:?}] bodies {} | player mass {:.1} | absorbed {:.1}% | blend {:.2} | {:?} | combo x{:.2}",
        state.get(),
        stats.0,
        t.player_mass.unwrap_or_default(),
        t.sun_absorption_progress * 100.0,
        t.gravity_blend,
        t.absorption_state,
        t.ejection_multiplier,
    );
}
