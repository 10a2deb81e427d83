pub mod absorption;
pub mod body;
pub mod collision;
pub mod context;
pub mod ejection;
pub mod error;
pub mod gravity;
pub mod orbit;
pub mod population;
pub mod registry;
pub mod settings;
pub mod trails;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

pub use absorption::{AbsorptionState, AbsorptionStatus};
pub use body::{Body, BodyId, BodyKind};
pub use context::{SimContext, Telemetry, TickInput, TickOutcome};
pub use ejection::{EjectAim, EjectionReport};
pub use error::{ResetReason, SettingsError};
pub use orbit::OrbitParams;
pub use registry::BodyRegistry;
pub use settings::SimSettings;

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Playing,
    Won,
}

/// The live session. Rendering and HUD read it between frames only.
#[derive(Resource, Deref, DerefMut)]
pub struct Simulation(pub SimContext);

/// Held while the accelerate input is down.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct FastMode(pub bool);

#[derive(Resource, Default, Deref, DerefMut)]
pub struct SimStats(pub usize);

/// One discrete eject input.
#[derive(Event, Clone, Copy, Debug)]
pub struct EjectRequest {
    pub aim: EjectAim,
}

#[derive(Event, Default)]
pub struct ResetEvent;

#[derive(Event, Clone, Debug)]
pub struct PlayerDied {
    pub reason: ResetReason,
}

#[derive(Event, Default)]
pub struct GameWon;

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<StatesPlugin>() {
            app.add_plugins(StatesPlugin);
        }

        let requested = app
            .world()
            .get_resource::<SimSettings>()
            .cloned()
            .unwrap_or_default();
        let context = SimContext::new(requested).unwrap_or_else(|e| {
            error!("invalid simulation settings ({e}), falling back to defaults");
            SimContext::default()
        });

        app.insert_resource(context.settings.clone())
            .insert_resource(Simulation(context))
            .init_resource::<FastMode>()
            .init_resource::<SimStats>()
            .init_state::<AppState>()
            .add_event::<EjectRequest>()
            .add_event::<ResetEvent>()
            .add_event::<PlayerDied>()
            .add_event::<GameWon>()
            .add_systems(
                Update,
                (handle_reset, step_simulation, update_stats).chain(),
            );
    }
}

fn handle_reset(
    mut ev_reset: EventReader<ResetEvent>,
    mut sim: ResMut<Simulation>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if ev_reset.is_empty() {
        return;
    }
    ev_reset.clear();
    sim.reset();
    next_state.set(AppState::Playing);
}

fn step_simulation(
    time: Res<Time>,
    fast: Res<FastMode>,
    mut sim: ResMut<Simulation>,
    mut ev_eject: EventReader<EjectRequest>,
    mut died: EventWriter<PlayerDied>,
    mut won: EventWriter<GameWon>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let mut aims = ev_eject.read().map(|e| e.aim);
    let input = TickInput {
        eject: aims.next(),
        fast_mode: fast.0,
    };
    let outcome = sim.tick(time.delta_seconds(), &input);

    if let Some(reason) = outcome.reset {
        died.send(PlayerDied { reason });
        sim.reset();
        next_state.set(AppState::Playing);
        return;
    }

    // Extra clicks that landed in the same frame still count, as combo hits.
    for aim in aims {
        sim.eject(aim);
    }

    if outcome.won_this_tick {
        info!("sun fully absorbed, player is the new gravitational center");
        won.send(GameWon);
        next_state.set(AppState::Won);
    }
}

fn update_stats(sim: Res<Simulation>, mut stats: ResMut<SimStats>) {
    stats.0 = sim.registry.len();
}
