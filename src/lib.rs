//! Simulation core of a 2D orbital game: a player body orbits a sun, throws
//! mass for propulsion, eats smaller bodies and finally absorbs the sun's
//! game mass to become the new gravitational center.
//!
//! [`sim::SimContext`] is the engine and can be driven directly;
//! [`sim::SimPlugin`] wires it into a Bevy `App`.

pub mod sim;

pub use sim::{
    AppState, EjectAim, EjectRequest, FastMode, GameWon, PlayerDied, ResetEvent, SimContext,
    SimPlugin, SimSettings, SimStats, Simulation, Telemetry, TickInput, TickOutcome,
};
