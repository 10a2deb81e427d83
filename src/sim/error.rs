use thiserror::Error;

/// Fatal-but-recoverable simulation states. Any of these aborts the rest of
/// the tick; the session is then rebuilt from scratch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResetReason {
    #[error("player mass {mass:.2} fell below the survivable floor")]
    PlayerDepleted { mass: f32 },
    #[error("player touched the sun while underweight (mass ratio {mass_ratio:.3})")]
    TouchedSunUnderweight { mass_ratio: f32 },
    #[error("neither a sun nor a player remains")]
    NoGravitySource,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must lie in [0, 1), got {value}")]
    NotAFraction { name: &'static str, value: f32 },
    #[error("invalid {name} range: min {min} is not below max {max}")]
    InvertedRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
    #[error("player clear radius {clear_radius} covers the whole belt (reach {belt_reach})")]
    BeltFullyCleared { clear_radius: f32, belt_reach: f32 },
}
