use thiserror::Error;

/// Errors that stop the robot from being built in the first place.
/// Nothing that runs once per control cycle returns one of these.
#[derive(Debug, Error)]
pub enum SwerveError {
    #[error("invalid drivetrain geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid shot table: {0}")]
    InvalidShotTable(String),

    #[error("failed to load config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize telemetry: {0}")]
    Json(#[from] serde_json::Error),
}

/// ## Conditions the core degrades through instead of failing.
/// Each one has a safe default (held pose, held setpoint, held heading, clamped lookup).
/// They are handed back to the caller so the control loop or telemetry can act on them.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Condition {
    #[error("absolute heading sensor unavailable, odometry is using wheel rotation")]
    SensorUnavailable,

    #[error("module {module} is not reporting, holding its last setpoint")]
    StaleSetpoint { module: usize },

    #[error("odometry underrun: processed {processed} samples, {pending} still queued")]
    SampleUnderrun { processed: usize, pending: usize },

    #[error("range {range:.2} m is outside the shot table, clamped to the nearest entry")]
    RangeOutOfTable { range: f64 },

    #[error("aim target is on top of the robot, holding the previous heading")]
    DegenerateGeometry,
}
