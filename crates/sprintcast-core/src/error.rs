use thiserror::Error;

#[derive(Debug, Error)]
pub enum VelocityError {
    #[error("invalid adjustment spec '{0}': expected sprint:N[-M|+],factor:F[,reason:R]")]
    InvalidAdjustmentSpec(String),

    #[error("invalid team change spec '{0}': expected sprint:N,change:C[,ramp:R][,curve:TYPE]")]
    InvalidTeamChangeSpec(String),

    #[error("missing field '{field}' in '{spec}'")]
    MissingField { field: String, spec: String },

    #[error("invalid value '{value}' for field '{field}'")]
    InvalidField { field: String, value: String },

    #[error("factor must be positive, got {0}")]
    NonPositiveFactor(f64),

    #[error("team change must be non-zero")]
    ZeroChange,

    #[error("unknown ramp-up curve '{0}': expected linear, exponential, or step")]
    UnknownCurve(String),

    #[error("sprint numbers are 1-indexed, got {0}")]
    SprintBeforeNext(u32),

    #[error("sprint range is inverted: {start} > {end}")]
    InvertedSprintRange { start: u32, end: u32 },

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, VelocityError>;
