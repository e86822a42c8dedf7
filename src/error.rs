use thiserror::Error;

/// Errors surfaced by the ladder simulation.
///
/// A player who cannot find an opponent ragequits; that is not an error.
#[derive(Error, Debug)]
pub enum LadderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("skill curve rate must be strictly positive, got {0}")]
    NonPositiveRate(f64),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("report sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("report sink CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
