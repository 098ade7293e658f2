/// Domain-specific error types for the option simulator.
/// All provider failures must surface to the caller. The service must:
/// - Refuse to price when the history cannot support a volatility estimate
/// - Degrade gracefully (zero contracts) on a non-positive theoretical price
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("market data provider error: {status} {body}")]
    Provider { status: u16, body: String },

    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("bad parameter: {0}")]
    BadParam(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SimError {
    fn from(e: reqwest::Error) -> Self {
        SimError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Parse(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
