use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Regression failure: {0}")]
    RegressionFailure(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
