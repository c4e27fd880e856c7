use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarLensError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Chart rendering error: {0}")]
    Chart(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for StarLensError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Self::Chart(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StarLensError>;
