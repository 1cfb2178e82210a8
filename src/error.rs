use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing required configuration: {}", .0.join(", "))]
    ConfigMissing(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch durations for {date}: {message}")]
    Fetch { date: NaiveDate, message: String },

    #[error("Failed to create storage location: {0}")]
    StoreCreate(String),

    #[error("Failed to load aggregate: {0}")]
    StoreLoad(String),

    #[error("Failed to save aggregate: {0}")]
    StoreSave(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid URL: {0}")]
    UrlParse(String),

    #[error("Invalid date: {0}")]
    DateParse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
