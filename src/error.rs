use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    /// The fetched page does not have the structure the extractors expect.
    #[error("unrecognised upstream page format: {0}")]
    UpstreamFormat(String),

    #[error("portal request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("portal session is invalid or expired")]
    InvalidSession,

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;
