//! Types d'erreurs pour bwstore

/// Erreurs du blob store versionné
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Le jeton de version fourni ne correspond plus au document distant.
    #[error("Version conflict on: {0}")]
    Conflict(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} for: {path}")]
    Status { status: u16, path: String },

    #[error("Malformed document at {path}: {detail}")]
    Malformed { path: String, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type Result spécialisé pour bwstore
pub type Result<T> = std::result::Result<T, Error>;
