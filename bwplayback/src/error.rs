//! Playback session errors.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested track does not exist or has no playable audio URL.
    /// The session state is left untouched.
    #[error("Track not playable: {0}")]
    TrackNotFound(String),

    #[error("Audio backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
