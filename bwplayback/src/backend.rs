//! Audio backend contract.
//!
//! The session drives whatever actually produces sound through this trait
//! so that transport logic stays backend-neutral. [`NullBackend`] is the
//! headless implementation used by tests and server-side runs.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Transport contract of an audio output.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Load a stream URL and start playing it from the beginning.
    async fn start(&self, url: &str) -> Result<()>;

    /// Pause the current stream.
    async fn pause(&self) -> Result<()>;

    /// Resume a paused stream.
    async fn resume(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek(&self, seconds: f64) -> Result<()>;

    /// Total duration in seconds, when the backend knows it.
    async fn duration(&self) -> Option<f64>;

    /// Current position in seconds, when the backend knows it.
    async fn position(&self) -> Option<f64>;
}

/// Transport operations recorded by [`NullBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOp {
    Start(String),
    Pause,
    Resume,
    Seek(f64),
}

/// Silent backend that records every transport call.
#[derive(Debug, Default)]
pub struct NullBackend {
    ops: Mutex<Vec<BackendOp>>,
    duration: Mutex<Option<f64>>,
    position: Mutex<Option<f64>>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a known stream duration.
    pub fn with_duration(seconds: f64) -> Self {
        let backend = Self::default();
        *backend.duration.lock().unwrap() = Some(seconds);
        backend
    }

    /// Transport calls received so far, in order.
    pub fn ops(&self) -> Vec<BackendOp> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioBackend for NullBackend {
    async fn start(&self, url: &str) -> Result<()> {
        self.ops.lock().unwrap().push(BackendOp::Start(url.to_string()));
        *self.position.lock().unwrap() = Some(0.0);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.ops.lock().unwrap().push(BackendOp::Pause);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.ops.lock().unwrap().push(BackendOp::Resume);
        Ok(())
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        self.ops.lock().unwrap().push(BackendOp::Seek(seconds));
        *self.position.lock().unwrap() = Some(seconds);
        Ok(())
    }

    async fn duration(&self) -> Option<f64> {
        *self.duration.lock().unwrap()
    }

    async fn position(&self) -> Option<f64> {
        *self.position.lock().unwrap()
    }
}
