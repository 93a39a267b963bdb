//! Playback session state machine.
//!
//! Owns the "what is playing right now" state and drives the audio
//! backend accordingly. At most one stream is active at a time: starting
//! a track while another plays stops the previous stream first.

use crate::backend::AudioBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bwmetadata::Track;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Logical state of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// A stream is being handed to the backend.
    Loading,
    Playing,
    Paused,
    /// The stream ran to completion; auto-advance may follow.
    Ended,
}

/// Consumer of play-start notifications.
///
/// The session fires `report_play` as a detached task when a stream
/// starts: counting never blocks or fails playback, the implementor logs
/// its own errors.
#[async_trait]
pub trait PlayReporter: Send + Sync {
    async fn report_play(&self, track_id: &str);
}

/// Playback session over an audio backend.
pub struct PlaybackSession {
    backend: Arc<dyn AudioBackend>,
    reporter: Option<Arc<dyn PlayReporter>>,
    state: PlaybackState,
    current: Option<String>,
}

impl PlaybackSession {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            reporter: None,
            state: PlaybackState::Idle,
            current: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn PlayReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Identifier of the track currently loaded, if any.
    pub fn current_track(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Start playing a track from the collection.
    ///
    /// Fails with [`Error::TrackNotFound`] when the id is unknown or the
    /// track has no audio URL; the session state does not change in that
    /// case. Any active stream is stopped (pause + rewind) before the new
    /// one starts.
    pub async fn play(&mut self, tracks: &[Track], track_id: &str) -> Result<()> {
        let track = tracks
            .iter()
            .find(|t| t.id == track_id)
            .ok_or_else(|| Error::TrackNotFound(track_id.to_string()))?;
        let url = track
            .audio_url
            .as_deref()
            .ok_or_else(|| Error::TrackNotFound(track_id.to_string()))?
            .to_string();

        if matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Loading
        ) {
            self.backend.pause().await?;
            self.backend.seek(0.0).await?;
        }

        self.state = PlaybackState::Loading;
        if let Err(e) = self.backend.start(&url).await {
            self.state = PlaybackState::Idle;
            self.current = None;
            return Err(e.into());
        }

        self.state = PlaybackState::Playing;
        self.current = Some(track_id.to_string());
        debug!("Playing {track_id}");

        if let Some(reporter) = &self.reporter {
            let reporter = Arc::clone(reporter);
            let id = track_id.to_string();
            tokio::spawn(async move {
                reporter.report_play(&id).await;
            });
        }

        Ok(())
    }

    /// Toggle between Playing and Paused. A no-op in any other state.
    pub async fn toggle_play(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing => {
                self.backend.pause().await?;
                self.state = PlaybackState::Paused;
            }
            PlaybackState::Paused => {
                self.backend.resume().await?;
                self.state = PlaybackState::Playing;
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle end of stream: mark Ended, then auto-advance to a uniformly
    /// random track from the collection. An empty collection leaves the
    /// session in Ended.
    pub async fn on_ended<R: Rng>(&mut self, tracks: &[Track], rng: &mut R) -> Result<()> {
        self.state = PlaybackState::Ended;
        if tracks.is_empty() {
            return Ok(());
        }

        let next = &tracks[rng.random_range(0..tracks.len())];
        let next_id = next.id.clone();
        if let Err(e) = self.play(tracks, &next_id).await {
            warn!("Auto-advance to {next_id} failed: {e}");
            return Err(e);
        }
        Ok(())
    }

    /// Seek to a fraction of the stream duration.
    ///
    /// Accepted only while Playing or Paused and when the backend knows
    /// the duration; returns `false` when the seek was ignored. The
    /// fraction is clamped to `[0, 1]`.
    pub async fn seek_fraction(&mut self, fraction: f64) -> Result<bool> {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return Ok(false);
        }
        let Some(duration) = self.backend.duration().await else {
            return Ok(false);
        };

        let fraction = fraction.clamp(0.0, 1.0);
        self.backend.seek(duration * fraction).await?;
        Ok(true)
    }
}

/// Fraction of a progress bar from a pointer coordinate.
///
/// A non-positive width yields 0; the result is clamped to `[0, 1]`.
pub fn fraction_from_pointer(x: f64, width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (x / width).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, NullBackend};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::sync::mpsc;

    fn track(id: &str) -> Track {
        let mut t = Track::new("Title", "Artist", "House", "https://x/a.mp3");
        t.id = id.to_string();
        t.audio_url = Some(format!("https://x/{id}.mp3"));
        t
    }

    #[tokio::test]
    async fn test_play_transitions_to_playing() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend.clone());
        let tracks = vec![track("a")];

        session.play(&tracks, "a").await.unwrap();
        assert_eq!(*session.state(), PlaybackState::Playing);
        assert_eq!(session.current_track(), Some("a"));
        assert_eq!(
            backend.ops(),
            vec![BackendOp::Start("https://x/a.mp3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_play_stops_previous_stream_first() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend.clone());
        let tracks = vec![track("a"), track("b")];

        session.play(&tracks, "a").await.unwrap();
        session.play(&tracks, "b").await.unwrap();

        assert_eq!(
            backend.ops(),
            vec![
                BackendOp::Start("https://x/a.mp3".to_string()),
                BackendOp::Pause,
                BackendOp::Seek(0.0),
                BackendOp::Start("https://x/b.mp3".to_string()),
            ]
        );
        assert_eq!(session.current_track(), Some("b"));
    }

    #[tokio::test]
    async fn test_play_unknown_track_keeps_state() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend.clone());
        let tracks = vec![track("a")];

        session.play(&tracks, "a").await.unwrap();
        let err = session.play(&tracks, "ghost").await.unwrap_err();
        assert!(matches!(err, Error::TrackNotFound(_)));
        assert_eq!(*session.state(), PlaybackState::Playing);
        assert_eq!(session.current_track(), Some("a"));
    }

    #[tokio::test]
    async fn test_track_without_audio_url_rejected() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend);
        let mut t = track("a");
        t.audio_url = None;

        let err = session.play(&[t], "a").await.unwrap_err();
        assert!(matches!(err, Error::TrackNotFound(_)));
        assert_eq!(*session.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_double_toggle_returns_to_playing() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend);
        let tracks = vec![track("a")];
        session.play(&tracks, "a").await.unwrap();

        session.toggle_play().await.unwrap();
        assert_eq!(*session.state(), PlaybackState::Paused);
        session.toggle_play().await.unwrap();
        assert_eq!(*session.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_toggle_without_track_is_noop() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend);
        session.toggle_play().await.unwrap();
        assert_eq!(*session.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_ended_auto_advances_with_seeded_rng() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend);
        let tracks = vec![track("a"), track("b"), track("c")];
        session.play(&tracks, "a").await.unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        session.on_ended(&tracks, &mut rng).await.unwrap();
        assert_eq!(*session.state(), PlaybackState::Playing);
        assert!(session.current_track().is_some());
    }

    #[tokio::test]
    async fn test_ended_with_empty_catalog_stays_ended() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend);
        let mut rng = StdRng::seed_from_u64(7);
        session.on_ended(&[], &mut rng).await.unwrap();
        assert_eq!(*session.state(), PlaybackState::Ended);
    }

    #[tokio::test]
    async fn test_seek_fraction_requires_known_duration() {
        let backend = Arc::new(NullBackend::new());
        let mut session = PlaybackSession::new(backend);
        let tracks = vec![track("a")];
        session.play(&tracks, "a").await.unwrap();

        assert!(!session.seek_fraction(0.5).await.unwrap());
    }

    #[tokio::test]
    async fn test_seek_fraction_scales_and_clamps() {
        let backend = Arc::new(NullBackend::with_duration(200.0));
        let mut session = PlaybackSession::new(backend.clone());
        let tracks = vec![track("a")];
        session.play(&tracks, "a").await.unwrap();

        assert!(session.seek_fraction(0.25).await.unwrap());
        assert!(session.seek_fraction(1.5).await.unwrap());
        let ops = backend.ops();
        assert_eq!(ops[ops.len() - 2], BackendOp::Seek(50.0));
        assert_eq!(ops[ops.len() - 1], BackendOp::Seek(200.0));
    }

    #[tokio::test]
    async fn test_seek_ignored_when_idle() {
        let backend = Arc::new(NullBackend::with_duration(200.0));
        let mut session = PlaybackSession::new(backend);
        assert!(!session.seek_fraction(0.5).await.unwrap());
    }

    struct ChannelReporter(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl PlayReporter for ChannelReporter {
        async fn report_play(&self, track_id: &str) {
            let _ = self.0.send(track_id.to_string());
        }
    }

    #[tokio::test]
    async fn test_play_start_reported_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend = Arc::new(NullBackend::new());
        let mut session =
            PlaybackSession::new(backend).with_reporter(Arc::new(ChannelReporter(tx)));
        let tracks = vec![track("a")];

        session.play(&tracks, "a").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "a");
    }

    #[test]
    fn test_fraction_from_pointer() {
        assert_eq!(fraction_from_pointer(50.0, 200.0), 0.25);
        assert_eq!(fraction_from_pointer(-10.0, 200.0), 0.0);
        assert_eq!(fraction_from_pointer(300.0, 200.0), 1.0);
        assert_eq!(fraction_from_pointer(10.0, 0.0), 0.0);
    }
}
