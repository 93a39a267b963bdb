//! Contexte de session applicatif.
//!
//! [`AppSession`] possède l'état mutable qui vivait autrefois en variables
//! globales : compte courant, collection de pistes en mémoire, caches
//! locaux et session de lecture. Tout passe par lui, rien n'est un
//! singleton de module.

use crate::api::ApiClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bwcache::{
    device_id, FollowSet, HistoryEntry, LikeSet, LocalCache, PlayGate, PlayHistory,
    SessionAccount, SessionStore, DB, HISTORY_LIMIT,
};
use bwcatalog::{listening_stats, ListeningStats};
use bwmetadata::Track;
use bwplayback::{AudioBackend, PlayReporter, PlaybackSession, PlaybackState};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Clé du cache de pistes, héritée du stockage navigateur d'origine.
pub const TRACKS_CACHE_KEY: &str = "soundwave_tracksCache";

/// Compte les lectures côté serveur, en tâche détachée.
///
/// Le démarrage d'une piste ne bloque jamais sur l'écriture du compteur :
/// la barrière journalière locale décide, puis l'appel distant part en
/// arrière-plan et ses échecs sont seulement journalisés.
struct RemotePlayReporter {
    api: Arc<dyn ApiClient>,
    db: Arc<DB>,
}

#[async_trait]
impl PlayReporter for RemotePlayReporter {
    async fn report_play(&self, track_id: &str) {
        let origin = origin_for(&self.db);
        let gate = PlayGate::new(self.db.clone());
        if !gate.mark(track_id, &origin) {
            debug!("Play of {track_id} already counted today for {origin}");
            return;
        }
        if let Err(e) = self.api.record_play(track_id, &origin).await {
            warn!("Play count for {track_id} not persisted: {e}");
        }
    }
}

/// Origine des lectures : compte connecté, sinon identifiant d'appareil.
fn origin_for(db: &Arc<DB>) -> String {
    SessionStore::new(db.clone())
        .current()
        .map(|account| account.username)
        .unwrap_or_else(|| device_id(db))
}

/// Session applicative BeatWave.
pub struct AppSession {
    api: Arc<dyn ApiClient>,
    db: Arc<DB>,
    cache: LocalCache,
    session: SessionStore,
    history: PlayHistory,
    gate: PlayGate,
    playback: PlaybackSession,
    tracks: Vec<Track>,
    stats: Option<ListeningStats>,
}

impl AppSession {
    pub fn new(
        api: Arc<dyn ApiClient>,
        db: Arc<DB>,
        backend: Arc<dyn AudioBackend>,
        cache_ttl: Duration,
    ) -> Self {
        let reporter = Arc::new(RemotePlayReporter {
            api: api.clone(),
            db: db.clone(),
        });
        Self {
            api,
            cache: LocalCache::new(db.clone(), cache_ttl),
            session: SessionStore::new(db.clone()),
            history: PlayHistory::new(db.clone()),
            gate: PlayGate::new(db.clone()),
            playback: PlaybackSession::new(backend).with_reporter(reporter),
            db,
            tracks: Vec::new(),
            stats: None,
        }
    }

    /// Construit la session depuis la configuration BeatWave : client
    /// HTTP, base SQLite dans le répertoire de cache, TTL configuré.
    pub fn from_config(backend: Arc<dyn AudioBackend>) -> Result<Self> {
        let config = bwconfig::get_config();
        let api = Arc::new(crate::api::HttpApi::from_config()?);
        let db_path = config.get_cache_dir()?.join("beatwave.db");
        let db = Arc::new(DB::init(&db_path).map_err(bwcache::Error::from)?);
        Ok(Self::new(api, db, backend, config.get_cache_ttl()))
    }

    /// Collection de pistes en mémoire.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Charge la collection : cache frais, sinon serveur, sinon cache
    /// périmé, sinon jeu de démonstration. Jamais fatal.
    pub async fn load_tracks(&mut self) -> &[Track] {
        if let Some(tracks) = self.cache.get::<Vec<Track>>(TRACKS_CACHE_KEY) {
            debug!("Track collection served from cache ({})", tracks.len());
            self.tracks = tracks;
            return &self.tracks;
        }

        match self.api.fetch_tracks().await {
            Ok(tracks) => {
                info!("Fetched {} tracks", tracks.len());
                if let Err(e) = self.cache.put(TRACKS_CACHE_KEY, &tracks) {
                    warn!("Track cache not updated: {e}");
                }
                self.tracks = tracks;
            }
            Err(e) => {
                warn!("Track fetch failed: {e}");
                if let Some(cached) = self.cache.get_even_stale::<Vec<Track>>(TRACKS_CACHE_KEY) {
                    info!("Serving stale track cache ({})", cached.value.len());
                    self.tracks = cached.value;
                } else {
                    info!("Serving built-in demo tracks");
                    self.tracks = bwmetadata::demo_tracks();
                }
            }
        }
        &self.tracks
    }

    /// Force un rechargement serveur au prochain `load_tracks`.
    pub fn invalidate_tracks(&self) {
        self.cache.invalidate(TRACKS_CACHE_KEY);
    }

    pub fn current_account(&self) -> Option<SessionAccount> {
        self.session.current()
    }

    pub fn sign_in(&mut self, username: &str) {
        self.session.sign_in(username);
        self.stats = None;
    }

    pub fn sign_out(&mut self) {
        self.session.sign_out();
        self.stats = None;
    }

    /// Démarre la lecture d'une piste.
    ///
    /// Le compteur en mémoire est incrémenté de façon optimiste quand la
    /// barrière journalière le permet, et conservé même si l'écriture
    /// distante échoue ensuite ; le rechargement de la collection est le
    /// point de réconciliation. L'entrée est ajoutée à l'historique.
    pub async fn play(&mut self, track_id: &str) -> Result<()> {
        let origin = origin_for(&self.db);
        let first_today = !self.gate.already_counted(track_id, &origin);

        self.playback.play(&self.tracks, track_id).await?;

        if let Some(track) = self.tracks.iter_mut().find(|t| t.id == track_id) {
            if first_today {
                track.plays += 1;
            }
            self.history.record(&track.id, &track.title, &track.artist);
        }
        if first_today {
            // Le compteur optimiste doit survivre à un rechargement dans
            // le TTL : le cache est réécrit comme pour les likes.
            self.cache.put(TRACKS_CACHE_KEY, &self.tracks)?;
        }
        self.stats = None;
        Ok(())
    }

    pub async fn toggle_play(&mut self) -> Result<()> {
        self.playback.toggle_play().await?;
        Ok(())
    }

    /// Fin de piste : avance automatiquement vers une piste au hasard.
    pub async fn on_ended<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        self.playback.on_ended(&self.tracks, rng).await?;
        Ok(())
    }

    pub async fn seek_fraction(&mut self, fraction: f64) -> Result<bool> {
        Ok(self.playback.seek_fraction(fraction).await?)
    }

    pub fn playback_state(&self) -> &PlaybackState {
        self.playback.state()
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.playback.current_track()
    }

    /// Bascule le like local d'une piste et le propage au serveur.
    ///
    /// Le set local et le compteur en mémoire (plancher à zéro) changent
    /// d'abord, le cache de pistes est réécrit, puis l'appel distant part ;
    /// son échec laisse l'état local tel quel. Renvoie l'état final.
    pub async fn toggle_like(&mut self, track_id: &str) -> Result<bool> {
        let account = self.session.current().ok_or(Error::NotSignedIn)?;
        let likes = LikeSet::new(self.db.clone(), &account.username);
        let liked = likes.toggle(track_id);

        if let Some(track) = self.tracks.iter_mut().find(|t| t.id == track_id) {
            if liked {
                track.likes += 1;
            } else {
                track.likes = track.likes.saturating_sub(1);
            }
        }
        self.cache.put(TRACKS_CACHE_KEY, &self.tracks)?;
        self.stats = None;

        if let Err(e) = self.api.toggle_like(track_id, &account.username, liked).await {
            warn!("Like for {track_id} not persisted: {e}");
        }
        Ok(liked)
    }

    pub fn is_liked(&self, track_id: &str) -> bool {
        match self.session.current() {
            Some(account) => LikeSet::new(self.db.clone(), &account.username).contains(track_id),
            None => false,
        }
    }

    /// Suit un artiste. Renvoie `true` si le set a changé.
    pub fn follow(&self, artist: &str) -> Result<bool> {
        let account = self.session.current().ok_or(Error::NotSignedIn)?;
        Ok(FollowSet::new(self.db.clone(), &account.username).follow(artist))
    }

    pub fn unfollow(&self, artist: &str) -> Result<bool> {
        let account = self.session.current().ok_or(Error::NotSignedIn)?;
        Ok(FollowSet::new(self.db.clone(), &account.username).unfollow(artist))
    }

    pub fn is_following(&self, artist: &str) -> bool {
        match self.session.current() {
            Some(account) => {
                FollowSet::new(self.db.clone(), &account.username).is_following(artist)
            }
            None => false,
        }
    }

    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.list(limit)
    }

    /// Instantané des statistiques d'écoute.
    ///
    /// Recalculé quand aucun instantané n'existe ou quand il est plus
    /// vieux que le TTL du cache ; jamais figé silencieusement.
    pub fn profile_stats(&mut self) -> ListeningStats {
        let stale = match &self.stats {
            None => true,
            Some(snapshot) => {
                let age = Utc::now().signed_duration_since(snapshot.computed_at);
                age.num_seconds() >= self.cache.ttl().as_secs() as i64
            }
        };
        if stale {
            self.recompute_stats();
        }
        self.stats.clone().unwrap_or_else(|| listening_stats(std::iter::empty(), 0))
    }

    /// Recalcule l'instantané immédiatement.
    pub fn recompute_stats(&mut self) {
        let entries = self.history.list(HISTORY_LIMIT);
        let liked_count = match self.session.current() {
            Some(account) => LikeSet::new(self.db.clone(), &account.username).all().len(),
            None => 0,
        };
        let snapshot = listening_stats(entries.iter().map(|e| e.artist.as_str()), liked_count);
        self.stats = Some(snapshot);
    }

    /// Profil public d'un utilisateur et son jeton de version.
    pub async fn profile(&self, username: &str) -> Result<(bwmetadata::Profile, Option<String>)> {
        self.api.fetch_profile(username).await
    }

    /// Sauvegarde le profil du compte connecté.
    pub async fn save_profile(
        &self,
        profile: &bwmetadata::Profile,
        sha: Option<&str>,
    ) -> Result<()> {
        let account = self.session.current().ok_or(Error::NotSignedIn)?;
        self.api.save_profile(&account.username, profile, sha).await
    }
}
