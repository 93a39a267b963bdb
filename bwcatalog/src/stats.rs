//! Instantanés de statistiques dérivées (profil et écoute).
//!
//! Chaque instantané porte son horodatage de calcul ; la politique de
//! rafraîchissement (recalcul explicite ou à expiration du TTL) appartient
//! au propriétaire de l'instantané, jamais à ce module. Rien n'est figé
//! silencieusement.

use bwmetadata::Track;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statistiques d'écoute de l'appareil, dérivées de l'historique local.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListeningStats {
    pub total_plays: usize,
    /// Artistes les plus écoutés, par nombre de lectures décroissant (top 5).
    pub top_artists: Vec<(String, usize)>,
    pub liked_count: usize,
    pub computed_at: DateTime<Utc>,
}

/// Calcule les statistiques d'écoute à partir des artistes de l'historique.
pub fn listening_stats<'a, I>(played_artists: I, liked_count: usize) -> ListeningStats
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total_plays = 0usize;
    for artist in played_artists {
        total_plays += 1;
        *counts.entry(artist).or_insert(0) += 1;
    }

    let mut top_artists: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(artist, n)| (artist.to_string(), n))
        .collect();
    top_artists.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_artists.truncate(5);

    ListeningStats {
        total_plays,
        top_artists,
        liked_count,
        computed_at: Utc::now(),
    }
}

/// Vue agrégée d'un artiste sur le catalogue (profil public).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtistOverview {
    pub track_count: usize,
    pub total_plays: u64,
    pub total_likes: u64,
}

/// Agrège les compteurs des pistes d'un artiste.
pub fn artist_overview(tracks: &[Track], artist: &str) -> ArtistOverview {
    let mut overview = ArtistOverview {
        track_count: 0,
        total_plays: 0,
        total_likes: 0,
    };
    for track in tracks.iter().filter(|t| t.artist == artist) {
        overview.track_count += 1;
        overview.total_plays += track.plays;
        overview.total_likes += track.likes;
    }
    overview
}
