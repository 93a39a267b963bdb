//! Score composite d'une piste et pistes similaires par genre.

use bwmetadata::Track;
use chrono::Utc;

/// Score de classement d'une piste.
///
/// Pondération héritée du moteur de recommandation d'origine :
/// lectures 40 %, likes 30 %, fraîcheur 20 % (dégressive sur 10 jours),
/// commentaires 10 %.
pub fn score(track: &Track) -> f64 {
    let mut score = track.plays as f64 * 0.4;
    score += track.likes as f64 * 0.3;

    if let Some(created_at) = track.created_at {
        let days = Utc::now()
            .signed_duration_since(created_at)
            .num_seconds() as f64
            / 86_400.0;
        score += (10.0 - days).max(0.0) * 0.2;
    }

    score += track.comments as f64 * 0.1;
    score
}

/// Pistes du même genre, classées par [`score`] décroissant.
pub fn similar(tracks: &[Track], genre: &str, limit: usize) -> Vec<Track> {
    let mut same_genre: Vec<Track> = tracks
        .iter()
        .filter(|t| t.genre == genre)
        .cloned()
        .collect();
    same_genre.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    same_genre.truncate(limit);
    same_genre
}
