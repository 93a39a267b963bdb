//! Les cinq projections du catalogue.
//!
//! Toutes sont des fonctions pures de la collection en mémoire : aucune
//! entrée/sortie, aucun état dérivé partagé. Sur une collection vide chaque
//! vue retourne un résultat vide (l'appelant affiche son message
//! d'état vide) ; rien ne panique.

use bwmetadata::Track;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Taille de la vue "récent".
pub const RECENT_LIMIT: usize = 10;
/// Taille de la vue "uploads".
pub const UPLOADED_LIMIT: usize = 8;
/// Taille de la vue "recommandé".
pub const RECOMMENDED_LIMIT: usize = 8;
/// Taille de la vue "tendances".
pub const TRENDING_LIMIT: usize = 20;

/// Projection ordonnée paramétrée : tri stable par comparateur puis coupe.
///
/// C'est la brique commune des vues "récent", "uploads" et "tendances" ;
/// le tri stable préserve l'ordre de la collection pour les ex æquo.
pub fn ranked<F>(tracks: &[Track], compare: F, limit: usize) -> Vec<Track>
where
    F: FnMut(&Track, &Track) -> Ordering,
{
    let mut sorted: Vec<Track> = tracks.to_vec();
    sorted.sort_by(compare);
    sorted.truncate(limit);
    sorted
}

fn by_created_desc(a: &Track, b: &Track) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn by_plays_desc(a: &Track, b: &Track) -> Ordering {
    b.plays.cmp(&a.plays)
}

/// Piste mise en avant : maximum de lectures, ex æquo départagés par l'ordre
/// de la collection.
pub fn featured(tracks: &[Track]) -> Option<&Track> {
    let mut best: Option<&Track> = None;
    for track in tracks {
        match best {
            Some(current) if track.plays <= current.plays => {}
            _ => best = Some(track),
        }
    }
    best
}

/// Pistes les plus récentes (date de création décroissante, top 10).
pub fn recent(tracks: &[Track]) -> Vec<Track> {
    ranked(tracks, by_created_desc, RECENT_LIMIT)
}

/// Derniers uploads : même ordre que [`recent`], coupe différente.
pub fn uploaded(tracks: &[Track]) -> Vec<Track> {
    ranked(tracks, by_created_desc, UPLOADED_LIMIT)
}

/// Tendances : lectures décroissantes, top 20.
pub fn trending(tracks: &[Track]) -> Vec<Track> {
    ranked(tracks, by_plays_desc, TRENDING_LIMIT)
}

/// Recommandations : permutation uniforme de la collection, top 8.
///
/// Volontairement non déterministe à chaque rendu ; la source aléatoire est
/// injectée pour que les tests puissent la fixer.
pub fn recommended<R: Rng + ?Sized>(tracks: &[Track], rng: &mut R) -> Vec<Track> {
    let mut shuffled: Vec<Track> = tracks.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(RECOMMENDED_LIMIT);
    shuffled
}
