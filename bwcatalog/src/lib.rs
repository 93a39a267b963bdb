//! # bwcatalog - Projections du catalogue BeatWave
//!
//! Fonctions pures de la collection de pistes en mémoire : les cinq vues
//! de la page d'accueil ([`views`]), la recherche ([`search`]), le score de
//! recommandation ([`ranking`]) et les instantanés statistiques ([`stats`]).
//!
//! Aucune entrée/sortie ici ; la source aléatoire des vues non déterministes
//! est injectée par l'appelant, ce qui rend les tests reproductibles.

pub mod ranking;
pub mod search;
pub mod stats;
pub mod views;

pub use ranking::{score, similar};
pub use search::{search, SEARCH_LIMIT};
pub use stats::{artist_overview, listening_stats, ArtistOverview, ListeningStats};
pub use views::{
    featured, ranked, recent, recommended, trending, uploaded, RECENT_LIMIT, RECOMMENDED_LIMIT,
    TRENDING_LIMIT, UPLOADED_LIMIT,
};
