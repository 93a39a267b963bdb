//! Recherche plein-texte naïve sur le catalogue en mémoire.

use bwmetadata::Track;

/// Nombre maximal de résultats retournés.
pub const SEARCH_LIMIT: usize = 20;

/// Recherche par sous-chaîne, insensible à la casse, sur le titre,
/// l'artiste, le genre et la description. Les résultats sont triés par
/// position du terme dans le titre (les titres qui commencent par la
/// requête remontent), plafonnés à [`SEARCH_LIMIT`].
pub fn search(tracks: &[Track], query: &str) -> Vec<Track> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<(usize, Track)> = tracks
        .iter()
        .filter_map(|track| {
            let title = track.title.to_lowercase();
            let matches = title.contains(&query)
                || track.artist.to_lowercase().contains(&query)
                || track.genre.to_lowercase().contains(&query)
                || track
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&query))
                    .unwrap_or(false);
            if matches {
                // usize::MAX classe les matches hors-titre après les autres.
                let relevance = title.find(&query).unwrap_or(usize::MAX);
                Some((relevance, track.clone()))
            } else {
                None
            }
        })
        .collect();

    results.sort_by_key(|(relevance, _)| *relevance);
    results
        .into_iter()
        .take(SEARCH_LIMIT)
        .map(|(_, track)| track)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, title: &str, artist: &str, genre: &str) -> Track {
        let mut t = Track::new(title, artist, genre, "https://x/a.mp3");
        t.id = id.to_string();
        t
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tracks = vec![track("t1", "Midnight City", "M83", "Synthwave")];
        assert_eq!(search(&tracks, "MIDNIGHT").len(), 1);
        assert_eq!(search(&tracks, "m83").len(), 1);
        assert_eq!(search(&tracks, "synth").len(), 1);
    }

    #[test]
    fn test_search_matches_description() {
        let mut t = track("t1", "Untitled", "anon", "Lo-fi");
        t.description = Some("late night study beats".to_string());
        assert_eq!(search(&[t], "study").len(), 1);
    }

    #[test]
    fn test_search_ranks_title_prefix_first() {
        let tracks = vec![
            track("t1", "A Night to Remember", "x", ""),
            track("t2", "Night Drive", "x", ""),
        ];
        let results = search(&tracks, "night");
        assert_eq!(results[0].id, "t2");
    }

    #[test]
    fn test_search_caps_results() {
        let tracks: Vec<Track> = (0..30)
            .map(|i| track(&format!("t{}", i), &format!("beat {}", i), "a", ""))
            .collect();
        assert_eq!(search(&tracks, "beat").len(), SEARCH_LIMIT);
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        let tracks = vec![track("t1", "Anything", "x", "")];
        assert!(search(&tracks, "   ").is_empty());
    }
}
