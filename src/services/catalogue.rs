use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;

use crate::models::{AnimeMeta, GenreMatch, Suggestion};
use crate::store::MetadataStore;

/// Error types for catalogue queries
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("Unknown genres: {}", .0.join(", "))]
    UnknownGenres(Vec<String>),
}

/// Flat queries over the metadata table: title lookup, genre ranking and
/// prefix autocomplete. No similarity math here; that belongs to the
/// recommendation engine.
pub struct Catalogue {
    store: Arc<MetadataStore>,
}

impl Catalogue {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self { store }
    }

    /// Full metadata record for a title, case-insensitively
    pub fn meta(&self, title: &str) -> Option<AnimeMeta> {
        self.store.get(title).cloned()
    }

    /// Poster URL for a title
    pub fn poster(&self, title: &str) -> Option<(String, String)> {
        self.store
            .get(title)
            .map(|m| (m.title.clone(), m.poster.clone()))
    }

    /// Top-k titles carrying ALL of the requested genres, ranked by
    /// catalogue score descending with unrated titles last.
    ///
    /// Unlike the recommendation engine's filter, an unknown genre name here
    /// is a client error: the caller named a genre the catalogue has never
    /// seen, and silently ignoring it would change the meaning of the AND
    /// query.
    pub fn top_by_genres(
        &self,
        genres: &[String],
        k: usize,
    ) -> Result<Vec<GenreMatch>, CatalogueError> {
        let mut flags: Vec<&[bool]> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        for genre in genres {
            match self.store.genre_flags(genre) {
                Some(f) => flags.push(f),
                None => missing.push(genre.trim().to_lowercase()),
            }
        }
        if !missing.is_empty() {
            return Err(CatalogueError::UnknownGenres(missing));
        }

        let records = self.store.records();
        let mut rows: Vec<usize> = (0..records.len())
            .filter(|&row| flags.iter().all(|f| f[row]))
            .collect();
        rows.sort_by(|&a, &b| compare_by_score(&records[a], &records[b]).then_with(|| a.cmp(&b)));
        rows.truncate(k);

        Ok(rows
            .into_iter()
            .map(|row| {
                let meta = &records[row];
                GenreMatch {
                    title: meta.title.clone(),
                    score: meta.score,
                    poster: meta.poster.clone(),
                    synopsis: meta.synopsis.clone(),
                    similarity: None,
                }
            })
            .collect())
    }

    /// Titles starting with the given prefix, case-insensitively, in
    /// catalogue order
    pub fn autocomplete(&self, prefix: &str, limit: usize) -> Vec<Suggestion> {
        let needle = prefix.trim().to_lowercase();
        self.store
            .records()
            .iter()
            .filter(|m| m.title.to_lowercase().starts_with(&needle))
            .take(limit)
            .map(|m| Suggestion {
                title: m.title.clone(),
                poster_url: m.poster.clone(),
            })
            .collect()
    }
}

/// Descending by score, unrated last
fn compare_by_score(a: &AnimeMeta, b: &AnimeMeta) -> Ordering {
    match (a.score, b.score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
