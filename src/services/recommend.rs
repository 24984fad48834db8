use std::cmp::Ordering;
use std::sync::Arc;

use ndarray::Array1;
use thiserror::Error;

use crate::models::Recommendation;
use crate::store::{FeatureStore, MetadataStore};

/// Sentinel score for rows that must never be recommended: already-liked
/// rows and rows removed by the genre mask. Sits below any reachable cosine
/// value for the catalogue's non-negative feature encoding.
const EXCLUDED: f32 = -1.0;

/// Error types for the recommendation engine
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("None of the provided titles matched the catalogue")]
    NoMatch,
}

/// Content-based recommendation engine.
///
/// A pure function over the immutable feature and metadata stores: liked
/// titles are aggregated into a unit profile vector, every catalogue row is
/// scored by cosine similarity against it, liked and genre-masked rows are
/// forced out with a sentinel score, and the top-k survivors are returned
/// with display metadata.
pub struct Recommender {
    features: Arc<FeatureStore>,
    metadata: Arc<MetadataStore>,
}

impl Recommender {
    /// Creates an engine over loaded stores
    pub fn new(features: Arc<FeatureStore>, metadata: Arc<MetadataStore>) -> Self {
        Self { features, metadata }
    }

    /// Returns up to `k` recommendations for the given liked titles,
    /// ordered by descending similarity.
    ///
    /// Liked titles that do not resolve are skipped; if none resolve the
    /// request is unsatisfiable and fails with [`RecommendError::NoMatch`].
    /// Genre filter names that map to no known feature column are dropped
    /// silently. Fewer than `k` results are returned when exclusion and
    /// masking leave fewer candidates.
    pub fn recommend(
        &self,
        liked_titles: &[String],
        k: usize,
        genre_filter: Option<&[String]>,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let matched: Vec<usize> = self
            .features
            .resolve_titles(liked_titles)
            .into_iter()
            .flatten()
            .collect();
        if matched.is_empty() {
            return Err(RecommendError::NoMatch);
        }

        tracing::debug!(
            liked = liked_titles.len(),
            matched = matched.len(),
            k,
            "Scoring catalogue"
        );

        let profile = self.profile_vector(&matched);
        let mut scores = self.features.matrix().dot(&profile);

        // Liked rows never reappear in the results.
        for &row in &matched {
            scores[row] = EXCLUDED;
        }

        if let Some(filter) = genre_filter {
            self.apply_genre_mask(filter, &mut scores);
        }

        let results = top_k(&scores, k)
            .into_iter()
            .map(|row| self.to_recommendation(row, scores[row]))
            .collect();
        Ok(results)
    }

    /// Unit-normalized sum of the normalized feature rows of the liked
    /// titles. A zero sum (all liked rows carried no signal) stays zero,
    /// which scores every row tie-equal rather than failing.
    fn profile_vector(&self, rows: &[usize]) -> Array1<f32> {
        let matrix = self.features.matrix();
        let mut profile = Array1::zeros(matrix.ncols());
        for &row in rows {
            profile += &matrix.row(row);
        }
        let norm = profile.dot(&profile).sqrt();
        if norm > 0.0 {
            profile /= norm;
        }
        profile
    }

    /// Forces the sentinel score onto every row with no nonzero value in any
    /// of the requested genre columns. Unrecognized genre names are dropped;
    /// an empty mapped set leaves the scores untouched.
    fn apply_genre_mask(&self, filter: &[String], scores: &mut Array1<f32>) {
        let mut cols: Vec<usize> = Vec::new();
        for name in filter {
            match self.features.genre_column(name) {
                Some(col) => cols.push(col),
                None => {
                    tracing::debug!(genre = %name, "Dropping unrecognized genre from filter")
                }
            }
        }
        if cols.is_empty() {
            return;
        }

        let matrix = self.features.matrix();
        for row in 0..matrix.nrows() {
            let in_genre = cols.iter().any(|&col| matrix[(row, col)] != 0.0);
            if !in_genre {
                scores[row] = EXCLUDED;
            }
        }
    }

    fn to_recommendation(&self, row: usize, score: f32) -> Recommendation {
        let title = self.features.title(row);
        // The feature table's own poster column wins; the metadata table is
        // the fallback when that column is absent.
        let poster = match self.features.poster(row) {
            Some(poster) => poster.to_string(),
            None => self.metadata.poster_for(title).to_string(),
        };
        Recommendation {
            title: title.to_string(),
            poster,
            score: round4(score),
        }
    }
}

/// Picks the `k` highest-scoring rows, skipping sentinel rows entirely.
/// Ties break by ascending row index so equal scores rank identically
/// across runs.
fn top_k(scores: &Array1<f32>, k: usize) -> Vec<usize> {
    let mut candidates: Vec<usize> = (0..scores.len())
        .filter(|&row| scores[row] > EXCLUDED)
        .collect();
    candidates.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });
    candidates.truncate(k);
    candidates
}

/// Rounds to 4 decimal digits for presentation stability
fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
