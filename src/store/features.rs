use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use ndarray::Array2;

use super::normalize_title;

/// Identifier and display columns excluded from the feature set
const ID_COLUMNS: [&str; 4] = ["title", "poster", "Image URL", "MAL_ID"];

/// Header prefix marking one-hot genre indicator columns
const GENRE_PREFIX: &str = "genre_";

/// Read-only catalogue feature table, loaded once at startup.
///
/// Holds the row-normalized feature matrix together with the lookup
/// structures the recommendation engine needs: a case-insensitive title
/// index, a validated genre-name → column mapping, and the per-row poster
/// column when the source file carries one.
///
/// Titles that normalize to the same key collide last-write-wins; the
/// upstream CSV pipeline is expected to deduplicate, and collisions are
/// logged at load time.
pub struct FeatureStore {
    titles: Vec<String>,
    posters: Option<Vec<String>>,
    matrix: Array2<f32>,
    feature_cols: Vec<String>,
    genre_cols: HashMap<String, usize>,
    title_index: HashMap<String, usize>,
}

impl FeatureStore {
    /// Loads the feature table from a CSV file.
    ///
    /// Fatal on a missing file, zero usable rows, or a ragged/non-numeric
    /// matrix; the service cannot recommend anything without it.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open feature CSV at {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to load feature CSV at {}", path.display()))
    }

    /// Builds the store from any CSV source.
    ///
    /// The feature-column set is every column that is not an identifier or
    /// display column; all of them must parse as numbers in every row.
    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers().context("Failed to read headers")?.clone();

        let title_col = headers
            .iter()
            .position(|h| h == "title" || h == "Title")
            .context("Feature CSV has no title column")?;
        let poster_col = headers
            .iter()
            .position(|h| h == "poster")
            .or_else(|| headers.iter().position(|h| h == "Image URL"));

        let feature_idx: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|&(i, h)| i != title_col && Some(i) != poster_col && !ID_COLUMNS.contains(&h))
            .map(|(i, _)| i)
            .collect();

        if feature_idx.is_empty() {
            bail!("Feature CSV has no feature columns");
        }

        let mut titles: Vec<String> = Vec::new();
        let mut posters: Option<Vec<String>> = poster_col.map(|_| Vec::new());
        let mut values: Vec<f32> = Vec::new();

        for (row, record) in csv.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read record {}", row + 1))?;

            for &col in &feature_idx {
                let raw = record.get(col).unwrap_or("");
                let value: f32 = raw.trim().parse().with_context(|| {
                    format!(
                        "Non-numeric value {:?} in column {:?} at row {}",
                        raw,
                        &headers[col],
                        row + 1
                    )
                })?;
                values.push(value);
            }

            if let (Some(posters), Some(col)) = (posters.as_mut(), poster_col) {
                posters.push(record.get(col).unwrap_or("").to_string());
            }
            titles.push(record.get(title_col).unwrap_or("").to_string());
        }

        if titles.is_empty() {
            bail!("Feature CSV has no rows");
        }

        let matrix = Array2::from_shape_vec((titles.len(), feature_idx.len()), values)
            .context("Feature matrix shape mismatch")?;
        let matrix = normalize_rows(matrix);

        let feature_cols: Vec<String> = feature_idx.iter().map(|&i| headers[i].to_string()).collect();
        let genre_cols = build_genre_map(&feature_cols)?;

        let mut title_index: HashMap<String, usize> = HashMap::with_capacity(titles.len());
        for (row, title) in titles.iter().enumerate() {
            let key = normalize_title(title);
            if key.is_empty() {
                continue;
            }
            if let Some(previous) = title_index.insert(key, row) {
                tracing::warn!(
                    title = %title,
                    previous_row = previous,
                    row,
                    "Duplicate title in feature CSV, keeping the later row"
                );
            }
        }

        tracing::info!(
            rows = titles.len(),
            features = feature_cols.len(),
            genres = genre_cols.len(),
            "Feature table loaded"
        );

        Ok(Self {
            titles,
            posters,
            matrix,
            feature_cols,
            genre_cols,
            title_index,
        })
    }

    /// The row-normalized feature matrix (one row per title)
    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }

    /// Number of titles in the catalogue
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Feature-space dimensionality
    pub fn dimensions(&self) -> usize {
        self.matrix.ncols()
    }

    /// Names of the feature columns, in matrix column order
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_cols
    }

    /// Display title for a row
    pub fn title(&self, row: usize) -> &str {
        &self.titles[row]
    }

    /// Poster URL for a row; `None` when the feature table has no poster column
    pub fn poster(&self, row: usize) -> Option<&str> {
        self.posters.as_ref().map(|p| p[row].as_str())
    }

    /// Resolves each input title to its row, case-insensitively.
    ///
    /// Unmatched titles yield `None`; partial matches are expected and left
    /// to the caller to handle.
    pub fn resolve_titles<S: AsRef<str>>(&self, titles: &[S]) -> Vec<Option<usize>> {
        titles
            .iter()
            .map(|t| self.title_index.get(&normalize_title(t.as_ref())).copied())
            .collect()
    }

    /// Matrix column for a genre name, case-insensitively
    pub fn genre_column(&self, genre: &str) -> Option<usize> {
        self.genre_cols.get(&normalize_title(genre)).copied()
    }
}

/// Scales every row to unit Euclidean norm. Zero rows carry no signal and
/// stay zero rather than dividing by zero.
fn normalize_rows(mut matrix: Array2<f32>) -> Array2<f32> {
    for mut row in matrix.outer_iter_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
    matrix
}

/// Maps each `genre_<Name>` feature column to its matrix column index.
///
/// Validated here, at load time, so a violated naming convention fails the
/// startup instead of silently weakening request-time filters.
fn build_genre_map(feature_cols: &[String]) -> anyhow::Result<HashMap<String, usize>> {
    let mut genre_cols = HashMap::new();
    for (col, name) in feature_cols.iter().enumerate() {
        if let Some(genre) = name.strip_prefix(GENRE_PREFIX) {
            let key = normalize_title(genre);
            if key.is_empty() {
                bail!("Genre column {:?} has an empty genre name", name);
            }
            if genre_cols.insert(key, col).is_some() {
                bail!("Duplicate genre column {:?}", name);
            }
        }
    }
    Ok(genre_cols)
}
