use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};

use crate::models::AnimeMeta;

use super::normalize_title;

/// Columns carrying display metadata; everything else in the clean CSV is a
/// one-hot genre flag column.
const META_COLUMNS: [&str; 9] = [
    "Title",
    "Score",
    "Episodes",
    "Image URL",
    "Synopsis",
    "Studios",
    "Popularity",
    "Ranked",
    "MAL_ID",
];

/// Read-only catalogue metadata table, loaded once at startup.
///
/// Serves three consumers: metadata/poster lookups by title, the prefix
/// autocomplete (catalogue order), and the genre-ranking endpoint via the
/// per-genre membership flags. Also the engine's poster fallback when the
/// feature table has no poster column.
pub struct MetadataStore {
    records: Vec<AnimeMeta>,
    title_index: HashMap<String, usize>,
    genre_flags: HashMap<String, Vec<bool>>,
}

impl MetadataStore {
    /// Loads the metadata table from a CSV file. Fatal on a missing file or
    /// zero usable rows.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open metadata CSV at {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to load metadata CSV at {}", path.display()))
    }

    /// Builds the store from any CSV source.
    ///
    /// Unlike the feature table, metadata cells are tolerated when missing
    /// or malformed: numbers fall back to `None` and strings to empty.
    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers().context("Failed to read headers")?.clone();

        let title_col = headers
            .iter()
            .position(|h| h == "Title" || h == "title")
            .context("Metadata CSV has no title column")?;
        let column = |name: &str| headers.iter().position(|h| h == name);

        let score_col = column("Score");
        let episodes_col = column("Episodes");
        let poster_col = column("Image URL");
        let synopsis_col = column("Synopsis");
        let studios_col = column("Studios");
        let popularity_col = column("Popularity");
        let ranked_col = column("Ranked");

        let mut genre_idx: Vec<usize> = Vec::new();
        let mut seen_genres: HashSet<String> = HashSet::new();
        for (i, h) in headers.iter().enumerate() {
            if i == title_col || META_COLUMNS.contains(&h) {
                continue;
            }
            if !seen_genres.insert(normalize_title(h)) {
                tracing::warn!(column = %h, "Duplicate genre column in metadata CSV, ignoring");
                continue;
            }
            genre_idx.push(i);
        }

        let mut records: Vec<AnimeMeta> = Vec::new();
        let mut title_index: HashMap<String, usize> = HashMap::new();
        let mut genre_flags: HashMap<String, Vec<bool>> = genre_idx
            .iter()
            .map(|&i| (normalize_title(&headers[i]), Vec::new()))
            .collect();

        for (row, record) in csv.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read record {}", row + 1))?;

            let title = record.get(title_col).unwrap_or("").trim().to_string();
            if title.is_empty() {
                tracing::debug!(row = row + 1, "Skipping metadata row with blank title");
                continue;
            }

            let text = |col: Option<usize>| {
                col.and_then(|c| record.get(c)).unwrap_or("").to_string()
            };
            let number = |col: Option<usize>| {
                col.and_then(|c| record.get(c))
                    .and_then(|v| v.trim().parse::<f32>().ok())
            };

            for &col in &genre_idx {
                let set = record
                    .get(col)
                    .and_then(|v| v.trim().parse::<f32>().ok())
                    .map(|v| v != 0.0)
                    .unwrap_or(false);
                if let Some(flags) = genre_flags.get_mut(&normalize_title(&headers[col])) {
                    flags.push(set);
                }
            }

            let key = normalize_title(&title);
            if let Some(previous) = title_index.insert(key, records.len()) {
                tracing::warn!(
                    title = %title,
                    previous_row = previous,
                    "Duplicate title in metadata CSV, keeping the later row"
                );
            }

            records.push(AnimeMeta {
                title,
                score: number(score_col),
                episodes: number(episodes_col),
                poster: text(poster_col),
                synopsis: text(synopsis_col),
                studios: text(studios_col),
                popularity: number(popularity_col),
                ranked: number(ranked_col),
            });
        }

        if records.is_empty() {
            bail!("Metadata CSV has no rows");
        }

        tracing::info!(
            rows = records.len(),
            genres = genre_flags.len(),
            "Metadata table loaded"
        );

        Ok(Self {
            records,
            title_index,
            genre_flags,
        })
    }

    /// All records, in catalogue order
    pub fn records(&self) -> &[AnimeMeta] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Metadata record for a title, case-insensitively
    pub fn get(&self, title: &str) -> Option<&AnimeMeta> {
        self.title_index
            .get(&normalize_title(title))
            .map(|&row| &self.records[row])
    }

    /// Poster URL for a title; empty string when the title is unknown or has
    /// no poster
    pub fn poster_for(&self, title: &str) -> &str {
        self.get(title).map(|m| m.poster.as_str()).unwrap_or("")
    }

    /// Per-row membership flags for a genre column, case-insensitively
    pub fn genre_flags(&self, genre: &str) -> Option<&[bool]> {
        self.genre_flags
            .get(&normalize_title(genre))
            .map(|flags| flags.as_slice())
    }
}
