use serde::{Deserialize, Serialize};

/// Catalogue metadata for a single anime title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimeMeta {
    /// Display name as it appears in the catalogue
    pub title: String,
    /// Community rating, absent when the catalogue has no rating yet
    pub score: Option<f32>,
    /// Episode count, absent for unaired titles
    pub episodes: Option<f32>,
    /// Poster image URL, empty string when unknown
    pub poster: String,
    /// Plot synopsis
    pub synopsis: String,
    /// Producing studios
    pub studios: String,
    /// Popularity rank within the catalogue
    pub popularity: Option<f32>,
    /// Overall rank by rating
    pub ranked: Option<f32>,
}

/// A single ranked recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    /// Recommended title
    pub title: String,
    /// Poster image URL, empty string when unknown
    pub poster: String,
    /// Cosine similarity to the user's profile, rounded to 4 decimals
    pub score: f32,
}

/// A title matching a genre-ranking query
///
/// `similarity` is always `None` for genre rankings; the field exists so the
/// response shape matches recommendation results on the client side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreMatch {
    pub title: String,
    pub score: Option<f32>,
    pub poster: String,
    pub synopsis: String,
    pub similarity: Option<f32>,
}

/// An autocomplete suggestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub title: String,
    pub poster_url: String,
}
