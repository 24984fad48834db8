use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{AnimeMeta, GenreMatch, Recommendation, Suggestion};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub liked_titles: Vec<String>,
    pub genre_filter: Option<Vec<String>>,
    #[serde(default = "default_k")]
    pub top_n: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenreRequest {
    pub genres: Vec<String>,
    #[serde(default = "default_k")]
    pub k: usize,
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    pub prefix: String,
    #[serde(default = "default_k")]
    pub limit: usize,
}

fn default_k() -> usize {
    10
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.chars().count() < 2 {
        return Err(AppError::Validation(
            "title must be at least 2 characters".to_string(),
        ));
    }
    Ok(())
}

// Handlers

/// Root endpoint
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "OneStream anime recommender running" }))
}

/// Liveness check
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Content-based recommendations from a set of liked titles
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    if request.top_n < 1 {
        return Err(AppError::Validation("top_n must be at least 1".to_string()));
    }

    tracing::info!(
        liked = request.liked_titles.len(),
        top_n = request.top_n,
        filtered = request.genre_filter.is_some(),
        "Processing recommendation request"
    );

    let results = state.recommender.recommend(
        &request.liked_titles,
        request.top_n,
        request.genre_filter.as_deref(),
    )?;
    Ok(Json(results))
}

/// Full metadata for a single title
pub async fn meta(
    State(state): State<AppState>,
    Query(query): Query<TitleQuery>,
) -> AppResult<Json<AnimeMeta>> {
    validate_title(&query.title)?;
    state
        .catalogue
        .meta(&query.title)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Title not found".to_string()))
}

/// Poster URL for a single title
pub async fn poster(
    State(state): State<AppState>,
    Query(query): Query<TitleQuery>,
) -> AppResult<Json<Value>> {
    validate_title(&query.title)?;
    let (title, poster) = state
        .catalogue
        .poster(&query.title)
        .ok_or_else(|| AppError::NotFound("Title not found".to_string()))?;
    Ok(Json(json!({ "title": title, "poster": poster })))
}

/// Top titles carrying every requested genre, ranked by catalogue score
pub async fn genres(
    State(state): State<AppState>,
    Json(request): Json<GenreRequest>,
) -> AppResult<Json<Vec<GenreMatch>>> {
    if !(1..=20).contains(&request.k) {
        return Err(AppError::Validation(
            "k must be between 1 and 20".to_string(),
        ));
    }

    let results = state.catalogue.top_by_genres(&request.genres, request.k)?;
    if results.is_empty() {
        return Err(AppError::NotFound(
            "No anime found for those genres".to_string(),
        ));
    }
    Ok(Json(results))
}

/// Title suggestions for a search-box prefix
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> AppResult<Json<Vec<Suggestion>>> {
    if query.prefix.trim().is_empty() {
        return Err(AppError::Validation(
            "prefix must not be empty".to_string(),
        ));
    }
    if !(1..=50).contains(&query.limit) {
        return Err(AppError::Validation(
            "limit must be between 1 and 50".to_string(),
        ));
    }
    Ok(Json(state.catalogue.autocomplete(&query.prefix, query.limit)))
}
