use axum_test::TestServer;
use serde_json::json;

use onestream_api::api::{create_router, AppState};
use onestream_api::store::{FeatureStore, MetadataStore};

const FEATURES_CSV: &str = "\
title,MAL_ID,genre_Action,genre_Comedy,genre_Romance
Cowboy Bebop,1,1,0,0
Space Dandy,2,1,1,0
Nichijou,3,0,1,0
Toradora!,4,0,1,1
";

const METADATA_CSV: &str = "\
Title,Score,Episodes,Image URL,Synopsis,Studios,Popularity,Ranked,action,comedy,romance
Cowboy Bebop,8.8,26,https://example.com/bebop.jpg,Bounty hunters drift through space.,Sunrise,39,28,1,0,0
Space Dandy,7.9,13,https://example.com/dandy.jpg,A dandy guy in space.,Bones,882,1120,1,1,0
Nichijou,8.4,26,https://example.com/nichijou.jpg,Everyday life in Tokisadame.,Kyoto Animation,309,140,0,1,0
Toradora!,8.1,25,https://example.com/toradora.jpg,An unlikely alliance.,J.C.Staff,29,313,0,1,1
";

fn create_test_server() -> TestServer {
    let features = FeatureStore::from_reader(FEATURES_CSV.as_bytes()).unwrap();
    let metadata = MetadataStore::from_reader(METADATA_CSV.as_bytes()).unwrap();
    let state = AppState::new(features, metadata);
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_root_and_ping() {
    let server = create_test_server();

    let response = server.get("/").await;
    response.assert_status_ok();

    let response = server.get("/ping").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_recommend_returns_ranked_results() {
    let server = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({
            "liked_titles": ["Cowboy Bebop"],
            "top_n": 2
        }))
        .await;

    response.assert_status_ok();
    let results: Vec<serde_json::Value> = response.json();
    assert_eq!(results.len(), 2);
    // Space Dandy shares the Action genre with the liked title.
    assert_eq!(results[0]["title"], "Space Dandy");
    assert_eq!(results[0]["poster"], "https://example.com/dandy.jpg");
    let first = results[0]["score"].as_f64().unwrap();
    let second = results[1]["score"].as_f64().unwrap();
    assert!(first >= second);
}

#[tokio::test]
async fn test_recommend_excludes_liked_titles() {
    let server = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({
            "liked_titles": ["Cowboy Bebop", "Nichijou"],
            "top_n": 10
        }))
        .await;

    response.assert_status_ok();
    let results: Vec<serde_json::Value> = response.json();
    assert!(results
        .iter()
        .all(|r| r["title"] != "Cowboy Bebop" && r["title"] != "Nichijou"));
}

#[tokio::test]
async fn test_recommend_with_no_matching_title_is_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({
            "liked_titles": ["Nonexistent Title"]
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("matched"));
}

#[tokio::test]
async fn test_recommend_with_genre_filter() {
    let server = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({
            "liked_titles": ["Cowboy Bebop"],
            "genre_filter": ["Comedy"],
            "top_n": 10
        }))
        .await;

    response.assert_status_ok();
    let results: Vec<serde_json::Value> = response.json();
    assert!(!results.is_empty());
    for result in &results {
        let title = result["title"].as_str().unwrap();
        assert!(["Space Dandy", "Nichijou", "Toradora!"].contains(&title));
    }
}

#[tokio::test]
async fn test_recommend_with_unmatched_filter_returns_empty_list() {
    let server = create_test_server();

    // Romance is a known column, but the only romance title is the liked one.
    let response = server
        .post("/recommend")
        .json(&json!({
            "liked_titles": ["Toradora!"],
            "genre_filter": ["Romance"],
            "top_n": 5
        }))
        .await;

    response.assert_status_ok();
    let results: Vec<serde_json::Value> = response.json();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_recommend_rejects_zero_top_n() {
    let server = create_test_server();

    let response = server
        .post("/recommend")
        .json(&json!({
            "liked_titles": ["Cowboy Bebop"],
            "top_n": 0
        }))
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_meta_lookup() {
    let server = create_test_server();

    let response = server
        .get("/meta")
        .add_query_param("title", "cowboy bebop")
        .await;

    response.assert_status_ok();
    let meta: serde_json::Value = response.json();
    assert_eq!(meta["title"], "Cowboy Bebop");
    assert_eq!(meta["studios"], "Sunrise");
    assert_eq!(meta["episodes"], 26.0);
}

#[tokio::test]
async fn test_meta_unknown_title_is_not_found() {
    let server = create_test_server();

    let response = server
        .get("/meta")
        .add_query_param("title", "Unknown Show")
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_meta_rejects_short_title() {
    let server = create_test_server();

    let response = server.get("/meta").add_query_param("title", "a").await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_poster_lookup() {
    let server = create_test_server();

    let response = server
        .get("/poster")
        .add_query_param("title", "Nichijou")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["title"], "Nichijou");
    assert_eq!(body["poster"], "https://example.com/nichijou.jpg");
}

#[tokio::test]
async fn test_genres_ranked_by_score() {
    let server = create_test_server();

    let response = server
        .post("/genres")
        .json(&json!({
            "genres": ["comedy"],
            "k": 10
        }))
        .await;

    response.assert_status_ok();
    let results: Vec<serde_json::Value> = response.json();
    let titles: Vec<&str> = results.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["Nichijou", "Toradora!", "Space Dandy"]);
    assert!(results[0]["similarity"].is_null());
}

#[tokio::test]
async fn test_genres_with_unknown_genre_is_bad_request() {
    let server = create_test_server();

    let response = server
        .post("/genres")
        .json(&json!({
            "genres": ["mecha"]
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("mecha"));
}

#[tokio::test]
async fn test_genres_with_no_matches_is_not_found() {
    let server = create_test_server();

    // Every genre exists, but no single title carries all three.
    let response = server
        .post("/genres")
        .json(&json!({
            "genres": ["action", "comedy", "romance"]
        }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_genres_rejects_out_of_range_k() {
    let server = create_test_server();

    let response = server
        .post("/genres")
        .json(&json!({
            "genres": ["comedy"],
            "k": 21
        }))
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_autocomplete() {
    let server = create_test_server();

    let response = server
        .get("/autocomplete")
        .add_query_param("prefix", "c")
        .await;

    response.assert_status_ok();
    let suggestions: Vec<serde_json::Value> = response.json();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["title"], "Cowboy Bebop");
    assert_eq!(suggestions[0]["poster_url"], "https://example.com/bebop.jpg");
}

#[tokio::test]
async fn test_autocomplete_rejects_blank_prefix() {
    let server = create_test_server();

    let response = server
        .get("/autocomplete")
        .add_query_param("prefix", " ")
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();

    let response = server.get("/ping").await;
    response.assert_status_ok();
    assert!(response.headers().get("x-request-id").is_some());
}
