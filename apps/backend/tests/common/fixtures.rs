//! Test fixtures and factory functions for creating test data.

use axum_test::TestServer;
use serde_json::{json, Value};

use super::TestContext;

/// Request body for adding a word.
pub fn new_word(lemma: &str, translation: &str) -> Value {
    json!({
        "lemma": lemma,
        "translation": translation,
    })
}

/// Request body for adding a noun with article and example sentence.
pub fn new_noun(lemma: &str, article: &str, translation: &str, example: &str) -> Value {
    json!({
        "lemma": lemma,
        "part_of_speech": "noun",
        "article": article,
        "translation": translation,
        "example": example,
    })
}

/// Request body for submitting a review.
pub fn review(word_id: i64, rating: &str) -> Value {
    json!({
        "word_id": word_id,
        "rating": rating,
        "response_time_ms": 1500,
    })
}

/// Add a word over HTTP and return its ID.
pub async fn add_word(server: &TestServer, token: &str, lemma: &str, translation: &str) -> i64 {
    let (name, value) = TestContext::auth(token);
    let response = server
        .post("/api/words")
        .add_header(name, value)
        .json(&new_word(lemma, translation))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["word"]["id"].as_i64().expect("word id in response")
}

/// Submit a review over HTTP and return the response body.
pub async fn submit_review(server: &TestServer, token: &str, word_id: i64, rating: &str) -> Value {
    let (name, value) = TestContext::auth(token);
    let response = server
        .post("/api/study/review")
        .add_header(name, value)
        .json(&review(word_id, rating))
        .await;
    response.assert_status_ok();
    response.json()
}
