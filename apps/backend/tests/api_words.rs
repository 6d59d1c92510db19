//! Word store API tests.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::Value;

use common::fixtures;
use common::TestContext;

#[tokio::test]
async fn test_add_word_starts_with_initial_state() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(None).await;

    let (name, value) = TestContext::auth(&token);
    let response = server
        .post("/api/words")
        .add_header(name, value)
        .json(&fixtures::new_noun("Hund", "der", "dog", "Der Hund bellt."))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let today = Utc::now().date_naive().to_string();

    assert_eq!(body["word"]["lemma"], "Hund");
    assert_eq!(body["word"]["article"], "der");
    assert_eq!(body["word"]["user_id"], user_id);
    assert_eq!(body["state"]["easiness_factor"], 2.5);
    assert_eq!(body["state"]["interval_days"], 1);
    assert_eq!(body["state"]["repetitions"], 0);
    assert_eq!(body["state"]["review_count"], 0);
    assert_eq!(body["state"]["next_review_date"], today.as_str());
    assert_eq!(body["stage"], "new");
    assert_eq!(body["success_rate"], 0.0);
}

#[tokio::test]
async fn test_add_word_rejects_blank_fields() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;

    for body in [fixtures::new_word("  ", "dog"), fixtures::new_word("Hund", "")] {
        let (name, value) = TestContext::auth(&token);
        let response = server.post("/api/words").add_header(name, value).json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_duplicate_lemma_conflicts() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;

    fixtures::add_word(&server, &token, "Katze", "cat").await;

    let (name, value) = TestContext::auth(&token);
    let response = server
        .post("/api/words")
        .add_header(name, value)
        .json(&fixtures::new_word("katze", "cat"))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_duplicate_lemma_with_umlaut_conflicts() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;

    fixtures::add_word(&server, &token, "Übung", "exercise").await;

    let (name, value) = TestContext::auth(&token);
    let response = server
        .post("/api/words")
        .add_header(name, value)
        .json(&fixtures::new_word("übung", "exercise"))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_same_lemma_for_different_users() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, first) = ctx.create_test_user(None).await;
    let (_, second) = ctx.create_test_user(None).await;

    let a = fixtures::add_word(&server, &first, "Haus", "house").await;
    let b = fixtures::add_word(&server, &second, "Haus", "house").await;
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_list_words_only_returns_own_words() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;
    let (_, other) = ctx.create_test_user(None).await;

    fixtures::add_word(&server, &token, "Baum", "tree").await;
    fixtures::add_word(&server, &token, "Blume", "flower").await;
    fixtures::add_word(&server, &other, "Wald", "forest").await;

    let (name, value) = TestContext::auth(&token);
    let response = server.get("/api/words").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let lemmas: Vec<&str> = body["words"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["word"]["lemma"].as_str().unwrap())
        .collect();
    assert_eq!(lemmas.len(), 2);
    assert!(lemmas.contains(&"Baum"));
    assert!(lemmas.contains(&"Blume"));
}

#[tokio::test]
async fn test_word_detail_includes_analysis() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;
    let word_id = fixtures::add_word(&server, &token, "Apfel", "apple").await;

    fixtures::submit_review(&server, &token, word_id, "good").await;
    fixtures::submit_review(&server, &token, word_id, "easy").await;

    let (name, value) = TestContext::auth(&token);
    let response = server
        .get(&format!("/api/words/{}", word_id))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["word"]["lemma"], "Apfel");
    assert_eq!(body["state"]["review_count"], 2);
    assert_eq!(body["analysis"]["total_reviews"], 2);
    assert_eq!(body["analysis"]["average_rating"], 3.5);
    assert_eq!(body["analysis"]["trend"], "insufficient_data");
    assert_eq!(body["analysis"]["difficulty"], "easy");

    // reviewed today, so nothing has decayed yet
    let retention = body["predicted_retention"].as_f64().unwrap();
    assert!(retention > 0.99, "{}", retention);
}

#[tokio::test]
async fn test_other_users_word_is_not_found() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, owner) = ctx.create_test_user(None).await;
    let (_, stranger) = ctx.create_test_user(None).await;
    let word_id = fixtures::add_word(&server, &owner, "Brot", "bread").await;

    for path in [
        format!("/api/words/{}", word_id),
        format!("/api/words/{}/history", word_id),
    ] {
        let (name, value) = TestContext::auth(&stranger);
        let response = server.get(&path).add_header(name, value).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    let (name, value) = TestContext::auth(&stranger);
    server
        .delete(&format!("/api/words/{}", word_id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_word() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;
    let word_id = fixtures::add_word(&server, &token, "Tisch", "table").await;
    fixtures::submit_review(&server, &token, word_id, "hard").await;

    let (name, value) = TestContext::auth(&token);
    server
        .delete(&format!("/api/words/{}", word_id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let (name, value) = TestContext::auth(&token);
    server
        .get(&format!("/api/words/{}", word_id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // the lemma can be added again afterwards
    fixtures::add_word(&server, &token, "Tisch", "table").await;
}

#[tokio::test]
async fn test_reset_word_restores_schedule_but_keeps_counts() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;
    let word_id = fixtures::add_word(&server, &token, "Stuhl", "chair").await;

    fixtures::submit_review(&server, &token, word_id, "good").await;
    fixtures::submit_review(&server, &token, word_id, "easy").await;

    let (name, value) = TestContext::auth(&token);
    let response = server
        .post(&format!("/api/words/{}/reset", word_id))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let today = Utc::now().date_naive().to_string();
    assert_eq!(body["state"]["easiness_factor"], 2.5);
    assert_eq!(body["state"]["interval_days"], 1);
    assert_eq!(body["state"]["repetitions"], 0);
    assert_eq!(body["state"]["next_review_date"], today.as_str());
    assert_eq!(body["state"]["review_count"], 2);
    assert_eq!(body["state"]["success_count"], 2);
}

#[tokio::test]
async fn test_reset_unknown_word() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;

    let (name, value) = TestContext::auth(&token);
    server
        .post("/api/words/999/reset")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_is_newest_first_and_limited() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (_, token) = ctx.create_test_user(None).await;
    let word_id = fixtures::add_word(&server, &token, "Fenster", "window").await;

    for rating in ["again", "hard", "good"] {
        fixtures::submit_review(&server, &token, word_id, rating).await;
    }

    let (name, value) = TestContext::auth(&token);
    let response = server
        .get(&format!("/api/words/{}/history", word_id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let ratings: Vec<&str> = body["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["rating"].as_str().unwrap())
        .collect();
    assert_eq!(ratings, vec!["good", "hard", "again"]);

    let first = &body["reviews"][2];
    assert_eq!(first["interval_before"], 1);
    assert_eq!(first["interval_after"], 0);
    assert_eq!(first["ease_before"], 2.5);
    assert_eq!(first["response_time_ms"], 1500);

    let (name, value) = TestContext::auth(&token);
    let response = server
        .get(&format!("/api/words/{}/history?limit=1", word_id))
        .add_header(name, value)
        .await;
    let body: Value = response.json();
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(body["reviews"][0]["rating"], "good");
}
