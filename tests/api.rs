//! HTTP-level tests for learner progression, run against the in-memory store.

mod common;

use axum::http::StatusCode;
use common::{app_with, body_json, get, post, put, seeded_app};
use serde_json::json;
use uuid::Uuid;

use jyotish_progress::models::{Learner, Lesson, Level, Tier};
use jyotish_progress::progression::complete_lesson;
use jyotish_progress::store::ProgressStore;

fn lesson(level: Level, day: u32) -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        level,
        day,
        title: format!("{level} {day}"),
        title_hi: None,
        content: format!("content of {level} {day}"),
        content_hi: None,
        duration: "15 min".into(),
        is_locked: false,
    }
}

// ---------------------------------------------------------------------------
// Learner lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = seeded_app().await;
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn new_learner_starts_free_at_day_one() {
    let (app, _) = seeded_app().await;
    let response = post(&app, "/api/learners", Some(json!({ "id": "uid-1", "display_name": "Asha" }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["current_day"], 1);
    assert_eq!(json["tier"], "free");
    assert_eq!(json["active_level"], "beginner");
    assert_eq!(json["display_name"], "Asha");
}

#[tokio::test]
async fn creating_twice_keeps_progress() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;
    post(&app, "/api/learners/uid-1/levels/beginner/lessons/1/complete", None).await;

    let json = body_json(post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await).await;
    assert_eq!(json["current_day"], 2);
    assert_eq!(json["display_name"], "Student");
}

#[tokio::test]
async fn blank_id_is_rejected() {
    let (app, _) = seeded_app().await;
    let response = post(&app, "/api/learners", Some(json!({ "id": "  " }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_learner_is_404() {
    let (app, _) = seeded_app().await;
    let response = get(&app, "/api/learners/ghost").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Syllabus and lesson access
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_syllabus_has_only_day_one_open() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let json = body_json(get(&app, "/api/learners/uid-1/levels/beginner/syllabus").await).await;
    let lessons = json["lessons"].as_array().unwrap();
    assert_eq!(lessons.len(), 5);
    assert_eq!(lessons[0]["state"], "current");
    for entry in &lessons[1..] {
        assert_eq!(entry["state"], "locked-by-progress");
    }
    assert_eq!(json["progress"]["ceiling_day"], 5);
    assert_eq!(json["progress"]["percent"], 0);
}

#[tokio::test]
async fn syllabus_titles_follow_language() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let json = body_json(get(&app, "/api/learners/uid-1/levels/beginner/syllabus?lang=hi").await).await;
    assert_eq!(json["lessons"][0]["title"], "ज्योतिष का परिचय");
}

#[tokio::test]
async fn free_learner_sees_paid_levels_locked_by_tier() {
    let lessons = vec![lesson(Level::Beginner, 1), lesson(Level::Advanced, 1), lesson(Level::Advanced, 2)];
    let (app, _) = app_with(lessons).await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let json = body_json(get(&app, "/api/learners/uid-1/levels/advanced/syllabus").await).await;
    for entry in json["lessons"].as_array().unwrap() {
        assert_eq!(entry["state"], "locked-by-tier");
    }
    assert_eq!(json["progress"]["ceiling_day"], 0);

    let response = get(&app, "/api/learners/uid-1/levels/advanced/lessons/1").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "LOCKED");
    assert_eq!(body["state"], "locked-by-tier");
}

#[tokio::test]
async fn current_lesson_is_served_localized() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let response = get(&app, "/api/learners/uid-1/levels/beginner/lessons/1?lang=hi").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["state"], "current");
    assert_eq!(json["lesson"]["language"], "hi");
    assert_eq!(json["lesson"]["duration"], "15 min");
    assert_eq!(json["languages"], json!(["en", "hi"]));

    let locked = get(&app, "/api/learners/uid-1/levels/beginner/lessons/2").await;
    assert_eq!(locked.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(locked).await["state"], "locked-by-progress");
}

#[tokio::test]
async fn unknown_level_and_missing_day_are_404() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let response = get(&app, "/api/learners/uid-1/levels/expert/syllabus").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/api/learners/uid-1/levels/beginner/lessons/42").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completing_advances_and_repeat_is_conflict() {
    let (app, store) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let response = post(&app, "/api/learners/uid-1/levels/beginner/lessons/1/complete", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["current_day"], 2);

    let repeat = post(&app, "/api/learners/uid-1/levels/beginner/lessons/1/complete", None).await;
    assert_eq!(repeat.status(), StatusCode::CONFLICT);
    let body = body_json(repeat).await;
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert_eq!(body["state"], "completed");

    let stored = store.load_learner("uid-1").await.unwrap().unwrap();
    assert_eq!(stored.current_day, 2);
}

#[tokio::test]
async fn skipping_ahead_is_rejected() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let response = post(&app, "/api/learners/uid-1/levels/beginner/lessons/3/complete", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["state"], "locked-by-progress");
}

#[tokio::test]
async fn gap_in_catalog_blocks_completion_of_missing_day() {
    let lessons = vec![lesson(Level::Beginner, 1), lesson(Level::Beginner, 2), lesson(Level::Beginner, 4)];
    let (app, _) = app_with(lessons).await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;
    post(&app, "/api/learners/uid-1/levels/beginner/lessons/1/complete", None).await;

    // day 2 is current, day 4 is judged by its number
    let day4 = get(&app, "/api/learners/uid-1/levels/beginner/lessons/4").await;
    assert_eq!(day4.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(day4).await["state"], "locked-by-progress");

    post(&app, "/api/learners/uid-1/levels/beginner/lessons/2/complete", None).await;
    let missing = post(&app, "/api/learners/uid-1/levels/beginner/lessons/3/complete", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Tier changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upgrade_opens_next_level_at_day_one() {
    let lessons = vec![
        lesson(Level::Beginner, 1),
        lesson(Level::Intermediate, 1),
        lesson(Level::Intermediate, 2),
        lesson(Level::Advanced, 1),
    ];
    let (app, _) = app_with(lessons).await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    let response = put(&app, "/api/learners/uid-1/tier", json!({ "tier": "intermediate" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["tier"], "intermediate");

    let json = body_json(get(&app, "/api/learners/uid-1/levels/intermediate/syllabus").await).await;
    assert_eq!(json["lessons"][0]["state"], "current");
    assert_eq!(json["lessons"][1]["state"], "locked-by-progress");

    let adv = body_json(get(&app, "/api/learners/uid-1/levels/advanced/syllabus").await).await;
    assert_eq!(adv["lessons"][0]["state"], "locked-by-tier");

    let started = post(&app, "/api/learners/uid-1/levels/intermediate/lessons/1/complete", None).await;
    let learner = body_json(started).await;
    assert_eq!(learner["active_level"], "intermediate");
    assert_eq!(learner["current_day"], 2);
}

#[tokio::test]
async fn tier_for_unknown_learner_is_404_and_bad_tier_is_rejected() {
    let (app, _) = seeded_app().await;
    let response = put(&app, "/api/learners/ghost/tier", json!({ "tier": "advanced" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;
    let response = put(&app, "/api/learners/uid-1/tier", json!({ "tier": "platinum" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_day_segment_is_a_validation_error() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;

    for uri in [
        "/api/learners/uid-1/levels/beginner/lessons/abc",
        "/api/learners/uid-1/levels/beginner/lessons/-1/complete",
    ] {
        let response = if uri.ends_with("/complete") {
            post(&app, uri, None).await
        } else {
            get(&app, uri).await
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn recompleting_lower_level_after_switch_is_rejected() {
    let lessons = vec![
        lesson(Level::Beginner, 1),
        lesson(Level::Beginner, 2),
        lesson(Level::Beginner, 3),
        lesson(Level::Intermediate, 1),
        lesson(Level::Intermediate, 2),
        lesson(Level::Intermediate, 3),
    ];
    let (app, _) = app_with(lessons).await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;
    for day in 1..=3 {
        let uri = format!("/api/learners/uid-1/levels/beginner/lessons/{day}/complete");
        assert_eq!(post(&app, &uri, None).await.status(), StatusCode::OK);
    }
    put(&app, "/api/learners/uid-1/tier", json!({ "tier": "intermediate" })).await;
    for day in 1..=2 {
        let uri = format!("/api/learners/uid-1/levels/intermediate/lessons/{day}/complete");
        assert_eq!(post(&app, &uri, None).await.status(), StatusCode::OK);
    }

    let response = post(&app, "/api/learners/uid-1/levels/beginner/lessons/1/complete", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert_eq!(json["state"], "completed");

    // intermediate progress is intact and beginner stays open for review
    let learner = body_json(get(&app, "/api/learners/uid-1").await).await;
    assert_eq!(learner["active_level"], "intermediate");
    assert_eq!(learner["current_day"], 3);
    let syllabus = body_json(get(&app, "/api/learners/uid-1/levels/intermediate/syllabus").await).await;
    assert_eq!(syllabus["lessons"][1]["state"], "completed");
    assert_eq!(syllabus["lessons"][2]["state"], "current");
    let review = get(&app, "/api/learners/uid-1/levels/beginner/lessons/2").await;
    assert_eq!(review.status(), StatusCode::OK);
    assert_eq!(body_json(review).await["state"], "completed");
}

#[tokio::test]
async fn stale_lower_level_completion_cannot_undo_a_switch() {
    let mut lessons: Vec<Lesson> = (1..=12).map(|d| lesson(Level::Beginner, d)).collect();
    lessons.extend((1..=3).map(|d| lesson(Level::Intermediate, d)));
    let (app, store) = app_with(lessons).await;

    let mut learner = Learner::new("uid-1", "Asha");
    learner.tier = Tier::Intermediate;
    learner.current_day = 12;
    store.create_learner(&learner).await.unwrap();
    // a second tab read the learner before the switch and writes late
    let stale = store.load_learner("uid-1").await.unwrap().unwrap();

    for day in 1..=2 {
        let uri = format!("/api/learners/uid-1/levels/intermediate/lessons/{day}/complete");
        assert_eq!(post(&app, &uri, None).await.status(), StatusCode::OK);
    }
    let late = complete_lesson(&stale, Level::Beginner, 12).unwrap();
    store.save_learner(&late).await.unwrap();

    let syllabus = body_json(get(&app, "/api/learners/uid-1/levels/intermediate/syllabus").await).await;
    assert_eq!(syllabus["lessons"][1]["state"], "completed");
    let learner = body_json(get(&app, "/api/learners/uid-1").await).await;
    assert_eq!(learner["active_level"], "intermediate");
    assert_eq!(learner["current_day"], 3);
}

#[tokio::test]
async fn dashboard_summarises_every_level() {
    let (app, _) = seeded_app().await;
    post(&app, "/api/learners", Some(json!({ "id": "uid-1" }))).await;
    post(&app, "/api/learners/uid-1/levels/beginner/lessons/1/complete", None).await;

    let json = body_json(get(&app, "/api/learners/uid-1/dashboard").await).await;
    let levels = json["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[0]["level"], "beginner");
    assert_eq!(levels[0]["active"], true);
    assert_eq!(levels[0]["reachable"], true);
    assert_eq!(levels[0]["progress"]["completed"], 1);
    assert_eq!(levels[0]["progress"]["percent"], 20);
    assert_eq!(levels[1]["reachable"], false);
    assert_eq!(levels[2]["progress"]["ceiling_day"], 0);
}

#[tokio::test]
async fn public_catalog_lists_published_days() {
    let mut held = lesson(Level::Beginner, 3);
    held.is_locked = true;
    let (app, _) = app_with(vec![lesson(Level::Beginner, 1), lesson(Level::Beginner, 2), held]).await;

    let json = body_json(get(&app, "/api/levels/beginner/lessons").await).await;
    let days: Vec<u64> = json.as_array().unwrap().iter().map(|e| e["day"].as_u64().unwrap()).collect();
    assert_eq!(days, vec![1, 2]);
}
