use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

use crate::catalog::{available_languages, Catalog};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::*;
use crate::progression;
use crate::store::ProgressStore;

const DEFAULT_DISPLAY_NAME: &str = "Student";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProgressStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // learners (identity + billing signals)
        .route("/api/learners", post(create_learner))
        .route("/api/learners/:id", get(get_learner))
        .route("/api/learners/:id/tier", put(set_tier))
        .route("/api/learners/:id/dashboard", get(dashboard))
        // gated curriculum
        .route("/api/learners/:id/levels/:level/syllabus", get(syllabus))
        .route("/api/learners/:id/levels/:level/lessons/:day", get(lesson))
        .route("/api/learners/:id/levels/:level/lessons/:day/complete", post(complete))
        // public catalog
        .route("/api/levels/:level/lessons", get(catalog_listing))
        .with_state(state)
}

async fn create_learner(
    State(st): State<AppState>,
    AppJson(req): AppJson<CreateLearnerReq>,
) -> AppResult<Json<Learner>> {
    let id = req.id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("id is required".into()));
    }
    let name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME);

    let learner = st.store.create_learner(&Learner::new(id, name)).await?;
    tracing::info!(learner_id=%learner.id, current_day=learner.current_day, "learner ready");
    Ok(Json(learner))
}

async fn get_learner(State(st): State<AppState>, AppPath(id): AppPath<String>) -> AppResult<Json<Learner>> {
    Ok(Json(load_learner(&st, &id).await?))
}

async fn set_tier(
    State(st): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(req): AppJson<SetTierReq>,
) -> AppResult<Json<Learner>> {
    let learner = st
        .store
        .set_tier(&id, req.tier)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("learner {id}")))?;
    tracing::info!(learner_id=%id, tier=%req.tier, "subscription tier updated");
    Ok(Json(learner))
}

async fn dashboard(State(st): State<AppState>, AppPath(id): AppPath<String>) -> AppResult<Json<DashboardView>> {
    let learner = load_learner(&st, &id).await?;
    let catalog = st.store.load_catalog().await?;
    let levels = Level::ALL
        .into_iter()
        .map(|level| LevelSummary {
            level,
            reachable: learner.tier.reaches(level),
            active: learner.active_level == level,
            progress: progression::level_progress(&learner, level, &catalog),
        })
        .collect();
    Ok(Json(DashboardView { learner, levels }))
}

async fn syllabus(
    State(st): State<AppState>,
    AppPath((id, level)): AppPath<(String, String)>,
    AppQuery(q): AppQuery<LangQuery>,
) -> AppResult<Json<SyllabusView>> {
    let level = parse_level(&level)?;
    let (learner, catalog) = load_with_catalog(&st, &id).await?;
    Ok(Json(SyllabusView {
        level,
        progress: progression::level_progress(&learner, level, &catalog),
        lessons: progression::syllabus(&learner, level, &catalog, q.lang.unwrap_or_default()),
    }))
}

async fn lesson(
    State(st): State<AppState>,
    AppPath((id, level, day)): AppPath<(String, String, u32)>,
    AppQuery(q): AppQuery<LangQuery>,
) -> AppResult<Json<LessonView>> {
    let level = parse_level(&level)?;
    let (learner, catalog) = load_with_catalog(&st, &id).await?;
    let lesson = catalog
        .lesson(level, day)
        .ok_or_else(|| AppError::NotFound(format!("{level} day {day}")))?;

    let state = progression::lock_state_for(&learner, level, day);
    if !state.is_accessible() {
        tracing::debug!(learner_id=%id, %level, day, %state, "lesson withheld");
        return Err(AppError::Locked { level, day, state });
    }
    Ok(Json(LessonView {
        state,
        lesson: lesson.localized(q.lang.unwrap_or_default()),
        languages: available_languages(lesson),
    }))
}

async fn complete(
    State(st): State<AppState>,
    AppPath((id, level, day)): AppPath<(String, String, u32)>,
) -> AppResult<Json<Learner>> {
    let level = parse_level(&level)?;
    let (learner, catalog) = load_with_catalog(&st, &id).await?;
    // A day missing from the catalog cannot be studied, so it cannot be completed.
    if !catalog.contains(level, day) {
        return Err(AppError::NotFound(format!("{level} day {day}")));
    }

    let next = progression::complete_lesson(&learner, level, day).map_err(|e| {
        tracing::warn!(learner_id=%id, %level, day, error=%e, "rejected completion");
        e
    })?;
    let saved = st
        .store
        .save_learner(&next)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("learner {id}")))?;
    tracing::info!(learner_id=%id, %level, day, current_day=saved.current_day, "lesson completed");
    Ok(Json(saved))
}

async fn catalog_listing(
    State(st): State<AppState>,
    AppPath(level): AppPath<String>,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let level = parse_level(&level)?;
    let catalog = st.store.load_catalog().await?;
    let entries = catalog
        .lessons_of(level)
        .map(|l| CatalogEntry {
            day: l.day,
            title: l.title.clone(),
            title_hi: l.title_hi.clone(),
            duration: l.duration.clone(),
        })
        .collect();
    Ok(Json(entries))
}

// --- helpers ---

fn parse_level(raw: &str) -> AppResult<Level> {
    raw.parse().map_err(|_| AppError::NotFound(format!("level {raw}")))
}

async fn load_learner(st: &AppState, id: &str) -> AppResult<Learner> {
    st.store
        .load_learner(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("learner {id}")))
}

async fn load_with_catalog(st: &AppState, id: &str) -> AppResult<(Learner, Catalog)> {
    let learner = load_learner(st, id).await?;
    let catalog = st.store.load_catalog().await?;
    Ok((learner, catalog))
}
