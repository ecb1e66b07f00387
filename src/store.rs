use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::catalog::Catalog;
use crate::models::{Learner, Lesson, Tier, UnknownVariant};
use crate::progression::merge_by_maximum;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(#[from] UnknownVariant),
    #[error("value out of range for storage: {0}")]
    OutOfRange(#[from] std::num::TryFromIntError),
}

/// Durable home of learner progression and lesson metadata.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load_learner(&self, id: &str) -> Result<Option<Learner>, StoreError>;

    /// Insert `learner` unless one with the same id exists; returns the stored record.
    async fn create_learner(&self, learner: &Learner) -> Result<Learner, StoreError>;

    /// Write progression, keeping whichever of the stored and incoming
    /// `(active_level, current_day)` is further along.
    /// `None` when the learner does not exist.
    async fn save_learner(&self, learner: &Learner) -> Result<Option<Learner>, StoreError>;

    async fn set_tier(&self, id: &str, tier: Tier) -> Result<Option<Learner>, StoreError>;

    async fn lessons(&self) -> Result<Vec<Lesson>, StoreError>;

    /// Insert lessons, skipping any (level, day) already present.
    async fn insert_lessons(&self, lessons: &[Lesson]) -> Result<(), StoreError>;

    async fn load_catalog(&self) -> Result<Catalog, StoreError> {
        Ok(Catalog::from_lessons(self.lessons().await?))
    }
}

/// Insert the initial curriculum when the store has no lessons at all.
pub async fn seed_if_empty(store: &dyn ProgressStore) -> Result<bool, StoreError> {
    if !store.lessons().await?.is_empty() {
        tracing::info!("catalog already seeded");
        return Ok(false);
    }
    let seed = crate::catalog::seed_lessons();
    store.insert_lessons(&seed).await?;
    tracing::info!(lessons = seed.len(), "seeded initial catalog");
    Ok(true)
}

/// In-process store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    learners: RwLock<HashMap<String, Learner>>,
    lessons: RwLock<Vec<Lesson>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load_learner(&self, id: &str) -> Result<Option<Learner>, StoreError> {
        Ok(self.learners.read().await.get(id).cloned())
    }

    async fn create_learner(&self, learner: &Learner) -> Result<Learner, StoreError> {
        let mut learners = self.learners.write().await;
        let stored = learners
            .entry(learner.id.clone())
            .or_insert_with(|| learner.clone());
        Ok(stored.clone())
    }

    async fn save_learner(&self, learner: &Learner) -> Result<Option<Learner>, StoreError> {
        let mut learners = self.learners.write().await;
        let Some(stored) = learners.get_mut(&learner.id) else {
            return Ok(None);
        };
        let merged = merge_by_maximum(stored, learner);
        *stored = merged;
        Ok(Some(stored.clone()))
    }

    async fn set_tier(&self, id: &str, tier: Tier) -> Result<Option<Learner>, StoreError> {
        let mut learners = self.learners.write().await;
        Ok(learners.get_mut(id).map(|l| {
            l.tier = tier;
            l.clone()
        }))
    }

    async fn lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        Ok(self.lessons.read().await.clone())
    }

    async fn insert_lessons(&self, lessons: &[Lesson]) -> Result<(), StoreError> {
        let mut stored = self.lessons.write().await;
        for lesson in lessons {
            if !stored.iter().any(|l| l.level == lesson.level && l.day == lesson.day) {
                stored.push(lesson.clone());
            }
        }
        Ok(())
    }
}
