use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{Learner, Lesson, Tier};
use crate::store::{ProgressStore, StoreError};

pub type Db = Pool<Postgres>;

pub async fn connect(url: &str) -> anyhow::Result<Db> {
    Ok(Pool::<Postgres>::connect(url).await?)
}

const LEARNER_COLUMNS: &str = "id, display_name, tier, active_level, current_day, created_at";

/// Rank of a level expression, so `(rank, day)` tuples order progression.
fn level_rank(expr: &str) -> String {
    format!("array_position(ARRAY['beginner','intermediate','advanced']::text[], {expr})")
}

/// Day numbers are `u32` in the domain and `INT` in the schema.
fn day_to_db(day: u32) -> Result<i32, StoreError> {
    Ok(i32::try_from(day)?)
}

const LESSON_COLUMNS: &str =
    "id, level, day, title, title_hi, content, content_hi, duration, is_locked";

#[derive(sqlx::FromRow, Debug, Clone)]
struct LearnerRow {
    id: String,
    display_name: String,
    tier: String,
    active_level: String,
    current_day: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<LearnerRow> for Learner {
    type Error = StoreError;

    fn try_from(r: LearnerRow) -> Result<Self, Self::Error> {
        Ok(Learner {
            id: r.id,
            display_name: r.display_name,
            tier: r.tier.parse()?,
            active_level: r.active_level.parse()?,
            // column is CHECKed >= 1
            current_day: u32::try_from(r.current_day.max(1))?,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
struct LessonRow {
    id: Uuid,
    level: String,
    day: i32,
    title: String,
    title_hi: Option<String>,
    content: String,
    content_hi: Option<String>,
    duration: String,
    is_locked: bool,
}

impl TryFrom<LessonRow> for Lesson {
    type Error = StoreError;

    fn try_from(r: LessonRow) -> Result<Self, Self::Error> {
        Ok(Lesson {
            id: r.id,
            level: r.level.parse()?,
            day: u32::try_from(r.day.max(0))?,
            title: r.title,
            title_hi: r.title_hi,
            content: r.content,
            content_hi: r.content_hi,
            duration: r.duration,
            is_locked: r.is_locked,
        })
    }
}

/// Postgres-backed [`ProgressStore`].
#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProgressStore for PgStore {
    async fn load_learner(&self, id: &str) -> Result<Option<Learner>, StoreError> {
        let sql = format!("SELECT {LEARNER_COLUMNS} FROM learners WHERE id = $1");
        sqlx::query_as::<_, LearnerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(Learner::try_from)
            .transpose()
    }

    async fn create_learner(&self, learner: &Learner) -> Result<Learner, StoreError> {
        let sql = format!(
            "INSERT INTO learners (id, display_name, tier, active_level, current_day) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET id = learners.id \
             RETURNING {LEARNER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, LearnerRow>(&sql)
            .bind(&learner.id)
            .bind(&learner.display_name)
            .bind(learner.tier.as_str())
            .bind(learner.active_level.as_str())
            .bind(day_to_db(learner.current_day)?)
            .fetch_one(&self.db)
            .await?;
        row.try_into()
    }

    async fn save_learner(&self, learner: &Learner) -> Result<Option<Learner>, StoreError> {
        // SET expressions see the pre-update row, so both CASEs compare the
        // stored position against the incoming one.
        let ahead = format!(
            "({}, current_day) < ({}, $4)",
            level_rank("active_level"),
            level_rank("$3::text")
        );
        let sql = format!(
            "UPDATE learners SET \
                display_name = $2, \
                current_day = CASE WHEN {ahead} THEN GREATEST($4, 1) ELSE current_day END, \
                active_level = CASE WHEN {ahead} THEN $3 ELSE active_level END, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {LEARNER_COLUMNS}"
        );
        sqlx::query_as::<_, LearnerRow>(&sql)
            .bind(&learner.id)
            .bind(&learner.display_name)
            .bind(learner.active_level.as_str())
            .bind(day_to_db(learner.current_day)?)
            .fetch_optional(&self.db)
            .await?
            .map(Learner::try_from)
            .transpose()
    }

    async fn set_tier(&self, id: &str, tier: Tier) -> Result<Option<Learner>, StoreError> {
        let sql = format!(
            "UPDATE learners SET tier = $2, updated_at = now() WHERE id = $1 \
             RETURNING {LEARNER_COLUMNS}"
        );
        sqlx::query_as::<_, LearnerRow>(&sql)
            .bind(id)
            .bind(tier.as_str())
            .fetch_optional(&self.db)
            .await?
            .map(Learner::try_from)
            .transpose()
    }

    async fn lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons ORDER BY level, day");
        sqlx::query_as::<_, LessonRow>(&sql)
            .fetch_all(&self.db)
            .await?
            .into_iter()
            .map(Lesson::try_from)
            .collect()
    }

    async fn insert_lessons(&self, lessons: &[Lesson]) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        for lesson in lessons {
            sqlx::query(
                "INSERT INTO lessons \
                    (id, level, day, title, title_hi, content, content_hi, duration, is_locked) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (level, day) DO NOTHING",
            )
            .bind(lesson.id)
            .bind(lesson.level.as_str())
            .bind(day_to_db(lesson.day)?)
            .bind(&lesson.title)
            .bind(lesson.title_hi.as_deref())
            .bind(&lesson.content)
            .bind(lesson.content_hi.as_deref())
            .bind(&lesson.duration)
            .bind(lesson.is_locked)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
