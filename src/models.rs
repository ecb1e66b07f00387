use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// A curriculum track. Ordering follows the syllabus: beginner first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(UnknownVariant::new("level", other)),
        }
    }
}

/// Subscription class reported by billing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Intermediate,
    Advanced,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Intermediate => "intermediate",
            Tier::Advanced => "advanced",
        }
    }

    /// Highest level this tier may open.
    pub fn max_level(self) -> Level {
        match self {
            Tier::Free => Level::Beginner,
            Tier::Intermediate => Level::Intermediate,
            Tier::Advanced => Level::Advanced,
        }
    }

    pub fn reaches(self, level: Level) -> bool {
        level <= self.max_level()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "intermediate" => Ok(Tier::Intermediate),
            "advanced" => Ok(Tier::Advanced),
            other => Err(UnknownVariant::new("tier", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Learner {
    pub id: String,
    pub display_name: String,
    pub tier: Tier,
    /// Level that `current_day` counts within.
    pub active_level: Level,
    pub current_day: u32,
    pub created_at: DateTime<Utc>,
}

impl Learner {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            tier: Tier::Free,
            active_level: Level::Beginner,
            current_day: 1,
            created_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: Uuid,
    pub level: Level,
    pub day: u32,
    pub title: String,
    pub title_hi: Option<String>,
    pub content: String,
    pub content_hi: Option<String>,
    pub duration: String,
    /// Held back by the curriculum editor; treated as not yet published.
    pub is_locked: bool,
}

impl Lesson {
    pub fn localized(&self, lang: Language) -> LocalizedLesson {
        let (title, content, served) = match lang {
            Language::English => (self.title.clone(), self.content.clone(), Language::English),
            Language::Hindi => {
                let title = self.title_hi.clone();
                let content = self.content_hi.clone();
                // Serve Hindi only when at least the body is translated.
                let served = if content.is_some() { Language::Hindi } else { Language::English };
                (
                    title.unwrap_or_else(|| self.title.clone()),
                    content.unwrap_or_else(|| self.content.clone()),
                    served,
                )
            }
        };
        LocalizedLesson {
            level: self.level,
            day: self.day,
            title,
            content,
            duration: self.duration.clone(),
            language: served,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LocalizedLesson {
    pub level: Level,
    pub day: u32,
    pub title: String,
    pub content: String,
    pub duration: String,
    pub language: Language,
}

/// Accessibility of one lesson for one learner. Derived, never stored.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LockState {
    LockedByTier,
    LockedByProgress,
    Current,
    Completed,
}

impl LockState {
    pub fn as_str(self) -> &'static str {
        match self {
            LockState::LockedByTier => "locked-by-tier",
            LockState::LockedByProgress => "locked-by-progress",
            LockState::Current => "current",
            LockState::Completed => "completed",
        }
    }

    pub fn is_accessible(self) -> bool {
        matches!(self, LockState::Current | LockState::Completed)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- request/response bodies ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateLearnerReq {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetTierReq {
    pub tier: Tier,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LangQuery {
    pub lang: Option<Language>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SyllabusEntry {
    pub day: u32,
    pub title: String,
    pub duration: String,
    pub state: LockState,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: Level,
    pub completed: u32,
    pub total: u32,
    pub ceiling_day: u32,
    pub percent: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SyllabusView {
    pub level: Level,
    pub progress: LevelProgress,
    pub lessons: Vec<SyllabusEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LevelSummary {
    pub level: Level,
    pub reachable: bool,
    pub active: bool,
    pub progress: LevelProgress,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardView {
    pub learner: Learner,
    pub levels: Vec<LevelSummary>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LessonView {
    pub state: LockState,
    pub lesson: LocalizedLesson,
    pub languages: Vec<Language>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CatalogEntry {
    pub day: u32,
    pub title: String,
    pub title_hi: Option<String>,
    pub duration: String,
}
