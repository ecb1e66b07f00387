//! Lesson gating and curriculum progression.
//!
//! Everything here is a pure function of a [`Learner`] and, where needed, a
//! [`Catalog`] snapshot. Loading and saving learners is the caller's job.

use std::cmp::Ordering;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::models::{Language, Learner, Level, LevelProgress, LockState, SyllabusEntry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("cannot complete {level} day {day}: lesson is {state}")]
    InvalidTransition {
        level: Level,
        day: u32,
        state: LockState,
    },
}

/// Classify one lesson day of `level` for `learner`. First matching rule wins.
pub fn lock_state_for(learner: &Learner, level: Level, day: u32) -> LockState {
    if !learner.tier.reaches(level) {
        return LockState::LockedByTier;
    }
    if day == 0 {
        return LockState::LockedByProgress;
    }
    match level.cmp(&learner.active_level) {
        Ordering::Equal => match day.cmp(&learner.current_day) {
            Ordering::Greater => LockState::LockedByProgress,
            Ordering::Equal => LockState::Current,
            Ordering::Less => LockState::Completed,
        },
        // The counter has moved on from a lower level; it stays open for review.
        Ordering::Less => LockState::Completed,
        // Reachable but not started: a new level always opens at day 1.
        Ordering::Greater if day == 1 => LockState::Current,
        Ordering::Greater => LockState::LockedByProgress,
    }
}

/// Mark `day` of `level` complete, returning the advanced learner.
///
/// Only a `current` lesson can be completed, so a repeated request for the
/// same day is rejected instead of advancing twice. Completing day 1 of a
/// higher reachable level switches the shared counter to it; levels below
/// the active one are already `completed` and cannot be re-entered.
pub fn complete_lesson(learner: &Learner, level: Level, day: u32) -> Result<Learner, ProgressionError> {
    let state = lock_state_for(learner, level, day);
    if state != LockState::Current {
        return Err(ProgressionError::InvalidTransition { level, day, state });
    }
    let mut next = learner.clone();
    next.active_level = level;
    next.current_day = day + 1;
    Ok(next)
}

/// Highest day `learner` may ever reach in `level`; 0 when the tier excludes it.
pub fn effective_ceiling_day(level: Level, learner: &Learner, catalog: &Catalog) -> u32 {
    if learner.tier.reaches(level) {
        catalog.last_day_of(level)
    } else {
        0
    }
}

/// Every published lesson of `level` with its lock state, ordered by day.
pub fn syllabus(learner: &Learner, level: Level, catalog: &Catalog, lang: Language) -> Vec<SyllabusEntry> {
    catalog
        .lessons_of(level)
        .map(|lesson| SyllabusEntry {
            day: lesson.day,
            title: lesson.localized(lang).title,
            duration: lesson.duration.clone(),
            state: lock_state_for(learner, level, lesson.day),
        })
        .collect()
}

pub fn level_progress(learner: &Learner, level: Level, catalog: &Catalog) -> LevelProgress {
    let total = catalog.len_of(level) as u32;
    let completed = catalog
        .lessons_of(level)
        .filter(|l| lock_state_for(learner, level, l.day) == LockState::Completed)
        .count() as u32;
    let percent = if total == 0 { 0 } else { completed * 100 / total };
    LevelProgress {
        level,
        completed,
        total,
        ceiling_day: effective_ceiling_day(level, learner, catalog),
        percent,
    }
}

/// Resolve two writes of the same learner. Position is ordered by
/// `(active_level, current_day)` and only ever moves forward, so a stale
/// write can neither rewind a day nor undo a level switch. The tier always
/// comes from the stored record.
pub fn merge_by_maximum(stored: &Learner, incoming: &Learner) -> Learner {
    let mut merged = stored.clone();
    merged.display_name = incoming.display_name.clone();
    if position(incoming) > position(stored) {
        merged.active_level = incoming.active_level;
        merged.current_day = incoming.current_day.max(1);
    }
    merged
}

fn position(learner: &Learner) -> (Level, u32) {
    (learner.active_level, learner.current_day)
}
