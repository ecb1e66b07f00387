use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{Language, Lesson, Level};

/// Snapshot of the published curriculum, keyed by level then day number.
///
/// Days are looked up by number, never by position, so gaps left by
/// incomplete content stay gaps.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    levels: BTreeMap<Level, BTreeMap<u32, Lesson>>,
}

impl Catalog {
    pub fn from_lessons(lessons: impl IntoIterator<Item = Lesson>) -> Self {
        let mut levels: BTreeMap<Level, BTreeMap<u32, Lesson>> = BTreeMap::new();
        for lesson in lessons {
            if lesson.is_locked || lesson.day == 0 {
                continue;
            }
            let days = levels.entry(lesson.level).or_default();
            if let Some(prev) = days.insert(lesson.day, lesson) {
                tracing::warn!(level=%prev.level, day=prev.day, "duplicate lesson in catalog, keeping the later one");
            }
        }
        Self { levels }
    }

    pub fn lessons_of(&self, level: Level) -> impl Iterator<Item = &Lesson> {
        self.levels.get(&level).into_iter().flat_map(|days| days.values())
    }

    pub fn lesson(&self, level: Level, day: u32) -> Option<&Lesson> {
        self.levels.get(&level)?.get(&day)
    }

    pub fn contains(&self, level: Level, day: u32) -> bool {
        self.lesson(level, day).is_some()
    }

    /// Highest published day in `level`, 0 when the level has no lessons.
    pub fn last_day_of(&self, level: Level) -> u32 {
        self.levels
            .get(&level)
            .and_then(|days| days.keys().next_back().copied())
            .unwrap_or(0)
    }

    pub fn len_of(&self, level: Level) -> usize {
        self.levels.get(&level).map_or(0, |days| days.len())
    }
}

// ------------- seed curriculum -------------

struct Seed {
    day: u32,
    title: &'static str,
    title_hi: &'static str,
    content: &'static str,
    content_hi: Option<&'static str>,
    duration: &'static str,
}

const BEGINNER_SEED: &[Seed] = &[
    Seed {
        day: 1,
        title: "Introduction to Jyotish",
        title_hi: "ज्योतिष का परिचय",
        content: "Welcome to the ancient science of Vedic Astrology. Jyotish, meaning \"science of light,\" is one of the six Vedangas (limbs of the Vedas). In this lesson, we explore the foundational philosophy and purpose of Jyotish in understanding karma and destiny.",
        content_hi: Some("वैदिक ज्योतिष के प्राचीन विज्ञान में आपका स्वागत है।"),
        duration: "15 min",
    },
    Seed {
        day: 2,
        title: "The 12 Rashis (Zodiac Signs)",
        title_hi: "12 राशियाँ",
        content: "Learn about the 12 zodiac signs in Vedic astrology: Mesha (Aries), Vrishabha (Taurus), Mithuna (Gemini), Karka (Cancer), Simha (Leo), Kanya (Virgo), Tula (Libra), Vrishchika (Scorpio), Dhanu (Sagittarius), Makara (Capricorn), Kumbha (Aquarius), and Meena (Pisces).",
        content_hi: None,
        duration: "20 min",
    },
    Seed {
        day: 3,
        title: "The 9 Grahas (Planets)",
        title_hi: "9 ग्रह",
        content: "Discover the nine celestial bodies: Surya (Sun), Chandra (Moon), Mangala (Mars), Budha (Mercury), Guru (Jupiter), Shukra (Venus), Shani (Saturn), Rahu, and Ketu. Each graha has unique qualities and influences.",
        content_hi: None,
        duration: "25 min",
    },
    Seed {
        day: 4,
        title: "The 12 Bhavas (Houses)",
        title_hi: "12 भाव",
        content: "Understanding the 12 houses of the horoscope. Each bhava represents different life areas: self, wealth, siblings, mother, children, enemies, spouse, longevity, dharma, karma, gains, and moksha.",
        content_hi: None,
        duration: "25 min",
    },
    Seed {
        day: 5,
        title: "Reading Your First Chart",
        title_hi: "पहली कुंडली पढ़ना",
        content: "Learn to identify the Lagna (Ascendant) and understand the basic layout of a birth chart. Practice locating planets in houses and signs.",
        content_hi: None,
        duration: "30 min",
    },
];

/// Initial beginner curriculum inserted into an empty store.
pub fn seed_lessons() -> Vec<Lesson> {
    BEGINNER_SEED
        .iter()
        .map(|s| Lesson {
            id: Uuid::new_v4(),
            level: Level::Beginner,
            day: s.day,
            title: s.title.to_string(),
            title_hi: Some(s.title_hi.to_string()),
            content: s.content.to_string(),
            content_hi: s.content_hi.map(str::to_string),
            duration: s.duration.to_string(),
            is_locked: false,
        })
        .collect()
}

/// Languages a lesson can actually be served in.
pub fn available_languages(lesson: &Lesson) -> Vec<Language> {
    let mut out = vec![Language::English];
    if lesson.content_hi.is_some() {
        out.push(Language::Hindi);
    }
    out
}
