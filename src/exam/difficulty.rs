// src/exam/difficulty.rs
// Coarse difficulty label -> semantic profile. Pure, total, no failure mode:
// anything that isn't "beginner" or "expert" resolves to moderate.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,
    Moderate,
    Expert,
}

/// What a difficulty level means for prompt construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyProfile {
    /// CEFR-style level description, e.g. "A2 (beginner)".
    pub level_description: &'static str,
    /// Style hint injected into system prompts.
    pub style_hint: &'static str,
}

impl Difficulty {
    /// Parse a label. Unknown, empty, or garbage input defaults to Moderate;
    /// no error is raised.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "beginner" => Self::Beginner,
            "expert" => Self::Expert,
            _ => Self::Moderate,
        }
    }

    pub fn profile(self) -> DifficultyProfile {
        match self {
            Self::Beginner => DifficultyProfile {
                level_description: "A2 (beginner)",
                style_hint: "Use simple sentences and basic vocabulary. \
                     Focus feedback on simple grammar and core word choice.",
            },
            Self::Moderate => DifficultyProfile {
                level_description: "B1 (intermediate)",
                style_hint: "Use everyday vocabulary. \
                     Focus feedback on common mistakes and natural phrasing.",
            },
            Self::Expert => DifficultyProfile {
                level_description: "B2\u{2013}C1 (advanced)",
                style_hint: "Ask challenging questions. \
                     Focus feedback on nuance, cohesion, and register.",
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Moderate => write!(f, "moderate"),
            Self::Expert => write!(f, "expert"),
        }
    }
}

/// Resolve a raw label directly to its profile.
pub fn resolve(label: &str) -> DifficultyProfile {
    Difficulty::from_label(label).profile()
}
