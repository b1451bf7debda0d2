use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use crate::catalog::{FormatPreference, Interest, SchoolLevel, TimeSlot, option_set};

pub const MIN_EXPERIENCE_YEARS: i64 = 0;
pub const MAX_EXPERIENCE_YEARS: i64 = 40;
pub const DEFAULT_EXPERIENCE_YEARS: i64 = 5;

/// Raw form state as held for a session. Every field has a default, so any
/// partial submission is a valid form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub years_experience: i64,
    pub school_level: SchoolLevel,
    pub subject: String,
    #[serde(with = "option_set")]
    pub interests: EnumSet<Interest>,
    pub format_preference: FormatPreference,
    #[serde(with = "option_set")]
    pub time_preference: EnumSet<TimeSlot>,
}

impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            years_experience: DEFAULT_EXPERIENCE_YEARS,
            school_level: SchoolLevel::default(),
            subject: String::new(),
            interests: EnumSet::empty(),
            format_preference: FormatPreference::default(),
            time_preference: EnumSet::empty(),
        }
    }
}

impl ProfileForm {
    /// Takes a fresh profile snapshot of the current form values.
    pub fn snapshot(&self) -> Profile {
        Profile {
            name: non_blank(&self.name),
            years_experience: self
                .years_experience
                .clamp(MIN_EXPERIENCE_YEARS, MAX_EXPERIENCE_YEARS) as u8,
            school_level: self.school_level,
            subject: non_blank(&self.subject),
            interests: self.interests,
            format_preference: self.format_preference,
            time_preference: self.time_preference,
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validated snapshot of a teacher's background and preferences.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub years_experience: u8,
    pub school_level: SchoolLevel,
    pub subject: Option<String>,
    #[serde(with = "option_set")]
    pub interests: EnumSet<Interest>,
    pub format_preference: FormatPreference,
    #[serde(with = "option_set")]
    pub time_preference: EnumSet<TimeSlot>,
}

impl Default for Profile {
    fn default() -> Self {
        ProfileForm::default().snapshot()
    }
}
