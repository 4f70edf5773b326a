//! Core record types.
//!
//! Records are immutable values created by user action. Emotion and meal
//! labels arrive as free-form strings from the app (in Spanish or English)
//! and are classified into closed enums here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in time at which a record was written.
pub type Timestamp = DateTime<Utc>;

/// Emotion reported in a check-in or diary entry.
///
/// Unrecognized labels are kept as [`Emotion::Unclassified`] so they still
/// count as a check-in when computing ratios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Happy,
    Calm,
    Grateful,
    Neutral,
    Tired,
    Sad,
    Anxious,
    Angry,
    Overwhelmed,
    /// Label not in the known vocabulary (kept verbatim, lowercased)
    Unclassified(String),
}

impl Emotion {
    /// Classify a raw emotion label.
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "happy" | "joyful" | "feliz" | "alegre" | "contento" | "contenta" => Self::Happy,
            "calm" | "relaxed" | "tranquilo" | "tranquila" | "calma" | "relajado" | "relajada" => {
                Self::Calm
            }
            "grateful" | "agradecido" | "agradecida" => Self::Grateful,
            "neutral" | "normal" | "ok" => Self::Neutral,
            "tired" | "cansado" | "cansada" => Self::Tired,
            "sad" | "triste" | "tristeza" => Self::Sad,
            "anxious" | "ansioso" | "ansiosa" | "ansiedad" | "nervioso" | "nerviosa" => {
                Self::Anxious
            }
            "angry" | "enojado" | "enojada" | "enfadado" | "enfadada" | "ira" => Self::Angry,
            "overwhelmed" | "abrumado" | "abrumada" | "agobiado" | "agobiada" => {
                Self::Overwhelmed
            }
            _ => Self::Unclassified(normalized),
        }
    }

    /// Whether this emotion counts toward emotional distress.
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Self::Sad | Self::Anxious | Self::Angry | Self::Overwhelmed
        )
    }

    /// Get string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Happy => "happy",
            Self::Calm => "calm",
            Self::Grateful => "grateful",
            Self::Neutral => "neutral",
            Self::Tired => "tired",
            Self::Sad => "sad",
            Self::Anxious => "anxious",
            Self::Angry => "angry",
            Self::Overwhelmed => "overwhelmed",
            Self::Unclassified(label) => label,
        }
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<&str> for Emotion {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl From<Emotion> for String {
    fn from(emotion: Emotion) -> Self {
        emotion.as_str().to_string()
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of hunger reported at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HungerType {
    /// Physical hunger
    Physical,
    /// Emotional hunger
    Emotional,
    /// Both physical and emotional
    Mixed,
    /// Not hungry
    None,
    /// Not reported or unrecognized
    #[default]
    Unknown,
}

impl HungerType {
    /// Classify a raw hunger label.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "physical" | "fisica" | "física" | "fisico" | "físico" => Self::Physical,
            "emotional" | "emocional" => Self::Emotional,
            "mixed" | "mixta" | "mixto" | "both" | "ambas" => Self::Mixed,
            "none" | "ninguna" | "ninguno" | "sin hambre" => Self::None,
            _ => Self::Unknown,
        }
    }
}

/// Meal slot of a logged meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    #[default]
    Other,
}

impl MealKind {
    /// Classify a raw meal-slot label.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "breakfast" | "desayuno" => Self::Breakfast,
            "lunch" | "almuerzo" | "comida" => Self::Lunch,
            "dinner" | "cena" => Self::Dinner,
            "snack" | "merienda" | "colación" | "colacion" | "tentempié" => Self::Snack,
            _ => Self::Other,
        }
    }
}

/// Reference to a meal inside a food log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRef {
    /// Meal name as entered by the user
    pub name: String,
    /// Meal slot
    #[serde(default)]
    pub kind: MealKind,
}

impl MealRef {
    /// Create a new meal reference.
    pub fn new(name: impl Into<String>, kind: MealKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A mood and hunger check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    /// When the check-in was written
    pub timestamp: Timestamp,
    /// Reported emotion
    pub emotion: Emotion,
    /// Emotion intensity (1 - 5)
    pub emotion_intensity: u8,
    /// Hunger type
    pub hunger_type: HungerType,
    /// Self-assessed binge risk (1 - 5)
    pub binge_risk: u8,
    /// Free-form notes
    pub notes: Option<String>,
}

impl CheckInRecord {
    /// Create a check-in with neutral scales and no notes.
    pub fn new(timestamp: Timestamp, emotion: impl Into<Emotion>) -> Self {
        Self {
            timestamp,
            emotion: emotion.into(),
            emotion_intensity: 3,
            hunger_type: HungerType::Unknown,
            binge_risk: 1,
            notes: None,
        }
    }

    /// Set emotion intensity (clamped to 1 - 5).
    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.emotion_intensity = intensity.clamp(1, 5);
        self
    }

    /// Set binge risk (clamped to 1 - 5).
    pub fn with_binge_risk(mut self, risk: u8) -> Self {
        self.binge_risk = risk.clamp(1, 5);
        self
    }

    /// Set hunger type.
    pub fn with_hunger_type(mut self, hunger_type: HungerType) -> Self {
        self.hunger_type = hunger_type;
        self
    }

    /// Attach notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntryRecord {
    /// When the entry was written
    pub timestamp: Timestamp,
    /// Emotion tagged on the entry
    pub emotion: Emotion,
    /// Entry text
    pub text: String,
}

impl DiaryEntryRecord {
    /// Create a new diary entry.
    pub fn new(timestamp: Timestamp, emotion: impl Into<Emotion>, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            emotion: emotion.into(),
            text: text.into(),
        }
    }
}

/// Meals logged for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodLogRecord {
    /// When the log was written
    pub timestamp: Timestamp,
    /// Meals eaten
    pub meals: Vec<MealRef>,
}

impl FoodLogRecord {
    /// Create a new food log.
    pub fn new(timestamp: Timestamp, meals: Vec<MealRef>) -> Self {
        Self { timestamp, meals }
    }

    /// A day with fewer than two meals counts as restrictive.
    pub fn is_restrictive(&self) -> bool {
        self.meals.len() < 2
    }
}
