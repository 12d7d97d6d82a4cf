//! Mood domain types shared by the relay and the session state.

use serde::{Deserialize, Serialize};

/// Caretaker-facing "weather" summarising the member's current mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    #[default]
    Cloudy,
    Stormy,
}

impl Weather {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Stormy => "stormy",
        }
    }

    /// Weather shown to caretakers for a mood score.
    #[must_use]
    pub fn from_mood(mood: f64) -> Self {
        match StressLevel::from_mood(mood) {
            StressLevel::Low => Self::Sunny,
            StressLevel::Moderate => Self::Cloudy,
            StressLevel::High => Self::Stormy,
        }
    }
}

impl std::fmt::Display for Weather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stress label derived from a 0-100 mood score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    /// Derive the stress label: above 80 is low, above 40 is moderate,
    /// everything else is high.
    #[must_use]
    pub fn from_mood(mood: f64) -> Self {
        if mood > 80.0 {
            Self::Low
        } else if mood > 40.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Returns the label used in prompts.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Canned caretaker advice shown before any AI advice arrives.
    #[must_use]
    pub fn caretaker_advice(&self) -> &'static str {
        match self {
            Self::Low => {
                "Status: Low Stress. Advice: Great time for a walk or fun activity together! 🎉"
            }
            Self::Moderate => "Status: Moderate Stress. Advice: Offer a calming activity together.",
            Self::High => {
                "Status: High Stress. Advice: Do not argue. Offer a snack. Stay nearby quietly. 🤍"
            }
        }
    }
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of mood tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    /// Display label for the day (e.g. `Mon`).
    #[serde(default)]
    pub date: String,
    /// Mood score, 0-100.
    pub mood: f64,
    /// Hours slept.
    pub sleep: f64,
}

impl MoodEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(date: impl Into<String>, mood: f64, sleep: f64) -> Self {
        Self {
            date: date.into(),
            mood,
            sleep,
        }
    }
}
