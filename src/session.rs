//! Client-side mood session state.
//!
//! One owner mutates the session through explicit methods; role views read
//! it through accessors and turn it into relay payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::mood::{MoodEntry, StressLevel, Weather};
use crate::relay::{RelayRequest, RequestKind, INSIGHT_WINDOW};

/// Words in a journal entry that force stormy weather.
pub const TRIGGER_WORDS: [&str; 3] = ["whisper", "voice", "scared"];

/// Mood history entries kept in the session.
pub const HISTORY_CAPACITY: usize = 14;

/// Entries sent with a doctor request.
pub const DOCTOR_WINDOW: usize = 7;

const INITIAL_MOOD: f64 = 65.0;

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person tracking their own mood.
    #[serde(alias = "member")]
    Patient,
    /// Parent or carer following a patient.
    Caretaker,
    /// Clinician reviewing history.
    Doctor,
    /// Operator reviewing the audit trail.
    Admin,
}

/// A journal entry written by the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub text: String,
    pub date: DateTime<Utc>,
    pub is_voice: bool,
    pub sentiment: Option<f64>,
}

/// Mood session state for one signed-in user.
#[derive(Debug, Clone)]
pub struct MoodSession {
    role: Option<Role>,
    current_mood: f64,
    weather: Weather,
    stress_advice: &'static str,
    journal: Vec<JournalEntry>,
    history: Vec<MoodEntry>,
}

fn initial_history() -> Vec<MoodEntry> {
    [
        ("Mon", 65.0, 7.0),
        ("Tue", 72.0, 6.0),
        ("Wed", 45.0, 5.0),
        ("Thu", 80.0, 8.0),
        ("Fri", 55.0, 6.0),
        ("Sat", 90.0, 9.0),
        ("Sun", 68.0, 7.0),
    ]
    .into_iter()
    .map(|(date, mood, sleep)| MoodEntry::new(date, mood, sleep))
    .collect()
}

impl Default for MoodSession {
    fn default() -> Self {
        Self {
            role: None,
            current_mood: INITIAL_MOOD,
            weather: Weather::Cloudy,
            stress_advice: StressLevel::Moderate.caretaker_advice(),
            journal: Vec::new(),
            history: initial_history(),
        }
    }
}

impl MoodSession {
    /// New session with the demo week of history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session seeded with the given history instead of the demo week.
    #[must_use]
    pub fn with_history(history: Vec<MoodEntry>) -> Self {
        let mut session = Self {
            history: Vec::new(),
            ..Self::default()
        };
        for entry in history {
            session.record_mood(entry);
        }
        session
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = Some(role);
    }

    /// Set the current mood and derive weather and caretaker advice from it.
    pub fn set_current_mood(&mut self, mood: f64) {
        self.current_mood = mood;
        self.weather = Weather::from_mood(mood);
        self.stress_advice = StressLevel::from_mood(mood).caretaker_advice();
        tracing::debug!(mood, weather = %self.weather, "Mood updated");
    }

    /// Prepend a journal entry. Trigger words force stormy weather.
    pub fn add_journal_entry(
        &mut self,
        text: impl Into<String>,
        is_voice: bool,
        sentiment: Option<f64>,
    ) -> &JournalEntry {
        let text = text.into();
        let lower = text.to_lowercase();
        if TRIGGER_WORDS.iter().any(|w| lower.contains(w)) {
            tracing::info!("Journal trigger word detected, escalating to stormy");
            self.weather = Weather::Stormy;
            self.stress_advice = StressLevel::High.caretaker_advice();
        }

        self.journal.insert(
            0,
            JournalEntry {
                id: Uuid::new_v4(),
                text,
                date: Utc::now(),
                is_voice,
                sentiment,
            },
        );
        &self.journal[0]
    }

    /// Append a day of history, keeping the most recent entries.
    pub fn record_mood(&mut self, entry: MoodEntry) {
        self.history.push(entry);
        if self.history.len() > HISTORY_CAPACITY {
            let excess = self.history.len() - HISTORY_CAPACITY;
            self.history.drain(..excess);
        }
    }

    /// Clear the role and the journal.
    pub fn logout(&mut self) {
        self.role = None;
        self.journal.clear();
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    #[must_use]
    pub fn current_mood(&self) -> f64 {
        self.current_mood
    }

    #[must_use]
    pub fn weather(&self) -> Weather {
        self.weather
    }

    #[must_use]
    pub fn stress_advice(&self) -> &'static str {
        self.stress_advice
    }

    /// Journal entries, newest first.
    #[must_use]
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Mood history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[MoodEntry] {
        &self.history
    }

    /// Relay payload for a kind built from the current state.
    ///
    /// Returns `None` for a journal request when no entry has been written.
    #[must_use]
    pub fn advisory_payload(&self, kind: RequestKind) -> Option<serde_json::Value> {
        match kind {
            RequestKind::Journal => self.journal.first().map(|e| json!({ "text": e.text })),
            RequestKind::Empathy => Some(json!({
                "mood": self.current_mood,
                "weather": self.weather,
            })),
            RequestKind::Doctor => {
                let start = self.history.len().saturating_sub(DOCTOR_WINDOW);
                Some(json!({ "moodHistory": &self.history[start..] }))
            }
            RequestKind::Insight => {
                let end = self.history.len().min(INSIGHT_WINDOW);
                Some(json!({ "history": &self.history[..end] }))
            }
        }
    }

    /// Relay request for a kind, tagged with a caller id.
    #[must_use]
    pub fn advisory_request(
        &self,
        kind: RequestKind,
        caller_id: impl Into<String>,
    ) -> Option<RelayRequest> {
        self.advisory_payload(kind)
            .map(|payload| RelayRequest::new(kind, payload).with_caller(caller_id))
    }
}
