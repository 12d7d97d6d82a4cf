//! Request composer: renders a kind-specific payload into a single prompt.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::mood::{MoodEntry, StressLevel, Weather};

use super::prompts::template;
use super::{RelayError, RequestKind};

/// Maximum number of history entries rendered for an insight request.
pub const INSIGHT_WINDOW: usize = 14;

/// Separator between the template and the rendered payload.
const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// A prompt ready for the model gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    /// Kind the prompt was composed for.
    pub kind: RequestKind,
    /// Rendered payload context.
    pub context: String,
    /// Template plus context, sent upstream as one message.
    pub text: String,
}

#[derive(Deserialize)]
struct JournalPayload {
    text: String,
}

#[derive(Deserialize)]
struct EmpathyPayload {
    mood: f64,
    weather: Weather,
}

#[derive(Deserialize)]
struct DoctorPayload {
    #[serde(rename = "moodHistory", alias = "mood_history")]
    mood_history: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct InsightPayload {
    history: Vec<serde_json::Value>,
}

fn parse_payload<T: DeserializeOwned>(
    kind: RequestKind,
    payload: &serde_json::Value,
) -> Result<T, RelayError> {
    T::deserialize(payload).map_err(|e| RelayError::malformed(kind, e.to_string()))
}

fn to_json(kind: RequestKind, entries: &[serde_json::Value]) -> Result<String, RelayError> {
    serde_json::to_string(entries).map_err(|e| RelayError::malformed(kind, e.to_string()))
}

/// Mean mood rounded to the nearest integer and mean sleep, or `None` for an
/// empty history.
#[must_use]
pub fn mood_averages(entries: &[MoodEntry]) -> Option<(i64, f64)> {
    if entries.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = entries.len() as f64;
    let mood = entries.iter().map(|e| e.mood).sum::<f64>() / count;
    let sleep = entries.iter().map(|e| e.sleep).sum::<f64>() / count;
    #[allow(clippy::cast_possible_truncation)]
    Some((mood.round() as i64, sleep))
}

fn render_context(kind: RequestKind, payload: &serde_json::Value) -> Result<String, RelayError> {
    match kind {
        RequestKind::Journal => {
            let data: JournalPayload = parse_payload(kind, payload)?;
            Ok(format!("Journal entry: \"{}\"", data.text))
        }
        RequestKind::Empathy => {
            let data: EmpathyPayload = parse_payload(kind, payload)?;
            let stress = StressLevel::from_mood(data.mood);
            Ok(format!(
                "Child's mood level: {}/100. Weather status: {}. Stress level: {stress}.",
                data.mood, data.weather
            ))
        }
        RequestKind::Doctor => {
            let data: DoctorPayload = parse_payload(kind, payload)?;
            let entries = data
                .mood_history
                .iter()
                .map(|v| MoodEntry::deserialize(v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| RelayError::malformed(kind, e.to_string()))?;
            let (avg_mood, avg_sleep) = mood_averages(&entries)
                .ok_or_else(|| RelayError::malformed(kind, "mood history is empty"))?;
            Ok(format!(
                "Patient mood history (last 7 days): {}. Average mood: {avg_mood}. Average sleep: {avg_sleep:.1}h.",
                to_json(kind, &data.mood_history)?
            ))
        }
        RequestKind::Insight => {
            let data: InsightPayload = parse_payload(kind, payload)?;
            let window = &data.history[..data.history.len().min(INSIGHT_WINDOW)];
            Ok(format!(
                "14-Day Longitudinal Data: {}. Context: The patient has been tracking mood and sleep daily. \
                 Identify correlations between sleep, mood, and any reported stressors in the data.",
                to_json(kind, window)?
            ))
        }
    }
}

/// Compose the upstream prompt for a kind and payload.
///
/// # Errors
///
/// Returns `RelayError::MalformedPayload` if the payload does not have the
/// shape the kind requires, or if a doctor request carries an empty history.
pub fn compose(kind: RequestKind, payload: &serde_json::Value) -> Result<ComposedPrompt, RelayError> {
    let context = render_context(kind, payload)?;
    let text = format!("{}{SECTION_SEPARATOR}{context}", template(kind).text);
    Ok(ComposedPrompt {
        kind,
        context,
        text,
    })
}
