//! Prompt templates for each advisory kind.

use super::RequestKind;

/// Instruction template for one request kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Kind this template serves.
    pub kind: RequestKind,
    /// Instruction text placed ahead of the rendered payload.
    pub text: &'static str,
    /// Whether the model must answer with `{"content": ..., "sentiment": ...}`.
    pub structured_output: bool,
}

/// Template for member journal reflections.
pub const JOURNAL_PROMPT: &str = r#"You are a clinical AI research assistant. Analyze the member's journal entry for emotional depth.
Provide a reflection (max 2 sentences) and a sentiment score (0.0 to 1.0).
Response MUST be valid JSON: {"content": "reflection", "sentiment": 0.5}"#;

/// Template for caretaker advice.
pub const EMPATHY_PROMPT: &str = r"You are an empathy translator for a parent/caretaker of a child with mental health challenges.
Given the child's current mood level (0-100) and weather status (sunny/cloudy/stormy), generate:
- A brief status summary (1 sentence)
- 2-3 specific, actionable pieces of advice for the parent
- A reassurance note
Keep it under 80 words. Be warm but practical. Do NOT reveal any raw journal content. Use emojis sparingly.";

/// Template for clinician trend summaries.
pub const DOCTOR_PROMPT: &str = r"You are a clinical AI assistant for a psychiatrist/therapist.
Given a patient's mood history data (array of mood scores 0-100 and sleep hours), provide:
- A trend analysis (1-2 sentences)
- Risk flags if any (e.g., declining trend, sleep disruption)
- A recommended focus area for the next session
Keep it professional, concise (under 80 words), and evidence-informed.";

/// Template for longitudinal insight.
pub const INSIGHT_PROMPT: &str = r#"You are a longitudinal mental health AI analyzer.
Given a 14-day window of mood scores, sleep data, and stressors, provide:
- A correlation analysis (1 sentence, e.g., "Mood dips follow sleep below 6h")
- A proactive recommendation for the upcoming week
- A summary of the emotional "climate"
Keep it professional, analytical, and under 100 words.
Response MUST be valid JSON: {"content": "analysis", "sentiment": 0.5}"#;

static TEMPLATES: [PromptTemplate; 4] = [
    PromptTemplate {
        kind: RequestKind::Journal,
        text: JOURNAL_PROMPT,
        structured_output: true,
    },
    PromptTemplate {
        kind: RequestKind::Empathy,
        text: EMPATHY_PROMPT,
        structured_output: false,
    },
    PromptTemplate {
        kind: RequestKind::Doctor,
        text: DOCTOR_PROMPT,
        structured_output: false,
    },
    PromptTemplate {
        kind: RequestKind::Insight,
        text: INSIGHT_PROMPT,
        structured_output: true,
    },
];

/// Look up the template registered for a kind.
#[must_use]
pub fn template(kind: RequestKind) -> &'static PromptTemplate {
    match kind {
        RequestKind::Journal => &TEMPLATES[0],
        RequestKind::Empathy => &TEMPLATES[1],
        RequestKind::Doctor => &TEMPLATES[2],
        RequestKind::Insight => &TEMPLATES[3],
    }
}
