//! Response normalizer: turns raw model text into `{content, sentiment}`.

use serde::Deserialize;

use super::prompts::template;
use super::RequestKind;

/// Model reply after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReply {
    /// Text shown to the user.
    pub content: String,
    /// Sentiment in `[0, 1]`, only for kinds that define one.
    pub sentiment: Option<f64>,
    /// Structured output was expected but could not be parsed, so the raw
    /// text was used instead.
    pub parse_degraded: bool,
}

#[derive(Deserialize)]
struct StructuredReply {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    sentiment: Option<serde_json::Value>,
}

/// Widest `{ ... }` span: first opening brace to last closing brace.
fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// First balanced `{ ... }` span.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate and parse an embedded `{content, sentiment}` object.
///
/// The model may wrap the object in prose or code fences, so the widest span
/// is tried first and the first balanced object second.
fn extract_structured(text: &str) -> Option<StructuredReply> {
    [outer_object(text), first_balanced_object(text)]
        .into_iter()
        .flatten()
        .find_map(|candidate| serde_json::from_str(candidate).ok())
}

fn valid_sentiment(value: Option<&serde_json::Value>) -> Option<f64> {
    value
        .and_then(serde_json::Value::as_f64)
        .filter(|s| (0.0..=1.0).contains(s))
}

/// Normalize raw model text for a kind. Never fails.
#[must_use]
pub fn normalize(kind: RequestKind, raw: &str) -> NormalizedReply {
    if !template(kind).structured_output {
        return NormalizedReply {
            content: raw.to_string(),
            sentiment: None,
            parse_degraded: false,
        };
    }

    match extract_structured(raw) {
        Some(parsed) => {
            let sentiment = valid_sentiment(parsed.sentiment.as_ref());
            if parsed.sentiment.is_some() && sentiment.is_none() {
                tracing::debug!(%kind, "Discarding out-of-range or non-numeric sentiment");
            }
            match parsed.content.filter(|c| !c.trim().is_empty()) {
                Some(content) => NormalizedReply {
                    content,
                    sentiment,
                    parse_degraded: false,
                },
                None => {
                    tracing::warn!(%kind, "Structured model reply has no content, using raw text");
                    NormalizedReply {
                        content: raw.to_string(),
                        sentiment,
                        parse_degraded: true,
                    }
                }
            }
        }
        None => {
            tracing::warn!(%kind, "Failed to parse structured model reply, using raw text");
            NormalizedReply {
                content: raw.to_string(),
                sentiment: None,
                parse_degraded: true,
            }
        }
    }
}
