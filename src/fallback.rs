//! Caller-side fallback: canned advisory content when the relay is unavailable.

use std::time::Duration;

use async_trait::async_trait;

use crate::relay::{Advice, AdvisoryProvider, RelayError, RelayRequest, RequestKind};

/// Canned `(content, sentiment)` pair for a kind.
#[must_use]
pub fn canned_response(kind: RequestKind) -> (&'static str, f64) {
    match kind {
        RequestKind::Journal => (
            "I hear the depth in your entry. It's clear you're navigating complex emotions today. \
             Remember that your sync with this system is a safe space for reflection.",
            0.6,
        ),
        RequestKind::Empathy => (
            "Heuristic Analysis: The patient is showing signs of moderate emotional variance. \
             Advice: Maintain calm proximity, offer quiet engagement, and utilize sensory grounding techniques.",
            0.5,
        ),
        RequestKind::Doctor => (
            "Data Trend Analysis: Mood stabilization observed over 48 hours. \
             Suggestion: Focus on sleep hygiene and morning routine consistency in the next clinical session.",
            0.7,
        ),
        RequestKind::Insight => (
            "Longitudinal Correlation: Mood peaks align with consistent sleep cycles (>7h). \
             Identified stressor: Late evening digital exposure. Recommendation: 30min pre-sleep neuro-damping.",
            0.8,
        ),
    }
}

/// Advisory provider that never calls a model.
///
/// Used directly when the relay cannot be configured, and by
/// [`FallbackPolicy`] when a live call fails.
#[derive(Debug, Clone, Default)]
pub struct DegradedModeProvider {
    delay: Option<Duration>,
}

impl DegradedModeProvider {
    /// Create a provider that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause before answering so canned content does not arrive implausibly fast.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Canned advice for a kind, flagged as degraded. Sentiment is only
    /// carried for kinds that define one.
    #[must_use]
    pub fn advice_for(kind: RequestKind) -> Advice {
        let (content, sentiment) = canned_response(kind);
        Advice {
            kind,
            content: content.to_string(),
            sentiment: kind.has_sentiment().then_some(sentiment),
            degraded: true,
            parse_degraded: false,
        }
    }
}

#[async_trait]
impl AdvisoryProvider for DegradedModeProvider {
    async fn advise(&self, request: &RelayRequest) -> Result<Advice, RelayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        tracing::info!(kind = %request.kind, degraded = true, "Serving canned advisory content");
        Ok(Self::advice_for(request.kind))
    }
}

/// Wraps a live provider and masks every failure with canned content.
#[derive(Debug, Clone)]
pub struct FallbackPolicy<P> {
    primary: P,
    degraded: DegradedModeProvider,
}

impl<P: AdvisoryProvider> FallbackPolicy<P> {
    /// Wrap a primary provider.
    #[must_use]
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            degraded: DegradedModeProvider::new(),
        }
    }

    /// Use a custom degraded-mode provider (builder pattern).
    #[must_use]
    pub fn with_degraded(mut self, degraded: DegradedModeProvider) -> Self {
        self.degraded = degraded;
        self
    }

    /// The wrapped provider.
    #[must_use]
    pub fn primary(&self) -> &P {
        &self.primary
    }
}

#[async_trait]
impl<P: AdvisoryProvider> AdvisoryProvider for FallbackPolicy<P> {
    async fn advise(&self, request: &RelayRequest) -> Result<Advice, RelayError> {
        match self.primary.advise(request).await {
            Ok(advice) => Ok(advice),
            Err(err) => {
                tracing::warn!(
                    kind = %request.kind,
                    error_kind = err.kind().as_str(),
                    error = %err,
                    degraded = true,
                    "Relay unavailable, shifting to fallback content"
                );
                self.degraded.advise(request).await
            }
        }
    }
}
