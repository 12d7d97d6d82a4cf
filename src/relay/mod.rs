//! AI advisory relay: composes prompts, calls the upstream model, normalizes
//! replies and records an audit trail.

mod compose;
mod error;
mod gateway;
mod kind;
mod normalize;
mod prompts;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::audit::{AuditRecord, AuditRecorder};

pub use compose::{compose, mood_averages, ComposedPrompt, INSIGHT_WINDOW};
pub use error::{ErrorKind, RelayError};
pub use gateway::{
    api_key_from_env, classify_failure, ChatCompletionsProvider, GatewayReply, GeminiProvider,
    ModelProvider, Provider, EMPTY_REPLY,
};
pub use kind::{RelayRequest, RequestKind};
pub use normalize::{normalize, NormalizedReply};
pub use prompts::{
    template, PromptTemplate, DOCTOR_PROMPT, EMPATHY_PROMPT, INSIGHT_PROMPT, JOURNAL_PROMPT,
};

/// Client details captured at the network boundary for the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// Advisory content delivered to a role view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    /// Kind the advice answers.
    pub kind: RequestKind,
    /// Text shown to the user.
    pub content: String,
    /// Sentiment, only for kinds that define one.
    pub sentiment: Option<f64>,
    /// Canned content substituted by a fallback policy.
    pub degraded: bool,
    /// The model ignored the structured output format.
    pub parse_degraded: bool,
}

/// Anything that can answer an advisory request: the live relay or a
/// degraded-mode stand-in.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    /// Answer one request.
    async fn advise(&self, request: &RelayRequest) -> Result<Advice, RelayError>;
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// The live relay.
#[derive(Clone)]
pub struct Relay {
    provider: Arc<dyn ModelProvider>,
    recorder: AuditRecorder,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("model", &self.provider.model())
            .field("recorder", &self.recorder)
            .finish()
    }
}

impl Relay {
    /// Create a relay over a provider and an audit recorder.
    #[must_use]
    pub fn new(provider: Arc<dyn ModelProvider>, recorder: AuditRecorder) -> Self {
        Self { provider, recorder }
    }

    /// Upstream model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Audit recorder used by this relay.
    #[must_use]
    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }

    /// Handle one request: compose, invoke, normalize, then queue an audit
    /// record for the upstream attempt.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::MalformedPayload` if the payload cannot be
    /// composed, or the classified upstream failure.
    pub async fn handle(
        &self,
        request: &RelayRequest,
        metadata: &RequestMetadata,
    ) -> Result<Advice, RelayError> {
        let started = Instant::now();
        let kind = request.kind;

        let prompt = compose(kind, &request.payload).inspect_err(|e| {
            tracing::warn!(%kind, error = %e, "Rejected relay request");
        })?;

        tracing::debug!(%kind, model = self.model(), "Invoking model");
        let audit = AuditRecord::builder(kind, prompt.text.clone())
            .caller_id(request.caller_id.clone())
            .client(metadata.ip_address.clone(), metadata.user_agent.clone())
            .model(self.model());

        match self.provider.generate(&prompt.text).await {
            Ok(reply) => {
                let normalized = normalize(kind, &reply.text);
                let latency_ms = elapsed_ms(started);
                tracing::info!(
                    %kind,
                    latency_ms,
                    parse_degraded = normalized.parse_degraded,
                    finish_reason = reply.finish_reason.as_deref().unwrap_or("unknown"),
                    "Relay request completed"
                );

                self.recorder.record(
                    audit
                        .timestamp(Utc::now())
                        .latency_ms(latency_ms)
                        .response(
                            normalized.content.clone(),
                            normalized.sentiment,
                            reply.finish_reason,
                        )
                        .parse_degraded(normalized.parse_degraded)
                        .build(),
                );

                Ok(Advice {
                    kind,
                    content: normalized.content,
                    sentiment: normalized.sentiment,
                    degraded: false,
                    parse_degraded: normalized.parse_degraded,
                })
            }
            Err(err) => {
                let latency_ms = elapsed_ms(started);
                tracing::error!(%kind, latency_ms, error = %err, "Relay request failed");
                self.recorder
                    .record(
                        audit
                            .timestamp(Utc::now())
                            .latency_ms(latency_ms)
                            .failure(&err)
                            .build(),
                    );
                Err(err)
            }
        }
    }
}

#[async_trait]
impl AdvisoryProvider for Relay {
    async fn advise(&self, request: &RelayRequest) -> Result<Advice, RelayError> {
        self.handle(request, &RequestMetadata::default()).await
    }
}
