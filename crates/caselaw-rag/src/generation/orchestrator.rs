//! Multi-provider generation with retry and failover
//!
//! The orchestrator is a small state machine. It starts `Pending` on the
//! highest priority provider and ends in `Completed` or `Failed`; every
//! provider call is recorded as a [`ProviderAttempt`].
//!
//! ```text
//! Pending(rank, attempt) --ok--------------------------> Completed
//! Pending(rank, attempt) --transient, attempt < max----> Pending(rank, attempt + 1)
//! Pending(rank, attempt) --permanent | attempts spent--> Pending(rank + 1, 1)
//! Pending(rank, attempt) --backoff past deadline-------> Pending(rank + 1, 1)
//! Pending(rank past last) | deadline reached ----------> Failed
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::providers::{FailureKind, LlmProvider, ProviderError};
use crate::types::{AttemptOutcome, ContextBlock, GenerationResult, ProviderAttempt};

use super::citation::AnswerParser;
use super::prompt::PromptBuilder;

/// Bounded exponential backoff for transient provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Calls per provider before failing over, at least 1
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Delay after the given failed attempt (1-based): `base * 2^(attempt - 1)`, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}

enum State {
    Pending { rank: usize, attempt: u32 },
    Completed { raw: String, provider: String },
    Failed { cause: Error, provider: Option<String> },
}

/// Sends the prompt to providers in priority order
pub struct GenerationOrchestrator {
    providers: Vec<Arc<dyn LlmProvider>>,
    policy: RetryPolicy,
    parser: AnswerParser,
}

impl GenerationOrchestrator {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>, policy: RetryPolicy) -> Result<Self> {
        Ok(Self {
            providers,
            policy,
            parser: AnswerParser::new()?,
        })
    }

    /// Provider labels in priority order
    pub fn provider_labels(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.label()).collect()
    }

    /// Generate a cited answer
    ///
    /// Never returns an error: exhaustion and deadline expiry end in a
    /// `Failed` result carrying the user-facing message.
    pub async fn generate(
        &self,
        query: &str,
        context: &ContextBlock,
        max_tokens: u32,
        deadline: Instant,
    ) -> GenerationResult {
        if context.is_empty() {
            return GenerationResult::no_relevant_sources();
        }

        let prompt = PromptBuilder::build_legal_prompt(query, context);
        let started = Instant::now();
        let mut attempts: Vec<ProviderAttempt> = Vec::new();
        let mut last_error: Option<ProviderError> = None;
        let mut state = State::Pending { rank: 0, attempt: 1 };

        let terminal = loop {
            state = match state {
                State::Pending { rank, attempt } => {
                    let Some(provider) = self.providers.get(rank) else {
                        state = State::Failed {
                            cause: Error::GenerationExhausted {
                                attempts: attempts.len(),
                                last_error: last_error
                                    .as_ref()
                                    .map(|e| e.message.clone())
                                    .unwrap_or_else(|| "no providers configured".to_string()),
                            },
                            provider: attempts
                                .last()
                                .map(|a| format!("{}/{}", a.provider, a.model)),
                        };
                        continue;
                    };

                    let now = Instant::now();
                    if now >= deadline {
                        state = State::Failed {
                            cause: Error::Timeout(now - started),
                            provider: Some(provider.label()),
                        };
                        continue;
                    }

                    tracing::debug!(provider = %provider.label(), attempt, "Invoking provider");
                    let result = match tokio::time::timeout(
                        deadline - now,
                        provider.invoke(&prompt, max_tokens),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => {
                            attempts.push(attempt_record(
                                provider.as_ref(),
                                attempt,
                                AttemptOutcome::Transient("request deadline reached".to_string()),
                            ));
                            state = State::Failed {
                                cause: Error::Timeout(started.elapsed()),
                                provider: Some(provider.label()),
                            };
                            continue;
                        }
                    };

                    match result {
                        Ok(raw) => {
                            attempts.push(attempt_record(
                                provider.as_ref(),
                                attempt,
                                AttemptOutcome::Succeeded,
                            ));
                            State::Completed {
                                raw,
                                provider: provider.label(),
                            }
                        }
                        Err(e) => {
                            self.on_failure(
                                provider.as_ref(),
                                rank,
                                attempt,
                                e,
                                deadline,
                                &mut attempts,
                                &mut last_error,
                            )
                            .await
                        }
                    }
                }
                terminal => break terminal,
            };
        };

        terminal.into_result(self, context, attempts)
    }

    #[allow(clippy::too_many_arguments)]
    async fn on_failure(
        &self,
        provider: &dyn LlmProvider,
        rank: usize,
        attempt: u32,
        error: ProviderError,
        deadline: Instant,
        attempts: &mut Vec<ProviderAttempt>,
        last_error: &mut Option<ProviderError>,
    ) -> State {
        let outcome = match error.kind {
            FailureKind::Transient => AttemptOutcome::Transient(error.message.clone()),
            FailureKind::Permanent => AttemptOutcome::Permanent(error.message.clone()),
        };
        attempts.push(attempt_record(provider, attempt, outcome));

        let retry = error.is_transient() && attempt < self.policy.max_attempts;
        tracing::warn!(
            provider = %provider.label(),
            attempt,
            max_attempts = self.policy.max_attempts,
            transient = error.is_transient(),
            error = %error.message,
            "Provider call failed"
        );
        *last_error = Some(error);

        if !retry {
            return State::Pending {
                rank: rank + 1,
                attempt: 1,
            };
        }

        let delay = self.policy.delay_for(attempt);
        if Instant::now() + delay >= deadline {
            tracing::debug!(
                provider = %provider.label(),
                delay_ms = delay.as_millis() as u64,
                "Backoff does not fit before the deadline, failing over"
            );
            return State::Pending {
                rank: rank + 1,
                attempt: 1,
            };
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        State::Pending {
            rank,
            attempt: attempt + 1,
        }
    }
}

impl State {
    fn into_result(
        self,
        orchestrator: &GenerationOrchestrator,
        context: &ContextBlock,
        attempts: Vec<ProviderAttempt>,
    ) -> GenerationResult {
        match self {
            State::Completed { raw, provider } => {
                let answer = orchestrator.parser.final_answer(&raw);
                let citations = orchestrator.parser.referenced_citations(&answer, context);
                tracing::info!(
                    provider = %provider,
                    attempts = attempts.len(),
                    citations = citations.len(),
                    "Answer generated"
                );
                GenerationResult::completed(answer, citations, provider, attempts)
            }
            State::Failed { cause, provider } => {
                tracing::error!(kind = cause.kind(), attempts = attempts.len(), "{}", cause);
                let mut result = GenerationResult::failed(cause.user_message(), attempts);
                result.provider_used = provider;
                result
            }
            State::Pending { .. } => GenerationResult::failed(
                Error::internal("generation ended while pending").user_message(),
                attempts,
            ),
        }
    }
}

fn attempt_record(
    provider: &dyn LlmProvider,
    attempt: u32,
    outcome: AttemptOutcome,
) -> ProviderAttempt {
    ProviderAttempt {
        provider: provider.name().to_string(),
        model: provider.model().to_string(),
        attempt,
        outcome,
    }
}
