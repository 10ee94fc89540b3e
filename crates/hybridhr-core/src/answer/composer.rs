//! Completion call and answer envelope construction

use super::{AnswerEnvelope, ConfidenceBand, Degradation};
use crate::llm::{ChatMessage, LLMClient};
use crate::search::{AssembledContext, Query, SearchMethod};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Returned without calling the completion service when there is no evidence
pub const INSUFFICIENT_INFORMATION_ANSWER: &str =
    "I don't have enough information in the HR records or policy documents to answer that question.";

/// Returned when the completion service failed on every attempt
pub const SERVICE_UNAVAILABLE_ANSWER: &str =
    "The answer service is currently unavailable. The sources below were found for your question.";

const MAX_ATTEMPTS: usize = 2;

const SYSTEM_PROMPT: &str = "You are an HR assistant. Answer the question using only the \
facts in the provided context. Cite facts by the bracketed source labels. If the context does \
not contain the answer, say that you don't know. Be concise.";

/// Wraps a completion call into an answer envelope
pub struct AnswerComposer {
    llm: Arc<dyn LLMClient>,
    call_timeout: Duration,
}

impl AnswerComposer {
    pub fn new(llm: Arc<dyn LLMClient>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    /// Deterministic prompt for a question and its context
    pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Context:\n{}\n\nQuestion: {}\n\nAnswer:",
                context, question
            )),
        ]
    }

    /// Compose the answer. Never fails: a dead completion service yields a
    /// degraded envelope with confidence 0.0 and the citations kept.
    pub async fn compose(
        &self,
        query: &Query,
        context: AssembledContext,
        confidence: f64,
        search_method: SearchMethod,
    ) -> AnswerEnvelope {
        let mut envelope = AnswerEnvelope {
            answer: String::new(),
            confidence,
            band: ConfidenceBand::from_score(confidence),
            search_method,
            source_count: context.citations.len(),
            citations: context.citations,
            routing: query.routing,
            intent: query.intent,
            degradations: Vec::new(),
        };

        if confidence <= 0.0 {
            envelope.answer = INSUFFICIENT_INFORMATION_ANSWER.to_string();
            envelope.citations.clear();
            envelope.source_count = 0;
            envelope.confidence = 0.0;
            envelope.band = ConfidenceBand::Low;
            return envelope;
        }

        let messages = Self::build_messages(&query.text, &context.text);
        tracing::debug!("Completion prompt: {} chars", context.text.len());

        for attempt in 1..=MAX_ATTEMPTS {
            match timeout(self.call_timeout, self.llm.chat_completion(messages.clone())).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    envelope.answer = text.trim().to_string();
                    return envelope;
                }
                Ok(Ok(_)) => tracing::warn!("Completion attempt {} returned no text", attempt),
                Ok(Err(e)) => tracing::warn!("Completion attempt {} failed: {}", attempt, e),
                Err(_) => tracing::warn!(
                    "Completion attempt {} timed out after {:?}",
                    attempt,
                    self.call_timeout
                ),
            }
        }

        envelope.answer = SERVICE_UNAVAILABLE_ANSWER.to_string();
        envelope.confidence = 0.0;
        envelope.band = ConfidenceBand::Low;
        envelope
            .degradations
            .push(Degradation::CompletionServiceError);
        envelope
    }
}
