//! Mock provider for testing.

use super::{Generation, ProviderError, TextProvider};
use crate::services::prompt::Prompt;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Canned behaviour returned by [`MockTextProvider`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    WarmingUp(Option<f64>),
    Api { status: Option<u16>, message: String },
    Unrecognized,
    Network,
}

/// Provider that answers without network I/O, optionally after a delay.
pub struct MockTextProvider {
    reply: MockReply,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockTextProvider {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<Generation, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            MockReply::Text(text) => Ok(Generation { text: text.clone() }),
            MockReply::WarmingUp(estimated_secs) => Err(ProviderError::WarmingUp {
                estimated_secs: *estimated_secs,
            }),
            MockReply::Api { status, message } => Err(ProviderError::Api {
                status: *status,
                message: message.clone(),
            }),
            MockReply::Unrecognized => Err(ProviderError::UnrecognizedShape(
                "mock payload".to_string(),
            )),
            MockReply::Network => Err(ProviderError::Network("connection refused".to_string())),
        }
    }
}
