//! Replay provider: answers every request with the same canned text.
//!
//! Used for offline mapping runs (`palate map --replay`) and tests. Only the
//! most recent request is kept, alongside a call counter, so a long-lived
//! replay provider holds constant memory.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};

pub struct ReplayProvider {
    content: String,
    model: String,
    calls: AtomicUsize,
    last: Mutex<Option<Vec<ChatMessage>>>,
}

impl ReplayProvider {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: "replay".to_string(),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// Report a different model name in responses.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Messages of the most recent request.
    pub fn last_request(&self) -> Option<Vec<ChatMessage>> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl std::fmt::Debug for ReplayProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayProvider")
            .field("model", &self.model)
            .field("content_len", &self.content.len())
            .finish()
    }
}

#[async_trait]
impl LlmProvider for ReplayProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let prompt_tokens = messages
            .iter()
            .map(|m| self.estimate_tokens(&m.content))
            .sum();

        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last.lock() {
            *last = Some(messages);
        }

        Ok(CompletionResponse {
            content: self.content.clone(),
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens: self.estimate_tokens(&self.content),
                ..Default::default()
            },
            model: self.model.clone(),
            stop_reason: Some("end_turn".to_string()),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_content_and_records_request() {
        let provider = ReplayProvider::new("{\"ok\":true}").with_model("fixture");
        let response = provider
            .complete(
                vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
                &CompletionConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.content, "{\"ok\":true}");
        assert_eq!(response.model, "fixture");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.last_request().unwrap()[1].content, "hi");
    }

    #[tokio::test]
    async fn test_keeps_only_latest_request() {
        let provider = ReplayProvider::new("{}");
        for turn in ["first", "second", "third"] {
            provider
                .complete(vec![ChatMessage::user(turn)], &CompletionConfig::default())
                .await
                .unwrap();
        }

        assert_eq!(provider.calls(), 3);
        let last = provider.last_request().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].content, "third");
    }

    #[test]
    fn test_fresh_provider_has_no_request() {
        let provider = ReplayProvider::new("{}");
        assert_eq!(provider.calls(), 0);
        assert!(provider.last_request().is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        assert!(ReplayProvider::new("").health_check().await);
    }
}
