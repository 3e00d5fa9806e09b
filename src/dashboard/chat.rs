use crate::client::AnalysisSource;
use crate::models::ChatMessage;
use tracing::{debug, warn};

/// Shown in place of a reply when the chat backend fails.
pub const CHAT_FALLBACK: &str =
    "Sorry, I couldn't get an answer right now. Please try again in a moment.";

/// In-memory conversation for one company. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    company: String,
    log: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            log: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    /// Append the user's prompt, then the bot's reply or the fixed fallback.
    /// Blank prompts are ignored. Transport errors never reach the caller.
    pub async fn send(&mut self, source: &dyn AnalysisSource, prompt: &str) -> Option<&ChatMessage> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }

        self.log.push(ChatMessage::user(prompt));

        let reply = match source.send_chat_message(prompt, &self.company).await {
            Ok(reply) => {
                debug!("{}: chat reply ({} chars)", self.company, reply.text.len());
                reply
            }
            Err(e) => {
                warn!("{}: chat failed, using fallback reply: {}", self.company, e);
                ChatMessage::bot(CHAT_FALLBACK)
            }
        };
        self.log.push(reply);
        self.log.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;
    use crate::testing::{Endpoint, FakeSource};

    #[tokio::test]
    async fn test_failed_send_appends_fallback() {
        let source = FakeSource::failing(&[Endpoint::Chat]);
        let mut chat = ChatSession::new("bce");

        let reply = chat.send(&source, "What is the outlook?").await.cloned();
        assert_eq!(reply.map(|m| m.text), Some(CHAT_FALLBACK.to_string()));

        let log = chat.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].sender, Sender::User);
        assert_eq!(log[0].text, "What is the outlook?");
        assert_eq!(log[1].sender, Sender::Bot);
        assert_eq!(log[1].text, CHAT_FALLBACK);
    }

    #[tokio::test]
    async fn test_conversation_continues_after_failure() {
        let mut chat = ChatSession::new("bce");
        chat.send(&FakeSource::failing(&[Endpoint::Chat]), "first").await;
        chat.send(&FakeSource::default(), "second").await;

        let texts: Vec<&str> = chat.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", CHAT_FALLBACK, "second", "echo: second"]);
    }

    #[tokio::test]
    async fn test_blank_prompt_ignored() {
        let source = FakeSource::default();
        let mut chat = ChatSession::new("bce");
        assert!(chat.send(&source, "   ").await.is_none());
        assert!(chat.messages().is_empty());
        assert_eq!(source.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
