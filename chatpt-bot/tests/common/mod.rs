//! Shared mocks for integration tests: a recording [`Bot`] and a scripted [`LlmClient`].

#![allow(dead_code)]

use async_trait::async_trait;
use chatpt_bot::{Bot, BotError, Chat, Message, Result, TextMode, User};
use chrono::Utc;
use llm_client::{ChatMessage, LlmClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One recorded `reply_to` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub reply_to: String,
    pub text: String,
    pub mode: TextMode,
}

/// Bot that records every call and hands out increasing message ids starting at 1000.
#[derive(Default)]
pub struct MockBot {
    pub replies: Mutex<Vec<SentReply>>,
    pub typing: Mutex<Vec<(i64, Option<i32>)>>,
    next_id: AtomicUsize,
    /// Answer MarkdownV2 sends with [`BotError::Rejected`].
    pub reject_markdown: bool,
    /// Reject only the MarkdownV2 send with this zero-based index.
    pub reject_markdown_at: Option<usize>,
    markdown_sends: AtomicUsize,
    /// Fail every send with [`BotError::Transport`].
    pub offline: bool,
}

impl MockBot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_markdown() -> Self {
        Self {
            reject_markdown: true,
            ..Self::default()
        }
    }

    pub fn rejecting_markdown_at(index: usize) -> Self {
        Self {
            reject_markdown_at: Some(index),
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn replies(&self) -> Vec<SentReply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.lock().unwrap().len()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_typing(&self, chat: &Chat, thread_id: Option<i32>) -> Result<()> {
        self.typing.lock().unwrap().push((chat.id, thread_id));
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str, mode: TextMode) -> Result<String> {
        if self.offline {
            return Err(BotError::Transport("network down".to_string()));
        }
        let rejected = mode == TextMode::MarkdownV2
            && (self.reject_markdown
                || self.reject_markdown_at
                    == Some(self.markdown_sends.fetch_add(1, Ordering::SeqCst)));
        if rejected {
            return Err(BotError::Rejected(
                "Bad Request: can't parse entities".to_string(),
            ));
        }
        self.replies.lock().unwrap().push(SentReply {
            reply_to: message.id.clone(),
            text: text.to_string(),
            mode,
        });
        let id = 1000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(id.to_string())
    }
}

/// LLM that returns a fixed answer (or fails) and records every request.
pub struct MockLlm {
    pub answer: std::result::Result<String, String>,
    pub requests: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl MockLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            answer: Err(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn get_llm_response_with_messages(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> anyhow::Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), messages));
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(anyhow::anyhow!("{}", reason)),
        }
    }
}

/// Text message from user `user_id` in a chat of `chat_type`.
pub fn text_message(user_id: i64, chat_type: &str, content: &str) -> Message {
    Message {
        id: "42".to_string(),
        user: User {
            id: user_id,
            username: Some("tester".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
        },
        chat: Chat {
            id: -1001,
            chat_type: chat_type.to_string(),
        },
        content: content.to_string(),
        thread_id: None,
        created_at: Utc::now(),
        reply_to_message_id: None,
        reply_to_message_from_bot: false,
        reply_to_message_content: None,
    }
}

/// Same as [`text_message`], replying to bot message `bot_message_id` whose text was `bot_text`.
pub fn reply_to_bot(user_id: i64, content: &str, bot_message_id: &str, bot_text: &str) -> Message {
    let mut message = text_message(user_id, "group", content);
    message.id = "43".to_string();
    message.reply_to_message_id = Some(bot_message_id.to_string());
    message.reply_to_message_from_bot = true;
    message.reply_to_message_content = Some(bot_text.to_string());
    message
}
