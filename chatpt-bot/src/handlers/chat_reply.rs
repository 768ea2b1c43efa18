//! Chat reply handler: turns a chat request into an LLM completion and sends it back as MarkdownV2.

use async_trait::async_trait;
use llm_client::{ChatMessage, LlmClient, LlmConfig};
use std::sync::Arc;
use tgmd::EscapeOptions;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::command::{parse_chat_request, ChatRequest, ModelRoute};
use crate::conversation::ConversationStore;
use crate::core::{Bot as CoreBot, BotError, Handler, HandlerResponse, Message, Result, TextMode};

pub const MSG_EMPTY_QUERY: &str = "Please provide a query with your mention!";
pub const MSG_REQUEST_FAILED: &str = "Sorry, I encountered an error while processing your request.";
pub const MSG_EMPTY_RESPONSE: &str = "Sorry, I couldn't generate a response.";

/// Model id per [`ModelRoute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoutes {
    pub default: String,
    pub web_search: String,
}

impl ModelRoutes {
    pub fn from_config(config: &dyn LlmConfig) -> Self {
        Self {
            default: config.model().to_string(),
            web_search: config.search_model().to_string(),
        }
    }

    pub fn model_for(&self, route: ModelRoute) -> &str {
        match route {
            ModelRoute::Default => &self.default,
            ModelRoute::WebSearch => &self.web_search,
        }
    }
}

/// Answers chat requests: typing action, LLM call with the reply-chain history, MarkdownV2 reply
/// with a plain-text fallback. Returns `Reply(text)` with what was sent.
pub struct ChatReplyHandler {
    bot: Arc<dyn CoreBot>,
    llm_client: Arc<dyn LlmClient>,
    conversations: Arc<ConversationStore>,
    bot_username: Arc<RwLock<Option<String>>>,
    models: ModelRoutes,
    escape_options: EscapeOptions,
}

impl ChatReplyHandler {
    pub fn new(
        bot: Arc<dyn CoreBot>,
        llm_client: Arc<dyn LlmClient>,
        conversations: Arc<ConversationStore>,
        bot_username: Arc<RwLock<Option<String>>>,
        models: ModelRoutes,
        escape_options: EscapeOptions,
    ) -> Self {
        Self {
            bot,
            llm_client,
            conversations,
            bot_username,
            models,
            escape_options,
        }
    }

    /// Logs error and its cause chain. First item with `first_msg`, rest with "Caused by".
    fn log_error_chain(e: &anyhow::Error, first_msg: &str) {
        for (i, cause) in e.chain().enumerate() {
            if i == 0 {
                error!(cause = %cause, "{}", first_msg);
            } else {
                error!(cause = %cause, "Caused by");
            }
        }
    }

    /// History to send: the stored turns behind the replied-to bot message (or its text as an
    /// assistant turn when nothing is stored), then the new query.
    async fn build_history(&self, message: &Message, query: &str) -> Vec<ChatMessage> {
        let mut history = Vec::new();
        if message.is_reply_to_bot() {
            if let Some(reply_id) = message.reply_to_message_id.as_deref() {
                match self.conversations.history(message.chat.id, reply_id).await {
                    Some(stored) => {
                        debug!(turns = stored.len(), "continuing stored conversation");
                        history = stored;
                    }
                    None => {
                        if let Some(content) = message.reply_to_message_content.as_deref() {
                            history.push(ChatMessage::assistant(content));
                        }
                    }
                }
            }
        }
        history.push(ChatMessage::user(query));
        history
    }

    /// Sends `response` as MarkdownV2. If Telegram rejects the first piece, the raw response is sent
    /// as plain text instead; if it rejects a later piece, that piece and the rest go out as plain
    /// text with the escapes removed. Returns the ids of every message sent.
    async fn deliver(&self, message: &Message, response: &str) -> Result<Vec<String>> {
        let pieces = tgmd::render(response, &self.escape_options);
        let mut sent = Vec::new();
        for (index, piece) in pieces.iter().enumerate() {
            match self.bot.reply_to(message, piece, TextMode::MarkdownV2).await {
                Ok(id) => sent.push(id),
                Err(BotError::Rejected(reason)) if index == 0 => {
                    warn!(reason = %reason, "MarkdownV2 rejected, resending as plain text");
                    return self.deliver_plain(message, response).await;
                }
                Err(BotError::Rejected(reason)) => {
                    warn!(
                        reason = %reason,
                        piece = index,
                        pieces = pieces.len(),
                        "MarkdownV2 rejected, sending the remaining pieces as plain text"
                    );
                    for rest in &pieces[index..] {
                        let plain = tgmd::strip_escapes(rest);
                        sent.extend(self.deliver_plain(message, &plain).await?);
                    }
                    return Ok(sent);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(sent)
    }

    async fn deliver_plain(&self, message: &Message, text: &str) -> Result<Vec<String>> {
        let mut sent = Vec::new();
        for piece in tgmd::chunk_message(text, tgmd::TELEGRAM_MAX_MESSAGE_CHARS) {
            if piece.trim().is_empty() {
                continue;
            }
            sent.push(self.bot.reply_to(message, &piece, TextMode::Plain).await?);
        }
        Ok(sent)
    }

    async fn send_fallback_and_stop(&self, message: &Message, text: &str) -> Result<HandlerResponse> {
        if let Err(e) = self.bot.reply_to(message, text, TextMode::Plain).await {
            error!(error = %e, "Failed to send fallback message");
        }
        Ok(HandlerResponse::Stop)
    }

    async fn answer(&self, message: &Message, request: ChatRequest) -> Result<HandlerResponse> {
        if let Err(e) = self.bot.send_typing(&message.chat, message.thread_id).await {
            warn!(error = %e, "Failed to send typing action");
        }

        let model = self.models.model_for(request.route);
        let mut history = self.build_history(message, &request.query).await;
        info!(
            model = %model,
            route = ?request.route,
            message_count = history.len(),
            "Submitting to LLM"
        );

        let response = match self
            .llm_client
            .get_llm_response_with_messages(model, history.clone())
            .await
        {
            Ok(text) if text.trim().is_empty() => MSG_EMPTY_RESPONSE.to_string(),
            Ok(text) => text,
            Err(e) => {
                Self::log_error_chain(&e, "Failed to get LLM response");
                return self.send_fallback_and_stop(message, MSG_REQUEST_FAILED).await;
            }
        };

        let sent_ids = match self.deliver(message, &response).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Failed to send LLM response");
                return self.send_fallback_and_stop(message, MSG_REQUEST_FAILED).await;
            }
        };
        info!(
            user_id = message.user.id,
            messages_sent = sent_ids.len(),
            response_len = response.chars().count(),
            "LLM response sent"
        );

        history.push(ChatMessage::assistant(response.clone()));
        self.conversations
            .record(message.chat.id, &sent_ids, history)
            .await;

        Ok(HandlerResponse::Reply(response))
    }
}

#[async_trait]
impl Handler for ChatReplyHandler {
    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let bot_username = self.bot_username.read().await.clone();
        let Some(request) = parse_chat_request(message, bot_username.as_deref()) else {
            debug!("Not a chat request");
            return Ok(HandlerResponse::Ignore);
        };

        if request.query.is_empty() {
            info!("Chat request without a query");
            return self.send_fallback_and_stop(message, MSG_EMPTY_QUERY).await;
        }

        self.answer(message, request).await
    }
}
