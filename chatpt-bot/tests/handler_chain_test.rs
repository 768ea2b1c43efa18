//! Integration tests for [`chatpt_bot::HandlerChain`] and the chain built by `build_handler_chain`.
//!
//! Covers: before/handle/after order, before stopping the chain, Reply stopping the handle phase and
//! reaching every after(), and the production chain with the allow-list in front of the chat reply.

mod common;

use async_trait::async_trait;
use chatpt_bot::{
    build_handler_chain, BaseConfig, BotConfig, BotError, Handler, HandlerChain, HandlerError,
    HandlerResponse, Message, Result, TextMode,
};
use common::{text_message, MockBot, MockLlm};
use llm_client::EnvLlmConfig;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Records every stage it runs in a shared log.
struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    before_result: bool,
    response: HandlerResponse,
}

impl Recorder {
    fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>, response: HandlerResponse) -> Arc<Self> {
        Arc::new(Self {
            name,
            log,
            before_result: true,
            response,
        })
    }

    fn push(&self, stage: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, stage));
    }
}

#[async_trait]
impl Handler for Recorder {
    async fn before(&self, _message: &Message) -> Result<bool> {
        self.push("before");
        Ok(self.before_result)
    }

    async fn handle(&self, _message: &Message) -> Result<HandlerResponse> {
        self.push("handle");
        Ok(self.response.clone())
    }

    async fn after(&self, _message: &Message, response: &HandlerResponse) -> Result<()> {
        self.push(&format!("after({:?})", response));
        Ok(())
    }
}

/// **Test: before runs first→last, handle until Reply, after last→first with the final response.**
#[tokio::test]
async fn test_chain_order_and_reply() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(Recorder::new("a", log.clone(), HandlerResponse::Continue))
        .add_handler(Recorder::new("b", log.clone(), HandlerResponse::Reply("r".to_string())))
        .add_handler(Recorder::new("c", log.clone(), HandlerResponse::Continue));

    let response = chain.handle(&text_message(1, "private", "hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Reply("r".to_string()));
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "a:before",
            "b:before",
            "c:before",
            "a:handle",
            "b:handle",
            "c:after(Reply(\"r\"))",
            "b:after(Reply(\"r\"))",
            "a:after(Reply(\"r\"))",
        ]
    );
}

/// **Test: a before() returning false stops the chain with Stop; no handle or after runs.**
#[tokio::test]
async fn test_before_false_stops_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let gate = Arc::new(Recorder {
        name: "gate",
        log: log.clone(),
        before_result: false,
        response: HandlerResponse::Continue,
    });
    let chain = HandlerChain::new()
        .add_handler(gate)
        .add_handler(Recorder::new("next", log.clone(), HandlerResponse::Continue));

    let response = chain.handle(&text_message(1, "private", "hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Stop);
    assert_eq!(*log.lock().unwrap(), vec!["gate:before"]);
}

/// **Test: Ignore and Continue both pass to the next handler; the final response stays Continue.**
#[tokio::test]
async fn test_ignore_passes_through() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(Recorder::new("a", log.clone(), HandlerResponse::Ignore))
        .add_handler(Recorder::new("b", log.clone(), HandlerResponse::Continue));

    let response = chain.handle(&text_message(1, "private", "hi")).await.unwrap();

    assert_eq!(response, HandlerResponse::Continue);
    assert!(log.lock().unwrap().contains(&"b:handle".to_string()));
}

fn test_config(allowed_ids: Vec<i64>) -> BotConfig {
    BotConfig {
        base: BaseConfig {
            bot_token: "test_token".to_string(),
            telegram_api_url: None,
            log_file: "logs/test.log".to_string(),
            allowed_ids,
            context_ttl_secs: 1800,
            context_max_entries: 100,
            disable_math_escape: false,
            italic_underline: true,
        },
        llm: EnvLlmConfig {
            api_key: "test_key".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "default-model".to_string(),
            search_model: "search-model:online".to_string(),
            system_prompt: "Be brief.".to_string(),
        },
    }
}

/// **Test: an allowed user's `/chat` runs through logging, auth and the chat reply.**
#[tokio::test]
async fn test_built_chain_answers_allowed_user() {
    let bot = Arc::new(MockBot::new());
    let llm = Arc::new(MockLlm::answering("Hola!"));
    let chain = build_handler_chain(
        &test_config(vec![7]),
        bot.clone(),
        llm.clone(),
        Arc::new(RwLock::new(Some("ChatPTBot".to_string()))),
    );

    let response = chain.handle(&text_message(7, "group", "/chat hola")).await.unwrap();

    assert_eq!(response, HandlerResponse::Reply("Hola!".to_string()));
    assert_eq!(bot.replies()[0].text, "Hola\\!");
    assert_eq!(bot.replies()[0].mode, TextMode::MarkdownV2);
    assert_eq!(llm.requests()[0].0, "default-model");
}

/// **Test: a user outside ALLOWED_IDS gets Unauthorized and nothing is sent.**
#[tokio::test]
async fn test_built_chain_rejects_unknown_user() {
    let bot = Arc::new(MockBot::new());
    let llm = Arc::new(MockLlm::answering("unused"));
    let chain = build_handler_chain(
        &test_config(vec![7]),
        bot.clone(),
        llm.clone(),
        Arc::new(RwLock::new(None)),
    );

    let result = chain.handle(&text_message(999, "private", "hola")).await;

    assert!(matches!(
        result,
        Err(BotError::Handler(HandlerError::Unauthorized))
    ));
    assert!(bot.replies().is_empty());
    assert_eq!(bot.typing_count(), 0);
    assert!(llm.requests().is_empty());
}
