//! Chat identity.

use serde::{Deserialize, Serialize};

/// Chat identity. `chat_type` is one of `private`, `group`, `supergroup`, `channel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

impl Chat {
    pub const PRIVATE: &'static str = "private";

    /// One-to-one chat with the bot; every text message there is a chat request.
    pub fn is_private(&self) -> bool {
        self.chat_type == Self::PRIVATE
    }
}
