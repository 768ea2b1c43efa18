//! # tgmd
//!
//! Converts the Markdown an LLM writes into Telegram's `MarkdownV2` dialect, where `_*[]()~>#+-=|{}.!` and the
//! backslash are reserved unless escaped.
//!
//! - [`escape`]: the escape pipeline (emphasis, links, lists, blockquotes, headers, code) → escaped text.
//! - [`segments`] / [`replace_protected`]: the segment matcher and rewriter the pipeline is built on.
//! - [`split_messages`] / [`chunk_fenced`]: cut escaped text into messages without breaking a fence.
//! - [`render`]: escape, split long code and chunk to Telegram's length limit, ready to send.
//!
//! Everything here is pure and synchronous; patterns use the `regex` crate, which runs in linear time.

mod escape;
mod math;
mod placeholder;
mod segment;
mod split;

pub use escape::{escape, escape_with, strip_escapes, EscapeOptions};
pub use math::latex_to_unicode;
pub use placeholder::{is_sentinel, scrub, Sentinel, Stash};
pub use segment::{find_all_index, replace_protected, segments, Segment};
pub use split::{
    chunk_fenced, chunk_message, code_fragments, split_code, split_code_fragments,
    split_long_code_blocks, split_messages, LONG_CODE_THRESHOLD, SPLIT_MARKER, SPLIT_SEPARATOR,
    TELEGRAM_MAX_MESSAGE_CHARS,
};

/// Escapes `text` and cuts the result into the messages to send, in order.
///
/// Long fenced blocks are cut into separate messages by [`split_messages`], then every piece is chunked
/// to [`TELEGRAM_MAX_MESSAGE_CHARS`] without leaving a fence open. Blank pieces are dropped.
pub fn render(text: &str, options: &EscapeOptions) -> Vec<String> {
    let escaped = escape(text, options);
    split_messages(&escaped)
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .flat_map(|part| chunk_fenced(part, TELEGRAM_MAX_MESSAGE_CHARS))
        .collect()
}
