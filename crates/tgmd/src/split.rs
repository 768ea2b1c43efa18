//! Splitting rendered text into Telegram-sized messages.
//!
//! [`split_messages`] cuts escaped text at the boundaries of oversized fenced blocks, so each fragment goes out
//! as its own message. [`chunk_fenced`] then enforces Telegram's hard length limit without leaving a fence open.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::segment::{segments, Segment};

/// Marker line between two fragments that must be sent as separate messages.
pub const SPLIT_MARKER: &str = "@|@|@|@";
/// How [`SPLIT_MARKER`] is joined between fragments.
pub const SPLIT_SEPARATOR: &str = "\n@|@|@|@\n\n";
/// Fenced blocks longer than this (in characters) are split in two.
pub const LONG_CODE_THRESHOLD: usize = 2300;
/// Maximum characters in one Telegram text message.
pub const TELEGRAM_MAX_MESSAGE_CHARS: usize = 4096;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(```[\s\S]+?```)").expect("fenced block pattern"));

/// Splits one fenced block longer than [`LONG_CODE_THRESHOLD`] into two fences joined by [`SPLIT_SEPARATOR`].
/// Shorter blocks, and blocks with no usable boundary, are returned unchanged.
pub fn split_code(block: &str) -> String {
    match split_code_fragments(block) {
        Some((first, second)) => format!("{first}{SPLIT_SEPARATOR}{second}"),
        None => block.to_string(),
    }
}

/// The two fragments of [`split_code`], or `None` when the block stays whole.
///
/// The body is cut on blank lines; a chunk starting with a 4-space indent stays with the chunk before it.
/// The cut goes at the first chunk where the text before it reaches half the block. Without any blank line
/// the block is cut on line boundaries instead; a single-line block is never split.
pub fn split_code_fragments(block: &str) -> Option<(String, String)> {
    split_above(block, LONG_CODE_THRESHOLD)
}

fn split_above(block: &str, threshold: usize) -> Option<(String, String)> {
    let total = block.chars().count();
    if total <= threshold {
        return None;
    }

    let mut separator = "\n\n";
    let mut chunks = merge_indented(block.split("\n\n").map(str::to_string).collect());
    if chunks.len() < 2 {
        separator = "\n";
        chunks = block.split('\n').map(str::to_string).collect();
    }
    if chunks.len() < 2 {
        return None;
    }

    let at = split_index(&chunks, total);
    if at >= chunks.len() {
        return None;
    }

    let mut first = chunks[..at].join(separator);
    if !first.trim().ends_with("```") {
        first.push_str("\n```");
    }

    let tag_line = block.split('\n').next().unwrap_or("```");
    let mut second = format!("{}\n{}", tag_line, chunks[at..].join(separator));
    if !second.trim().ends_with("```") {
        second.push_str("\n```");
    }

    debug!(
        block_chars = total,
        chunks = chunks.len(),
        split_at = at,
        "split long code block"
    );
    Some((first, second))
}

fn merge_indented(chunks: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match merged.last_mut() {
            Some(prev) if chunk.starts_with("    ") => {
                prev.push_str("\n\n");
                prev.push_str(&chunk);
            }
            _ => merged.push(chunk),
        }
    }
    merged
}

fn split_index(chunks: &[String], total: usize) -> usize {
    let mut index = 0;
    let mut before = 0;
    for chunk in chunks {
        if 2 * before >= total {
            break;
        }
        index += 1;
        before += chunk.chars().count();
    }
    index
}

/// Every fragment one fenced block is sent as: [`split_code_fragments`] first, then each fragment still
/// longer than [`TELEGRAM_MAX_MESSAGE_CHARS`] is halved again the same way.
pub fn code_fragments(block: &str) -> Vec<String> {
    match split_code_fragments(block) {
        Some((first, second)) => {
            let mut out = fit_fragment(first);
            out.extend(fit_fragment(second));
            out
        }
        None => vec![block.to_string()],
    }
}

fn fit_fragment(fragment: String) -> Vec<String> {
    match split_above(&fragment, TELEGRAM_MAX_MESSAGE_CHARS) {
        Some((first, second)) => {
            let mut out = fit_fragment(first);
            out.extend(fit_fragment(second));
            out
        }
        None => vec![fragment],
    }
}

/// Cuts escaped text into message-sized pieces at the code-fragment boundaries.
///
/// Only the boundaries produced by [`code_fragments`] separate pieces; text that merely looks like
/// [`SPLIT_MARKER`] (e.g. inside a code block) stays where it is.
pub fn split_messages(text: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    for segment in segments(text, &FENCED_BLOCK) {
        match segment {
            Segment::Plain(s) => current.push_str(s),
            Segment::Protected(block) => {
                let mut fragments = code_fragments(block).into_iter();
                if let Some(first) = fragments.next() {
                    current.push_str(&first);
                }
                for fragment in fragments {
                    messages.push(std::mem::take(&mut current));
                    current = fragment;
                }
            }
        }
    }
    messages.push(current);
    messages
}

/// [`split_messages`] joined with [`SPLIT_SEPARATOR`].
pub fn split_long_code_blocks(text: &str) -> String {
    split_messages(text).join(SPLIT_SEPARATOR)
}

/// Byte offset at which to cut `text` so the head has at most `max_chars` characters.
///
/// Prefers the last newline at or after `min_newline` bytes. A hard cut never separates the characters of a
/// backtick run, and never separates an escaping backslash from the character it escapes.
fn cut_point(text: &str, max_chars: usize, min_newline: usize) -> usize {
    let window_end = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let window = &text[..window_end];
    if let Some(i) = window.rfind('\n') {
        if i > 0 && i >= min_newline {
            return i;
        }
    }

    let mut cut = window_end;
    while cut > 1 && text[..cut].ends_with('`') && text[cut..].starts_with('`') {
        cut -= 1;
    }
    let backslashes = text[..cut].chars().rev().take_while(|&c| c == '\\').count();
    if backslashes % 2 == 1 && cut > 1 {
        cut -= 1;
    }
    cut
}

/// Cuts `text` into pieces of at most `max_chars` characters, preferring the last newline in each window.
/// A window without a newline is cut hard, but never between an escaping backslash and the character it escapes.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(2);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let cut = cut_point(rest, max_chars, 0);
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

const FENCE_CLOSE: &str = "\n```";

/// [`chunk_message`] for rendered MarkdownV2: a cut inside a fenced block closes the fence at the end of the
/// piece and reopens it, with the block's language tag, at the start of the next one.
pub fn chunk_fenced(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(32);
    let budget = max_chars - FENCE_CLOSE.len();
    let mut chunks = Vec::new();
    let mut rest = text.to_string();

    while rest.chars().count() > max_chars {
        let cut = cut_point(&rest, budget, budget / 2);
        let (mut head, mut tail) = (rest[..cut].to_string(), rest[cut..].to_string());

        if let Some(pos) = bare_fence_opening(&head) {
            tail = format!("{}{}", &head[pos..], tail);
            head.truncate(pos);
        }

        let body = tail.strip_prefix('\n').unwrap_or(&tail);
        let reopened = open_fence_tag(&head, max_chars)
            .map(|tag| format!("{tag}\n{body}"))
            .filter(|next| next.len() < rest.len());
        match reopened {
            Some(next) => {
                chunks.push(format!("{}{FENCE_CLOSE}", head.trim_end_matches('\n')));
                rest = next;
            }
            None => {
                chunks.push(head.trim_end_matches('\n').to_string());
                rest = body.to_string();
            }
        }
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Opening marker (with language tag) of the fence left open at the end of `head`, if any.
fn open_fence_tag(head: &str, max_chars: usize) -> Option<String> {
    if head.matches("```").count() % 2 == 0 {
        return None;
    }
    let pos = head.rfind("```")?;
    let after = &head[pos + 3..];
    let lang = match after.find('\n') {
        Some(nl) => after[..nl].trim(),
        None => "",
    };
    let is_tag = lang.chars().count() * 4 <= max_chars
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '#' | '_' | '.'));
    Some(if is_tag {
        format!("```{lang}")
    } else {
        "```".to_string()
    })
}

/// Offset of a fence opened at the end of `head` with no code after it yet; the cut moves before it.
fn bare_fence_opening(head: &str) -> Option<usize> {
    if head.matches("```").count() % 2 == 0 {
        return None;
    }
    let pos = head.rfind("```")?;
    let body = match head[pos..].find('\n') {
        Some(nl) => &head[pos + nl..],
        None => "",
    };
    (pos > 0 && body.trim().is_empty()).then_some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_block(body: &str) -> String {
        format!("```python\n{body}\n```")
    }

    /// **Test: a short block is returned unchanged.**
    #[test]
    fn short_block_not_split() {
        let block = python_block("print(1)");
        assert_eq!(split_code(&block), block);
    }

    /// **Test: indented chunks stay with the chunk before them.**
    #[test]
    fn merge_keeps_indented_continuations() {
        let merged = merge_indented(vec![
            "def f():".to_string(),
            "    return 1".to_string(),
            "x = 2".to_string(),
        ]);
        assert_eq!(merged, vec!["def f():\n\n    return 1", "x = 2"]);
    }

    /// **Test: split index is the first chunk where the prefix reaches half of the total.**
    #[test]
    fn split_index_at_half() {
        let chunks: Vec<String> = vec!["a".repeat(10), "b".repeat(10), "c".repeat(10)];
        assert_eq!(split_index(&chunks, 30), 2);
        assert_eq!(split_index(&chunks, 20), 1);
    }

    /// **Test: a block without blank lines falls back to line boundaries.**
    #[test]
    fn no_blank_line_splits_on_lines() {
        let body = (0..100)
            .map(|i| format!("line_{i:03} = {}", "x".repeat(20)))
            .collect::<Vec<_>>()
            .join("\n");
        let block = python_block(&body);
        let (first, second) = split_code_fragments(&block).expect("split");
        assert!(first.starts_with("```python\n"));
        assert!(first.ends_with("\n```"));
        assert!(second.starts_with("```python\n"));
        assert!(second.ends_with("```"));
        assert!(first.contains("line_000"));
        assert!(second.contains("line_099"));
    }

    /// **Test: a single oversized line is never split.**
    #[test]
    fn single_line_block_unsplit() {
        let block = format!("```{}```", "x".repeat(3000));
        assert_eq!(split_code(&block), block);
    }

    /// **Test: only fenced blocks in a text are split.**
    #[test]
    fn split_long_code_blocks_leaves_prose() {
        let body = format!("{}\n\n{}", "a".repeat(1500), "b".repeat(1500));
        let text = format!("Intro\n\n{}\n\nOutro", python_block(&body));
        let out = split_long_code_blocks(&text);
        assert!(out.starts_with("Intro\n\n```python\n"));
        assert!(out.ends_with("```\n\nOutro"));
        assert_eq!(out.matches(SPLIT_MARKER).count(), 1);
    }

    /// **Test: chunking prefers newlines and respects the limit.**
    #[test]
    fn chunk_on_newline() {
        let text = format!("{}\n{}", "a".repeat(6), "b".repeat(6));
        assert_eq!(chunk_message(&text, 10), vec!["aaaaaa", "bbbbbb"]);
        assert_eq!(chunk_message("short", 10), vec!["short"]);
        assert_eq!(chunk_message("", 10), vec![""]);
    }

    /// **Test: hard cuts count characters, not bytes, and never strand an escape.**
    #[test]
    fn chunk_hard_cut() {
        let chunks = chunk_message(&"é".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));

        let chunks = chunk_message("abcd\\.efgh", 5);
        assert_eq!(chunks, vec!["abcd", "\\.efg", "h"]);
    }

    /// **Test: an escaped backslash at the cut stays whole.**
    #[test]
    fn chunk_keeps_escaped_backslash() {
        assert_eq!(chunk_message("ab\\\\cd", 4), vec!["ab\\\\", "cd"]);
        assert_eq!(chunk_message("a\\\\\\.b", 4), vec!["a\\\\", "\\.b"]);
    }

    /// **Test: a block over the message limit is halved until every fragment fits.**
    #[test]
    fn code_fragments_fit_message_limit() {
        let body = (0..400)
            .map(|i| format!("value_{i:03} = compute({i}) + offset"))
            .collect::<Vec<_>>()
            .join("\n");
        let fragments = code_fragments(&python_block(&body));
        assert!(fragments.len() > 2);
        for fragment in &fragments {
            assert!(fragment.chars().count() <= TELEGRAM_MAX_MESSAGE_CHARS);
            assert!(fragment.starts_with("```python\n"));
            assert!(fragment.ends_with("```"));
        }
    }

    /// **Test: marker text inside a code block is not a message boundary.**
    #[test]
    fn split_messages_ignores_marker_in_code() {
        let text = format!("Output:\n\n{}", python_block("print('@|@|@|@')\nprint(2)"));
        let messages = split_messages(&text);
        assert_eq!(messages, vec![text.clone()]);
        assert_eq!(split_long_code_blocks(&text), text);
    }

    /// **Test: a cut inside a fence closes it and reopens it with the language tag.**
    #[test]
    fn chunk_fenced_reopens_fence() {
        let body = (0..20)
            .map(|i| format!("line_{i:02} = {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let text = format!("Intro\n{}", python_block(&body));
        let chunks = chunk_fenced(&text, 80);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 80, "{chunk:?}");
            assert_eq!(chunk.matches("```").count() % 2, 0, "{chunk:?}");
        }
        assert!(chunks[1].starts_with("```python\n"));
        let joined = chunks.join("\n");
        assert!(joined.contains("line_00 = 0"));
        assert!(joined.contains("line_19 = 19"));
    }

    /// **Test: a fence opening right at the cut moves to the next piece.**
    #[test]
    fn chunk_fenced_moves_bare_opening() {
        let text = format!("{}\n```rust\nfn main() {{}}\n```", "word ".repeat(10).trim_end());
        let chunks = chunk_fenced(&text, 64);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "word ".repeat(10).trim_end());
        assert!(chunks[1].starts_with("```rust\n"));
    }

    /// **Test: text that fits is returned as one piece.**
    #[test]
    fn chunk_fenced_short_text() {
        let text = python_block("print(1)");
        assert_eq!(chunk_fenced(&text, 4096), vec![text]);
    }
}
