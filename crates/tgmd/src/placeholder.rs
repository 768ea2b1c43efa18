//! Placeholder codec: private-use sentinels that stand in for spans whose final rendering is already decided.
//!
//! Each escape pass that finalizes a construct (bold span, link, fenced block, ...) swaps its markers for a
//! [`Sentinel`] so that later passes cannot escape them; a later pass resolves the sentinel back into
//! MarkdownV2 syntax. Sentinels live in the Unicode Private Use Area and [`scrub`] removes that range from the
//! input up front, so a sentinel can never collide with user text.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Reserved sentinel characters, one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Paired marker around an emphasis span (italic, bold, strikethrough) or a link label.
    Span,
    /// Paired marker around a stashed link URL index.
    LinkUrl,
    /// Blockquote marker at the start of a line.
    Quote,
    /// A backtick that was already escaped in the input (`` \` ``).
    EscapedBacktick,
    /// Block math opening delimiter `\[`.
    MathBlockOpen,
    /// Block math closing delimiter `\]`.
    MathBlockClose,
    /// Inline math opening delimiter `\(`.
    MathInlineOpen,
    /// Inline math closing delimiter `\)`.
    MathInlineClose,
    /// A literal double backslash kept verbatim when math escaping is disabled.
    DoubleBackslash,
    /// A dash outside fenced code, awaiting bullet/literal disambiguation.
    OuterDash,
    /// A dash inside fenced code.
    InnerDash,
    /// A backtick outside fenced code (inline code delimiter).
    InlineBacktick,
    /// Paired marker replacing the triple-backtick fence delimiters.
    Fence,
}

const FIRST: char = '\u{E000}';
const LAST: char = '\u{E00F}';

impl Sentinel {
    /// The sentinel as a one-character string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Sentinel::Span => "\u{E000}",
            Sentinel::LinkUrl => "\u{E001}",
            Sentinel::Quote => "\u{E002}",
            Sentinel::EscapedBacktick => "\u{E003}",
            Sentinel::MathBlockOpen => "\u{E004}",
            Sentinel::MathBlockClose => "\u{E005}",
            Sentinel::MathInlineOpen => "\u{E006}",
            Sentinel::MathInlineClose => "\u{E007}",
            Sentinel::DoubleBackslash => "\u{E008}",
            Sentinel::OuterDash => "\u{E009}",
            Sentinel::InnerDash => "\u{E00A}",
            Sentinel::InlineBacktick => "\u{E00B}",
            Sentinel::Fence => "\u{E00C}",
        }
    }

    /// Wraps `content` in a pair of this sentinel.
    pub fn wrap(self, content: &str) -> String {
        let s = self.as_str();
        let mut out = String::with_capacity(content.len() + 2 * s.len());
        out.push_str(s);
        out.push_str(content);
        out.push_str(s);
        out
    }
}

/// True if `c` belongs to the reserved sentinel range.
pub fn is_sentinel(c: char) -> bool {
    (FIRST..=LAST).contains(&c)
}

/// Removes every reserved sentinel character from `text`.
pub fn scrub(text: &str) -> String {
    if !text.chars().any(is_sentinel) {
        return text.to_string();
    }
    text.chars().filter(|c| !is_sentinel(*c)).collect()
}

static STASH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    let s = Sentinel::LinkUrl.as_str();
    Regex::new(&format!("{s}([0-9]+){s}")).expect("stash token pattern")
});

/// Holds finalized text (link URLs) out of band until the last pass has run.
#[derive(Debug, Default)]
pub struct Stash {
    items: Vec<String>,
}

impl Stash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` and returns the token that stands in for it.
    pub fn hold(&mut self, content: &str) -> String {
        self.items.push(content.to_string());
        Sentinel::LinkUrl.wrap(&(self.items.len() - 1).to_string())
    }

    /// Replaces every token in `text` with the content it stands for.
    pub fn release(&self, text: &str) -> String {
        if self.items.is_empty() {
            return text.to_string();
        }
        STASH_TOKEN
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.items.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
