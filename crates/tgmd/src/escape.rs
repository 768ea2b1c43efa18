//! Escape pipeline: standard Markdown (as produced by an LLM) → Telegram MarkdownV2.
//!
//! The passes run strictly in order; each one relies on sentinels or escaped forms left by the previous ones.
//! Passes that finalize a construct park it behind a [`Sentinel`], escape every remaining reserved character,
//! then resolve the sentinel into MarkdownV2 syntax. Link targets are held in a [`Stash`] until the very end.
//!
//! The output is **not** idempotent: escaping already-escaped text escapes it again.

use regex::{Captures, NoExpand, Regex};
use std::sync::LazyLock;

use crate::math::latex_to_unicode;
use crate::placeholder::{scrub, Sentinel, Stash};
use crate::segment::replace_protected;

/// Flags for [`escape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeOptions {
    /// Keep literal double backslashes (e.g. LaTeX line breaks) instead of escaping each backslash.
    pub disable_math_escape: bool,
    /// Render `_text_` as italic; when false every underscore is escaped.
    pub italic_underline: bool,
}

impl Default for EscapeOptions {
    fn default() -> Self {
        Self {
            disable_math_escape: false,
            italic_underline: true,
        }
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("escape pattern")
}

const BULLET: &str = "•";
const HEADER_GLYPH: &str = "▎";

// Math
static INLINE_MATH: LazyLock<Regex> = LazyLock::new(|| re(r"(\\\(.*?\\\))"));
static BLOCK_MATH: LazyLock<Regex> = LazyLock::new(|| re(r"(\n*\s*\\\[[\s\S]+?\\\]\n*)"));

// Emphasis, links, quotes
static SPAN_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    let s = Sentinel::Span.as_str();
    re(&format!("{s}(.*?){s}"))
});
static ITALIC: LazyLock<Regex> = LazyLock::new(|| re(r"_(.*?)_"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| re(r"\*\*(.*?)\*\*"));
static STAR_BULLET: LazyLock<Regex> = LazyLock::new(|| re(r"\n{1,2}\*\s"));
static LINK: LazyLock<Regex> = LazyLock::new(|| re(r"!?\[(.*?)\]\((.*?)\)"));
static LINK_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    let s = Sentinel::Span.as_str();
    let u = Sentinel::LinkUrl.as_str();
    re(&format!("{s}(.*?){s}({u}[0-9]+{u})"))
});
static STRIKE: LazyLock<Regex> = LazyLock::new(|| re(r"~~(.*?)~~"));
static QUOTE_LINE: LazyLock<Regex> = LazyLock::new(|| re(r"(^|\n)>\s"));

// Headers, lists
static HEADER_OR_FENCE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?m)(^#+[ \t].+?(?:\n+|\z))|```[\s\S]+?```"));
static PLUS: LazyLock<Regex> =
    LazyLock::new(|| re(r"(\+)|\n\s*-\s|```[\s\S]+?```|`[\s\S]*?`"));
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| re(r"\n{1,2}(\s*[0-9]{1,2}\.\s)"));
static OUTER_DASH: LazyLock<Regex> = LazyLock::new(|| re(r"```[\s\S]+?```|(-)"));
static DASH_BULLET: LazyLock<Regex> = LazyLock::new(|| re(r"\n{1,2}(\s*)-\s"));
static MINUS: LazyLock<Regex> =
    LazyLock::new(|| re(r"(-)|\n\s*-\s|```[\s\S]+?```|`[\s\S]*?`"));

// Code
static FENCE: LazyLock<Regex> = LazyLock::new(|| re(r"```([\s\S]+?)```"));
static FENCED_OR_TICK: LazyLock<Regex> = LazyLock::new(|| {
    let f = Sentinel::Fence.as_str();
    re(&format!(r"{f}[\s\S]+?{f}|(`)"))
});
static LONE_BACKSLASH_CODE: LazyLock<Regex> = LazyLock::new(|| re(r"\s`\\`\s"));
static OUTSIDE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    let f = Sentinel::Fence.as_str();
    re(&format!(r"{f}[\s\S]*?{f}|([^{f}]+)"))
});
static FENCE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    let f = Sentinel::Fence.as_str();
    re(&format!(r"{f}([\s\S]+?){f}"))
});
static STRAY_TICK: LazyLock<Regex> = LazyLock::new(|| re(r"\\`|```|(`)"));
static INDENTED_FENCE: LazyLock<Regex> = LazyLock::new(|| re(r"(\n+ *```[\s\S]+?```\n+)"));
static ESCAPED: LazyLock<Regex> = LazyLock::new(|| re(r"\\([_*\[\]()~`>#+\-=|{}.!\\])"));

/// Converts Markdown into text accepted by Telegram's `MarkdownV2` parse mode.
pub fn escape(text: &str, options: &EscapeOptions) -> String {
    let mut stash = Stash::new();

    let text = scrub(text);
    let text = extract_math(&text);
    let text = tag_math_delimiters(&text);
    let text = escape_backslashes(&text, options.disable_math_escape);
    let text = italic(&text, options.italic_underline);
    let text = bold_and_star_bullets(&text);
    let text = links(&text, &mut stash);
    let text = strikethrough(&text);
    let text = blockquotes(&text);
    let text = headers(&text);
    let text = text.replace('#', "\\#");
    let text = replace_protected(&text, &PLUS, escape_char);
    let text = NUMBERED.replace_all(&text, "\n\n${1}").into_owned();
    let text = dashes(&text);
    let text = FENCE
        .replace_all(&text, |c: &Captures| Sentinel::Fence.wrap(&c[1]))
        .into_owned();
    let text = backticks(&text);
    let text = literals(&text);
    let text = backtick_parity(&text);
    let text = replace_protected(&text, &INDENTED_FENCE, dedent_block);

    stash.release(&text)
}

/// [`escape`] with the flags passed positionally.
pub fn escape_with(text: &str, disable_math_escape: bool, italic_underline: bool) -> String {
    escape(
        text,
        &EscapeOptions {
            disable_math_escape,
            italic_underline,
        },
    )
}

/// Drops the backslash from every `MarkdownV2` escape, for sending rendered text as plain text.
pub fn strip_escapes(text: &str) -> String {
    ESCAPED.replace_all(text, "$1").into_owned()
}

fn escape_char(s: &str) -> String {
    format!("\\{}", s)
}

fn resolve_spans(text: &str, marker: &str) -> String {
    SPAN_PAIR
        .replace_all(text, |c: &Captures| format!("{marker}{}{marker}", &c[1]))
        .into_owned()
}

fn extract_math(text: &str) -> String {
    let text = replace_protected(text, &INLINE_MATH, latex_to_unicode);
    replace_protected(&text, &BLOCK_MATH, latex_to_unicode)
}

/// Unconsumed math delimiters must survive backslash escaping; they come back as escaped brackets in [`links`].
fn tag_math_delimiters(text: &str) -> String {
    text.replace("\\[", Sentinel::MathBlockOpen.as_str())
        .replace("\\]", Sentinel::MathBlockClose.as_str())
        .replace("\\(", Sentinel::MathInlineOpen.as_str())
        .replace("\\)", Sentinel::MathInlineClose.as_str())
}

fn escape_backslashes(text: &str, keep_double: bool) -> String {
    let mut text = if keep_double {
        text.replace("\\\\", Sentinel::DoubleBackslash.as_str())
    } else {
        text.to_string()
    };
    text = text
        .replace("\\`", Sentinel::EscapedBacktick.as_str())
        .replace('\\', "\\\\");
    if keep_double {
        text = text.replace(Sentinel::DoubleBackslash.as_str(), "\\\\");
    }
    text
}

fn italic(text: &str, underline: bool) -> String {
    if !underline {
        return text.replace('_', "\\_");
    }
    let text = ITALIC.replace_all(text, |c: &Captures| Sentinel::Span.wrap(&c[1]));
    resolve_spans(&text.replace('_', "\\_"), "_")
}

fn bold_and_star_bullets(text: &str) -> String {
    let text = BOLD.replace_all(text, |c: &Captures| Sentinel::Span.wrap(&c[1]));
    let bullet = format!("\n\n{BULLET} ");
    let text = STAR_BULLET.replace_all(&text, NoExpand(bullet.as_str()));
    resolve_spans(&text.replace('*', "\\*"), "*")
}

fn links(text: &str, stash: &mut Stash) -> String {
    let text = LINK.replace_all(text, |c: &Captures| {
        format!("{}{}", Sentinel::Span.wrap(&c[1]), stash.hold(&c[2]))
    });
    let text = text
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace(Sentinel::MathBlockOpen.as_str(), "\\[")
        .replace(Sentinel::MathBlockClose.as_str(), "\\]")
        .replace(Sentinel::MathInlineOpen.as_str(), "\\(")
        .replace(Sentinel::MathInlineClose.as_str(), "\\)");
    LINK_PAIR.replace_all(&text, "[${1}](${2})").into_owned()
}

fn strikethrough(text: &str) -> String {
    let text = STRIKE.replace_all(text, |c: &Captures| Sentinel::Span.wrap(&c[1]));
    resolve_spans(&text.replace('~', "\\~"), "~")
}

fn blockquotes(text: &str) -> String {
    let quote = Sentinel::Quote.as_str();
    let text = QUOTE_LINE.replace_all(text, |c: &Captures| format!("{}{quote} ", &c[1]));
    text.replace('>', "\\>").replace(quote, ">")
}

/// Header lines become a bold line; fenced blocks are matched only so their `#` lines are skipped.
fn headers(text: &str) -> String {
    replace_protected(text, &HEADER_OR_FENCE, |line| {
        let title = line.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
        format!("{HEADER_GLYPH}*{title}*\n\n")
    })
}

/// Bullet dashes become `•`, every other dash outside code is escaped. Dashes inside fences are parked
/// first so a code line starting with `- ` is never mistaken for a list item.
fn dashes(text: &str) -> String {
    let outer = Sentinel::OuterDash.as_str();
    let inner = Sentinel::InnerDash.as_str();
    let text = replace_protected(text, &OUTER_DASH, |_| outer.to_string());
    let text = text.replace('-', inner).replace(outer, "-");
    let text = DASH_BULLET.replace_all(&text, format!("\n\n${{1}}{BULLET} ").as_str());
    let text = text.replace(inner, "\\-");
    replace_protected(&text, &MINUS, escape_char)
}

fn backticks(text: &str) -> String {
    let inline = Sentinel::InlineBacktick.as_str();
    let text = replace_protected(text, &FENCED_OR_TICK, |_| inline.to_string());
    let text = text
        .replace('`', "\\`")
        .replace(Sentinel::EscapedBacktick.as_str(), "\\`")
        .replace(inline, "`");
    let text = LONE_BACKSLASH_CODE.replace_all(&text, NoExpand(r" `\\` "));
    text.replace("``", r"\`\`")
}

/// Escapes `=|{}.!` outside fenced blocks, then restores the fence delimiters.
fn literals(text: &str) -> String {
    let text = replace_protected(text, &OUTSIDE_FENCE, |s| {
        let mut out = String::with_capacity(s.len() + 8);
        for c in s.chars() {
            if matches!(c, '=' | '|' | '{' | '}' | '.' | '!') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    });
    FENCE_PAIR.replace_all(&text, "```${1}```").into_owned()
}

/// A line with an odd number of inline-code backticks would leave an entity open; escape its stray ones.
fn backtick_parity(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let outside_fences = line.replace("```", "").matches('`').count();
            let total = line.matches('`').count();
            if outside_fences % 2 != 0 || (!line.trim().starts_with("```") && total % 2 != 0) {
                replace_protected(line, &STRAY_TICK, escape_char)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn drop_chars(line: &str, n: usize) -> &str {
    match line.char_indices().nth(n) {
        Some((i, _)) => &line[i..],
        None => "",
    }
}

/// Strips the indentation shared by all non-blank lines and sets the block apart with blank lines.
fn dedent_block(block: &str) -> String {
    let lines: Vec<&str> = block.split('\n').collect();
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_whitespace(l))
        .min()
        .unwrap_or(0);
    let body = lines
        .iter()
        .map(|l| drop_chars(l, indent))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n{}\n\n", body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::is_sentinel;

    fn md(text: &str) -> String {
        escape(text, &EscapeOptions::default())
    }

    #[test]
    fn strip_escapes_restores_literals() {
        assert_eq!(strip_escapes("1\\. a\\-b \\(x\\) c\\\\d"), "1. a-b (x) c\\d");
        assert_eq!(strip_escapes(&md("Done. See (notes)!")), "Done. See (notes)!");
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(md("hello world"), "hello world");
    }

    #[test]
    fn bold_becomes_single_asterisk() {
        assert_eq!(md("**hello**"), "*hello*");
        assert_eq!(md("a * b"), "a \\* b");
    }

    #[test]
    fn italic_underline_flag() {
        assert_eq!(md("_hi_"), "_hi_");
        assert_eq!(escape_with("_hi_", false, false), "\\_hi\\_");
        assert_eq!(md("snake_case"), "snake\\_case");
    }

    #[test]
    fn star_bullet_becomes_glyph() {
        assert_eq!(md("\n* item"), "\n\n• item");
    }

    #[test]
    fn dash_bullets_and_literal_dashes() {
        assert_eq!(md("intro\n- one\n- two"), "intro\n\n• one\n\n• two");
        assert_eq!(md("well-known"), "well\\-known");
    }

    #[test]
    fn links_keep_their_target() {
        assert_eq!(md("[click](http://x.com)"), "[click](http://x.com)");
        assert_eq!(
            md("see (this) [click](http://x.com)."),
            "see \\(this\\) [click](http://x.com)\\."
        );
        assert_eq!(md("![alt](http://x.com/a.png)"), "[alt](http://x.com/a.png)");
    }

    #[test]
    fn strikethrough_and_tilde() {
        assert_eq!(md("~~old~~ ~"), "~old~ \\~");
    }

    #[test]
    fn blockquote_kept_other_gt_escaped() {
        assert_eq!(md("> quote\nnot > this"), "> quote\nnot \\> this");
        assert_eq!(md("a\n> b"), "a\n> b");
    }

    #[test]
    fn headers_become_bold_lines() {
        assert_eq!(md("# Title\n"), "▎*Title*\n\n");
        assert_eq!(
            md("Intro\n## Sub title\ntext #1"),
            "Intro\n▎*Sub title*\n\ntext \\#1"
        );
    }

    #[test]
    fn reserved_literals_escaped() {
        assert_eq!(md("a.b!c=d|e{f}"), "a\\.b\\!c\\=d\\|e\\{f\\}");
        assert_eq!(md("1 + 1"), "1 \\+ 1");
    }

    #[test]
    fn inline_code_keeps_plus_and_dash() {
        assert_eq!(md("`a+b-c`"), "`a+b-c`");
    }

    #[test]
    fn numbered_list_gets_blank_line() {
        assert_eq!(md("Steps:\n1. a\n2. b"), "Steps:\n\n1\\. a\n\n2\\. b");
    }

    #[test]
    fn fenced_block_is_dedented_and_set_apart() {
        assert_eq!(
            md("Run:\n```python\nx = 1.5\n```\nDone."),
            "Run:\n\n```python\nx = 1.5\n```\n\nDone\\."
        );
        assert_eq!(
            md("List:\n  ```\n  a\n    b\n  ```\nEnd"),
            "List:\n\n```\na\n  b\n```\n\nEnd"
        );
    }

    #[test]
    fn backticks_escaped_and_balanced() {
        assert_eq!(md("a \\` b"), "a \\` b");
        assert_eq!(md("it`s"), "it\\`s");
    }

    #[test]
    fn math_delimiters_stripped() {
        assert_eq!(md("\\(x\\)"), "x");
        assert_eq!(md("\\[a+b\\]"), "\n\na\\+b\n\n");
    }

    #[test]
    fn double_backslash_kept_when_math_escape_disabled() {
        assert_eq!(escape_with("a \\\\ b", true, true), "a \\\\ b");
        assert_eq!(escape_with("a \\\\ b", false, true), "a \\\\\\\\ b");
    }

    #[test]
    fn no_sentinel_survives() {
        let input = "# H\n**b** _i_ ~~s~~ [l](u)\n> q\n- x\n```rs\nlet a = b - c;\n```\n`c` \\(m\\) \\[n\\] -";
        let out = md(input);
        assert!(!out.chars().any(is_sentinel), "{out:?}");
    }

    #[test]
    fn user_text_cannot_forge_sentinels() {
        let forged = format!("a{}b", Sentinel::Span.as_str());
        assert_eq!(md(&forged), "ab");
    }
}
