//! Segment matcher and rewriter.
//!
//! A pattern marks protected spans with its **first capturing group**; the rest of a match is context that only
//! anchors it. Matches without the group (e.g. a fenced block listed as an alternative so it gets skipped) leave
//! their text in the surrounding plain segment. Slicing the text at the boundary list yields alternating
//! plain/protected segments whose concatenation is the original text.

use regex::Regex;

/// One slice of a segmented string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Outside every protected span (even positions).
    Plain(&'a str),
    /// Text captured by the pattern's first group (odd positions).
    Protected(&'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Plain(s) | Segment::Protected(s) => s,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Segment::Protected(_))
    }
}

/// Boundary offsets `[0, start1, end1, start2, end2, ..., len]` of the protected spans in `text`.
pub fn find_all_index(text: &str, pattern: &Regex) -> Vec<usize> {
    let mut bounds = vec![0];
    for caps in pattern.captures_iter(text) {
        if let Some(group) = caps.get(1) {
            bounds.push(group.start());
            bounds.push(group.end());
        }
    }
    bounds.push(text.len());
    bounds
}

/// Splits `text` into alternating plain/protected segments, starting and ending with a (possibly empty) plain one.
pub fn segments<'a>(text: &'a str, pattern: &Regex) -> Vec<Segment<'a>> {
    find_all_index(text, pattern)
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let slice = &text[w[0]..w[1]];
            if i % 2 == 0 {
                Segment::Plain(slice)
            } else {
                Segment::Protected(slice)
            }
        })
        .collect()
}

/// Applies `transform` to every protected segment and reassembles the text in order.
pub fn replace_protected<F>(text: &str, pattern: &Regex, mut transform: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    for segment in segments(text, pattern) {
        match segment {
            Segment::Plain(s) => out.push_str(s),
            Segment::Protected(s) => out.push_str(&transform(s)),
        }
    }
    out
}
