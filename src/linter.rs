//! Checks the links in a story for malformed or ambiguous syntax
//!
//! Links look like one of
//!
//! - `[[Passage]]`, where the text and the destination are the same
//! - `[[text->Passage]]` or `[[text|Passage]]`
//! - `[[Passage<-text]]`
//!
//! Link text that contains separators can be wrapped in single or double
//! quotes, with the quote character escaped by a backslash inside. Linting
//! only reports problems; it never changes a passage.
use crate::source_files::{Line, Origin};
use crate::story_file::StoryFile;
use crate::warning::{Diagnostics, WarningKind};
use log::trace;

/// The syntax a link was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    Bare,
    Arrow,
    Pipe,
    ReverseArrow,
    MalformedArrow,
    MalformedPipe,
    MalformedReverse,
}

impl LinkStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkStyle::Bare => "bare",
            LinkStyle::Arrow => "->",
            LinkStyle::Pipe => "|",
            LinkStyle::ReverseArrow => "<-",
            LinkStyle::MalformedArrow => "malformed ->",
            LinkStyle::MalformedPipe => "malformed |",
            LinkStyle::MalformedReverse => "malformed <-",
        }
    }

    pub fn is_malformed(self) -> bool {
        matches!(
            self,
            LinkStyle::MalformedArrow | LinkStyle::MalformedPipe | LinkStyle::MalformedReverse
        )
    }
}

/// The parts of a link body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLink {
    pub style: LinkStyle,
    pub text: String,
    pub dest: String,
}

/// A link found in a passage
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub style: LinkStyle,
    pub dest: String,
    pub text: String,
    pub origin: Origin,
}

/// Finds the bodies of the `[[...]]` links on a line
pub fn link_bodies(text: &str) -> Vec<&str> {
    let mut bodies = Vec::new();
    let mut pos = 0;
    while let Some(found) = text[pos..].find("[[") {
        let start = pos + found + 2;
        match text[start..].find(']') {
            Some(len) if text[start + len..].starts_with("]]") => {
                bodies.push(&text[start..start + len]);
                pos = start + len + 2;
            }
            _ => pos += found + 1,
        }
    }
    bodies
}

fn is_plain_text(s: &str) -> bool {
    !s.is_empty() && !s.contains(|c| matches!(c, '<' | '>' | '|' | '\'' | '"'))
}

fn is_special(c: char) -> bool {
    matches!(c, '[' | ']' | '\'' | '"' | '\\')
}

/// Offsets where a quoted side opened at offset 0 may close. Every quote
/// before a candidate is escaped; the first unescaped quote is the last one.
fn closing_quotes(s: &str, quote: char) -> Vec<usize> {
    let mut candidates = Vec::new();
    let mut escaped = false;
    for (idx, c) in s.char_indices().skip(1) {
        if c == quote {
            if idx >= 2 {
                candidates.push(idx);
            }
            if !escaped {
                break;
            }
        }
        escaped = c == '\\';
    }
    candidates
}

fn unescape(s: &str, quote: char) -> String {
    s.replace(&format!("\\{}", quote), &quote.to_string())
}

fn split_forward(rest: &str) -> Option<(LinkStyle, &str)> {
    let (style, dest) = if let Some(dest) = rest.strip_prefix("->") {
        (LinkStyle::Arrow, dest)
    } else if let Some(dest) = rest.strip_prefix('|') {
        (LinkStyle::Pipe, dest)
    } else {
        return None;
    };
    if dest.is_empty() {
        None
    } else {
        Some((style, dest))
    }
}

/// `text->dest` or `text|dest`
fn parse_forward(body: &str) -> Option<ParsedLink> {
    let quote = body.chars().next()?;
    let (text, rest) = if quote == '\'' || quote == '"' {
        // The longest quoted text that is followed by a separator wins
        closing_quotes(body, quote)
            .into_iter()
            .rev()
            .map(|close| (&body[1..close], &body[close + 1..]))
            .find(|(_, rest)| split_forward(rest).is_some())
            .map(|(text, rest)| (unescape(text, quote), rest))?
    } else {
        let sep = match (body.find("->"), body.find('|')) {
            (Some(arrow), Some(pipe)) => arrow.min(pipe),
            (Some(sep), None) | (None, Some(sep)) => sep,
            (None, None) => return None,
        };
        let text = &body[..sep];
        if !is_plain_text(text) {
            return None;
        }
        (text.to_string(), &body[sep..])
    };
    let (style, dest) = split_forward(rest)?;
    Some(ParsedLink {
        style,
        text,
        dest: dest.to_string(),
    })
}

/// A whole text side: quoted, or free of separators and quotes
fn text_side(s: &str) -> Option<String> {
    let quote = s.chars().next()?;
    if quote == '\'' || quote == '"' {
        let close = s.len() - 1;
        if close >= 2 && s.ends_with(quote) && closing_quotes(s, quote).contains(&close) {
            Some(unescape(&s[1..close], quote))
        } else {
            None
        }
    } else if is_plain_text(s) {
        Some(s.to_string())
    } else {
        None
    }
}

/// `dest<-text`, split at the last separator that leaves valid text
fn parse_reverse(body: &str) -> Option<ParsedLink> {
    body.rmatch_indices("<-").find_map(|(idx, _)| {
        let dest = &body[..idx];
        if dest.is_empty() {
            return None;
        }
        text_side(&body[idx + 2..]).map(|text| ParsedLink {
            style: LinkStyle::ReverseArrow,
            text,
            dest: dest.to_string(),
        })
    })
}

fn parse_fallback(body: &str) -> ParsedLink {
    let (style, text, dest) = if body.matches("->").count() == 1 {
        let (text, dest) = body.split_once("->").unwrap_or((body, ""));
        (LinkStyle::MalformedArrow, text, dest)
    } else if body.matches("<-").count() == 1 {
        let (dest, text) = body.split_once("<-").unwrap_or((body, ""));
        (LinkStyle::MalformedReverse, text, dest)
    } else if body.matches('|').count() == 1 {
        let (text, dest) = body.split_once('|').unwrap_or((body, ""));
        (LinkStyle::MalformedPipe, text, dest)
    } else {
        (LinkStyle::Bare, body, body)
    };
    ParsedLink {
        style,
        text: text.to_string(),
        dest: dest.to_string(),
    }
}

/// Classifies a link body, trying the well-formed shapes first
pub fn parse_link(body: &str) -> ParsedLink {
    parse_forward(body)
        .or_else(|| parse_reverse(body))
        .unwrap_or_else(|| parse_fallback(body))
}

/// Quote-balance checks for the text of a malformed link
fn check_text(text: &str, origin: Origin, diagnostics: &mut Diagnostics) {
    let quote = match text.chars().next() {
        Some(c) if c == '\'' || c == '"' => c,
        _ => {
            if text.chars().all(is_special) {
                diagnostics.warn(
                    WarningKind::UnquotedSpecialCharacters(text.to_string()),
                    Some(origin),
                );
            }
            return;
        }
    };

    if !text.ends_with(quote) {
        diagnostics.warn(
            WarningKind::UnterminatedQuote {
                text: text.to_string(),
                quote,
            },
            Some(origin),
        );
        return;
    }

    let inner = if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    };
    for (offset, _) in inner.match_indices(quote) {
        if offset == 0 || inner.as_bytes()[offset - 1] != b'\\' {
            diagnostics.warn(
                WarningKind::UnquotedQuote {
                    text: text.to_string(),
                    quote,
                },
                Some(origin),
            );
        }
    }
}

/// Lints the links on a single line
pub fn lint_line(line: &Line, diagnostics: &mut Diagnostics) -> Vec<Link> {
    link_bodies(&line.text)
        .into_iter()
        .map(|body| {
            let parsed = parse_link(body);
            trace!("Link {:?} parsed as {}", body, parsed.style.as_str());
            if parsed.style.is_malformed() {
                check_text(&parsed.text, line.origin, diagnostics);
            }
            Link {
                style: parsed.style,
                dest: parsed.dest,
                text: parsed.text,
                origin: line.origin,
            }
        })
        .collect()
}

/// Lints every line of every passage, returning the links found
pub fn lint(story: &StoryFile, diagnostics: &mut Diagnostics) -> Vec<Link> {
    let mut links = Vec::new();
    for passage in story.passages.iter() {
        for line in &passage.lines {
            links.extend(lint_line(line, diagnostics));
        }
    }
    links
}
