//! Passages, the ordered passage collection and the passage parser
use crate::source_files::{Line, Origin, SourceFiles};
use crate::warning::{Diagnostics, Warning, WarningKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Position given to passages whose header does not specify one
pub const DEFAULT_POSITION: &str = "0,0";

// `:: Name [tag tag] <x,y>`. The name stops at the first `[` or `<`.
static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^::\s*([^\[<]*?)\s*(?:\[(.*?)\])?\s*(?:<(.*?)>)?\s*$").unwrap()
});

/// The parsed contents of a passage header line
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub tags: Vec<String>,
    pub position: Option<String>,
}

/// Parses a passage header line, returning `None` for ordinary content
pub fn parse_header(text: &str) -> Option<Header> {
    let text = text.trim_end_matches(|c| c == '\n' || c == '\r');
    HEADER.captures(text).map(|caps| {
        let mut tags: Vec<String> = Vec::new();
        if let Some(tag_list) = caps.get(2) {
            for tag in tag_list.as_str().split_whitespace() {
                if !tags.iter().any(|t| t == tag) {
                    tags.push(tag.to_string());
                }
            }
        }
        Header {
            name: caps[1].trim().to_string(),
            tags,
            position: caps.get(3).map(|m| m.as_str().to_string()),
        }
    })
}

/// A named block of story content
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub name: String,

    /// Tags in header order, without duplicates
    pub tags: Vec<String>,

    /// Position in the story map, as written in the header
    pub position: String,

    /// Body text. Trailing whitespace is trimmed once parsing finishes
    pub content: String,

    /// The body lines that made up this passage, for diagnostics
    pub lines: Vec<Line>,

    /// True for special passages that do not become passage elements
    pub excluded: bool,

    /// Output id, assigned during classification
    pub pid: Option<usize>,

    /// Where the header line was found
    pub origin: Origin,
}

impl Passage {
    pub fn new(header: Header, origin: Origin) -> Self {
        Passage {
            name: header.name,
            tags: header.tags,
            position: header
                .position
                .unwrap_or_else(|| DEFAULT_POSITION.to_string()),
            content: String::new(),
            lines: Vec::new(),
            excluded: false,
            pid: None,
            origin,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Removes a tag, returning true if it was present
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    fn push_line(&mut self, line: &Line) {
        self.content.push_str(&line.text);
        self.lines.push(line.clone());
    }
}

/// Passages keyed by name, iterated in the order names were first defined
///
/// Inserting a passage under an existing name replaces the old record in
/// place, so a redefinition keeps the original position.
#[derive(Debug, Clone, Default)]
pub struct PassageMap {
    entries: Vec<Passage>,
    index: HashMap<String, usize>,
}

impl PassageMap {
    pub fn new() -> Self {
        PassageMap::default()
    }

    /// Inserts a passage, returning its position and the passage it replaced
    pub fn insert(&mut self, passage: Passage) -> (usize, Option<Passage>) {
        match self.index.get(&passage.name) {
            Some(&idx) => {
                let old = std::mem::replace(&mut self.entries[idx], passage);
                (idx, Some(old))
            }
            None => {
                let idx = self.entries.len();
                self.index.insert(passage.name.clone(), idx);
                self.entries.push(passage);
                (idx, None)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Passage> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Passage> {
        match self.index.get(name) {
            Some(&idx) => self.entries.get_mut(idx),
            None => None,
        }
    }

    pub fn get_index(&self, idx: usize) -> Option<&Passage> {
        self.entries.get(idx)
    }

    pub fn get_index_mut(&mut self, idx: usize) -> Option<&mut Passage> {
        self.entries.get_mut(idx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Passage> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Passage> {
        self.entries.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }
}

impl<'a> IntoIterator for &'a PassageMap {
    type Item = &'a Passage;
    type IntoIter = std::slice::Iter<'a, Passage>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Splits expanded source lines into passages
///
/// Lines before the first header are dropped. Redefining a passage warns
/// and replaces the earlier definition in place.
pub fn parse_passages(
    lines: &[Line],
    files: &SourceFiles,
    diagnostics: &mut Diagnostics,
) -> PassageMap {
    let mut passages = PassageMap::new();
    let mut current: Option<usize> = None;

    for line in lines {
        if let Some(header) = parse_header(&line.text) {
            let name = header.name.clone();
            let (idx, replaced) = passages.insert(Passage::new(header, line.origin));
            if let Some(old) = replaced {
                let kind = WarningKind::DuplicatePassage {
                    name,
                    first: files.describe(old.origin),
                    second: files.describe(line.origin),
                };
                diagnostics.push(Warning::new(kind, Some(line.origin)).with_referent(old.origin));
            }
            current = Some(idx);
        } else if let Some(idx) = current {
            if let Some(passage) = passages.get_index_mut(idx) {
                passage.push_line(line);
            }
        }
    }

    for passage in passages.iter_mut() {
        let len = passage.content.trim_end().len();
        passage.content.truncate(len);
    }

    passages
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (PassageMap, Diagnostics) {
        let mut files = SourceFiles::new();
        let id = files.add("story.tw", source);
        let mut diagnostics = Diagnostics::new();
        let passages = parse_passages(&files.lines(id), &files, &mut diagnostics);
        (passages, diagnostics)
    }

    #[test]
    fn header_with_tags_and_position() {
        let header = parse_header(":: Garden Path [outdoors  dark outdoors] <120,40>\n").unwrap();
        assert_eq!(header.name, "Garden Path");
        assert_eq!(header.tags, vec!["outdoors", "dark"]);
        assert_eq!(header.position.as_deref(), Some("120,40"));
    }

    #[test]
    fn header_variants() {
        let header = parse_header("::Start").unwrap();
        assert_eq!(header.name, "Start");
        assert!(header.tags.is_empty());
        assert_eq!(header.position, None);

        let header = parse_header(":: Map <5,6>").unwrap();
        assert_eq!(header.name, "Map");
        assert_eq!(header.position.as_deref(), Some("5,6"));

        let header = parse_header(":: Styles [stylesheet]").unwrap();
        assert_eq!(header.tags, vec!["stylesheet"]);
    }

    #[test]
    fn malformed_headers_are_content() {
        assert_eq!(parse_header("Just text"), None);
        assert_eq!(parse_header(": Single colon"), None);
        assert_eq!(parse_header(":: Broken <1,2"), None);
    }

    #[test]
    fn parses_passages_in_order() {
        let (passages, diagnostics) = parse(indoc! {"
            ignored before any header
            :: Start [intro]
            Hello.

              Indented.


            :: Second <10,20>
            World
        "});
        assert!(diagnostics.is_empty());
        let names: Vec<_> = passages.names().collect();
        assert_eq!(names, vec!["Start", "Second"]);

        let start = passages.get("Start").unwrap();
        assert_eq!(start.content, "Hello.\n\n  Indented.");
        assert_eq!(start.tags, vec!["intro"]);
        assert_eq!(start.position, DEFAULT_POSITION);
        assert_eq!(start.origin.line, 2);
        assert_eq!(start.lines.len(), 5);

        let second = passages.get("Second").unwrap();
        assert_eq!(second.position, "10,20");
        assert_eq!(second.content, "World");
    }

    #[test]
    fn leading_whitespace_is_kept() {
        let (passages, _) = parse(":: Poem\n\n   roses\n");
        assert_eq!(passages.get("Poem").unwrap().content, "\n   roses");
    }

    #[test]
    fn redefinition_overwrites_in_place() {
        let (passages, diagnostics) = parse(indoc! {"
            :: A
            first
            :: B
            bee
            :: A
            second
        "});
        let names: Vec<_> = passages.names().collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(passages.get("A").unwrap().content, "second");
        assert_eq!(passages.get("A").unwrap().origin.line, 5);

        assert_eq!(diagnostics.len(), 1);
        let warning = diagnostics.iter().next().unwrap();
        assert_eq!(warning.get_name(), "DuplicatePassage");
        assert_eq!(warning.context.map(|o| o.line), Some(5));
        assert_eq!(warning.get_referent().map(|o| o.line), Some(1));
        let message = warning.to_string();
        assert!(message.contains("story.tw:1"));
        assert!(message.contains("story.tw:5"));
    }

    #[test]
    fn remove_tag_reports_presence() {
        let mut passage = Passage::new(parse_header(":: P [a b]").unwrap(), Origin { file: 0, line: 1 });
        assert!(passage.remove_tag("a"));
        assert!(!passage.remove_tag("a"));
        assert_eq!(passage.tags, vec!["b"]);
    }
}
