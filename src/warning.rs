//! Non-fatal conditions found while compiling or linting a story
use crate::source_files::Origin;
use std::fmt;

/// The kinds of warnings the compiler and linter can produce
#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    /// An included file could not be read
    MissingInclude(String),

    /// A file includes itself, directly or through other files
    IncludeCycle(String),

    /// A passage was redefined. The later definition replaces the earlier one
    DuplicatePassage {
        name: String,
        first: String,
        second: String,
    },

    /// Link text opens with a quote that never closes
    UnterminatedQuote { text: String, quote: char },

    /// Quoted link text contains an unescaped quote
    UnquotedQuote { text: String, quote: char },

    /// Link text made only of special characters without quoting
    UnquotedSpecialCharacters(String),

    /// The start passage does not exist or is not part of the output
    MissingStartPassage {
        name: String,
        suggestion: Option<String>,
    },

    /// No IFID was given, so a generated one will be used
    MissingIfid(String),
}

impl WarningKind {
    /// The stable name of this kind, as used by allow and deny lists
    pub fn get_name(&self) -> &'static str {
        match self {
            WarningKind::MissingInclude(_) => "MissingInclude",
            WarningKind::IncludeCycle(_) => "IncludeCycle",
            WarningKind::DuplicatePassage { .. } => "DuplicatePassage",
            WarningKind::UnterminatedQuote { .. } => "UnterminatedQuote",
            WarningKind::UnquotedQuote { .. } => "UnquotedQuote",
            WarningKind::UnquotedSpecialCharacters(_) => "UnquotedSpecialCharacters",
            WarningKind::MissingStartPassage { .. } => "MissingStartPassage",
            WarningKind::MissingIfid(_) => "MissingIfid",
        }
    }

    /// True for purely informational kinds
    pub fn is_notice(&self) -> bool {
        matches!(self, WarningKind::MissingIfid(_))
    }
}

fn quote_name(quote: char) -> &'static str {
    if quote == '\'' {
        "single"
    } else {
        "double"
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::MissingInclude(path) => {
                write!(f, "Tried to include file '{}' but it could not be read", path)
            }
            WarningKind::IncludeCycle(path) => {
                write!(f, "File '{}' includes itself; include skipped", path)
            }
            WarningKind::DuplicatePassage {
                name,
                first,
                second,
            } => write!(
                f,
                "Passage named {} at {} is overwritten by a passage with the same name at {}",
                name, first, second
            ),
            WarningKind::UnterminatedQuote { text, quote } => write!(
                f,
                "Link text ({:?}) does not end with a {} quote despite starting with one",
                text,
                quote_name(*quote)
            ),
            WarningKind::UnquotedQuote { text, quote } => write!(
                f,
                "Link text ({:?}) contains an unquoted {} quote in its body",
                text,
                quote_name(*quote)
            ),
            WarningKind::UnquotedSpecialCharacters(text) => write!(
                f,
                "Link text ({:?}) contains special characters but is not quoted",
                text
            ),
            WarningKind::MissingStartPassage { name, .. } => write!(
                f,
                "Start passage '{}' is not part of the story; passage 1 will be used",
                name
            ),
            WarningKind::MissingIfid(ifid) => write!(
                f,
                "No IFID specified. Consider adding a passage tagged twee2 containing: ifid = {}",
                ifid
            ),
        }
    }
}

/// A warning along with the location it refers to
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,

    /// Where the warning was raised
    pub context: Option<Origin>,

    /// A second location the warning relates to, such as the earlier
    /// definition of a duplicated passage
    pub referent: Option<Origin>,
}

impl Warning {
    pub fn new(kind: WarningKind, context: Option<Origin>) -> Self {
        Warning {
            kind,
            context,
            referent: None,
        }
    }

    pub fn with_referent(mut self, referent: Origin) -> Self {
        self.referent = Some(referent);
        self
    }

    pub fn get_name(&self) -> &'static str {
        self.kind.get_name()
    }

    pub fn get_referent(&self) -> Option<Origin> {
        self.referent
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Append-only sink for the warnings raised during a compile
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, warning: Warning) {
        log::debug!("{}: {}", warning.get_name(), warning);
        self.warnings.push(warning);
    }

    /// Records a warning of the given kind raised at `context`
    pub fn warn(&mut self, kind: WarningKind, context: Option<Origin>) {
        self.push(Warning::new(kind, context));
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.warnings.iter()
    }

    /// Counts the warnings with the given name
    pub fn count(&self, name: &str) -> usize {
        self.warnings.iter().filter(|w| w.get_name() == name).count()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable() {
        let kind = WarningKind::MissingInclude("chapter1.tw".to_string());
        assert_eq!(kind.get_name(), "MissingInclude");
        assert!(format!("{}", kind).contains("chapter1.tw"));
        assert!(WarningKind::MissingIfid("X".to_string()).is_notice());
        assert!(!kind.is_notice());
    }

    #[test]
    fn sink_keeps_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(WarningKind::MissingInclude("a".to_string()), None);
        diagnostics.warn(WarningKind::UnquotedSpecialCharacters("]".to_string()), None);
        diagnostics.warn(WarningKind::MissingInclude("b".to_string()), None);
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.count("MissingInclude"), 2);
        let names: Vec<_> = diagnostics.iter().map(Warning::get_name).collect();
        assert_eq!(
            names,
            vec!["MissingInclude", "UnquotedSpecialCharacters", "MissingInclude"]
        );
    }
}
