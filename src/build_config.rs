//! Settings a story can change about its own build
//!
//! Passages tagged `twee2` hold configuration directives, one per line:
//!
//! ```text
//! :: StoryConfig [twee2]
//! # comments and blank lines are ignored
//! name = The Lighthouse
//! format: Harlowe
//! ifid = '3F0C9A7E-0B8D-4C1A-9E55-6F2B1D8A4C10'
//! start = Prologue
//! ```
//!
//! Only the keys below are understood. Anything else fails the compile.
use crate::error::DirectiveError;
use crate::utils;
use uuid::Uuid;

/// Tag marking passages that hold configuration directives
pub const CONFIG_TAG: &str = "twee2";

/// Name of the passage the story starts at unless configured otherwise
pub const DEFAULT_START_PASSAGE: &str = "Start";

/// Story name used until one is given
pub const DEFAULT_STORY_NAME: &str = "Untitled Story";

// Older sources spell keys as `Twee2::build_config.story_ifid = '...'`
const LEGACY_PREFIX: &str = "Twee2::build_config.";

const KEYS: &[&str] = &[
    "name",
    "story_name",
    "title",
    "format",
    "story_format",
    "ifid",
    "story_ifid",
    "start",
    "story_start",
    "start_passage",
];

/// The build settings shared between a compile and its caller
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub story_name: String,

    /// Story format selected by the story itself, by name or path
    pub story_format: Option<String>,

    pub story_ifid: String,

    /// True once the IFID has been set explicitly
    pub story_ifid_specified: bool,

    pub start_passage: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            story_name: DEFAULT_STORY_NAME.to_string(),
            story_format: None,
            story_ifid: Uuid::new_v4().to_string().to_uppercase(),
            story_ifid_specified: false,
            start_passage: DEFAULT_START_PASSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Name(String),
    Format(String),
    Ifid(String),
    Start(String),
}

fn parse_directive(line: &str) -> Result<Option<Directive>, DirectiveError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return Ok(None);
    }
    let line = line.strip_prefix(LEGACY_PREFIX).unwrap_or(line);

    let sep = line
        .find(|c| c == '=' || c == ':')
        .ok_or_else(|| DirectiveError::Malformed(line.to_string()))?;
    let key = line[..sep].trim();
    let value = utils::unwrap_quotes(line[sep + 1..].trim()).trim();
    if key.is_empty() {
        return Err(DirectiveError::Malformed(line.to_string()));
    }

    let directive: fn(String) -> Directive = match key {
        "name" | "story_name" | "title" => Directive::Name,
        "format" | "story_format" => Directive::Format,
        "ifid" | "story_ifid" => Directive::Ifid,
        "start" | "story_start" | "start_passage" => Directive::Start,
        _ => {
            return Err(DirectiveError::UnknownKey {
                key: key.to_string(),
                suggestion: utils::best_match(key, KEYS),
            })
        }
    };
    if value.is_empty() {
        return Err(DirectiveError::EmptyValue(key.to_string()));
    }
    Ok(Some(directive(value.to_string())))
}

impl BuildConfig {
    /// Sets the IFID explicitly
    pub fn set_ifid(&mut self, ifid: &str) {
        self.story_ifid = ifid.to_uppercase();
        self.story_ifid_specified = true;
    }

    /// Applies the directives in a configuration passage's content
    ///
    /// On failure, returns the 0-based index of the offending line. Nothing
    /// is applied unless every line is valid.
    pub fn apply_directives(&mut self, content: &str) -> Result<(), (usize, DirectiveError)> {
        let directives = content
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| parse_directive(line).map_err(|e| (idx, e)).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        for directive in directives {
            match directive {
                Directive::Name(name) => self.story_name = name,
                Directive::Format(format) => self.story_format = Some(format),
                Directive::Ifid(ifid) => self.set_ifid(&ifid),
                Directive::Start(start) => self.start_passage = start,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.story_name, DEFAULT_STORY_NAME);
        assert_eq!(config.start_passage, DEFAULT_START_PASSAGE);
        assert_eq!(config.story_format, None);
        assert!(!config.story_ifid_specified);
        assert_eq!(config.story_ifid.len(), 36);
        assert_eq!(config.story_ifid, config.story_ifid.to_uppercase());
    }

    #[test]
    fn applies_directives() {
        let mut config = BuildConfig::default();
        config
            .apply_directives(indoc! {"
                # Build settings
                name = The Lighthouse
                format: 'SugarCube'

                // explicit id
                ifid = \"3f0c9a7e-0b8d-4c1a-9e55-6f2b1d8a4c10\"
                start = Prologue
            "})
            .unwrap();
        assert_eq!(config.story_name, "The Lighthouse");
        assert_eq!(config.story_format.as_deref(), Some("SugarCube"));
        assert_eq!(config.story_ifid, "3F0C9A7E-0B8D-4C1A-9E55-6F2B1D8A4C10");
        assert!(config.story_ifid_specified);
        assert_eq!(config.start_passage, "Prologue");
    }

    #[test]
    fn accepts_legacy_prefix() {
        let mut config = BuildConfig::default();
        config
            .apply_directives("Twee2::build_config.story_format = 'Snowman'")
            .unwrap();
        assert_eq!(config.story_format.as_deref(), Some("Snowman"));
    }

    #[test]
    fn separator_is_first_of_equals_or_colon() {
        let mut config = BuildConfig::default();
        config.apply_directives("name = Act 1: Dawn").unwrap();
        assert_eq!(config.story_name, "Act 1: Dawn");
    }

    #[test]
    fn rejects_unknown_keys_with_suggestion() {
        let mut config = BuildConfig::default();
        let err = config
            .apply_directives("name = Kept?\nstory_fromat = Harlowe")
            .unwrap_err();
        assert_eq!(err.0, 1);
        assert_eq!(
            err.1,
            DirectiveError::UnknownKey {
                key: "story_fromat".to_string(),
                suggestion: Some("story_format".to_string()),
            }
        );
        assert_eq!(config.story_name, DEFAULT_STORY_NAME);
    }

    #[test]
    fn rejects_code_and_empty_values() {
        let mut config = BuildConfig::default();
        let err = config.apply_directives("system('rm -rf /')").unwrap_err();
        assert!(matches!(err.1, DirectiveError::Malformed(_)));

        let err = config.apply_directives("ifid = ''").unwrap_err();
        assert_eq!(err.1, DirectiveError::EmptyValue("ifid".to_string()));
    }
}
