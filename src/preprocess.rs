//! Per-tag content transformers run over parsed passages
//!
//! A [`Preprocessor`] turns the content of every passage carrying its tag
//! into new content. Transformers run in registration order, each at most
//! once per passage, and the tag is removed once it has fired. Tags with no
//! registered transformer are left alone.
//!
//! [`Preprocessor`]: trait.Preprocessor.html
use crate::passage::{Passage, PassageMap};
use log::debug;
use pulldown_cmark::{html, Parser};

/// Transforms the content of a tagged passage
pub trait Preprocessor {
    fn process(&self, content: &str) -> String;
}

impl<F> Preprocessor for F
where
    F: Fn(&str) -> String,
{
    fn process(&self, content: &str) -> String {
        self(content)
    }
}

/// Renders Markdown passages to HTML
#[derive(Debug, Default, Clone, Copy)]
pub struct Markdown;

impl Preprocessor for Markdown {
    fn process(&self, content: &str) -> String {
        let mut out = String::new();
        html::push_html(&mut out, Parser::new(content));
        let len = out.trim_end().len();
        out.truncate(len);
        out
    }
}

/// Tag-to-transformer registry, applied in registration order
#[derive(Default)]
pub struct PreprocessorRegistry {
    entries: Vec<(String, Box<dyn Preprocessor>)>,
}

impl PreprocessorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        PreprocessorRegistry::default()
    }

    /// A registry with the built-in transformers (`markdown`)
    pub fn with_defaults() -> Self {
        let mut registry = PreprocessorRegistry::new();
        registry.register("markdown", Markdown);
        registry
    }

    /// Registers a transformer for `tag`. Registering a tag again replaces
    /// its transformer but keeps its place in the order.
    pub fn register<T, P>(&mut self, tag: T, preprocessor: P) -> &mut Self
    where
        T: Into<String>,
        P: Preprocessor + 'static,
    {
        let tag = tag.into();
        let boxed: Box<dyn Preprocessor> = Box::new(preprocessor);
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 = boxed,
            None => self.entries.push((tag, boxed)),
        }
        self
    }

    /// Registered tags, in the order they are applied
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(tag, _)| tag.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every matching transformer over one passage
    pub fn apply(&self, passage: &mut Passage) {
        for (tag, preprocessor) in &self.entries {
            if passage.remove_tag(tag) {
                debug!("Running {} preprocessor on passage {}", tag, passage.name);
                passage.content = preprocessor.process(&passage.content);
            }
        }
    }

    /// Runs the registry over every passage
    pub fn run(&self, passages: &mut PassageMap) {
        for passage in passages.iter_mut() {
            self.apply(passage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::parse_header;
    use crate::source_files::Origin;

    fn passage(header: &str, content: &str) -> Passage {
        let mut passage = Passage::new(parse_header(header).unwrap(), Origin { file: 0, line: 1 });
        passage.content = content.to_string();
        passage
    }

    #[test]
    fn tags_fire_once_in_registration_order() {
        let mut registry = PreprocessorRegistry::new();
        registry
            .register("upper", |c: &str| c.to_uppercase())
            .register("wrap", |c: &str| format!("<{}>", c));

        let mut p = passage(":: P [wrap keep upper]", "hi");
        registry.apply(&mut p);
        assert_eq!(p.content, "<HI>");
        assert_eq!(p.tags, vec!["keep"]);

        registry.apply(&mut p);
        assert_eq!(p.content, "<HI>");
    }

    #[test]
    fn reregistering_replaces_transformer() {
        let mut registry = PreprocessorRegistry::new();
        registry.register("a", |_: &str| "first".to_string());
        registry.register("b", |c: &str| format!("{}!", c));
        registry.register("a", |_: &str| "second".to_string());
        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["a", "b"]);

        let mut p = passage(":: P [b a]", "x");
        registry.apply(&mut p);
        assert_eq!(p.content, "second!");
    }

    #[test]
    fn unregistered_tags_are_inert() {
        let registry = PreprocessorRegistry::with_defaults();
        let mut p = passage(":: P [haml]", "%p hi");
        registry.apply(&mut p);
        assert_eq!(p.content, "%p hi");
        assert_eq!(p.tags, vec!["haml"]);
    }

    #[test]
    fn markdown_renders_html() {
        let registry = PreprocessorRegistry::with_defaults();
        let mut p = passage(":: P [markdown]", "Some *emphasis*");
        registry.apply(&mut p);
        assert_eq!(p.content, "<p>Some <em>emphasis</em></p>");
        assert!(p.tags.is_empty());
    }
}
