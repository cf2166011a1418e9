//! A compiled story and the pipeline that produces it
use crate::build_config::{BuildConfig, CONFIG_TAG};
use crate::error::CompileError;
use crate::include::{self, STORY_INCLUDES};
use crate::passage::{self, PassageMap};
use crate::preprocess::PreprocessorRegistry;
use crate::source_files::{Line, SourceFiles};
use crate::utils;
use crate::warning::{Diagnostics, WarningKind};
use crate::StoryResult;
use log::debug;
use std::path::Path;

/// Name of the passage holding the story title
pub const STORY_TITLE: &str = "StoryTitle";

/// Tag collecting passages into the story stylesheet
pub const STYLESHEET_TAG: &str = "stylesheet";

/// Tag collecting passages into the story script
pub const SCRIPT_TAG: &str = "script";

/// A parsed and classified story
#[derive(Debug, Clone)]
pub struct StoryFile {
    pub passages: PassageMap,

    /// Content of every `stylesheet` passage, each followed by a newline
    pub css: String,

    /// Content of every `script` passage, each followed by a newline
    pub js: String,

    pub title: String,

    pub start_passage: String,
}

/// Everything a compile produces, successful or not
pub struct Compilation {
    pub story: StoryResult,

    /// The build configuration as left by the story's directives
    pub config: BuildConfig,

    /// Every file read, for rendering diagnostics
    pub files: SourceFiles,

    pub diagnostics: Diagnostics,
}

impl StoryFile {
    /// Compiles the story rooted at `path`
    ///
    /// Only an unreadable root file or an invalid configuration passage make
    /// the story an error; everything else is reported in the diagnostics.
    pub fn compile<P: AsRef<Path>>(
        path: P,
        mut config: BuildConfig,
        preprocessors: &PreprocessorRegistry,
    ) -> Compilation {
        let mut files = SourceFiles::new();
        let mut diagnostics = Diagnostics::new();

        let story = include::load_story(path.as_ref(), &mut files, &mut diagnostics).and_then(
            |lines| {
                StoryFile::from_lines(&lines, &files, &mut config, preprocessors, &mut diagnostics)
            },
        );

        Compilation {
            story,
            config,
            files,
            diagnostics,
        }
    }

    /// Parses, preprocesses and classifies already expanded lines
    pub fn from_lines(
        lines: &[Line],
        files: &SourceFiles,
        config: &mut BuildConfig,
        preprocessors: &PreprocessorRegistry,
        diagnostics: &mut Diagnostics,
    ) -> StoryResult {
        let mut passages = passage::parse_passages(lines, files, diagnostics);
        debug!("Parsed {} passages", passages.len());
        preprocessors.run(&mut passages);

        let mut story = StoryFile {
            passages,
            css: String::new(),
            js: String::new(),
            title: String::new(),
            start_passage: config.start_passage.clone(),
        };
        story.classify(config)?;
        story.start_passage = config.start_passage.clone();
        story.check(config, diagnostics);
        Ok(story)
    }

    /// Pulls out special passages and numbers the rest from 1
    fn classify(&mut self, config: &mut BuildConfig) -> Result<(), CompileError> {
        let mut pid = 0;
        for passage in self.passages.iter_mut() {
            if passage.name == STORY_TITLE {
                self.title = passage.content.clone();
                config.story_name = passage.content.clone();
                passage.excluded = true;
            } else if passage.name == STORY_INCLUDES {
                // Already expanded while loading
                passage.excluded = true;
            } else if passage.has_tag(STYLESHEET_TAG) {
                self.css.push_str(&passage.content);
                self.css.push('\n');
                passage.excluded = true;
            } else if passage.has_tag(SCRIPT_TAG) {
                self.js.push_str(&passage.content);
                self.js.push('\n');
                passage.excluded = true;
            } else if passage.has_tag(CONFIG_TAG) {
                config
                    .apply_directives(&passage.content)
                    .map_err(|(idx, source)| CompileError::Directive {
                        passage: passage.name.clone(),
                        origin: passage.lines.get(idx).map(|line| line.origin),
                        source,
                    })?;
                passage.excluded = true;
            } else {
                pid += 1;
                passage.pid = Some(pid);
            }
        }
        debug!("Assigned {} passage ids", pid);
        Ok(())
    }

    /// Warns about configuration the output will silently paper over
    fn check(&self, config: &BuildConfig, diagnostics: &mut Diagnostics) {
        let start = self.passages.get(&self.start_passage);
        if start.and_then(|p| p.pid).is_none() {
            let names = self
                .passages
                .iter()
                .filter(|p| !p.excluded)
                .map(|p| p.name.as_str());
            diagnostics.warn(
                WarningKind::MissingStartPassage {
                    name: self.start_passage.clone(),
                    suggestion: utils::best_match(&self.start_passage, names),
                },
                start.map(|p| p.origin),
            );
        }

        if !config.story_ifid_specified {
            diagnostics.warn(WarningKind::MissingIfid(config.story_ifid.clone()), None);
        }
    }

    /// Output id of the start passage
    ///
    /// Falls back to 1 when the start passage is missing or excluded, even
    /// if no passage has that id.
    pub fn start_pid(&self) -> usize {
        self.passages
            .get(&self.start_passage)
            .and_then(|p| p.pid)
            .unwrap_or(1)
    }
}
