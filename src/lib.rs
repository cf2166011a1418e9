//! Tweeforge compiles Twee2 story sources into Twine 2 story data
//!
//! A story is read from a root file, expanding `StoryIncludes` passages and
//! `::@include` directives, then split into passages. Tagged passages run
//! through registered preprocessors, special passages (title, stylesheets,
//! scripts and `twee2` configuration) are pulled out, and the remaining
//! passages are numbered and rendered as a `tw-storydata` element.
//!
//! ```no_run
//! use tweeforge::{story_data, BuildConfig, PreprocessorRegistry, StoryFile};
//!
//! let compilation = StoryFile::compile(
//!     "story.tw",
//!     BuildConfig::default(),
//!     &PreprocessorRegistry::with_defaults(),
//! );
//! if let Ok(story) = &compilation.story {
//!     println!("{}", story_data::story_data(story, &compilation.config));
//! }
//! ```
pub type StoryResult = std::result::Result<StoryFile, CompileError>;

mod build_config;
pub use build_config::BuildConfig;
pub use build_config::CONFIG_TAG;

mod config;
pub use config::CliConfig;
pub use config::Config;
pub use config::ConfigFile;

mod error;
pub use error::CompileError;
pub use error::DirectiveError;

pub mod include;

pub mod issue;
pub use issue::Issue;

pub mod linter;
pub use linter::{Link, LinkStyle};

pub mod passage;
pub use passage::{Passage, PassageMap};

pub mod preprocess;
pub use preprocess::{Preprocessor, PreprocessorRegistry};

pub mod source_files;
pub use source_files::{Line, Origin, SourceFiles};

pub mod story_data;

mod story_file;
pub use story_file::{Compilation, StoryFile};

mod story_format;
pub use story_format::StoryFormat;

pub mod utils;

pub mod warning;
pub use warning::{Diagnostics, Warning, WarningKind};

pub mod tweeforge;
