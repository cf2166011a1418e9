//! Renders a story as Twine 2 story data
//!
//! The format name, format version, stylesheet and script are written as
//! placeholders. [`fill_placeholders`] substitutes them once the caller knows
//! which story format is in use.
//!
//! [`fill_placeholders`]: fn.fill_placeholders.html
use crate::build_config::BuildConfig;
use crate::passage::Passage;
use crate::story_file::StoryFile;
use clap::{crate_name, crate_version};
use horrorshow::html;

pub const STORY_FORMAT: &str = "{{STORY_FORMAT}}";
pub const STORY_FORMAT_VERSION: &str = "{{STORY_FORMAT_VERSION}}";
pub const STORY_CSS: &str = "{{STORY_CSS}}";
pub const STORY_JS: &str = "{{STORY_JS}}";

/// Renders the `tw-storydata` element for a story, with placeholders
pub fn story_data(story: &StoryFile, config: &BuildConfig) -> String {
    let passages: Vec<&Passage> = story.passages.iter().filter(|p| !p.excluded).collect();
    let passages = &passages;
    let story_name = config.story_name.as_str();
    let ifid = config.story_ifid.as_str();
    let start_pid = story.start_pid();

    format!(
        "{}",
        html! {
            tw-storydata(name = story_name,
                         startnode = start_pid,
                         creator = crate_name!(),
                         creator-version = crate_version!(),
                         ifid = ifid,
                         format = STORY_FORMAT,
                         format-version = STORY_FORMAT_VERSION,
                         options = "") {
                style(role = "stylesheet",
                      id = "twine-user-stylesheet",
                      type = "text/twine-css") {
                    : STORY_CSS
                }

                script(role = "script",
                       id = "twine-user-script",
                       type = "text/twine-javascript") {
                    : STORY_JS
                }

                @ for passage in passages.iter() {
                    tw-passagedata(pid = passage.pid.unwrap_or_default(),
                                   name = passage.name.as_str(),
                                   tags = passage.tags.join(" "),
                                   position = passage.position.as_str()) {
                        : passage.content.as_str()
                    }
                }
            }
        }
    )
}

/// Substitutes the placeholders left by [`story_data`]
///
/// Each placeholder is replaced once. The script goes in before the
/// stylesheet so placeholder text inside either is left alone.
///
/// [`story_data`]: fn.story_data.html
pub fn fill_placeholders(
    data: &str,
    story: &StoryFile,
    format_name: &str,
    format_version: &str,
) -> String {
    data.replacen(STORY_FORMAT, format_name, 1)
        .replacen(STORY_FORMAT_VERSION, format_version, 1)
        .replacen(STORY_JS, &story.js, 1)
        .replacen(STORY_CSS, &story.css, 1)
}
