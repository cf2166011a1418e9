//! Story formats, read from their `format.js`
use serde::{Deserialize, Serialize};

use color_eyre::Result;
use eyre::{eyre, WrapErr};

use std::path::Path;

pub const STORY_NAME: &str = "{{STORY_NAME}}";
pub const STORY_DATA: &str = "{{STORY_DATA}}";

fn default_name() -> String {
    "Untitled Story Format".to_string()
}

/// The parts of a Twine 2 story format the compiler needs
#[derive(Debug, Serialize, Deserialize)]
pub struct StoryFormat {
    #[serde(default = "default_name")]
    pub name: String,

    pub version: String,

    /// HTML template holding the `{{STORY_NAME}}` and `{{STORY_DATA}}`
    /// placeholders
    pub source: String,
}

impl StoryFormat {
    pub fn parse(file_path: &Path) -> Result<StoryFormat> {
        let contents = std::fs::read_to_string(file_path)?;
        StoryFormat::from_source(&contents)
    }

    /// Extracts the JSON blob passed to `window.storyFormat(...)`
    pub fn from_source(contents: &str) -> Result<StoryFormat> {
        let start = contents
            .find('{')
            .ok_or_else(|| eyre!("Could not find Twine2 JSON blob"))?;
        let end = if contents.contains("harlowe") {
            contents.rfind(",\"setup\":")
        } else {
            contents.rfind('}')
        }
        .ok_or_else(|| eyre!("Could not find Twine2 JSON blob"))?;

        let mut json_blob_contents = contents[start..end].to_owned();
        json_blob_contents.push('}');

        let f = serde_json::from_str(&json_blob_contents)
            .wrap_err_with(|| "Failed to parse story format JSON")?;
        Ok(f)
    }

    /// Places the story name and filled story data into the format's template
    pub fn render(&self, story_name: &str, story_data: &str) -> String {
        self.source
            .replace(STORY_NAME, story_name)
            .replace(STORY_DATA, story_data)
    }
}
