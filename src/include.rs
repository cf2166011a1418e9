//! Loads a story file and splices in the files it includes
//!
//! Two mechanisms are expanded in a single forward scan, before any passage
//! is parsed:
//!
//! - Every non-blank line in the body of the `StoryIncludes` passage names a
//!   file whose lines replace it. The scan then skips over the spliced lines,
//!   so includes reached only this way are expanded one level deep.
//! - A `::@include <path>` line anywhere is replaced by the lines of `<path>`,
//!   each prefixed with the directive's indentation. The scan resumes at the
//!   first spliced line, so nested directives expand all the way down.
//!
//! Paths are resolved relative to the directory of the root story file. An
//! include that cannot be read is dropped with a warning.
use crate::error::CompileError;
use crate::passage;
use crate::source_files::{Line, SourceFiles};
use crate::warning::{Diagnostics, WarningKind};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Name of the passage listing files to include
pub const STORY_INCLUDES: &str = "StoryIncludes";

static INCLUDE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)::@include (.+)$").unwrap());

/// Reads the root story file and returns its fully expanded lines
pub fn load_story(
    path: &Path,
    files: &mut SourceFiles,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Line>, CompileError> {
    let id = files.load(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => CompileError::NotFound(path.to_path_buf()),
        _ => CompileError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(resolve_includes(files.lines(id), base_dir, files, diagnostics))
}

/// Expands both include mechanisms over `lines`
pub fn resolve_includes(
    mut lines: Vec<Line>,
    base_dir: &Path,
    files: &mut SourceFiles,
    diagnostics: &mut Diagnostics,
) -> Vec<Line> {
    let mut i = 0;
    let mut in_story_includes = false;

    while i < lines.len() {
        let directive = INCLUDE_DIRECTIVE
            .captures(lines[i].trimmed())
            .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()));

        if let Some((prefix, target)) = directive {
            let included = include_file(&lines[i], &target, true, base_dir, files, diagnostics);
            let spliced: Vec<Line> = included
                .into_iter()
                .map(|mut line| {
                    line.text.insert_str(0, &prefix);
                    line
                })
                .collect();
            debug!("Spliced {} lines from {}", spliced.len(), target);
            // Resume at the first spliced line so nested directives expand
            lines.splice(i..=i, spliced);
            continue;
        }

        if let Some(header) = passage::parse_header(&lines[i].text) {
            in_story_includes = header.name == STORY_INCLUDES;
        } else if in_story_includes && !lines[i].text.trim().is_empty() {
            let target = lines[i].text.trim().to_string();
            let included = include_file(&lines[i], &target, false, base_dir, files, diagnostics);
            let count = included.len();
            debug!("Spliced {} lines from {} via {}", count, target, STORY_INCLUDES);
            lines.splice(i..=i, included);
            i += count;
            continue;
        }

        i += 1;
    }

    lines
}

/// Loads the lines of an included file on behalf of the line naming it.
/// Returns no lines if the file cannot be read or, for an `inline` directive,
/// would include itself. Section includes expand one level and cannot loop.
fn include_file(
    from: &Line,
    target: &str,
    inline: bool,
    base_dir: &Path,
    files: &mut SourceFiles,
    diagnostics: &mut Diagnostics,
) -> Vec<Line> {
    let path: PathBuf = base_dir.join(target);

    if let Some(id) = files.lookup_id(&path).filter(|_| inline) {
        if id == from.origin.file || from.ancestry.contains(&id) {
            diagnostics.warn(
                WarningKind::IncludeCycle(path.display().to_string()),
                Some(from.origin),
            );
            return Vec::new();
        }
    }

    let id = match files.load(&path) {
        Ok(id) => id,
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            diagnostics.warn(
                WarningKind::MissingInclude(path.display().to_string()),
                Some(from.origin),
            );
            return Vec::new();
        }
    };

    let mut ancestry = from.ancestry.as_ref().clone();
    ancestry.push(from.origin.file);
    let ancestry = Rc::new(ancestry);

    files
        .lines(id)
        .into_iter()
        .map(|mut line| {
            line.ancestry = ancestry.clone();
            line
        })
        .collect()
}
