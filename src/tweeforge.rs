//! Handles the actual running of the compiler

use crate::issue;
use crate::linter;
use crate::story_data;
use crate::BuildConfig;
use crate::Compilation;
use crate::Config;
use crate::PreprocessorRegistry;
use crate::StoryFile;
use crate::StoryFormat;

use color_eyre::Result;
use eyre::{eyre, WrapErr};

use log::info;

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

/// Runs the compiler
pub fn run() -> Result<()> {
    let mut config = Config::build()?;

    let mut stdout = StandardStream::stdout(config.use_color);

    if config.list_formats {
        let mut names: Vec<&String> = config.formats.keys().collect();
        names.sort();
        writeln!(stdout, "Known story formats:")?;
        for name in names {
            writeln!(stdout, "  {}", name)?;
        }
        return Ok(());
    }

    let input = config
        .input
        .as_ref()
        .ok_or_else(|| eyre!("No input file given"))?;

    let Compilation {
        story,
        config: build_config,
        files,
        mut diagnostics,
    } = StoryFile::compile(
        input,
        BuildConfig::default(),
        &PreprocessorRegistry::with_defaults(),
    );
    config.select_format(build_config.story_format.as_deref());

    let story = match story {
        Ok(story) => story,
        Err(e) => {
            issue::report(Some(e), diagnostics.into_vec(), &files, &config, &mut stdout)?;
            return Err(eyre!("Failed due to previous errors"));
        }
    };

    let links = linter::lint(&story, &mut diagnostics);
    info!("Linted {} links", links.len());

    if issue::report(None, diagnostics.into_vec(), &files, &config, &mut stdout)? {
        return Err(eyre!("Failed due to previous errors"));
    }

    if config.linting {
        return Ok(());
    }

    let story_data = story_data::story_data(&story, &build_config);
    let output = if config.export {
        let format_name = build_config.story_format.as_deref().unwrap_or("");
        story_data::fill_placeholders(&story_data, &story, format_name, "")
    } else {
        let format_file = config.format_file(build_config.story_format.as_deref());
        let story_format = StoryFormat::parse(&format_file).wrap_err_with(|| {
            format!("Failed to parse story format file: {:?}", &format_file)
        })?;
        let filled = story_data::fill_placeholders(
            &story_data,
            &story,
            &story_format.name,
            &story_format.version,
        );
        story_format.render(&build_config.story_name, &filled)
    };

    let file_name = match config.output_file.as_deref() {
        Some(output) if config.export => {
            let (path, matches_name) = export_path(output, &build_config.story_name);
            if !matches_name {
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
                write!(stdout, "Warning: ")?;
                stdout.reset()?;
                writeln!(
                    stdout,
                    "output file name {} does not match the story name {}",
                    path.display(),
                    build_config.story_name
                )?;
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).wrap_err_with(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
            path.display().to_string()
        }
        Some(output) => output.to_string(),
        None => format!("{}.html", build_config.story_name),
    };
    let mut file = File::create(&file_name)
        .wrap_err_with(|| format!("Failed to create output file {}", &file_name))?;
    writeln!(file, "{}", output)
        .wrap_err_with(|| format!("Failed to write output file {}", &file_name))?;

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(stdout, "Wrote {}", file_name)?;
    stdout.reset()?;

    if config.should_open {
        opener::open(&file_name)
            .wrap_err_with(|| format!("Failed to open output file {}", &file_name))?;
    }

    Ok(())
}

/// Where an export goes when `--output` is given
///
/// An existing directory receives `<story name>.html`. Otherwise the path is
/// used as is, and the flag says whether its file stem, less any `.html`,
/// matches the story name.
fn export_path(output: &str, story_name: &str) -> (PathBuf, bool) {
    let path = PathBuf::from(output);
    if path.is_dir() {
        return (path.join(format!("{}.html", story_name)), true);
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(".html").unwrap_or(&file_name);
    let matches_name = stem == story_name;
    (path, matches_name)
}
