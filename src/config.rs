use clap::{crate_authors, crate_description, crate_name, crate_version};
use clap::{App, Arg};
use color_eyre::Result;
use eyre::eyre;
use eyre::WrapErr;
use json_comments::StripComments;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;

use termcolor::ColorChoice;

use std::path::{Path, PathBuf};

/// Settings for one run, merged from the config file and the command line
pub struct Config {
    /// Stop after reporting problems
    pub linting: bool,

    /// True if the story data should be written without a story format
    pub export: bool,

    /// True if the known story formats should be listed instead of compiling
    pub list_formats: bool,

    /// The root story file
    pub input: Option<PathBuf>,

    /// Story format name or path given on the command line
    pub format: Option<String>,

    /// Known story formats, by name
    pub formats: HashMap<String, PathBuf>,

    /// Allow and deny lists per format, applied by [`select_format`]
    ///
    /// [`select_format`]: #method.select_format
    pub format_configs: HashMap<String, FormatConfig>,

    /// Where to write the html, if not `<story name>.html`
    pub output_file: Option<String>,

    /// Open the written file in the default browser
    pub should_open: bool,

    /// Warning names that are not reported
    pub allowed: Vec<String>,

    /// Warning names that fail the run
    pub denied: Vec<String>,

    /// Color choice for terminal output
    pub use_color: ColorChoice,

    /// Print one line per problem instead of source snippets
    pub compact: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            linting: false,
            export: false,
            list_formats: false,
            input: None,
            format: None,
            formats: HashMap::new(),
            format_configs: HashMap::new(),
            output_file: None,
            should_open: false,
            allowed: Vec::new(),
            denied: Vec::new(),
            use_color: ColorChoice::Never,
            compact: false,
        }
    }
}

impl Config {
    /// Reads the [`ConfigFile`] and the [`CliConfig`] and merges them
    ///
    /// [`CliConfig`]: struct.CliConfig.html
    /// [`ConfigFile`]: struct.ConfigFile.html
    pub fn build() -> Result<Self> {
        let config_file = ConfigFile::load()?;
        let cli_config = CliConfig::from_args();
        Ok(Config::layer(config_file, cli_config))
    }

    /// Creates a unified `Config` from the given [`ConfigFile`] and
    /// [`CliConfig`]
    ///
    /// Allow and deny lists are the command line's followed by the config
    /// file's `default` entry. The entry for the story format is added once
    /// the story is compiled, see [`select_format`].
    ///
    /// [`select_format`]: #method.select_format
    /// [`CliConfig`]: struct.CliConfig.html
    /// [`ConfigFile`]: struct.ConfigFile.html
    pub fn layer(config_file: ConfigFile, cli_config: CliConfig) -> Self {
        let mut allowed = cli_config.allowed;
        let mut denied = cli_config.denied;
        if let Some(layer) = config_file.format_configs.get("default") {
            allowed.extend(layer.allow.iter().cloned());
            denied.extend(layer.deny.iter().cloned());
        }

        Config {
            linting: cli_config.linting,
            export: cli_config.export,
            list_formats: cli_config.list_formats,
            input: cli_config.input,
            format: cli_config.format,
            formats: config_file.formats,
            format_configs: config_file.format_configs,
            output_file: cli_config.output_file,
            should_open: cli_config.should_open,
            allowed,
            denied,
            use_color: cli_config.use_color,
            compact: cli_config.compact,
        }
    }

    /// Appends the allow and deny lists of the format the story builds with
    ///
    /// As with [`format_file`], the story's own choice wins over the command
    /// line.
    ///
    /// [`format_file`]: #method.format_file
    pub fn select_format(&mut self, story_format: Option<&str>) {
        let name = match story_format.or_else(|| self.format.as_deref()) {
            Some(name) => name.to_string(),
            None => return,
        };
        if let Some(layer) = self.format_configs.get(&name) {
            debug!("Applying warning policy for format {}", name);
            self.allowed.extend(layer.allow.iter().cloned());
            self.denied.extend(layer.deny.iter().cloned());
        }
    }

    /// The story format file to compile with
    ///
    /// A format chosen by the story itself wins over the command line. Names
    /// of known formats map to their `format.js`; anything else is a path.
    pub fn format_file(&self, story_format: Option<&str>) -> PathBuf {
        story_format
            .or_else(|| self.format.as_deref())
            .map(|f| self.formats.get(f).cloned().unwrap_or_else(|| f.into()))
            .unwrap_or_else(|| "format.js".into())
    }
}

#[derive(Debug, Deserialize)]
pub struct FormatConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigFileInternal {
    pub format_paths: Vec<String>,
    pub format_configs: HashMap<String, FormatConfig>,
}

/// Stores format paths and settings parsed from the tweeforge config file
#[derive(Debug, Default)]
pub struct ConfigFile {
    /// Known story formats, keyed by the name of the directory holding their
    /// `format.js`
    pub formats: HashMap<String, std::path::PathBuf>,

    /// Allow and deny lists per format name, plus `default`
    pub format_configs: HashMap<String, FormatConfig>,
}

const DEFAULT_CONFIG: &str = r#"// This file defines the configuration for tweeforge
// It is mostly standard JSON, but supports //, /**/, and # style comments.
//
// For path related configuration, tweeforge defines several special variables
// that can be used to specify locations:
// * $TWEEFORGE_BIN_DIR: directory in which the tweeforge executable is located
// * $TWEEFORGE_DATA_DIR: tweeforge's system data dir (OS-specific)
// * $PWD: directory from which tweeforge is being invoked
// * $HOME: user's home directory (~ is not currently supported)
//
// Arbitrary environment variables are not currently supported
{
  // Directories to search for story formats in. Each format lives in its own
  // directory containing a format.js, and is known by the directory's name
  "format_paths": [
    "$TWEEFORGE_DATA_DIR/storyformats",
    "$TWEEFORGE_BIN_DIR/storyformats",
    "$HOME/.storyformats",
    "$PWD/storyformats"
  ],
  "format_configs": {
    // This is the default configuration which other configurations will be
    // layered over. Items in story format-specific chunks are appended to
    // the values given here.
    "default": {
      // Warnings to ignore ("allow"), e.g. "MissingIfid"
      "allow": [],
      // Warnings to treat as errors ("deny"), e.g. "DuplicatePassage"
      "deny": []
    }
  }
}"#;

/// Replaces the `$VARIABLES` understood in format paths
fn expand_path_variables(p: &str) -> Result<String> {
    let mut path = p.to_string();

    // Loop over any variables to replace them
    while let Some(start) = path.find('$') {
        let end = path[start..]
            .find('/')
            .map(|pos| start + pos)
            .unwrap_or_else(|| path.len());

        // Including the $
        let var = path[start..end].to_string();

        // Excluding the $
        let replace = match &var[1..] {
            "HOME" => dirs_next::home_dir().ok_or_else(|| eyre!("Failed to get HOME")),
            "PWD" => std::env::current_dir().wrap_err_with(|| "Failed to get PWD"),
            "TWEEFORGE_BIN_DIR" => match std::env::current_exe() {
                Ok(ok) => ok
                    .parent()
                    .map(|p| p.to_path_buf())
                    .ok_or_else(|| eyre!("Failed to get tweeforge executable's parent")),
                Err(err) => Err(err).wrap_err_with(|| "Failed to get TWEEFORGE_BIN_DIR"),
            },
            "TWEEFORGE_DATA_DIR" => dirs_next::data_dir()
                .map(|d| d.join("tweeforge"))
                .ok_or_else(|| eyre!("Failed to get TWEEFORGE_DATA_DIR")),
            _ => Err(eyre!(
                "Arbitrary environment variables are not currently supported"
            )),
        }
        .map(|p| p.into_os_string().to_string_lossy().into_owned())
        .wrap_err_with(|| format!("Error while parsing {}", p))?;
        path = path.replace(&var, &replace);
    }

    Ok(path)
}

/// Finds `<dir>/<name>/format.js` files, keyed by `<name>`. Formats already in
/// `acc` are kept.
fn find_formats(dir: &Path, acc: &mut HashMap<String, PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        // Continue without error if the path simply doesn't exist
        return Ok(());
    }

    let formats_dir = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("Error while reading directory {}", dir.display()))?;
    for entry in formats_dir.flatten() {
        let format_path = entry.path();
        let format_file = format_path.join("format.js");
        if !format_file.is_file() {
            continue;
        }
        let dir_name = format_path
            .file_name()
            .ok_or_else(|| eyre!("Error getting directory name for path {}", dir.display()))?
            .to_string_lossy()
            .into_owned();
        acc.entry(dir_name).or_insert(format_file);
    }

    Ok(())
}

impl ConfigFile {
    /// Reads `tweeforge/config.json` from the user's config directory,
    /// writing the default there first if it is missing, then discovers the
    /// story formats under each configured path
    pub fn load() -> Result<Self> {
        let config_path = dirs_next::config_dir()
            .ok_or_else(|| eyre!("Error getting config directory"))?
            .join("tweeforge/config.json");

        let config_contents = if !config_path.exists() {
            if let Some(prefix) = config_path.parent() {
                std::fs::create_dir_all(prefix)
                    .wrap_err_with(|| format!("Error creating config directory: {:?}", prefix))?;
            }
            let mut config_file = File::create(&config_path)?;
            config_file.write_all(DEFAULT_CONFIG.as_bytes())?;

            DEFAULT_CONFIG.to_string()
        } else {
            std::fs::read_to_string(&config_path)
                .wrap_err_with(|| format!("Error reading config file {:?}", config_path))?
        };

        ConfigFile::from_json(&config_contents)
            .wrap_err_with(|| format!("Error in config file {:?}", config_path))
    }

    /// Parses config file contents and searches the format paths it lists
    pub fn from_json(contents: &str) -> Result<Self> {
        // Comments are not JSON
        let stripped = StripComments::new(contents.as_bytes());
        let cf: ConfigFileInternal = serde_json::from_reader(stripped)?;
        debug!("{:?}", cf);

        let mut formats = HashMap::new();
        for p in &cf.format_paths {
            let path = expand_path_variables(p)?;
            find_formats(Path::new(&path), &mut formats)?;
        }

        Ok(ConfigFile {
            formats,
            format_configs: cf.format_configs,
        })
    }
}

/// Options given on the command line
pub struct CliConfig {
    /// `--lint`: report problems without writing output
    pub linting: bool,

    /// If true, write story data without a story format
    pub export: bool,

    /// If true, list the known story formats then exit
    pub list_formats: bool,

    /// Root story file to lint/compile
    pub input: Option<PathBuf>,

    /// `--format`: name of a known format, or a path to a `format.js`
    pub format: Option<String>,

    /// `--output`
    pub output_file: Option<String>,

    /// `--open`
    pub should_open: bool,

    /// `--allow` names
    pub allowed: Vec<String>,

    /// `--deny` names
    pub denied: Vec<String>,

    /// `--color`: always, ansi, auto or never
    pub use_color: ColorChoice,

    /// `--compact`
    pub compact: bool,
}

impl CliConfig {
    /// Reads the process arguments
    pub fn from_args() -> Self {
        #[allow(deprecated, unknown_lints, dangerous_implicit_autorefs)]
        let m = App::new(crate_name!())
            .about(crate_description!())
            .author(crate_authors!("\n"))
            .version(crate_version!())
            .arg(
                Arg::with_name("allow")
                    .help("Warning names to ignore, or `all`. Wins over --deny")
                    .short("a")
                    .long("allow")
                    .takes_value(true)
                    .multiple(true),
            )
            .arg(
                Arg::with_name("color")
                    .help("When to color output: always, ansi, auto or never")
                    .long("color")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("compact")
                    .help("Prints one line per problem")
                    .long("compact"),
            )
            .arg(
                Arg::with_name("deny")
                    .help("Warning names that fail the build, or `all`")
                    .short("D")
                    .long("deny")
                    .takes_value(true)
                    .multiple(true),
            )
            .arg(
                Arg::with_name("export")
                    .help("Writes the story data without a story format")
                    .long("export")
                    .conflicts_with("lint"),
            )
            .arg(
                Arg::with_name("format")
                    .help("Sets the story format by name (e.g., harlowe-3) or file location")
                    .short("f")
                    .long("format")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("formats")
                    .help("Lists the story formats found in the configured format paths")
                    .long("formats"),
            )
            .arg(
                Arg::with_name("lint")
                    .help("Checks the story without writing any output")
                    .short("L")
                    .long("lint"),
            )
            .arg(
                Arg::with_name("open")
                    .help("Opens the written story in a browser")
                    .long("open")
                    .conflicts_with("lint"),
            )
            .arg(
                Arg::with_name("output")
                    .help("Sets the output file (default: <Story Title>.html)")
                    .short("o")
                    .long("output")
                    .takes_value(true)
                    .conflicts_with("lint"),
            )
            .arg(
                Arg::with_name("INPUT")
                    .help("Sets the root story file")
                    .required_unless("formats")
                    .index(1),
            )
            .get_matches();

        let linting = m.is_present("lint");
        let export = m.is_present("export");
        let list_formats = m.is_present("formats");
        let input = m.value_of("INPUT").map(PathBuf::from);
        let format = m.value_of("format").map(|s| s.to_string());
        let output_file = m.value_of("output").map(|s| s.to_string());
        let should_open = m.is_present("open");
        let allowed = m
            .values_of("allow")
            .unwrap_or_default()
            .map(|s| s.to_string())
            .collect();
        let denied = m
            .values_of("deny")
            .unwrap_or_default()
            .map(|s| s.to_string())
            .collect();
        let use_color = match m.value_of("color").unwrap_or("auto") {
            "always" => ColorChoice::Always,
            "ansi" => ColorChoice::AlwaysAnsi,
            "auto" => {
                if atty::is(atty::Stream::Stdout) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }
            }
            _ => ColorChoice::Never,
        };
        let compact = m.is_present("compact");

        CliConfig {
            linting,
            export,
            list_formats,
            input,
            format,
            output_file,
            should_open,
            allowed,
            denied,
            use_color,
            compact,
        }
    }
}
