//! Filters, orders and prints the problems found in a story
use crate::error::CompileError;
use crate::source_files::{Origin, SourceFiles};
use crate::warning::{Warning, WarningKind};
use crate::Config;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::term;
use color_eyre::Result;
use std::cmp::Ordering;
use std::io::Write;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

pub enum Issue {
    Error(CompileError),
    Warning { warning: Warning, denied: bool },
}

impl Issue {
    fn get_name(&self) -> &str {
        match self {
            Issue::Error(e) => e.get_name(),
            Issue::Warning { warning: w, .. } => w.get_name(),
        }
    }

    fn get_message(&self) -> String {
        match self {
            Issue::Error(e) => format!("{}", e),
            Issue::Warning { warning, .. } => format!("{}", warning.kind),
        }
    }

    fn get_context(&self) -> Option<Origin> {
        match self {
            Issue::Error(e) => e.origin(),
            Issue::Warning { warning, .. } => warning.context,
        }
    }

    fn get_referent(&self) -> Option<Origin> {
        match self {
            Issue::Error(_) => None,
            Issue::Warning { warning, .. } => warning.get_referent(),
        }
    }

    fn is_error(&self) -> bool {
        matches!(self, Issue::Error(_) | Issue::Warning { denied: true, .. })
    }

    fn help_message(&self) -> Option<String> {
        match self {
            Issue::Warning { warning, .. } => match &warning.kind {
                WarningKind::MissingStartPassage {
                    suggestion: Some(suggestion),
                    ..
                } => Some(format!(
                    "Found passage with similar name: \"{}\"",
                    suggestion
                )),
                WarningKind::UnterminatedQuote { .. } | WarningKind::UnquotedQuote { .. } => {
                    Some("Escape quotes inside quoted link text with a backslash".to_string())
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn report(&self, files: &SourceFiles) -> Diagnostic<usize> {
        let diagnostic = match self {
            Issue::Warning { warning, denied: false } if warning.kind.is_notice() => {
                Diagnostic::note()
            }
            _ if self.is_error() => Diagnostic::error(),
            _ => Diagnostic::warning(),
        }
        .with_message(self.get_message())
        .with_code(self.get_name());

        let mut labels = Vec::new();
        if let Some(origin) = self.get_context() {
            if let Some(range) = files.span(origin) {
                labels.push(Label::primary(origin.file, range));
            }
        }
        if let Some(origin) = self.get_referent() {
            if let Some(range) = files.span(origin) {
                labels.push(
                    Label::secondary(origin.file, range)
                        .with_message("Previously defined here. Overwritten."),
                );
            }
        }

        let notes = self.help_message().into_iter().collect();
        diagnostic.with_labels(labels).with_notes(notes)
    }
}

/// Applies the allow and deny lists to the warnings and orders the issues
/// by where they occur. Returns true if any issue is an error.
pub fn filter_and_sort_issues(
    error: Option<CompileError>,
    mut warnings: Vec<Warning>,
    config: &Config,
) -> (Vec<Issue>, bool) {
    let mut issues = Vec::new();
    let mut is_err = false;

    let all = "all".to_string();
    let allow_all = config.allowed.contains(&all);
    let deny_all = config.denied.contains(&all);
    for warning in warnings.drain(..) {
        let name = warning.get_name().to_string();
        if allow_all || config.allowed.contains(&name) {
            continue;
        }
        let denied = deny_all || config.denied.contains(&name);
        if denied {
            is_err = true;
        }
        issues.push(Issue::Warning { warning, denied });
    }

    if let Some(e) = error {
        is_err = true;
        issues.push(Issue::Error(e));
    }

    // Stable, so issues on the same line keep the order they were raised in
    issues.sort_by(|left, right| match (left.get_context(), right.get_context()) {
        (None, None) => Ordering::Equal,
        (None, _) => Ordering::Less,
        (_, None) => Ordering::Greater,
        (Some(l), Some(r)) => l.cmp(&r),
    });

    (issues, is_err)
}

pub fn print_issue(issue: &Issue, files: &SourceFiles, stdout: &mut StandardStream) -> Result<()> {
    let kind = match issue {
        _ if issue.is_error() => {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            "Error"
        }
        Issue::Warning { warning, .. } if warning.kind.is_notice() => {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
            "Notice"
        }
        _ => {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
            "Warning"
        }
    };
    write!(stdout, "{}: ", kind)?;
    stdout.reset()?;
    match issue.get_context() {
        Some(origin) => writeln!(
            stdout,
            "{}: {}",
            files.describe(origin),
            issue.get_message()
        )?,
        None => writeln!(stdout, "{}", issue.get_message())?,
    }
    Ok(())
}

/// Prints the error and warnings of a compile in the configured style.
/// Returns true if the run should fail.
pub fn report(
    error: Option<CompileError>,
    warnings: Vec<Warning>,
    files: &SourceFiles,
    config: &Config,
    stdout: &mut StandardStream,
) -> Result<bool> {
    let (issues, is_err) = filter_and_sort_issues(error, warnings, config);

    if config.compact {
        for issue in &issues {
            print_issue(issue, files, stdout)?;
        }
    } else {
        let term_config = term::Config::default();
        for issue in &issues {
            let diagnostic = issue.report(files);
            term::emit(&mut stdout.lock(), &term_config, files, &diagnostic)?;
        }
    }

    // Force reset of color
    stdout.reset()?;
    stdout.flush()?;

    Ok(is_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::diagnostic::Severity;

    fn warning(kind: WarningKind, line: Option<usize>) -> Warning {
        Warning::new(kind, line.map(|line| Origin { file: 0, line }))
    }

    fn missing(path: &str, line: Option<usize>) -> Warning {
        warning(WarningKind::MissingInclude(path.to_string()), line)
    }

    #[test]
    fn allow_and_deny_lists() {
        let mut config = Config::default();
        config.allowed = vec!["UnquotedQuote".to_string()];
        config.denied = vec!["MissingInclude".to_string()];

        let warnings = vec![
            warning(
                WarningKind::UnquotedQuote {
                    text: "'a'b'".to_string(),
                    quote: '\'',
                },
                Some(1),
            ),
            missing("x.tw", Some(2)),
            warning(WarningKind::UnquotedSpecialCharacters("]".to_string()), Some(3)),
        ];
        let (issues, is_err) = filter_and_sort_issues(None, warnings, &config);
        assert!(is_err);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].is_error());
        assert!(!issues[1].is_error());
    }

    #[test]
    fn allow_all_silences_everything() {
        let mut config = Config::default();
        config.allowed = vec!["all".to_string()];
        let (issues, is_err) = filter_and_sort_issues(None, vec![missing("x", None)], &config);
        assert!(issues.is_empty());
        assert!(!is_err);
    }

    #[test]
    fn issues_sorted_by_origin() {
        let config = Config::default();
        let warnings = vec![
            missing("late", Some(9)),
            missing("none", None),
            missing("early", Some(2)),
        ];
        let (issues, is_err) = filter_and_sort_issues(None, warnings, &config);
        assert!(!is_err);
        let lines: Vec<_> = issues
            .iter()
            .map(|i| i.get_context().map(|o| o.line))
            .collect();
        assert_eq!(lines, vec![None, Some(2), Some(9)]);
    }

    #[test]
    fn duplicate_report_has_both_labels() {
        let mut files = SourceFiles::new();
        files.add("story.tw", ":: A\none\n:: A\ntwo\n");
        let warning = Warning::new(
            WarningKind::DuplicatePassage {
                name: "A".to_string(),
                first: "story.tw:1".to_string(),
                second: "story.tw:3".to_string(),
            },
            Some(Origin { file: 0, line: 3 }),
        )
        .with_referent(Origin { file: 0, line: 1 });
        let diagnostic = Issue::Warning {
            warning,
            denied: false,
        }
        .report(&files);
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.labels.len(), 2);
        assert_eq!(diagnostic.labels[0].range, 9..13);
        assert_eq!(diagnostic.labels[1].range, 0..4);
    }

    #[test]
    fn notices_are_notes() {
        let files = SourceFiles::new();
        let diagnostic = Issue::Warning {
            warning: Warning::new(WarningKind::MissingIfid("X".to_string()), None),
            denied: false,
        }
        .report(&files);
        assert_eq!(diagnostic.severity, Severity::Note);
        assert!(diagnostic.labels.is_empty());
    }
}
