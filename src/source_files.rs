//! Loaded story sources and the line records produced from them
use codespan_reporting::files::Files;
use log::trace;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The file and 1-based line number a line of source came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin {
    /// Id of the file in the [`SourceFiles`] it was loaded into
    ///
    /// [`SourceFiles`]: struct.SourceFiles.html
    pub file: usize,

    /// Line number, starting at 1
    pub line: usize,
}

/// A single line of story source along with where it came from
///
/// The text includes its trailing newline, if the file had one. Lines
/// spliced in by an indented include directive carry the directive's
/// indentation, but keep the origin of the line in the included file.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub origin: Origin,
    pub text: String,

    /// Ids of the files whose include directives led to this line, outermost
    /// first
    pub(crate) ancestry: Rc<Vec<usize>>,
}

impl Line {
    /// The text of the line without its line terminator
    pub fn trimmed(&self) -> &str {
        self.text.trim_end_matches(|c| c == '\n' || c == '\r')
    }
}

struct SourceFile {
    name: String,
    path: PathBuf,
    contents: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(name: String, path: PathBuf, contents: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(contents.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        SourceFile {
            name,
            path,
            contents,
            line_starts,
        }
    }
}

/// Every file read during a compile, kept so diagnostics can point back into
/// them. Each file is read at most once.
#[derive(Default)]
pub struct SourceFiles {
    files: Vec<SourceFile>,
}

impl SourceFiles {
    pub fn new() -> Self {
        SourceFiles::default()
    }

    /// Reads the file at `path`, returning its id. A file that was already
    /// loaded is not read again.
    pub fn load(&mut self, path: &Path) -> io::Result<usize> {
        if let Some(id) = self.lookup_id(path) {
            return Ok(id);
        }
        let contents = std::fs::read_to_string(path)?;
        trace!("Loaded {} ({} bytes)", path.display(), contents.len());
        Ok(self.push(path.display().to_string(), path.to_path_buf(), contents))
    }

    /// Adds an in-memory source under the given name, returning its id
    pub fn add<N: Into<String>, S: Into<String>>(&mut self, name: N, contents: S) -> usize {
        let name = name.into();
        let path = PathBuf::from(&name);
        self.push(name, path, contents.into())
    }

    fn push(&mut self, name: String, path: PathBuf, contents: String) -> usize {
        self.files.push(SourceFile::new(name, path, contents));
        self.files.len() - 1
    }

    /// Looks up the id of an already loaded file by path
    pub fn lookup_id(&self, path: &Path) -> Option<usize> {
        self.files.iter().position(|file| file.path == path)
    }

    /// Looks up the display name of a loaded file
    pub fn lookup_name(&self, id: usize) -> Option<&str> {
        self.files.get(id).map(|file| file.name.as_str())
    }

    /// Number of files loaded so far
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Produces the line records for a loaded file, numbered from 1
    pub fn lines(&self, id: usize) -> Vec<Line> {
        let ancestry = Rc::new(Vec::new());
        self.files
            .get(id)
            .map(|file| {
                file.contents
                    .split_inclusive('\n')
                    .enumerate()
                    .map(|(idx, text)| Line {
                        origin: Origin {
                            file: id,
                            line: idx + 1,
                        },
                        text: text.to_string(),
                        ancestry: ancestry.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Formats an origin as `file:line`
    pub fn describe(&self, origin: Origin) -> String {
        format!(
            "{}:{}",
            self.lookup_name(origin.file).unwrap_or("<unknown>"),
            origin.line
        )
    }

    /// Byte range of the line an origin refers to, excluding its terminator
    pub fn span(&self, origin: Origin) -> Option<Range<usize>> {
        let file = self.files.get(origin.file)?;
        let range = self.line_range(origin.file, origin.line.checked_sub(1)?)?;
        let text = file.contents.get(range.clone())?;
        let len = text.trim_end_matches(|c| c == '\n' || c == '\r').len();
        Some(range.start..range.start + len)
    }
}

impl<'a> Files<'a> for SourceFiles {
    type FileId = usize;
    type Name = &'a str;
    type Source = &'a str;

    fn name(&'a self, id: Self::FileId) -> Option<Self::Name> {
        self.lookup_name(id)
    }

    fn source(&'a self, id: Self::FileId) -> Option<Self::Source> {
        self.files.get(id).map(|file| file.contents.as_str())
    }

    fn line_index(&'a self, id: Self::FileId, byte_index: usize) -> Option<usize> {
        self.files.get(id).and_then(|file| {
            file.line_starts
                .binary_search(&byte_index)
                .or_else(|idx: usize| -> Result<usize, usize> { Ok(idx - 1) })
                .ok()
        })
    }

    fn line_range(&'a self, id: Self::FileId, line_index: usize) -> Option<Range<usize>> {
        let file = self.files.get(id)?;
        let start = *file.line_starts.get(line_index)?;
        let end = file
            .line_starts
            .get(line_index + 1)
            .copied()
            .unwrap_or_else(|| file.contents.len());
        Some(start..end)
    }
}
