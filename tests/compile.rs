use indoc::indoc;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tweeforge::{
    linter, story_data, BuildConfig, Compilation, CompileError, LinkStyle, PreprocessorRegistry,
    StoryFile,
};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn config() -> BuildConfig {
    let mut config = BuildConfig::default();
    config.set_ifid("7E4D1C2B-9A8F-4E3D-8C7B-6A5F4E3D2C1B");
    config
}

fn compile(root: &Path) -> Compilation {
    StoryFile::compile(root, config(), &PreprocessorRegistry::with_defaults())
}

fn rendered(root: &Path) -> String {
    let compilation = compile(root);
    let story = compilation.story.as_ref().unwrap();
    story_data::story_data(story, &compilation.config)
}

#[test]
fn ids_are_dense_in_first_seen_order() {
    let dir = TempDir::new().unwrap();
    let root = write(
        &dir,
        "story.tw",
        indoc! {"
            :: StoryTitle
            Ids
            :: Start
            a
            :: Style [stylesheet]
            p {}
            :: Middle
            b
            :: Code [script]
            x();
            :: End
            c
        "},
    );
    let data = rendered(&root);
    assert_eq!(data.matches("<tw-passagedata").count(), 3);
    let start = data.find("pid=\"1\" name=\"Start\"").unwrap();
    let middle = data.find("pid=\"2\" name=\"Middle\"").unwrap();
    let end = data.find("pid=\"3\" name=\"End\"").unwrap();
    assert!(start < middle && middle < end);
    assert!(!data.contains("name=\"Style\""));
    assert!(!data.contains("name=\"Code\""));
}

#[test]
fn recompiling_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    write(&dir, "part.tw", ":: Part [side]\nIncluded.\n");
    let root = write(
        &dir,
        "story.tw",
        ":: StoryIncludes\npart.tw\n:: Start\nHello [[Part]]\n",
    );
    assert_eq!(rendered(&root), rendered(&root));
}

#[test]
fn chained_includes_appear_once_with_provenance() {
    let dir = TempDir::new().unwrap();
    write(&dir, "c.tw", "C content\n");
    write(&dir, "b.tw", "::@include c.tw\n");
    let root = write(&dir, "a.tw", ":: Start\n::@include b.tw\n");

    let compilation = compile(&root);
    let story = compilation.story.unwrap();
    let start = story.passages.get("Start").unwrap();
    assert_eq!(start.content, "C content");
    assert_eq!(start.lines.len(), 1);
    let origin = start.lines[0].origin;
    assert!(compilation
        .files
        .lookup_name(origin.file)
        .unwrap()
        .ends_with("c.tw"));
    assert_eq!(origin.line, 1);
}

#[test]
fn redefinition_keeps_position_and_warns_once() {
    let dir = TempDir::new().unwrap();
    let root = write(
        &dir,
        "story.tw",
        ":: Start\n[[A]]\n:: A\nfirst\n:: B\nbee\n:: A\nsecond\n",
    );
    let compilation = compile(&root);
    assert_eq!(compilation.diagnostics.count("DuplicatePassage"), 1);
    let story = compilation.story.unwrap();
    let names: Vec<_> = story.passages.names().collect();
    assert_eq!(names, vec!["Start", "A", "B"]);
    let a = story.passages.get("A").unwrap();
    assert_eq!(a.content, "second");
    assert_eq!(a.pid, Some(2));
}

#[test]
fn stylesheets_collect_in_order() {
    let dir = TempDir::new().unwrap();
    let root = write(
        &dir,
        "story.tw",
        ":: One [stylesheet]\na {}\n:: Start\nx\n:: Two [stylesheet]\nb {}\n",
    );
    let compilation = compile(&root);
    let story = compilation.story.as_ref().unwrap();
    assert_eq!(story.css, "a {}\nb {}\n");
    assert_eq!(story.passages.get("One").unwrap().pid, None);
    let data = story_data::fill_placeholders(
        &story_data::story_data(story, &compilation.config),
        story,
        "Harlowe",
        "3.3.8",
    );
    assert!(data.contains("a {}\nb {}\n</style>"));
}

#[test]
fn lints_link_styles() {
    let dir = TempDir::new().unwrap();
    let root = write(
        &dir,
        "story.tw",
        ":: Start\n[[Go North]] [[Go->North]] [[North<-Go]] [[Go|North]]\n:: North\n",
    );
    let mut compilation = compile(&root);
    let story = compilation.story.unwrap();
    let links = linter::lint(&story, &mut compilation.diagnostics);
    let summary: Vec<_> = links
        .iter()
        .map(|l| (l.style, l.text.as_str(), l.dest.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (LinkStyle::Bare, "Go North", "Go North"),
            (LinkStyle::Arrow, "Go", "North"),
            (LinkStyle::ReverseArrow, "Go", "North"),
            (LinkStyle::Pipe, "Go", "North"),
        ]
    );
    assert!(compilation.diagnostics.is_empty());
}

#[test]
fn missing_include_warns_and_compiles() {
    let dir = TempDir::new().unwrap();
    let root = write(&dir, "story.tw", ":: Start\n::@include missing.tw\nStill here.\n");
    let compilation = compile(&root);
    assert_eq!(compilation.diagnostics.len(), 1);
    let warning = compilation.diagnostics.iter().next().unwrap();
    assert_eq!(warning.get_name(), "MissingInclude");
    assert!(warning.to_string().contains("missing.tw"));
    let story = compilation.story.unwrap();
    assert_eq!(story.passages.get("Start").unwrap().content, "Still here.");
}

#[test]
fn missing_root_aborts() {
    let dir = TempDir::new().unwrap();
    let compilation = compile(&dir.path().join("absent.tw"));
    assert!(matches!(compilation.story, Err(CompileError::NotFound(_))));
}

#[test]
fn configuration_passage_is_threaded_through() {
    let dir = TempDir::new().unwrap();
    let root = write(
        &dir,
        "story.tw",
        indoc! {"
            :: StoryTitle
            Harbour
            :: Config [twee2]
            format = SugarCube
            start = Dock
            :: Intro
            Waves.
            :: Dock
            Ropes.
        "},
    );
    let compilation = StoryFile::compile(&root, BuildConfig::default(), &PreprocessorRegistry::new());
    assert_eq!(compilation.config.story_name, "Harbour");
    assert_eq!(compilation.config.story_format.as_deref(), Some("SugarCube"));
    assert_eq!(compilation.diagnostics.count("MissingIfid"), 1);
    let story = compilation.story.as_ref().unwrap();
    assert_eq!(story.start_pid(), 2);
    let data = story_data::story_data(story, &compilation.config);
    assert!(data.contains("name=\"Harbour\" startnode=\"2\""));
}

#[test]
fn markdown_passages_are_preprocessed() {
    let dir = TempDir::new().unwrap();
    let root = write(&dir, "story.tw", ":: Start [markdown page]\n# Title\n");
    let compilation = compile(&root);
    let story = compilation.story.unwrap();
    let start = story.passages.get("Start").unwrap();
    assert_eq!(start.content, "<h1>Title</h1>");
    assert_eq!(start.tags, vec!["page"]);
}
