//! TOML fixture corpus for end-to-end diff cases.
//!
//! Each `*.toml` file in a fixture directory holds one or more `[[case]]`
//! tables:
//!
//! ```toml
//! format = "pagediff-fixture-v1"
//!
//! [[case]]
//! id = "render-changed-word"
//! strategy = "html_diff_render"
//! a = "<p>Deleted</p>"
//! b = "<p>Added</p>"
//! contains = ["<del>", "Deleted"]
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const FIXTURE_FORMAT_V1: &str = "pagediff-fixture-v1";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    format: String,
    #[serde(default, rename = "case")]
    cases: Vec<FixtureCase>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCase {
    pub id: String,
    pub strategy: String,
    pub a: String,
    pub b: String,
    /// Substrings the output must contain.
    #[serde(default)]
    pub contains: Vec<String>,
    /// Substrings the output must not contain.
    #[serde(default)]
    pub absent: Vec<String>,
    /// Exact expected output, compared line by line.
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(skip)]
    pub source: PathBuf,
}

pub fn parse_fixture_str(content: &str, source: &Path) -> Vec<FixtureCase> {
    let file: FixtureFile = toml::from_str(content)
        .unwrap_or_else(|err| panic!("failed to parse fixture TOML {source:?}: {err}"));
    assert_eq!(
        file.format, FIXTURE_FORMAT_V1,
        "unsupported fixture format in {source:?}"
    );
    assert!(!file.cases.is_empty(), "fixture file {source:?} has no cases");
    file.cases
        .into_iter()
        .map(|mut case| {
            case.source = source.to_path_buf();
            case
        })
        .collect()
}

/// Loads every `*.toml` file under `dir`, in file name order. Panics on
/// unreadable files, bad formats and duplicate case ids.
pub fn load_fixture_dir(dir: &Path) -> Vec<FixtureCase> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read fixture dir {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read fixture file {path:?}: {err}"));
        for case in parse_fixture_str(&content, &path) {
            assert!(
                seen.insert(case.id.clone()),
                "duplicate fixture id '{}' in {path:?}",
                case.id
            );
            out.push(case);
        }
    }
    out
}
