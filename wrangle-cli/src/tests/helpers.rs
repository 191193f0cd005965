//! Test helpers for composing scratch extracts and command invocations.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Small extract touched by two users.
pub(super) const EXTRACT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="41.88" lon="-87.63" user="ann" uid="7" version="1" changeset="11" timestamp="2017-01-01T00:00:00Z">
    <tag k="addr:street" v="123 Main Ave"/>
  </node>
  <node id="3" lat="41.89" lon="-87.64" user="bob" uid="8" version="1" changeset="12" timestamp="2017-01-02T00:00:00Z"/>
  <way id="2" user="ann" uid="7" version="1" changeset="13" timestamp="2017-01-03T00:00:00Z">
    <nd ref="1"/>
    <nd ref="3"/>
    <tag k="contact:phone" v="+1 312/555/0100"/>
  </way>
</osm>
"#;

/// Scratch directory that owns the extract and every artefact derived from it.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn extract(&self) -> Utf8PathBuf {
        self.root.join("city.osm")
    }

    pub(super) fn csv_dir(&self) -> Utf8PathBuf {
        self.root.join("csv")
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("city.db")
    }

    pub(super) fn write_extract(&self) -> Utf8PathBuf {
        let path = self.extract();
        write_utf8(&path, EXTRACT.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write file");
}

/// Parse `args` as a `wrangle` invocation and run it, capturing stdout.
pub(super) fn invoke<I, S>(args: I) -> (Result<(), CliError>, String)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut invocation = vec!["wrangle".to_owned()];
    invocation.extend(args.into_iter().map(Into::into));
    let mut out = Vec::new();
    let outcome = Cli::try_parse_from(invocation)
        .map_err(CliError::ArgumentParsing)
        .and_then(|cli| dispatch(cli.command, &mut out));
    let text = String::from_utf8(out).expect("utf-8 output");
    (outcome, text)
}
