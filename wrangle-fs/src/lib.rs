//! Capability-based filesystem helpers shared by the wrangling crates.
//!
//! Every entry point takes a [`Utf8Path`] and resolves it against an ambient
//! base directory (`/` for absolute paths, `.` otherwise) so the callers never
//! touch `std::fs` directly.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Open an existing UTF-8 path for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create (or truncate) the file at `path`, creating missing parent
/// directories first.
pub fn create_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    dir.create(name.as_str())
}

/// Resolve the directory containing `path` and return it with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("path {path} has no file name")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Create `dir` and all of its missing ancestors.
pub fn ensure_dir_all(dir: &Utf8Path) -> io::Result<()> {
    if dir.as_str().is_empty() || dir == Utf8Path::new("/") {
        return Ok(());
    }
    let (base_dir, relative) = base_dir_and_relative(dir)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Ensure the directory that will contain `path` exists.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    path.parent().map_or(Ok(()), ensure_dir_all)
}

/// Whether `path` names an existing regular file.
///
/// A missing parent directory is reported as an error, a missing file as
/// `Ok(false)`.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Query metadata for `path`, following symlinks.
///
/// Paths without a final component, such as `.` or `/`, are resolved as
/// directories.
pub fn path_metadata(path: &Utf8Path) -> io::Result<fs_utf8::Metadata> {
    if path.file_name().is_none() {
        let dir = fs_utf8::Dir::open_ambient_dir(path, ambient_authority())?;
        return dir.dir_metadata();
    }
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str())
}

/// Split a directory path into an ambient base directory and the relative
/// remainder beneath it.
pub fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();

    let (base, relative) = match std_path.components().next() {
        // Drive or UNC prefix on Windows.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_path.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_path.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative =
        Utf8PathBuf::from_path_buf(relative).map_err(|_| io::Error::other("non-UTF-8 path"))?;

    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::io::{Read, Write};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp dir path is UTF-8")
    }

    #[rstest]
    fn creates_nested_parents_for_new_files(temp_dir: TempDir) {
        let path = utf8_root(&temp_dir).join("out/csv/nodes.csv");
        let mut file = create_utf8_file(&path).expect("create nested file");
        file.write_all(b"id\n").expect("write header");
        drop(file);

        let mut contents = String::new();
        open_utf8_file(&path)
            .expect("reopen file")
            .read_to_string(&mut contents)
            .expect("read back");
        assert_eq!(contents, "id\n");
        assert!(file_is_file(&path).expect("stat file"));
    }

    #[rstest]
    fn create_truncates_existing_files(temp_dir: TempDir) {
        let path = utf8_root(&temp_dir).join("ways.csv");
        create_utf8_file(&path)
            .expect("first create")
            .write_all(b"stale rows")
            .expect("write stale");
        drop(create_utf8_file(&path).expect("second create"));

        let mut contents = String::new();
        open_utf8_file(&path)
            .expect("reopen")
            .read_to_string(&mut contents)
            .expect("read back");
        assert!(contents.is_empty());
    }

    #[rstest]
    fn missing_files_are_not_files(temp_dir: TempDir) {
        let root = utf8_root(&temp_dir);
        assert!(!file_is_file(&root.join("absent.osm")).expect("stat missing file"));
        ensure_dir_all(&root.join("nested")).expect("create dir");
        assert!(!file_is_file(&root.join("nested")).expect("stat directory"));
    }

    #[rstest]
    fn metadata_distinguishes_files_from_directories(temp_dir: TempDir) {
        let root = utf8_root(&temp_dir);
        let file = root.join("extract.osm");
        drop(create_utf8_file(&file).expect("create file"));

        assert!(path_metadata(&file).expect("stat file").is_file());
        assert!(path_metadata(&root).expect("stat root").is_dir());
        assert!(path_metadata(Utf8Path::new(".")).expect("stat cwd").is_dir());
        let err = path_metadata(&root.join("absent")).expect_err("missing path");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    #[case("/", "")]
    #[case("relative/dir", "relative/dir")]
    fn splits_base_from_relative(#[case] input: &str, #[case] expected: &str) {
        let (_dir, relative) =
            base_dir_and_relative(Utf8Path::new(input)).expect("resolve base directory");
        assert_eq!(relative, Utf8PathBuf::from(expected));
    }
}
