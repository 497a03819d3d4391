// Copyright 2019-2023 Tauri Programme within The Commons Conservancy
// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Opens an archive, validates its central directory, and extracts it to a
//! scratch directory. Rejects zip-slip entries and symbolic links.

use std::{
    fs::{self, File},
    io::copy,
    path::{Component, Path, PathBuf},
};

use zip::ZipArchive;

use crate::Error;

/// Opens `archive_path`, validates it, and extracts every entry under `scratch_dir`,
/// preserving relative paths.
///
/// Fails with [`Error::ArchiveNotFound`] if the path doesn't exist, [`Error::CorruptArchive`]
/// if the central directory can't be located or entries are malformed, and
/// [`Error::MalformedEntry`] for any entry whose normalized path would escape
/// `scratch_dir` or that is a symbolic link.
#[tracing::instrument(level = "trace", skip(scratch_dir))]
pub fn extract(archive_path: &Path, scratch_dir: &Path) -> crate::Result<()> {
    if !archive_path.exists() {
        return Err(Error::ArchiveNotFound(archive_path.to_path_buf()));
    }

    let size = fs::metadata(archive_path)?.len();
    let file = File::open(archive_path)?;
    let mut zip = ZipArchive::new(file).map_err(|e| Error::CorruptArchive {
        path: archive_path.to_path_buf(),
        size,
        reason: e.to_string(),
    })?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| Error::CorruptArchive {
            path: archive_path.to_path_buf(),
            size,
            reason: e.to_string(),
        })?;

        const S_IFLNK: u32 = 0o120000;
        if let Some(mode) = entry.unix_mode() {
            if mode & 0o170000 == S_IFLNK {
                return Err(Error::MalformedEntry(entry.name().to_string()));
            }
        }

        let name = entry.name().to_string();
        let dest = confined_join(scratch_dir, &name)?;

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&dest)?;
        copy(&mut entry, &mut out)?;
    }

    Ok(())
}

/// Joins `name` onto `root`, rejecting `..` segments, absolute components, and
/// any other normalization that would resolve outside `root`. This is the
/// zip-slip defense required by spec §4.1.
fn confined_join(root: &Path, name: &str) -> crate::Result<PathBuf> {
    let mut dest = root.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => dest.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::MalformedEntry(name.to_string()));
            }
        }
    }
    if !dest.starts_with(root) {
        return Err(Error::MalformedEntry(name.to_string()));
    }
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut buf);
            let mut writer = zip::ZipWriter::new(cursor);
            for (name, data) in entries {
                writer
                    .start_file(*name, FileOptions::default())
                    .unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn extracts_entries_preserving_relative_paths() {
        let zip_bytes = build_zip(&[
            ("build-info.yaml", b"name: demo\n"),
            ("payload/hello.txt", b"hi"),
        ]);
        let tmp = tempfile::tempdir().unwrap();
        let archive_path = tmp.path().join("demo.pkg");
        fs::write(&archive_path, &zip_bytes).unwrap();

        let scratch = tmp.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        extract(&archive_path, &scratch).unwrap();

        assert!(scratch.join("build-info.yaml").exists());
        assert_eq!(
            fs::read_to_string(scratch.join("payload/hello.txt")).unwrap(),
            "hi"
        );
    }

    #[test]
    fn rejects_parent_dir_traversal_entries() {
        // zip crate's own writer rejects literal `..` in start_file names via
        // enclosed_name-style checks on some versions, so we build the raw
        // traversal case through the confinement helper directly.
        let root = Path::new("/scratch/abc");
        assert!(confined_join(root, "../../etc/passwd").is_err());
        assert!(confined_join(root, "ok/nested/file.txt").is_ok());
        assert!(confined_join(root, "/absolute/path").is_err());
    }

    #[test]
    fn missing_archive_is_archive_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.pkg");
        let scratch = tmp.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        let err = extract(&missing, &scratch).unwrap_err();
        assert!(matches!(err, Error::ArchiveNotFound(_)));
    }
}
