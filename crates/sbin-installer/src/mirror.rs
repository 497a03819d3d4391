// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Walks a payload subtree and mirrors it onto a destination directory with
//! directory creation and file overwrite (spec §4.4).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::model::ArchiveKind;

/// Metadata sub-trees excluded from foreign copy-type mirroring.
const FOREIGN_EXCLUDED_DIRS: &[&str] = &["_rels", "package", "tools"];

/// The directory that holds the payload for `kind`, relative to the scratch root.
///
/// Native packages carry their payload under `payload/`; foreign packages have
/// no separate payload directory, the scratch root itself is filtered instead.
pub fn payload_root(kind: ArchiveKind, scratch_root: &Path) -> PathBuf {
    match kind {
        ArchiveKind::Native => scratch_root.join("payload"),
        ArchiveKind::Foreign => scratch_root.to_path_buf(),
    }
}

/// Whether `rel` (relative to the scratch root) is part of the fixed set of
/// metadata sub-trees or the foreign metadata document itself, and so must be
/// excluded from a foreign copy-type mirror.
fn is_foreign_excluded(rel: &Path) -> bool {
    let in_excluded_dir = rel.components().next().is_some_and(|c| {
        let std::path::Component::Normal(name) = c else {
            return false;
        };
        FOREIGN_EXCLUDED_DIRS
            .iter()
            .any(|d| name.eq_ignore_ascii_case(d))
    });
    let is_nuspec = rel
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("nuspec"))
        .unwrap_or(false);
    in_excluded_dir || is_nuspec
}

/// Lists payload-relative file paths under `kind`'s payload root at
/// `scratch_root`, in a deterministic depth-first order. Returns an empty list
/// if the payload root doesn't exist (e.g. a native archive with no `payload/`).
pub fn collect_payload_files(kind: ArchiveKind, scratch_root: &Path) -> Vec<PathBuf> {
    let root = payload_root(kind, scratch_root);
    if !root.exists() {
        return Vec::new();
    }

    WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(&root).ok().map(Path::to_path_buf))
        .filter(|rel| kind != ArchiveKind::Foreign || !is_foreign_excluded(rel))
        .collect()
}

/// Copies every payload-relative file onto `dest`, creating directories as
/// needed and overwriting existing destination files. Returns the number of
/// files copied.
#[tracing::instrument(level = "trace", skip(scratch_root))]
pub fn mirror_payload(kind: ArchiveKind, scratch_root: &Path, dest: &Path) -> crate::Result<u64> {
    let root = payload_root(kind, scratch_root);
    let mut count = 0u64;

    for rel in collect_payload_files(kind, scratch_root) {
        let src = root.join(&rel);
        let out = dest.join(&rel);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&src, &out)?;
        count += 1;
    }

    Ok(count)
}
