// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The install lifecycle state machine (spec §4.9):
//!
//! ```text
//! Start -> OpenArchive -> Extract -> ParseMeta -> Classify ->
//!   PrivilegeCheck -> PreScript -> Mirror -> PostScript -> Cleanup -> Done
//! ```
//!
//! Every state transitions to `Cleanup` on failure except `OpenArchive`,
//! which fails before a scratch directory exists. [`inspect`] runs only the
//! read-only prefix (through `Classify`) for `--pkginfo`/`--query`, never
//! touching privilege, scripts, or the destination.

use std::path::PathBuf;

use crate::{
    archive, classify, metadata, mirror, privilege,
    model::{ArchiveKind, InstallMode, PackageInfo},
    script::{self, ScriptEcosystem, ScriptKind, ScriptStage, Verbosity},
    target, util, Error,
};

/// Options driving a full [`install`] invocation.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Path to the archive to install.
    pub archive_path: PathBuf,
    /// Raw `--target` spec, resolved by [`target::resolve_root`].
    pub target_spec: String,
    /// Script runner verbosity.
    pub verbosity: Verbosity,
}

/// Extracts and parses `archive_path` without installing anything: no
/// privilege check, no scripts, no mirroring. Used by `--pkginfo` and
/// `--query`. The scratch directory is always cleaned up before returning.
pub fn inspect(archive_path: &std::path::Path) -> crate::Result<PackageInfo> {
    let kind = ArchiveKind::from_path(archive_path)?;
    if !archive_path.exists() {
        return Err(Error::ArchiveNotFound(archive_path.to_path_buf()));
    }

    let scratch_dir = util::fresh_scratch_dir()?;
    let result = build_package_info(kind, archive_path, &scratch_dir);
    util::cleanup_scratch(&scratch_dir);
    result
}

/// Runs the full install lifecycle for `opts`.
pub fn install(opts: &InstallOptions) -> crate::Result<PackageInfo> {
    let kind = ArchiveKind::from_path(&opts.archive_path)?;
    if !opts.archive_path.exists() {
        return Err(Error::ArchiveNotFound(opts.archive_path.clone()));
    }

    let scratch_dir = util::fresh_scratch_dir()?;
    let result = run_install(kind, opts, &scratch_dir);
    util::cleanup_scratch(&scratch_dir);
    result
}

fn run_install(
    kind: ArchiveKind,
    opts: &InstallOptions,
    scratch_dir: &std::path::Path,
) -> crate::Result<PackageInfo> {
    let info = build_package_info(kind, &opts.archive_path, scratch_dir)?;

    let target_root = target::resolve_root(&opts.target_spec);
    let mode = classify::classify(&info, &target_root);

    let has_any_script =
        info.has_pre_native || info.has_post_native || info.has_pre_foreign || info.has_post_foreign;
    if let Some(reason) = privilege::elevation_reason(has_any_script, &mode) {
        if !privilege::is_elevated() {
            return Err(Error::NeedsElevation(reason));
        }
    }

    // Native takes precedence over foreign when both are present (spec §4.9).
    if info.has_pre_native {
        run_script(info.pre_native_script(), ScriptEcosystem::Native, ScriptStage::Pre, &info, opts)?;
    } else if info.has_pre_foreign {
        run_script(info.pre_foreign_script(), ScriptEcosystem::Foreign, ScriptStage::Pre, &info, opts)?;
    }

    if let InstallMode::CopyType { location } = &mode {
        std::fs::create_dir_all(location)?;
        mirror::mirror_payload(info.kind, &info.scratch_dir, location)?;
    }

    if info.has_post_native {
        run_script(info.post_native_script(), ScriptEcosystem::Native, ScriptStage::Post, &info, opts)?;
    } else if info.has_post_foreign {
        run_script(info.post_foreign_script(), ScriptEcosystem::Foreign, ScriptStage::Post, &info, opts)?;
    }

    Ok(info)
}

fn run_script(
    path: PathBuf,
    ecosystem: ScriptEcosystem,
    stage: ScriptStage,
    info: &PackageInfo,
    opts: &InstallOptions,
) -> crate::Result<()> {
    script::run(&path, ScriptKind { ecosystem, stage }, info, opts.verbosity)
}

/// Extract + ParseMeta: builds a [`PackageInfo`] for `archive_path`, already
/// extracted under `scratch_dir`. Shared by [`inspect`] and [`install`].
fn build_package_info(
    kind: ArchiveKind,
    archive_path: &std::path::Path,
    scratch_dir: &std::path::Path,
) -> crate::Result<PackageInfo> {
    archive::extract(archive_path, scratch_dir)?;

    let native_meta = match kind {
        ArchiveKind::Native => Some(metadata::parse_native(scratch_dir)?),
        ArchiveKind::Foreign => None,
    };
    let foreign_meta = match kind {
        ArchiveKind::Foreign => metadata::parse_foreign(scratch_dir)?,
        ArchiveKind::Native => None,
    };

    let payload_files = mirror::collect_payload_files(kind, scratch_dir);

    let info = PackageInfo {
        kind,
        archive_path: archive_path.to_path_buf(),
        scratch_dir: scratch_dir.to_path_buf(),
        native_meta,
        foreign_meta,
        has_pre_native: scratch_dir.join("scripts").join("preinstall.ps1").exists(),
        has_post_native: scratch_dir.join("scripts").join("postinstall.ps1").exists(),
        has_pre_foreign: scratch_dir
            .join("tools")
            .join("chocolateyBeforeInstall.ps1")
            .exists(),
        has_post_foreign: scratch_dir
            .join("tools")
            .join("chocolateyInstall.ps1")
            .exists(),
        payload_files,
    };

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Write};
    use zip::write::FileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut buf);
            let mut writer = zip::ZipWriter::new(cursor);
            for (name, data) in entries {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn inspect_reads_metadata_without_installing_anything() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_bytes = build_zip(&[
            (
                "build-info.yaml",
                b"name: Demo\nversion: \"1.0\"\ninstall_location: C:\\Apps\\Demo\n",
            ),
            ("payload/hello.txt", b"hi"),
        ]);
        let archive_path = tmp.path().join("demo.pkg");
        fs::write(&archive_path, zip_bytes).unwrap();

        let info = inspect(&archive_path).unwrap();
        assert_eq!(info.query_name(), "Demo");
        assert_eq!(info.payload_files.len(), 1);
        assert!(!info.scratch_dir.exists());
    }

    #[test]
    fn install_copies_payload_and_cleans_up_scratch() {
        let tmp = tempfile::tempdir().unwrap();
        let dest_root = tmp.path().join("target");
        fs::create_dir_all(&dest_root).unwrap();

        let zip_bytes = build_zip(&[
            (
                "build-info.yaml",
                &format!(
                    "name: Demo\ninstall_location: {}\n",
                    dest_root.join("Demo").display()
                )
                .into_bytes(),
            ),
            ("payload/hello.txt", b"hi"),
        ]);
        let archive_path = tmp.path().join("demo.pkg");
        fs::write(&archive_path, zip_bytes).unwrap();

        let opts = InstallOptions {
            archive_path: archive_path.clone(),
            target_spec: "/".into(),
            verbosity: Verbosity::default(),
        };
        let info = install(&opts).unwrap();
        assert!(!info.scratch_dir.exists());
        assert_eq!(
            fs::read_to_string(dest_root.join("Demo").join("hello.txt")).unwrap(),
            "hi"
        );
    }

    #[test]
    fn script_only_mode_runs_without_mirroring() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_bytes = build_zip(&[("build-info.yaml", b"name: Demo\n")]);
        let archive_path = tmp.path().join("demo.pkg");
        fs::write(&archive_path, zip_bytes).unwrap();

        let opts = InstallOptions {
            archive_path,
            target_spec: "/".into(),
            verbosity: Verbosity::default(),
        };
        let info = install(&opts).unwrap();
        assert!(info.payload_files.is_empty());
    }
}
