// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The uniform value types the rest of the engine is built around: [`ArchiveKind`],
//! [`PackageInfo`] and its two metadata shapes, and [`InstallMode`].

use std::path::PathBuf;

use serde::Deserialize;

use crate::Error;

/// Which of the two archive layouts this invocation is dealing with.
///
/// Derived from the archive's file extension, case-insensitive: `.pkg` is native,
/// `.nupkg` is foreign. Any other extension is a [`Error::BadInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// This tool's own package layout (`build-info.yaml` + `payload/` + `scripts/`).
    Native,
    /// The third-party package-manager layout (`*.nuspec` + `lib/`/`content/` + `tools/`).
    Foreign,
}

impl ArchiveKind {
    /// Classifies an archive path by its extension.
    pub fn from_path(path: &std::path::Path) -> crate::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pkg") => Ok(ArchiveKind::Native),
            Some("nupkg") => Ok(ArchiveKind::Foreign),
            Some(other) => Err(Error::BadInput(format!(
                "unsupported archive extension `.{other}`"
            ))),
            None => Err(Error::BadInput(
                "archive path has no file extension".into(),
            )),
        }
    }
}

/// Native metadata, decoded from `build-info.yaml` at the scratch root.
///
/// All fields default when absent from the document; the document itself is
/// allowed to be missing entirely, in which case every field below is the default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NativeMetadata {
    /// Package/product name.
    pub name: String,
    /// Package version string.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Package author.
    pub author: String,
    /// License identifier or text.
    pub license: String,
    /// Project homepage.
    pub homepage: String,
    /// Target triple or platform tag this package was built for. Informational.
    pub target: String,
    /// Where to install the payload. Blank means installer-type (see [`InstallMode`]).
    pub install_location: String,
    /// What should happen after install completes (e.g. `None`, `RequireRestart`, `RequireLogout`).
    #[serde(default)]
    pub restart_action: String,
    /// Informational dependency list. Never resolved.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Foreign metadata, decoded from a `*.nuspec` document at the scratch root.
///
/// The document's root namespace may be any of several historically-distinct
/// schema versions; see [`crate::metadata::foreign`] for how this is normalized
/// away before deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForeignMetadata {
    /// Package id, e.g. `some.vendor.tool`.
    pub id: String,
    /// Package version string.
    pub version: String,
    /// Display title, falls back to `id` when absent.
    pub title: String,
    /// Comma-separated author list as authored in the document.
    pub authors: String,
    /// Human-readable description.
    pub description: String,
    /// Project URL.
    pub project_url: String,
    /// License URL.
    pub license_url: String,
    /// Icon URL.
    pub icon_url: String,
    /// Free-text release notes.
    pub release_notes: String,
    /// Space-separated search tags.
    pub tags: String,
    /// Package owners, distinct from authors in some schema versions.
    pub owners: String,
    /// Whether the package requires the consumer to accept a license before install.
    #[serde(default)]
    pub require_license_acceptance: bool,
}

/// A value record describing an extracted, parsed archive, owned by a single
/// invocation for the lifetime of the [`crate::orchestrator`] state machine.
#[derive(Debug)]
pub struct PackageInfo {
    /// Which layout the archive used.
    pub kind: ArchiveKind,
    /// Absolute path to the archive on disk.
    pub archive_path: PathBuf,
    /// Absolute path to this invocation's scratch directory.
    pub scratch_dir: PathBuf,
    /// Present when `kind == Native`.
    pub native_meta: Option<NativeMetadata>,
    /// Present when `kind == Foreign` and a `*.nuspec` was found and parsed.
    pub foreign_meta: Option<ForeignMetadata>,
    /// Whether `scripts/preinstall.ps1` exists under the scratch root.
    pub has_pre_native: bool,
    /// Whether `scripts/postinstall.ps1` exists under the scratch root.
    pub has_post_native: bool,
    /// Whether `tools/chocolateyBeforeInstall.ps1` exists under the scratch root.
    pub has_pre_foreign: bool,
    /// Whether `tools/chocolateyInstall.ps1` exists under the scratch root.
    pub has_post_foreign: bool,
    /// Ordered, payload-relative paths. Display/count only, not authoritative for copy.
    pub payload_files: Vec<PathBuf>,
}

impl PackageInfo {
    /// Path to the native pre-install script, whether or not it exists.
    pub fn pre_native_script(&self) -> PathBuf {
        self.scratch_dir.join("scripts").join("preinstall.ps1")
    }

    /// Path to the native post-install script, whether or not it exists.
    pub fn post_native_script(&self) -> PathBuf {
        self.scratch_dir.join("scripts").join("postinstall.ps1")
    }

    /// Path to the foreign pre-install script, whether or not it exists.
    pub fn pre_foreign_script(&self) -> PathBuf {
        self.scratch_dir
            .join("tools")
            .join("chocolateyBeforeInstall.ps1")
    }

    /// Path to the foreign post-install script, whether or not it exists.
    pub fn post_foreign_script(&self) -> PathBuf {
        self.scratch_dir
            .join("tools")
            .join("chocolateyInstall.ps1")
    }

    /// `name` field for `--query`/`--pkginfo`, native or foreign.
    pub fn query_name(&self) -> String {
        self.native_meta
            .as_ref()
            .map(|m| m.name.clone())
            .or_else(|| self.foreign_meta.as_ref().map(|m| m.title.clone()))
            .unwrap_or_default()
    }

    /// `version` field for `--query`/`--pkginfo`, native or foreign.
    pub fn query_version(&self) -> String {
        self.native_meta
            .as_ref()
            .map(|m| m.version.clone())
            .or_else(|| self.foreign_meta.as_ref().map(|m| m.version.clone()))
            .unwrap_or_default()
    }

    /// `description` field for `--query`/`--pkginfo`, native or foreign.
    pub fn query_description(&self) -> String {
        self.native_meta
            .as_ref()
            .map(|m| m.description.clone())
            .or_else(|| self.foreign_meta.as_ref().map(|m| m.description.clone()))
            .unwrap_or_default()
    }

    /// `author` field for `--query`/`--pkginfo`, native or foreign.
    pub fn query_author(&self) -> String {
        self.native_meta
            .as_ref()
            .map(|m| m.author.clone())
            .or_else(|| self.foreign_meta.as_ref().map(|m| m.authors.clone()))
            .unwrap_or_default()
    }

    /// `license` field for `--query`/`--pkginfo`. Only native metadata carries one.
    pub fn query_license(&self) -> String {
        self.native_meta
            .as_ref()
            .map(|m| m.license.clone())
            .unwrap_or_default()
    }

    /// `RestartAction` field for `--query`. Only native metadata carries one.
    pub fn query_restart_action(&self) -> String {
        self.native_meta
            .as_ref()
            .map(|m| m.restart_action.clone())
            .unwrap_or_default()
    }
}

/// Derived installation strategy, computed by [`crate::classify`] and never stored
/// directly on [`PackageInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallMode {
    /// No payload files: scripts handle all effects, no mirroring step runs.
    ScriptOnly,
    /// Payload is mirrored to `location` by the engine.
    CopyType {
        /// The resolved, absolute destination directory.
        location: PathBuf,
    },
    /// Payload is left under the scratch dir; scripts install it themselves.
    InstallerType,
}
