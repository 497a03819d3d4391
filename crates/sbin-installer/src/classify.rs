// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Pure function over [`PackageInfo`] deciding install mode and, for copy-type
//! packages, the effective install location (spec §4.3).

use std::path::{Path, PathBuf};

use crate::{
    model::{ArchiveKind, InstallMode, PackageInfo},
    target,
};

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "fon"];
const INSTALLER_SUBSTRINGS: &[&str] = &["setup", "installer", "install"];
/// Suffixes seen on the bootstrap stubs vendor installer toolchains (InstallShield,
/// InnoSetup, WiX burn bundles) commonly emit for their wrapper executable.
const VENDOR_INSTALLER_SUFFIXES: &[&str] = &["-x64.exe", "-x86.exe", "-bundle.exe"];

/// Classifies `info` against `target_root` (the root resolved by
/// [`target::resolve_root`] for this invocation).
pub fn classify(info: &PackageInfo, target_root: &Path) -> InstallMode {
    if info.payload_files.is_empty() {
        return InstallMode::ScriptOnly;
    }

    match info.kind {
        ArchiveKind::Native => classify_native(info, target_root),
        ArchiveKind::Foreign => classify_foreign(info),
    }
}

fn classify_native(info: &PackageInfo, target_root: &Path) -> InstallMode {
    let install_location = info
        .native_meta
        .as_ref()
        .map(|m| m.install_location.as_str())
        .unwrap_or("");

    if install_location.trim().is_empty() {
        InstallMode::InstallerType
    } else {
        InstallMode::CopyType {
            location: target::join_install_location(target_root, install_location),
        }
    }
}

fn classify_foreign(info: &PackageInfo) -> InstallMode {
    if info.payload_files.iter().any(|f| looks_like_installer(f)) {
        return InstallMode::InstallerType;
    }

    let location = if predominantly_fonts(&info.payload_files) {
        target::fonts_dir()
    } else {
        target::program_files_root().join(default_product_dir_name(info))
    };
    InstallMode::CopyType { location }
}

fn looks_like_installer(rel: &Path) -> bool {
    let Some(name) = rel.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_ascii_lowercase();

    if lower.ends_with(".msi") {
        return true;
    }
    if !lower.ends_with(".exe") {
        return false;
    }
    if INSTALLER_SUBSTRINGS.iter().any(|s| lower.contains(s)) {
        return true;
    }
    VENDOR_INSTALLER_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn is_font(rel: &Path) -> bool {
    rel.extension()
        .and_then(|e| e.to_str())
        .map(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
        .unwrap_or(false)
}

fn predominantly_fonts(files: &[PathBuf]) -> bool {
    if files.is_empty() {
        return false;
    }
    let font_count = files.iter().filter(|f| is_font(f)).count();
    font_count * 2 > files.len()
}

fn default_product_dir_name(info: &PackageInfo) -> String {
    let name = info
        .foreign_meta
        .as_ref()
        .map(|m| {
            if !m.title.is_empty() {
                m.title.clone()
            } else {
                m.id.clone()
            }
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Package".to_string());
    sanitize_dir_name(&name)
}

fn sanitize_dir_name(name: &str) -> String {
    name.chars()
        .map(|c| if "\\/:*?\"<>|".contains(c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForeignMetadata, NativeMetadata};

    fn base_info(kind: ArchiveKind) -> PackageInfo {
        PackageInfo {
            kind,
            archive_path: PathBuf::from("demo.pkg"),
            scratch_dir: PathBuf::from("C:\\scratch"),
            native_meta: None,
            foreign_meta: None,
            has_pre_native: false,
            has_post_native: false,
            has_pre_foreign: false,
            has_post_foreign: false,
            payload_files: Vec::new(),
        }
    }

    #[test]
    fn no_payload_is_script_only() {
        let info = base_info(ArchiveKind::Native);
        assert_eq!(
            classify(&info, Path::new("C:\\")),
            InstallMode::ScriptOnly
        );
    }

    #[test]
    fn native_blank_install_location_is_installer_type() {
        let mut info = base_info(ArchiveKind::Native);
        info.payload_files.push(PathBuf::from("hello.txt"));
        info.native_meta = Some(NativeMetadata::default());
        assert_eq!(
            classify(&info, Path::new("C:\\")),
            InstallMode::InstallerType
        );
    }

    #[test]
    fn native_install_location_is_copy_type() {
        let mut info = base_info(ArchiveKind::Native);
        info.payload_files.push(PathBuf::from("hello.txt"));
        info.native_meta = Some(NativeMetadata {
            install_location: "Apps\\Demo".into(),
            ..Default::default()
        });
        let mode = classify(&info, Path::new("C:\\"));
        assert_eq!(
            mode,
            InstallMode::CopyType {
                location: PathBuf::from("C:\\Apps\\Demo")
            }
        );
    }

    #[test]
    fn foreign_with_setup_exe_is_installer_type() {
        let mut info = base_info(ArchiveKind::Foreign);
        info.payload_files.push(PathBuf::from("tools/Setup_v3.exe"));
        assert_eq!(
            classify(&info, Path::new("C:\\")),
            InstallMode::InstallerType
        );
    }

    #[test]
    fn foreign_predominantly_fonts_uses_fonts_dir() {
        let mut info = base_info(ArchiveKind::Foreign);
        info.payload_files.push(PathBuf::from("fonts/a.ttf"));
        info.payload_files.push(PathBuf::from("fonts/b.otf"));
        let mode = classify(&info, Path::new("C:\\"));
        assert_eq!(
            mode,
            InstallMode::CopyType {
                location: target::fonts_dir()
            }
        );
    }

    #[test]
    fn foreign_default_product_dir_uses_title_or_id() {
        let mut info = base_info(ArchiveKind::Foreign);
        info.payload_files.push(PathBuf::from("lib/app.dll"));
        info.foreign_meta = Some(ForeignMetadata {
            id: "some.vendor.tool".into(),
            title: "Some Tool".into(),
            ..Default::default()
        });
        let mode = classify(&info, Path::new("C:\\"));
        assert_eq!(
            mode,
            InstallMode::CopyType {
                location: target::program_files_root().join("Some Tool")
            }
        );
    }
}
