// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Translates a `--target` string into an absolute root directory (spec §4.5).
//! This produces only the root; [`crate::classify`] joins it with `install_location`.

use std::path::{Path, PathBuf};

/// Resolves `spec` to an absolute root directory per the table in spec §4.5.
pub fn resolve_root(spec: &str) -> PathBuf {
    if spec == "/" || spec == "\\" {
        return system_drive_root();
    }

    if spec == "CurrentUserHomeDirectory" {
        return dirs::home_dir().unwrap_or_else(system_drive_root);
    }

    if let Some(name) = spec
        .strip_prefix("/Volumes/")
        .or_else(|| spec.strip_prefix("\\Volumes\\"))
    {
        return PathBuf::from(format!("{}:\\", name.to_ascii_uppercase()));
    }

    if spec.len() == 1 && spec.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return PathBuf::from(format!("{}:\\", spec.to_ascii_uppercase()));
    }

    dunce::simplified(Path::new(spec)).to_path_buf()
}

/// Root of the drive Windows itself is installed on, e.g. `C:\`.
pub fn system_drive_root() -> PathBuf {
    let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
    PathBuf::from(format!("{drive}\\"))
}

/// The 64-bit Program Files directory, e.g. `C:\Program Files`.
pub fn program_files_root() -> PathBuf {
    std::env::var("ProgramFiles")
        .map(PathBuf::from)
        .unwrap_or_else(|_| system_drive_root().join("Program Files"))
}

/// The Windows installation directory, e.g. `C:\Windows`.
pub fn windows_dir() -> PathBuf {
    std::env::var("windir")
        .or_else(|_| std::env::var("SystemRoot"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| system_drive_root().join("Windows"))
}

/// The machine-wide ProgramData directory, e.g. `C:\ProgramData`.
pub fn program_data_dir() -> PathBuf {
    std::env::var("ProgramData")
        .map(PathBuf::from)
        .unwrap_or_else(|_| system_drive_root().join("ProgramData"))
}

/// The system font directory, e.g. `C:\Windows\Fonts`.
pub fn fonts_dir() -> PathBuf {
    windows_dir().join("Fonts")
}

/// Joins `install_location` onto `root`. If `install_location` is itself absolute,
/// the root is ignored — matching macOS installer semantics, per spec §4.5.
pub fn join_install_location(root: &Path, install_location: &str) -> PathBuf {
    let loc = Path::new(install_location);
    if loc.is_absolute() {
        loc.to_path_buf()
    } else {
        root.join(loc)
    }
}
