// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The embedded compatibility shim (spec §4.8): a PowerShell script providing
//! re-implementations of the ~10 most common foreign-ecosystem helper
//! routines, dot-sourced ahead of a foreign script by [`crate::script::run`].

use std::path::{Path, PathBuf};

/// Source of the compatibility shim, embedded at compile time.
const COMPAT_SHIM: &str = include_str!("./chocolatey-compat.ps1");

/// Writes the shim out under `scratch_dir` and returns its path. Written fresh
/// per invocation rather than cached, so it always reflects the binary that
/// produced it.
pub fn write_shim(scratch_dir: &Path) -> crate::Result<PathBuf> {
    let path = scratch_dir.join(".sbin-installer-compat.ps1");
    std::fs::write(&path, COMPAT_SHIM)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shim_declares_every_spec_operation() {
        for op in [
            "Install-ChocolateyPath",
            "Install-ChocolateyEnvironmentVariable",
            "Get-ChocolateyWebFile",
            "Install-ChocolateyPackage",
            "Install-ChocolateyZipPackage",
            "Get-ChocolateyUnzip",
            "Install-ChocolateyShortcut",
            "Get-OSArchitectureWidth",
            "Get-EnvironmentVariable",
            "Update-SessionEnvironment",
        ] {
            assert!(
                COMPAT_SHIM.contains(&format!("function {op}")),
                "shim is missing `{op}`"
            );
        }
    }

    #[test]
    fn writes_shim_into_scratch_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_shim(tmp.path()).unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(path).unwrap(), COMPAT_SHIM);
    }
}
