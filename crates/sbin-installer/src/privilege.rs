// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Decides whether the planned work requires administrator privileges, and
//! reports whether the current process holds them (spec §4.6).

use std::path::Path;

use crate::{model::InstallMode, target};

/// If the planned work requires elevation, returns the reason to surface in an
/// [`crate::Error::NeedsElevation`] diagnostic. Scripts of any kind are always
/// presumed to require elevation (they may touch arbitrary state); otherwise a
/// copy-type install is checked against the system-owned root allow-list.
pub fn elevation_reason(has_any_script: bool, mode: &InstallMode) -> Option<String> {
    if has_any_script {
        return Some(
            "pre/post-install scripts are presumed to require administrator privileges".into(),
        );
    }

    if let InstallMode::CopyType { location } = mode {
        if is_system_owned(location) {
            return Some(format!(
                "install location `{}` is under a system-owned root",
                location.display()
            ));
        }
    }

    None
}

/// Whether `path` is, or is under, one of the system-owned roots: the
/// Program Files directories, the Windows directory, ProgramData, or the
/// system drive root itself.
fn is_system_owned(path: &Path) -> bool {
    let roots = [
        target::program_files_root(),
        target::windows_dir(),
        target::program_data_dir(),
        target::system_drive_root(),
    ];
    roots.iter().any(|root| path == root || path.starts_with(root))
}

pub use imp::is_elevated;

#[cfg(windows)]
mod imp {
    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows_sys::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    /// Whether the current process is running with an elevated token.
    pub fn is_elevated() -> bool {
        unsafe {
            let mut token: HANDLE = 0;
            if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
                return false;
            }

            let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
            let mut returned_len = 0u32;
            let ok = GetTokenInformation(
                token,
                TokenElevation,
                &mut elevation as *mut _ as *mut _,
                std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                &mut returned_len,
            );
            CloseHandle(token);

            ok != 0 && elevation.TokenIsElevated != 0
        }
    }
}

#[cfg(not(windows))]
mod imp {
    /// Stub for non-Windows dev/test environments: the engine is Windows-only
    /// (spec §1 Non-goals), so this always reports "not elevated".
    pub fn is_elevated() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn scripts_always_require_elevation() {
        let reason = elevation_reason(true, &InstallMode::ScriptOnly);
        assert!(reason.is_some());
    }

    #[test]
    fn copy_under_program_files_requires_elevation() {
        let location = target::program_files_root().join("Demo");
        let reason = elevation_reason(false, &InstallMode::CopyType { location });
        assert!(reason.is_some());
    }

    #[test]
    fn copy_outside_system_roots_does_not_require_elevation() {
        let location = PathBuf::from("D:\\Games\\Demo");
        let reason = elevation_reason(false, &InstallMode::CopyType { location });
        assert!(reason.is_none());
    }

    #[test]
    fn installer_type_without_scripts_does_not_require_elevation() {
        let reason = elevation_reason(false, &InstallMode::InstallerType);
        assert!(reason.is_none());
    }
}
