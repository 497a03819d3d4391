// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

use crate::script::ScriptKind;

/// Errors returned by sbin-installer.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// Clap error.
    #[error(transparent)]
    Clap(#[from] clap::error::Error),
    /// Missing `--pkg` or an unsupported archive extension.
    #[error("{0}")]
    BadInput(String),
    /// The archive path does not exist.
    #[error("no such file: {0}")]
    ArchiveNotFound(PathBuf),
    /// The archive's central directory could not be located or entries are malformed.
    #[error("corrupt archive {path} ({size} bytes): {reason}")]
    CorruptArchive {
        /// Path to the archive.
        path: PathBuf,
        /// Size of the archive in bytes.
        size: u64,
        /// The underlying structural complaint.
        reason: String,
    },
    /// An archive entry's normalized path escapes the scratch root.
    #[error("malformed entry `{0}`: resolved path escapes the extraction root")]
    MalformedEntry(String),
    /// YAML or XML parse failure, or a required field used downstream is missing.
    #[error("bad metadata: {0}")]
    BadMetadata(String),
    /// The planned work requires administrator privileges and the process is not elevated.
    #[error("administrator privileges required: {0}")]
    NeedsElevation(String),
    /// A pre- or post-install script exited non-zero.
    #[error("{kind} script failed with exit code {code}\n{tail}")]
    ScriptFailed {
        /// Which script failed.
        kind: ScriptKind,
        /// Its process exit code, if the OS reported one.
        code: i32,
        /// Bounded tail of captured stdout/stderr for diagnosis.
        tail: String,
    },
    /// The scratch directory could not be removed. Logged, never surfaced as the primary result.
    #[error("failed to remove scratch directory {0}: {1}")]
    CleanupFailed(PathBuf, std::io::Error),
    /// I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Zip error.
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// YAML parse error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    /// XML parse error.
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    /// XML deserialization error.
    #[error(transparent)]
    XmlDe(#[from] quick_xml::DeError),
    /// Plist error.
    #[error(transparent)]
    Plist(#[from] plist::Error),
    /// JSON error, used for `--config` echo and `--plist`-adjacent debug output.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Maps this error onto the process exit code conventions described in spec §6:
    /// script failures propagate the child's exit code when one is known, everything
    /// else that reaches `main` is a flat `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ScriptFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Convenient type alias of Result type for sbin-installer.
pub type Result<T> = std::result::Result<T, Error>;
