// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Spawns the Windows shell interpreter to run a pre- or post-install script,
//! plumbing environment and capturing streams (spec §4.7).

use std::{
    ffi::OsString,
    fmt,
    io::{BufRead, BufReader},
    path::Path,
    process::{Command, Stdio},
    sync::{Arc, Mutex},
};

use crate::{model::PackageInfo, util};

/// Which ecosystem a script belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEcosystem {
    /// This tool's own `scripts/*.ps1`.
    Native,
    /// The foreign `tools/chocolatey*.ps1` scripts.
    Foreign,
}

impl fmt::Display for ScriptEcosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScriptEcosystem::Native => "native",
            ScriptEcosystem::Foreign => "foreign",
        })
    }
}

/// Whether a script runs before or after payload mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStage {
    /// Runs before privilege check has passed and before mirroring.
    Pre,
    /// Runs after mirroring.
    Post,
}

impl fmt::Display for ScriptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScriptStage::Pre => "pre-install",
            ScriptStage::Post => "post-install",
        })
    }
}

/// Identifies which of the (at most) two scripts run per invocation, used to
/// label a [`crate::Error::ScriptFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptKind {
    /// Native or foreign.
    pub ecosystem: ScriptEcosystem,
    /// Pre- or post-install.
    pub stage: ScriptStage,
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ecosystem, self.stage)
    }
}

/// Verbosity settings relevant to the script runner: whether captured output
/// should also be streamed live, per spec §4.7.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbosity {
    /// `--verboseR`: raises the effective level and forces shell output live.
    pub verbose_r: bool,
    /// `--dumplog`: same effect on shell output as `--verboseR`.
    pub dumplog: bool,
}

impl Verbosity {
    fn stream_live(self) -> bool {
        self.verbose_r || self.dumplog
    }
}

/// Runs `script_path` of kind `kind` with working directory = `info.scratch_dir`.
///
/// Returns [`crate::Error::ScriptFailed`] if the child exits non-zero. The
/// entire parent environment is propagated, plus the variables described in
/// spec §4.7 for the relevant ecosystem. Foreign scripts have the embedded
/// compatibility shim dot-sourced ahead of them.
#[tracing::instrument(level = "trace", skip(info))]
pub fn run(
    script_path: &Path,
    kind: ScriptKind,
    info: &PackageInfo,
    verbosity: Verbosity,
) -> crate::Result<()> {
    let interpreter = interpreter_path();
    let mut command = Command::new(&interpreter);
    command.current_dir(&info.scratch_dir);

    match kind.ecosystem {
        ScriptEcosystem::Native => {
            command.args(native_args(script_path));
        }
        ScriptEcosystem::Foreign => {
            let shim_path = crate::shim::write_shim(&info.scratch_dir)?;
            command.args(foreign_args(script_path, &shim_path));
        }
    }

    // The entire parent environment must be propagated: a child spawned with
    // an explicit `.env()` call but no `.envs(vars())` first would otherwise
    // start with no environment at all.
    command.envs(std::env::vars_os());
    for (key, value) in build_env(kind.ecosystem, info) {
        command.env(key, value);
    }

    let shell_level = if verbosity.stream_live() {
        tracing::Level::INFO
    } else {
        tracing::Level::DEBUG
    };

    tracing::debug!("running {kind} script `{}`", script_path.display());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    let mut child = command.spawn()?;

    // Both reader threads feed the same shared tail: the two streams must be
    // drained concurrently to avoid deadlocking on a full OS pipe buffer while
    // the child is still writing to the other one.
    let tail = Arc::new(Mutex::new(Vec::<String>::new()));

    let stdout = child.stdout.take().map(BufReader::new).unwrap();
    let stderr = child.stderr.take().map(BufReader::new).unwrap();
    let stdout_thread = {
        let tail = tail.clone();
        std::thread::spawn(move || drain_stream(stdout, "stdout", shell_level, tail))
    };
    let stderr_thread = {
        let tail = tail.clone();
        std::thread::spawn(move || drain_stream(stderr, "stderr", shell_level, tail))
    };

    let status = child.wait()?;
    let _ = stdout_thread.join();
    let _ = stderr_thread.join();

    if status.success() {
        Ok(())
    } else {
        let tail = tail.lock().unwrap().join("\n");
        Err(crate::Error::ScriptFailed {
            kind,
            code: status.code().unwrap_or(1),
            tail,
        })
    }
}

/// Bounded tail length (lines) kept for a [`crate::Error::ScriptFailed`] message.
const TAIL_LINES: usize = 50;

fn drain_stream<R: std::io::Read>(
    mut reader: BufReader<R>,
    stream: &'static str,
    level: tracing::Level,
    tail: Arc<Mutex<Vec<String>>>,
) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let raw = String::from_utf8_lossy(&buf);
        let line = util::sanitize_mojibake(raw.trim_end_matches(['\r', '\n']));
        log_line(level, stream, &line);
        let mut lines = tail.lock().unwrap();
        lines.push(line);
        if lines.len() > TAIL_LINES {
            let excess = lines.len() - TAIL_LINES;
            lines.drain(0..excess);
        }
    }
}

fn log_line(level: tracing::Level, stream: &str, line: &str) {
    match level {
        tracing::Level::INFO => tracing::info!(shell = stream, "{line}"),
        _ => tracing::debug!(shell = stream, "{line}"),
    }
}

/// Resolves the Windows shell interpreter to invoke. Overridable via
/// `SBIN_INSTALLER_SHELL` for tests; defaults to `powershell.exe` on `PATH`.
fn interpreter_path() -> OsString {
    std::env::var_os("SBIN_INSTALLER_SHELL").unwrap_or_else(|| "powershell.exe".into())
}

/// `-File <script>` invocation with an execution-policy override, for native scripts.
fn native_args(script_path: &Path) -> Vec<OsString> {
    vec![
        "-NoProfile".into(),
        "-NonInteractive".into(),
        "-ExecutionPolicy".into(),
        "Bypass".into(),
        "-File".into(),
        script_path.into(),
    ]
}

/// `-Command "& { . <shim>; . <script> }"` invocation, dot-sourcing the
/// compatibility shim ahead of the foreign script so its helpers are in scope.
fn foreign_args(script_path: &Path, shim_path: &Path) -> Vec<OsString> {
    let command = format!(
        "& {{ . '{}'; . '{}' }}",
        shim_path.display(),
        script_path.display()
    );
    vec![
        "-NoProfile".into(),
        "-NonInteractive".into(),
        "-ExecutionPolicy".into(),
        "Bypass".into(),
        "-Command".into(),
        command.into(),
    ]
}

fn build_env(ecosystem: ScriptEcosystem, info: &PackageInfo) -> Vec<(String, String)> {
    match ecosystem {
        ScriptEcosystem::Native => {
            let payload = info.scratch_dir.join("payload");
            let payload = payload.display().to_string();
            ["payloadRoot", "payloadDir", "PAYLOAD_ROOT", "PAYLOAD_DIR"]
                .into_iter()
                .map(|key| (key.to_string(), payload.clone()))
                .collect()
        }
        ScriptEcosystem::Foreign => vec![
            ("ChocolateyPackageName".to_string(), info.query_name()),
            (
                "ChocolateyPackageFolder".to_string(),
                info.scratch_dir.display().to_string(),
            ),
            (
                "ChocolateyPackageVersion".to_string(),
                info.query_version(),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn native_args_use_file_invocation() {
        let args = native_args(Path::new("C:\\scratch\\scripts\\preinstall.ps1"));
        assert!(args.contains(&OsString::from("-File")));
        assert!(args.contains(&OsString::from("Bypass")));
        assert_eq!(args.last(), Some(&OsString::from("C:\\scratch\\scripts\\preinstall.ps1")));
    }

    #[test]
    fn foreign_args_dot_source_shim_before_script() {
        let args = foreign_args(
            Path::new("C:\\scratch\\tools\\chocolateyInstall.ps1"),
            Path::new("C:\\scratch\\shim.ps1"),
        );
        let command = args.last().unwrap().to_string_lossy().into_owned();
        let shim_pos = command.find("shim.ps1").unwrap();
        let script_pos = command.find("chocolateyInstall.ps1").unwrap();
        assert!(shim_pos < script_pos, "shim must be dot-sourced first");
    }

    #[test]
    fn native_env_points_at_payload_dir_under_all_four_names() {
        let info = PackageInfo {
            kind: crate::model::ArchiveKind::Native,
            archive_path: PathBuf::from("demo.pkg"),
            scratch_dir: PathBuf::from("C:\\scratch"),
            native_meta: None,
            foreign_meta: None,
            has_pre_native: false,
            has_post_native: false,
            has_pre_foreign: false,
            has_post_foreign: false,
            payload_files: Vec::new(),
        };
        let env = build_env(ScriptEcosystem::Native, &info);
        assert_eq!(env.len(), 4);
        for (_, value) in &env {
            assert_eq!(value, "C:\\scratch\\payload");
        }
    }

    #[test]
    fn script_kind_display_matches_error_message_shape() {
        let kind = ScriptKind {
            ecosystem: ScriptEcosystem::Foreign,
            stage: ScriptStage::Post,
        };
        assert_eq!(kind.to_string(), "foreign post-install");
    }
}
