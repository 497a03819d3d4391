// Copyright 2016-2019 Cargo-Bundle developers <https://github.com/burtonageo/cargo-bundle>
// Copyright 2019-2023 Tauri Programme within The Commons Conservancy
// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;

#[inline]
pub fn display_path<P: AsRef<Path>>(p: P) -> String {
    dunce::simplified(&p.as_ref().components().collect::<PathBuf>())
        .display()
        .to_string()
}

/// Generates a unique, non-colliding scratch directory name under the OS temp root.
///
/// Never reuses an existing directory: collisions (astronomically unlikely with
/// a 16-character alphanumeric token) are retried.
pub fn fresh_scratch_dir() -> crate::Result<PathBuf> {
    let base = std::env::temp_dir();
    loop {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let dir = base.join(format!("sbin-installer-{token}"));
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            return Ok(dir);
        }
    }
}

/// Best-effort removal of a scratch directory. Logs and continues on failure,
/// per spec §4.9's `Cleanup` policy: never masks the primary result.
pub fn cleanup_scratch(dir: &Path) {
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            tracing::warn!(
                "{}",
                crate::Error::CleanupFailed(dir.to_path_buf(), e)
            );
        }
    }
}

/// Folds a few common mis-decoded Unicode sequences (mojibake from code pages that
/// don't round-trip through UTF-8) back to their intended glyphs. Cosmetic only;
/// must not change line structure.
pub fn sanitize_mojibake(line: &str) -> String {
    const REPLACEMENTS: &[(&str, &str)] = &[
        ("\u{e2}\u{88}\u{9a}", "\u{221a}"), // mangled check mark √
        ("\u{e2}\u{86}\u{92}", "\u{2192}"), // mangled arrow →
        ("\u{e2}\u{80}\u{a2}", "\u{2022}"), // mangled bullet •
        ("\u{c3}\u{a9}", "\u{e9}"),         // mangled é
    ];
    let mut out = line.to_string();
    for (bad, good) in REPLACEMENTS {
        out = out.replace(bad, good);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_scratch_dirs_are_unique_and_exist() {
        let a = fresh_scratch_dir().unwrap();
        let b = fresh_scratch_dir().unwrap();
        assert_ne!(a, b);
        assert!(a.exists());
        assert!(b.exists());
        cleanup_scratch(&a);
        cleanup_scratch(&b);
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn sanitize_leaves_plain_ascii_untouched() {
        assert_eq!(sanitize_mojibake("hello world"), "hello world");
    }

    #[test]
    fn sanitize_folds_mangled_checkmark() {
        let mangled = "done \u{e2}\u{88}\u{9a}";
        assert_eq!(sanitize_mojibake(mangled), "done \u{221a}");
    }
}
