// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::Path;

use crate::model::NativeMetadata;

/// Decodes `scratch_root/build-info.yaml`. Absence is allowed and yields
/// all-default metadata; unmatched properties are ignored by serde's default
/// `deny_unknown_fields`-free behavior.
#[tracing::instrument(level = "trace")]
pub fn parse_native(scratch_root: &Path) -> crate::Result<NativeMetadata> {
    let path = scratch_root.join("build-info.yaml");
    if !path.exists() {
        tracing::debug!("no build-info.yaml at scratch root, using defaults");
        return Ok(NativeMetadata::default());
    }

    let contents = std::fs::read_to_string(&path)?;
    let meta: NativeMetadata = serde_yaml::from_str(&contents)
        .map_err(|e| crate::Error::BadMetadata(format!("build-info.yaml: {e}")))?;
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let meta = parse_native(tmp.path()).unwrap();
        assert_eq!(meta.name, "");
        assert!(meta.dependencies.is_empty());
    }

    #[test]
    fn parses_known_fields_and_ignores_unknown_ones() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("build-info.yaml"),
            r#"
name: Demo App
version: "1.2.3"
description: A demo
author: Jane
license: MIT
install_location: C:\Apps\Demo
restart_action: None
dependencies:
  - some.other.pkg
somethingWeDontKnowAbout: true
"#,
        )
        .unwrap();

        let meta = parse_native(tmp.path()).unwrap();
        assert_eq!(meta.name, "Demo App");
        assert_eq!(meta.version, "1.2.3");
        assert_eq!(meta.dependencies, vec!["some.other.pkg".to_string()]);
    }

    #[test]
    fn blank_install_location_defaults_to_empty_string() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("build-info.yaml"), "name: Demo\n").unwrap();
        let meta = parse_native(tmp.path()).unwrap();
        assert_eq!(meta.install_location, "");
    }
}
