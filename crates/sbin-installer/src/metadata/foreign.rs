// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::Path;

use quick_xml::{events::Event, Reader, Writer};
use serde::Deserialize;

use crate::model::ForeignMetadata;

#[derive(Debug, Deserialize)]
struct NuspecRoot {
    metadata: ForeignMetadata,
}

/// Locates and decodes the `*.nuspec` document at `scratch_root` (non-recursive).
///
/// If no `.nuspec` file exists, returns `Ok(None)` after emitting a warning — this
/// is allowed, matching spec §4.2. If more than one exists, the lexicographically
/// first is used and a warning is emitted for the rest. The document's root
/// namespace is stripped (see [`strip_namespaces`]) before binding, which is what
/// lets every historical nuspec schema version parse with this one decoder.
#[tracing::instrument(level = "trace")]
pub fn parse_foreign(scratch_root: &Path) -> crate::Result<Option<ForeignMetadata>> {
    let mut candidates: Vec<_> = std::fs::read_dir(scratch_root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("nuspec"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    let Some(path) = candidates.first().cloned() else {
        tracing::warn!("no *.nuspec file found at archive root");
        return Ok(None);
    };

    if candidates.len() > 1 {
        tracing::warn!(
            "multiple *.nuspec files found, using `{}`",
            path.display()
        );
    }

    let raw = std::fs::read_to_string(&path)?;
    let stripped = strip_namespaces(&raw)
        .map_err(|e| crate::Error::BadMetadata(format!("{}: {e}", path.display())))?;

    let root: NuspecRoot = quick_xml::de::from_str(&stripped)
        .map_err(|e| crate::Error::BadMetadata(format!("{}: {e}", path.display())))?;

    Ok(Some(root.metadata))
}

/// Parses `xml`, walks every element renaming it to its local name (dropping any
/// namespace prefix) and removing namespace-declaration attributes (`xmlns` and
/// `xmlns:*`), then re-serializes. This is the mechanism, not the invariant: the
/// invariant is that element names compare structurally regardless of which
/// namespace URI a given schema version declared.
pub fn strip_namespaces(xml: &str) -> crate::Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut writer = Writer::new(Vec::new());

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let mut elem = quick_xml::events::BytesStart::new(local_name(e.name().as_ref()));
                for attr in e.attributes().flatten() {
                    let key = attr.key.as_ref();
                    if is_namespace_decl(key) {
                        continue;
                    }
                    elem.push_attribute((local_name(key).as_str(), &*attr.unescape_value()?));
                }
                writer.write_event(Event::Start(elem))?;
            }
            Event::Empty(e) => {
                let mut elem = quick_xml::events::BytesStart::new(local_name(e.name().as_ref()));
                for attr in e.attributes().flatten() {
                    let key = attr.key.as_ref();
                    if is_namespace_decl(key) {
                        continue;
                    }
                    elem.push_attribute((local_name(key).as_str(), &*attr.unescape_value()?));
                }
                writer.write_event(Event::Empty(elem))?;
            }
            Event::End(e) => {
                writer.write_event(Event::End(quick_xml::events::BytesEnd::new(local_name(
                    e.name().as_ref(),
                ))))?;
            }
            other => {
                writer.write_event(other)?;
            }
        }
    }

    Ok(String::from_utf8(writer.into_inner()).expect("quick-xml always writes valid utf8"))
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    match s.find(':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.into_owned(),
    }
}

fn is_namespace_decl(key: &[u8]) -> bool {
    key == b"xmlns" || key.starts_with(b"xmlns:")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMAS: &[&str] = &[
        "http://schemas.microsoft.com/packaging/2010/07/nuspec.xsd",
        "http://schemas.microsoft.com/packaging/2011/08/nuspec.xsd",
        "http://schemas.microsoft.com/packaging/2011/10/nuspec.xsd",
        "http://schemas.microsoft.com/packaging/2012/06/nuspec.xsd",
        "http://schemas.microsoft.com/packaging/2013/01/nuspec.xsd",
    ];

    fn nuspec_for(schema: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="{schema}">
  <metadata>
    <id>sample.tool</id>
    <version>2.0.0</version>
    <title>Sample Tool</title>
    <authors>Jane Doe</authors>
    <owners>Jane Doe</owners>
    <description>A sample tool.</description>
    <projectUrl>https://example.com</projectUrl>
    <tags>cli tool</tags>
    <requireLicenseAcceptance>false</requireLicenseAcceptance>
  </metadata>
</package>"#
        )
    }

    #[test]
    fn strips_default_namespace_and_binds() {
        for schema in SCHEMAS {
            let xml = nuspec_for(schema);
            let stripped = strip_namespaces(&xml).unwrap();
            assert!(!stripped.contains("xmlns"));
            let root: NuspecRoot = quick_xml::de::from_str(&stripped).unwrap();
            assert_eq!(root.metadata.id, "sample.tool");
            assert_eq!(root.metadata.version, "2.0.0");
            assert_eq!(root.metadata.title, "Sample Tool");
        }
    }

    #[test]
    fn schema_version_invariance_produces_identical_metadata() {
        let mut parsed = Vec::new();
        for schema in SCHEMAS {
            let xml = nuspec_for(schema);
            let stripped = strip_namespaces(&xml).unwrap();
            let root: NuspecRoot = quick_xml::de::from_str(&stripped).unwrap();
            parsed.push(format!("{:?}", root.metadata));
        }
        assert!(parsed.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn missing_nuspec_yields_none() {
        let tmp = tempfile::tempdir().unwrap();
        let result = parse_foreign(tmp.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn multiple_nuspec_files_use_lexicographically_first() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("b.nuspec"),
            nuspec_for(SCHEMAS[0]).replace("sample.tool", "second"),
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("a.nuspec"),
            nuspec_for(SCHEMAS[0]).replace("sample.tool", "first"),
        )
        .unwrap();

        let meta = parse_foreign(tmp.path()).unwrap().unwrap();
        assert_eq!(meta.id, "first");
    }
}
