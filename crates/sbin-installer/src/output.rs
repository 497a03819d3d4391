// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Formats `--pkginfo`, `--query`, `--dominfo`, and `--volinfo` output, either
//! as plain text or, when `--plist` is set, as an XML property list (spec §6,
//! and the `--dominfo`/`--volinfo` supplement in `SPEC_FULL.md`).

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::{model::PackageInfo, target};

/// A single `--query <field>` target.
#[derive(Debug, Clone, Copy, ValueEnum, Serialize)]
pub enum QueryField {
    /// Package/product name.
    Name,
    /// Package version string.
    Version,
    /// Human-readable description.
    Description,
    /// Package author(s).
    Author,
    /// License identifier or text.
    License,
    /// Restart action after install.
    #[value(name = "RestartAction")]
    RestartAction,
}

/// Resolves `field` against `info`, returning the raw literal value.
pub fn query_value(info: &PackageInfo, field: QueryField) -> String {
    match field {
        QueryField::Name => info.query_name(),
        QueryField::Version => info.query_version(),
        QueryField::Description => info.query_description(),
        QueryField::Author => info.query_author(),
        QueryField::License => info.query_license(),
        QueryField::RestartAction => info.query_restart_action(),
    }
}

/// The key/value pairs shown by `--pkginfo`.
fn pkginfo_fields(info: &PackageInfo) -> Vec<(&'static str, String)> {
    vec![
        ("name", info.query_name()),
        ("version", info.query_version()),
        ("description", info.query_description()),
        ("author", info.query_author()),
        ("license", info.query_license()),
        ("RestartAction", info.query_restart_action()),
    ]
}

/// Prints `--pkginfo` output, plain or as a plist dict.
pub fn print_pkginfo(info: &PackageInfo, as_plist: bool) -> crate::Result<()> {
    let fields = pkginfo_fields(info);
    if as_plist {
        let mut dict = plist::Dictionary::new();
        for (key, value) in fields {
            dict.insert(key.to_string(), value.into());
        }
        plist::Value::Dictionary(dict).to_writer_xml(std::io::stdout())?;
    } else {
        for (key, value) in fields {
            println!("{key}: {value}");
        }
    }
    Ok(())
}

/// A single installation domain: a name and its resolved absolute path.
struct Domain {
    name: &'static str,
    path: PathBuf,
}

/// The fixed domain list described in `SPEC_FULL.md`: `system`, `user`, and
/// `choice` (whatever `--target` resolved to for this invocation).
fn domains(target_spec: &str) -> Vec<Domain> {
    vec![
        Domain {
            name: "system",
            path: target::program_files_root(),
        },
        Domain {
            name: "user",
            path: dirs::home_dir().unwrap_or_else(target::system_drive_root),
        },
        Domain {
            name: "choice",
            path: target::resolve_root(target_spec),
        },
    ]
}

/// Prints `--dominfo` output, plain or as a plist dict of name -> path.
pub fn print_dominfo(target_spec: &str, as_plist: bool) -> crate::Result<()> {
    let domains = domains(target_spec);
    if as_plist {
        let mut dict = plist::Dictionary::new();
        for domain in domains {
            dict.insert(domain.name.to_string(), domain.path.display().to_string().into());
        }
        plist::Value::Dictionary(dict).to_writer_xml(std::io::stdout())?;
    } else {
        for domain in domains {
            println!("{}: {}", domain.name, domain.path.display());
        }
    }
    Ok(())
}

/// Prints `--volinfo` output: name, total bytes, and available bytes for
/// every fixed and removable local volume, using `sysinfo`'s `Disks` API.
pub fn print_volinfo(as_plist: bool) -> crate::Result<()> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let lines: Vec<String> = disks
        .list()
        .iter()
        .map(|disk| {
            format!(
                "{}: {} {}",
                disk.mount_point().display(),
                disk.total_space(),
                disk.available_space()
            )
        })
        .collect();

    if as_plist {
        let values = lines.into_iter().map(plist::Value::String).collect();
        plist::Value::Array(values).to_writer_xml(std::io::stdout())?;
    } else {
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}
