// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! A lightweight, deterministic package installer for Windows, modeled on the
//! macOS `/usr/sbin/installer` command.
//!
//! Consumes a single archive on disk, extracts it, runs optional pre- and
//! post-install scripts, and mirrors a payload tree into a target location.
//! There is no package database, no repositories, no dependency resolver, and
//! no cache: each invocation is self-contained.

#![deny(missing_docs)]

mod archive;
mod classify;
mod error;
mod metadata;
mod mirror;
mod model;
mod orchestrator;
mod output;
mod privilege;
mod script;
mod shim;
mod target;
mod util;

pub mod cli;

pub use error::{Error, Result};
pub use model::{ArchiveKind, InstallMode, PackageInfo};
pub use orchestrator::{install, inspect, InstallOptions};

/// Version stamp baked in at build time by `build.rs`, in `YYYY.MM.DD.HHMM` form.
pub const VERSION_STAMP: &str = env!("SBIN_INSTALLER_VERS");

fn parse_log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing_subscriber::EnvFilter::builder()
            .from_env_lossy()
            .max_level_hint()
            .and_then(|l| l.into_level())
            .unwrap_or(tracing::Level::INFO),
        1 => tracing::Level::DEBUG,
        2.. => tracing::Level::TRACE,
    }
}

/// Initializes the tracing subscriber. `verbose` is `--verbose`'s repeat
/// count; `force_shell_echo` is set when `--verboseR` or `--dumplog` is
/// passed, which forces shell-tagged script output to the console regardless
/// of the ambient level (spec §4.7).
pub fn init_tracing_subscriber(verbose: u8, force_shell_echo: bool) {
    let level = parse_log_level(verbose).max(if force_shell_echo {
        tracing::Level::DEBUG
    } else {
        tracing::Level::ERROR
    });

    let debug = level >= tracing::Level::DEBUG;
    let trace = level >= tracing::Level::TRACE;

    let subscriber = tracing_subscriber::fmt()
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_target(debug)
        .with_line_number(trace)
        .with_file(trace)
        .with_max_level(level);

    let formatter = tracing_subscriber::fmt::format()
        .compact()
        .with_target(debug)
        .with_line_number(trace)
        .with_file(trace);

    if trace {
        subscriber
            .event_format(TracingFormatter::WithTime(formatter))
            .init();
    } else {
        subscriber
            .without_time()
            .event_format(TracingFormatter::WithoutTime(formatter.without_time()))
            .init();
    }
}

enum TracingFormatter {
    WithoutTime(
        tracing_subscriber::fmt::format::Format<tracing_subscriber::fmt::format::Compact, ()>,
    ),
    WithTime(tracing_subscriber::fmt::format::Format<tracing_subscriber::fmt::format::Compact>),
}

struct ShellFieldVisitor {
    message: String,
}

impl tracing::field::Visit for ShellFieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for TracingFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        if event.fields().any(|f| f.name() == "shell") {
            let mut visitor = ShellFieldVisitor { message: String::new() };
            event.record(&mut visitor);
            writeln!(writer, "{}", visitor.message)
        } else {
            match self {
                TracingFormatter::WithoutTime(formatter) => {
                    formatter.format_event(ctx, writer, event)
                }
                TracingFormatter::WithTime(formatter) => formatter.format_event(ctx, writer, event),
            }
        }
    }
}
