// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Decodes either the native YAML build-info document or the foreign XML
//! package spec into the uniform [`crate::model::PackageInfo`] shape.

mod foreign;
mod native;

pub use foreign::parse_foreign;
pub use native::parse_native;
