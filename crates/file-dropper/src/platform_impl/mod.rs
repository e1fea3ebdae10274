// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

#[cfg(target_os = "windows")]
#[path = "windows/mod.rs"]
mod platform;
#[cfg(not(target_os = "windows"))]
#[path = "fallback/mod.rs"]
mod platform;

pub(crate) use platform::{accept_files, arm, release};

#[cfg(all(test, not(target_os = "windows")))]
pub(crate) use platform::accepting;
