// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Accept files dropped onto a window you do not own, and filter them on demand.
//!
//! The host keeps its window and its message loop. Once drops are enabled, the
//! crate waits for the window to lose focus for the first time, then wraps its
//! window procedure so `WM_DROPFILES` is captured after the host's own handling.
//! Dropped paths are kept sorted and de-duplicated until the host asks for them,
//! at which point the current [`FilterPolicy`] is applied.
//!
//! - Add the `file-dropper` dependency:
//!
//! `$ cargo add file-dropper`
//!
//! - Bind a window, enable drops and read them back:
//!
//!   ```rust,no_run
//!   use file_dropper::{FileDropper, FilterPolicy, TargetWindow};
//!
//!   # fn hwnd() -> isize { 0 }
//!   let dropper = FileDropper::new();
//!   dropper.set_window(TargetWindow::from_raw(hwnd())).unwrap();
//!   dropper.set_filter(FilterPolicy::new(".png;.jpg").allow_directories(false));
//!   dropper.set_enabled(true).unwrap();
//!
//!   // later, from the host's frame loop
//!   for path in dropper.filtered() {
//!     println!("dropped: {path}");
//!   }
//!   ```
//!
//! On platforms other than Windows there is no window hijack; hosts feed drops
//! through [`FileDropper::capture`] themselves.

mod capture;
pub mod encoding;
mod filter;
mod hijack;
mod oracle;
mod platform_impl;
mod session;

pub use capture::{DropHandle, DropState, Phase};
pub use filter::{ExtensionFilter, FilterPolicy};
pub use hijack::Hijack;
pub use oracle::{ExistenceOracle, FsOracle};
pub use session::{FileDropper, TargetWindow};

/// Separator between paths in every joined path list.
pub const RECORD_SEPARATOR: &str = "\n";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[cfg(windows)]
    #[error("{0}")]
    WindowsError(#[from] windows::core::Error),
    #[error("unsupported window handle")]
    UnsupportedWindowHandle,
    #[error("drops are enabled on the current window, disable them before rebinding")]
    WindowBusy,
}
