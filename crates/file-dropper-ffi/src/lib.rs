// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! C entry points of [`file_dropper`] for game engine extensions.
//!
//! Numbers cross the boundary as `double`, strings as NUL-terminated UTF-8 and
//! the window as an opaque pointer. Every setter returns `0`; failures are only
//! logged. Set `FILE_DROPPER_LOG` (e.g. `file_dropper=debug`) to get logs on stderr.

use std::{
    ffi::{c_char, c_void, CStr, CString},
    ptr,
    sync::{Mutex, OnceLock, PoisonError},
};

use file_dropper::{FileDropper, FilterPolicy, TargetWindow};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FILE_DROPPER_LOG";
const STATUS_OK: f64 = 0.0;

static SESSION: OnceLock<FileDropper> = OnceLock::new();
// keeps the last string handed out by `file_dnd_get_files` alive
static FILES: Mutex<Option<CString>> = Mutex::new(None);

/// The process-wide session behind the C entry points.
pub fn session() -> &'static FileDropper {
    SESSION.get_or_init(|| {
        init_logging();
        FileDropper::new()
    })
}

fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn flag(value: f64) -> bool {
    value != 0.0
}

fn number(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[no_mangle]
pub extern "C" fn file_dnd_get_enabled() -> f64 {
    number(session().enabled())
}

#[no_mangle]
pub extern "C" fn file_dnd_set_enabled(enable: f64) -> f64 {
    if let Err(error) = session().set_enabled(flag(enable)) {
        tracing::warn!(%error, "failed to toggle drop support");
    }
    STATUS_OK
}

/// Filtered drops, newline separated. Valid until the next call.
#[no_mangle]
pub extern "C" fn file_dnd_get_files() -> *const c_char {
    // dropped paths never contain NUL
    let files = CString::new(session().files()).unwrap_or_default();
    let mut slot = FILES.lock().unwrap_or_else(PoisonError::into_inner);
    slot.insert(files).as_ptr()
}

/// # Safety
///
/// `pattern` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn file_dnd_set_files(
    pattern: *const c_char,
    allow_files: f64,
    allow_directories: f64,
    allow_multiple: f64,
) -> f64 {
    let pattern = if pattern.is_null() {
        String::new()
    } else {
        CStr::from_ptr(pattern).to_string_lossy().into_owned()
    };
    session().set_filter(FilterPolicy {
        pattern,
        allow_files: flag(allow_files),
        allow_directories: flag(allow_directories),
        allow_multiple: flag(allow_multiple),
    });
    STATUS_OK
}

#[no_mangle]
pub extern "C" fn file_dnd_get_hwnd() -> *mut c_void {
    session()
        .window()
        .map_or(ptr::null_mut(), |window| window.raw() as *mut c_void)
}

#[no_mangle]
pub extern "C" fn file_dnd_set_hwnd(hwnd: *mut c_void) -> f64 {
    if let Err(error) = session().set_window(TargetWindow::from_raw(hwnd as isize)) {
        tracing::warn!(%error, "window not changed");
    }
    STATUS_OK
}
