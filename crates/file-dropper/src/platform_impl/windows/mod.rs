// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::{
    ffi::c_void,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use windows::Win32::{
    Foundation::{BOOL, HWND, LPARAM, LRESULT, WPARAM},
    UI::{
        Shell::{DragAcceptFiles, DragFinish, DragQueryFileW, HDROP},
        WindowsAndMessaging::{
            AllowSetForegroundWindow, CallNextHookEx, CallWindowProcW, ChangeWindowMessageFilterEx,
            DefWindowProcW, GetWindowThreadProcessId, IsWindow, SetForegroundWindow,
            SetWindowsHookExW, UnhookWindowsHookEx, CWPSTRUCT, GWLP_WNDPROC, HC_ACTION, HHOOK,
            MSGFLT_ALLOW, WH_CALLWNDPROC, WM_COPYDATA, WM_DROPFILES, WM_KILLFOCUS, WM_NCDESTROY,
            WNDPROC,
        },
    },
};

use crate::{encoding, session::lock, DropHandle, DropState, Hijack, TargetWindow};

#[cfg(target_pointer_width = "64")]
use windows::Win32::UI::WindowsAndMessaging::{GetWindowLongPtrW, SetWindowLongPtrW};
#[cfg(target_pointer_width = "32")]
use windows::Win32::UI::WindowsAndMessaging::{
    GetWindowLongW as GetWindowLongPtrW, SetWindowLongW as SetWindowLongPtrW,
};

/// Lets the shell hand drop data to a process running at a higher integrity level.
const WM_COPYGLOBALDATA: u32 = 0x0049;

struct Binding {
    hwnd: isize,
    hijack: Hijack,
    state: Weak<Mutex<DropState>>,
}

static BINDINGS: Mutex<Vec<Binding>> = Mutex::new(Vec::new());

fn bindings() -> MutexGuard<'static, Vec<Binding>> {
    lock(&BINDINGS)
}

fn hwnd(window: TargetWindow) -> HWND {
    HWND(window.raw() as *mut c_void)
}

fn drop_wndproc_addr() -> isize {
    drop_wndproc as usize as isize
}

unsafe fn window_proc(hwnd: HWND) -> isize {
    GetWindowLongPtrW(hwnd, GWLP_WNDPROC) as isize
}

unsafe fn set_window_proc(hwnd: HWND, proc: isize) -> isize {
    #[allow(clippy::unnecessary_cast)]
    let previous = SetWindowLongPtrW(hwnd, GWLP_WNDPROC, proc as _) as isize;
    previous
}

unsafe fn as_wndproc(raw: isize) -> WNDPROC {
    std::mem::transmute::<isize, WNDPROC>(raw)
}

/// Installs the focus watch for `window` unless one is pending or the procedure is already swapped.
pub(crate) fn arm(window: TargetWindow, state: &Arc<Mutex<DropState>>) -> crate::Result<()> {
    let hwnd = hwnd(window);
    let thread = unsafe { GetWindowThreadProcessId(hwnd, None) };
    if thread == 0 {
        return Err(crate::Error::UnsupportedWindowHandle);
    }

    let mut bindings = bindings();
    let index = match bindings.iter().position(|b| b.hwnd == window.raw()) {
        Some(index) => index,
        None => {
            bindings.push(Binding {
                hwnd: window.raw(),
                hijack: Hijack::NotArmed,
                state: Weak::new(),
            });
            bindings.len() - 1
        }
    };

    let binding = &mut bindings[index];
    binding.state = Arc::downgrade(state);
    if !binding.hijack.needs_watch() {
        tracing::debug!(window = window.raw(), hijack = ?binding.hijack, "already hooked");
        return Ok(());
    }

    allow_drop_messages(hwnd);

    let hook = unsafe { SetWindowsHookExW(WH_CALLWNDPROC, Some(focus_watch), None, thread) }?;
    binding.hijack.watching(hook.0 as isize);
    tracing::debug!(window = window.raw(), thread, "watching for focus loss");
    Ok(())
}

pub(crate) fn accept_files(window: TargetWindow, accept: bool) {
    unsafe { DragAcceptFiles(hwnd(window), BOOL::from(accept)) };
}

/// Removes whatever [`arm`] left behind on `window`.
pub(crate) fn release(window: TargetWindow) {
    let hwnd = hwnd(window);
    let mut bindings = bindings();
    let Some(index) = bindings.iter().position(|b| b.hwnd == window.raw()) else {
        return;
    };

    let hijack = bindings[index].hijack;
    match hijack {
        Hijack::NotArmed => {
            bindings.remove(index);
        }
        Hijack::WatchingForFocusLoss { hook } => {
            unhook(hook);
            bindings.remove(index);
        }
        Hijack::Swapped { original } => unsafe {
            if !IsWindow(hwnd).as_bool() {
                bindings.remove(index);
            } else if window_proc(hwnd) == drop_wndproc_addr() {
                set_window_proc(hwnd, original);
                bindings.remove(index);
                tracing::debug!(window = window.raw(), "restored window procedure");
            } else {
                // subclassed on top of us, keep forwarding to the host
                bindings[index].state = Weak::new();
            }
        },
    }
}

fn unhook(hook: isize) {
    if let Err(error) = unsafe { UnhookWindowsHookEx(HHOOK(hook as *mut c_void)) } {
        tracing::warn!(%error, "failed to remove focus watch hook");
    }
}

fn allow_drop_messages(hwnd: HWND) {
    for message in [WM_DROPFILES, WM_COPYDATA, WM_COPYGLOBALDATA] {
        if let Err(error) = unsafe { ChangeWindowMessageFilterEx(hwnd, message, MSGFLT_ALLOW, None) }
        {
            tracing::warn!(message, %error, "failed to allow message across integrity levels");
        }
    }
}

unsafe extern "system" fn focus_watch(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        let message = &*(lparam.0 as *const CWPSTRUCT);
        if message.message == WM_KILLFOCUS {
            take_over(message.hwnd);
        }
    }
    CallNextHookEx(HHOOK::default(), code, wparam, lparam)
}

/// Swaps in [`drop_wndproc`] and retires the watch hook. Runs at most once per arm.
unsafe fn take_over(hwnd: HWND) {
    let hook = {
        let mut bindings = bindings();
        let Some(binding) = bindings.iter_mut().find(|b| {
            b.hwnd == hwnd.0 as isize && matches!(b.hijack, Hijack::WatchingForFocusLoss { .. })
        }) else {
            return;
        };

        let original = set_window_proc(hwnd, drop_wndproc_addr());
        if original == 0 {
            tracing::warn!(window = hwnd.0 as isize, "failed to swap window procedure");
            return;
        }
        binding.hijack.swapped(original)
    };

    if let Some(hook) = hook {
        unhook(hook);
        tracing::debug!(window = hwnd.0 as isize, "window procedure swapped");
    }
}

unsafe extern "system" fn drop_wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let key = hwnd.0 as isize;
    let found = bindings()
        .iter()
        .find(|b| b.hwnd == key)
        .and_then(|b| Some((b.hijack.original()?, b.state.clone())));
    let Some((original, state)) = found else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };

    let result = CallWindowProcW(as_wndproc(original), hwnd, msg, wparam, lparam);

    match msg {
        WM_DROPFILES => {
            if let Some(state) = state.upgrade() {
                on_drop(hwnd, HDROP(wparam.0 as *mut c_void), &state);
            }
        }
        WM_NCDESTROY => bindings().retain(|b| b.hwnd != key),
        _ => {}
    }

    result
}

fn on_drop(hwnd: HWND, hdrop: HDROP, state: &Mutex<DropState>) {
    let captured = lock(state).capture(NativeDrop(hdrop));
    if captured {
        restore_foreground(hwnd);
    }
}

/// Gives the focus back to the host once the shell is done with the drop.
fn restore_foreground(hwnd: HWND) {
    let mut process_id = 0u32;
    unsafe {
        GetWindowThreadProcessId(hwnd, Some(&mut process_id as *mut u32));
        if let Err(error) = AllowSetForegroundWindow(process_id) {
            tracing::debug!(%error, "AllowSetForegroundWindow failed");
        }
        if !SetForegroundWindow(hwnd).as_bool() {
            tracing::debug!(window = hwnd.0 as isize, "SetForegroundWindow failed");
        }
    }
}

struct NativeDrop(HDROP);

impl DropHandle for NativeDrop {
    fn count(&self) -> u32 {
        // u32::MAX asks for the item count
        unsafe { DragQueryFileW(self.0, u32::MAX, None) }
    }

    fn path(&self, index: u32) -> Option<String> {
        // the length excludes the terminating NUL
        let len = unsafe { DragQueryFileW(self.0, index, None) } as usize;
        if len == 0 {
            return None;
        }
        let mut buffer = vec![0u16; len + 1];
        let written = unsafe { DragQueryFileW(self.0, index, Some(&mut buffer)) } as usize;
        Some(encoding::from_wide(&buffer[..written.min(len)]))
    }

    fn release(self) {
        unsafe { DragFinish(self.0) };
    }
}
