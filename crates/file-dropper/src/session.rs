// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::{
    num::NonZeroIsize,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use raw_window_handle::{HasWindowHandle, RawWindowHandle};

use crate::{
    capture::{DropHandle, DropState},
    filter::FilterPolicy,
    oracle::{ExistenceOracle, FsOracle},
    platform_impl, Error, Result,
};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The host-owned window that receives drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetWindow(NonZeroIsize);

impl TargetWindow {
    /// Wraps a raw `HWND`. A null handle means no window.
    pub fn from_raw(hwnd: isize) -> Option<Self> {
        NonZeroIsize::new(hwnd).map(Self)
    }

    pub fn from_window<W: HasWindowHandle>(window: &W) -> Result<Self> {
        let handle = window
            .window_handle()
            .map_err(|_| Error::UnsupportedWindowHandle)?;
        match handle.as_raw() {
            RawWindowHandle::Win32(w) => Ok(Self(w.hwnd)),
            _ => Err(Error::UnsupportedWindowHandle),
        }
    }

    pub fn raw(&self) -> isize {
        self.0.get()
    }
}

/// Drop support for one target window.
///
/// Every method takes `&self` so a session can be shared with the host's threads.
/// Locks are never held while the OS may dispatch messages back into the window.
pub struct FileDropper<O = FsOracle> {
    window: Mutex<Option<TargetWindow>>,
    state: Arc<Mutex<DropState>>,
    oracle: O,
}

impl FileDropper {
    pub fn new() -> Self {
        Self::with_oracle(FsOracle)
    }
}

impl Default for FileDropper {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ExistenceOracle> FileDropper<O> {
    pub fn with_oracle(oracle: O) -> Self {
        Self {
            window: Mutex::new(None),
            state: Arc::new(Mutex::new(DropState::new())),
            oracle,
        }
    }

    pub fn window(&self) -> Option<TargetWindow> {
        *lock(&self.window)
    }

    /// Binds the session to `window`.
    ///
    /// Fails with [`Error::WindowBusy`] while drops are enabled. The previous
    /// window gets its original procedure back.
    pub fn set_window(&self, window: Option<TargetWindow>) -> Result<()> {
        let mut current = lock(&self.window);
        if self.enabled() {
            return Err(Error::WindowBusy);
        }
        let previous = std::mem::replace(&mut *current, window);
        drop(current);
        if let Some(previous) = previous.filter(|p| Some(*p) != window) {
            platform_impl::release(previous);
        }
        Ok(())
    }

    pub fn enabled(&self) -> bool {
        lock(&self.state).enabled()
    }

    /// Turns drop acceptance on or off. Does nothing while no window is bound.
    pub fn set_enabled(&self, enable: bool) -> Result<()> {
        // the binding cannot change until the state agrees with the hook
        let guard = lock(&self.window);
        let Some(window) = *guard else {
            tracing::debug!(enable, "no target window, ignoring");
            return Ok(());
        };

        if enable {
            platform_impl::arm(window, &self.state)?;
        }
        lock(&self.state).set_enabled(enable);
        drop(guard);

        platform_impl::accept_files(window, enable);
        tracing::debug!(window = window.raw(), enable, "drop support toggled");
        Ok(())
    }

    pub fn filter(&self) -> FilterPolicy {
        lock(&self.state).policy().clone()
    }

    pub fn set_filter(&self, policy: FilterPolicy) {
        lock(&self.state).set_policy(policy);
    }

    /// Every path dropped since drops were enabled, sorted and de-duplicated.
    pub fn pending(&self) -> Vec<String> {
        lock(&self.state).pending().to_vec()
    }

    /// The pending paths that pass the current filter.
    pub fn filtered(&self) -> Vec<String> {
        lock(&self.state).filtered(&self.oracle)
    }

    /// [`Self::filtered`] joined with newlines.
    pub fn files(&self) -> String {
        lock(&self.state).files(&self.oracle)
    }

    /// Feeds a drop notification into the session.
    ///
    /// On Windows the hijacked window procedure does this on its own; elsewhere
    /// the host calls it from its event loop. Returns whether the drop was taken.
    pub fn capture<D: DropHandle>(&self, drop: D) -> bool {
        lock(&self.state).capture(drop)
    }
}

impl<O> Drop for FileDropper<O> {
    fn drop(&mut self) {
        let Some(window) = *lock(&self.window) else {
            return;
        };
        // nothing would finish the shell's drops once the wrapper is gone
        if lock(&self.state).enabled() {
            platform_impl::accept_files(window, false);
        }
        platform_impl::release(window);
    }
}
