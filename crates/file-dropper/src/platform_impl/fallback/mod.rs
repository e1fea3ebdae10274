// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! No window hijack outside of Windows: the host delivers drops through
//! [`crate::FileDropper::capture`].

use std::sync::{Arc, Mutex};

use crate::{DropState, TargetWindow};

pub(crate) fn arm(window: TargetWindow, _state: &Arc<Mutex<DropState>>) -> crate::Result<()> {
    tracing::debug!(window = window.raw(), "no native drop hook on this platform");
    Ok(())
}

#[cfg(test)]
static ACCEPTING: Mutex<Vec<isize>> = Mutex::new(Vec::new());

pub(crate) fn accept_files(_window: TargetWindow, _accept: bool) {
    #[cfg(test)]
    {
        let mut accepting = crate::session::lock(&ACCEPTING);
        accepting.retain(|w| *w != _window.raw());
        if _accept {
            accepting.push(_window.raw());
        }
    }
}

#[cfg(test)]
pub(crate) fn accepting(window: TargetWindow) -> bool {
    crate::session::lock(&ACCEPTING).contains(&window.raw())
}

pub(crate) fn release(_window: TargetWindow) {}
