// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

/// How far the takeover of a window's message dispatch has progressed.
///
/// Handles are stored as raw integers so the state can live in a `Sync` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hijack {
    /// Nothing installed.
    #[default]
    NotArmed,
    /// A one-shot hook waits for the window to lose focus.
    WatchingForFocusLoss { hook: isize },
    /// The window procedure was replaced; `original` is the host's procedure.
    Swapped { original: isize },
}

impl Hijack {
    /// Whether enabling drops has to install a new watch hook.
    pub fn needs_watch(&self) -> bool {
        matches!(self, Self::NotArmed)
    }

    pub fn watching(&mut self, hook: isize) {
        debug_assert!(self.needs_watch());
        *self = Self::WatchingForFocusLoss { hook };
    }

    /// Records the swap and returns the hook to uninstall.
    ///
    /// Returns `None` when no watch is pending, in which case nothing may be swapped.
    pub fn swapped(&mut self, original: isize) -> Option<isize> {
        match *self {
            Self::WatchingForFocusLoss { hook } => {
                *self = Self::Swapped { original };
                Some(hook)
            }
            _ => None,
        }
    }

    pub fn original(&self) -> Option<isize> {
        match *self {
            Self::Swapped { original } => Some(original),
            _ => None,
        }
    }
}
