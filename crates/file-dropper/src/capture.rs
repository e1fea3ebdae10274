// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use crate::{filter::FilterPolicy, oracle::ExistenceOracle, RECORD_SEPARATOR};

/// A native drop notification, read once and then handed back to the OS.
pub trait DropHandle {
    /// Number of items carried by the drop. May be zero.
    fn count(&self) -> u32;

    /// Path of the item at `index`, or `None` when the OS cannot resolve it.
    fn path(&self, index: u32) -> Option<String>;

    /// Returns the handle to the OS. Called exactly once, after every path was read.
    fn release(self);
}

/// Where the capture state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Drops are disabled.
    #[default]
    Idle,
    /// Waiting for the next drop notification.
    Armed,
    /// Reading the items of one drop notification.
    Capturing,
}

/// Drop-enabled flag, pending raw drop set and filter policy of one target window.
#[derive(Debug, Default)]
pub struct DropState {
    phase: Phase,
    pending: Vec<String>,
    policy: FilterPolicy,
}

impl DropState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn enabled(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Arms or disarms capture. Disarming forgets everything that was dropped.
    pub fn set_enabled(&mut self, enable: bool) {
        match (enable, self.phase) {
            (true, Phase::Idle) => self.phase = Phase::Armed,
            (true, _) => {}
            (false, _) => {
                self.phase = Phase::Idle;
                self.pending.clear();
            }
        }
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: FilterPolicy) {
        self.policy = policy;
    }

    /// Sorted, de-duplicated paths of every drop since the last reset.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Consumes one drop notification.
    ///
    /// Returns `false` without touching `drop` while disabled; the host's own
    /// window procedure already saw that notification and owns the handle.
    pub fn capture<D: DropHandle>(&mut self, drop: D) -> bool {
        if self.phase != Phase::Armed {
            tracing::debug!(phase = ?self.phase, "ignoring drop outside of armed state");
            return false;
        }
        self.phase = Phase::Capturing;

        if !self.policy.allows_multiple() {
            self.pending.clear();
        }

        let count = drop.count();
        for index in 0..count {
            match drop.path(index) {
                Some(path) if !path.is_empty() => self.pending.push(path),
                _ => tracing::warn!(index, "dropped item has no path"),
            }
        }
        drop.release();

        self.pending.sort();
        self.pending.dedup();
        tracing::debug!(count, pending = self.pending.len(), "captured drop");

        self.phase = Phase::Armed;
        true
    }

    /// Applies the current policy to the pending set.
    pub fn filtered<O: ExistenceOracle + ?Sized>(&self, oracle: &O) -> Vec<String> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        self.policy.apply(&self.pending, oracle)
    }

    /// [`Self::filtered`] joined with [`RECORD_SEPARATOR`], without a trailing separator.
    pub fn files<O: ExistenceOracle + ?Sized>(&self, oracle: &O) -> String {
        let mut files = self.filtered(oracle).join(RECORD_SEPARATOR);
        files.truncate(files.trim_end_matches(RECORD_SEPARATOR).len());
        files
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{cell::Cell, collections::HashSet, path::Path, rc::Rc};

    pub(crate) struct FakeDrop {
        pub paths: Vec<&'static str>,
        pub releases: Rc<Cell<u32>>,
    }

    impl FakeDrop {
        pub(crate) fn new(paths: &[&'static str]) -> Self {
            Self {
                paths: paths.to_vec(),
                releases: Rc::default(),
            }
        }
    }

    impl DropHandle for FakeDrop {
        fn count(&self) -> u32 {
            self.paths.len() as u32
        }

        fn path(&self, index: u32) -> Option<String> {
            self.paths.get(index as usize).map(|p| p.to_string())
        }

        fn release(self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeOracle {
        pub files: HashSet<&'static str>,
        pub dirs: HashSet<&'static str>,
        pub lookups: Cell<u32>,
    }

    impl FakeOracle {
        pub(crate) fn new(files: &[&'static str], dirs: &[&'static str]) -> Self {
            Self {
                files: files.iter().copied().collect(),
                dirs: dirs.iter().copied().collect(),
                lookups: Cell::new(0),
            }
        }
    }

    impl ExistenceOracle for FakeOracle {
        fn is_file(&self, path: &Path) -> bool {
            self.lookups.set(self.lookups.get() + 1);
            path.to_str().is_some_and(|p| self.files.contains(p))
        }

        fn is_dir(&self, path: &Path) -> bool {
            self.lookups.set(self.lookups.get() + 1);
            path.to_str().is_some_and(|p| self.dirs.contains(p))
        }
    }

    fn armed() -> DropState {
        let mut state = DropState::new();
        state.set_enabled(true);
        state
    }

    #[test]
    fn capture_sorts_and_dedups() {
        let mut state = armed();
        assert!(state.capture(FakeDrop::new(&["c.png", "a.txt", "c.png", "b.md"])));
        assert_eq!(state.pending(), ["a.txt", "b.md", "c.png"]);
        assert_eq!(state.phase(), Phase::Armed);
    }

    #[test]
    fn capture_accumulates_when_multiple_allowed() {
        let mut state = armed();
        state.capture(FakeDrop::new(&["b.txt"]));
        state.capture(FakeDrop::new(&["a.txt", "b.txt"]));
        assert_eq!(state.pending(), ["a.txt", "b.txt"]);
    }

    #[test]
    fn capture_replaces_when_single() {
        let mut state = armed();
        state.set_policy(FilterPolicy::default().allow_multiple(false));
        state.capture(FakeDrop::new(&["b.txt", "a.txt"]));
        state.capture(FakeDrop::new(&["z.txt"]));
        assert_eq!(state.pending(), ["z.txt"]);
    }

    #[test]
    fn releases_once() {
        let mut state = armed();
        let drop = FakeDrop::new(&["a", "b", "c"]);
        let releases = drop.releases.clone();
        state.capture(drop);
        assert_eq!(releases.get(), 1);
        assert_eq!(state.pending(), ["a", "b", "c"]);
    }

    #[test]
    fn empty_drop_is_valid() {
        let mut state = armed();
        let drop = FakeDrop::new(&[]);
        let releases = drop.releases.clone();
        assert!(state.capture(drop));
        assert!(state.pending().is_empty());
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn disabled_state_leaves_handle_alone() {
        let mut state = DropState::new();
        let drop = FakeDrop::new(&["a.txt"]);
        let releases = drop.releases.clone();
        assert!(!state.capture(drop));
        assert_eq!(releases.get(), 0);
        assert!(state.pending().is_empty());
    }

    #[test]
    fn disable_clears_pending() {
        let mut state = armed();
        state.capture(FakeDrop::new(&["a.txt"]));
        state.set_enabled(false);
        assert!(state.pending().is_empty());
        state.set_enabled(true);
        assert!(state.pending().is_empty());
        state.capture(FakeDrop::new(&["b.txt"]));
        assert_eq!(state.pending(), ["b.txt"]);
    }

    #[test]
    fn empty_pending_skips_filter() {
        let state = armed();
        let oracle = FakeOracle::default();
        assert_eq!(state.files(&oracle), "");
        assert_eq!(oracle.lookups.get(), 0);
    }

    #[test]
    fn files_is_idempotent() {
        let mut state = armed();
        state.capture(FakeDrop::new(&["b.txt", "a.txt", "gone.txt"]));
        let oracle = FakeOracle::new(&["a.txt", "b.txt"], &[]);
        let first = state.files(&oracle);
        assert_eq!(first, "a.txt\nb.txt");
        assert_eq!(state.files(&oracle), first);
        assert_eq!(state.pending().len(), 3);
    }
}
