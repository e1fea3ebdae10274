// Copyright 2023-2024 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::Path;

/// Answers whether a dropped path still exists, and as what.
pub trait ExistenceOracle {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// Asks the filesystem. Missing or unreadable paths are neither.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOracle;

impl ExistenceOracle for FsOracle {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_oracle_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"a").unwrap();

        assert!(FsOracle.is_file(&file));
        assert!(!FsOracle.is_dir(&file));
        assert!(FsOracle.is_dir(dir.path()));
        assert!(!FsOracle.is_file(dir.path()));

        let missing = dir.path().join("missing");
        assert!(!FsOracle.is_file(&missing));
        assert!(!FsOracle.is_dir(&missing));
    }
}
