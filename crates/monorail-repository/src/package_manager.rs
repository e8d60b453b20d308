use std::{fmt, path::Path};

/// The package manager whose runner script sub-commands are spawned
/// through, so that package-local binaries resolve correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
}

impl PackageManager {
    /// Detects the workspace's package manager from the lockfile present at
    /// the repository root. Yarn is the fallback when no lockfile is found.
    pub fn detect(repo_root: &Path) -> Self {
        for (lockfile, manager) in [
            ("yarn.lock", PackageManager::Yarn),
            ("package-lock.json", PackageManager::Npm),
            ("pnpm-lock.yaml", PackageManager::Pnpm),
        ] {
            if repo_root.join(lockfile).exists() {
                return manager;
            }
        }
        PackageManager::Yarn
    }

    /// Name of the runner binary.
    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::fs;

    use test_case::test_case;

    #[test_case("yarn.lock", PackageManager::Yarn)]
    #[test_case("package-lock.json", PackageManager::Npm)]
    #[test_case("pnpm-lock.yaml", PackageManager::Pnpm)]
    fn test_detect_by_lockfile(lockfile: &str, expected: PackageManager) {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(lockfile), "").unwrap();
        assert_eq!(PackageManager::detect(tmp.path()), expected);
    }

    #[test]
    fn test_detect_defaults_to_yarn() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(PackageManager::detect(tmp.path()), PackageManager::Yarn);
    }
}
