// SPDX-License-Identifier: GPL-3.0-only

//! Build identity reported by the versions collector.

const UNSET: &str = "(unset)";

/// Set once at start-up, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub commit_id: String,
}

impl BuildInfo {
    pub fn new(version: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            commit_id: commit_id.into(),
        }
    }

    /// Package version and the git revision recorded by the build script.
    pub fn from_build_env() -> Self {
        Self::new(
            env!("CARGO_PKG_VERSION"),
            option_env!("VERGEN_GIT_SHA")
                .filter(|sha| !sha.is_empty())
                .unwrap_or(UNSET),
        )
    }

    pub fn is_known(&self) -> bool {
        !self.version.is_empty()
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{} ({})", self.version, self.commit_id)
    }
}
