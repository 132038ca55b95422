//! Builds and their external CI identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal identifier for a build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BuildId(pub Uuid);

impl BuildId {
    /// Mint a fresh build id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// External CI coordinates of a build.
///
/// Older API clients never report these, so a build without a CI identity is
/// a normal state, not an error. Publishing short-circuits on absence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiIdentity {
    /// CI account/organization the build ran under.
    pub account: String,

    /// CI project within the account.
    pub project: String,

    /// The build's identifier in the CI system.
    pub external_build_id: String,

    /// Build definition the run belongs to.
    pub definition_id: String,

    /// Source branch the build was produced from.
    pub branch: String,

    /// When the CI run finished producing this build.
    pub produced_at: DateTime<Utc>,
}

/// A build known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Build {
    /// Internal identifier.
    pub id: BuildId,

    /// External CI identity, when the submitting client reported one.
    pub ci: Option<CiIdentity>,
}

impl Build {
    /// Create a build carrying a CI identity.
    pub fn with_ci(id: BuildId, ci: CiIdentity) -> Self {
        Self { id, ci: Some(ci) }
    }

    /// Create a build without a CI identity (older API clients).
    pub fn without_ci(id: BuildId) -> Self {
        Self { id, ci: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_id_display_roundtrip() {
        let id = BuildId::new();
        let shown = id.to_string();
        assert_eq!(shown.parse::<Uuid>().expect("parse"), id.0);
    }

    #[test]
    fn test_build_without_ci_has_no_identity() {
        let build = Build::without_ci(BuildId::new());
        assert!(build.ci.is_none());
    }
}
