use crate::artifacts::branch::{DEFAULT_BRANCH, INVALID_BRANCH_NAME_REGEX, REF_PREFIX};
use crate::errors::{Error, Result};
use std::sync::LazyLock;

static INVALID_BRANCH_NAME: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(INVALID_BRANCH_NAME_REGEX).expect("branch name pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() || INVALID_BRANCH_NAME.is_match(&name) {
            return Err(Error::InvalidBranchName(name));
        }

        Ok(Self(name))
    }

    /// Parse the target of a symbolic ref, e.g. `refs/heads/main`
    pub fn try_parse_ref_path(ref_path: &str) -> Result<Self> {
        let name = ref_path
            .strip_prefix(REF_PREFIX)
            .ok_or_else(|| Error::InvalidBranchName(ref_path.to_string()))?;

        Self::try_parse(name)
    }

    pub fn default_branch() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }

    /// Path of the branch file relative to the repository directory
    pub fn ref_path(&self) -> String {
        format!("{REF_PREFIX}{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
