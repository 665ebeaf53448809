use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};

impl Repository {
    /// Create a branch at `start` (any revision), or at HEAD when omitted
    pub fn create_branch(&self, branch_name: &str, start: Option<&str>) -> Result<ObjectId> {
        let branch_name = BranchName::try_parse(branch_name)?;
        let _lock = self.lock()?;

        let source_oid = match start {
            Some(revision) => self.resolve_revision(revision)?,
            None => self.resolve_head()?,
        };

        self.refs().create_branch(&branch_name, &source_oid)?;

        Ok(source_oid)
    }

    /// Delete a branch other than the checked-out one, returning its old tip
    pub fn delete_branch(&self, branch_name: &str) -> Result<ObjectId> {
        let branch_name = BranchName::try_parse(branch_name)?;
        let _lock = self.lock()?;

        if self.current_branch()?.as_ref() == Some(&branch_name) {
            return Err(Error::CurrentBranch(branch_name.to_string()));
        }

        let oid = self.refs().delete_branch(&branch_name)?;
        tracing::info!(branch = %branch_name, %oid, "branch deleted");

        Ok(oid)
    }

    /// Branches that have at least one commit, sorted by name
    pub fn list_branches(&self) -> Result<Vec<BranchName>> {
        self.refs().list_branches()
    }
}
