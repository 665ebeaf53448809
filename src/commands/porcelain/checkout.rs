use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::{Error, Result};

impl Repository {
    /// Point HEAD at a branch or commit and write that commit's files
    ///
    /// A branch name makes HEAD symbolic; a digest or unique digest prefix
    /// detaches it. Files tracked by the target snapshot are overwritten,
    /// every other file in the working directory is left alone. Refused while
    /// anything is staged.
    pub async fn checkout(&self, target: &str) -> Result<Head> {
        let _lock = self.lock_async().await?;
        let index = self.index();
        let mut index = index.lock().await;

        index.rehydrate()?;
        if !index.is_empty() {
            tracing::warn!(staged = index.len(), "checkout refused: index not empty");
            return Err(Error::DirtyIndex);
        }

        let branch_tip = match BranchName::try_parse(target) {
            Ok(branch) => self.refs().read_branch(&branch)?.map(|oid| (branch, oid)),
            Err(_) => None,
        };
        let (head, target_oid) = match branch_tip {
            Some((branch, oid)) => (Head::Symbolic(branch), oid),
            None => {
                let oid = self.resolve_revision(target)?;
                (Head::Detached(oid.clone()), oid)
            }
        };

        // read every blob before touching the working directory
        let snapshot = self.snapshot(&target_oid)?;
        let files = snapshot
            .entries()
            .map(|entry| {
                self.database()
                    .load(entry.oid())
                    .map(|content| (entry.path(), content))
            })
            .collect::<Result<Vec<_>>>()?;

        for (path, content) in &files {
            self.workspace().write_file(path, content)?;
        }
        self.refs().set_head(&head)?;

        tracing::info!(?head, files = files.len(), "checked out");

        Ok(head)
    }
}
