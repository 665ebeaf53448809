use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::merge::MergeOutcome;
use crate::artifacts::merge::bca_finder::BCAFinder;
use crate::artifacts::merge::resolution::{self, Resolution};
use crate::artifacts::objects::commit::{Commit, SlimCommit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};

impl Repository {
    /// Merge branch `target` into whatever HEAD designates
    ///
    /// Only refs and the object store change; the index and working
    /// directory are not touched. On conflict nothing is written at all.
    pub fn merge(&self, target: &str, message: Option<&str>) -> Result<MergeOutcome> {
        let _lock = self.lock()?;
        let head = self.refs().read_head()?;

        if let Head::Symbolic(current) = &head
            && current.as_ref() == target
        {
            return Ok(MergeOutcome::AlreadyUpToDate);
        }

        let unknown_branch = || Error::UnknownBranch(target.to_string());
        let target_branch = BranchName::try_parse(target).map_err(|_| unknown_branch())?;
        let target_tip = self
            .refs()
            .read_branch(&target_branch)?
            .ok_or_else(unknown_branch)?;
        let current_tip = self.refs().read_head_oid()?.ok_or(Error::NoCommits)?;

        if current_tip == target_tip {
            return Ok(MergeOutcome::AlreadyUpToDate);
        }

        let base_oid = self
            .common_ancestor(&current_tip, &target_tip)?
            .ok_or(Error::NoCommonAncestor)?;

        if base_oid == target_tip {
            return Ok(MergeOutcome::AlreadyUpToDate);
        }
        if base_oid == current_tip {
            self.refs().update_head(&target_tip)?;
            tracing::info!(from = %current_tip, to = %target_tip, "fast-forward");
            return Ok(MergeOutcome::FastForward(target_tip));
        }

        let base = self.snapshot(&base_oid)?;
        let ours = self.snapshot(&current_tip)?;
        let theirs = self.snapshot(&target_tip)?;

        let files = match resolution::resolve(&base, &ours, &theirs) {
            Resolution::Clean(files) => files,
            Resolution::Conflicted(paths) => {
                tracing::warn!(conflicts = paths.len(), "merge stopped on conflicts");
                return Ok(MergeOutcome::Conflicted(paths));
            }
        };

        let message = match message {
            Some(message) => message.trim().to_string(),
            None => default_merge_message(&head, target),
        };
        let commit = Commit::new(
            vec![current_tip, target_tip],
            self.config().timestamp(),
            files,
            message,
        );
        let commit_id = self.database().store_object(&commit)?;
        self.refs().update_head(&commit_id)?;

        tracing::info!(oid = %commit_id, base = %base_oid, "merge commit created");

        Ok(MergeOutcome::Merged(commit_id))
    }

    /// Most recent commit reachable from both `left` and `right` through any
    /// parent, `None` for unrelated histories
    pub fn common_ancestor(&self, left: &ObjectId, right: &ObjectId) -> Result<Option<ObjectId>> {
        let finder = BCAFinder::new(|oid: &ObjectId| self.load_graph_commit(oid));

        finder.find_best_common_ancestor(left, right)
    }

    fn load_graph_commit(&self, oid: &ObjectId) -> Result<SlimCommit> {
        self.database()
            .load_slim_commit(oid)
            .map_err(|err| match err {
                Error::ObjectNotFound(missing) => Error::CorruptHistory(missing),
                other => other,
            })
    }
}

fn default_merge_message(head: &Head, target: &str) -> String {
    match head {
        Head::Symbolic(current) => format!("Merge branch '{target}' into {current}"),
        Head::Detached(_) => format!("Merge branch '{target}' into HEAD"),
    }
}
