use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use derive_new::new;
use std::collections::HashSet;

/// First-parent history starting at a commit
///
/// Walking is lazy: nothing is read until the iterator is advanced, and each
/// call to [`RevList::into_iter`] starts a fresh walk with the same loader.
#[derive(Clone, new)]
pub struct RevList<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<Commit>,
{
    commit_loader: CommitLoaderFn,
    start: ObjectId,
}

impl<CommitLoaderFn> IntoIterator for RevList<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<Commit>,
{
    type Item = Result<(ObjectId, Commit)>;
    type IntoIter = RevListIntoIter<CommitLoaderFn>;

    fn into_iter(self) -> Self::IntoIter {
        RevListIntoIter {
            commit_loader: self.commit_loader,
            current_commit_oid: Some(self.start),
            visited: HashSet::new(),
            is_start: true,
        }
    }
}

pub struct RevListIntoIter<CommitLoaderFn> {
    commit_loader: CommitLoaderFn,
    current_commit_oid: Option<ObjectId>,
    visited: HashSet<ObjectId>,
    is_start: bool,
}

impl<CommitLoaderFn> Iterator for RevListIntoIter<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<Commit>,
{
    type Item = Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        // taking the digest ends the walk after an error
        let commit_oid = self.current_commit_oid.take()?;

        if !self.visited.insert(commit_oid.clone()) {
            tracing::warn!(oid = %commit_oid, "history revisits a commit");
            return Some(Err(Error::HistoryCycle(commit_oid)));
        }

        let is_start = std::mem::replace(&mut self.is_start, false);
        match (self.commit_loader)(&commit_oid) {
            Ok(commit) => {
                self.current_commit_oid = commit.parent().cloned();
                Some(Ok((commit_oid, commit)))
            }
            // a parent link names a commit the store does not have
            Err(Error::ObjectNotFound(missing)) if !is_start => {
                tracing::warn!(oid = %missing, "history references a missing commit");
                Some(Err(Error::CorruptHistory(missing)))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
