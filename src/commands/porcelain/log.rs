use crate::areas::repository::Repository;
use crate::artifacts::log::HistoryEntry;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::log::snapshot::Snapshot;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;

impl Repository {
    /// Lazy first-parent walk from `start` to the root commit
    pub fn history(&self, start: ObjectId) -> RevList<impl Fn(&ObjectId) -> Result<Commit> + '_> {
        let database = self.database();

        RevList::new(
            move |oid: &ObjectId| database.parse_object_as_commit(oid),
            start,
        )
    }

    /// History of HEAD, newest first
    pub fn view_history(&self) -> Result<Vec<HistoryEntry>> {
        self.collect_history(self.resolve_head()?)
    }

    /// History of any revision, newest first
    pub fn view_history_from(&self, revision: &str) -> Result<Vec<HistoryEntry>> {
        self.collect_history(self.resolve_revision(revision)?)
    }

    fn collect_history(&self, start: ObjectId) -> Result<Vec<HistoryEntry>> {
        self.history(start)
            .into_iter()
            .map(|item| item.map(|(oid, commit)| HistoryEntry::from_commit(oid, &commit)))
            .collect()
    }

    /// Effective file map of a commit
    pub fn snapshot(&self, commit_id: &ObjectId) -> Result<Snapshot> {
        Snapshot::from_history(self.history(commit_id.clone()))
    }
}
