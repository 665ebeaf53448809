use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};

impl Repository {
    /// Record the index as a new commit on top of HEAD
    ///
    /// Every staged file is re-read and checked against its staged digest
    /// before anything is written. Then the file contents and the commit are
    /// stored, HEAD (or its branch) advances, and the index is cleared. A
    /// failure before the ref moves leaves refs and index as they were.
    pub async fn commit(&self, message: &str) -> Result<ObjectId> {
        let _lock = self.lock_async().await?;
        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        if index.is_empty() {
            tracing::warn!("commit refused: nothing staged");
            return Err(Error::NothingToCommit);
        }

        let mut contents = Vec::with_capacity(index.len());
        for entry in index.entries() {
            let content = match self.workspace().read_file(entry.path()) {
                Ok(content) => content,
                Err(Error::FileNotFound(_)) => {
                    tracing::warn!(path = entry.as_str(), "commit refused: staged file missing");
                    return Err(Error::StagedFileMissing(entry.to_path_buf()));
                }
                Err(err) => return Err(err),
            };

            if !entry.oid().matches(&content) {
                tracing::warn!(path = entry.as_str(), "commit refused: staged file modified");
                return Err(Error::StagedFileModified(entry.to_path_buf()));
            }

            contents.push(content);
        }

        let parent = self.refs().read_head_oid()?;

        for content in &contents {
            self.database().store(content)?;
        }

        let commit = Commit::new(
            parent.into_iter().collect(),
            self.config().timestamp(),
            index.entries().cloned().collect(),
            message.trim().to_string(),
        );
        let commit_id = self.database().store_object(&commit)?;
        self.refs().update_head(&commit_id)?;

        index.clear();
        index.write_updates()?;

        tracing::info!(
            oid = %commit_id,
            files = commit.files().len(),
            root = commit.parents().is_empty(),
            "commit created"
        );

        Ok(commit_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::areas::repository::Repository;
    use crate::artifacts::objects::blob::Blob;
    use crate::artifacts::objects::commit::Timestamp;
    use crate::artifacts::objects::object_id::ObjectId;
    use crate::commands::test_support::Sandbox;
    use crate::config::Config;
    use crate::errors::Error;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[tokio::test]
    async fn commit_records_the_staged_snapshot() {
        let sandbox = Sandbox::new().await;

        let oid = sandbox
            .commit_files(&[("a.txt", "alpha"), ("b/c.txt", "gamma")], "first")
            .await;

        let commit = sandbox.repository.database().parse_object_as_commit(&oid).unwrap();
        let files = commit
            .files()
            .iter()
            .map(|entry| (entry.as_str(), entry.oid().clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            files,
            vec![
                ("a.txt", ObjectId::hash(b"alpha")),
                ("b/c.txt", ObjectId::hash(b"gamma"))
            ]
        );
        assert!(commit.parents().is_empty());
        assert_eq!(commit.message(), "first");
        assert_eq!(sandbox.repository.resolve_head().unwrap(), oid);
        assert!(sandbox.repository.staged_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_stores_file_contents() {
        let sandbox = Sandbox::new().await;

        sandbox.commit_files(&[("a.txt", "alpha")], "first").await;

        let blob = sandbox
            .repository
            .database()
            .parse_object::<Blob>(&ObjectId::hash(b"alpha"))
            .unwrap();
        assert_eq!(blob.content().as_ref(), b"alpha");
    }

    #[tokio::test]
    async fn second_commit_has_the_first_as_parent() {
        let sandbox = Sandbox::new().await;
        let first = sandbox.commit_files(&[("a.txt", "1")], "first").await;

        let second = sandbox.commit_files(&[("a.txt", "2")], "second").await;

        let commit = sandbox.repository.database().parse_object_as_commit(&second).unwrap();
        assert_eq!(commit.parents(), &[first]);
    }

    #[tokio::test]
    async fn empty_index_writes_nothing() {
        let sandbox = Sandbox::new().await;

        let result = sandbox.repository.commit("nothing").await;

        assert!(matches!(result, Err(Error::NothingToCommit)));
        assert_eq!(sandbox.object_count(), 0);
        assert!(matches!(sandbox.repository.resolve_head(), Err(Error::NoCommits)));
    }

    #[tokio::test]
    async fn modified_file_is_refused_until_restaged() {
        let sandbox = Sandbox::new().await;
        let head_before = sandbox.commit_files(&[("x.txt", "v0")], "base").await;
        let path = sandbox.write("x.txt", "v1");
        sandbox.repository.stage_file(&path).await.unwrap();
        sandbox.write("x.txt", "v2");
        let objects_before = sandbox.object_count();

        let result = sandbox.repository.commit("too late").await;

        assert!(matches!(result, Err(Error::StagedFileModified(ref p)) if p == Path::new("x.txt")));
        assert_eq!(sandbox.repository.resolve_head().unwrap(), head_before);
        assert_eq!(sandbox.object_count(), objects_before);
        let staged = sandbox.repository.staged_entries().await.unwrap();
        assert_eq!(staged[0].oid(), &ObjectId::hash(b"v1"));

        sandbox.repository.stage_file(&path).await.unwrap();
        let oid = sandbox.repository.commit("restaged").await.unwrap();
        let commit = sandbox.repository.database().parse_object_as_commit(&oid).unwrap();
        assert_eq!(commit.files()[0].oid(), &ObjectId::hash(b"v2"));
    }

    #[tokio::test]
    async fn deleted_file_is_reported_missing() {
        let sandbox = Sandbox::new().await;
        let path = sandbox.write("gone.txt", "soon");
        sandbox.repository.stage_file(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let result = sandbox.repository.commit("missing").await;

        assert!(matches!(result, Err(Error::StagedFileMissing(_))));
        assert_eq!(sandbox.repository.staged_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_leaves_head_and_index_alone() {
        let sandbox = Sandbox::new().await;
        let head_before = sandbox.commit_files(&[("a.txt", "1")], "first").await;
        let path = sandbox.write("b.txt", "2");
        sandbox.repository.stage_file(&path).await.unwrap();
        let objects_path = sandbox.repository.database().objects_path().to_path_buf();
        std::fs::remove_dir_all(&objects_path).unwrap();
        std::fs::write(&objects_path, "not a directory").unwrap();

        let result = sandbox.repository.commit("second").await;

        assert!(matches!(result, Err(Error::Io { .. })));
        assert_eq!(sandbox.repository.resolve_head().unwrap(), head_before);
        let staged = sandbox.repository.staged_entries().await.unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].as_str(), "b.txt");
    }

    #[tokio::test]
    async fn detached_head_advances_without_moving_branches() {
        let sandbox = Sandbox::new().await;
        let first = sandbox.commit_files(&[("a.txt", "1")], "first").await;
        sandbox.repository.checkout(first.as_ref()).await.unwrap();

        let second = sandbox.commit_files(&[("a.txt", "2")], "second").await;

        assert_eq!(sandbox.repository.resolve_head().unwrap(), second);
        assert_eq!(sandbox.repository.resolve_revision("master").unwrap(), first);
    }

    #[tokio::test]
    async fn same_content_and_time_give_the_same_digest() {
        let commit_in_fresh_repository = || async {
            let dir = TempDir::new().unwrap();
            let config = Config {
                commit_date: Some(Timestamp::new(1_700_000_000.5)),
                ..Config::default()
            };
            let repository = Repository::new(dir.path(), config).unwrap();
            repository.init().await.unwrap();
            let path = dir.path().join("a.txt");
            std::fs::write(&path, "same").unwrap();
            repository.stage_file(&path).await.unwrap();
            repository.commit("same").await.unwrap()
        };

        assert_eq!(
            commit_in_fresh_repository().await,
            commit_in_fresh_repository().await
        );
    }
}
