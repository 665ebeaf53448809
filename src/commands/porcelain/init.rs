use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::errors::{Error, IoContext, Result};
use std::fs;

impl Repository {
    /// Create an empty repository: object store, refs, empty index and a
    /// symbolic HEAD pointing at the (unborn) default branch
    pub async fn init(&self) -> Result<()> {
        if self.is_initialized() {
            return Err(Error::AlreadyInitialized(self.repository_path()));
        }

        let objects_path = self.database().objects_path();
        fs::create_dir_all(objects_path).io_context("unable to create directory", objects_path)?;

        let heads_path = self.refs().heads_path();
        fs::create_dir_all(&heads_path).io_context("unable to create directory", &*heads_path)?;

        self.refs()
            .set_head(&Head::Symbolic(self.config().default_branch.clone()))?;

        let index = self.index();
        let index = index.lock().await;
        // create the index file if it does not exist
        if !index.path().exists() {
            fs::write(index.path(), b"").io_context("unable to create index", index.path())?;
        }

        tracing::info!(path = %self.path().display(), "repository initialized");

        Ok(())
    }
}
