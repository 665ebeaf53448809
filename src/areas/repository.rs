use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::lock::RepositoryLock;
use crate::areas::refs::{Head, Refs};
use crate::areas::workspace::{REPOSITORY_DIR, Workspace};
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::MIN_PREFIX_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::config::Config;
use crate::errors::{Error, IoContext, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const LOCK_FILE_NAME: &str = "lock";

pub struct Repository {
    /// Working directory root (the parent of `.stow`)
    path: Box<Path>,
    config: Config,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    /// Build a repository rooted exactly at `path`, creating the directory if needed
    ///
    /// Nothing under `.stow` is touched; see [`Repository::init`].
    pub fn new(path: &Path, config: Config) -> Result<Self> {
        std::fs::create_dir_all(path).io_context("unable to create directory", path)?;
        let path = path
            .canonicalize()
            .io_context("unable to resolve", path)?;
        let repository_path = path.join(REPOSITORY_DIR);

        let index = Index::new(repository_path.join("index").into_boxed_path());
        let database = Database::new(repository_path.join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(repository_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            config,
            index: Arc::new(Mutex::new(index)),
            database,
            workspace,
            refs,
        })
    }

    /// Find the repository containing `start` by walking up its ancestors
    pub fn open(start: &Path, config: Config) -> Result<Self> {
        let start = start.canonicalize().io_context("unable to resolve", start)?;

        let root = start
            .ancestors()
            .find(|candidate| candidate.join(REPOSITORY_DIR).is_dir())
            .ok_or_else(|| Error::NotARepository(start.clone()))?;

        Self::new(root, config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repository_path(&self) -> PathBuf {
        self.path.join(REPOSITORY_DIR)
    }

    pub fn is_initialized(&self) -> bool {
        self.repository_path().is_dir()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Take the exclusive repository lock for the lifetime of the guard
    pub fn lock(&self) -> Result<RepositoryLock> {
        RepositoryLock::acquire(
            &self.repository_path().join(LOCK_FILE_NAME),
            self.config.lock_timeout,
        )
    }

    /// [`Repository::lock`] for async commands, waiting without blocking the runtime
    pub async fn lock_async(&self) -> Result<RepositoryLock> {
        RepositoryLock::acquire_async(
            &self.repository_path().join(LOCK_FILE_NAME),
            self.config.lock_timeout,
        )
        .await
    }

    /// Branch HEAD follows, `None` when HEAD is detached
    pub fn current_branch(&self) -> Result<Option<BranchName>> {
        match self.refs.read_head()? {
            Head::Symbolic(branch) => Ok(Some(branch)),
            Head::Detached(_) => Ok(None),
        }
    }

    /// The commit HEAD designates
    pub fn resolve_head(&self) -> Result<ObjectId> {
        self.refs.read_head_oid()?.ok_or(Error::NoCommits)
    }

    /// Resolve a user-supplied revision: a branch name, then a digest or
    /// unique digest prefix naming a commit
    pub fn resolve_revision(&self, revision: &str) -> Result<ObjectId> {
        if let Ok(branch) = BranchName::try_parse(revision)
            && let Some(oid) = self.refs.read_branch(&branch)?
        {
            return Ok(oid);
        }

        if revision.len() >= MIN_PREFIX_LENGTH
            && let Some(oid) = self.database.resolve_prefix(revision)?
        {
            // only commits name a point in history
            self.database.parse_object_as_commit(&oid)?;
            return Ok(oid);
        }

        Err(Error::UnknownRevision(revision.to_string()))
    }
}
