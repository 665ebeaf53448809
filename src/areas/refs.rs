//! References (branches and HEAD)
//!
//! References are human-readable names pointing to commits.
//!
//! ## HEAD
//!
//! HEAD is a small two-state machine:
//! - Symbolic: `ref: refs/heads/<branch>\n<tip digest or empty>`. The second
//!   line mirrors the branch tip for readers; the branch file is authoritative.
//! - Detached: a bare 40-character digest.
//!
//! No other HEAD layouts are accepted.
//!
//! ## Branches
//!
//! `refs/heads/<branch>` holds a single line with the tip digest. A branch
//! without a file is unborn (it has no commits yet).

use crate::areas::write_atomically;
use crate::artifacts::branch::REF_PREFIX;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoContext, Result};
use derive_new::new;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Regex pattern for the first line of a symbolic HEAD
const SYMREF_REGEX: &str = r"^ref: (.+)$";

static SYMREF: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(SYMREF_REGEX).expect("symref pattern is a valid regex"));

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Where HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD follows a branch
    Symbolic(BranchName),
    /// HEAD holds a commit directly
    Detached(ObjectId),
}

impl Head {
    fn parse(content: &str) -> Result<Self> {
        let malformed = || Error::MalformedHead(content.to_string());
        let mut lines = content.lines();
        let first_line = lines.next().ok_or_else(malformed)?.trim_end();

        if let Some(symref) = SYMREF.captures(first_line) {
            let branch = BranchName::try_parse_ref_path(&symref[1]).map_err(|_| malformed())?;

            // the mirror line is either empty or a digest
            match lines.next().map(str::trim) {
                None | Some("") => {}
                Some(tip) => {
                    ObjectId::try_parse(tip).map_err(|_| malformed())?;
                }
            }
            if lines.any(|line| !line.trim().is_empty()) {
                return Err(malformed());
            }

            return Ok(Head::Symbolic(branch));
        }

        ObjectId::try_parse(content.trim())
            .map(Head::Detached)
            .map_err(|_| malformed())
    }

    fn render(&self, tip: Option<&ObjectId>) -> String {
        match self {
            Head::Symbolic(branch) => format!(
                "ref: {}\n{}",
                branch.ref_path(),
                tip.map(ObjectId::to_string).unwrap_or_default()
            ),
            Head::Detached(oid) => oid.to_string(),
        }
    }
}

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the repository directory (typically `.stow`)
    path: Box<Path>,
}

impl Refs {
    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.path.join(REF_PREFIX).into_boxed_path()
    }

    fn branch_path(&self, branch: &BranchName) -> Box<Path> {
        self.path.join(branch.ref_path()).into_boxed_path()
    }

    pub fn read_head(&self) -> Result<Head> {
        let head_path = self.head_path();
        let content =
            std::fs::read_to_string(&head_path).io_context("unable to read HEAD", &*head_path)?;

        Head::parse(&content)
    }

    /// Point HEAD somewhere new, refreshing the tip mirror for symbolic HEADs
    pub fn set_head(&self, head: &Head) -> Result<()> {
        let tip = match head {
            Head::Symbolic(branch) => self.read_branch(branch)?,
            Head::Detached(_) => None,
        };

        write_atomically(&self.head_path(), head.render(tip.as_ref()).as_bytes())?;
        tracing::debug!(?head, "HEAD updated");

        Ok(())
    }

    /// The commit HEAD resolves to, or `None` when its branch is unborn
    pub fn read_head_oid(&self) -> Result<Option<ObjectId>> {
        match self.read_head()? {
            Head::Symbolic(branch) => self.read_branch(&branch),
            Head::Detached(oid) => Ok(Some(oid)),
        }
    }

    /// Advance whatever HEAD designates to `oid`
    ///
    /// For a symbolic HEAD the branch file moves first, then the mirror line.
    pub fn update_head(&self, oid: &ObjectId) -> Result<()> {
        match self.read_head()? {
            Head::Symbolic(branch) => self.update_branch(&branch, oid),
            Head::Detached(_) => self.set_head(&Head::Detached(oid.clone())),
        }
    }

    pub fn branch_exists(&self, branch: &BranchName) -> bool {
        self.branch_path(branch).is_file()
    }

    /// Read a branch tip, `None` when the branch has no file
    pub fn read_branch(&self, branch: &BranchName) -> Result<Option<ObjectId>> {
        let branch_path = self.branch_path(branch);

        let content = match std::fs::read_to_string(&branch_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).io_context("unable to read ref", &*branch_path),
        };

        ObjectId::try_parse(content.trim())
            .map(Some)
            .map_err(|err| Error::MalformedRef {
                name: branch.to_string(),
                reason: err.to_string(),
            })
    }

    /// Move a branch tip, keeping the HEAD mirror in sync when HEAD follows it
    pub fn update_branch(&self, branch: &BranchName, oid: &ObjectId) -> Result<()> {
        write_atomically(&self.branch_path(branch), format!("{oid}\n").as_bytes())?;
        tracing::info!(%branch, %oid, "branch updated");

        if self.read_head()? == Head::Symbolic(branch.clone()) {
            let head = Head::Symbolic(branch.clone());
            write_atomically(&self.head_path(), head.render(Some(oid)).as_bytes())?;
        }

        Ok(())
    }

    pub fn create_branch(&self, branch: &BranchName, oid: &ObjectId) -> Result<()> {
        if self.branch_exists(branch) {
            return Err(Error::BranchExists(branch.to_string()));
        }

        self.update_branch(branch, oid)
    }

    pub fn delete_branch(&self, branch: &BranchName) -> Result<ObjectId> {
        let oid = self
            .read_branch(branch)?
            .ok_or_else(|| Error::UnknownBranch(branch.to_string()))?;
        let branch_path = self.branch_path(branch);

        std::fs::remove_file(&branch_path).io_context("unable to delete ref", &*branch_path)?;
        self.prune_branch_empty_parent_dirs(&branch_path)?;

        Ok(oid)
    }

    pub fn list_branches(&self) -> Result<Vec<BranchName>> {
        let heads_path = self.heads_path();

        let mut branches = WalkDir::new(&heads_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&heads_path).ok()?;
                let name = relative_path.to_str()?.replace(std::path::MAIN_SEPARATOR, "/");
                BranchName::try_parse(name).ok()
            })
            .collect::<Vec<_>>();
        branches.sort();

        Ok(branches)
    }

    fn prune_branch_empty_parent_dirs(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && parent != self.heads_path().as_ref()
            && parent
                .read_dir()
                .io_context("unable to list ref directory", parent)?
                .next()
                .is_none()
        {
            std::fs::remove_dir(parent).io_context("unable to remove ref directory", parent)?;
            self.prune_branch_empty_parent_dirs(parent)?;
        }

        Ok(())
    }
}
