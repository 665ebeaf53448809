//! File-level three-way merge
//!
//! Every path present in either tip is compared against the common ancestor
//! (the base). Content is never inspected: a path either keeps one side's
//! digest or is a conflict.

use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::log::snapshot::Snapshot;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// How one path differs between the base and the two tips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChange {
    /// Same digest in the base and both tips
    Unchanged,
    /// Only the current tip changed it
    Current,
    /// Only the target tip changed it
    Target,
    /// Both tips changed it to the same digest
    Both,
    /// Both tips changed it, differently
    Conflict,
}

impl PathChange {
    pub fn classify(
        base: Option<&ObjectId>,
        current: Option<&ObjectId>,
        target: Option<&ObjectId>,
    ) -> Self {
        match (current == base, target == base) {
            (true, true) => PathChange::Unchanged,
            (false, true) => PathChange::Current,
            (true, false) => PathChange::Target,
            (false, false) if current == target => PathChange::Both,
            (false, false) => PathChange::Conflict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Entries of the merged snapshot, ordered by path
    Clean(Vec<IndexEntry>),
    /// Paths changed differently on both sides
    Conflicted(BTreeSet<PathBuf>),
}

pub fn resolve(base: &Snapshot, current: &Snapshot, target: &Snapshot) -> Resolution {
    let paths = current.paths().chain(target.paths()).collect::<BTreeSet<_>>();

    let mut merged = Vec::new();
    let mut conflicts = BTreeSet::new();

    for path in paths {
        let change = PathChange::classify(base.get(path), current.get(path), target.get(path));
        tracing::trace!(path = %path.display(), ?change, "classified");

        let entry = match change {
            PathChange::Unchanged | PathChange::Current | PathChange::Both => current.entry(path),
            PathChange::Target => target.entry(path),
            PathChange::Conflict => {
                conflicts.insert(path.clone());
                continue;
            }
        };

        // absent on the winning side means the path drops out
        if let Some(entry) = entry {
            merged.push(entry.clone());
        }
    }

    if conflicts.is_empty() {
        Resolution::Clean(merged)
    } else {
        Resolution::Conflicted(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn oid(content: &str) -> ObjectId {
        ObjectId::hash(content.as_bytes())
    }

    fn snapshot(files: &[(&str, &str)]) -> Snapshot {
        Snapshot::from_entries(
            files
                .iter()
                .map(|(path, content)| IndexEntry::try_new(path, oid(content)).unwrap()),
        )
    }

    #[rstest]
    #[case::unchanged(Some("a"), Some("a"), Some("a"), PathChange::Unchanged)]
    #[case::current_only(Some("a"), Some("b"), Some("a"), PathChange::Current)]
    #[case::target_only(Some("a"), Some("a"), Some("c"), PathChange::Target)]
    #[case::identical(Some("a"), Some("b"), Some("b"), PathChange::Both)]
    #[case::conflict(Some("a"), Some("b"), Some("c"), PathChange::Conflict)]
    #[case::added_in_target(None, None, Some("c"), PathChange::Target)]
    #[case::added_differently(None, Some("b"), Some("c"), PathChange::Conflict)]
    fn classifies_against_the_base(
        #[case] base: Option<&str>,
        #[case] current: Option<&str>,
        #[case] target: Option<&str>,
        #[case] expected: PathChange,
    ) {
        let (base, current, target) = (base.map(oid), current.map(oid), target.map(oid));

        assert_eq!(
            PathChange::classify(base.as_ref(), current.as_ref(), target.as_ref()),
            expected
        );
    }

    #[test]
    fn clean_merge_takes_each_side_changes() {
        let base = snapshot(&[("shared.txt", "base"), ("left.txt", "base"), ("right.txt", "base")]);
        let current = snapshot(&[("shared.txt", "base"), ("left.txt", "mine"), ("right.txt", "base")]);
        let target = snapshot(&[
            ("shared.txt", "base"),
            ("left.txt", "base"),
            ("right.txt", "theirs"),
            ("new.txt", "new"),
        ]);

        let resolution = resolve(&base, &current, &target);

        assert_eq!(
            resolution,
            Resolution::Clean(
                snapshot(&[
                    ("left.txt", "mine"),
                    ("new.txt", "new"),
                    ("right.txt", "theirs"),
                    ("shared.txt", "base"),
                ])
                .entries()
                .cloned()
                .collect()
            )
        );
    }

    #[test]
    fn differing_changes_conflict() {
        let base = snapshot(&[("x", "base"), ("y", "base")]);
        let current = snapshot(&[("x", "mine"), ("y", "mine")]);
        let target = snapshot(&[("x", "theirs"), ("y", "mine")]);

        assert_eq!(
            resolve(&base, &current, &target),
            Resolution::Conflicted(BTreeSet::from([PathBuf::from("x")]))
        );
    }
}
