//! Common ancestor finder for merge operations
//!
//! Finds the best common ancestor of two commits, the base of a three-way
//! merge.
//!
//! ## Algorithm Overview
//!
//! Both commits are painted into the graph with a flag each (`SOURCE`,
//! `TARGET`) and the flags are pushed down through *all* parent edges. Commits
//! are processed newest first from a priority queue keyed by timestamp:
//!
//! - A commit that carries both flags is a common ancestor and gets `RESULT`
//! - Everything below a `RESULT` commit is painted `STALE`
//! - A commit is re-queued whenever it gains a flag it did not have, so the
//!   painting is complete even when timestamps are skewed
//!
//! ## Best Common Ancestor Invariant
//!
//! > A best common ancestor of commits X and Y is any common ancestor of X and Y
//! > that is not an ancestor of any other common ancestor.
//!
//! Any common ancestor below another one is reached by that one's `STALE`
//! paint, so the best common ancestors are exactly the `RESULT` commits that
//! are not `STALE`. When a criss-cross history yields several, the most recent
//! one wins (ties broken by the smallest digest) so the choice is stable.
//!
//! ## Loading commits
//!
//! Commits are read through a caller-supplied loader and memoized, so every
//! commit is read from storage at most once per search. Loader failures abort
//! the search and are returned to the caller.

use crate::artifacts::objects::commit::{SlimCommit, Timestamp};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use bitflags::bitflags;
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    struct VisitState: u8 {
        const NONE = 0b00;
        const VISITED_FROM_SOURCE = 0b01;
        const VISITED_FROM_TARGET = 0b10;
        const VISITED_FROM_BOTH = Self::VISITED_FROM_SOURCE.bits() | Self::VISITED_FROM_TARGET.bits();
        const STALE = 0b100; // reachable from a common ancestor
        const RESULT = 0b1000; // found to be a common ancestor
    }
}

impl fmt::Debug for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.contains(VisitState::VISITED_FROM_SOURCE) {
            flags.push("SOURCE");
        }
        if self.contains(VisitState::VISITED_FROM_TARGET) {
            flags.push("TARGET");
        }
        if self.contains(VisitState::STALE) {
            flags.push("STALE");
        }
        if self.contains(VisitState::RESULT) {
            flags.push("RESULT");
        }
        if flags.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", flags.join("|"))
        }
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Paints the commit graph from two starting commits
///
/// # Type Parameters
///
/// * `CommitLoaderFn` - Loads the slim form of a commit. Storage backends
///   (object store, in-memory test graphs) differ only in this function.
struct CommonAncestorsFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<SlimCommit>,
{
    commit_loader: CommitLoaderFn,
    cache: RefCell<HashMap<ObjectId, SlimCommit>>,
}

impl<CommitLoaderFn> CommonAncestorsFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<SlimCommit>,
{
    fn new(commit_loader: CommitLoaderFn) -> Self {
        Self {
            commit_loader,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn load(&self, commit_id: &ObjectId) -> Result<SlimCommit> {
        if let Some(commit) = self.cache.borrow().get(commit_id) {
            return Ok(commit.clone());
        }

        let commit = (self.commit_loader)(commit_id)?;
        self.cache
            .borrow_mut()
            .insert(commit_id.clone(), commit.clone());

        Ok(commit)
    }

    /// Paint every ancestor of `source` and `target` and collect the common
    /// ancestors that no other common ancestor can reach
    fn find_common_ancestors(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> Result<Vec<SlimCommit>> {
        let mut ancestors_states = HashMap::<ObjectId, VisitState>::new();
        let mut priority_queue = BinaryHeap::<(Timestamp, ObjectId)>::new();

        let source_commit = self.load(source_commit_id)?;
        let target_commit = self.load(target_commit_id)?;

        *ancestors_states
            .entry(source_commit.oid.clone())
            .or_insert(VisitState::NONE) |= VisitState::VISITED_FROM_SOURCE;
        *ancestors_states
            .entry(target_commit.oid.clone())
            .or_insert(VisitState::NONE) |= VisitState::VISITED_FROM_TARGET;
        priority_queue.push((source_commit.timestamp, source_commit.oid));
        priority_queue.push((target_commit.timestamp, target_commit.oid));

        while let Some((_, commit_id)) = priority_queue.pop() {
            let mut current_state = ancestors_states
                .get(&commit_id)
                .copied()
                .unwrap_or(VisitState::NONE);

            if current_state.contains(VisitState::VISITED_FROM_BOTH)
                && !current_state.intersects(VisitState::STALE | VisitState::RESULT)
            {
                tracing::debug!(oid = %commit_id, "common ancestor found");
                current_state |= VisitState::RESULT;
                ancestors_states.insert(commit_id.clone(), current_state);
            }

            // everything below a common ancestor is stale
            let mut inherited_state =
                current_state & (VisitState::VISITED_FROM_BOTH | VisitState::STALE);
            if current_state.contains(VisitState::RESULT) {
                inherited_state |= VisitState::STALE;
            }

            let current_commit = self.load(&commit_id)?;
            for parent_id in &current_commit.parents {
                let parent_state = ancestors_states
                    .get(parent_id)
                    .copied()
                    .unwrap_or(VisitState::NONE);

                // re-queue only when the parent gains a flag
                if parent_state.contains(inherited_state) {
                    continue;
                }

                let parent_commit = self.load(parent_id)?;
                ancestors_states.insert(parent_id.clone(), parent_state | inherited_state);
                priority_queue.push((parent_commit.timestamp, parent_commit.oid));
            }
        }

        tracing::trace!(
            states = %ancestors_states
                .iter()
                .map(|(oid, state)| format!("{}: {}", oid.to_short_oid(), state))
                .collect::<Vec<_>>()
                .join(", "),
            "final ancestors states"
        );

        ancestors_states
            .into_iter()
            .filter(|(_, state)| {
                state.contains(VisitState::RESULT) && !state.contains(VisitState::STALE)
            })
            .map(|(oid, _)| self.load(&oid))
            .collect()
    }
}

/// Best common ancestor finder
pub struct BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<SlimCommit>,
{
    inner: CommonAncestorsFinder<CommitLoaderFn>,
}

impl<CommitLoaderFn> BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<SlimCommit>,
{
    /// Creates a new best common ancestor finder with the given commit loader
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let finder = BCAFinder::new(|commit_id| database.load_slim_commit(commit_id));
    /// ```
    pub fn new(commit_loader: CommitLoaderFn) -> Self {
        Self {
            inner: CommonAncestorsFinder::new(commit_loader),
        }
    }

    /// Finds the best common ancestor between two commits
    ///
    /// # Returns
    ///
    /// - `Ok(Some(oid))` - the most recent best common ancestor
    /// - `Ok(None)` - the histories share no commit (different roots)
    /// - `Err(_)` - a commit could not be loaded
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// // Linear history: A <- B <- C <- D
    /// let bca = finder.find_best_common_ancestor(&b, &d)?;
    /// assert_eq!(bca, Some(b));
    ///
    /// // Branched history:
    /// //     A
    /// //    / \
    /// //   B   C
    /// let bca = finder.find_best_common_ancestor(&b, &c)?;
    /// assert_eq!(bca, Some(a));
    /// ```
    pub fn find_best_common_ancestor(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> Result<Option<ObjectId>> {
        if source_commit_id == target_commit_id {
            return Ok(Some(source_commit_id.clone()));
        }

        let best_common_ancestors = self
            .inner
            .find_common_ancestors(source_commit_id, target_commit_id)?;

        if best_common_ancestors.len() > 1 {
            tracing::debug!(
                count = best_common_ancestors.len(),
                "several best common ancestors, picking the most recent"
            );
        }

        // newest first, then the smallest digest
        Ok(best_common_ancestors
            .into_iter()
            .max_by(|left, right| {
                left.timestamp
                    .cmp(&right.timestamp)
                    .then_with(|| right.oid.cmp(&left.oid))
            })
            .map(|commit| commit.oid))
    }

    /// Whether `ancestor_id` is reachable from `commit_id` (a commit reaches itself)
    pub fn is_ancestor(&self, ancestor_id: &ObjectId, commit_id: &ObjectId) -> Result<bool> {
        Ok(self
            .find_best_common_ancestor(ancestor_id, commit_id)?
            .is_some_and(|best| &best == ancestor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::collections::{HashSet, VecDeque};

    /// Graph of slim commits keyed by made-up digests
    struct InMemoryCommitStore {
        commits: HashMap<ObjectId, SlimCommit>,
        clock: f64,
    }

    impl InMemoryCommitStore {
        fn new() -> Self {
            Self {
                commits: HashMap::new(),
                clock: 0.0,
            }
        }

        /// Add a commit one tick after the previous one
        fn add_commit(&mut self, oid: ObjectId, parents: Vec<ObjectId>) {
            self.clock += 1.0;
            let timestamp = Timestamp::new(self.clock);
            self.add_commit_at(oid, parents, timestamp);
        }

        fn add_commit_at(&mut self, oid: ObjectId, parents: Vec<ObjectId>, timestamp: Timestamp) {
            let commit = SlimCommit {
                oid: oid.clone(),
                parents,
                timestamp,
            };
            self.commits.insert(oid, commit);
        }

        fn get_slim_commit(&self, oid: &ObjectId) -> Result<SlimCommit> {
            self.commits
                .get(oid)
                .cloned()
                .ok_or_else(|| Error::CorruptHistory(oid.clone()))
        }

        fn get_parents(&self, oid: &ObjectId) -> Vec<ObjectId> {
            self.commits
                .get(oid)
                .map(|commit| commit.parents.clone())
                .unwrap_or_default()
        }
    }

    fn create_oid(id: &str) -> ObjectId {
        ObjectId::hash(id.as_bytes())
    }

    fn ancestors_of(store: &InMemoryCommitStore, commit: &ObjectId) -> HashSet<ObjectId> {
        let mut ancestors = HashSet::new();
        let mut queue = VecDeque::from([commit.clone()]);

        while let Some(current) = queue.pop_front() {
            if ancestors.insert(current.clone()) {
                queue.extend(store.get_parents(&current));
            }
        }

        ancestors
    }

    /// Check the result against a brute-force reading of the invariant
    fn validate_best_common_ancestor_invariant(
        store: &InMemoryCommitStore,
        commit1: &ObjectId,
        commit2: &ObjectId,
        bca: &ObjectId,
    ) -> bool {
        let common = ancestors_of(store, commit1)
            .intersection(&ancestors_of(store, commit2))
            .cloned()
            .collect::<HashSet<_>>();

        common.contains(bca)
            && common
                .iter()
                .all(|other| other == bca || !ancestors_of(store, other).contains(bca))
    }

    fn best_common_ancestor(
        store: &InMemoryCommitStore,
        commit1: &ObjectId,
        commit2: &ObjectId,
    ) -> Option<ObjectId> {
        let finder = BCAFinder::new(|oid| store.get_slim_commit(oid));
        finder.find_best_common_ancestor(commit1, commit2).unwrap()
    }

    #[fixture]
    fn linear_history() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::new();

        // Linear history: A <- B <- C <- D
        store.add_commit(create_oid("commit_a"), vec![]);
        store.add_commit(create_oid("commit_b"), vec![create_oid("commit_a")]);
        store.add_commit(create_oid("commit_c"), vec![create_oid("commit_b")]);
        store.add_commit(create_oid("commit_d"), vec![create_oid("commit_c")]);

        store
    }

    #[fixture]
    fn simple_merge() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::new();

        //     A
        //    / \
        //   B   C
        //    \ /
        //     D (merge commit)
        let a = create_oid("commit_a");
        let b = create_oid("commit_b");
        let c = create_oid("commit_c");
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a]);
        store.add_commit(create_oid("commit_d"), vec![b, c]);

        store
    }

    #[fixture]
    fn criss_cross_merge() -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::new();

        //     A
        //    / \
        //   B   C
        //   |\ /|
        //   | X |
        //   |/ \|
        //   D   E
        //   |   |
        //   F   G
        let a = create_oid("commit_a");
        let b = create_oid("commit_b");
        let c = create_oid("commit_c");
        let d = create_oid("commit_d");
        let e = create_oid("commit_e");
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a.clone()]);
        store.add_commit(c.clone(), vec![a]);
        store.add_commit(d.clone(), vec![b.clone(), c.clone()]);
        store.add_commit(e.clone(), vec![c, b]);
        store.add_commit(create_oid("commit_f"), vec![d]);
        store.add_commit(create_oid("commit_g"), vec![e]);

        store
    }

    #[rstest]
    #[case::ancestor_and_descendant("commit_b", "commit_d", "commit_b")]
    #[case::descendant_and_ancestor("commit_d", "commit_b", "commit_b")]
    #[case::adjacent("commit_c", "commit_d", "commit_c")]
    #[case::root("commit_a", "commit_d", "commit_a")]
    fn linear_history_finds_the_older_commit(
        linear_history: InMemoryCommitStore,
        #[case] source: &str,
        #[case] target: &str,
        #[case] expected: &str,
    ) {
        let (source, target) = (create_oid(source), create_oid(target));

        let bca = best_common_ancestor(&linear_history, &source, &target);

        assert_eq!(bca, Some(create_oid(expected)));
    }

    #[rstest]
    fn sibling_branches_meet_at_their_fork(simple_merge: InMemoryCommitStore) {
        let (b, c) = (create_oid("commit_b"), create_oid("commit_c"));

        let bca = best_common_ancestor(&simple_merge, &b, &c).unwrap();

        assert_eq!(bca, create_oid("commit_a"));
        assert!(validate_best_common_ancestor_invariant(
            &simple_merge,
            &b,
            &c,
            &bca
        ));
    }

    #[rstest]
    fn merge_commit_reaches_both_sides(simple_merge: InMemoryCommitStore) {
        let (c, d) = (create_oid("commit_c"), create_oid("commit_d"));

        // C is reachable from D through D's second parent
        assert_eq!(best_common_ancestor(&simple_merge, &c, &d), Some(c));
    }

    #[rstest]
    fn criss_cross_picks_one_best_common_ancestor(criss_cross_merge: InMemoryCommitStore) {
        let (f, g) = (create_oid("commit_f"), create_oid("commit_g"));

        let bca = best_common_ancestor(&criss_cross_merge, &f, &g).unwrap();

        // B and C are both best; C is the more recent of the two
        assert_eq!(bca, create_oid("commit_c"));
        assert!(validate_best_common_ancestor_invariant(
            &criss_cross_merge,
            &f,
            &g,
            &bca
        ));
        assert_eq!(best_common_ancestor(&criss_cross_merge, &g, &f), Some(bca));
    }

    #[rstest]
    fn skewed_timestamps_do_not_hide_the_best_ancestor() {
        let mut store = InMemoryCommitStore::new();

        //     A (t=1)
        //    / \
        //   B   C (t=100, clock ahead)
        //   |   |
        //   |   D (t=2)
        //    \ /
        //     (merge target D, source B)
        let a = create_oid("commit_a");
        let b = create_oid("commit_b");
        let c = create_oid("commit_c");
        let d = create_oid("commit_d");
        store.add_commit_at(a.clone(), vec![], Timestamp::new(1.0));
        store.add_commit_at(b.clone(), vec![a.clone()], Timestamp::new(3.0));
        store.add_commit_at(c.clone(), vec![a.clone()], Timestamp::new(100.0));
        store.add_commit_at(d.clone(), vec![c.clone()], Timestamp::new(2.0));
        let e = create_oid("commit_e");
        store.add_commit_at(e.clone(), vec![b, c.clone()], Timestamp::new(4.0));

        let bca = best_common_ancestor(&store, &e, &d).unwrap();

        assert_eq!(bca, c);
        assert!(validate_best_common_ancestor_invariant(&store, &e, &d, &bca));
    }

    #[test]
    fn disjoint_histories_have_no_common_ancestor() {
        let mut store = InMemoryCommitStore::new();

        // Two separate trees with no common history
        let a = create_oid("commit_a");
        let b = create_oid("commit_b");
        let x = create_oid("commit_x");
        let y = create_oid("commit_y");
        store.add_commit(a.clone(), vec![]);
        store.add_commit(b.clone(), vec![a]);
        store.add_commit(x.clone(), vec![]);
        store.add_commit(y.clone(), vec![x]);

        assert_eq!(best_common_ancestor(&store, &b, &y), None);
    }

    #[test]
    fn a_commit_is_its_own_best_common_ancestor() {
        let mut store = InMemoryCommitStore::new();
        let a = create_oid("commit_a");
        store.add_commit(a.clone(), vec![]);

        assert_eq!(best_common_ancestor(&store, &a, &a), Some(a));
    }

    #[rstest]
    fn is_ancestor_follows_reachability(simple_merge: InMemoryCommitStore) {
        let finder = BCAFinder::new(|oid| simple_merge.get_slim_commit(oid));
        let (a, b, c, d) = (
            create_oid("commit_a"),
            create_oid("commit_b"),
            create_oid("commit_c"),
            create_oid("commit_d"),
        );

        assert!(finder.is_ancestor(&a, &d).unwrap());
        assert!(finder.is_ancestor(&c, &d).unwrap());
        assert!(!finder.is_ancestor(&d, &a).unwrap());
        assert!(!finder.is_ancestor(&b, &c).unwrap());
    }

    #[test]
    fn missing_commits_abort_the_search() {
        let mut store = InMemoryCommitStore::new();
        let ghost = create_oid("ghost");
        let a = create_oid("commit_a");
        let b = create_oid("commit_b");
        store.add_commit(a.clone(), vec![ghost.clone()]);
        store.add_commit(b.clone(), vec![]);

        let finder = BCAFinder::new(|oid| store.get_slim_commit(oid));

        assert!(matches!(
            finder.find_best_common_ancestor(&a, &b),
            Err(Error::CorruptHistory(oid)) if oid == ghost
        ));
    }

    #[rstest]
    fn every_commit_is_loaded_once(criss_cross_merge: InMemoryCommitStore) {
        let loads = RefCell::new(HashMap::<ObjectId, usize>::new());
        let finder = BCAFinder::new(|oid| {
            *loads.borrow_mut().entry(oid.clone()).or_default() += 1;
            criss_cross_merge.get_slim_commit(oid)
        });

        finder
            .find_best_common_ancestor(&create_oid("commit_f"), &create_oid("commit_g"))
            .unwrap();

        assert!(loads.borrow().values().all(|count| *count == 1));
    }
}
