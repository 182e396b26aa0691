//! The Commit Store: value-semantic history of Scene Graph snapshots with
//! linear undo and forward-branch redo (§4.2).
//!
//! Grounded on the teacher's `editor::command::CommandStack` (top/undo/redo
//! bookkeeping), but snapshot-based rather than command-based: the spec
//! requires whole-graph value semantics, not a replayable command log.

use fxhash::FxHashMap;

use crate::error::CommitError;
use crate::graph::SceneGraph;
use crate::id::{Id, IdAllocator, EMPTY_ID};

#[derive(Clone, Debug)]
pub struct Commit {
    pub id: Id,
    pub parent_id: Id,
    pub graph: SceneGraph,
    pub message: String,
    pub time: std::time::SystemTime,
}

#[derive(Debug)]
pub struct CommitStore {
    scratch: SceneGraph,
    current: Id,
    branch_head: Id,
    commits: FxHashMap<Id, Commit>,
    commit_ids: IdAllocator,
}

impl Default for CommitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitStore {
    pub fn new() -> Self {
        Self::from_graph(SceneGraph::new())
    }

    pub fn from_graph(graph: SceneGraph) -> Self {
        let mut commit_ids = IdAllocator::default();
        let root_id = commit_ids.next();
        let mut commits = FxHashMap::default();
        commits.insert(
            root_id,
            Commit {
                id: root_id,
                parent_id: EMPTY_ID,
                graph: graph.snapshot(),
                message: "root".to_string(),
                time: std::time::SystemTime::now(),
            },
        );
        Self {
            scratch: graph,
            current: root_id,
            branch_head: root_id,
            commits,
            commit_ids,
        }
    }

    pub fn scratch(&self) -> &SceneGraph {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut SceneGraph {
        &mut self.scratch
    }

    pub fn current(&self) -> Id {
        self.current
    }

    pub fn branch_head(&self) -> Id {
        self.branch_head
    }

    pub fn commit(&mut self, message: impl Into<String>) -> Id {
        let id = self.commit_ids.next();
        self.commits.insert(
            id,
            Commit {
                id,
                parent_id: self.current,
                graph: self.scratch.snapshot(),
                message: message.into(),
                time: std::time::SystemTime::now(),
            },
        );
        self.current = id;
        self.branch_head = id;
        id
    }

    pub fn can_undo(&self) -> bool {
        self.commits
            .get(&self.current)
            .map(|c| c.parent_id != EMPTY_ID)
            .unwrap_or(false)
    }

    pub fn can_redo(&self) -> bool {
        self.branch_head != self.current
    }

    /// Replaces `scratch` with the parent of `current` and moves `current`
    /// there. `branch_head` is left untouched -- it is the redo bookmark.
    pub fn undo(&mut self) -> Result<(), CommitError> {
        let parent_id = self
            .commits
            .get(&self.current)
            .map(|c| c.parent_id)
            .ok_or(CommitError::NoSuchCommit(self.current))?;
        if parent_id == EMPTY_ID {
            return Err(CommitError::NothingToUndo);
        }
        let parent = self
            .commits
            .get(&parent_id)
            .ok_or(CommitError::NoSuchCommit(parent_id))?;
        self.scratch = parent.graph.snapshot();
        self.current = parent_id;
        Ok(())
    }

    /// Walks from `branch_head` toward the root until it finds the commit
    /// whose parent is `current`, and checks it out. `branch_head` is left
    /// untouched.
    pub fn redo(&mut self) -> Result<(), CommitError> {
        if !self.can_redo() {
            return Err(CommitError::NothingToRedo);
        }
        let mut cursor = self.branch_head;
        loop {
            let commit = self
                .commits
                .get(&cursor)
                .ok_or(CommitError::NoSuchCommit(cursor))?;
            if commit.parent_id == self.current {
                self.scratch = commit.graph.snapshot();
                self.current = cursor;
                return Ok(());
            }
            if commit.parent_id == EMPTY_ID {
                return Err(CommitError::NothingToRedo);
            }
            cursor = commit.parent_id;
        }
    }

    /// Abandons the current redo branch and jumps directly to `id`.
    pub fn checkout(&mut self, id: Id) -> Result<(), CommitError> {
        let commit = self.commits.get(&id).ok_or(CommitError::NoSuchCommit(id))?;
        self.scratch = commit.graph.snapshot();
        self.current = id;
        self.branch_head = id;
        Ok(())
    }

    pub fn for_each_commit_unordered(&self, mut f: impl FnMut(&Commit)) {
        for commit in self.commits.values() {
            f(commit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Body, Entity, EntityKind};
    use crate::math::Transform;

    fn add_body(store: &mut CommitStore, mass: f32) -> Id {
        let graph = store.scratch_mut();
        let id = graph.allocate_id();
        let label = graph.default_label(EntityKind::Body);
        graph
            .add(Entity::Body(Body {
                id,
                label,
                transform: Transform::identity(),
                mass,
            }))
            .unwrap();
        id
    }

    #[test]
    fn commit_then_undo_restores_previous_graph() {
        let mut store = CommitStore::new();
        let before = store.scratch().iter().count();
        add_body(&mut store, 1.0);
        store.commit("added body");
        assert_ne!(store.scratch().iter().count(), before);
        store.undo().unwrap();
        assert_eq!(store.scratch().iter().count(), before);
    }

    #[test]
    fn redo_immediately_after_undo_restores_exact_state() {
        let mut store = CommitStore::new();
        add_body(&mut store, 1.0);
        let after_commit = store.commit("added body");
        let count_after = store.scratch().iter().count();
        store.undo().unwrap();
        store.redo().unwrap();
        assert_eq!(store.scratch().iter().count(), count_after);
        assert_eq!(store.current(), after_commit);
    }

    #[test]
    fn checkout_drops_redo_branch() {
        let mut store = CommitStore::new();
        add_body(&mut store, 1.0);
        let c1 = store.commit("c1");
        add_body(&mut store, 2.0);
        let _c2 = store.commit("c2");
        store.undo().unwrap();
        assert_eq!(store.current(), c1);
        store.checkout(c1).unwrap();
        add_body(&mut store, 3.0);
        let c3 = store.commit("c3");
        assert_eq!(store.branch_head(), c3);
        assert!(matches!(store.redo(), Err(CommitError::NothingToRedo)));
    }

    #[test]
    fn checkout_onto_same_id_then_commit_is_idempotent_for_current() {
        let mut store = CommitStore::new();
        add_body(&mut store, 1.0);
        let c1 = store.commit("c1");
        store.checkout(c1).unwrap();
        assert_eq!(store.current(), c1);
        add_body(&mut store, 2.0);
        store.commit("c2");
        assert_eq!(store.scratch().iter().count(), 3);
    }
}
