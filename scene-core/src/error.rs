//! Error taxonomy (§7). Structural failures in the data model are surfaced
//! here and never caught inside the core; lowering failures become
//! user-facing issue strings instead of propagating as errors (§4.4, §7).

use thiserror::Error;

use crate::id::Id;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("entity {label:?} (cross-ref #{index} {target:?}) does not exist in this graph")]
    UnresolvedReference {
        index: usize,
        label: &'static str,
        target: Id,
    },
    #[error("cascading delete of {0:?} forms a cycle")]
    CascadeCycle(Id),
    #[error("entity {id:?} has no cross-reference at index {index}")]
    BadIndex { id: Id, index: usize },
    #[error("entity {id:?} cannot be the target of cross-ref {label:?}")]
    InvalidCrossrefTarget { id: Id, label: &'static str },
    #[error("a second Ground entity cannot be added")]
    DuplicateGround,
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(Id),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitError {
    #[error("commit {0:?} does not exist")]
    NoSuchCommit(Id),
    #[error("there is no parent commit to undo to")]
    NothingToUndo,
    #[error("there is no forward commit to redo to")]
    NothingToRedo,
}
