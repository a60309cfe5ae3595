//! Error taxonomy for the graph store.
//!
//! The traversal kernel deliberately has no error type of its own: every one of its functions is
//! pure over the four-method [`crate::graph::Oracle`] contract and never fails on mere
//! unreachability (that's `Option::None` / an absent map entry, never an `Err`). The oracle
//! contract has no way to distinguish "unknown node" from "known node with no neighbors", so the
//! kernel cannot detect a caller's bad node name either — that validation belongs to whatever
//! constructs the oracle (the graph store already rejects unknown names before a query ever
//! reaches the kernel).

/// Errors raised by [`crate::graph::Network`] mutators and queries.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No node with this name exists.
    #[error("no such node: {0}")]
    NotFound(String),

    /// A node with this name already exists.
    #[error("node already exists: {0}")]
    AlreadyExists(String),

    /// The request was rejected before any state changed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation requires a precondition (e.g. an existing edge) that does not hold.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// An internal invariant was violated. Should never be observed in practice.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl GraphError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists(name.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }
}
