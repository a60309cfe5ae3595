//! Scenario engine errors: malformed documents, malformed step/validation parameters, plus
//! whatever the graph store surfaced while executing a setup or step.

/// Errors raised while parsing or running a [`crate::document::Scenario`].
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The document text did not parse as either YAML or JSON.
    #[error("failed to parse scenario document: {0}")]
    Parse(String),

    /// A step or validation referenced a field the engine doesn't recognize for its action/kind.
    #[error("malformed step parameters: {0}")]
    MalformedParams(String),

    /// The graph store rejected a setup or step operation.
    #[error(transparent)]
    Graph(#[from] netsim_core::GraphError),
}
