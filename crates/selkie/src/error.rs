use selkie_graph::GraphError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A node or edge id that does not belong to the graph.
    #[error("unknown {kind} id {id}")]
    InvalidArgument { kind: &'static str, id: usize },

    /// The engine was driven out of order (editor without an open frame,
    /// layout queried before it was built, ...).
    #[error("invalid state: {message}")]
    InvalidState { message: &'static str },

    /// Region analysis requires every node to be reachable from the root;
    /// eliminating unreachable nodes is the source adapter's job.
    #[error("{unreachable} node(s) unreachable from the root")]
    DegenerateInput { unreachable: usize },

    /// Self-loops must be removed before routing; the long-edge router does
    /// not handle them.
    #[error("self-loop edge {edge} is not supported by the router")]
    Unsupported { edge: usize },
}

impl From<GraphError> for Error {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::NoOpenFrame => Error::InvalidState {
                message: "graph mutated with no open edit frame",
            },
            GraphError::RemoveRoot => Error::InvalidState {
                message: "the root node cannot be removed",
            },
            GraphError::UnknownNode(id) => Error::InvalidArgument {
                kind: "node",
                id: id.index(),
            },
            GraphError::UnknownEdge(id) => Error::InvalidArgument {
                kind: "edge",
                id: id.index(),
            },
        }
    }
}
