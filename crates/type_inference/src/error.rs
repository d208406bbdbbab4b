use ast::NodeId;
use thiserror::Error;

/// Internal failures of the inference passes.
///
/// These indicate a bug or an AST the passes were never meant to see. Problems
/// in the analysed program are reported as diagnostics instead.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("data flow analysis appears to diverge at {node} after {steps} steps")]
    Divergence { node: String, steps: usize },

    #[error("malformed AST at {node:?}: {message}")]
    MalformedAst {
        node: NodeId,
        message: &'static str,
    },

    #[error("no typed scope has been created for {0:?}")]
    MissingScope(NodeId),
}

pub type InferenceResult<T> = Result<T, InferenceError>;
