/**
minic-codegen | compile_error.rs
Holds details related to the errors to possibly raise during code generation.
*/

use thiserror::Error;

use crate::syntax::{FunctionId, NodeId, VarId};

/// Errors raised while lowering a unit.
///
/// `Semantic` is the only user-facing class; every other variant means an upstream
/// phase (or the backend itself) broke an invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Semantic error: {0}")]
    Semantic(String),

    #[error("internal compiler error: variable `{name}` has no stack slot")]
    UnallocatedVariable { variable: VarId, name: String },

    #[error("internal compiler error: literal node {node} was never pooled")]
    UnregisteredLiteral { node: NodeId },

    #[error("internal compiler error: pause string was not pooled")]
    MissingPauseLiteral,

    #[error("internal compiler error: no variable symbol {0}")]
    UnknownVariable(VarId),

    #[error("internal compiler error: no function symbol {0}")]
    UnknownFunction(FunctionId),

    #[error("internal compiler error: cannot lower {kind} {context}")]
    UnsupportedNode { kind: &'static str, context: &'static str },

    #[error("internal compiler error: floating-point {0} is not supported")]
    UnsupportedFloat(&'static str),
}

impl CompileError {
    /// True for every internal-compiler-error variant.
    pub fn is_internal(&self) -> bool {
        !matches!(self, CompileError::Semantic(_))
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
