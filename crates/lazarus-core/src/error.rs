use crate::ir::ty::MethodRef;

/// Core error type for the lazarus optimization pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A rewrite needed the static type of a call whose target method was
    /// never linked by the frontend. Code generation cannot proceed
    /// correctly past this, so it is a hard failure rather than a
    /// diagnostic.
    #[error("unresolved method reference: {0}")]
    UnresolvedMethodRef(MethodRef),
}
