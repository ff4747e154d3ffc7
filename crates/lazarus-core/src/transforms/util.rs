//! Purity classification for expressions.
//!
//! "Pure" means no observable side effect when the value is discarded.
//! This is an extension seam: passes beyond the peephole optimizer can
//! key their own rewrites on it.

use crate::ir::{Body, Expr, ExprId};

/// Classification result. `Unknown` means the classifier does not
/// recognize the shape; callers must treat it as impure and report it
/// rather than silently approximate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purity {
    Pure,
    Impure,
    Unknown,
}

impl Purity {
    fn and(self, other: Purity) -> Purity {
        match (self, other) {
            (Purity::Impure, _) | (_, Purity::Impure) => Purity::Impure,
            (Purity::Unknown, _) | (_, Purity::Unknown) => Purity::Unknown,
            _ => Purity::Pure,
        }
    }
}

/// Classify an expression subtree.
///
/// Calls and allocations are never pure. Array and field reads are
/// treated as pure even though they can throw: discarding the value of a
/// read that was going to be discarded anyway is the contract inherited
/// from the bytecode frontend. Anything unrecognized is `Unknown`.
pub fn classify(body: &Body, id: ExprId) -> Purity {
    match &body.exprs[id] {
        Expr::This { .. }
        | Expr::Literal(_)
        | Expr::Local(_)
        | Expr::Param(_)
        | Expr::CaughtException { .. }
        | Expr::StaticFieldAccess { .. } => Purity::Pure,

        Expr::Binop { lhs, rhs, .. } => classify(body, *lhs).and(classify(body, *rhs)),
        Expr::Unop { expr, .. } => classify(body, *expr),
        Expr::Cast { expr, .. } => classify(body, *expr),
        Expr::InstanceOf { expr, .. } => classify(body, *expr),
        Expr::ArrayLength { array } => classify(body, *array),
        Expr::ArrayAccess { array, index, .. } => {
            classify(body, *array).and(classify(body, *index))
        }
        Expr::InstanceFieldAccess { object, .. } => classify(body, *object),
        Expr::Ternary {
            cond,
            if_true,
            if_false,
        } => classify(body, *cond)
            .and(classify(body, *if_true))
            .and(classify(body, *if_false)),

        // Calls and allocations are never pure.
        Expr::CallInstance { .. }
        | Expr::CallSuper { .. }
        | Expr::CallStatic { .. }
        | Expr::New { .. }
        | Expr::NewWithConstructor { .. }
        | Expr::NewArray { .. }
        | Expr::ArrayLiteral { .. } => Purity::Impure,

        // Materializing a method handle can run bootstrap machinery;
        // the classifier has no model for it.
        Expr::MethodRef(_) => Purity::Unknown,
    }
}

/// Convenience wrapper: `true` only for provably pure expressions.
pub fn is_pure(body: &Body, id: ExprId) -> bool {
    classify(body, id) == Purity::Pure
}
