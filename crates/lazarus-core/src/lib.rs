//! Optimization core of the lazarus cross-compiler.
//!
//! lazarus translates JVM bytecode ahead of time into readable source for
//! several target languages. This crate owns the middle of that pipeline:
//! the method-body IR (statement/expression trees held in stable arenas
//! that double as in-place rewrite boxes), the generic traversal engine,
//! per-local def-use tracking, and the peephole optimizer built on top of
//! them.
//!
//! Frontends construct bodies through [`ir::BodyBuilder`]; the single
//! entry point [`transforms::optimize`] rewrites a body in place; backends
//! consume the result through the [`ir::Visitor`] traversal interface.

pub mod entity;
pub mod error;
pub mod ir;
pub mod pipeline;
pub mod transforms;

pub use error::CoreError;
pub use ir::{Body, BodyBuilder, Visitor};
pub use transforms::optimize;
