pub mod body;
pub mod builder;
pub mod printer;
pub mod tree;
pub mod ty;
pub mod value;
pub mod verify;
pub mod visit;

pub use body::{Body, BodyFlags, Local, Param};
pub use builder::BodyBuilder;
pub use tree::{Binop, Expr, ExprId, Label, LocalId, ParamId, Stmt, StmtId, Unop};
pub use ty::{FieldRef, MethodRef, MethodSig, Type};
pub use value::Literal;
pub use visit::{walk_expr, walk_stmt, VisitResult, Visitor};
