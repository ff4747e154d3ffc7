use serde::{Deserialize, Serialize};

use crate::define_entity;

use super::ty::{FieldRef, MethodRef, Type};
use super::value::Literal;

define_entity!(StmtId);
define_entity!(ExprId);
define_entity!(LocalId);
define_entity!(ParamId);

/// A branch target name inside one body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label(pub String);

/// Binary operators. Comparison operators produce `boolean`;
/// `Cmp`/`Cmpl`/`Cmpg` are the JVM three-way compares producing `int`
/// (`Cmpl`/`Cmpg` differ in how they order NaN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binop {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    BoolAnd,
    BoolOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Cmp,
    Cmpl,
    Cmpg,
}

impl Binop {
    /// The comparison with the complementary truth table, for the
    /// operators that have one (e.g. `Lt` ↔ `Ge`, `Eq` ↔ `Ne`).
    pub fn inverted(self) -> Option<Binop> {
        Some(match self {
            Binop::Eq => Binop::Ne,
            Binop::Ne => Binop::Eq,
            Binop::Lt => Binop::Ge,
            Binop::Ge => Binop::Lt,
            Binop::Gt => Binop::Le,
            Binop::Le => Binop::Gt,
            _ => return None,
        })
    }

    /// Ordering comparison (`<`, `<=`, `>`, `>=`).
    pub fn is_relational(self) -> bool {
        matches!(self, Binop::Lt | Binop::Le | Binop::Gt | Binop::Ge)
    }
}

/// Unary operators: arithmetic negation, boolean not, bitwise inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unop {
    Neg,
    Not,
    Inv,
}

/// A statement node.
///
/// Child links are box identities (`StmtId`/`ExprId`): arena slots whose
/// content a rewrite may replace in place while the identity — and every
/// captured reference to it — stays valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// Ordered statement sequence.
    Seq(Vec<StmtId>),
    Nop,
    /// Evaluate an expression for its effects, discarding the value.
    Expr(ExprId),
    SetLocal {
        local: LocalId,
        expr: ExprId,
    },
    SetArray {
        array: ExprId,
        index: ExprId,
        expr: ExprId,
    },
    SetStaticField {
        field: FieldRef,
        expr: ExprId,
    },
    SetInstanceField {
        object: ExprId,
        field: FieldRef,
        expr: ExprId,
    },
    /// `local = new T(args)` in one step, the shape the frontend emits
    /// for constructor calls whose receiver is immediately stored.
    SetNewWithConstructor {
        local: LocalId,
        ty: Type,
        constructor: MethodRef,
        args: Vec<ExprId>,
    },
    If {
        cond: ExprId,
        then_body: StmtId,
    },
    IfElse {
        cond: ExprId,
        then_body: StmtId,
        else_body: StmtId,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    Return(Option<ExprId>),
    Throw(ExprId),
    Rethrow,
    TryCatch {
        try_body: StmtId,
        catch_body: StmtId,
    },
    Break,
    Continue,
    Switch {
        subject: ExprId,
        cases: Vec<(Vec<i32>, StmtId)>,
        default: StmtId,
    },
    Label(Label),
    IfGoto {
        cond: ExprId,
        label: Label,
    },
    SwitchGoto {
        subject: ExprId,
        cases: Vec<(Vec<i32>, Label)>,
        default: Label,
    },
    MonitorEnter(ExprId),
    MonitorExit(ExprId),
    /// Contiguous literal-index array stores folded into one statement:
    /// `array[base_index + k] = values[k]` for each `k`.
    SetArrayLiterals {
        array: ExprId,
        base_index: i32,
        values: Vec<ExprId>,
    },
}

/// An expression node. See [`Stmt`] for the box-identity convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    This {
        ty: Type,
    },
    Literal(Literal),
    /// Read of a local variable. Every reachable `Local` node must be
    /// registered in its local's `reads`.
    Local(LocalId),
    Param(ParamId),
    CaughtException {
        ty: Type,
    },
    Binop {
        /// Result type (carried on the node, as comparison and arithmetic
        /// results differ from their operand types).
        ty: Type,
        op: Binop,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unop {
        op: Unop,
        expr: ExprId,
    },
    CallInstance {
        object: ExprId,
        method: MethodRef,
        args: Vec<ExprId>,
    },
    CallSuper {
        object: ExprId,
        method: MethodRef,
        args: Vec<ExprId>,
    },
    CallStatic {
        method: MethodRef,
        args: Vec<ExprId>,
    },
    ArrayLength {
        array: ExprId,
    },
    ArrayAccess {
        array: ExprId,
        index: ExprId,
        /// Element type (carried on the node; the array operand may be
        /// wrapped in casts that obscure it).
        elem_ty: Type,
    },
    InstanceFieldAccess {
        object: ExprId,
        field: FieldRef,
    },
    StaticFieldAccess {
        field: FieldRef,
    },
    InstanceOf {
        expr: ExprId,
        check_ty: Type,
    },
    Cast {
        expr: ExprId,
        to: Type,
    },
    New {
        ty: Type,
    },
    NewWithConstructor {
        ty: Type,
        constructor: MethodRef,
        args: Vec<ExprId>,
    },
    NewArray {
        elem_ty: Type,
        counts: Vec<ExprId>,
    },
    Ternary {
        cond: ExprId,
        if_true: ExprId,
        if_false: ExprId,
    },
    MethodRef(MethodRef),
    ArrayLiteral {
        elem_ty: Type,
        values: Vec<ExprId>,
    },
}

impl Stmt {
    /// Append this statement's direct child boxes, in evaluation order.
    ///
    /// For every variant, all expression children evaluate before any
    /// nested statement executes (conditions before branches, subjects
    /// before cases), so the two lists jointly give evaluation order.
    ///
    /// The match is deliberately exhaustive: adding a node variant must
    /// fail to compile until traversal handles it.
    pub fn children(&self, exprs: &mut Vec<ExprId>, stmts: &mut Vec<StmtId>) {
        match self {
            Stmt::Seq(items) => stmts.extend(items.iter().copied()),
            Stmt::Nop => {}
            Stmt::Expr(e) => exprs.push(*e),
            Stmt::SetLocal { expr, .. } => exprs.push(*expr),
            Stmt::SetArray { array, index, expr } => {
                exprs.push(*array);
                exprs.push(*index);
                exprs.push(*expr);
            }
            Stmt::SetStaticField { expr, .. } => exprs.push(*expr),
            Stmt::SetInstanceField { object, expr, .. } => {
                exprs.push(*object);
                exprs.push(*expr);
            }
            Stmt::SetNewWithConstructor { args, .. } => exprs.extend(args.iter().copied()),
            Stmt::If { cond, then_body } => {
                exprs.push(*cond);
                stmts.push(*then_body);
            }
            Stmt::IfElse {
                cond,
                then_body,
                else_body,
            } => {
                exprs.push(*cond);
                stmts.push(*then_body);
                stmts.push(*else_body);
            }
            Stmt::While { cond, body } => {
                exprs.push(*cond);
                stmts.push(*body);
            }
            Stmt::Return(value) => exprs.extend(value.iter().copied()),
            Stmt::Throw(value) => exprs.push(*value),
            Stmt::Rethrow => {}
            Stmt::TryCatch {
                try_body,
                catch_body,
            } => {
                stmts.push(*try_body);
                stmts.push(*catch_body);
            }
            Stmt::Break | Stmt::Continue => {}
            Stmt::Switch {
                subject,
                cases,
                default,
            } => {
                exprs.push(*subject);
                stmts.extend(cases.iter().map(|(_, body)| *body));
                stmts.push(*default);
            }
            Stmt::Label(_) => {}
            Stmt::IfGoto { cond, .. } => exprs.push(*cond),
            Stmt::SwitchGoto { subject, .. } => exprs.push(*subject),
            Stmt::MonitorEnter(e) | Stmt::MonitorExit(e) => exprs.push(*e),
            Stmt::SetArrayLiterals { array, values, .. } => {
                exprs.push(*array);
                exprs.extend(values.iter().copied());
            }
        }
    }

    /// The local this statement writes, if it is a write site.
    pub fn written_local(&self) -> Option<LocalId> {
        match self {
            Stmt::SetLocal { local, .. } | Stmt::SetNewWithConstructor { local, .. } => {
                Some(*local)
            }
            _ => None,
        }
    }
}

impl Expr {
    /// Append this expression's direct child boxes, in evaluation order
    /// (callee object before arguments, array before index).
    ///
    /// Exhaustive for the same reason as [`Stmt::children`].
    pub fn children(&self, exprs: &mut Vec<ExprId>) {
        match self {
            Expr::This { .. }
            | Expr::Literal(_)
            | Expr::Local(_)
            | Expr::Param(_)
            | Expr::CaughtException { .. }
            | Expr::StaticFieldAccess { .. }
            | Expr::New { .. }
            | Expr::MethodRef(_) => {}
            Expr::Binop { lhs, rhs, .. } => {
                exprs.push(*lhs);
                exprs.push(*rhs);
            }
            Expr::Unop { expr, .. } => exprs.push(*expr),
            Expr::CallInstance { object, args, .. } | Expr::CallSuper { object, args, .. } => {
                exprs.push(*object);
                exprs.extend(args.iter().copied());
            }
            Expr::CallStatic { args, .. } => exprs.extend(args.iter().copied()),
            Expr::ArrayLength { array } => exprs.push(*array),
            Expr::ArrayAccess { array, index, .. } => {
                exprs.push(*array);
                exprs.push(*index);
            }
            Expr::InstanceFieldAccess { object, .. } => exprs.push(*object),
            Expr::InstanceOf { expr, .. } => exprs.push(*expr),
            Expr::Cast { expr, .. } => exprs.push(*expr),
            Expr::NewWithConstructor { args, .. } => exprs.extend(args.iter().copied()),
            Expr::NewArray { counts, .. } => exprs.extend(counts.iter().copied()),
            Expr::Ternary {
                cond,
                if_true,
                if_false,
            } => {
                exprs.push(*cond);
                exprs.push(*if_true);
                exprs.push(*if_false);
            }
            Expr::ArrayLiteral { values, .. } => exprs.extend(values.iter().copied()),
        }
    }
}
