use serde::{Deserialize, Serialize};

use crate::entity::PrimaryMap;
use crate::error::CoreError;

use super::tree::{Expr, ExprId, LocalId, ParamId, Stmt, StmtId, Unop};
use super::ty::Type;
use super::value::Literal;

/// A local variable slot with tracked def-use sites.
///
/// `writes` and `reads` are relations into the body's statement and
/// expression arenas, not ownership: every rewrite that changes a
/// read/write relationship must update them in the same step as the box
/// mutation, and they must exactly match the tree at the end of every
/// rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Local {
    pub name: String,
    pub ty: Type,
    /// Statements assigning this local (`SetLocal`, `SetNewWithConstructor`).
    pub writes: Vec<StmtId>,
    /// `Expr::Local` boxes referencing this local.
    pub reads: Vec<ExprId>,
}

impl Local {
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    /// A local that is never read is dropped by the cleanup sweep.
    pub fn is_used(&self) -> bool {
        self.read_count() > 0
    }
}

/// A method parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// Per-body flags handed over by the frontend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BodyFlags {
    /// `strictfp` methods keep their exact float-compare shapes.
    pub strictfp: bool,
}

/// A method body: statement tree, expression arena, and variable tables.
///
/// The arenas are the box store — a `StmtId`/`ExprId` is a stable slot
/// whose content rewrites overwrite in place. Slots that become
/// unreachable from `root` are simply abandoned; the only invariant is
/// that no `Local` relation may point into an unreachable slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub stmts: PrimaryMap<StmtId, Stmt>,
    pub exprs: PrimaryMap<ExprId, Expr>,
    pub locals: PrimaryMap<LocalId, Local>,
    pub params: PrimaryMap<ParamId, Param>,
    /// Declaration order of the body's locals; the cleanup sweep prunes
    /// unused entries from this list (arena slots stay behind).
    pub decls: Vec<LocalId>,
    pub root: StmtId,
    pub flags: BodyFlags,
}

impl Body {
    /// Replace the content of a statement box. Never touches relations —
    /// the caller owns co-updating the affected locals in the same step.
    pub fn set_stmt(&mut self, id: StmtId, stmt: Stmt) {
        self.stmts[id] = stmt;
    }

    /// Replace the content of an expression box. See [`Body::set_stmt`].
    pub fn set_expr(&mut self, id: ExprId, expr: Expr) {
        self.exprs[id] = expr;
    }

    /// Move the node out of box `src` into box `dst`, remapping the
    /// def-use entry that identified the moved node by its old box (a
    /// local read, or a local write for statements). Children keep their
    /// boxes, so deeper relations are untouched. `src` is left holding a
    /// placeholder and must be unreachable afterwards.
    pub fn graft_expr(&mut self, dst: ExprId, src: ExprId) {
        let node = std::mem::replace(&mut self.exprs[src], Expr::Literal(Literal::Null));
        if let Expr::Local(local) = &node {
            if let Some(entry) = self.locals[*local].reads.iter_mut().find(|r| **r == src) {
                *entry = dst;
            }
        }
        self.exprs[dst] = node;
    }

    /// Statement counterpart of [`Body::graft_expr`]; `src` is left as a
    /// no-op.
    pub fn graft_stmt(&mut self, dst: StmtId, src: StmtId) {
        let node = std::mem::replace(&mut self.stmts[src], Stmt::Nop);
        if let Some(local) = node.written_local() {
            if let Some(entry) = self.locals[local].writes.iter_mut().find(|w| **w == src) {
                *entry = dst;
            }
        }
        self.stmts[dst] = node;
    }

    pub fn add_read(&mut self, local: LocalId, expr: ExprId) {
        self.locals[local].reads.push(expr);
    }

    pub fn remove_read(&mut self, local: LocalId, expr: ExprId) {
        let reads = &mut self.locals[local].reads;
        if let Some(pos) = reads.iter().position(|r| *r == expr) {
            reads.remove(pos);
        }
    }

    pub fn add_write(&mut self, local: LocalId, stmt: StmtId) {
        self.locals[local].writes.push(stmt);
    }

    pub fn remove_write(&mut self, local: LocalId, stmt: StmtId) {
        let writes = &mut self.locals[local].writes;
        if let Some(pos) = writes.iter().position(|w| *w == stmt) {
            writes.remove(pos);
        }
    }

    /// Deep-copy the subtree rooted at `src` into fresh boxes, registering
    /// a read for every copied local reference. Returns the new root box.
    pub fn deep_copy_expr(&mut self, src: ExprId) -> ExprId {
        let mut node = self.exprs[src].clone();
        // Re-box children depth-first, then register the root if needed.
        let mut old_children = Vec::new();
        node.children(&mut old_children);
        let mut new_children = Vec::with_capacity(old_children.len());
        for child in old_children {
            new_children.push(self.deep_copy_expr(child));
        }
        replace_children(&mut node, &new_children);
        let local_read = match &node {
            Expr::Local(local) => Some(*local),
            _ => None,
        };
        let id = self.exprs.push(node);
        if let Some(local) = local_read {
            self.add_read(local, id);
        }
        id
    }

    /// Remove every read/write entry pointing into the subtree rooted at
    /// `root`, which the caller is about to make unreachable.
    pub fn forget_stmt_relations(&mut self, root: StmtId) {
        let mut stmt_work = vec![root];
        let mut expr_work = Vec::new();
        while let Some(id) = stmt_work.pop() {
            if let Some(local) = self.stmts[id].written_local() {
                self.remove_write(local, id);
            }
            self.stmts[id].children(&mut expr_work, &mut stmt_work);
        }
        for e in expr_work {
            self.forget_expr_relations(e);
        }
    }

    /// Expression counterpart of [`Body::forget_stmt_relations`].
    pub fn forget_expr_relations(&mut self, root: ExprId) {
        let mut work = vec![root];
        while let Some(id) = work.pop() {
            let local = match &self.exprs[id] {
                Expr::Local(local) => Some(*local),
                _ => None,
            };
            if let Some(local) = local {
                self.remove_read(local, id);
            }
            self.exprs[id].children(&mut work);
        }
    }

    /// Whether the expression box `needle` occurs among the expression
    /// operands of `stmt` itself, without crossing into nested statements
    /// (whose contents have `stmt` only as an ancestor, not as their
    /// enclosing statement).
    pub fn stmt_operands_contain(&self, stmt: StmtId, needle: ExprId) -> bool {
        let mut expr_work = Vec::new();
        let mut nested = Vec::new();
        self.stmts[stmt].children(&mut expr_work, &mut nested);
        while let Some(id) = expr_work.pop() {
            if id == needle {
                return true;
            }
            self.exprs[id].children(&mut expr_work);
        }
        false
    }

    /// Static type of an expression.
    ///
    /// Fails with [`CoreError::UnresolvedMethodRef`] when the type flows
    /// through a call whose target was never linked — any rewrite that
    /// depends on such a type must surface this rather than guess.
    pub fn expr_ty(&self, id: ExprId) -> Result<Type, CoreError> {
        Ok(match &self.exprs[id] {
            Expr::This { ty } => ty.clone(),
            Expr::Literal(lit) => lit.ty(),
            Expr::Local(local) => self.locals[*local].ty.clone(),
            Expr::Param(param) => self.params[*param].ty.clone(),
            Expr::CaughtException { ty } => ty.clone(),
            Expr::Binop { ty, .. } => ty.clone(),
            Expr::Unop { op, expr } => match op {
                Unop::Not => Type::Bool,
                Unop::Neg | Unop::Inv => self.expr_ty(*expr)?,
            },
            Expr::CallInstance { method, .. }
            | Expr::CallSuper { method, .. }
            | Expr::CallStatic { method, .. } => {
                if method.sig.ret == Type::Unresolved {
                    return Err(CoreError::UnresolvedMethodRef(method.clone()));
                }
                method.sig.ret.clone()
            }
            Expr::ArrayLength { .. } => Type::Int,
            Expr::ArrayAccess { elem_ty, .. } => elem_ty.clone(),
            Expr::InstanceFieldAccess { field, .. } => field.ty.clone(),
            Expr::StaticFieldAccess { field } => field.ty.clone(),
            Expr::InstanceOf { .. } => Type::Bool,
            Expr::Cast { to, .. } => to.clone(),
            Expr::New { ty } => ty.clone(),
            Expr::NewWithConstructor { ty, .. } => ty.clone(),
            Expr::NewArray { elem_ty, .. } => Type::array_of(elem_ty.clone()),
            Expr::Ternary { if_true, .. } => self.expr_ty(*if_true)?,
            Expr::MethodRef(_) => Type::Ref("java.lang.invoke.MethodHandle".to_string()),
            Expr::ArrayLiteral { elem_ty, .. } => Type::array_of(elem_ty.clone()),
        })
    }
}

/// Rewrite a cloned node's child slots to the given fresh boxes, in the
/// same order [`Expr::children`] lists them.
fn replace_children(node: &mut Expr, new_children: &[ExprId]) {
    let mut next = new_children.iter().copied();
    let mut take = || next.next().expect("child count mismatch in deep copy");
    match node {
        Expr::This { .. }
        | Expr::Literal(_)
        | Expr::Local(_)
        | Expr::Param(_)
        | Expr::CaughtException { .. }
        | Expr::StaticFieldAccess { .. }
        | Expr::New { .. }
        | Expr::MethodRef(_) => {}
        Expr::Binop { lhs, rhs, .. } => {
            *lhs = take();
            *rhs = take();
        }
        Expr::Unop { expr, .. } => *expr = take(),
        Expr::CallInstance { object, args, .. } | Expr::CallSuper { object, args, .. } => {
            *object = take();
            for arg in args {
                *arg = take();
            }
        }
        Expr::CallStatic { args, .. } => {
            for arg in args {
                *arg = take();
            }
        }
        Expr::ArrayLength { array } => *array = take(),
        Expr::ArrayAccess { array, index, .. } => {
            *array = take();
            *index = take();
        }
        Expr::InstanceFieldAccess { object, .. } => *object = take(),
        Expr::InstanceOf { expr, .. } => *expr = take(),
        Expr::Cast { expr, .. } => *expr = take(),
        Expr::NewWithConstructor { args, .. } => {
            for arg in args {
                *arg = take();
            }
        }
        Expr::NewArray { counts, .. } => {
            for count in counts {
                *count = take();
            }
        }
        Expr::Ternary {
            cond,
            if_true,
            if_false,
        } => {
            *cond = take();
            *if_true = take();
            *if_false = take();
        }
        Expr::ArrayLiteral { values, .. } => {
            for value in values {
                *value = take();
            }
        }
    }
}
