//! Generic double-dispatch traversal over a body's statement/expression
//! tree.
//!
//! [`Visitor`] exposes one overridable hook per node variant. Default
//! hooks delegate to [`walk_stmt`]/[`walk_expr`], which visit every child
//! box in evaluation order (condition before branches, callee before
//! arguments, array before index before value). An override chooses its
//! own order: call the walk function first for post-order (children
//! stabilized before the hook's own rewrite fires), last for pre-order,
//! or not at all to prune the subtree.
//!
//! The enclosing statement is threaded explicitly through every
//! expression hook — there is no shared "current statement" field, so a
//! visitor is reentrant and independent bodies can be traversed
//! concurrently.
//!
//! Hooks return `Result` so a rewrite can surface a hard failure (an
//! unresolved method reference) from any depth.

use crate::error::CoreError;

use super::body::Body;
use super::tree::{Expr, ExprId, Stmt, StmtId};

pub type VisitResult = Result<(), CoreError>;

/// Overridable tree visitor. See the module docs for the dispatch and
/// ordering contract.
#[allow(unused_variables)]
pub trait Visitor {
    fn visit_body(&mut self, body: &mut Body) -> VisitResult {
        let root = body.root;
        self.visit_stmt(body, root)
    }

    /// Dispatch on the current content of a statement box.
    fn visit_stmt(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        dispatch_stmt(self, body, id)
    }

    /// Dispatch on the current content of an expression box. `stm` is the
    /// nearest enclosing statement, if any.
    fn visit_expr(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        dispatch_expr(self, body, id, stm)
    }

    // Statement hooks.

    fn visit_seq(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_nop(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        Ok(())
    }
    fn visit_stmt_expr(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_set_local(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_set_array(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_set_static_field(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_set_instance_field(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_set_new_with_constructor(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_if(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_if_else(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_while(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_return(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_throw(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_rethrow(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        Ok(())
    }
    fn visit_try_catch(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_break(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        Ok(())
    }
    fn visit_continue(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        Ok(())
    }
    fn visit_switch(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_label(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        Ok(())
    }
    fn visit_if_goto(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_switch_goto(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_monitor_enter(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_monitor_exit(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }
    fn visit_set_array_literals(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)
    }

    // Expression hooks.

    fn visit_this(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        Ok(())
    }
    fn visit_literal(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        Ok(())
    }
    fn visit_local_ref(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        Ok(())
    }
    fn visit_param_ref(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        Ok(())
    }
    fn visit_caught_exception(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        Ok(())
    }
    fn visit_binop(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_unop(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_call_instance(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_call_super(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_call_static(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_array_length(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_array_access(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_instance_field_access(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_static_field_access(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        Ok(())
    }
    fn visit_instance_of(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_cast(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_new(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        Ok(())
    }
    fn visit_new_with_constructor(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_new_array(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_ternary(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
    fn visit_method_ref(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        Ok(())
    }
    fn visit_array_literal(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)
    }
}

/// Route a statement box to its per-variant hook. Exhaustive by design:
/// a new `Stmt` variant fails to compile until it is dispatched.
pub fn dispatch_stmt<V: Visitor + ?Sized>(v: &mut V, body: &mut Body, id: StmtId) -> VisitResult {
    match &body.stmts[id] {
        Stmt::Seq(_) => v.visit_seq(body, id),
        Stmt::Nop => v.visit_nop(body, id),
        Stmt::Expr(_) => v.visit_stmt_expr(body, id),
        Stmt::SetLocal { .. } => v.visit_set_local(body, id),
        Stmt::SetArray { .. } => v.visit_set_array(body, id),
        Stmt::SetStaticField { .. } => v.visit_set_static_field(body, id),
        Stmt::SetInstanceField { .. } => v.visit_set_instance_field(body, id),
        Stmt::SetNewWithConstructor { .. } => v.visit_set_new_with_constructor(body, id),
        Stmt::If { .. } => v.visit_if(body, id),
        Stmt::IfElse { .. } => v.visit_if_else(body, id),
        Stmt::While { .. } => v.visit_while(body, id),
        Stmt::Return(_) => v.visit_return(body, id),
        Stmt::Throw(_) => v.visit_throw(body, id),
        Stmt::Rethrow => v.visit_rethrow(body, id),
        Stmt::TryCatch { .. } => v.visit_try_catch(body, id),
        Stmt::Break => v.visit_break(body, id),
        Stmt::Continue => v.visit_continue(body, id),
        Stmt::Switch { .. } => v.visit_switch(body, id),
        Stmt::Label(_) => v.visit_label(body, id),
        Stmt::IfGoto { .. } => v.visit_if_goto(body, id),
        Stmt::SwitchGoto { .. } => v.visit_switch_goto(body, id),
        Stmt::MonitorEnter(_) => v.visit_monitor_enter(body, id),
        Stmt::MonitorExit(_) => v.visit_monitor_exit(body, id),
        Stmt::SetArrayLiterals { .. } => v.visit_set_array_literals(body, id),
    }
}

/// Route an expression box to its per-variant hook.
pub fn dispatch_expr<V: Visitor + ?Sized>(
    v: &mut V,
    body: &mut Body,
    id: ExprId,
    stm: Option<StmtId>,
) -> VisitResult {
    match &body.exprs[id] {
        Expr::This { .. } => v.visit_this(body, id, stm),
        Expr::Literal(_) => v.visit_literal(body, id, stm),
        Expr::Local(_) => v.visit_local_ref(body, id, stm),
        Expr::Param(_) => v.visit_param_ref(body, id, stm),
        Expr::CaughtException { .. } => v.visit_caught_exception(body, id, stm),
        Expr::Binop { .. } => v.visit_binop(body, id, stm),
        Expr::Unop { .. } => v.visit_unop(body, id, stm),
        Expr::CallInstance { .. } => v.visit_call_instance(body, id, stm),
        Expr::CallSuper { .. } => v.visit_call_super(body, id, stm),
        Expr::CallStatic { .. } => v.visit_call_static(body, id, stm),
        Expr::ArrayLength { .. } => v.visit_array_length(body, id, stm),
        Expr::ArrayAccess { .. } => v.visit_array_access(body, id, stm),
        Expr::InstanceFieldAccess { .. } => v.visit_instance_field_access(body, id, stm),
        Expr::StaticFieldAccess { .. } => v.visit_static_field_access(body, id, stm),
        Expr::InstanceOf { .. } => v.visit_instance_of(body, id, stm),
        Expr::Cast { .. } => v.visit_cast(body, id, stm),
        Expr::New { .. } => v.visit_new(body, id, stm),
        Expr::NewWithConstructor { .. } => v.visit_new_with_constructor(body, id, stm),
        Expr::NewArray { .. } => v.visit_new_array(body, id, stm),
        Expr::Ternary { .. } => v.visit_ternary(body, id, stm),
        Expr::MethodRef(_) => v.visit_method_ref(body, id, stm),
        Expr::ArrayLiteral { .. } => v.visit_array_literal(body, id, stm),
    }
}

/// Visit every child box of a statement in evaluation order: expression
/// operands first (which all evaluate before any nested statement runs),
/// then nested statements. Child expressions receive this statement as
/// their enclosing-statement context.
pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, body: &mut Body, id: StmtId) -> VisitResult {
    let mut exprs = Vec::new();
    let mut stmts = Vec::new();
    body.stmts[id].children(&mut exprs, &mut stmts);
    for e in exprs {
        v.visit_expr(body, e, Some(id))?;
    }
    for s in stmts {
        v.visit_stmt(body, s)?;
    }
    Ok(())
}

/// Visit every child box of an expression in evaluation order, keeping
/// the enclosing-statement context.
pub fn walk_expr<V: Visitor + ?Sized>(
    v: &mut V,
    body: &mut Body,
    id: ExprId,
    stm: Option<StmtId>,
) -> VisitResult {
    let mut children = Vec::new();
    body.exprs[id].children(&mut children);
    for e in children {
        v.visit_expr(body, e, stm)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::BodyBuilder;
    use crate::ir::ty::Type;

    /// Records the order expression boxes are visited in.
    #[derive(Default)]
    struct Recorder {
        exprs: Vec<ExprId>,
        stm_ctx: Vec<Option<StmtId>>,
    }

    impl Visitor for Recorder {
        fn visit_expr(
            &mut self,
            body: &mut Body,
            id: ExprId,
            stm: Option<StmtId>,
        ) -> VisitResult {
            self.exprs.push(id);
            self.stm_ctx.push(stm);
            dispatch_expr(self, body, id, stm)
        }
    }

    /// Default traversal reaches every expression, pre-order, in
    /// evaluation order: array before index before value.
    #[test]
    fn set_array_children_in_evaluation_order() {
        let mut b = BodyBuilder::new();
        let arr = b.local("arr", Type::array_of(Type::Int));
        let a = b.local_ref(arr);
        let i = b.int(0);
        let val = b.int(7);
        let store = b.set_array(a, i, val);
        let root = b.seq(vec![store]);
        let mut body = b.finish(root);

        let mut rec = Recorder::default();
        rec.visit_body(&mut body).unwrap();
        assert_eq!(rec.exprs, vec![a, i, val]);
    }

    /// The condition is visited before either branch's contents, and the
    /// enclosing statement is threaded to nested expressions.
    #[test]
    fn condition_before_branches_with_context() {
        let mut b = BodyBuilder::new();
        let x = b.local("x", Type::Bool);
        let cond = b.local_ref(x);
        let one = b.int(1);
        let y = b.local("y", Type::Int);
        let assign = b.set_local(y, one);
        let two = b.int(2);
        let assign2 = b.set_local(y, two);
        let branch = b.if_else(cond, assign, assign2);
        let mut body = b.finish(branch);

        let mut rec = Recorder::default();
        rec.visit_body(&mut body).unwrap();
        assert_eq!(rec.exprs, vec![cond, one, two]);
        assert_eq!(rec.stm_ctx[0], Some(branch));
        assert_eq!(rec.stm_ctx[1], Some(assign));
        assert_eq!(rec.stm_ctx[2], Some(assign2));
    }
}
