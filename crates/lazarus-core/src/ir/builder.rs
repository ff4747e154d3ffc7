use crate::entity::PrimaryMap;

use super::body::{Body, BodyFlags, Local, Param};
use super::tree::{Binop, Expr, ExprId, Label, LocalId, ParamId, Stmt, StmtId, Unop};
use super::ty::{FieldRef, MethodRef, Type};
use super::value::Literal;

/// Builder for constructing a [`Body`].
///
/// This is the frontend's construction surface: every local reference
/// and local assignment built through it is registered in the local's
/// def-use relations, so a finished body starts out with tables that
/// exactly match the tree.
pub struct BodyBuilder {
    stmts: PrimaryMap<StmtId, Stmt>,
    exprs: PrimaryMap<ExprId, Expr>,
    locals: PrimaryMap<LocalId, Local>,
    params: PrimaryMap<ParamId, Param>,
    decls: Vec<LocalId>,
    flags: BodyFlags,
}

impl Default for BodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self {
            stmts: PrimaryMap::new(),
            exprs: PrimaryMap::new(),
            locals: PrimaryMap::new(),
            params: PrimaryMap::new(),
            decls: Vec::new(),
            flags: BodyFlags::default(),
        }
    }

    pub fn set_strictfp(&mut self, strictfp: bool) {
        self.flags.strictfp = strictfp;
    }

    /// Declare a method parameter.
    pub fn param(&mut self, name: impl Into<String>, ty: Type) -> ParamId {
        self.params.push(Param {
            name: name.into(),
            ty,
        })
    }

    /// Declare a local variable.
    pub fn local(&mut self, name: impl Into<String>, ty: Type) -> LocalId {
        let id = self.locals.push(Local {
            name: name.into(),
            ty,
            writes: Vec::new(),
            reads: Vec::new(),
        });
        self.decls.push(id);
        id
    }

    // Expressions.

    pub fn lit(&mut self, value: Literal) -> ExprId {
        self.exprs.push(Expr::Literal(value))
    }

    pub fn int(&mut self, value: i32) -> ExprId {
        self.lit(Literal::Int(value))
    }

    pub fn this(&mut self, ty: Type) -> ExprId {
        self.exprs.push(Expr::This { ty })
    }

    /// Reference a local; registers the read.
    pub fn local_ref(&mut self, local: LocalId) -> ExprId {
        let id = self.exprs.push(Expr::Local(local));
        self.locals[local].reads.push(id);
        id
    }

    pub fn param_ref(&mut self, param: ParamId) -> ExprId {
        self.exprs.push(Expr::Param(param))
    }

    pub fn caught_exception(&mut self, ty: Type) -> ExprId {
        self.exprs.push(Expr::CaughtException { ty })
    }

    pub fn binop(&mut self, ty: Type, op: Binop, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.exprs.push(Expr::Binop { ty, op, lhs, rhs })
    }

    /// Comparison producing `boolean`.
    pub fn cmp(&mut self, op: Binop, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binop(Type::Bool, op, lhs, rhs)
    }

    pub fn unop(&mut self, op: Unop, expr: ExprId) -> ExprId {
        self.exprs.push(Expr::Unop { op, expr })
    }

    pub fn not(&mut self, expr: ExprId) -> ExprId {
        self.unop(Unop::Not, expr)
    }

    pub fn cast(&mut self, expr: ExprId, to: Type) -> ExprId {
        self.exprs.push(Expr::Cast { expr, to })
    }

    pub fn call_static(&mut self, method: MethodRef, args: Vec<ExprId>) -> ExprId {
        self.exprs.push(Expr::CallStatic { method, args })
    }

    pub fn call_instance(&mut self, object: ExprId, method: MethodRef, args: Vec<ExprId>) -> ExprId {
        self.exprs.push(Expr::CallInstance {
            object,
            method,
            args,
        })
    }

    pub fn call_super(&mut self, object: ExprId, method: MethodRef, args: Vec<ExprId>) -> ExprId {
        self.exprs.push(Expr::CallSuper {
            object,
            method,
            args,
        })
    }

    pub fn array_length(&mut self, array: ExprId) -> ExprId {
        self.exprs.push(Expr::ArrayLength { array })
    }

    pub fn array_access(&mut self, array: ExprId, index: ExprId, elem_ty: Type) -> ExprId {
        self.exprs.push(Expr::ArrayAccess {
            array,
            index,
            elem_ty,
        })
    }

    pub fn instance_field(&mut self, object: ExprId, field: FieldRef) -> ExprId {
        self.exprs.push(Expr::InstanceFieldAccess { object, field })
    }

    pub fn static_field(&mut self, field: FieldRef) -> ExprId {
        self.exprs.push(Expr::StaticFieldAccess { field })
    }

    pub fn instance_of(&mut self, expr: ExprId, check_ty: Type) -> ExprId {
        self.exprs.push(Expr::InstanceOf { expr, check_ty })
    }

    pub fn new_object(&mut self, ty: Type) -> ExprId {
        self.exprs.push(Expr::New { ty })
    }

    pub fn new_with_constructor(
        &mut self,
        ty: Type,
        constructor: MethodRef,
        args: Vec<ExprId>,
    ) -> ExprId {
        self.exprs.push(Expr::NewWithConstructor {
            ty,
            constructor,
            args,
        })
    }

    pub fn new_array(&mut self, elem_ty: Type, counts: Vec<ExprId>) -> ExprId {
        self.exprs.push(Expr::NewArray { elem_ty, counts })
    }

    pub fn ternary(&mut self, cond: ExprId, if_true: ExprId, if_false: ExprId) -> ExprId {
        self.exprs.push(Expr::Ternary {
            cond,
            if_true,
            if_false,
        })
    }

    pub fn method_ref(&mut self, method: MethodRef) -> ExprId {
        self.exprs.push(Expr::MethodRef(method))
    }

    pub fn array_literal(&mut self, elem_ty: Type, values: Vec<ExprId>) -> ExprId {
        self.exprs.push(Expr::ArrayLiteral { elem_ty, values })
    }

    // Statements.

    pub fn nop(&mut self) -> StmtId {
        self.stmts.push(Stmt::Nop)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmts.push(Stmt::Expr(expr))
    }

    /// Assign a local; registers the write.
    pub fn set_local(&mut self, local: LocalId, expr: ExprId) -> StmtId {
        let id = self.stmts.push(Stmt::SetLocal { local, expr });
        self.locals[local].writes.push(id);
        id
    }

    /// Assign a local from a constructor call; registers the write.
    pub fn set_new_with_constructor(
        &mut self,
        local: LocalId,
        ty: Type,
        constructor: MethodRef,
        args: Vec<ExprId>,
    ) -> StmtId {
        let id = self.stmts.push(Stmt::SetNewWithConstructor {
            local,
            ty,
            constructor,
            args,
        });
        self.locals[local].writes.push(id);
        id
    }

    pub fn set_array(&mut self, array: ExprId, index: ExprId, expr: ExprId) -> StmtId {
        self.stmts.push(Stmt::SetArray { array, index, expr })
    }

    pub fn set_static_field(&mut self, field: FieldRef, expr: ExprId) -> StmtId {
        self.stmts.push(Stmt::SetStaticField { field, expr })
    }

    pub fn set_instance_field(&mut self, object: ExprId, field: FieldRef, expr: ExprId) -> StmtId {
        self.stmts.push(Stmt::SetInstanceField {
            object,
            field,
            expr,
        })
    }

    pub fn if_then(&mut self, cond: ExprId, then_body: StmtId) -> StmtId {
        self.stmts.push(Stmt::If { cond, then_body })
    }

    pub fn if_else(&mut self, cond: ExprId, then_body: StmtId, else_body: StmtId) -> StmtId {
        self.stmts.push(Stmt::IfElse {
            cond,
            then_body,
            else_body,
        })
    }

    pub fn while_loop(&mut self, cond: ExprId, body: StmtId) -> StmtId {
        self.stmts.push(Stmt::While { cond, body })
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmts.push(Stmt::Return(value))
    }

    pub fn throw(&mut self, value: ExprId) -> StmtId {
        self.stmts.push(Stmt::Throw(value))
    }

    pub fn rethrow(&mut self) -> StmtId {
        self.stmts.push(Stmt::Rethrow)
    }

    pub fn try_catch(&mut self, try_body: StmtId, catch_body: StmtId) -> StmtId {
        self.stmts.push(Stmt::TryCatch {
            try_body,
            catch_body,
        })
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.stmts.push(Stmt::Break)
    }

    pub fn continue_stmt(&mut self) -> StmtId {
        self.stmts.push(Stmt::Continue)
    }

    pub fn switch(
        &mut self,
        subject: ExprId,
        cases: Vec<(Vec<i32>, StmtId)>,
        default: StmtId,
    ) -> StmtId {
        self.stmts.push(Stmt::Switch {
            subject,
            cases,
            default,
        })
    }

    pub fn label(&mut self, name: impl Into<String>) -> StmtId {
        self.stmts.push(Stmt::Label(Label(name.into())))
    }

    pub fn if_goto(&mut self, cond: ExprId, label: impl Into<String>) -> StmtId {
        self.stmts.push(Stmt::IfGoto {
            cond,
            label: Label(label.into()),
        })
    }

    pub fn switch_goto(
        &mut self,
        subject: ExprId,
        cases: Vec<(Vec<i32>, Label)>,
        default: Label,
    ) -> StmtId {
        self.stmts.push(Stmt::SwitchGoto {
            subject,
            cases,
            default,
        })
    }

    pub fn monitor_enter(&mut self, expr: ExprId) -> StmtId {
        self.stmts.push(Stmt::MonitorEnter(expr))
    }

    pub fn monitor_exit(&mut self, expr: ExprId) -> StmtId {
        self.stmts.push(Stmt::MonitorExit(expr))
    }

    pub fn seq(&mut self, items: Vec<StmtId>) -> StmtId {
        self.stmts.push(Stmt::Seq(items))
    }

    /// Finish construction with the given root statement.
    pub fn finish(self, root: StmtId) -> Body {
        Body {
            stmts: self.stmts,
            exprs: self.exprs,
            locals: self.locals,
            params: self.params,
            decls: self.decls,
            root,
            flags: self.flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The builder registers def-use relations as it constructs the tree.
    #[test]
    fn relations_registered_on_construction() {
        let mut b = BodyBuilder::new();
        let x = b.local("x", Type::Int);
        let one = b.int(1);
        let write = b.set_local(x, one);
        let read = b.local_ref(x);
        let ret = b.ret(Some(read));
        let root = b.seq(vec![write, ret]);
        let body = b.finish(root);

        assert_eq!(body.locals[x].writes, vec![write]);
        assert_eq!(body.locals[x].reads, vec![read]);
        assert!(body.locals[x].is_used());
    }
}
