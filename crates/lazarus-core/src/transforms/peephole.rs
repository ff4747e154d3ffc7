//! The peephole optimizer.
//!
//! A bottom-up rewrite traversal over one method body: children are
//! visited before their parent, so a rule fires on a node only after its
//! children have stabilized and parent-level patterns exposed by a child
//! rewrite are caught as the traversal returns. The traversal is bracketed
//! by a forwarding pre-pass (single-write parameter/this locals) and a
//! cleanup sweep (dead-local pruning, no-op flattening, array-store
//! coalescing).
//!
//! Every rule that changes a read/write relationship updates the affected
//! local's tables in the same step as the box mutation; in debug builds
//! the tables are verified against the tree after the pass.
//!
//! Shapes the optimizer cannot prove safe (a float compare against a
//! non-zero constant, an expression it cannot classify for purity) are
//! left unmodified and reported as [`Diagnostic`]s, never silently
//! approximated.

use std::fmt;

use crate::error::CoreError;
use crate::ir::visit::{walk_expr, walk_stmt, VisitResult, Visitor};
use crate::ir::{
    printer, Binop, Body, Expr, ExprId, Literal, LocalId, MethodRef, Stmt, StmtId, Type, Unop,
};
use crate::pipeline::{Transform, TransformResult};

use super::util::{self, Purity};

/// A condition the optimizer refused to rewrite, reported instead of
/// silently approximated.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A `cmpl`/`cmpg` result compared against something other than the
    /// integer constant 0.
    UnhandledFloatCompare { op: Binop, rhs: Literal },
    /// An expression statement whose purity could not be classified; it
    /// is kept as-is.
    UnknownPurity { expr: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnhandledFloatCompare { op, rhs } => write!(
                f,
                "unhandled float comparison: {op:?} against {rhs:?} (only 0 is recognized); leaving unmodified"
            ),
            Diagnostic::UnknownPurity { expr } => {
                write!(f, "cannot classify purity of `{expr}`; treating as impure")
            }
        }
    }
}

/// Known no-op runtime helpers whose call statements are stripped.
fn is_denylisted(method: &MethodRef) -> bool {
    method.owner == "kotlin.jvm.internal.Intrinsics"
        && matches!(
            method.name.as_str(),
            "checkParameterIsNotNull" | "checkNotNullParameter"
        )
        && method.sig.ret == Type::Void
        && method.sig.params == [Type::object(), Type::string()]
}

/// The peephole optimizer pass. See the module docs.
#[derive(Default)]
pub struct Peephole {
    /// Unprovable-safety conditions encountered during the last run.
    pub diagnostics: Vec<Diagnostic>,
    changed: bool,
}

/// Optimize a method body in place: forwarding pre-pass, one bottom-up
/// rewrite traversal, one cleanup sweep. Returns the same body.
pub fn optimize(mut body: Body) -> Result<Body, CoreError> {
    let mut peephole = Peephole::new();
    peephole.run(&mut body)?;
    Ok(body)
}

impl Peephole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the pass. Returns whether any rewrite rule fired.
    pub fn run(&mut self, body: &mut Body) -> Result<bool, CoreError> {
        self.changed = false;
        self.forward_single_writes(body);
        self.visit_body(body)?;
        self.cleanup(body);
        #[cfg(debug_assertions)]
        if let Err(err) = crate::ir::verify::check_def_use(body) {
            panic!("def-use tables diverged from the tree after peephole: {err}");
        }
        Ok(self.changed)
    }

    fn report(&mut self, diag: Diagnostic) {
        tracing::warn!("{diag}");
        self.diagnostics.push(diag);
    }

    /// Forwarding pre-pass: a local with exactly one write whose
    /// right-hand side peels (through casts) to a parameter or `this`
    /// reference is substituted into every read as a deep copy of the
    /// full right-hand side. Literals are deliberately not forwarded —
    /// later rules key on literal shapes at their original sites.
    fn forward_single_writes(&mut self, body: &mut Body) {
        for local in body.locals.keys().collect::<Vec<_>>() {
            if body.locals[local].write_count() != 1 {
                continue;
            }
            let write = body.locals[local].writes[0];
            let Stmt::SetLocal { expr, .. } = &body.stmts[write] else {
                continue;
            };
            let rhs = *expr;
            let mut core = rhs;
            while let Expr::Cast { expr, .. } = &body.exprs[core] {
                core = *expr;
            }
            if !matches!(body.exprs[core], Expr::Param(_) | Expr::This { .. }) {
                continue;
            }
            for read in std::mem::take(&mut body.locals[local].reads) {
                let copy = body.deep_copy_expr(rhs);
                body.graft_expr(read, copy);
            }
            body.locals[local].writes.clear();
            body.set_stmt(write, Stmt::Nop);
            self.changed = true;
        }
    }

    /// `(cast<int>(boolExpr)) == k` / `!= k` with `k` in {0, 1} reduces
    /// to `boolExpr` or its negation; polarity is the XOR of
    /// compare-to-zero and is-equality.
    fn fold_bool_cast_compare(
        &mut self,
        body: &mut Body,
        id: ExprId,
        op: Binop,
        lhs: ExprId,
        rhs: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        let Expr::Cast { expr, to } = &body.exprs[lhs] else {
            return Ok(());
        };
        if *to != Type::Int {
            return Ok(());
        }
        let inner = *expr;
        let Expr::Literal(lit) = &body.exprs[rhs] else {
            return Ok(());
        };
        let Some(k) = lit.as_int() else {
            return Ok(());
        };
        if k != 0 && k != 1 {
            return Ok(());
        }
        if body.expr_ty(inner)? != Type::Bool {
            return Ok(());
        }
        let to_zero = k == 0;
        let equals = op == Binop::Eq;
        self.changed = true;
        if to_zero ^ equals {
            body.graft_expr(id, inner);
        } else {
            body.set_expr(
                id,
                Expr::Unop {
                    op: Unop::Not,
                    expr: inner,
                },
            );
        }
        // The reduced shape can expose a fresh pattern at this box
        // (e.g. a double negation).
        self.visit_expr(body, id, stm)
    }

    /// `(cmpl/cmpg a, b) <op> 0` (non-strictfp only) becomes
    /// `!(a <inverse(op)> b)`, the shape that preserves the NaN ordering
    /// the three-way compare encodes. Any other compared constant is
    /// reported and left alone.
    fn fold_float_compare(
        &mut self,
        body: &mut Body,
        id: ExprId,
        op: Binop,
        lhs: ExprId,
        rhs: ExprId,
    ) -> VisitResult {
        if body.flags.strictfp {
            return Ok(());
        }
        let Expr::Binop {
            op: cmp_op,
            lhs: a,
            rhs: b,
            ..
        } = &body.exprs[lhs]
        else {
            return Ok(());
        };
        if !matches!(cmp_op, Binop::Cmpl | Binop::Cmpg) {
            return Ok(());
        }
        let (a, b) = (*a, *b);
        let Expr::Literal(lit) = &body.exprs[rhs] else {
            return Ok(());
        };
        if lit.as_int() != Some(0) {
            let rhs = lit.clone();
            self.report(Diagnostic::UnhandledFloatCompare { op, rhs });
            return Ok(());
        }
        let Some(inverse) = op.inverted() else {
            return Ok(());
        };
        let cmp = body.exprs.push(Expr::Binop {
            ty: Type::Bool,
            op: inverse,
            lhs: a,
            rhs: b,
        });
        body.set_expr(
            id,
            Expr::Unop {
                op: Unop::Not,
                expr: cmp,
            },
        );
        self.changed = true;
        Ok(())
    }

    /// `a = b; b = a` (bare locals, exact adjacent cross): the second
    /// assignment is redundant. The first moves into the second's box and
    /// the first box becomes a no-op.
    fn collapse_cross_assignment(&mut self, body: &mut Body, first: StmtId, second: StmtId) {
        let Stmt::SetLocal {
            local: a_local,
            expr: a_expr,
        } = &body.stmts[first]
        else {
            return;
        };
        let (a_local, a_expr) = (*a_local, *a_expr);
        let Stmt::SetLocal {
            local: b_local,
            expr: b_expr,
        } = &body.stmts[second]
        else {
            return;
        };
        let (b_local, b_expr) = (*b_local, *b_expr);
        let Expr::Local(a_src) = &body.exprs[a_expr] else {
            return;
        };
        let Expr::Local(b_src) = &body.exprs[b_expr] else {
            return;
        };
        if !(a_local == *b_src && *a_src == b_local) {
            return;
        }
        body.remove_write(b_local, second);
        body.remove_read(a_local, b_expr);
        body.graft_stmt(second, first);
        self.changed = true;
    }

    /// A local written once (to a bare local reference) and read exactly
    /// once, with the textually next statement as the read's enclosing
    /// statement, is forwarded into the read site; the store and both
    /// relations are dropped. Strictly adjacent only — intervening no-ops
    /// block the rule, and a read buried in a nested statement does not
    /// count (it may execute repeatedly or not at all).
    fn forward_adjacent_single_use(&mut self, body: &mut Body, first: StmtId, second: StmtId) {
        let Stmt::SetLocal { local, expr } = &body.stmts[first] else {
            return;
        };
        let (local, expr) = (*local, *expr);
        if !matches!(&body.exprs[expr], Expr::Local(_)) {
            return;
        }
        if body.locals[local].write_count() != 1 || body.locals[local].read_count() != 1 {
            return;
        }
        let read = body.locals[local].reads[0];
        if !body.stmt_operands_contain(second, read) {
            return;
        }
        body.locals[local].writes.clear();
        body.locals[local].reads.clear();
        body.graft_expr(read, expr);
        body.set_stmt(first, Stmt::Nop);
        self.changed = true;
    }

    /// Cleanup sweep: prune never-read locals from the declaration list,
    /// flatten the top-level sequence by discarding no-ops, then fold
    /// maximal +1-stride literal-index store runs over the same array
    /// local into single range stores.
    fn cleanup(&mut self, body: &mut Body) {
        let mut decls = std::mem::take(&mut body.decls);
        decls.retain(|&l| body.locals[l].is_used());
        body.decls = decls;

        let root = body.root;
        let Stmt::Seq(items) = &body.stmts[root] else {
            return;
        };
        let live: Vec<StmtId> = items
            .iter()
            .copied()
            .filter(|&s| !matches!(body.stmts[s], Stmt::Nop))
            .collect();
        body.set_stmt(root, Stmt::Seq(live));
        self.coalesce_array_stores(body, root);
    }

    /// Scan a statement sequence for runs of `arr[i] = v; arr[i+1] = w; …`
    /// over the same array local (possibly under casts) and fold each run
    /// longer than one store into a literal-range array store. Consumed
    /// statements become no-ops and their array/index reads are dropped;
    /// the stored values keep their boxes.
    fn coalesce_array_stores(&mut self, body: &mut Body, seq: StmtId) {
        let Stmt::Seq(items) = &body.stmts[seq] else {
            return;
        };
        let items = items.clone();
        let mut n = 0;
        while n < items.len() {
            let start = n;
            let first = items[n];
            n += 1;
            let Some((local, base)) = indexed_array_store(body, first) else {
                continue;
            };
            let mut last = base;
            while n < items.len() {
                let next = items[n];
                n += 1;
                if let Some((next_local, next_index)) = indexed_array_store(body, next) {
                    if next_local == local && next_index == last + 1 {
                        last = next_index;
                        continue;
                    }
                }
                n -= 1;
                break;
            }
            if last == base {
                continue;
            }
            let mut values = Vec::with_capacity(n - start);
            for (k, &consumed) in items[start..n].iter().enumerate() {
                let Stmt::SetArray { array, index, expr } = &body.stmts[consumed] else {
                    continue;
                };
                let (array, index, expr) = (*array, *index, *expr);
                values.push(expr);
                if k > 0 {
                    body.forget_expr_relations(array);
                    body.forget_expr_relations(index);
                    body.set_stmt(consumed, Stmt::Nop);
                }
            }
            let Stmt::SetArray { array, .. } = &body.stmts[first] else {
                continue;
            };
            let array = *array;
            body.set_stmt(
                first,
                Stmt::SetArrayLiterals {
                    array,
                    base_index: base,
                    values,
                },
            );
            self.changed = true;
        }
    }
}

/// Match `arr[k] = v` where `k` is an `int` literal and the array operand
/// peels (through casts) to a local reference; returns the local and index.
fn indexed_array_store(body: &Body, id: StmtId) -> Option<(LocalId, i32)> {
    let Stmt::SetArray { array, index, .. } = &body.stmts[id] else {
        return None;
    };
    let Expr::Literal(lit) = &body.exprs[*index] else {
        return None;
    };
    let idx = lit.as_int()?;
    let mut a = *array;
    while let Expr::Cast { expr, .. } = &body.exprs[a] {
        a = *expr;
    }
    let Expr::Local(local) = &body.exprs[a] else {
        return None;
    };
    Some((*local, idx))
}

impl Visitor for Peephole {
    /// Statement sequences: after the children stabilize, apply the
    /// adjacent-pair rules (cross double-assignment, single-use
    /// forwarding), then collapse the sequence if exactly one non-no-op
    /// statement remains.
    fn visit_seq(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)?;
        let Stmt::Seq(items) = &body.stmts[id] else {
            return Ok(());
        };
        let items = items.clone();
        for n in 1..items.len() {
            self.collapse_cross_assignment(body, items[n - 1], items[n]);
            self.forward_adjacent_single_use(body, items[n - 1], items[n]);
        }
        let live: Vec<StmtId> = items
            .iter()
            .copied()
            .filter(|&s| !matches!(body.stmts[s], Stmt::Nop))
            .collect();
        if live.len() == 1 {
            body.graft_stmt(id, live[0]);
            self.changed = true;
        }
        Ok(())
    }

    /// Expression statements: side-effect-free expressions are elided;
    /// unclassifiable ones are reported and kept.
    fn visit_stmt_expr(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)?;
        let Stmt::Expr(e) = &body.stmts[id] else {
            return Ok(());
        };
        let e = *e;
        match util::classify(body, e) {
            Purity::Pure => {
                body.forget_expr_relations(e);
                body.set_stmt(id, Stmt::Nop);
                self.changed = true;
            }
            Purity::Unknown => {
                let rendered = printer::print_expr(body, e);
                self.report(Diagnostic::UnknownPurity { expr: rendered });
            }
            Purity::Impure => {}
        }
        Ok(())
    }

    /// Local assignments: dead self-assignment, then write-once dead
    /// store (the store drops, the evaluated expression stays for its
    /// side effects).
    fn visit_set_local(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)?;
        let Stmt::SetLocal { local, expr } = &body.stmts[id] else {
            return Ok(());
        };
        let (local, expr) = (*local, *expr);

        if let Expr::Local(src) = &body.exprs[expr] {
            if *src == local {
                body.remove_write(local, id);
                body.remove_read(local, expr);
                body.set_stmt(id, Stmt::Nop);
                self.changed = true;
                return Ok(());
            }
        }

        if body.locals[local].read_count() == 0 && body.locals[local].write_count() == 1 {
            body.remove_write(local, id);
            body.set_stmt(id, Stmt::Expr(expr));
            self.changed = true;
            // The bare expression may now be elidable.
            return self.visit_stmt(body, id);
        }
        Ok(())
    }

    /// `if` without else: a lone nested `if` merges into the parent
    /// condition with `&&`.
    fn visit_if(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)?;
        let Stmt::If { cond, then_body } = &body.stmts[id] else {
            return Ok(());
        };
        let (cond, then_body) = (*cond, *then_body);
        let Stmt::If {
            cond: inner_cond,
            then_body: inner_then,
        } = &body.stmts[then_body]
        else {
            return Ok(());
        };
        let (inner_cond, inner_then) = (*inner_cond, *inner_then);
        let merged = body.exprs.push(Expr::Binop {
            ty: Type::Bool,
            op: Binop::BoolAnd,
            lhs: cond,
            rhs: inner_cond,
        });
        body.set_stmt(
            id,
            Stmt::If {
                cond: merged,
                then_body: inner_then,
            },
        );
        self.changed = true;
        Ok(())
    }

    /// `if (c) { x = e1 } else { x = e2 }` with the same local on both
    /// sides becomes `x = c ? e1 : e2`, remapping both writes onto the
    /// new statement.
    fn visit_if_else(&mut self, body: &mut Body, id: StmtId) -> VisitResult {
        walk_stmt(self, body, id)?;
        let Stmt::IfElse {
            cond,
            then_body,
            else_body,
        } = &body.stmts[id]
        else {
            return Ok(());
        };
        let (cond, then_body, else_body) = (*cond, *then_body, *else_body);
        let Stmt::SetLocal {
            local: then_local,
            expr: then_expr,
        } = &body.stmts[then_body]
        else {
            return Ok(());
        };
        let (then_local, then_expr) = (*then_local, *then_expr);
        let Stmt::SetLocal {
            local: else_local,
            expr: else_expr,
        } = &body.stmts[else_body]
        else {
            return Ok(());
        };
        let (else_local, else_expr) = (*else_local, *else_expr);
        if then_local != else_local {
            return Ok(());
        }
        body.remove_write(then_local, then_body);
        body.remove_write(then_local, else_body);
        let ternary = body.exprs.push(Expr::Ternary {
            cond,
            if_true: then_expr,
            if_false: else_expr,
        });
        body.set_stmt(
            id,
            Stmt::SetLocal {
                local: then_local,
                expr: ternary,
            },
        );
        body.add_write(then_local, id);
        self.changed = true;
        // The merged store may itself be a write-once dead store.
        self.visit_stmt(body, id)
    }

    /// Binary operations: boolean-from-cast-compare and the float
    /// three-way-compare idiom.
    fn visit_binop(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)?;
        let Expr::Binop { op, lhs, rhs, .. } = &body.exprs[id] else {
            return Ok(());
        };
        let (op, lhs, rhs) = (*op, *lhs, *rhs);
        match op {
            Binop::Eq | Binop::Ne => self.fold_bool_cast_compare(body, id, op, lhs, rhs, stm),
            Binop::Lt | Binop::Le | Binop::Gt | Binop::Ge => {
                self.fold_float_compare(body, id, op, lhs, rhs)
            }
            _ => Ok(()),
        }
    }

    /// `!`: double negation cancels; a negated comparison becomes the
    /// inverse comparison. Relational inversion is skipped for floating
    /// operands, where `!(a < b)` and `a >= b` disagree on NaN.
    fn visit_unop(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)?;
        let Expr::Unop {
            op: Unop::Not,
            expr,
        } = &body.exprs[id]
        else {
            return Ok(());
        };
        let inner = *expr;
        match &body.exprs[inner] {
            Expr::Binop { op, lhs, rhs, .. } => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                let Some(inverse) = op.inverted() else {
                    return Ok(());
                };
                if op.is_relational()
                    && (body.expr_ty(lhs)?.is_floating() || body.expr_ty(rhs)?.is_floating())
                {
                    return Ok(());
                }
                body.set_expr(
                    id,
                    Expr::Binop {
                        ty: Type::Bool,
                        op: inverse,
                        lhs,
                        rhs,
                    },
                );
                self.changed = true;
            }
            Expr::Unop {
                op: Unop::Not,
                expr,
            } => {
                let innermost = *expr;
                body.graft_expr(id, innermost);
                self.changed = true;
            }
            _ => {}
        }
        Ok(())
    }

    /// Static calls: a call to a known no-op runtime helper turns its
    /// whole enclosing statement into a no-op.
    fn visit_call_static(
        &mut self,
        body: &mut Body,
        id: ExprId,
        stm: Option<StmtId>,
    ) -> VisitResult {
        walk_expr(self, body, id, stm)?;
        let Expr::CallStatic { method, .. } = &body.exprs[id] else {
            return Ok(());
        };
        if !is_denylisted(method) {
            return Ok(());
        }
        let Some(stmt) = stm else {
            return Ok(());
        };
        body.forget_stmt_relations(stmt);
        body.set_stmt(stmt, Stmt::Nop);
        self.changed = true;
        Ok(())
    }

    /// Casts: redundant cast removal, nested reference-cast collapse,
    /// and numeric literal folding with JVM-exact conversion semantics.
    fn visit_cast(&mut self, body: &mut Body, id: ExprId, stm: Option<StmtId>) -> VisitResult {
        walk_expr(self, body, id, stm)?;
        let Expr::Cast { expr, to } = &body.exprs[id] else {
            return Ok(());
        };
        let (inner, to) = (*expr, to.clone());

        if body.expr_ty(inner)? == to {
            body.graft_expr(id, inner);
            self.changed = true;
            return self.visit_expr(body, id, stm);
        }

        if let Expr::Cast {
            expr: innermost,
            to: mid,
        } = &body.exprs[inner]
        {
            if to.is_reference() && mid.is_reference() {
                let innermost = *innermost;
                body.set_expr(
                    id,
                    Expr::Cast {
                        expr: innermost,
                        to,
                    },
                );
                self.changed = true;
                return self.visit_expr(body, id, stm);
            }
        }

        if let Expr::Literal(lit) = &body.exprs[inner] {
            if let Some(folded) = lit.cast_to(&to) {
                body.set_expr(id, Expr::Literal(folded));
                self.changed = true;
            }
        }
        Ok(())
    }
}

impl Transform for Peephole {
    fn name(&self) -> &str {
        "peephole"
    }

    fn apply(&self, body: Body) -> Result<TransformResult, CoreError> {
        let mut peephole = Peephole::new();
        let mut body = body;
        let changed = peephole.run(&mut body)?;
        Ok(TransformResult { body, changed })
    }
}
