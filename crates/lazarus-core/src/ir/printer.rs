//! Human-readable rendering of bodies, for logs and test assertions.
//!
//! The output is Java-flavored pseudo-source; it is not meant to be
//! parsed back.

use std::fmt::Write as _;

use super::body::Body;
use super::tree::{Binop, Expr, ExprId, Stmt, StmtId, Unop};
use super::value::Literal;

/// Render a whole body: local declarations, then the statement tree.
pub fn print_body(body: &Body) -> String {
    let mut out = String::new();
    for &local in &body.decls {
        let l = &body.locals[local];
        let _ = writeln!(out, "local {}: {}", l.name, l.ty);
    }
    print_stmt_into(body, body.root, 0, &mut out);
    out
}

/// Render a single statement subtree.
pub fn print_stmt(body: &Body, id: StmtId) -> String {
    let mut out = String::new();
    print_stmt_into(body, id, 0, &mut out);
    out
}

/// Render a single expression subtree.
pub fn print_expr(body: &Body, id: ExprId) -> String {
    let mut out = String::new();
    print_expr_into(body, id, &mut out);
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn print_stmt_into(body: &Body, id: StmtId, level: usize, out: &mut String) {
    match &body.stmts[id] {
        Stmt::Seq(items) => {
            for &item in items {
                print_stmt_into(body, item, level, out);
            }
        }
        Stmt::Nop => {
            indent(out, level);
            out.push_str("nop;\n");
        }
        Stmt::Expr(e) => {
            indent(out, level);
            print_expr_into(body, *e, out);
            out.push_str(";\n");
        }
        Stmt::SetLocal { local, expr } => {
            indent(out, level);
            let _ = write!(out, "{} = ", body.locals[*local].name);
            print_expr_into(body, *expr, out);
            out.push_str(";\n");
        }
        Stmt::SetArray { array, index, expr } => {
            indent(out, level);
            print_expr_into(body, *array, out);
            out.push('[');
            print_expr_into(body, *index, out);
            out.push_str("] = ");
            print_expr_into(body, *expr, out);
            out.push_str(";\n");
        }
        Stmt::SetStaticField { field, expr } => {
            indent(out, level);
            let _ = write!(out, "{}.{} = ", field.owner, field.name);
            print_expr_into(body, *expr, out);
            out.push_str(";\n");
        }
        Stmt::SetInstanceField {
            object,
            field,
            expr,
        } => {
            indent(out, level);
            print_expr_into(body, *object, out);
            let _ = write!(out, ".{} = ", field.name);
            print_expr_into(body, *expr, out);
            out.push_str(";\n");
        }
        Stmt::SetNewWithConstructor {
            local, ty, args, ..
        } => {
            indent(out, level);
            let _ = write!(out, "{} = new {}(", body.locals[*local].name, ty);
            print_comma_separated(body, args, out);
            out.push_str(");\n");
        }
        Stmt::If { cond, then_body } => {
            indent(out, level);
            out.push_str("if (");
            print_expr_into(body, *cond, out);
            out.push_str(") {\n");
            print_stmt_into(body, *then_body, level + 1, out);
            indent(out, level);
            out.push_str("}\n");
        }
        Stmt::IfElse {
            cond,
            then_body,
            else_body,
        } => {
            indent(out, level);
            out.push_str("if (");
            print_expr_into(body, *cond, out);
            out.push_str(") {\n");
            print_stmt_into(body, *then_body, level + 1, out);
            indent(out, level);
            out.push_str("} else {\n");
            print_stmt_into(body, *else_body, level + 1, out);
            indent(out, level);
            out.push_str("}\n");
        }
        Stmt::While { cond, body: inner } => {
            indent(out, level);
            out.push_str("while (");
            print_expr_into(body, *cond, out);
            out.push_str(") {\n");
            print_stmt_into(body, *inner, level + 1, out);
            indent(out, level);
            out.push_str("}\n");
        }
        Stmt::Return(value) => {
            indent(out, level);
            match value {
                Some(e) => {
                    out.push_str("return ");
                    print_expr_into(body, *e, out);
                    out.push_str(";\n");
                }
                None => out.push_str("return;\n"),
            }
        }
        Stmt::Throw(value) => {
            indent(out, level);
            out.push_str("throw ");
            print_expr_into(body, *value, out);
            out.push_str(";\n");
        }
        Stmt::Rethrow => {
            indent(out, level);
            out.push_str("rethrow;\n");
        }
        Stmt::TryCatch {
            try_body,
            catch_body,
        } => {
            indent(out, level);
            out.push_str("try {\n");
            print_stmt_into(body, *try_body, level + 1, out);
            indent(out, level);
            out.push_str("} catch {\n");
            print_stmt_into(body, *catch_body, level + 1, out);
            indent(out, level);
            out.push_str("}\n");
        }
        Stmt::Break => {
            indent(out, level);
            out.push_str("break;\n");
        }
        Stmt::Continue => {
            indent(out, level);
            out.push_str("continue;\n");
        }
        Stmt::Switch {
            subject,
            cases,
            default,
        } => {
            indent(out, level);
            out.push_str("switch (");
            print_expr_into(body, *subject, out);
            out.push_str(") {\n");
            for (keys, case_body) in cases {
                indent(out, level + 1);
                let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                let _ = writeln!(out, "case {}:", keys.join(", "));
                print_stmt_into(body, *case_body, level + 2, out);
            }
            indent(out, level + 1);
            out.push_str("default:\n");
            print_stmt_into(body, *default, level + 2, out);
            indent(out, level);
            out.push_str("}\n");
        }
        Stmt::Label(label) => {
            indent(out, level);
            let _ = writeln!(out, "{}:", label.0);
        }
        Stmt::IfGoto { cond, label } => {
            indent(out, level);
            out.push_str("if (");
            print_expr_into(body, *cond, out);
            let _ = writeln!(out, ") goto {};", label.0);
        }
        Stmt::SwitchGoto {
            subject,
            cases,
            default,
        } => {
            indent(out, level);
            out.push_str("switch (");
            print_expr_into(body, *subject, out);
            out.push_str(") goto {");
            for (keys, label) in cases {
                let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                let _ = write!(out, " case {}: {};", keys.join(", "), label.0);
            }
            let _ = writeln!(out, " default: {}; }}", default.0);
        }
        Stmt::MonitorEnter(e) => {
            indent(out, level);
            out.push_str("monitor_enter ");
            print_expr_into(body, *e, out);
            out.push_str(";\n");
        }
        Stmt::MonitorExit(e) => {
            indent(out, level);
            out.push_str("monitor_exit ");
            print_expr_into(body, *e, out);
            out.push_str(";\n");
        }
        Stmt::SetArrayLiterals {
            array,
            base_index,
            values,
        } => {
            indent(out, level);
            print_expr_into(body, *array, out);
            let _ = write!(
                out,
                "[{}..{}] = [",
                base_index,
                *base_index + values.len() as i32 - 1
            );
            print_comma_separated(body, values, out);
            out.push_str("];\n");
        }
    }
}

fn print_comma_separated(body: &Body, items: &[ExprId], out: &mut String) {
    for (i, &item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        print_expr_into(body, item, out);
    }
}

fn print_literal(lit: &Literal, out: &mut String) {
    let _ = match lit {
        Literal::Null => write!(out, "null"),
        Literal::Bool(v) => write!(out, "{v}"),
        Literal::Byte(v) => write!(out, "{v}b"),
        Literal::Short(v) => write!(out, "{v}s"),
        Literal::Char(v) => write!(out, "{v}c"),
        Literal::Int(v) => write!(out, "{v}"),
        Literal::Long(v) => write!(out, "{v}L"),
        Literal::Float(v) => write!(out, "{v}f"),
        Literal::Double(v) => write!(out, "{v}d"),
        Literal::Str(v) => write!(out, "{v:?}"),
        Literal::Class(ty) => write!(out, "{ty}.class"),
    };
}

fn binop_symbol(op: Binop) -> &'static str {
    match op {
        Binop::Add => "+",
        Binop::Sub => "-",
        Binop::Mul => "*",
        Binop::Div => "/",
        Binop::Rem => "%",
        Binop::And => "&",
        Binop::Or => "|",
        Binop::Xor => "^",
        Binop::Shl => "<<",
        Binop::Shr => ">>",
        Binop::Ushr => ">>>",
        Binop::BoolAnd => "&&",
        Binop::BoolOr => "||",
        Binop::Eq => "==",
        Binop::Ne => "!=",
        Binop::Lt => "<",
        Binop::Le => "<=",
        Binop::Gt => ">",
        Binop::Ge => ">=",
        Binop::Cmp => "cmp",
        Binop::Cmpl => "cmpl",
        Binop::Cmpg => "cmpg",
    }
}

fn print_expr_into(body: &Body, id: ExprId, out: &mut String) {
    match &body.exprs[id] {
        Expr::This { .. } => out.push_str("this"),
        Expr::Literal(lit) => print_literal(lit, out),
        Expr::Local(local) => out.push_str(&body.locals[*local].name),
        Expr::Param(param) => out.push_str(&body.params[*param].name),
        Expr::CaughtException { .. } => out.push_str("$ex"),
        Expr::Binop { op, lhs, rhs, .. } => {
            out.push('(');
            print_expr_into(body, *lhs, out);
            let _ = write!(out, " {} ", binop_symbol(*op));
            print_expr_into(body, *rhs, out);
            out.push(')');
        }
        Expr::Unop { op, expr } => {
            let symbol = match op {
                Unop::Neg => "-",
                Unop::Not => "!",
                Unop::Inv => "~",
            };
            out.push('(');
            out.push_str(symbol);
            print_expr_into(body, *expr, out);
            out.push(')');
        }
        Expr::CallInstance { object, method, args } => {
            print_expr_into(body, *object, out);
            let _ = write!(out, ".{}(", method.name);
            print_comma_separated(body, args, out);
            out.push(')');
        }
        Expr::CallSuper { method, args, .. } => {
            let _ = write!(out, "super.{}(", method.name);
            print_comma_separated(body, args, out);
            out.push(')');
        }
        Expr::CallStatic { method, args } => {
            let _ = write!(out, "{}.{}(", method.owner, method.name);
            print_comma_separated(body, args, out);
            out.push(')');
        }
        Expr::ArrayLength { array } => {
            print_expr_into(body, *array, out);
            out.push_str(".length");
        }
        Expr::ArrayAccess { array, index, .. } => {
            print_expr_into(body, *array, out);
            out.push('[');
            print_expr_into(body, *index, out);
            out.push(']');
        }
        Expr::InstanceFieldAccess { object, field } => {
            print_expr_into(body, *object, out);
            let _ = write!(out, ".{}", field.name);
        }
        Expr::StaticFieldAccess { field } => {
            let _ = write!(out, "{}.{}", field.owner, field.name);
        }
        Expr::InstanceOf { expr, check_ty } => {
            out.push('(');
            print_expr_into(body, *expr, out);
            let _ = write!(out, " instanceof {check_ty})");
        }
        Expr::Cast { expr, to } => {
            let _ = write!(out, "(({to})");
            print_expr_into(body, *expr, out);
            out.push(')');
        }
        Expr::New { ty } => {
            let _ = write!(out, "new {ty}");
        }
        Expr::NewWithConstructor { ty, args, .. } => {
            let _ = write!(out, "new {ty}(");
            print_comma_separated(body, args, out);
            out.push(')');
        }
        Expr::NewArray { elem_ty, counts } => {
            let _ = write!(out, "new {elem_ty}[");
            print_comma_separated(body, counts, out);
            out.push(']');
        }
        Expr::Ternary {
            cond,
            if_true,
            if_false,
        } => {
            out.push('(');
            print_expr_into(body, *cond, out);
            out.push_str(" ? ");
            print_expr_into(body, *if_true, out);
            out.push_str(" : ");
            print_expr_into(body, *if_false, out);
            out.push(')');
        }
        Expr::MethodRef(method) => {
            let _ = write!(out, "{}::{}", method.owner, method.name);
        }
        Expr::ArrayLiteral { values, .. } => {
            out.push('[');
            print_comma_separated(body, values, out);
            out.push(']');
        }
    }
}
