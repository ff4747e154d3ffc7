//! Stress tests — exercise many rewrite rules against one body and check
//! the invariants that matter across rules:
//!
//! 1. Def-use tables match the tree after the pass.
//! 2. The optimized body is a fixed point (a second pass fires nothing).
//! 3. Side-effect order survives.

use crate::ir::printer::print_body;
use crate::ir::ty::MethodRef;
use crate::ir::verify::check_def_use;
use crate::ir::{Binop, Body, BodyBuilder, Literal, Type};
use crate::pipeline::PassConfig;
use crate::transforms::{default_pipeline, Peephole};

fn run(body: &mut Body) -> bool {
    let mut peephole = Peephole::new();
    let changed = peephole.run(body).unwrap();
    check_def_use(body).unwrap();
    changed
}

fn assert_fixed_point(body: &mut Body) {
    let changed = run(body);
    assert!(!changed, "not a fixed point:\n{}", print_body(body));
}

/// One body exercising the intrinsic strip, parameter forwarding, the
/// boolean-cast compare, ternary synthesis, the cross double-assignment,
/// pure-statement elision, and array-store coalescing together.
#[test]
fn composite_method() {
    let mut bb = BodyBuilder::new();
    let o = bb.param("o", Type::object());
    let flag = bb.param("flag", Type::Bool);
    let n = bb.param("n", Type::Int);
    let tmp = bb.local("tmp", Type::Int);
    let a = bb.local("a", Type::Int);
    let b = bb.local("b", Type::Int);
    let arr = bb.local("arr", Type::array_of(Type::Int));

    // Intrinsics.checkParameterIsNotNull(o, "o");
    let intrinsic = MethodRef::new(
        "kotlin.jvm.internal.Intrinsics",
        "checkParameterIsNotNull",
        vec![Type::object(), Type::string()],
        Type::Void,
    );
    let ro = bb.param_ref(o);
    let msg = bb.lit(Literal::Str("o".into()));
    let call = bb.call_static(intrinsic, vec![ro, msg]);
    let s1 = bb.expr_stmt(call);

    // tmp = n;
    let rn = bb.param_ref(n);
    let s2 = bb.set_local(tmp, rn);

    // if (((int) flag) == 0) { a = 1; } else { a = 2; }
    let rflag = bb.param_ref(flag);
    let cast = bb.cast(rflag, Type::Int);
    let zero = bb.int(0);
    let cond = bb.cmp(Binop::Eq, cast, zero);
    let one = bb.int(1);
    let two = bb.int(2);
    let then_store = bb.set_local(a, one);
    let else_store = bb.set_local(a, two);
    let s3 = bb.if_else(cond, then_store, else_store);

    // b = a; a = b;
    let ra1 = bb.local_ref(a);
    let s4a = bb.set_local(b, ra1);
    let rb1 = bb.local_ref(b);
    let s4b = bb.set_local(a, rb1);

    // arr[0] = tmp; arr[1] = 10; arr[2] = 20;
    let rarr1 = bb.local_ref(arr);
    let i0 = bb.int(0);
    let rtmp = bb.local_ref(tmp);
    let s5a = bb.set_array(rarr1, i0, rtmp);
    let rarr2 = bb.local_ref(arr);
    let i1 = bb.int(1);
    let v10 = bb.int(10);
    let s5b = bb.set_array(rarr2, i1, v10);
    let rarr3 = bb.local_ref(arr);
    let i2 = bb.int(2);
    let v20 = bb.int(20);
    let s5c = bb.set_array(rarr3, i2, v20);

    // (a + b);  — pure, evaluated for nothing
    let ra6 = bb.local_ref(a);
    let rb6 = bb.local_ref(b);
    let sum6 = bb.binop(Type::Int, Binop::Add, ra6, rb6);
    let s6 = bb.expr_stmt(sum6);

    // return a + b;
    let ra7 = bb.local_ref(a);
    let rb7 = bb.local_ref(b);
    let sum7 = bb.binop(Type::Int, Binop::Add, ra7, rb7);
    let s7 = bb.ret(Some(sum7));

    let root = bb.seq(vec![s1, s2, s3, s4a, s4b, s5a, s5b, s5c, s6, s7]);
    let mut body = bb.finish(root);
    run(&mut body);

    assert_eq!(
        print_body(&body),
        "local a: int\n\
         local b: int\n\
         local arr: int[]\n\
         a = ((!flag) ? 1 : 2);\n\
         b = a;\n\
         arr[0..2] = [n, 10, 20];\n\
         nop;\n\
         nop;\n\
         return (a + b);\n"
    );
    assert_eq!(body.locals[a].writes, vec![s3]);
    assert_eq!(body.locals[b].writes, vec![s4b]);
    assert_eq!(body.locals[tmp].read_count(), 0);
    assert_fixed_point(&mut body);
}

/// Chains of removable noise (self-assignments, dead pure stores, double
/// negations) of growing depth all optimize to the bare return and stay
/// consistent.
#[test]
fn noise_chains_reach_fixed_point() {
    for depth in 1..6 {
        let mut bb = BodyBuilder::new();
        let p = bb.param("p", Type::Bool);
        let mut items = Vec::new();
        let mut locals = Vec::new();
        for i in 0..depth {
            let x = bb.local(format!("x{i}"), Type::Int);
            locals.push(x);
            // x = x;
            let r = bb.local_ref(x);
            items.push(bb.set_local(x, r));
            // y = <pure>, never read
            let y = bb.local(format!("y{i}"), Type::Int);
            let lit = bb.lit(Literal::Double(3.9 + i as f64));
            let folded = bb.cast(lit, Type::Int);
            items.push(bb.set_local(y, folded));
        }
        // return !!p;
        let rp = bb.param_ref(p);
        let n1 = bb.not(rp);
        let n2 = bb.not(n1);
        items.push(bb.ret(Some(n2)));
        let root = bb.seq(items);
        let mut body = bb.finish(root);

        run(&mut body);
        assert_eq!(print_body(&body), "return p;\n", "depth {depth}");
        for x in locals {
            assert_eq!(body.locals[x].write_count(), 0);
        }
        assert_fixed_point(&mut body);
    }
}

/// The default pipeline with fixpoint iteration lands on the same result
/// as a single peephole run.
#[test]
fn pipeline_matches_direct_run() {
    let build = || {
        let mut bb = BodyBuilder::new();
        let p = bb.param("p", Type::Int);
        let x = bb.local("x", Type::Int);
        let pr = bb.param_ref(p);
        let set = bb.set_local(x, pr);
        let r1 = bb.local_ref(x);
        let r2 = bb.local_ref(x);
        let sum = bb.binop(Type::Int, Binop::Add, r1, r2);
        let ret = bb.ret(Some(sum));
        let root = bb.seq(vec![set, ret]);
        bb.finish(root)
    };

    let mut direct = build();
    run(&mut direct);

    let config = PassConfig {
        peephole: true,
        fixpoint: true,
    };
    let piped = default_pipeline(&config).run(build()).unwrap();
    check_def_use(&piped).unwrap();
    assert_eq!(print_body(&direct), print_body(&piped));
    assert_eq!(print_body(&piped), "return (p + p);\n");
}
