//! Def-use consistency checking.
//!
//! A `Local`'s `reads`/`writes` must exactly match the statements and
//! expressions reachable from the body's root. A stale entry is a
//! soundness bug in whichever rewrite last touched the tree, so the
//! optimizer asserts consistency after every pass in debug builds.

use std::collections::{HashMap, HashSet};

use super::body::Body;
use super::tree::{Expr, ExprId, LocalId, StmtId};

/// Check that every local's relations and the reachable tree agree.
///
/// Detects, in either direction: relation entries pointing at
/// unreachable boxes, boxes whose content no longer matches the relation
/// (e.g. a read entry whose box no longer holds a reference to that
/// local), reachable read/write sites missing from the tables, and a box
/// reachable through two parents (the tree must stay a tree).
pub fn check_def_use(body: &Body) -> Result<(), String> {
    let mut seen_stmts: HashSet<StmtId> = HashSet::new();
    let mut seen_exprs: HashSet<ExprId> = HashSet::new();
    let mut actual_writes: HashMap<LocalId, Vec<StmtId>> = HashMap::new();
    let mut actual_reads: HashMap<LocalId, Vec<ExprId>> = HashMap::new();

    let mut stmt_work = vec![body.root];
    let mut expr_work = Vec::new();
    while let Some(id) = stmt_work.pop() {
        if !seen_stmts.insert(id) {
            return Err(format!("statement box {id:?} is reachable twice"));
        }
        if let Some(local) = body.stmts[id].written_local() {
            actual_writes.entry(local).or_default().push(id);
        }
        body.stmts[id].children(&mut expr_work, &mut stmt_work);
    }
    while let Some(id) = expr_work.pop() {
        if !seen_exprs.insert(id) {
            return Err(format!("expression box {id:?} is reachable twice"));
        }
        if let Expr::Local(local) = body.exprs[id] {
            actual_reads.entry(local).or_default().push(id);
        }
        body.exprs[id].children(&mut expr_work);
    }

    for (local, entry) in body.locals.iter() {
        let mut expected_writes: Vec<StmtId> =
            actual_writes.remove(&local).unwrap_or_default();
        let mut recorded_writes = entry.writes.clone();
        expected_writes.sort_by_key(|id| crate::entity::EntityRef::index(*id));
        recorded_writes.sort_by_key(|id| crate::entity::EntityRef::index(*id));
        if expected_writes != recorded_writes {
            return Err(format!(
                "local `{}`: recorded writes {recorded_writes:?} but tree has {expected_writes:?}",
                entry.name
            ));
        }

        let mut expected_reads: Vec<ExprId> = actual_reads.remove(&local).unwrap_or_default();
        let mut recorded_reads = entry.reads.clone();
        expected_reads.sort_by_key(|id| crate::entity::EntityRef::index(*id));
        recorded_reads.sort_by_key(|id| crate::entity::EntityRef::index(*id));
        if expected_reads != recorded_reads {
            return Err(format!(
                "local `{}`: recorded reads {recorded_reads:?} but tree has {expected_reads:?}",
                entry.name
            ));
        }
    }

    Ok(())
}
