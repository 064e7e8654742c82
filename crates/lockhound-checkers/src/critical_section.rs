//! SA2001 — empty critical section.
//!
//! AST-shaped on purpose: between `m.x().Lock()` and `m.x().Unlock()`
//! the SSA carries a second call to `x()`, so adjacent-instruction
//! matching there would miss real bugs. Two adjacent statements that
//! are zero-argument, zero-result method calls on textually identical
//! receivers, pairing Lock/Unlock or RLock/RUnlock, protect nothing.

use lockhound_ir::ast::{walk_blocks, BlockStmt, CallStmt, Decl, Stmt};

use crate::checker::{Checker, Job};

/// Receiver rendering and method name of a statement, when it is a
/// zero-argument, zero-result method call.
fn mutex_params(stmt: &Stmt) -> Option<(&str, &str)> {
    let Stmt::Call(call) = stmt else {
        return None;
    };
    let recv = call.recv.as_deref()?;
    if call.args != 0 || call.results != 0 {
        return None;
    }
    Some((recv, &call.method))
}

fn check_block(block: &BlockStmt, out: &mut Vec<CallStmt>) {
    if block.stmts.len() < 2 {
        return;
    }
    for pair in block.stmts.windows(2) {
        let (Some((recv1, method1)), Some((recv2, method2))) =
            (mutex_params(&pair[0]), mutex_params(&pair[1]))
        else {
            continue;
        };
        if recv1 != recv2 {
            continue;
        }
        if (method1 == "Lock" && method2 == "Unlock")
            || (method1 == "RLock" && method2 == "RUnlock")
        {
            if let Stmt::Call(second) = &pair[1] {
                out.push(second.clone());
            }
        }
    }
}

pub fn check_empty_critical_section(checker: &Checker, job: &mut Job) {
    let mut findings = Vec::new();

    for file in checker.ast_files(job.program) {
        for decl in &file.decls {
            let Decl::Func(func) = decl else {
                continue;
            };
            let Some(body) = &func.body else {
                continue;
            };
            walk_blocks(body, &mut |block| check_block(block, &mut findings));
        }
    }

    for call in findings {
        job.report("SA2001", call.span.as_ref(), "empty critical section".into());
    }
}
