//! SA2000 / SA2007 — sync.WaitGroup misuse.
//!
//! SA2000 (AST): `wg.Add` as the first statement of a goroutine body
//! races with the corresponding `Wait`; Add must precede the `go`.
//!
//! SA2007 (SSA, registered but disabled by default): a loop that both
//! launches goroutines calling `Done` and calls `Wait` in its body can
//! deadlock as iterations fan out.

use lockhound_ir::ast::{walk_blocks, CallStmt, Decl, GoCallee, Stmt};
use lockhound_ir::calls::unwrap_function;
use lockhound_ir::ir::InstrKind;

use crate::checker::{Checker, Job};

const WAITGROUP_ADD: &str = "(*sync.WaitGroup).Add";

pub fn check_waitgroup_add(checker: &Checker, job: &mut Job) {
    let mut findings: Vec<CallStmt> = Vec::new();

    for file in checker.ast_files(job.program) {
        for decl in &file.decls {
            let Decl::Func(func) = decl else {
                continue;
            };
            let Some(body) = &func.body else {
                continue;
            };
            walk_blocks(body, &mut |block| {
                for stmt in &block.stmts {
                    let Stmt::Go(go) = stmt else {
                        continue;
                    };
                    let GoCallee::FuncLit(lit) = &go.callee else {
                        continue;
                    };
                    let Some(Stmt::Call(call)) = lit.stmts.first() else {
                        continue;
                    };
                    if call.qualified.as_deref() == Some(WAITGROUP_ADD) {
                        findings.push(call.clone());
                    }
                }
            });
        }
    }

    for call in findings {
        let rendering = call.rendering.clone();
        job.report(
            "SA2000",
            call.span.as_ref(),
            format!("should call {rendering} before starting the goroutine to avoid a race"),
        );
    }
}

pub fn check_waitgroup_blocking(checker: &Checker, job: &mut Job) {
    let ssa = &job.program.ssa;

    for &func in &ssa.initial {
        for lp in checker.descs().loops(func) {
            let mut done_in_goroutine = false;
            let mut calls_wait = false;

            for &b in &lp.blocks {
                for ins in &ssa.block(func, b).instrs {
                    if let InstrKind::Go(go) = &ins.kind {
                        let Some(target) = unwrap_function(&go.callee) else {
                            continue;
                        };
                        let target = &ssa.functions[target];
                        if target.blocks.is_empty() {
                            continue;
                        }
                        for block in &target.blocks {
                            for inner in &block.instrs {
                                let InstrKind::Call(call) = &inner.kind else {
                                    continue;
                                };
                                if call.rendering.to_lowercase().contains(".done(") {
                                    done_in_goroutine = true;
                                }
                            }
                        }
                    }

                    if let InstrKind::Call(call) = &ins.kind {
                        if call.rendering.to_lowercase().contains(".wait(") {
                            calls_wait = true;
                        }
                    }
                }
            }

            if calls_wait && done_in_goroutine {
                for &b in &lp.blocks {
                    for ins in &ssa.block(func, b).instrs {
                        if let Some(span) = &ins.span {
                            job.report(
                                "SA2007",
                                Some(span),
                                "There is a potential blocking bug,\
                                 which caused by misusing Wait() and Done()!"
                                    .into(),
                            );
                            break;
                        }
                    }
                }
            }
        }
    }
}
