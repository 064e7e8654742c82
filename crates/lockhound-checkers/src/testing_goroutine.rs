//! SA2002 — test-fatal helpers called from a goroutine.
//!
//! `FailNow` and friends call `runtime.Goexit`, which only terminates
//! the goroutine it runs on; called from a spawned goroutine the test
//! keeps running. Flags every `go` whose target function (directly or
//! through a closure) calls one of them on a `*testing.common`
//! receiver.

use lockhound_ir::calls::unwrap_function;
use lockhound_ir::ir::{Callee, InstrKind};

use crate::checker::{Checker, Job};

const FATAL_METHODS: &[&str] = &["FailNow", "Fatal", "Fatalf", "SkipNow", "Skip", "Skipf"];

pub fn check_concurrent_testing(_checker: &Checker, job: &mut Job) {
    let ssa = &job.program.ssa;

    for &func in &ssa.initial {
        for block in &ssa.functions[func].blocks {
            for ins in &block.instrs {
                let InstrKind::Go(go) = &ins.kind else {
                    continue;
                };
                let Some(target) = unwrap_function(&go.callee) else {
                    continue;
                };
                let target = &ssa.functions[target];
                if target.blocks.is_empty() {
                    continue;
                }

                for inner_block in &target.blocks {
                    for inner in &inner_block.instrs {
                        let InstrKind::Call(call) = &inner.kind else {
                            continue;
                        };
                        if call.is_invoke() {
                            continue;
                        }
                        let callee = match call.callee {
                            Callee::Static(id) | Callee::Closure(id) => &ssa.functions[id],
                            _ => continue,
                        };
                        if callee.recv_type.as_deref() != Some("*testing.common") {
                            continue;
                        }
                        let name = callee.short_name.as_str();
                        if !FATAL_METHODS.contains(&name) {
                            continue;
                        }
                        job.report(
                            "SA2002",
                            ins.span.as_ref(),
                            format!(
                                "the goroutine calls T.{name}, which must be called in \
                                 the same goroutine as the test"
                            ),
                        );
                    }
                }
            }
        }
    }
}
