//! SA2003 / SA2004 — lock followed immediately by a deferred lock or an
//! unlock.
//!
//! Both checks look at consecutive non-debug instructions within one
//! block: the first a lock call, the second a `defer` of the same lock
//! method (SA2003) or an immediate unlock (SA2004), on the same
//! receiver. In both cases the user almost certainly meant
//! `defer <unlock>()`.

use lockhound_ir::calls::{filter_debug, is_lock_call, is_unlock_call};
use lockhound_ir::ir::InstrKind;

use crate::checker::{Checker, Job};

/// The unlock that pairs with a lock method name.
fn unlock_for(name: &str) -> &'static str {
    match name {
        "Lock" => "Unlock",
        "RLock" => "RUnlock",
        _ => "",
    }
}

pub fn check_defer_lock(_checker: &Checker, job: &mut Job) {
    let ssa = &job.program.ssa;

    for &func in &ssa.initial {
        for block in &ssa.functions[func].blocks {
            let instrs = filter_debug(&block.instrs);
            if instrs.len() < 2 {
                continue;
            }
            for i in 0..instrs.len() - 1 {
                let InstrKind::Call(call) = &instrs[i].kind else {
                    continue;
                };
                if !is_lock_call(ssa, call) {
                    continue;
                }
                let next = instrs[i + 1];
                let InstrKind::Defer(deferred) = &next.kind else {
                    continue;
                };
                if !is_lock_call(ssa, deferred) {
                    continue;
                }
                match (call.args.first(), deferred.args.first()) {
                    (Some(a), Some(b)) if a == b => {}
                    _ => continue,
                }
                let name = ssa.short_call_name(call);
                let alt = unlock_for(&name);
                job.report(
                    "SA2003",
                    next.span.as_ref(),
                    format!(
                        "deferring {name} right after having locked already; \
                         did you mean to defer {alt}?"
                    ),
                );
            }
        }
    }
}

pub fn check_unlock_after_lock(_checker: &Checker, job: &mut Job) {
    let ssa = &job.program.ssa;

    for &func in &ssa.initial {
        for block in &ssa.functions[func].blocks {
            let instrs = filter_debug(&block.instrs);
            if instrs.len() < 2 {
                continue;
            }
            for i in 0..instrs.len() - 1 {
                let InstrKind::Call(call) = &instrs[i].kind else {
                    continue;
                };
                if !is_lock_call(ssa, call) {
                    continue;
                }
                let next = instrs[i + 1];
                let InstrKind::Call(unlock) = &next.kind else {
                    continue;
                };
                if !is_unlock_call(ssa, unlock) {
                    continue;
                }
                match (call.args.first(), unlock.args.first()) {
                    (Some(a), Some(b)) if a == b => {}
                    _ => continue,
                }
                let name = ssa.short_call_name(call);
                let alt = unlock_for(&name);
                job.report(
                    "SA2004",
                    next.span.as_ref(),
                    format!("Unlock {name} right after locking; did you mean to defer {alt}?"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Checker;
    use lockhound_diagnostics::diagnostic::Collector;
    use lockhound_ir::ir::{
        BasicBlock, CallSite, Callee, FuncId, Function, Instruction, Program, Span, SsaProgram,
    };

    const LOCK: FuncId = 0;
    const UNLOCK: FuncId = 1;
    const RLOCK: FuncId = 2;

    fn extern_func(name: &str, short: &str) -> Function {
        Function {
            name: name.into(),
            short_name: short.into(),
            package: Some("sync".into()),
            recv_type: None,
            blocks: vec![],
            anon_funcs: vec![],
            free_vars: vec![],
            span: None,
        }
    }

    fn site(target: FuncId, recv: &str) -> CallSite {
        let method = match target {
            LOCK => "Lock",
            UNLOCK => "Unlock",
            RLOCK => "RLock",
            _ => "RUnlock",
        };
        CallSite {
            callee: Callee::Static(target),
            args: vec![recv.into()],
            rendering: format!("{recv}.{method}()"),
        }
    }

    fn call(target: FuncId, recv: &str, line: u32) -> Instruction {
        Instruction {
            name: String::new(),
            kind: InstrKind::Call(site(target, recv)),
            span: Some(Span::new("main.go", line, 1)),
        }
    }

    fn defer_call(target: FuncId, recv: &str, line: u32) -> Instruction {
        Instruction {
            name: String::new(),
            kind: InstrKind::Defer(site(target, recv)),
            span: Some(Span::new("main.go", line, 1)),
        }
    }

    fn debug_ref() -> Instruction {
        Instruction {
            name: String::new(),
            kind: InstrKind::DebugRef,
            span: None,
        }
    }

    fn program_with_body(instrs: Vec<Instruction>) -> Program {
        let functions = vec![
            extern_func("(*sync.Mutex).Lock", "Lock"),
            extern_func("(*sync.Mutex).Unlock", "Unlock"),
            extern_func("(*sync.RWMutex).RLock", "RLock"),
            extern_func("(*sync.RWMutex).RUnlock", "RUnlock"),
            Function {
                name: "pkg.f".into(),
                short_name: "f".into(),
                package: Some("pkg".into()),
                recv_type: None,
                blocks: vec![BasicBlock {
                    index: 0,
                    instrs,
                    preds: vec![],
                    succs: vec![],
                }],
                anon_funcs: vec![],
                free_vars: vec![],
                span: None,
            },
        ];
        Program {
            packages: vec![],
            ssa: SsaProgram {
                functions,
                initial: vec![4],
            },
        }
    }

    fn run(check: fn(&Checker, &mut Job), program: &Program) -> Vec<String> {
        let checker = Checker::new();
        let mut sink = Collector::new();
        let mut job = Job {
            program,
            sink: &mut sink,
        };
        check(&checker, &mut job);
        sink.diagnostics.into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn defer_lock_right_after_lock() {
        let program =
            program_with_body(vec![call(LOCK, "t0", 3), defer_call(LOCK, "t0", 4)]);
        let messages = run(check_defer_lock, &program);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0],
            "deferring Lock right after having locked already; did you mean to defer Unlock?"
        );
    }

    #[test]
    fn defer_rlock_suggests_runlock() {
        let program =
            program_with_body(vec![call(RLOCK, "t0", 3), defer_call(RLOCK, "t0", 4)]);
        let messages = run(check_defer_lock, &program);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("did you mean to defer RUnlock?"));
    }

    #[test]
    fn defer_of_other_receiver_is_fine() {
        let program =
            program_with_body(vec![call(LOCK, "t0", 3), defer_call(LOCK, "t1", 4)]);
        assert!(run(check_defer_lock, &program).is_empty());
    }

    #[test]
    fn deferred_unlock_is_the_correct_idiom() {
        let program =
            program_with_body(vec![call(LOCK, "t0", 3), defer_call(UNLOCK, "t0", 4)]);
        assert!(run(check_defer_lock, &program).is_empty());
        assert!(run(check_unlock_after_lock, &program).is_empty());
    }

    #[test]
    fn unlock_right_after_lock() {
        let program = program_with_body(vec![call(LOCK, "t0", 3), call(UNLOCK, "t0", 4)]);
        let messages = run(check_unlock_after_lock, &program);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0],
            "Unlock Lock right after locking; did you mean to defer Unlock?"
        );
    }

    #[test]
    fn debug_refs_between_the_pair_are_ignored() {
        let program = program_with_body(vec![
            call(LOCK, "t0", 3),
            debug_ref(),
            call(UNLOCK, "t0", 4),
        ]);
        assert_eq!(run(check_unlock_after_lock, &program).len(), 1);
    }

    #[test]
    fn short_blocks_never_fire() {
        let program = program_with_body(vec![call(LOCK, "t0", 3)]);
        assert!(run(check_defer_lock, &program).is_empty());
        assert!(run(check_unlock_after_lock, &program).is_empty());

        let only_debug = program_with_body(vec![call(LOCK, "t0", 3), debug_ref()]);
        assert!(run(check_unlock_after_lock, &only_debug).is_empty());
    }

    #[test]
    fn opaque_functions_are_skipped() {
        let mut program = program_with_body(vec![]);
        program.ssa.functions[4].blocks.clear();
        assert!(run(check_defer_lock, &program).is_empty());
    }

    #[test]
    fn intervening_real_instruction_breaks_adjacency() {
        let other = Instruction {
            name: "t9".into(),
            kind: InstrKind::Jump,
            span: None,
        };
        let program =
            program_with_body(vec![call(LOCK, "t0", 3), other, call(UNLOCK, "t0", 5)]);
        assert!(run(check_unlock_after_lock, &program).is_empty());
    }
}
