//! SA2008 — synchronization-primitive usage tally.
//!
//! Counts channel operations and calls to the `sync`/`sync/atomic`
//! APIs across non-test user functions, then emits one aggregate,
//! location-free report.

use lockhound_ir::calls::filter_debug;
use lockhound_ir::ir::{FuncId, InstrKind, SsaProgram, UnOpKind};

use crate::checker::{Checker, Job};

/// A function whose first positioned instruction sits in a `_test.go`
/// file belongs to a test.
fn ignore_func(ssa: &SsaProgram, func: FuncId) -> bool {
    for block in &ssa.functions[func].blocks {
        for ins in &block.instrs {
            if let Some(span) = &ins.span {
                return span.file.contains("_test.go");
            }
        }
    }
    false
}

pub fn check_primitive_usage(_checker: &Checker, job: &mut Job) {
    let ssa = &job.program.ssa;

    let mut mutex = 0u64;
    let mut rwmutex = 0u64;
    let mut cond = 0u64;
    let mut pool = 0u64;
    let mut waitgroup = 0u64;
    let mut atomic = 0u64;
    let mut once = 0u64;
    let mut channel = 0u64;

    for &func in &ssa.initial {
        if ignore_func(ssa, func) {
            continue;
        }

        for block in &ssa.functions[func].blocks {
            for ins in filter_debug(&block.instrs) {
                let call = match &ins.kind {
                    InstrKind::Send { .. } => {
                        channel += 1;
                        continue;
                    }
                    InstrKind::UnOp {
                        op: UnOpKind::Recv, ..
                    } => {
                        channel += 1;
                        continue;
                    }
                    InstrKind::Select { states } => {
                        channel += states.iter().filter(|s| s.chan.is_some()).count() as u64;
                        continue;
                    }
                    InstrKind::Call(call) | InstrKind::Defer(call) => call,
                    _ => continue,
                };

                let name = ssa.full_call_name(call);
                match name.as_str() {
                    "(*sync.Mutex).Lock" | "(*sync.Mutex).Unlock" => mutex += 1,
                    "(*sync.RWMutex).Lock"
                    | "(*sync.RWMutex).Unlock"
                    | "(*sync.RWMutex).RLock"
                    | "(*sync.RWMutex).RUnlock" => rwmutex += 1,
                    "(*sync.WaitGroup).Add"
                    | "(*sync.WaitGroup).Done"
                    | "(*sync.WaitGroup).Wait" => waitgroup += 1,
                    "(*sync.Once).Do" => once += 1,
                    "(*sync.Cond).Broadcast" | "(*sync.Cond).Signal" | "(*sync.Cond).Wait" => {
                        cond += 1
                    }
                    "(*sync.Pool).Get" | "(*sync.Pool).Put" => pool += 1,
                    _ if name.contains("atomic") => atomic += 1,
                    _ => {}
                }
            }
        }
    }

    job.report(
        "SA2008",
        None,
        format!(
            "Mutex: {mutex}, RWMutex {rwmutex},Cond {cond}, Pool {pool}, Once {once}, \
             atomic {atomic}, Waitgroup {waitgroup}, Channel {channel}"
        ),
    );
}
