//! Rule catalog — metadata for every checker code.
//!
//! Single source of truth for `explain` and `rules` output; the
//! checkers crate maps these codes to entry points.

use serde::Serialize;

/// Metadata for one checker.
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub code: String,
    pub name: String,
    pub description: String,
    /// Disabled rules stay registered but do not run by default.
    pub enabled: bool,
}

/// Look up a single rule by code (e.g. "SA2005").
pub fn get_rule(code: &str) -> Option<RuleInfo> {
    get_all_rules().into_iter().find(|r| r.code == code)
}

/// All checker rules, in registry order.
pub fn get_all_rules() -> Vec<RuleInfo> {
    vec![
        RuleInfo {
            code: "SA2000".into(),
            name: "sync.WaitGroup.Add called inside the goroutine".into(),
            description: "Add must be called before starting the goroutine; \
                          calling it inside races with Wait."
                .into(),
            enabled: true,
        },
        RuleInfo {
            code: "SA2001".into(),
            name: "Empty critical section".into(),
            description: "A mutex is unlocked immediately after being locked, \
                          protecting nothing."
                .into(),
            enabled: true,
        },
        RuleInfo {
            code: "SA2002".into(),
            name: "Called testing.T.FailNow or SkipNow in a goroutine".into(),
            description: "FailNow, Fatal, Fatalf, SkipNow, Skip and Skipf must run \
                          in the test's own goroutine."
                .into(),
            enabled: true,
        },
        RuleInfo {
            code: "SA2003".into(),
            name: "Deferred Lock right after locking".into(),
            description: "Deferring the same lock method that was just called; the \
                          corresponding unlock was probably meant."
                .into(),
            enabled: true,
        },
        RuleInfo {
            code: "SA2004".into(),
            name: "Unlock right after locking".into(),
            description: "The mutex is released on the next instruction, so no \
                          critical section is protected."
                .into(),
            enabled: true,
        },
        RuleInfo {
            code: "SA2005".into(),
            name: "Double lock".into(),
            description: "A path exists on which the same lock is acquired twice \
                          with no intervening release."
                .into(),
            enabled: true,
        },
        RuleInfo {
            code: "SA2006".into(),
            name: "Data race between anonymous functions".into(),
            description: "Anonymous goroutines capture the same variable and may \
                          run concurrently."
                .into(),
            enabled: true,
        },
        RuleInfo {
            code: "SA2007".into(),
            name: "WaitGroup Wait/Done misuse in a loop".into(),
            description: "A loop both launches goroutines calling Done and calls \
                          Wait, risking deadlock."
                .into(),
            enabled: false,
        },
        RuleInfo {
            code: "SA2008".into(),
            name: "Synchronization primitive usage tally".into(),
            description: "Aggregate count of mutex, rwmutex, cond, pool, once, \
                          atomic, waitgroup and channel usage."
                .into(),
            enabled: true,
        },
    ]
}
