//! Checker registry: stable code → entry point.

use crate::checker::{Checker, Job};

pub type CheckFn = fn(&Checker, &mut Job);

pub struct CheckerEntry {
    pub code: &'static str,
    /// Disabled entries stay registered but are skipped by
    /// [`Checker::run`].
    pub enabled: bool,
    pub run: CheckFn,
}

/// All checkers in execution order. SA2007 is registered but disabled.
pub fn registry() -> Vec<CheckerEntry> {
    vec![
        CheckerEntry {
            code: "SA2000",
            enabled: true,
            run: crate::waitgroup::check_waitgroup_add,
        },
        CheckerEntry {
            code: "SA2001",
            enabled: true,
            run: crate::critical_section::check_empty_critical_section,
        },
        CheckerEntry {
            code: "SA2002",
            enabled: true,
            run: crate::testing_goroutine::check_concurrent_testing,
        },
        CheckerEntry {
            code: "SA2003",
            enabled: true,
            run: crate::lock_misuse::check_defer_lock,
        },
        CheckerEntry {
            code: "SA2004",
            enabled: true,
            run: crate::lock_misuse::check_unlock_after_lock,
        },
        CheckerEntry {
            code: "SA2005",
            enabled: true,
            run: crate::double_lock::check_double_lock,
        },
        CheckerEntry {
            code: "SA2006",
            enabled: true,
            run: crate::anon_race::check_anon_race,
        },
        CheckerEntry {
            code: "SA2007",
            enabled: false,
            run: crate::waitgroup::check_waitgroup_blocking,
        },
        CheckerEntry {
            code: "SA2008",
            enabled: true,
            run: crate::primitives::check_primitive_usage,
        },
    ]
}
