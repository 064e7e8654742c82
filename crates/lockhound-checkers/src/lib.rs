//! lockhound checkers — concurrency-bug detection over the SSA IR.
//!
//! [`Checker::run`] initializes shared state (function descriptions,
//! the stdlib-knowledge rewrite, the deprecation index) behind a
//! barrier, then executes every enabled checker from [`registry`] in
//! order against the immutable program snapshot.

pub mod anon_race;
pub mod checker;
pub mod critical_section;
pub mod deprecated;
pub mod double_lock;
pub mod lock_misuse;
pub mod primitives;
pub mod registry;
pub mod stdlib;
pub mod testing_goroutine;
pub mod waitgroup;

pub use checker::{Checker, Job};
pub use registry::{registry, CheckerEntry};
