//! lockhound IR — SSA/AST data model and graph services.
//!
//! The bridge lowers Go packages into the owned IR in [`ir`] and the
//! simplified AST view in [`ast`]. [`calls`] classifies call sites
//! (lock/unlock taxonomy), [`bb_graph`] and [`call_graph`] provide the
//! path searches the checkers traverse, and [`descriptions`] precomputes
//! loop sets and the call graph per function.

pub mod ast;
pub mod bb_graph;
pub mod call_graph;
pub mod calls;
pub mod descriptions;
pub mod ir;
