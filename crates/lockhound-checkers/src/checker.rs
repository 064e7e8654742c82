//! Checker state, initialization barrier, and the run loop.

use std::collections::HashMap;
use std::thread;

use tracing::debug;

use lockhound_diagnostics::diagnostic::{Diagnostic, Location, Sink};
use lockhound_ir::ast::File;
use lockhound_ir::descriptions::FuncDescriptions;
use lockhound_ir::ir::{FuncId, Program, Span};

use crate::deprecated::find_deprecated;
use crate::registry::registry;
use crate::stdlib::apply_stdlib_knowledge;

/// Shared state for all checkers. Built once by [`Checker::init`];
/// read-only afterward.
pub struct Checker {
    /// Analyze files flagged as machine-generated. Default false.
    pub check_generated: bool,
    func_descs: Option<FuncDescriptions>,
    deprecated: HashMap<String, String>,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        Self {
            check_generated: false,
            func_descs: None,
            deprecated: HashMap::new(),
        }
    }

    /// Initialize shared state. Two tasks run in parallel and join
    /// before any checker starts: one computes the function
    /// descriptions and then applies the stdlib-knowledge rewrite (the
    /// sole SSA mutation), the other builds the deprecation index.
    pub fn init(&mut self, program: &mut Program) {
        let ssa = &mut program.ssa;
        let packages = &program.packages;

        let (descs, deprecated) = thread::scope(|scope| {
            let t1 = scope.spawn(move || {
                let descs = FuncDescriptions::new(ssa);
                apply_stdlib_knowledge(ssa);
                descs
            });
            let t2 = scope.spawn(move || find_deprecated(packages));
            (join(t1), join(t2))
        });

        debug!(deprecated = deprecated.len(), "init complete");
        self.func_descs = Some(descs);
        self.deprecated = deprecated;
    }

    /// Initialize, then run every enabled checker in registry order.
    pub fn run(&mut self, program: &mut Program, sink: &mut dyn Sink) {
        self.init(program);
        let program = &*program;
        for entry in registry() {
            if !entry.enabled {
                continue;
            }
            debug!(code = entry.code, "running checker");
            let mut job = Job {
                program,
                sink: &mut *sink,
            };
            (entry.run)(self, &mut job);
        }
    }

    /// Function descriptions; init must have run.
    pub(crate) fn descs(&self) -> &FuncDescriptions {
        self.func_descs
            .as_ref()
            .expect("Checker::init must run before any checker")
    }

    /// Is `block` inside any loop of `func`?
    pub(crate) fn is_in_loop(&self, func: FuncId, block: u32) -> bool {
        self.descs().is_in_loop(func, block)
    }

    /// The deprecation index built during init.
    pub fn deprecations(&self) -> &HashMap<String, String> {
        &self.deprecated
    }

    /// AST files visible to checkers, honoring `check_generated`.
    pub(crate) fn ast_files<'a>(&self, program: &'a Program) -> Vec<&'a File> {
        program
            .packages
            .iter()
            .flat_map(|pkg| pkg.files.iter())
            .filter(|file| self.check_generated || !file.is_generated)
            .collect()
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

/// One checker invocation: the program snapshot plus the sink.
pub struct Job<'a> {
    pub program: &'a Program,
    pub sink: &'a mut dyn Sink,
}

impl Job<'_> {
    /// Emit a diagnostic at `span` (which may be absent for aggregate
    /// reports).
    pub fn report(&mut self, code: &str, span: Option<&Span>, message: String) {
        self.sink.report(Diagnostic {
            code: code.to_string(),
            message,
            location: span.map(|s| Location {
                file: s.file.clone(),
                line: s.line,
                column: s.column,
            }),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockhound_diagnostics::diagnostic::Collector;
    use lockhound_ir::ast::{Decl, FuncDecl, Package};
    use lockhound_ir::ir::SsaProgram;

    fn empty_program() -> Program {
        Program {
            packages: vec![],
            ssa: SsaProgram {
                functions: vec![],
                initial: vec![],
            },
        }
    }

    #[test]
    fn run_on_empty_program_reports_only_the_tally() {
        let mut program = empty_program();
        let mut sink = Collector::new();
        let mut checker = Checker::new();
        checker.run(&mut program, &mut sink);
        // SA2008 always emits its aggregate line; nothing else fires.
        assert_eq!(sink.diagnostics.len(), 1);
        assert_eq!(sink.diagnostics[0].code, "SA2008");
    }

    #[test]
    fn run_twice_is_deterministic() {
        let mut program = empty_program();
        let mut first = Collector::new();
        Checker::new().run(&mut program, &mut first);
        let mut second = Collector::new();
        Checker::new().run(&mut program, &mut second);
        assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn init_builds_deprecation_index() {
        let mut program = empty_program();
        program.packages.push(Package {
            path: "example.com/pkg".into(),
            name: "pkg".into(),
            files: vec![File {
                path: "a.go".into(),
                is_generated: false,
                decls: vec![Decl::Func(FuncDecl {
                    name: "Old".into(),
                    doc: Some("Old does things.\n\nDeprecated: use New instead.".into()),
                    body: None,
                    span: None,
                })],
            }],
        });
        let mut checker = Checker::new();
        checker.init(&mut program);
        assert_eq!(
            checker.deprecations().get("example.com/pkg.Old").map(String::as_str),
            Some("use New instead.")
        );
    }

    #[test]
    fn generated_files_are_filtered_by_default() {
        let mut program = empty_program();
        program.packages.push(Package {
            path: "p".into(),
            name: "p".into(),
            files: vec![
                File {
                    path: "gen.pb.go".into(),
                    is_generated: true,
                    decls: vec![],
                },
                File {
                    path: "main.go".into(),
                    is_generated: false,
                    decls: vec![],
                },
            ],
        });
        let checker = Checker::new();
        let files = checker.ast_files(&program);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "main.go");

        let mut permissive = Checker::new();
        permissive.check_generated = true;
        assert_eq!(permissive.ast_files(&program).len(), 2);
    }
}
