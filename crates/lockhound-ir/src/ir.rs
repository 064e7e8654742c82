//! Owned SSA IR for Go code under analysis.
//!
//! These types mirror the JSON document produced by the Go bridge: a
//! function arena addressed by dense [`FuncId`] indices, basic blocks
//! with explicit predecessor/successor lists, and instructions as a
//! closed tagged union. Checkers treat the whole structure as read-only;
//! the only mutation is the stdlib-knowledge rewrite during init.

use serde::{Deserialize, Serialize};

use crate::ast::Package;

/// Dense index into [`SsaProgram::functions`].
pub type FuncId = usize;

/// Complete analysis input: AST view plus SSA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Packages with their files and declarations (AST view).
    pub packages: Vec<Package>,
    pub ssa: SsaProgram,
}

/// All SSA functions plus the subset that is user code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsaProgram {
    pub functions: Vec<Function>,
    /// User functions to analyze; always a subset of `functions`.
    pub initial: Vec<FuncId>,
}

/// Source position, pre-resolved by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Renders an optional span the way Go renders `token.NoPos`.
pub fn display_span(span: Option<&Span>) -> String {
    match span {
        Some(s) => s.to_string(),
        None => "-".to_string(),
    }
}

/// An SSA function. Empty `blocks` means the body is opaque (extern or
/// not lowered); such functions are skipped by every body analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    /// Qualified name, e.g. `(*sync.Mutex).Lock` or `pkg.main$1`.
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub package: Option<String>,
    /// Receiver type rendering for methods, e.g. `*testing.common`.
    #[serde(default)]
    pub recv_type: Option<String>,
    #[serde(default)]
    pub blocks: Vec<BasicBlock>,
    /// Anonymous functions declared inside this one.
    #[serde(default)]
    pub anon_funcs: Vec<FuncId>,
    /// Names of variables captured from the enclosing function.
    #[serde(default)]
    pub free_vars: Vec<String>,
    #[serde(default)]
    pub span: Option<Span>,
}

/// A basic block: ordered instructions plus explicit CFG edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Index of this block within its function.
    pub index: u32,
    pub instrs: Vec<Instruction>,
    #[serde(default)]
    pub preds: Vec<u32>,
    #[serde(default)]
    pub succs: Vec<u32>,
}

/// One SSA instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// Result register (e.g. `t12`), empty when the instruction has no
    /// value.
    #[serde(default)]
    pub name: String,
    pub kind: InstrKind,
    #[serde(default)]
    pub span: Option<Span>,
}

/// Closed set of instruction kinds. Unknown kinds deserialize to
/// [`InstrKind::Other`] and are inert everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InstrKind {
    Call(CallSite),
    Defer(CallSite),
    Go(CallSite),
    UnOp { op: UnOpKind, x: String },
    Extract { tuple: String, index: u32 },
    If { cond: String },
    Jump,
    Phi { edges: Vec<String> },
    Const { value: String },
    Convert { x: String },
    Send { chan: String },
    Select { states: Vec<SelectState> },
    MakeClosure { func: FuncId },
    DebugRef,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOpKind {
    /// Channel receive (`<-ch`).
    Recv,
    Deref,
    Neg,
    Not,
}

/// One case of a `select` statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectState {
    /// Rendering of the channel operand; `None` for the default case.
    #[serde(default)]
    pub chan: Option<String>,
}

/// A call site shared by `Call`, `Defer` and `Go` instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    pub callee: Callee,
    /// Renderings of the arguments; for method calls `args[0]` is the
    /// receiver.
    #[serde(default)]
    pub args: Vec<String>,
    /// Full textual rendering, e.g. `(*sync.Mutex).Lock(t0)` or
    /// `invoke t65.Lock()`. Rendering stability is part of the lock-key
    /// contract.
    pub rendering: String,
}

impl CallSite {
    pub fn is_invoke(&self) -> bool {
        matches!(self.callee, Callee::Invoke { .. })
    }
}

/// Who a call site targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Callee {
    /// Statically resolved function.
    Static(FuncId),
    /// Closure over a known function.
    Closure(FuncId),
    Builtin(String),
    /// Dynamic dispatch through an interface.
    Invoke { method: String },
}

/// Stable identity of an instruction: function, block, raw index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrRef {
    pub func: FuncId,
    pub block: u32,
    pub index: u32,
}

impl SsaProgram {
    pub fn func(&self, id: FuncId) -> &Function {
        &self.functions[id]
    }

    pub fn block(&self, func: FuncId, block: u32) -> &BasicBlock {
        &self.functions[func].blocks[block as usize]
    }

    pub fn instr(&self, r: InstrRef) -> &Instruction {
        &self.functions[r.func].blocks[r.block as usize].instrs[r.index as usize]
    }
}

/// Structural errors a malformed bridge document can carry. These are
/// loader errors; checkers never see an invalid program.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("initial function index {index} out of range ({count} functions)")]
    InitialOutOfRange { index: usize, count: usize },
    #[error("function {func}: block {block} has index {actual}")]
    BlockIndexMismatch { func: String, block: usize, actual: u32 },
    #[error("function {func}: block {block} successor {succ} out of range")]
    BadSuccessor { func: String, block: u32, succ: u32 },
    #[error("function {func}: block {block} predecessor {pred} out of range")]
    BadPredecessor { func: String, block: u32, pred: u32 },
    #[error("function {func}: anonymous function index {anon} out of range")]
    BadAnonFunc { func: String, anon: FuncId },
    #[error("function {func}: block {block} instruction {index} references function {callee}")]
    BadCallee {
        func: String,
        block: u32,
        index: usize,
        callee: FuncId,
    },
}

impl Program {
    /// Validate arena indices and CFG edge ranges.
    pub fn validate(&self) -> Result<(), ProgramError> {
        let count = self.ssa.functions.len();
        for &id in &self.ssa.initial {
            if id >= count {
                return Err(ProgramError::InitialOutOfRange { index: id, count });
            }
        }
        for func in &self.ssa.functions {
            let nblocks = func.blocks.len() as u32;
            for (i, block) in func.blocks.iter().enumerate() {
                if block.index != i as u32 {
                    return Err(ProgramError::BlockIndexMismatch {
                        func: func.name.clone(),
                        block: i,
                        actual: block.index,
                    });
                }
                for &succ in &block.succs {
                    if succ >= nblocks {
                        return Err(ProgramError::BadSuccessor {
                            func: func.name.clone(),
                            block: block.index,
                            succ,
                        });
                    }
                }
                for &pred in &block.preds {
                    if pred >= nblocks {
                        return Err(ProgramError::BadPredecessor {
                            func: func.name.clone(),
                            block: block.index,
                            pred,
                        });
                    }
                }
                for (index, ins) in block.instrs.iter().enumerate() {
                    let callee = match &ins.kind {
                        InstrKind::Call(c) | InstrKind::Defer(c) | InstrKind::Go(c) => {
                            match c.callee {
                                Callee::Static(id) | Callee::Closure(id) => Some(id),
                                _ => None,
                            }
                        }
                        InstrKind::MakeClosure { func } => Some(*func),
                        _ => None,
                    };
                    if let Some(callee) = callee {
                        if callee >= count {
                            return Err(ProgramError::BadCallee {
                                func: func.name.clone(),
                                block: block.index,
                                index,
                                callee,
                            });
                        }
                    }
                }
            }
            for &anon in &func.anon_funcs {
                if anon >= count {
                    return Err(ProgramError::BadAnonFunc {
                        func: func.name.clone(),
                        anon,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: &str, blocks: Vec<BasicBlock>) -> Function {
        Function {
            name: name.into(),
            short_name: name.rsplit('.').next().unwrap_or(name).into(),
            package: None,
            recv_type: None,
            blocks,
            anon_funcs: vec![],
            free_vars: vec![],
            span: None,
        }
    }

    fn block(index: u32, succs: Vec<u32>, preds: Vec<u32>) -> BasicBlock {
        BasicBlock {
            index,
            instrs: vec![],
            preds,
            succs,
        }
    }

    #[test]
    fn span_display() {
        let span = Span::new("main.go", 10, 5);
        assert_eq!(span.to_string(), "main.go:10:5");
        assert_eq!(display_span(Some(&span)), "main.go:10:5");
        assert_eq!(display_span(None), "-");
    }

    #[test]
    fn validate_accepts_well_formed_program() {
        let program = Program {
            packages: vec![],
            ssa: SsaProgram {
                functions: vec![func(
                    "pkg.main",
                    vec![block(0, vec![1], vec![]), block(1, vec![], vec![0])],
                )],
                initial: vec![0],
            },
        };
        assert!(program.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_initial_index() {
        let program = Program {
            packages: vec![],
            ssa: SsaProgram {
                functions: vec![],
                initial: vec![3],
            },
        };
        assert!(matches!(
            program.validate(),
            Err(ProgramError::InitialOutOfRange { index: 3, count: 0 })
        ));
    }

    #[test]
    fn validate_rejects_dangling_successor() {
        let program = Program {
            packages: vec![],
            ssa: SsaProgram {
                functions: vec![func("pkg.f", vec![block(0, vec![7], vec![])])],
                initial: vec![],
            },
        };
        assert!(matches!(
            program.validate(),
            Err(ProgramError::BadSuccessor { succ: 7, .. })
        ));
    }

    #[test]
    fn validate_rejects_dangling_callee() {
        let mut f = func("pkg.f", vec![block(0, vec![], vec![])]);
        f.blocks[0].instrs.push(Instruction {
            name: String::new(),
            kind: InstrKind::Call(CallSite {
                callee: Callee::Static(9),
                args: vec![],
                rendering: "t0()".into(),
            }),
            span: None,
        });
        let program = Program {
            packages: vec![],
            ssa: SsaProgram {
                functions: vec![f],
                initial: vec![],
            },
        };
        assert!(matches!(
            program.validate(),
            Err(ProgramError::BadCallee { callee: 9, .. })
        ));
    }

    #[test]
    fn instruction_json_roundtrip() {
        let instr = Instruction {
            name: "t0".into(),
            kind: InstrKind::Call(CallSite {
                callee: Callee::Static(4),
                args: vec!["t1".into()],
                rendering: "(*sync.Mutex).Lock(t1)".into(),
            }),
            span: Some(Span::new("main.go", 3, 2)),
        };
        let json = serde_json::to_string(&instr).unwrap();
        let back: Instruction = serde_json::from_str(&json).unwrap();
        match back.kind {
            InstrKind::Call(cs) => {
                assert!(matches!(cs.callee, Callee::Static(4)));
                assert_eq!(cs.args, vec!["t1".to_string()]);
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn unknown_instruction_kind_deserializes_to_other() {
        // Bridges may emit kinds this build does not know about; they
        // must land on the inert variant instead of failing the load.
        let json = r#"{"name": "t7", "kind": "Alloc"}"#;
        let instr: Instruction = serde_json::from_str(json).unwrap();
        assert!(matches!(instr.kind, InstrKind::Other));
        assert_eq!(instr.name, "t7");
    }

    #[test]
    fn invoke_call_site_has_no_static_callee() {
        let cs = CallSite {
            callee: Callee::Invoke {
                method: "Lock".into(),
            },
            args: vec![],
            rendering: "invoke t65.Lock()".into(),
        };
        assert!(cs.is_invoke());
    }

    #[test]
    fn instr_ref_lookup() {
        let mut f = func("pkg.f", vec![block(0, vec![], vec![])]);
        f.blocks[0].instrs.push(Instruction {
            name: "t0".into(),
            kind: InstrKind::Jump,
            span: None,
        });
        let ssa = SsaProgram {
            functions: vec![f],
            initial: vec![0],
        };
        let r = InstrRef {
            func: 0,
            block: 0,
            index: 0,
        };
        assert!(matches!(ssa.instr(r).kind, InstrKind::Jump));
    }
}
