//! Simplified AST view of the analyzed packages.
//!
//! The bridge keeps just enough syntax for the AST-shaped checks:
//! statement blocks with call statements and `go` statements, plus
//! top-level declarations with their doc comments for the deprecation
//! scan. Anything it cannot classify arrives as `Stmt::Other` and is
//! skipped.

use serde::{Deserialize, Serialize};

use crate::ir::Span;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Import path, e.g. `example.com/pkg`.
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub files: Vec<File>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub path: String,
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

/// Top-level declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeDecl),
    Value(ValueDecl),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub body: Option<BlockStmt>,
    #[serde(default)]
    pub span: Option<Span>,
}

/// A type declaration; `fields` carries struct fields or interface
/// methods, whichever the type has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub names: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

/// A const or var declaration group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueDecl {
    pub names: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockStmt {
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// An expression statement that is a call.
    Call(CallStmt),
    Go(GoStmt),
    Block(BlockStmt),
    If {
        body: BlockStmt,
        #[serde(default)]
        else_body: Option<BlockStmt>,
    },
    For {
        body: BlockStmt,
    },
    #[serde(other)]
    Other,
}

/// A call expression statement like `m.Lock()` or `wg.Add(1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStmt {
    /// Rendering of the selector base (`m` in `m.Lock()`); `None` for
    /// plain function calls.
    #[serde(default)]
    pub recv: Option<String>,
    /// Method or function name (`Lock`).
    pub method: String,
    /// Resolved qualified symbol, e.g. `(*sync.WaitGroup).Add`, when the
    /// type checker could resolve the callee.
    #[serde(default)]
    pub qualified: Option<String>,
    /// Number of call arguments.
    #[serde(default)]
    pub args: usize,
    /// Number of results in the callee's signature.
    #[serde(default)]
    pub results: usize,
    /// Textual rendering of the whole call, e.g. `wg.Add(1)`.
    pub rendering: String,
    #[serde(default)]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoStmt {
    pub callee: GoCallee,
    #[serde(default)]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GoCallee {
    /// `go func() { ... }()`
    FuncLit(BlockStmt),
    /// `go worker(x)`
    Named(CallStmt),
    #[serde(other)]
    Other,
}

/// Visit `block` and every statement block nested inside it, including
/// the bodies of `go func(){...}()` literals.
pub fn walk_blocks(block: &BlockStmt, visit: &mut dyn FnMut(&BlockStmt)) {
    visit(block);
    for stmt in &block.stmts {
        match stmt {
            Stmt::Block(inner) => walk_blocks(inner, visit),
            Stmt::If { body, else_body } => {
                walk_blocks(body, visit);
                if let Some(els) = else_body {
                    walk_blocks(els, visit);
                }
            }
            Stmt::For { body } => walk_blocks(body, visit),
            Stmt::Go(go) => {
                if let GoCallee::FuncLit(body) = &go.callee {
                    walk_blocks(body, visit);
                }
            }
            Stmt::Call(_) | Stmt::Other => {}
        }
    }
}

/// Split a doc comment into paragraphs the way `go/doc` does: on blank
/// lines.
pub fn doc_paragraphs(doc: &str) -> Vec<&str> {
    doc.split("\n\n").collect()
}
