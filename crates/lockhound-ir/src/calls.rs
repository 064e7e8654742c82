//! Call-site classifiers and the lock/unlock taxonomy.
//!
//! Lock identity is syntactic: two lock calls act on the same mutex iff
//! [`lock_prefix`] renders the same key for both. Rendering stability is
//! therefore part of the bridge contract.

use crate::ir::{CallSite, Callee, FuncId, Instruction, InstrKind, SsaProgram};

/// Canonical identity of the mutex a lock call acts on.
pub type LockKey = String;

/// Qualified names the lock taxonomy recognizes as acquisitions.
const LOCK_METHODS: &[&str] = &[
    "(*sync.Mutex).Lock",
    "(*sync.RWMutex).RLock",
    "(*sync.RWMutex).Lock",
];

/// Qualified names recognized as releases. `(*sync.RWMutex).UnLock` is
/// kept for compatibility with older bridges that emitted the
/// misspelling; the real `Unlock` spelling is matched as well.
const UNLOCK_METHODS: &[&str] = &[
    "(*sync.Mutex).Unlock",
    "(*sync.RWMutex).RUnlock",
    "(*sync.RWMutex).Unlock",
    "(*sync.RWMutex).UnLock",
];

impl SsaProgram {
    /// True when the call statically targets the function named
    /// `qualified`. Dynamic invokes and builtins never match.
    pub fn is_call_to(&self, call: &CallSite, qualified: &str) -> bool {
        match call.callee {
            Callee::Static(id) | Callee::Closure(id) => self.functions[id].name == qualified,
            Callee::Builtin(_) | Callee::Invoke { .. } => false,
        }
    }

    /// Unqualified method name for static calls, builtin name for
    /// builtins, `""` otherwise.
    pub fn short_call_name(&self, call: &CallSite) -> String {
        match &call.callee {
            Callee::Static(id) => self.functions[*id].short_name.clone(),
            Callee::Builtin(name) => name.clone(),
            Callee::Closure(_) | Callee::Invoke { .. } => String::new(),
        }
    }

    /// Fully-qualified callee name; dynamic invokes render the whole
    /// call site.
    pub fn full_call_name(&self, call: &CallSite) -> String {
        match &call.callee {
            Callee::Invoke { .. } => call.rendering.clone(),
            Callee::Static(id) => self.functions[*id].name.clone(),
            Callee::Builtin(name) => name.clone(),
            Callee::Closure(_) => String::new(),
        }
    }
}

/// The function a call-site value wraps, unwrapping closures; `None`
/// for builtins and dynamic invokes.
pub fn unwrap_function(callee: &Callee) -> Option<FuncId> {
    match callee {
        Callee::Static(id) | Callee::Closure(id) => Some(*id),
        Callee::Builtin(_) | Callee::Invoke { .. } => None,
    }
}

/// Non-debug view of a block's instructions. Indices into the returned
/// slice are stable for adjacency checks.
pub fn filter_debug(instrs: &[Instruction]) -> Vec<&Instruction> {
    instrs
        .iter()
        .filter(|ins| !matches!(ins.kind, InstrKind::DebugRef))
        .collect()
}

/// Does this call acquire a mutex?
///
/// Besides the known `sync` methods, a call whose rendering contains
/// `.lock(` or `.rlock(` counts, but only when it has at most one
/// argument (the receiver); user methods named `Lock` that take
/// parameters are not acquisitions.
pub fn is_lock_call(ssa: &SsaProgram, call: &CallSite) -> bool {
    if LOCK_METHODS.iter().any(|name| ssa.is_call_to(call, name)) {
        return true;
    }

    let rendering = call.rendering.to_lowercase();
    if rendering.contains(".lock(") || rendering.contains(".rlock(") {
        if call.args.len() > 1 {
            return false;
        }
        return true;
    }
    false
}

/// Does this call release a mutex?
pub fn is_unlock_call(ssa: &SsaProgram, call: &CallSite) -> bool {
    if UNLOCK_METHODS.iter().any(|name| ssa.is_call_to(call, name)) {
        return true;
    }

    let rendering = call.rendering.to_lowercase();
    rendering.contains(".unlock") || rendering.contains(".runlock")
}

/// Derive the lock key of a lock (or unlock) call.
///
/// The key is the rendering of argument 0 when present. Argument-less
/// invoke renderings like `invoke t65.Lock()` key on the receiver
/// register between the first space and the first dot. Anything else
/// keys on the full rendering.
pub fn lock_prefix(call: &CallSite) -> LockKey {
    if let Some(receiver) = call.args.first() {
        return receiver.clone();
    }

    let rendering = &call.rendering;
    if rendering.contains("invoke") {
        if let (Some(start), Some(end)) = (rendering.find(' '), rendering.find('.')) {
            if let Some(key) = rendering.get(start..end) {
                return key.to_string();
            }
        }
    }
    rendering.clone()
}
