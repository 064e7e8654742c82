//! Core diagnostic types.
//!
//! Every checker produces `Diagnostic` values through a [`Sink`]; the
//! formatters consume them. Messages are literal strings that
//! downstream tooling matches on, so checkers must not reword them.

use serde::{Deserialize, Serialize};

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable checker code, e.g. `SA2005`.
    pub code: String,
    pub message: String,
    /// Aggregate reports (the primitive tally) carry no location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Source location, 1-based like Go's `token.Position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}: {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Where diagnostics go. The sink is the only externally synchronized
/// resource a checker touches.
pub trait Sink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Sink that appends into a vector.
#[derive(Debug, Default)]
pub struct Collector {
    pub diagnostics: Vec<Diagnostic>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for Collector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_location() {
        let d = Diagnostic {
            code: "SA2001".into(),
            message: "empty critical section".into(),
            location: Some(Location {
                file: "main.go".into(),
                line: 12,
                column: 2,
            }),
        };
        assert_eq!(d.to_string(), "main.go:12:2: SA2001: empty critical section");
    }

    #[test]
    fn display_without_location() {
        let d = Diagnostic {
            code: "SA2008".into(),
            message: "Mutex: 1, RWMutex 0,Cond 0, Pool 0, Once 0, atomic 0, Waitgroup 0, Channel 0"
                .into(),
            location: None,
        };
        assert!(d.to_string().starts_with("SA2008: Mutex: 1"));
    }

    #[test]
    fn json_omits_missing_location() {
        let d = Diagnostic {
            code: "SA2008".into(),
            message: "tally".into(),
            location: None,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("location"));
    }

    #[test]
    fn collector_appends_in_order() {
        let mut sink = Collector::new();
        for i in 0..3 {
            sink.report(Diagnostic {
                code: format!("SA200{i}"),
                message: "x".into(),
                location: None,
            });
        }
        let codes: Vec<&str> = sink
            .diagnostics
            .iter()
            .map(|d| d.code.as_str())
            .collect();
        assert_eq!(codes, vec!["SA2000", "SA2001", "SA2002"]);
    }
}
