//! Accumulating diagnostics sink.
//!
//! Defects found while parsing, classifying or emitting are printed as they
//! occur and counted, so one run surfaces every problem. Checkpoints turn the
//! count accumulated since a baseline into a process exit status.

use std::fmt;

/// Exit statuses are capped so they stay distinguishable from signals.
pub const MAX_EXIT_STATUS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    MissingDocumentation,
    ParamCountMismatch,
    UnresolvedType,
    MissingParameterName,
    InvalidEnumValue,
    /// The checkpoint summary line itself.
    Summary,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MissingDocumentation => "missing-documentation",
            DiagnosticKind::ParamCountMismatch => "param-count-mismatch",
            DiagnosticKind::UnresolvedType => "unresolved-type",
            DiagnosticKind::MissingParameterName => "missing-parameter-name",
            DiagnosticKind::InvalidEnumValue => "invalid-enum-value",
            DiagnosticKind::Summary => "summary",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
    quiet: bool,
    trace: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records without printing.
    #[cfg(test)]
    pub fn quiet() -> Self {
        Diagnostics {
            quiet: true,
            ..Self::default()
        }
    }

    /// Enable source tracing, used by debug runs.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn tracing(&self) -> bool {
        self.trace
    }

    /// Print a trace message to stderr when tracing is enabled.
    ///
    /// The message is only built when it will be printed.
    pub fn trace(&self, message: impl FnOnce() -> String) {
        if self.trace && !self.quiet {
            eprintln!("{}", message());
        }
    }

    /// Record a diagnostic and print it to stderr.
    pub fn record(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        if !self.quiet {
            eprintln!("Error: {}", message);
        }
        self.records.push(Diagnostic { kind, message });
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Number of diagnostics of `kind` recorded so far.
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.records.iter().filter(|d| d.kind == kind).count()
    }

    /// Check for diagnostics recorded after `baseline`.
    ///
    /// Returns the exit status to terminate with, or `None` when nothing new
    /// was recorded. `what` names the counted defects, e.g.
    /// `"type conversion(s) missing"`.
    pub fn checkpoint(&mut self, baseline: usize, what: &str) -> Option<u8> {
        let n = self.count().saturating_sub(baseline);
        if n == 0 {
            return None;
        }
        let status = n.min(MAX_EXIT_STATUS);
        self.record(
            DiagnosticKind::Summary,
            format!("{} {}... exit({})", n, what, status),
        );
        Some(status as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_counts() {
        let mut diag = Diagnostics::quiet();
        diag.record(DiagnosticKind::UnresolvedType, "no type conversion for foo* x");
        diag.record(DiagnosticKind::MissingDocumentation, "no comment for function f");
        assert_eq!(diag.count(), 2);
        assert_eq!(diag.count_of(DiagnosticKind::UnresolvedType), 1);
        assert_eq!(diag.records()[1].message, "no comment for function f");
    }

    #[test]
    fn checkpoint_without_new_records() {
        let mut diag = Diagnostics::quiet();
        diag.record(DiagnosticKind::UnresolvedType, "old");
        let baseline = diag.count();
        assert_eq!(diag.checkpoint(baseline, "error(s) reported"), None);
        assert_eq!(diag.count(), 1);
    }

    #[test]
    fn checkpoint_counts_since_baseline() {
        let mut diag = Diagnostics::quiet();
        diag.record(DiagnosticKind::UnresolvedType, "old");
        let baseline = diag.count();
        diag.record(DiagnosticKind::UnresolvedType, "a");
        diag.record(DiagnosticKind::UnresolvedType, "b");
        assert_eq!(diag.checkpoint(baseline, "type conversion(s) missing"), Some(2));
        let last = diag.records().last().unwrap();
        assert_eq!(last.kind, DiagnosticKind::Summary);
        assert_eq!(last.message, "2 type conversion(s) missing... exit(2)");
    }

    #[test]
    fn trace_builds_message_only_when_enabled() {
        let diag = Diagnostics::quiet();
        assert!(!diag.tracing());
        diag.trace(|| panic!("message built with tracing off"));

        let diag = Diagnostics::quiet().with_trace(true);
        assert!(diag.tracing());
        assert_eq!(diag.count(), 0);
    }

    #[test]
    fn checkpoint_caps_status() {
        let mut diag = Diagnostics::quiet();
        for i in 0..12 {
            diag.record(DiagnosticKind::ParamCountMismatch, format!("f{}", i));
        }
        assert_eq!(diag.checkpoint(0, "error(s) reported"), Some(9));
    }
}
