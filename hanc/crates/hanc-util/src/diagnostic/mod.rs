//! Diagnostic module - error and warning collection.
//!
//! Every compilation stage reports program errors through a shared
//! [`DiagnosticSink`]: an append-only collection of
//! (severity, code, file, line, column, message) records. The sink never
//! writes to any stream; presentation belongs to the driver. A stage is
//! considered successful iff the sink's error count is unchanged across
//! it, which is what [`DiagnosticSink::checkpoint`] and
//! [`DiagnosticSink::errors_since`] exist for.
//!
//! # Examples
//!
//! ```
//! use hanc_util::diagnostic::{codes, Diagnostic, DiagnosticSink};
//! use hanc_util::span::FileId;
//!
//! let sink = DiagnosticSink::new();
//! sink.error(codes::SEM_TYPE_MISMATCH, FileId(0), 3, 7, "类型不匹配");
//! assert_eq!(sink.error_count(), 1);
//! ```

pub mod codes;

pub use codes::{DiagCode, Subsystem};

use crate::span::FileId;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// An error that prevents the next stage from running
    Error,
    /// A warning that does not prevent compilation
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic record
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Subsystem diagnostic code
    pub code: DiagCode,
    /// Source file the diagnostic points into
    pub file: FileId,
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based)
    pub column: u32,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagCode,
        file: FileId,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            file,
            line,
            column,
            message: message.into(),
        }
    }
}

/// Append-only collector for diagnostics
///
/// Interior mutability lets every stage share one sink immutably; records
/// are only ever appended, so counts are monotone over the life of a
/// compilation.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Append a pre-built diagnostic
    ///
    /// Pushing is infallible; allocation failure aborts upstream.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Append an error record
    pub fn error(&self, code: DiagCode, file: FileId, line: u32, column: u32, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Error, code, file, line, column, message));
    }

    /// Append a warning record
    pub fn warning(&self, code: DiagCode, file: FileId, line: u32, column: u32, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Warning, code, file, line, column, message));
    }

    /// Number of error records appended so far
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Number of warning records appended so far
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Whether no diagnostics have been reported
    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Snapshot of all records in append order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Current error count, for bracketing a stage
    pub fn checkpoint(&self) -> usize {
        self.error_count()
    }

    /// Whether errors were appended since `checkpoint`
    pub fn errors_since(&self, checkpoint: usize) -> bool {
        self.error_count() > checkpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::codes::*;

    #[test]
    fn test_new_sink_is_empty() {
        let sink = DiagnosticSink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn test_push_error() {
        let sink = DiagnosticSink::new();
        sink.error(LEX_INVALID_CHAR, FileId(0), 1, 2, "非法字符");
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 0);
        let diags = sink.diagnostics();
        assert_eq!(diags[0].code, LEX_INVALID_CHAR);
        assert_eq!(diags[0].line, 1);
        assert_eq!(diags[0].column, 2);
    }

    #[test]
    fn test_push_warning_does_not_count_as_error() {
        let sink = DiagnosticSink::new();
        sink.warning(CHECK_UNUSED_VAR, FileId(0), 1, 1, "未使用的变量");
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn test_append_order_preserved() {
        let sink = DiagnosticSink::new();
        sink.error(LEX_INVALID_CHAR, FileId(0), 1, 1, "first");
        sink.warning(CHECK_UNUSED_VAR, FileId(0), 2, 1, "second");
        sink.error(SEM_TYPE_MISMATCH, FileId(0), 3, 1, "third");
        let msgs: Vec<_> = sink.diagnostics().iter().map(|d| d.message.clone()).collect();
        assert_eq!(msgs, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_checkpoint_bracketing() {
        let sink = DiagnosticSink::new();
        let before = sink.checkpoint();
        sink.warning(CHECK_UNUSED_VAR, FileId(0), 1, 1, "w");
        assert!(!sink.errors_since(before));
        sink.error(SEM_TYPE_MISMATCH, FileId(0), 1, 1, "e");
        assert!(sink.errors_since(before));
    }
}
