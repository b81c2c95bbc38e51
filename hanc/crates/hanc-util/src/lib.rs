//! hanc-util - Core Utilities and Foundation Types
//!
//! Foundation crate for the hanc compiler pipeline. Every later stage
//! (lexer, parser, semantic analysis, IR generation) builds on the types
//! defined here:
//!
//! - [`Span`] / [`FileId`] / [`SourceMap`]: source locations and the
//!   immutable UTF-8 source buffers they point into.
//! - [`Symbol`]: 4-byte interned string handles with O(1) comparison,
//!   backed by a global lock-free string table.
//! - [`IndexVec`] / [`Idx`]: typed index vectors. Arena-style storage with
//!   typed indices is used wherever the pipeline needs cyclic or shared
//!   references (scope trees, symbol tables, basic-block graphs) so no
//!   node ever holds an owning back-pointer.
//! - [`DiagnosticSink`]: the append-only diagnostics collection threaded
//!   through every stage. It is the only failure channel for program
//!   errors; the core never aborts on bad input.
//!
//! None of these types hold process-wide mutable state (the string table
//! excepted, which is append-only), so multiple files may be compiled in
//! parallel by a driver without coordination.

pub mod diagnostic;
pub mod ids;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use diagnostic::{DiagCode, Diagnostic, DiagnosticSink, Severity};
pub use ids::SymbolId;
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
