//! hanc-sem - Semantic Analysis
//!
//! Three sequential passes over the parsed program, sharing one scope
//! tree:
//!
//! 1. [`build_scopes`] — create the global scope, module scopes with
//!    visibility-stamped members, struct/enum type symbols, enum-member
//!    constants, global variables and hoisted function symbols.
//! 2. [`resolve_names`] — process imports (full, aliased, selective)
//!    and bind every identifier expression to the nearest in-scope
//!    symbol; locals are declared sequentially as the walk passes their
//!    declarations.
//! 3. [`check_types`] — synthesize a type for every expression, store
//!    it on the node, and enforce the statement-level rules.
//!
//! A later pass must not run when an earlier pass reported errors; the
//! driver brackets each pass with the sink's error count. Two further
//! checks are exposed alongside: [`check_freestanding`] (hosted-only
//! builtin rejection) and [`run_static_checks`] (unused-symbol and
//! complexity warnings).

pub mod builtins;
mod check;
mod edge_cases;
mod freestanding;
mod resolve;
pub mod scope;
mod static_check;

pub use builtins::Builtin;
pub use check::check_types;
pub use freestanding::check_freestanding;
pub use resolve::{build_scopes, resolve_names};
pub use scope::{Scope, ScopeId, ScopeKind, SymbolInfo, SymbolKind, SymbolTable};
pub use static_check::{run_static_checks, CheckConfig};
