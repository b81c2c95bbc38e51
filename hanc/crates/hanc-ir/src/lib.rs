//! hanc-ir - Intermediate Representation and IR Generation
//!
//! The target-independent IR the frontend lowers into: a module of
//! functions made of basic blocks, three-address instructions and
//! tagged operands, with explicit, symmetric control-flow edges. The
//! generator consumes the type-checked AST plus the symbol table (for
//! module-symbol name mangling) and produces one [`Module`] per source
//! file.
//!
//! Guarantees of the generated CFG:
//!
//! - every block ends with exactly one of JUMP, BRANCH, RET;
//! - a block's predecessor list equals the set of blocks whose
//!   terminator names it as a target, and vice versa;
//! - blocks appear in creation order, which matches the natural
//!   dominator order for all structured constructs lowered here.

mod edge_cases;
mod gen;
pub mod ir;
pub mod target;

pub use gen::generate_ir;
pub use ir::{
    runtime, BasicBlock, BlockId, Function, GlobalVar, Inst, Module, Opcode, Operand,
};
pub use target::{Abi, Arch, CompileMode, Os, TargetTriple};
