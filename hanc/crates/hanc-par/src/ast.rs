//! hanc-par - AST Node Definitions
//!
//! This module contains all AST node definitions produced by the parser.
//! A program is a set of buckets (imports, modules, structs, enums,
//! globals, functions), each preserving declaration order; cross-bucket
//! order is irrelevant because types and functions hoist.
//!
//! The semantic analyzer mutates the tree in place: every expression
//! carries a `ty` slot filled by the type checker, and identifier
//! expressions and variable declarations carry a `binding` slot filled by
//! name resolution.

use crate::ty::Type;
use hanc_util::{Span, Symbol, SymbolId};

/// A parsed source file
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub imports: Vec<ImportStmt>,
    pub modules: Vec<ModuleDecl>,
    pub structs: Vec<StructDecl>,
    pub enums: Vec<EnumDecl>,
    pub globals: Vec<VarDecl>,
    pub functions: Vec<FunctionDecl>,
}

/// Symbol visibility inside a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    /// Default for module members until a `公开:` block switches it
    #[default]
    Private,
}

/// `导入 M;` / `导入 M 为 N;` / `导入 M { a, b };`
#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub module: Symbol,
    pub alias: Option<Symbol>,
    /// Selective import member list; empty means full import
    pub members: Vec<Symbol>,
    pub span: Span,
}

/// `模块 M { ... }`
///
/// `公开:` / `私有:` lines inside the body toggle the visibility stamped
/// on all subsequent members.
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub name: Symbol,
    pub vars: Vec<VarDecl>,
    pub functions: Vec<FunctionDecl>,
    pub span: Span,
}

/// `结构体 名 { 字段; ... }`
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Symbol,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// A struct field declaration
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Symbol,
    pub ty: Type,
    pub is_const: bool,
}

/// `枚举 名 { 成员, 成员 = 3, ... }`
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Symbol,
    pub members: Vec<EnumMemberDecl>,
    pub span: Span,
}

/// An enum member; members without an explicit value receive
/// previous + 1, starting from 0
#[derive(Debug, Clone)]
pub struct EnumMemberDecl {
    pub name: Symbol,
    pub value: i64,
}

/// A function declaration
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    /// Declared return type; `None` means unspecified (int by default)
    pub ret: Option<Type>,
    pub body: Block,
    pub visibility: Visibility,
    /// Interrupt handler flag; the declaration is named `__isr_<vector>`
    pub is_interrupt_handler: bool,
    pub interrupt_vector: u32,
    pub span: Span,
}

/// A function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: Type,
    pub is_const: bool,
    pub binding: Option<SymbolId>,
}

/// A brace-delimited statement list
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// A statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    VarDecl(VarDecl),
    Expr(Expr),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Block,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
    },
    Break,
    Continue,
    Block(Block),
}

/// A variable declaration, in any of its surface forms
/// (`变量 x = e;`, `整数 x;`, `常量 整数 x = e;`, `整数 a[3][4];`,
/// `整数 (*f)(整数);`)
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: Symbol,
    /// Declared type; `None` means inferred from the initializer
    pub declared_type: Option<Type>,
    pub initializer: Option<Expr>,
    pub is_const: bool,
    pub visibility: Visibility,
    pub binding: Option<SymbolId>,
    pub span: Span,
}

/// One `情况 值: { ... }` arm; `value` is `None` for `默认:`
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Option<Expr>,
    pub body: Block,
}

/// An expression
///
/// `ty` is filled in by the type checker; after a successful check every
/// node has `Some` type.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    /// Whether this expression designates a memory location
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Ident { .. }
                | ExprKind::Index { .. }
                | ExprKind::Member { .. }
                | ExprKind::Unary {
                    op: UnaryOp::Deref,
                    ..
                }
        )
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    /// Unescaped payload (escapes decoded at parse time)
    StrLit(Symbol),
    BoolLit(bool),
    /// `空`
    Null,
    Ident {
        name: Symbol,
        binding: Option<SymbolId>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: Symbol,
        /// `->` rather than `.`
        arrow: bool,
    },
    StructLit {
        name: Symbol,
        fields: Vec<FieldInit>,
    },
    ArrayLit(Vec<Expr>),

    // Memory intrinsics
    MemoryRead {
        addr: Box<Expr>,
    },
    MemoryWrite {
        addr: Box<Expr>,
        value: Box<Expr>,
    },
    MemoryCopy {
        dest: Box<Expr>,
        src: Box<Expr>,
        size: Box<Expr>,
    },
    MemorySet {
        addr: Box<Expr>,
        value: Box<Expr>,
        size: Box<Expr>,
    },
    MemoryMap {
        addr: Box<Expr>,
        size: Box<Expr>,
        prot: Box<Expr>,
        flags: Box<Expr>,
    },
    MemoryUnmap {
        addr: Box<Expr>,
        size: Box<Expr>,
    },
    InlineAsm {
        code: Box<Expr>,
        outputs: Vec<Expr>,
        inputs: Vec<Expr>,
        clobbers: Vec<Expr>,
    },
}

/// A field initializer in a struct literal
#[derive(Debug, Clone)]
pub struct FieldInit {
    pub name: Symbol,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        use BinaryOp::*;
        matches!(self, Eq | Ne | Lt | Gt | Le | Ge)
    }

    pub fn is_bitwise(self) -> bool {
        use BinaryOp::*;
        matches!(self, BitAnd | BitOr | BitXor | Shl | Shr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// unary `-`
    Neg,
    /// `~`
    BitNot,
    /// `&x`
    AddrOf,
    /// `*p`
    Deref,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lvalue_kinds() {
        let span = Span::DUMMY;
        let ident = Expr::new(
            ExprKind::Ident {
                name: Symbol::intern("x"),
                binding: None,
            },
            span,
        );
        assert!(ident.is_lvalue());

        let lit = Expr::new(ExprKind::IntLit(1), span);
        assert!(!lit.is_lvalue());

        let deref = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand: Box::new(ident.clone()),
            },
            span,
        );
        assert!(deref.is_lvalue());

        let neg = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(lit),
            },
            span,
        );
        assert!(!neg.is_lvalue());
    }

    #[test]
    fn test_default_visibility_is_private() {
        assert_eq!(Visibility::default(), Visibility::Private);
    }
}
