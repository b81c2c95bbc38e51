//! Freestanding-mode checking.
//!
//! In freestanding mode the hosted-only builtins (file I/O, console
//! input) are forbidden; every call to one reports
//! `check_freestanding_forbidden`. The walk covers every expression of
//! the program, including module bodies and global initializers.

use crate::builtins;
use hanc_par::ast::*;
use hanc_util::diagnostic::codes;
use hanc_util::DiagnosticSink;

/// Check a program for hosted-only builtin usage
///
/// With `enabled == false` the check is a no-op and returns true.
/// Returns true iff no violation was reported.
pub fn check_freestanding(program: &Program, sink: &DiagnosticSink, enabled: bool) -> bool {
    if !enabled {
        return true;
    }
    let before = sink.checkpoint();
    let checker = FreestandingChecker { sink };

    for var in &program.globals {
        if let Some(init) = &var.initializer {
            checker.check_expr(init);
        }
    }
    for module in &program.modules {
        for var in &module.vars {
            if let Some(init) = &var.initializer {
                checker.check_expr(init);
            }
        }
        for func in &module.functions {
            checker.check_block(&func.body);
        }
    }
    for func in &program.functions {
        checker.check_block(&func.body);
    }

    !sink.errors_since(before)
}

struct FreestandingChecker<'a> {
    sink: &'a DiagnosticSink,
}

impl<'a> FreestandingChecker<'a> {
    fn check_block(&self, block: &Block) {
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => {
                if let Some(init) = &decl.initializer {
                    self.check_expr(init);
                }
            }
            StmtKind::Expr(expr) => self.check_expr(expr),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(value);
                }
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.check_expr(cond);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }
            StmtKind::While { cond, body } => {
                self.check_expr(cond);
                self.check_block(body);
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_expr(cond);
                }
                if let Some(update) = update {
                    self.check_expr(update);
                }
                self.check_block(body);
            }
            StmtKind::Switch { scrutinee, cases } => {
                self.check_expr(scrutinee);
                for case in cases {
                    if let Some(value) = &case.value {
                        self.check_expr(value);
                    }
                    self.check_block(&case.body);
                }
            }
            StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Block(block) => self.check_block(block),
        }
    }

    fn check_expr(&self, expr: &Expr) {
        if let ExprKind::Call { callee, .. } = &expr.kind {
            if let ExprKind::Ident { name, binding: None } = &callee.kind {
                if let Some(builtin) = builtins::lookup(*name) {
                    if builtin.is_hosted_only() {
                        self.sink.error(
                            codes::CHECK_FREESTANDING_FORBIDDEN,
                            expr.span.file,
                            expr.span.line,
                            expr.span.column,
                            format!("独立环境模式下不能使用 '{name}'"),
                        );
                    }
                }
            }
        }
        self.walk_children(expr);
    }

    fn walk_children(&self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Binary { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            ExprKind::Unary { operand, .. } => self.check_expr(operand),
            ExprKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                self.check_expr(cond);
                self.check_expr(then_value);
                self.check_expr(else_value);
            }
            ExprKind::Assign { target, value } => {
                self.check_expr(target);
                self.check_expr(value);
            }
            ExprKind::Call { callee, args } => {
                if !matches!(callee.kind, ExprKind::Ident { .. }) {
                    self.check_expr(callee);
                }
                for arg in args {
                    self.check_expr(arg);
                }
            }
            ExprKind::Index { base, index } => {
                self.check_expr(base);
                self.check_expr(index);
            }
            ExprKind::Member { object, .. } => self.check_expr(object),
            ExprKind::StructLit { fields, .. } => {
                for field in fields {
                    self.check_expr(&field.value);
                }
            }
            ExprKind::ArrayLit(elements) => {
                for element in elements {
                    self.check_expr(element);
                }
            }
            ExprKind::MemoryRead { addr } => self.check_expr(addr),
            ExprKind::MemoryWrite { addr, value } => {
                self.check_expr(addr);
                self.check_expr(value);
            }
            ExprKind::MemoryCopy { dest, src, size } => {
                self.check_expr(dest);
                self.check_expr(src);
                self.check_expr(size);
            }
            ExprKind::MemorySet { addr, value, size } => {
                self.check_expr(addr);
                self.check_expr(value);
                self.check_expr(size);
            }
            ExprKind::MemoryMap {
                addr,
                size,
                prot,
                flags,
            } => {
                self.check_expr(addr);
                self.check_expr(size);
                self.check_expr(prot);
                self.check_expr(flags);
            }
            ExprKind::MemoryUnmap { addr, size } => {
                self.check_expr(addr);
                self.check_expr(size);
            }
            ExprKind::InlineAsm {
                code,
                outputs,
                inputs,
                clobbers,
            } => {
                self.check_expr(code);
                for operand in outputs.iter().chain(inputs).chain(clobbers) {
                    self.check_expr(operand);
                }
            }
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::StrLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Null
            | ExprKind::Ident { .. } => {}
        }
    }
}
