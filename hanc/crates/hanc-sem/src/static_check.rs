//! Static check presets: unused locals/parameters and complexity
//! warnings.
//!
//! These checks only ever produce warnings; they never fail a
//! compilation. They run over resolved programs so local declarations
//! and parameters carry bindings.

use hanc_par::ast::*;
use hanc_util::diagnostic::codes;
use hanc_util::{DiagnosticSink, FxHashSet, SymbolId};

/// Tunable thresholds for the static checks
#[derive(Clone, Debug)]
pub struct CheckConfig {
    pub check_unused: bool,
    pub check_complexity: bool,
    /// Statement count threshold per function body
    pub max_statements_per_function: usize,
    /// Nesting depth threshold inside a function body
    pub max_nesting_level: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            check_unused: true,
            check_complexity: true,
            max_statements_per_function: 50,
            max_nesting_level: 5,
        }
    }
}

/// Run the configured static checks over a resolved program
///
/// Returns true iff nothing was reported (warnings included).
pub fn run_static_checks(program: &Program, sink: &DiagnosticSink, config: &CheckConfig) -> bool {
    let warnings_before = sink.warning_count();

    for func in &program.functions {
        check_function(func, sink, config);
    }
    for module in &program.modules {
        for func in &module.functions {
            check_function(func, sink, config);
        }
    }

    sink.warning_count() == warnings_before
}

fn check_function(func: &FunctionDecl, sink: &DiagnosticSink, config: &CheckConfig) {
    if config.check_unused {
        let mut used = FxHashSet::default();
        collect_used_block(&func.body, &mut used);

        for param in &func.params {
            if let Some(id) = param.binding {
                if !used.contains(&id) {
                    sink.warning(
                        codes::CHECK_UNUSED_PARAM,
                        func.span.file,
                        func.span.line,
                        func.span.column,
                        format!("函数 '{}' 的参数 '{}' 未被使用", func.name, param.name),
                    );
                }
            }
        }
        warn_unused_locals(&func.body, &used, sink);
    }

    if config.check_complexity {
        let statements = count_statements(&func.body);
        if statements > config.max_statements_per_function {
            sink.warning(
                codes::CHECK_COMPLEXITY,
                func.span.file,
                func.span.line,
                func.span.column,
                format!(
                    "函数 '{}' 包含 {statements} 条语句，超过阈值 {}",
                    func.name, config.max_statements_per_function
                ),
            );
        }
        let nesting = max_nesting(&func.body, 0);
        if nesting > config.max_nesting_level {
            sink.warning(
                codes::CHECK_COMPLEXITY,
                func.span.file,
                func.span.line,
                func.span.column,
                format!(
                    "函数 '{}' 的嵌套深度为 {nesting}，超过阈值 {}",
                    func.name, config.max_nesting_level
                ),
            );
        }
    }
}

fn warn_unused_locals(block: &Block, used: &FxHashSet<SymbolId>, sink: &DiagnosticSink) {
    for stmt in &block.stmts {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => {
                if let Some(id) = decl.binding {
                    if !used.contains(&id) {
                        sink.warning(
                            codes::CHECK_UNUSED_VAR,
                            decl.span.file,
                            decl.span.line,
                            decl.span.column,
                            format!("变量 '{}' 未被使用", decl.name),
                        );
                    }
                }
            }
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                warn_unused_locals(then_block, used, sink);
                if let Some(else_block) = else_block {
                    warn_unused_locals(else_block, used, sink);
                }
            }
            StmtKind::While { body, .. } => warn_unused_locals(body, used, sink),
            StmtKind::For { init, body, .. } => {
                if let Some(init) = init {
                    if let StmtKind::VarDecl(decl) = &init.kind {
                        if let Some(id) = decl.binding {
                            if !used.contains(&id) {
                                sink.warning(
                                    codes::CHECK_UNUSED_VAR,
                                    decl.span.file,
                                    decl.span.line,
                                    decl.span.column,
                                    format!("变量 '{}' 未被使用", decl.name),
                                );
                            }
                        }
                    }
                }
                warn_unused_locals(body, used, sink);
            }
            StmtKind::Switch { cases, .. } => {
                for case in cases {
                    warn_unused_locals(&case.body, used, sink);
                }
            }
            StmtKind::Block(block) => warn_unused_locals(block, used, sink),
            _ => {}
        }
    }
}

fn collect_used_block(block: &Block, used: &mut FxHashSet<SymbolId>) {
    for stmt in &block.stmts {
        collect_used_stmt(stmt, used);
    }
}

fn collect_used_stmt(stmt: &Stmt, used: &mut FxHashSet<SymbolId>) {
    match &stmt.kind {
        StmtKind::VarDecl(decl) => {
            if let Some(init) = &decl.initializer {
                collect_used_expr(init, used);
            }
        }
        StmtKind::Expr(expr) => collect_used_expr(expr, used),
        StmtKind::Return(value) => {
            if let Some(value) = value {
                collect_used_expr(value, used);
            }
        }
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => {
            collect_used_expr(cond, used);
            collect_used_block(then_block, used);
            if let Some(else_block) = else_block {
                collect_used_block(else_block, used);
            }
        }
        StmtKind::While { cond, body } => {
            collect_used_expr(cond, used);
            collect_used_block(body, used);
        }
        StmtKind::For {
            init,
            cond,
            update,
            body,
        } => {
            if let Some(init) = init {
                collect_used_stmt(init, used);
            }
            if let Some(cond) = cond {
                collect_used_expr(cond, used);
            }
            if let Some(update) = update {
                collect_used_expr(update, used);
            }
            collect_used_block(body, used);
        }
        StmtKind::Switch { scrutinee, cases } => {
            collect_used_expr(scrutinee, used);
            for case in cases {
                if let Some(value) = &case.value {
                    collect_used_expr(value, used);
                }
                collect_used_block(&case.body, used);
            }
        }
        StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Block(block) => collect_used_block(block, used),
    }
}

fn collect_used_expr(expr: &Expr, used: &mut FxHashSet<SymbolId>) {
    match &expr.kind {
        ExprKind::Ident { binding, .. } => {
            if let Some(id) = binding {
                used.insert(*id);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
            collect_used_expr(lhs, used);
            collect_used_expr(rhs, used);
        }
        ExprKind::Unary { operand, .. } => collect_used_expr(operand, used),
        ExprKind::Ternary {
            cond,
            then_value,
            else_value,
        } => {
            collect_used_expr(cond, used);
            collect_used_expr(then_value, used);
            collect_used_expr(else_value, used);
        }
        ExprKind::Assign { target, value } => {
            collect_used_expr(target, used);
            collect_used_expr(value, used);
        }
        ExprKind::Call { callee, args } => {
            collect_used_expr(callee, used);
            for arg in args {
                collect_used_expr(arg, used);
            }
        }
        ExprKind::Index { base, index } => {
            collect_used_expr(base, used);
            collect_used_expr(index, used);
        }
        ExprKind::Member { object, .. } => collect_used_expr(object, used),
        ExprKind::StructLit { fields, .. } => {
            for field in fields {
                collect_used_expr(&field.value, used);
            }
        }
        ExprKind::ArrayLit(elements) => {
            for element in elements {
                collect_used_expr(element, used);
            }
        }
        ExprKind::MemoryRead { addr } => collect_used_expr(addr, used),
        ExprKind::MemoryWrite { addr, value } => {
            collect_used_expr(addr, used);
            collect_used_expr(value, used);
        }
        ExprKind::MemoryCopy { dest, src, size } => {
            collect_used_expr(dest, used);
            collect_used_expr(src, used);
            collect_used_expr(size, used);
        }
        ExprKind::MemorySet { addr, value, size } => {
            collect_used_expr(addr, used);
            collect_used_expr(value, used);
            collect_used_expr(size, used);
        }
        ExprKind::MemoryMap {
            addr,
            size,
            prot,
            flags,
        } => {
            collect_used_expr(addr, used);
            collect_used_expr(size, used);
            collect_used_expr(prot, used);
            collect_used_expr(flags, used);
        }
        ExprKind::MemoryUnmap { addr, size } => {
            collect_used_expr(addr, used);
            collect_used_expr(size, used);
        }
        ExprKind::InlineAsm {
            code,
            outputs,
            inputs,
            clobbers,
        } => {
            collect_used_expr(code, used);
            for operand in outputs.iter().chain(inputs).chain(clobbers) {
                collect_used_expr(operand, used);
            }
        }
        ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::StrLit(_)
        | ExprKind::BoolLit(_)
        | ExprKind::Null => {}
    }
}

fn count_statements(block: &Block) -> usize {
    let mut count = 0;
    for stmt in &block.stmts {
        count += 1;
        match &stmt.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                count += count_statements(then_block);
                if let Some(else_block) = else_block {
                    count += count_statements(else_block);
                }
            }
            StmtKind::While { body, .. } => count += count_statements(body),
            StmtKind::For { init, body, .. } => {
                if init.is_some() {
                    count += 1;
                }
                count += count_statements(body);
            }
            StmtKind::Switch { cases, .. } => {
                for case in cases {
                    count += count_statements(&case.body);
                }
            }
            StmtKind::Block(inner) => count += count_statements(inner),
            _ => {}
        }
    }
    count
}

fn max_nesting(block: &Block, level: usize) -> usize {
    let mut max = level;
    for stmt in &block.stmts {
        let nested = match &stmt.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                let mut n = max_nesting(then_block, level + 1);
                if let Some(else_block) = else_block {
                    n = n.max(max_nesting(else_block, level + 1));
                }
                n
            }
            StmtKind::While { body, .. } => max_nesting(body, level + 1),
            StmtKind::For { body, .. } => max_nesting(body, level + 1),
            StmtKind::Switch { cases, .. } => cases
                .iter()
                .map(|case| max_nesting(&case.body, level + 1))
                .max()
                .unwrap_or(level),
            StmtKind::Block(inner) => max_nesting(inner, level + 1),
            _ => level,
        };
        max = max.max(nested);
    }
    max
}
