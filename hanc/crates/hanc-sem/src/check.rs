//! Type checking.
//!
//! The third analysis pass synthesizes a type for every expression,
//! stores it on the node, and verifies statement-level rules. It relies
//! on the bindings left by name resolution and must not run when earlier
//! passes reported errors.

use crate::builtins::{self, Builtin};
use crate::scope::{SymbolKind, SymbolTable};
use hanc_par::ast::*;
use hanc_par::{StructField, Type};
use hanc_util::diagnostic::codes;
use hanc_util::{DiagCode, DiagnosticSink, Span};

/// Check every declaration and expression of a program
///
/// Returns true iff no new error was reported. After a successful run
/// every expression node carries a resolved type.
pub fn check_types(table: &mut SymbolTable, program: &mut Program, sink: &DiagnosticSink) -> bool {
    let before = sink.checkpoint();
    let mut checker = TypeChecker {
        table,
        sink,
        loop_depth: 0,
        break_depth: 0,
        ret: None,
    };

    for var in &mut program.globals {
        checker.check_var_decl(var);
    }
    for module in &mut program.modules {
        for var in &mut module.vars {
            checker.check_var_decl(var);
        }
        for func in &mut module.functions {
            checker.check_function(func);
        }
    }
    for func in &mut program.functions {
        checker.check_function(func);
    }

    !sink.errors_since(before)
}

struct TypeChecker<'a> {
    table: &'a mut SymbolTable,
    sink: &'a DiagnosticSink,
    /// Nesting depth of while/for bodies (continue targets)
    loop_depth: usize,
    /// Nesting depth of break targets (loops and switch arms)
    break_depth: usize,
    /// Declared return type of the enclosing function; `None` when the
    /// declaration leaves it unspecified
    ret: Option<Type>,
}

impl<'a> TypeChecker<'a> {
    fn error(&self, code: DiagCode, span: Span, message: String) {
        self.sink
            .error(code, span.file, span.line, span.column, message);
    }

    fn warning(&self, code: DiagCode, span: Span, message: String) {
        self.sink
            .warning(code, span.file, span.line, span.column, message);
    }

    /// Replace named type references with the declared struct or enum
    /// type
    fn resolve_type(&self, ty: &Type, span: Span) -> Type {
        match ty {
            Type::Named(name) => {
                if let Some(id) = self.table.lookup_in(self.table.global, *name) {
                    let symbol = self.table.symbol(id);
                    if matches!(symbol.kind, SymbolKind::Struct | SymbolKind::Enum) {
                        return symbol.ty.clone();
                    }
                }
                self.error(
                    codes::SEM_UNDEFINED_IDENTIFIER,
                    span,
                    format!("未定义的类型 '{name}'"),
                );
                Type::Int
            }
            Type::Pointer(p) => Type::Pointer(Box::new(self.resolve_type(p, span))),
            Type::Array { elem, len } => Type::Array {
                elem: Box::new(self.resolve_type(elem, span)),
                len: *len,
            },
            Type::Function { ret, params } => Type::Function {
                ret: Box::new(self.resolve_type(ret, span)),
                params: params.iter().map(|p| self.resolve_type(p, span)).collect(),
            },
            other => other.clone(),
        }
    }

    // -----------------------------------------------------------
    // Declarations and statements
    // -----------------------------------------------------------

    fn check_function(&mut self, func: &mut FunctionDecl) {
        for param in &mut func.params {
            param.ty = self.resolve_type(&param.ty, func.span);
            if let Some(id) = param.binding {
                self.table.symbol_mut(id).ty = param.ty.clone();
            }
        }
        self.ret = func.ret.as_ref().map(|t| self.resolve_type(t, func.span));
        self.loop_depth = 0;
        self.break_depth = 0;
        self.check_block(&mut func.body);
    }

    fn check_var_decl(&mut self, decl: &mut VarDecl) {
        if let Some(declared) = &decl.declared_type {
            decl.declared_type = Some(self.resolve_type(declared, decl.span));
        }

        let init_ty = decl
            .initializer
            .as_mut()
            .map(|init| Self::check_expr_on(self, init));

        let final_ty = match (&decl.declared_type, init_ty) {
            (Some(declared), Some(init_ty)) => {
                if !declared.compatible_with(&init_ty) {
                    self.error(
                        codes::SEM_TYPE_MISMATCH,
                        decl.span,
                        format!(
                            "类型不匹配：变量 '{}' 声明为 {declared}，初始值为 {init_ty}",
                            decl.name
                        ),
                    );
                }
                declared.clone()
            }
            (Some(declared), None) => declared.clone(),
            // Declared type absent: inferred from the initializer.
            (None, Some(init_ty)) => init_ty,
            (None, None) => Type::Int,
        };

        if let Some(id) = decl.binding {
            self.table.symbol_mut(id).ty = final_ty;
        }
    }

    fn check_block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::VarDecl(decl) => self.check_var_decl(decl),
            StmtKind::Expr(expr) => {
                self.check_expr(expr);
            }
            StmtKind::Return(value) => {
                let value_ty = value.as_mut().map(|v| Self::check_expr_on(self, v));
                if let Some(declared) = self.ret.clone() {
                    match value_ty {
                        Some(value_ty) => {
                            if !declared.compatible_with(&value_ty) {
                                self.error(
                                    codes::SEM_TYPE_MISMATCH,
                                    span,
                                    format!("返回类型不匹配：期望 {declared}，实际 {value_ty}"),
                                );
                            }
                        }
                        None => {
                            if !matches!(declared, Type::Void) {
                                self.error(
                                    codes::SEM_TYPE_MISMATCH,
                                    span,
                                    format!("返回类型不匹配：期望 {declared}，实际为空"),
                                );
                            }
                        }
                    }
                }
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.check_condition(cond);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond);
                self.loop_depth += 1;
                self.break_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                self.break_depth -= 1;
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
                    self.check_condition(cond);
                }
                if let Some(update) = update {
                    self.check_expr(update);
                }
                self.loop_depth += 1;
                self.break_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                self.break_depth -= 1;
            }
            StmtKind::Switch { scrutinee, cases } => {
                let scrutinee_ty = Self::check_expr_on(self, scrutinee);
                let mut defaults = 0usize;
                let mut seen_values: Vec<i64> = Vec::new();
                self.break_depth += 1;
                for case in cases.iter_mut() {
                    match &mut case.value {
                        Some(value) => {
                            let value_ty = Self::check_expr_on(self, value);
                            if !value_ty.compatible_with(&scrutinee_ty) {
                                self.error(
                                    codes::SEM_TYPE_MISMATCH,
                                    value.span,
                                    format!(
                                        "情况值类型 {value_ty} 与选择表达式类型 {scrutinee_ty} 不兼容"
                                    ),
                                );
                            }
                            if let ExprKind::IntLit(v) = &value.kind {
                                if seen_values.contains(v) {
                                    self.warning(
                                        codes::SEM_DUPLICATE_CASE,
                                        value.span,
                                        format!("重复的情况值 {v}"),
                                    );
                                } else {
                                    seen_values.push(*v);
                                }
                            }
                        }
                        None => {
                            defaults += 1;
                            if defaults > 1 {
                                self.error(
                                    codes::SEM_MULTIPLE_DEFAULTS,
                                    span,
                                    "选择语句最多只能有一个默认分支".to_string(),
                                );
                            }
                        }
                    }
                    self.check_block(&mut case.body);
                }
                self.break_depth -= 1;
            }
            StmtKind::Break => {
                if self.break_depth == 0 {
                    self.error(
                        codes::SEM_BREAK_CONTINUE_OUTSIDE_LOOP,
                        span,
                        "'中断' 只能出现在循环或选择语句内".to_string(),
                    );
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error(
                        codes::SEM_BREAK_CONTINUE_OUTSIDE_LOOP,
                        span,
                        "'继续' 只能出现在循环内".to_string(),
                    );
                }
            }
            StmtKind::Block(block) => self.check_block(block),
        }
    }

    fn check_condition(&mut self, cond: &mut Expr) {
        let ty = self.check_expr(cond);
        if !ty.is_bool_convertible() {
            self.error(
                codes::SEM_TYPE_MISMATCH,
                cond.span,
                format!("条件表达式的类型 {ty} 不能用作布尔值"),
            );
        }
    }

    // -----------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------

    // Free-function form so callers holding other borrows on self's
    // fields can still invoke the checker.
    fn check_expr_on(checker: &mut Self, expr: &mut Expr) -> Type {
        checker.check_expr(expr)
    }

    /// Synthesize and record the type of an expression
    fn check_expr(&mut self, expr: &mut Expr) -> Type {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::IntLit(_) => Type::Int,
            ExprKind::FloatLit(_) => Type::Float,
            ExprKind::StrLit(_) => Type::Str,
            ExprKind::BoolLit(_) => Type::Bool,
            // The null literal is the untyped address, compatible with
            // any pointer.
            ExprKind::Null => Type::address(),
            ExprKind::Ident { name, binding } => match binding {
                Some(id) => self.table.symbol(*id).ty.clone(),
                None => match builtins::lookup(*name) {
                    Some(builtin) => builtin_value_type(builtin),
                    // Already reported by the resolver.
                    None => Type::Int,
                },
            },
            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let lhs_ty = Self::check_expr_on(self, lhs);
                let rhs_ty = Self::check_expr_on(self, rhs);
                self.check_binary(op, &lhs_ty, &rhs_ty, span)
            }
            ExprKind::Logical { lhs, rhs, .. } => {
                let lhs_ty = Self::check_expr_on(self, lhs);
                let rhs_ty = Self::check_expr_on(self, rhs);
                for (side, ty) in [("左", &lhs_ty), ("右", &rhs_ty)] {
                    if !ty.is_bool_convertible() {
                        self.error(
                            codes::SEM_INVALID_OPERAND,
                            span,
                            format!("逻辑运算的{side}操作数类型 {ty} 不能用作布尔值"),
                        );
                    }
                }
                Type::Bool
            }
            ExprKind::Unary { op, operand } => {
                let op = *op;
                let is_lvalue = operand.is_lvalue();
                let is_ident = matches!(operand.kind, ExprKind::Ident { .. });
                let operand_ty = Self::check_expr_on(self, operand);
                self.check_unary(op, &operand_ty, is_lvalue, is_ident, span)
            }
            ExprKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                let cond_ty = Self::check_expr_on(self, cond);
                if !cond_ty.is_bool_convertible() {
                    self.error(
                        codes::SEM_TYPE_MISMATCH,
                        cond.span,
                        format!("条件表达式的类型 {cond_ty} 不能用作布尔值"),
                    );
                }
                let then_ty = Self::check_expr_on(self, then_value);
                let else_ty = Self::check_expr_on(self, else_value);
                if !then_ty.compatible_with(&else_ty) {
                    self.error(
                        codes::SEM_TYPE_MISMATCH,
                        span,
                        format!("三元表达式的两个分支类型不兼容：{then_ty} 与 {else_ty}"),
                    );
                }
                then_ty
            }
            ExprKind::Assign { target, value } => {
                let value_ty = Self::check_expr_on(self, value);
                if !target.is_lvalue() {
                    self.error(
                        codes::SEM_INVALID_ASSIGNMENT_TARGET,
                        target.span,
                        "赋值目标必须是变量、索引、成员或解引用".to_string(),
                    );
                }
                let target_ty = Self::check_expr_on(self, target);
                self.check_const_target(target);
                if !target_ty.compatible_with(&value_ty) {
                    self.error(
                        codes::SEM_TYPE_MISMATCH,
                        span,
                        format!("类型不匹配：不能把 {value_ty} 赋给 {target_ty}"),
                    );
                }
                target_ty
            }
            ExprKind::Call { .. } => self.check_call(expr.span, &mut expr.kind),
            ExprKind::Index { base, index } => {
                let base_ty = Self::check_expr_on(self, base);
                let index_ty = Self::check_expr_on(self, index);
                if !matches!(index_ty, Type::Int | Type::Enum { .. }) {
                    self.error(
                        codes::SEM_TYPE_MISMATCH,
                        index.span,
                        format!("数组索引必须是整数，实际为 {index_ty}"),
                    );
                }
                match base_ty {
                    Type::Array { elem, .. } => *elem,
                    Type::Pointer(pointee) => *pointee,
                    other => {
                        self.error(
                            codes::SEM_INVALID_OPERAND,
                            base.span,
                            format!("类型 {other} 不支持索引访问"),
                        );
                        Type::Int
                    }
                }
            }
            ExprKind::Member { .. } => self.check_member(expr.span, &mut expr.kind),
            ExprKind::StructLit { name, fields } => {
                let name = *name;
                let struct_ty = self
                    .table
                    .lookup_in(self.table.global, name)
                    .map(|id| self.table.symbol(id).ty.clone());
                let Some(Type::Struct {
                    fields: decl_fields,
                    ..
                }) = &struct_ty
                else {
                    self.error(
                        codes::SEM_UNDEFINED_IDENTIFIER,
                        span,
                        format!("'{name}' 不是结构体类型"),
                    );
                    for field in fields.iter_mut() {
                        Self::check_expr_on(self, &mut field.value);
                    }
                    return self.finish(expr, Type::Int);
                };
                let decl_fields: Vec<StructField> = decl_fields.clone();
                for field in fields.iter_mut() {
                    let value_ty = Self::check_expr_on(self, &mut field.value);
                    match decl_fields.iter().find(|f| f.name == field.name) {
                        Some(decl) => {
                            let decl_ty = self.resolve_type(&decl.ty, span);
                            if !decl_ty.compatible_with(&value_ty) {
                                self.error(
                                    codes::SEM_TYPE_MISMATCH,
                                    field.value.span,
                                    format!(
                                        "字段 '{}' 的类型 {decl_ty} 与初始值类型 {value_ty} 不兼容",
                                        field.name
                                    ),
                                );
                            }
                        }
                        None => {
                            self.error(
                                codes::SEM_UNKNOWN_FIELD,
                                field.value.span,
                                format!("结构体 '{name}' 没有字段 '{}'", field.name),
                            );
                        }
                    }
                }
                struct_ty.unwrap()
            }
            ExprKind::ArrayLit(elements) => {
                if elements.is_empty() {
                    // The empty literal defaults to a length-unknown int
                    // array.
                    Type::Array {
                        elem: Box::new(Type::Int),
                        len: 0,
                    }
                } else {
                    let first_ty = Self::check_expr_on(self, &mut elements[0]);
                    let len = elements.len();
                    for element in elements.iter_mut().skip(1) {
                        let element_ty = Self::check_expr_on(self, element);
                        if !first_ty.compatible_with(&element_ty) {
                            self.error(
                                codes::SEM_TYPE_MISMATCH,
                                element.span,
                                format!(
                                    "数组字面量元素类型不一致：{first_ty} 与 {element_ty}"
                                ),
                            );
                        }
                    }
                    Type::Array {
                        elem: Box::new(first_ty),
                        len,
                    }
                }
            }
            ExprKind::MemoryRead { addr } => {
                self.check_address_operand(addr);
                Type::Int
            }
            ExprKind::MemoryWrite { addr, value } => {
                self.check_address_operand(addr);
                Self::check_expr_on(self, value);
                Type::Void
            }
            ExprKind::MemoryCopy { dest, src, size } => {
                self.check_address_operand(dest);
                self.check_address_operand(src);
                self.check_size_operand(size);
                Type::Void
            }
            ExprKind::MemorySet { addr, value, size } => {
                self.check_address_operand(addr);
                Self::check_expr_on(self, value);
                self.check_size_operand(size);
                Type::Void
            }
            ExprKind::MemoryMap {
                addr,
                size,
                prot,
                flags,
            } => {
                self.check_address_operand(addr);
                self.check_size_operand(size);
                self.check_size_operand(prot);
                self.check_size_operand(flags);
                Type::address()
            }
            ExprKind::MemoryUnmap { addr, size } => {
                self.check_address_operand(addr);
                self.check_size_operand(size);
                Type::Void
            }
            ExprKind::InlineAsm {
                code,
                outputs,
                inputs,
                clobbers,
            } => {
                let code_ty = Self::check_expr_on(self, code);
                if !matches!(code_ty, Type::Str) {
                    self.error(
                        codes::SEM_TYPE_MISMATCH,
                        code.span,
                        format!("内联汇编代码必须是字符串，实际为 {code_ty}"),
                    );
                }
                for operand in outputs.iter_mut().chain(inputs).chain(clobbers) {
                    Self::check_expr_on(self, operand);
                }
                Type::Void
            }
        };
        self.finish(expr, ty)
    }

    fn finish(&self, expr: &mut Expr, ty: Type) -> Type {
        expr.ty = Some(ty.clone());
        ty
    }

    fn check_binary(&self, op: BinaryOp, lhs: &Type, rhs: &Type, span: Span) -> Type {
        use BinaryOp::*;
        if op.is_comparison() {
            if !lhs.compatible_with(rhs) {
                self.error(
                    codes::SEM_TYPE_MISMATCH,
                    span,
                    format!("比较运算的操作数类型不兼容：{lhs} 与 {rhs}"),
                );
            }
            return Type::Bool;
        }
        if op.is_bitwise() {
            if !matches!(lhs, Type::Int) || !matches!(rhs, Type::Int) {
                self.error(
                    codes::SEM_INVALID_OPERAND,
                    span,
                    format!("位运算要求整数操作数，实际为 {lhs} 与 {rhs}"),
                );
            }
            return Type::Int;
        }
        // `+` with a string operand promotes the other side to string.
        if op == Add && (matches!(lhs, Type::Str) || matches!(rhs, Type::Str)) {
            for ty in [lhs, rhs] {
                if !matches!(ty, Type::Str | Type::Int | Type::Float | Type::Bool) {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        format!("类型 {ty} 不能转换为字符串进行拼接"),
                    );
                }
            }
            return Type::Str;
        }
        if !lhs.is_numeric() || !rhs.is_numeric() {
            self.error(
                codes::SEM_INVALID_OPERAND,
                span,
                format!("算术运算要求数值操作数，实际为 {lhs} 与 {rhs}"),
            );
            return Type::Int;
        }
        if matches!(lhs, Type::Float) || matches!(rhs, Type::Float) {
            Type::Float
        } else {
            Type::Int
        }
    }

    fn check_unary(
        &self,
        op: UnaryOp,
        operand: &Type,
        is_lvalue: bool,
        is_ident: bool,
        span: Span,
    ) -> Type {
        use UnaryOp::*;
        match op {
            Not => {
                if !operand.is_bool_convertible() {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        format!("'!' 要求布尔或数值操作数，实际为 {operand}"),
                    );
                }
                Type::Bool
            }
            Neg => {
                if !operand.is_numeric() {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        format!("取负要求数值操作数，实际为 {operand}"),
                    );
                    return Type::Int;
                }
                operand.clone()
            }
            BitNot => {
                if !matches!(operand, Type::Int) {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        format!("'~' 要求整数操作数，实际为 {operand}"),
                    );
                }
                Type::Int
            }
            AddrOf => {
                if !is_ident {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        "取地址要求可寻址的变量".to_string(),
                    );
                }
                Type::Pointer(Box::new(operand.clone()))
            }
            Deref => match operand {
                Type::Pointer(pointee) => (**pointee).clone(),
                other => {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        format!("解引用要求指针操作数，实际为 {other}"),
                    );
                    Type::Int
                }
            },
            PreInc | PreDec | PostInc | PostDec => {
                if !operand.is_numeric() || !is_lvalue {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        "自增/自减要求数值左值".to_string(),
                    );
                }
                operand.clone()
            }
        }
    }

    /// Report assignment to a const variable or const struct field
    fn check_const_target(&mut self, target: &Expr) {
        match &target.kind {
            ExprKind::Ident {
                binding: Some(id), ..
            } => {
                if matches!(
                    self.table.symbol(*id).kind,
                    SymbolKind::Variable { is_const: true }
                ) {
                    self.error(
                        codes::SEM_CONST_ASSIGNMENT,
                        target.span,
                        format!("不能给常量 '{}' 赋值", self.table.symbol(*id).name),
                    );
                }
            }
            ExprKind::Member { object, member, .. } => {
                let fields = match &object.ty {
                    Some(Type::Struct { fields, .. }) => Some(fields),
                    Some(Type::Pointer(inner)) => match &**inner {
                        Type::Struct { fields, .. } => Some(fields),
                        _ => None,
                    },
                    _ => None,
                };
                if let Some(fields) = fields {
                    if fields.iter().any(|f| f.name == *member && f.is_const) {
                        self.error(
                            codes::SEM_CONST_ASSIGNMENT,
                            target.span,
                            format!("不能给常量字段 '{member}' 赋值"),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn check_address_operand(&mut self, addr: &mut Expr) {
        let ty = Self::check_expr_on(self, addr);
        if !matches!(ty, Type::Pointer(_) | Type::Int) {
            self.error(
                codes::SEM_TYPE_MISMATCH,
                addr.span,
                format!("内存地址操作数必须是指针或整数，实际为 {ty}"),
            );
        }
    }

    fn check_size_operand(&mut self, size: &mut Expr) {
        let ty = Self::check_expr_on(self, size);
        if !matches!(ty, Type::Int) {
            self.error(
                codes::SEM_TYPE_MISMATCH,
                size.span,
                format!("大小操作数必须是整数，实际为 {ty}"),
            );
        }
    }

    // -----------------------------------------------------------
    // Calls and member access
    // -----------------------------------------------------------

    fn check_call(&mut self, span: Span, kind: &mut ExprKind) -> Type {
        let ExprKind::Call { callee, args } = kind else {
            unreachable!()
        };

        // Method-style length: `x.长度()` is the same rule as `长度(x)`.
        if let ExprKind::Member { object, member, .. } = &mut callee.kind {
            if member.as_str() == "长度" {
                let object_ty = Self::check_expr_on(self, object);
                if !args.is_empty() {
                    self.error(
                        codes::SEM_ARGUMENT_COUNT_MISMATCH,
                        span,
                        format!("'长度' 方法不接受参数，实际传入 {}", args.len()),
                    );
                }
                self.require_length_operand(&object_ty, object.span);
                callee.ty = Some(Type::Function {
                    ret: Box::new(Type::Int),
                    params: vec![object_ty],
                });
                return Type::Int;
            }
        }

        // Builtins are recognized by name when the callee did not
        // resolve to a user symbol.
        if let ExprKind::Ident {
            name,
            binding: None,
        } = &callee.kind
        {
            if let Some(builtin) = builtins::lookup(*name) {
                callee.ty = Some(builtin_value_type(builtin));
                return self.check_builtin_call(builtin, span, args);
            }
        }

        let callee_ty = Self::check_expr_on(self, callee);
        let (ret, params) = match &callee_ty {
            Type::Function { ret, params } => (ret.clone(), params.clone()),
            Type::Pointer(inner) => match &**inner {
                Type::Function { ret, params } => (ret.clone(), params.clone()),
                _ => {
                    self.error(
                        codes::SEM_NOT_CALLABLE,
                        callee.span,
                        format!("类型 {callee_ty} 不能被调用"),
                    );
                    return Type::Int;
                }
            },
            _ => {
                self.error(
                    codes::SEM_NOT_CALLABLE,
                    callee.span,
                    format!("类型 {callee_ty} 不能被调用"),
                );
                return Type::Int;
            }
        };

        if args.len() != params.len() {
            self.error(
                codes::SEM_ARGUMENT_COUNT_MISMATCH,
                span,
                format!("参数数量不匹配：期望 {}，实际 {}", params.len(), args.len()),
            );
        }
        for (arg, param) in args.iter_mut().zip(params.iter()) {
            let arg_ty = Self::check_expr_on(self, arg);
            let param_ty = self.resolve_type(param, span);
            if !param_ty.compatible_with(&arg_ty) {
                self.error(
                    codes::SEM_TYPE_MISMATCH,
                    arg.span,
                    format!("参数类型不匹配：期望 {param_ty}，实际 {arg_ty}"),
                );
            }
        }
        // Arguments beyond the declared count are still typed.
        for arg in args.iter_mut().skip(params.len()) {
            Self::check_expr_on(self, arg);
        }

        *ret
    }

    fn check_builtin_call(&mut self, builtin: Builtin, span: Span, args: &mut [Expr]) -> Type {
        for arg in args.iter_mut() {
            Self::check_expr_on(self, arg);
        }
        match builtin {
            Builtin::Length => {
                if args.len() != 1 {
                    self.error(
                        codes::SEM_ARGUMENT_COUNT_MISMATCH,
                        span,
                        format!("'长度' 需要一个参数，实际传入 {}", args.len()),
                    );
                } else if let Some(ty) = &args[0].ty {
                    let ty = ty.clone();
                    self.require_length_operand(&ty, args[0].span);
                }
                Type::Int
            }
            Builtin::Print | Builtin::PrintInt | Builtin::PrintString => {
                if args.len() != 1 {
                    self.error(
                        codes::SEM_ARGUMENT_COUNT_MISMATCH,
                        span,
                        format!("'打印' 需要一个参数，实际传入 {}", args.len()),
                    );
                }
                Type::Void
            }
            Builtin::FileOpen => Type::Int,
            Builtin::FileRead | Builtin::ReadLine => Type::Str,
            Builtin::FileWrite | Builtin::FileClose => Type::Void,
        }
    }

    fn require_length_operand(&self, ty: &Type, span: Span) {
        if !matches!(ty, Type::Array { .. } | Type::Str) {
            self.error(
                codes::SEM_TYPE_MISMATCH,
                span,
                format!("'长度' 的参数必须是数组或字符串，实际为 {ty}"),
            );
        }
    }

    fn check_member(&mut self, span: Span, kind: &mut ExprKind) -> Type {
        let ExprKind::Member {
            object,
            member,
            arrow,
        } = kind
        else {
            unreachable!()
        };
        let member = *member;

        // Module member access: the object identifier is bound to a
        // module symbol or an import alias.
        if let ExprKind::Ident {
            binding: Some(id), ..
        } = &object.kind
        {
            let target = match self.table.symbol(*id).kind {
                SymbolKind::Module { scope } => Some(scope),
                SymbolKind::ImportAlias { target } => Some(target),
                _ => None,
            };
            if let Some(scope) = target {
                object.ty = Some(Type::Void);
                let Some(member_id) = self.table.lookup_in(scope, member) else {
                    self.error(
                        codes::SEM_UNKNOWN_MEMBER,
                        span,
                        format!("模块中没有成员 '{member}'"),
                    );
                    return Type::Int;
                };
                let symbol = self.table.symbol(member_id);
                if symbol.visibility != Visibility::Public {
                    self.error(
                        codes::SEM_PRIVATE_ACCESS,
                        span,
                        format!("成员 '{member}' 是私有的"),
                    );
                }
                return symbol.ty.clone();
            }
        }

        let object_ty = Self::check_expr_on(self, object);

        // Arrow access peels one pointer layer first.
        let base_ty = if *arrow {
            match object_ty {
                Type::Pointer(inner) => *inner,
                other => {
                    self.error(
                        codes::SEM_INVALID_OPERAND,
                        span,
                        format!("'->' 要求指针操作数，实际为 {other}"),
                    );
                    return Type::Int;
                }
            }
        } else {
            object_ty
        };

        match base_ty {
            Type::Enum { name, members } => {
                // 枚举.成员 yields the member's integer value.
                if members.iter().any(|m| m.name == member) {
                    Type::Int
                } else {
                    self.error(
                        codes::SEM_UNKNOWN_MEMBER,
                        span,
                        format!("枚举 '{name}' 没有成员 '{member}'"),
                    );
                    Type::Int
                }
            }
            Type::Struct { name, fields } => match fields.iter().find(|f| f.name == member) {
                Some(field) => self.resolve_type(&field.ty, span),
                None => {
                    self.error(
                        codes::SEM_UNKNOWN_FIELD,
                        span,
                        format!("结构体 '{name}' 没有字段 '{member}'"),
                    );
                    Type::Int
                }
            },
            other => {
                self.error(
                    codes::SEM_INVALID_OPERAND,
                    span,
                    format!("类型 {other} 不支持成员访问"),
                );
                Type::Int
            }
        }
    }
}

/// The surface type a builtin presents when named outside a call
fn builtin_value_type(builtin: Builtin) -> Type {
    match builtin {
        Builtin::Length => Type::Function {
            ret: Box::new(Type::Int),
            params: vec![Type::Array {
                elem: Box::new(Type::Int),
                len: 0,
            }],
        },
        Builtin::Print | Builtin::PrintInt | Builtin::PrintString => Type::Function {
            ret: Box::new(Type::Void),
            params: vec![Type::Int],
        },
        Builtin::FileOpen => Type::Function {
            ret: Box::new(Type::Int),
            params: vec![Type::Str],
        },
        Builtin::FileRead | Builtin::ReadLine => Type::Function {
            ret: Box::new(Type::Str),
            params: vec![Type::Int],
        },
        Builtin::FileWrite | Builtin::FileClose => Type::Function {
            ret: Box::new(Type::Void),
            params: vec![Type::Int],
        },
    }
}
