//! Scope building and name resolution.
//!
//! The first two analysis passes share this file:
//!
//! 1. **build_scopes** creates the global scope tree: module scopes and
//!    their members (stamped with the surrounding visibility-block
//!    state), struct and enum type symbols, enum members as constants,
//!    global variables, and hoisted function symbols. Duplicate names in
//!    one scope report `sem_duplicate_symbol` and the later declaration
//!    is discarded.
//! 2. **resolve_names** processes imports and walks every function body,
//!    creating function and block scopes, declaring locals sequentially
//!    (a variable is visible only after its declaration) and binding
//!    every identifier expression to the nearest in-scope symbol.
//!    Unresolvable identifiers that are not builtins report
//!    `sem_undefined_identifier`.

use crate::builtins;
use crate::scope::{ScopeId, ScopeKind, SymbolKind, SymbolTable};
use hanc_par::ast::*;
use hanc_par::{EnumMember, StructField, Type};
use hanc_util::diagnostic::codes;
use hanc_util::{DiagnosticSink, Span, SymbolId};

/// Build the global scope tree for a program
pub fn build_scopes(program: &mut Program, sink: &DiagnosticSink) -> SymbolTable {
    let mut table = SymbolTable::new();
    let global = table.global;

    // Struct and enum type symbols hoist into the enclosing scope.
    for decl in &program.structs {
        let fields = decl
            .fields
            .iter()
            .map(|f| StructField {
                name: f.name,
                ty: f.ty.clone(),
                is_const: f.is_const,
            })
            .collect();
        let ty = Type::Struct {
            name: decl.name,
            fields,
        };
        if let Err(_existing) =
            table.insert(global, SymbolKind::Struct, decl.name, ty, Visibility::Public)
        {
            duplicate(sink, decl.span, decl.name.as_str());
        }
    }

    for decl in &program.enums {
        let members: Vec<EnumMember> = decl
            .members
            .iter()
            .map(|m| EnumMember {
                name: m.name,
                value: m.value,
            })
            .collect();
        let ty = Type::Enum {
            name: decl.name,
            members: members.clone(),
        };
        if table
            .insert(
                global,
                SymbolKind::Enum,
                decl.name,
                ty.clone(),
                Visibility::Public,
            )
            .is_err()
        {
            duplicate(sink, decl.span, decl.name.as_str());
            continue;
        }
        // Each member doubles as an integer constant in the enclosing
        // scope.
        for member in &decl.members {
            if table
                .insert(
                    global,
                    SymbolKind::EnumMember {
                        value: member.value,
                    },
                    member.name,
                    ty.clone(),
                    Visibility::Public,
                )
                .is_err()
            {
                duplicate(sink, decl.span, member.name.as_str());
            }
        }
    }

    // Module scopes with their members.
    for module in &mut program.modules {
        let scope = table.new_module_scope(module.name, global);
        if table
            .insert(
                global,
                SymbolKind::Module { scope },
                module.name,
                Type::Void,
                Visibility::Public,
            )
            .is_err()
        {
            duplicate(sink, module.span, module.name.as_str());
            continue;
        }

        for func in &module.functions {
            let ty = function_type(func);
            if table
                .insert(scope, SymbolKind::Function, func.name, ty, func.visibility)
                .is_err()
            {
                duplicate(sink, func.span, func.name.as_str());
            }
        }
        for var in &mut module.vars {
            let ty = var.declared_type.clone().unwrap_or(Type::Int);
            match table.insert(
                scope,
                SymbolKind::Variable {
                    is_const: var.is_const,
                },
                var.name,
                ty,
                var.visibility,
            ) {
                Ok(id) => var.binding = Some(id),
                Err(_) => duplicate(sink, var.span, var.name.as_str()),
            }
        }
    }

    // Global variables, in declaration order.
    for var in &mut program.globals {
        let ty = var.declared_type.clone().unwrap_or(Type::Int);
        match table.insert(
            global,
            SymbolKind::Variable {
                is_const: var.is_const,
            },
            var.name,
            ty,
            Visibility::Public,
        ) {
            Ok(id) => var.binding = Some(id),
            Err(_) => duplicate(sink, var.span, var.name.as_str()),
        }
    }

    // Functions hoist: insert before any body is visited so forward
    // references work.
    for func in &program.functions {
        let ty = function_type(func);
        if table
            .insert(global, SymbolKind::Function, func.name, ty, Visibility::Public)
            .is_err()
        {
            duplicate(sink, func.span, func.name.as_str());
        }
    }

    table
}

/// The function type of a declaration; an unspecified return type
/// defaults to int
pub(crate) fn function_type(func: &FunctionDecl) -> Type {
    Type::Function {
        ret: Box::new(func.ret.clone().unwrap_or(Type::Int)),
        params: func.params.iter().map(|p| p.ty.clone()).collect(),
    }
}

fn duplicate(sink: &DiagnosticSink, span: Span, name: &str) {
    sink.error(
        codes::SEM_DUPLICATE_SYMBOL,
        span.file,
        span.line,
        span.column,
        format!("重复定义的符号 '{name}'"),
    );
}

/// Resolve all names in a program
///
/// Returns true iff no new error was reported.
pub fn resolve_names(
    table: &mut SymbolTable,
    program: &mut Program,
    sink: &DiagnosticSink,
) -> bool {
    let before = sink.checkpoint();
    let mut resolver = Resolver { table, sink };

    resolver.resolve_imports(&program.imports);

    for var in &mut program.globals {
        if let Some(init) = &mut var.initializer {
            let global = resolver.table.global;
            resolver.resolve_expr(init, global);
        }
    }

    for module in &mut program.modules {
        let Some(scope) = resolver.module_scope(module.name) else {
            continue;
        };
        for var in &mut module.vars {
            if let Some(init) = &mut var.initializer {
                resolver.resolve_expr(init, scope);
            }
        }
        for func in &mut module.functions {
            resolver.resolve_function(func, scope);
        }
    }

    for func in &mut program.functions {
        let global = resolver.table.global;
        resolver.resolve_function(func, global);
    }

    !sink.errors_since(before)
}

struct Resolver<'a> {
    table: &'a mut SymbolTable,
    sink: &'a DiagnosticSink,
}

impl<'a> Resolver<'a> {
    fn error(&self, code: hanc_util::DiagCode, span: Span, message: String) {
        self.sink
            .error(code, span.file, span.line, span.column, message);
    }

    fn module_scope(&self, name: hanc_util::Symbol) -> Option<ScopeId> {
        let id = self.table.lookup_in(self.table.global, name)?;
        match self.table.symbol(id).kind {
            SymbolKind::Module { scope } => Some(scope),
            _ => None,
        }
    }

    // -----------------------------------------------------------
    // Imports
    // -----------------------------------------------------------

    fn resolve_imports(&mut self, imports: &[ImportStmt]) {
        for import in imports {
            self.resolve_import(import);
        }
    }

    fn resolve_import(&mut self, import: &ImportStmt) {
        let global = self.table.global;
        let Some(module_id) = self.table.lookup_in(global, import.module) else {
            self.error(
                codes::SEM_UNDEFINED_IDENTIFIER,
                import.span,
                format!("未定义的模块 '{}'", import.module),
            );
            return;
        };
        let SymbolKind::Module { scope } = self.table.symbol(module_id).kind else {
            self.error(
                codes::SEM_NOT_A_MODULE,
                import.span,
                format!("'{}' 不是模块", import.module),
            );
            return;
        };

        if let Some(alias) = import.alias {
            // 导入 M 为 N; — N refers to M's scope.
            if self
                .table
                .insert(
                    global,
                    SymbolKind::ImportAlias { target: scope },
                    alias,
                    Type::Void,
                    Visibility::Public,
                )
                .is_err()
            {
                duplicate(self.sink, import.span, alias.as_str());
            }
            return;
        }

        if !import.members.is_empty() {
            // 导入 M { a, b }; — each member must exist and be public.
            for &member in &import.members {
                let Some(member_id) = self.table.lookup_in(scope, member) else {
                    self.error(
                        codes::SEM_UNDEFINED_IDENTIFIER,
                        import.span,
                        format!("模块 '{}' 中没有成员 '{}'", import.module, member),
                    );
                    continue;
                };
                if self.table.symbol(member_id).visibility != Visibility::Public {
                    self.error(
                        codes::SEM_PRIVATE_ACCESS,
                        import.span,
                        format!("成员 '{}' 是私有的，不能导入", member),
                    );
                    continue;
                }
                if self.table.inject(global, member_id).is_err() {
                    duplicate(self.sink, import.span, member.as_str());
                }
            }
            return;
        }

        // 导入 M; — inject every public symbol of M's scope.
        let public: Vec<SymbolId> = self.table.scopes[scope]
            .symbols
            .values()
            .copied()
            .filter(|&id| self.table.symbol(id).visibility == Visibility::Public)
            .collect();
        for id in public {
            if self.table.inject(global, id).is_err() {
                let name = self.table.symbol(id).name;
                duplicate(self.sink, import.span, name.as_str());
            }
        }
    }

    // -----------------------------------------------------------
    // Functions and statements
    // -----------------------------------------------------------

    fn resolve_function(&mut self, func: &mut FunctionDecl, parent: ScopeId) {
        let scope = self.table.new_scope(ScopeKind::Function, parent);
        for param in &mut func.params {
            match self.table.insert(
                scope,
                SymbolKind::Variable {
                    is_const: param.is_const,
                },
                param.name,
                param.ty.clone(),
                Visibility::Private,
            ) {
                Ok(id) => param.binding = Some(id),
                Err(_) => duplicate(self.sink, func.span, param.name.as_str()),
            }
        }
        self.resolve_block(&mut func.body, scope);
    }

    fn resolve_block(&mut self, block: &mut Block, parent: ScopeId) {
        let scope = self.table.new_scope(ScopeKind::Block, parent);
        for stmt in &mut block.stmts {
            self.resolve_stmt(stmt, scope);
        }
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt, scope: ScopeId) {
        match &mut stmt.kind {
            StmtKind::VarDecl(decl) => self.resolve_var_decl(decl, scope),
            StmtKind::Expr(expr) => self.resolve_expr(expr, scope),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.resolve_expr(value, scope);
                }
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.resolve_expr(cond, scope);
                self.resolve_block(then_block, scope);
                if let Some(else_block) = else_block {
                    self.resolve_block(else_block, scope);
                }
            }
            StmtKind::While { cond, body } => {
                self.resolve_expr(cond, scope);
                self.resolve_block(body, scope);
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                // The init declaration is visible in cond, update and
                // the body.
                let for_scope = self.table.new_scope(ScopeKind::Block, scope);
                if let Some(init) = init {
                    self.resolve_stmt(init, for_scope);
                }
                if let Some(cond) = cond {
                    self.resolve_expr(cond, for_scope);
                }
                if let Some(update) = update {
                    self.resolve_expr(update, for_scope);
                }
                self.resolve_block(body, for_scope);
            }
            StmtKind::Switch { scrutinee, cases } => {
                self.resolve_expr(scrutinee, scope);
                for case in cases {
                    if let Some(value) = &mut case.value {
                        self.resolve_expr(value, scope);
                    }
                    self.resolve_block(&mut case.body, scope);
                }
            }
            StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Block(block) => self.resolve_block(block, scope),
        }
    }

    fn resolve_var_decl(&mut self, decl: &mut VarDecl, scope: ScopeId) {
        // The initializer is resolved first: `变量 x = x;` refers to an
        // outer x or is an error.
        if let Some(init) = &mut decl.initializer {
            self.resolve_expr(init, scope);
        }
        let ty = decl.declared_type.clone().unwrap_or(Type::Int);
        match self.table.insert(
            scope,
            SymbolKind::Variable {
                is_const: decl.is_const,
            },
            decl.name,
            ty,
            Visibility::Private,
        ) {
            Ok(id) => decl.binding = Some(id),
            Err(_) => duplicate(self.sink, decl.span, decl.name.as_str()),
        }
    }

    fn resolve_expr(&mut self, expr: &mut Expr, scope: ScopeId) {
        match &mut expr.kind {
            ExprKind::Ident { name, binding } => {
                if let Some(id) = self.table.lookup(scope, *name) {
                    *binding = Some(id);
                } else if builtins::lookup(*name).is_none() {
                    self.error(
                        codes::SEM_UNDEFINED_IDENTIFIER,
                        expr.span,
                        format!("未定义的标识符 '{name}'"),
                    );
                }
            }
            ExprKind::Binary { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
                self.resolve_expr(lhs, scope);
                self.resolve_expr(rhs, scope);
            }
            ExprKind::Unary { operand, .. } => self.resolve_expr(operand, scope),
            ExprKind::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                self.resolve_expr(cond, scope);
                self.resolve_expr(then_value, scope);
                self.resolve_expr(else_value, scope);
            }
            ExprKind::Assign { target, value } => {
                self.resolve_expr(target, scope);
                self.resolve_expr(value, scope);
            }
            ExprKind::Call { callee, args } => {
                self.resolve_expr(callee, scope);
                for arg in args {
                    self.resolve_expr(arg, scope);
                }
            }
            ExprKind::Index { base, index } => {
                self.resolve_expr(base, scope);
                self.resolve_expr(index, scope);
            }
            // The member name is resolved against the object's type
            // during type checking.
            ExprKind::Member { object, .. } => self.resolve_expr(object, scope),
            ExprKind::StructLit { fields, .. } => {
                for field in fields {
                    self.resolve_expr(&mut field.value, scope);
                }
            }
            ExprKind::ArrayLit(elements) => {
                for element in elements {
                    self.resolve_expr(element, scope);
                }
            }
            ExprKind::MemoryRead { addr } => self.resolve_expr(addr, scope),
            ExprKind::MemoryWrite { addr, value } => {
                self.resolve_expr(addr, scope);
                self.resolve_expr(value, scope);
            }
            ExprKind::MemoryCopy { dest, src, size } => {
                self.resolve_expr(dest, scope);
                self.resolve_expr(src, scope);
                self.resolve_expr(size, scope);
            }
            ExprKind::MemorySet { addr, value, size } => {
                self.resolve_expr(addr, scope);
                self.resolve_expr(value, scope);
                self.resolve_expr(size, scope);
            }
            ExprKind::MemoryMap {
                addr,
                size,
                prot,
                flags,
            } => {
                self.resolve_expr(addr, scope);
                self.resolve_expr(size, scope);
                self.resolve_expr(prot, scope);
                self.resolve_expr(flags, scope);
            }
            ExprKind::MemoryUnmap { addr, size } => {
                self.resolve_expr(addr, scope);
                self.resolve_expr(size, scope);
            }
            ExprKind::InlineAsm {
                code,
                outputs,
                inputs,
                clobbers,
            } => {
                self.resolve_expr(code, scope);
                for expr in outputs.iter_mut().chain(inputs).chain(clobbers) {
                    self.resolve_expr(expr, scope);
                }
            }
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::StrLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Null => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanc_lex::Lexer;
    use hanc_par::Parser;
    use hanc_util::FileId;

    fn parse(source: &str) -> Program {
        let lexer = Lexer::new(source, FileId(0));
        let mut parser = Parser::new(lexer);
        let (program, ok) = parser.parse_program();
        assert!(ok, "parse failed for {source:?}");
        program
    }

    fn build(source: &str) -> (SymbolTable, Program, DiagnosticSink) {
        let mut program = parse(source);
        let sink = DiagnosticSink::new();
        let table = build_scopes(&mut program, &sink);
        (table, program, sink)
    }

    fn build_and_resolve(source: &str) -> (SymbolTable, Program, DiagnosticSink, bool) {
        let (mut table, mut program, sink) = build(source);
        let ok = resolve_names(&mut table, &mut program, &sink);
        (table, program, sink, ok)
    }

    #[test]
    fn test_function_hoisting() {
        // 后面 is called before its declaration appears.
        let (_, _, sink, ok) =
            build_and_resolve("函数 前面() { 返回 后面(); } 函数 后面() -> 整数 { 返回 1; }");
        assert!(ok, "{:?}", sink.diagnostics());
    }

    #[test]
    fn test_undefined_identifier() {
        let (_, _, sink, ok) = build_and_resolve("函数 f() { 返回 不存在; }");
        assert!(!ok);
        assert_eq!(sink.diagnostics()[0].code, codes::SEM_UNDEFINED_IDENTIFIER);
    }

    #[test]
    fn test_duplicate_function() {
        let (_, _, sink) = build("函数 f() { } 函数 f() { }");
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::SEM_DUPLICATE_SYMBOL));
    }

    #[test]
    fn test_param_binding() {
        let (_, program, _, ok) = build_and_resolve("函数 f(整数 a) { 返回 a; }");
        assert!(ok);
        assert!(program.functions[0].params[0].binding.is_some());
        let StmtKind::Return(Some(expr)) = &program.functions[0].body.stmts[0].kind else {
            panic!();
        };
        let ExprKind::Ident { binding, .. } = &expr.kind else {
            panic!();
        };
        assert_eq!(*binding, program.functions[0].params[0].binding);
    }

    #[test]
    fn test_sequential_variable_visibility() {
        // A variable is not in scope inside its own initializer.
        let (_, _, sink, ok) = build_and_resolve("函数 f() { 变量 a = a; }");
        assert!(!ok);
        assert_eq!(sink.diagnostics()[0].code, codes::SEM_UNDEFINED_IDENTIFIER);
    }

    #[test]
    fn test_enum_members_are_constants() {
        let (_, _, sink, ok) =
            build_and_resolve("枚举 颜色 { 红, 绿 } 函数 f() { 返回 红; }");
        assert!(ok, "{:?}", sink.diagnostics());
    }

    #[test]
    fn test_full_import_injects_public_only() {
        let source = "模块 M {\n公开:\n    整数 x = 1;\n私有:\n    整数 隐藏 = 2;\n}\n导入 M;\n函数 f() { 返回 x; }\n函数 g() { 返回 隐藏; }";
        let (_, _, sink, ok) = build_and_resolve(source);
        assert!(!ok);
        // x resolves, 隐藏 does not.
        let errors: Vec<_> = sink.diagnostics();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, codes::SEM_UNDEFINED_IDENTIFIER);
        assert!(errors[0].message.contains("隐藏"));
    }

    #[test]
    fn test_selective_import() {
        let source = "模块 M {\n公开:\n    整数 a = 1;\n    整数 b = 2;\n}\n导入 M { a };\n函数 f() { 返回 a; }";
        let (_, _, sink, ok) = build_and_resolve(source);
        assert!(ok, "{:?}", sink.diagnostics());
    }

    #[test]
    fn test_selective_import_private_member() {
        let source = "模块 M {\n私有:\n    整数 p = 1;\n}\n导入 M { p };";
        let (_, _, sink, ok) = build_and_resolve(source);
        assert!(!ok);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::SEM_PRIVATE_ACCESS));
    }

    #[test]
    fn test_selective_import_missing_member() {
        let source = "模块 M { }\n导入 M { 没有 };";
        let (_, _, sink, ok) = build_and_resolve(source);
        assert!(!ok);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::SEM_UNDEFINED_IDENTIFIER));
    }

    #[test]
    fn test_import_alias() {
        let source = "模块 M {\n公开:\n    整数 x = 1;\n}\n导入 M 为 N;";
        let (table, _, sink, ok) = build_and_resolve(source);
        assert!(ok, "{:?}", sink.diagnostics());
        let alias = table
            .lookup_in(table.global, hanc_util::Symbol::intern("N"))
            .unwrap();
        assert!(matches!(
            table.symbol(alias).kind,
            SymbolKind::ImportAlias { .. }
        ));
    }

    #[test]
    fn test_import_not_a_module() {
        let source = "函数 M() { }\n导入 M;";
        let (_, _, sink, ok) = build_and_resolve(source);
        assert!(!ok);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::SEM_NOT_A_MODULE));
    }

    #[test]
    fn test_builtins_do_not_error() {
        let (_, _, sink, ok) =
            build_and_resolve("函数 f() { 变量 a = [1]; 打印(长度(a)); }");
        assert!(ok, "{:?}", sink.diagnostics());
    }

    #[test]
    fn test_resolution_closure() {
        // Every bound identifier's declaring scope is an ancestor of the
        // scope it was referenced from, or was import-injected.
        let source =
            "函数 f(整数 a) { 变量 b = a; 如果 (b > 0) { 变量 c = b + a; 返回 c; } 返回 b; }";
        let (_, program, sink, ok) = build_and_resolve(source);
        assert!(ok, "{:?}", sink.diagnostics());
        // Spot check: the innermost return's identifier resolves.
        let StmtKind::If { then_block, .. } = &program.functions[0].body.stmts[1].kind else {
            panic!();
        };
        let StmtKind::Return(Some(expr)) = &then_block.stmts[1].kind else {
            panic!();
        };
        let ExprKind::Ident { binding, .. } = &expr.kind else {
            panic!();
        };
        assert!(binding.is_some());
    }

    #[test]
    fn test_module_function_sees_module_siblings() {
        let source = "模块 M {\n公开:\n    整数 基数 = 10;\n    函数 读取() -> 整数 { 返回 基数; }\n}";
        let (_, _, sink, ok) = build_and_resolve(source);
        assert!(ok, "{:?}", sink.diagnostics());
    }
}
