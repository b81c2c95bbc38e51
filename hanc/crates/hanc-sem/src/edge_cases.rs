//! Edge case tests for hanc-sem: full analysis runs over small
//! programs.

#[cfg(test)]
mod tests {
    use crate::{
        build_scopes, check_freestanding, check_types, resolve_names, run_static_checks,
        CheckConfig, SymbolTable,
    };
    use hanc_lex::Lexer;
    use hanc_par::ast::*;
    use hanc_par::{Parser, Type};
    use hanc_util::diagnostic::codes;
    use hanc_util::{DiagnosticSink, FileId};

    fn parse(source: &str) -> Program {
        let lexer = Lexer::new(source, FileId(0));
        let mut parser = Parser::new(lexer);
        let (program, ok) = parser.parse_program();
        assert!(ok, "parse failed for {source:?}");
        program
    }

    fn analyze(source: &str) -> (SymbolTable, Program, DiagnosticSink) {
        let mut program = parse(source);
        let sink = DiagnosticSink::new();
        let mut table = build_scopes(&mut program, &sink);
        if sink.error_count() == 0 {
            resolve_names(&mut table, &mut program, &sink);
        }
        if sink.error_count() == 0 {
            check_types(&mut table, &mut program, &sink);
        }
        (table, program, sink)
    }

    fn analyze_ok(source: &str) -> (SymbolTable, Program) {
        let (table, program, sink) = analyze(source);
        assert_eq!(sink.error_count(), 0, "unexpected errors: {:?}", sink.diagnostics());
        (table, program)
    }

    fn first_error(source: &str) -> hanc_util::DiagCode {
        let (_, _, sink) = analyze(source);
        let diags = sink.diagnostics();
        let error = diags
            .iter()
            .find(|d| d.severity == hanc_util::Severity::Error)
            .expect("expected an error");
        error.code
    }

    // ==================== TYPE SYNTHESIS ====================

    #[test]
    fn test_add_is_int() {
        let (_, program) = analyze_ok("函数 加(整数 a, 整数 b) -> 整数 { 返回 a + b; }");
        let StmtKind::Return(Some(expr)) = &program.functions[0].body.stmts[0].kind else {
            panic!();
        };
        assert_eq!(expr.ty, Some(Type::Int));
        let ExprKind::Binary { lhs, rhs, .. } = &expr.kind else {
            panic!();
        };
        assert_eq!(lhs.ty, Some(Type::Int));
        assert_eq!(rhs.ty, Some(Type::Int));
    }

    #[test]
    fn test_float_promotion() {
        let (_, program) = analyze_ok("函数 f() -> 小数 { 返回 1 + 2.5; }");
        let StmtKind::Return(Some(expr)) = &program.functions[0].body.stmts[0].kind else {
            panic!();
        };
        assert_eq!(expr.ty, Some(Type::Float));
    }

    #[test]
    fn test_string_concat_promotion() {
        let (_, program) = analyze_ok("函数 f() -> 字符串 { 返回 \"x=\" + 42; }");
        let StmtKind::Return(Some(expr)) = &program.functions[0].body.stmts[0].kind else {
            panic!();
        };
        assert_eq!(expr.ty, Some(Type::Str));
    }

    #[test]
    fn test_array_literal_type() {
        let (table, program) = analyze_ok("函数 f() { 变量 a = [1, 2, 3]; }");
        let StmtKind::VarDecl(decl) = &program.functions[0].body.stmts[0].kind else {
            panic!();
        };
        let id = decl.binding.unwrap();
        assert_eq!(
            table.symbol(id).ty,
            Type::Array {
                elem: Box::new(Type::Int),
                len: 3
            }
        );
    }

    #[test]
    fn test_length_builtin() {
        let (table, program) = analyze_ok("函数 f() { 变量 a = [1, 2, 3]; 变量 n = 长度(a); }");
        let StmtKind::VarDecl(decl) = &program.functions[0].body.stmts[1].kind else {
            panic!();
        };
        assert_eq!(table.symbol(decl.binding.unwrap()).ty, Type::Int);
    }

    #[test]
    fn test_method_style_length() {
        let (table, program) =
            analyze_ok("函数 f() { 变量 a = [1]; 变量 n = a.长度(); }");
        let StmtKind::VarDecl(decl) = &program.functions[0].body.stmts[1].kind else {
            panic!();
        };
        assert_eq!(table.symbol(decl.binding.unwrap()).ty, Type::Int);
    }

    #[test]
    fn test_method_style_length_with_args_is_error() {
        assert_eq!(
            first_error("函数 f() { 变量 a = [1]; a.长度(2); }"),
            codes::SEM_ARGUMENT_COUNT_MISMATCH
        );
    }

    #[test]
    fn test_type_assignment_totality() {
        // Every expression node carries a type after success.
        let (_, program) = analyze_ok(
            "函数 f(整数 x) -> 整数 { 变量 a = x * 2 + 1; 如果 (a > 0 && x < 5) { 返回 a; } 返回 x ? 1 : 0; }",
        );
        fn assert_typed(expr: &Expr) {
            assert!(expr.ty.is_some(), "untyped expression: {:?}", expr.kind);
            match &expr.kind {
                ExprKind::Binary { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
                    assert_typed(lhs);
                    assert_typed(rhs);
                }
                ExprKind::Unary { operand, .. } => assert_typed(operand),
                ExprKind::Ternary {
                    cond,
                    then_value,
                    else_value,
                } => {
                    assert_typed(cond);
                    assert_typed(then_value);
                    assert_typed(else_value);
                }
                _ => {}
            }
        }
        fn walk_block(block: &Block) {
            for stmt in &block.stmts {
                match &stmt.kind {
                    StmtKind::VarDecl(decl) => {
                        if let Some(init) = &decl.initializer {
                            assert_typed(init);
                        }
                    }
                    StmtKind::Expr(e) => assert_typed(e),
                    StmtKind::Return(Some(e)) => assert_typed(e),
                    StmtKind::If {
                        cond, then_block, ..
                    } => {
                        assert_typed(cond);
                        walk_block(then_block);
                    }
                    _ => {}
                }
            }
        }
        walk_block(&program.functions[0].body);
    }

    // ==================== ERROR RULES ====================

    #[test]
    fn test_type_mismatch_decl() {
        assert_eq!(
            first_error("函数 f() { 整数 a = \"文本\"; }"),
            codes::SEM_TYPE_MISMATCH
        );
    }

    #[test]
    fn test_argument_count_mismatch() {
        assert_eq!(
            first_error("函数 g(整数 a, 整数 b) { } 函数 f() { g(1); }"),
            codes::SEM_ARGUMENT_COUNT_MISMATCH
        );
    }

    #[test]
    fn test_break_outside_loop() {
        let (_, _, sink) = analyze("函数 f() { 中断; }");
        let errors: Vec<_> = sink
            .diagnostics()
            .into_iter()
            .filter(|d| d.severity == hanc_util::Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, codes::SEM_BREAK_CONTINUE_OUTSIDE_LOOP);
    }

    #[test]
    fn test_continue_outside_loop() {
        assert_eq!(
            first_error("函数 f() { 继续; }"),
            codes::SEM_BREAK_CONTINUE_OUTSIDE_LOOP
        );
    }

    #[test]
    fn test_break_in_switch_is_legal() {
        analyze_ok("函数 f(整数 x) { 选择 (x) { 情况 1: { 中断; } } }");
    }

    #[test]
    fn test_continue_in_switch_outside_loop_is_error() {
        assert_eq!(
            first_error("函数 f(整数 x) { 选择 (x) { 情况 1: { 继续; } } }"),
            codes::SEM_BREAK_CONTINUE_OUTSIDE_LOOP
        );
    }

    #[test]
    fn test_break_in_nested_loop_ok() {
        analyze_ok("函数 f() { 当 (真) { 循环 (;;) { 中断; } 继续; } }");
    }

    #[test]
    fn test_const_assignment() {
        assert_eq!(
            first_error("函数 f() { 常量 整数 a = 1; a = 2; }"),
            codes::SEM_CONST_ASSIGNMENT
        );
    }

    #[test]
    fn test_assign_to_rvalue() {
        assert_eq!(
            first_error("函数 f() { 1 = 2; }"),
            codes::SEM_INVALID_ASSIGNMENT_TARGET
        );
    }

    #[test]
    fn test_call_non_function() {
        assert_eq!(
            first_error("函数 f() { 变量 a = 1; a(); }"),
            codes::SEM_NOT_CALLABLE
        );
    }

    #[test]
    fn test_unknown_struct_field() {
        assert_eq!(
            first_error("结构体 点 { 整数 x; } 函数 f(点 p) { 返回 p.y; }"),
            codes::SEM_UNKNOWN_FIELD
        );
    }

    #[test]
    fn test_multiple_defaults() {
        assert_eq!(
            first_error("函数 f(整数 x) { 选择 (x) { 默认: { } 默认: { } } }"),
            codes::SEM_MULTIPLE_DEFAULTS
        );
    }

    #[test]
    fn test_duplicate_case_is_warning() {
        let (_, _, sink) =
            analyze("函数 f(整数 x) { 选择 (x) { 情况 1: { } 情况 1: { } } }");
        assert_eq!(sink.error_count(), 0);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::SEM_DUPLICATE_CASE));
    }

    // ==================== POINTERS, ENUMS, STRUCTS ====================

    #[test]
    fn test_pointer_flow() {
        analyze_ok("函数 f() { 整数 x = 1; 整数* p = &x; 整数 y = *p; *p = 2; }");
    }

    #[test]
    fn test_null_assigns_to_any_pointer() {
        analyze_ok("函数 f() { 整数* p = 空; 字符串* q = 空; }");
    }

    #[test]
    fn test_deref_non_pointer() {
        assert_eq!(
            first_error("函数 f() { 变量 a = 1; 变量 b = *a; }"),
            codes::SEM_INVALID_OPERAND
        );
    }

    #[test]
    fn test_enum_member_access() {
        let (_, program) = analyze_ok(
            "枚举 颜色 { 红, 绿 = 5 } 函数 f() -> 整数 { 返回 颜色.绿; }",
        );
        let StmtKind::Return(Some(expr)) = &program.functions[0].body.stmts[0].kind else {
            panic!();
        };
        assert_eq!(expr.ty, Some(Type::Int));
    }

    #[test]
    fn test_enum_unknown_member() {
        assert_eq!(
            first_error("枚举 颜色 { 红 } 函数 f() { 返回 颜色.紫; }"),
            codes::SEM_UNKNOWN_MEMBER
        );
    }

    #[test]
    fn test_int_enum_compatibility() {
        analyze_ok("枚举 颜色 { 红 } 函数 f(颜色 c) { } 函数 g() { f(0); }");
    }

    #[test]
    fn test_struct_literal_checks_fields() {
        analyze_ok(
            "结构体 点 { 整数 x; 整数 y; } 函数 f() { 变量 p = 点 { x: 1, y: 2 }; 返回 p.x; }",
        );
        assert_eq!(
            first_error("结构体 点 { 整数 x; } 函数 f() { 变量 p = 点 { z: 1 }; }"),
            codes::SEM_UNKNOWN_FIELD
        );
    }

    #[test]
    fn test_struct_literal_field_type() {
        assert_eq!(
            first_error("结构体 点 { 整数 x; } 函数 f() { 变量 p = 点 { x: \"串\" }; }"),
            codes::SEM_TYPE_MISMATCH
        );
    }

    #[test]
    fn test_function_pointer_call() {
        analyze_ok(
            "函数 加(整数 a, 整数 b) -> 整数 { 返回 a + b; } 函数 f() { 整数 (*操作)(整数, 整数) = 加; 返回 操作(1, 2); }",
        );
    }

    #[test]
    fn test_function_pointer_wrong_args() {
        assert_eq!(
            first_error(
                "函数 加(整数 a, 整数 b) -> 整数 { 返回 a + b; } 函数 f() { 整数 (*操作)(整数, 整数) = 加; 操作(1); }"
            ),
            codes::SEM_ARGUMENT_COUNT_MISMATCH
        );
    }

    #[test]
    fn test_array_length_relaxation_in_call() {
        analyze_ok(
            "函数 总和(数组 整数 a) -> 整数 { 返回 长度(a); } 函数 f() { 返回 总和([1, 2, 3]); }",
        );
    }

    #[test]
    fn test_module_member_access() {
        analyze_ok(
            "模块 M {\n公开:\n    整数 x = 1;\n}\n函数 f() -> 整数 { 返回 M.x; }",
        );
    }

    #[test]
    fn test_module_private_member_access() {
        assert_eq!(
            first_error("模块 M {\n私有:\n    整数 p = 1;\n}\n函数 f() { 返回 M.p; }"),
            codes::SEM_PRIVATE_ACCESS
        );
    }

    #[test]
    fn test_module_alias_access() {
        analyze_ok(
            "模块 M {\n公开:\n    整数 x = 1;\n}\n导入 M 为 N;\n函数 f() -> 整数 { 返回 N.x; }",
        );
    }

    #[test]
    fn test_memory_intrinsics_type_check() {
        analyze_ok(
            "函数 f() { 变量 v = 读取内存(0x1000); 写入内存(0x1000, v); 内存设置(0x2000, 0, 16); }",
        );
    }

    #[test]
    fn test_memory_intrinsic_bad_size() {
        assert_eq!(
            first_error("函数 f() { 内存设置(0x2000, 0, \"大\"); }"),
            codes::SEM_TYPE_MISMATCH
        );
    }

    #[test]
    fn test_interrupt_handler_body_checked() {
        assert_eq!(
            first_error("中断处理 3 () { 中断; }"),
            codes::SEM_BREAK_CONTINUE_OUTSIDE_LOOP
        );
    }

    // ==================== FREESTANDING ====================

    #[test]
    fn test_freestanding_forbids_file_io() {
        let (_, program) = analyze_ok("函数 主程序() { 变量 文件 = 文件打开(\"test.txt\"); 返回 0; }");
        let sink = DiagnosticSink::new();
        let ok = check_freestanding(&program, &sink, true);
        assert!(!ok);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].code, codes::CHECK_FREESTANDING_FORBIDDEN);
    }

    #[test]
    fn test_freestanding_allows_print() {
        let (_, program) = analyze_ok("函数 主程序() { 打印(\"你好\"); 返回 0; }");
        let sink = DiagnosticSink::new();
        assert!(check_freestanding(&program, &sink, true));
    }

    #[test]
    fn test_freestanding_disabled_allows_everything() {
        let (_, program) = analyze_ok("函数 主程序() { 变量 行 = 读取行(); 返回 0; }");
        let sink = DiagnosticSink::new();
        assert!(check_freestanding(&program, &sink, false));
    }

    #[test]
    fn test_freestanding_forbids_console_input() {
        let (_, program) = analyze_ok("函数 主程序() { 变量 行 = 读取行(); 返回 0; }");
        let sink = DiagnosticSink::new();
        assert!(!check_freestanding(&program, &sink, true));
    }

    // ==================== STATIC CHECKS ====================

    #[test]
    fn test_unused_variable_warning() {
        let (_, program) = analyze_ok("函数 f() { 变量 没用 = 1; }");
        let sink = DiagnosticSink::new();
        let clean = run_static_checks(&program, &sink, &CheckConfig::default());
        assert!(!clean);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::CHECK_UNUSED_VAR));
        assert_eq!(sink.error_count(), 0);
    }

    #[test]
    fn test_unused_param_warning() {
        let (_, program) = analyze_ok("函数 f(整数 a) { 返回 1; }");
        let sink = DiagnosticSink::new();
        run_static_checks(&program, &sink, &CheckConfig::default());
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::CHECK_UNUSED_PARAM));
    }

    #[test]
    fn test_used_symbols_not_reported() {
        let (_, program) = analyze_ok("函数 f(整数 a) { 变量 b = a; 返回 b; }");
        let sink = DiagnosticSink::new();
        assert!(run_static_checks(&program, &sink, &CheckConfig::default()));
    }

    #[test]
    fn test_nesting_complexity_warning() {
        let (_, program) = analyze_ok(
            "函数 f() { 当 (真) { 当 (真) { 当 (真) { 当 (真) { 当 (真) { 当 (真) { 中断; } } } } } } }",
        );
        let sink = DiagnosticSink::new();
        let config = CheckConfig::default();
        run_static_checks(&program, &sink, &config);
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::CHECK_COMPLEXITY));
    }

    #[test]
    fn test_statement_count_threshold() {
        let body = "变量 x0 = 0; ".to_string()
            + &(1..60)
                .map(|i| format!("x0 = x0 + {i}; "))
                .collect::<String>();
        let source = format!("函数 f() {{ {body} }}");
        let (_, program) = analyze_ok(&source);
        let sink = DiagnosticSink::new();
        run_static_checks(&program, &sink, &CheckConfig::default());
        assert!(sink
            .diagnostics()
            .iter()
            .any(|d| d.code == codes::CHECK_COMPLEXITY));
    }
}
