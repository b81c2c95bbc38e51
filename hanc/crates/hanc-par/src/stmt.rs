//! Statement parsing.

use crate::ast::*;
use crate::ty::Type;
use crate::Parser;
use hanc_lex::TokenKind;
use hanc_util::diagnostic::codes;

impl<'a> Parser<'a> {
    /// `{ statement* }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        if !self.expect(TokenKind::LBrace) {
            return None;
        }
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize_statement(),
            }
        }
        self.expect(TokenKind::RBrace);
        Some(Block { stmts })
    }

    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        let kind = match self.current().kind {
            TokenKind::KwReturn => {
                self.advance();
                let value = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(TokenKind::Semicolon);
                StmtKind::Return(value)
            }
            TokenKind::KwIf => return self.parse_if(),
            TokenKind::KwWhile => {
                self.advance();
                self.expect(TokenKind::LParen);
                let cond = self.parse_expression()?;
                self.expect(TokenKind::RParen);
                let body = self.parse_block()?;
                StmtKind::While { cond, body }
            }
            TokenKind::KwFor => return self.parse_for(),
            TokenKind::KwBreak => {
                self.advance();
                self.expect(TokenKind::Semicolon);
                StmtKind::Break
            }
            TokenKind::KwContinue => {
                self.advance();
                self.expect(TokenKind::Semicolon);
                StmtKind::Continue
            }
            TokenKind::KwSwitch => return self.parse_switch(),
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::KwVar
            | TokenKind::KwConst
            | TokenKind::KwInt
            | TokenKind::KwFloat
            | TokenKind::KwBool
            | TokenKind::KwString
            | TokenKind::KwArray
            | TokenKind::KwMemoryAddress => StmtKind::VarDecl(self.parse_var_decl()?),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon);
                StmtKind::Expr(expr)
            }
        };
        Some(Stmt {
            kind,
            span: start.merge(self.current().span),
        })
    }

    /// `如果 (cond) block (否则 如果 ... | 否则 block)?`
    ///
    /// An `否则 如果` chain nests the next if-statement as a
    /// single-statement else block.
    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::KwIf);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen);
        let then_block = self.parse_block()?;

        let else_block = if self.eat(TokenKind::KwElse) {
            if self.at(TokenKind::KwIf) {
                let nested = self.parse_if()?;
                Some(Block {
                    stmts: vec![nested],
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Some(Stmt {
            kind: StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            span: start.merge(self.current().span),
        })
    }

    /// `循环 (init? ; cond? ; update?) block`
    ///
    /// The init slot takes a full statement (a declaration or an
    /// expression statement), which consumes its own `;`.
    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::KwFor);
        self.expect(TokenKind::LParen);

        let init = if self.eat(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_statement()?))
        };

        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon);

        let update = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RParen);

        let body = self.parse_block()?;

        Some(Stmt {
            kind: StmtKind::For {
                init,
                cond,
                update,
                body,
            },
            span: start.merge(self.current().span),
        })
    }

    /// `选择 (expr) { (情况 value: block)* (默认: block)? }`
    fn parse_switch(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::KwSwitch);
        self.expect(TokenKind::LParen);
        let scrutinee = self.parse_expression()?;
        self.expect(TokenKind::RParen);
        self.expect(TokenKind::LBrace);

        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let value = match self.current().kind {
                TokenKind::KwCase => {
                    self.advance();
                    let value = self.parse_expression()?;
                    self.expect(TokenKind::Colon);
                    Some(value)
                }
                TokenKind::KwDefault => {
                    self.advance();
                    self.expect(TokenKind::Colon);
                    None
                }
                _ => {
                    self.error(
                        codes::PARSE_EXPECTED_TOKEN,
                        "语法错误：选择语句中期望 '情况' 或 '默认'",
                    );
                    return None;
                }
            };
            let body = self.parse_block()?;
            cases.push(SwitchCase { value, body });
        }
        self.expect(TokenKind::RBrace);

        Some(Stmt {
            kind: StmtKind::Switch { scrutinee, cases },
            span: start.merge(self.current().span),
        })
    }

    /// A variable declaration in any surface form:
    ///
    /// - `变量 name (= init)? ;` (inferred type)
    /// - `常量 (变量 | type) name = init ;`
    /// - `type name ([N])* (= init)? ;` (C-style, innermost dimension
    ///   outward: `整数 a[3][4]` is array(3, array(4, int)))
    /// - `type (* name)(param-types) (= init)? ;` (function pointer)
    pub(crate) fn parse_var_decl(&mut self) -> Option<VarDecl> {
        let start = self.current().span;
        let mut is_const = false;
        let mut declared_type: Option<Type> = None;

        if self.eat(TokenKind::KwConst) {
            is_const = true;
            if self.eat(TokenKind::KwVar) {
                // 常量 变量 a = 1; — type inferred later.
            } else {
                declared_type = Some(self.parse_type()?);
            }
        } else if self.eat(TokenKind::KwVar) {
            // 变量 a = 1; — type inferred later.
        } else {
            declared_type = Some(self.parse_type()?);
        }

        // Function pointer: `ret (* name)(param-types)`.
        if declared_type.is_some() && self.at(TokenKind::LParen) {
            return self.parse_function_pointer_decl(start, declared_type.take()?, is_const);
        }

        if !self.at(TokenKind::Ident) {
            self.error(codes::PARSE_INVALID_VAR_DECL, "语法错误：变量名无效");
            return None;
        }
        let name = self.symbol();
        self.advance();

        // C-style array dimensions, built from the innermost outward.
        if self.at(TokenKind::LBracket) {
            let mut dims = Vec::new();
            while self.eat(TokenKind::LBracket) {
                let size = if self.at(TokenKind::RBracket) {
                    0
                } else if self.at(TokenKind::Integer) {
                    let v = self.integer_lexeme_value();
                    self.advance();
                    v.max(0) as usize
                } else {
                    self.error(
                        codes::PARSE_INVALID_VAR_DECL,
                        "语法错误：数组大小必须是整数字面量",
                    );
                    return None;
                };
                self.expect(TokenKind::RBracket);
                dims.push(size);
            }

            let mut ty = declared_type.unwrap_or(Type::Int);
            for &dim in dims.iter().rev() {
                ty = Type::Array {
                    elem: Box::new(ty),
                    len: dim,
                };
            }
            declared_type = Some(ty);
        }

        let initializer = if self.eat(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon);

        Some(VarDecl {
            name,
            declared_type,
            initializer,
            is_const,
            visibility: Visibility::default(),
            binding: None,
            span: start.merge(self.current().span),
        })
    }

    /// `ret (* name)(param-type (ident)?,*) (= init)? ;`
    ///
    /// Produces a variable of type pointer-to-function.
    fn parse_function_pointer_decl(
        &mut self,
        start: hanc_util::Span,
        ret: Type,
        is_const: bool,
    ) -> Option<VarDecl> {
        self.expect(TokenKind::LParen);
        if !self.eat(TokenKind::Star) {
            self.error(
                codes::PARSE_INVALID_VAR_DECL,
                "语法错误：期望函数指针声明或变量名",
            );
            return None;
        }
        if !self.at(TokenKind::Ident) {
            self.error(codes::PARSE_INVALID_VAR_DECL, "语法错误：函数指针名称无效");
            return None;
        }
        let name = self.symbol();
        self.advance();
        self.expect(TokenKind::RParen);

        self.expect(TokenKind::LParen);
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let Some(ty) = self.parse_type() else {
                    break;
                };
                // Parameter names are optional in the pointer type.
                if self.at(TokenKind::Ident) {
                    self.advance();
                }
                params.push(ty);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen);

        let fn_type = Type::Function {
            ret: Box::new(ret),
            params,
        };
        let declared_type = Some(Type::Pointer(Box::new(fn_type)));

        let initializer = if self.eat(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon);

        Some(VarDecl {
            name,
            declared_type,
            initializer,
            is_const,
            visibility: Visibility::default(),
            binding: None,
            span: start.merge(self.current().span),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanc_lex::Lexer;
    use hanc_util::FileId;

    fn parse(source: &str) -> (Program, bool) {
        let lexer = Lexer::new(source, FileId(0));
        let mut parser = Parser::new(lexer);
        parser.parse_program()
    }

    fn body_of(source: &str) -> Block {
        let (program, ok) = parse(source);
        assert!(ok, "parse failed for {source:?}");
        program.functions[0].body.clone()
    }

    #[test]
    fn test_inferred_var_decl() {
        let body = body_of("函数 f() { 变量 a = 1; }");
        let StmtKind::VarDecl(decl) = &body.stmts[0].kind else {
            panic!("expected var decl");
        };
        assert!(decl.declared_type.is_none());
        assert!(decl.initializer.is_some());
        assert!(!decl.is_const);
    }

    #[test]
    fn test_typed_var_decl() {
        let body = body_of("函数 f() { 整数 a = 1; 小数 b; }");
        let StmtKind::VarDecl(a) = &body.stmts[0].kind else {
            panic!();
        };
        assert_eq!(a.declared_type, Some(Type::Int));
        let StmtKind::VarDecl(b) = &body.stmts[1].kind else {
            panic!();
        };
        assert_eq!(b.declared_type, Some(Type::Float));
        assert!(b.initializer.is_none());
    }

    #[test]
    fn test_const_decls() {
        let body = body_of("函数 f() { 常量 整数 a = 1; 常量 变量 b = 2; }");
        let StmtKind::VarDecl(a) = &body.stmts[0].kind else {
            panic!();
        };
        assert!(a.is_const);
        assert_eq!(a.declared_type, Some(Type::Int));
        let StmtKind::VarDecl(b) = &body.stmts[1].kind else {
            panic!();
        };
        assert!(b.is_const);
        assert!(b.declared_type.is_none());
    }

    #[test]
    fn test_multidim_array_decl() {
        let body = body_of("函数 f() { 整数 a[3][4]; }");
        let StmtKind::VarDecl(decl) = &body.stmts[0].kind else {
            panic!();
        };
        // 整数 a[3][4] is array(3, array(4, int)).
        let Some(Type::Array { elem, len }) = &decl.declared_type else {
            panic!("expected array type");
        };
        assert_eq!(*len, 3);
        let Type::Array { elem: inner, len } = &**elem else {
            panic!("expected nested array");
        };
        assert_eq!(*len, 4);
        assert_eq!(**inner, Type::Int);
    }

    #[test]
    fn test_function_pointer_decl() {
        let body = body_of("函数 f() { 整数 (*回调)(整数, 整数); }");
        let StmtKind::VarDecl(decl) = &body.stmts[0].kind else {
            panic!();
        };
        assert_eq!(decl.name.as_str(), "回调");
        let Some(Type::Pointer(inner)) = &decl.declared_type else {
            panic!("expected pointer type");
        };
        let Type::Function { ret, params } = &**inner else {
            panic!("expected function type");
        };
        assert_eq!(**ret, Type::Int);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_if_else() {
        let body = body_of("函数 f() { 如果 (真) { 返回 1; } 否则 { 返回 2; } }");
        let StmtKind::If { else_block, .. } = &body.stmts[0].kind else {
            panic!();
        };
        assert!(else_block.is_some());
    }

    #[test]
    fn test_else_if_chain() {
        let body = body_of(
            "函数 f(整数 x) { 如果 (x > 10) { 返回 1; } 否则 如果 (x > 5) { 返回 2; } 否则 { 返回 3; } }",
        );
        let StmtKind::If { else_block, .. } = &body.stmts[0].kind else {
            panic!();
        };
        let else_block = else_block.as_ref().unwrap();
        assert_eq!(else_block.stmts.len(), 1);
        let StmtKind::If {
            else_block: inner_else,
            ..
        } = &else_block.stmts[0].kind
        else {
            panic!("expected nested if");
        };
        assert!(inner_else.is_some());
    }

    #[test]
    fn test_while_loop() {
        let body = body_of("函数 f() { 当 (真) { 中断; } }");
        let StmtKind::While { body: loop_body, .. } = &body.stmts[0].kind else {
            panic!();
        };
        assert!(matches!(loop_body.stmts[0].kind, StmtKind::Break));
    }

    #[test]
    fn test_for_loop_full() {
        let body = body_of("函数 f() { 循环 (变量 i = 0; i < 10; i++) { 继续; } }");
        let StmtKind::For {
            init,
            cond,
            update,
            body: loop_body,
        } = &body.stmts[0].kind
        else {
            panic!();
        };
        assert!(init.is_some());
        assert!(cond.is_some());
        assert!(update.is_some());
        assert!(matches!(loop_body.stmts[0].kind, StmtKind::Continue));
    }

    #[test]
    fn test_for_loop_empty_slots() {
        let body = body_of("函数 f() { 循环 (;;) { 中断; } }");
        let StmtKind::For {
            init,
            cond,
            update,
            ..
        } = &body.stmts[0].kind
        else {
            panic!();
        };
        assert!(init.is_none());
        assert!(cond.is_none());
        assert!(update.is_none());
    }

    #[test]
    fn test_switch_with_default() {
        let body = body_of(
            "函数 f(整数 x) { 选择 (x) { 情况 1: { 返回 1; } 情况 2: { 返回 2; } 默认: { 返回 0; } } }",
        );
        let StmtKind::Switch { cases, .. } = &body.stmts[0].kind else {
            panic!();
        };
        assert_eq!(cases.len(), 3);
        assert!(cases[0].value.is_some());
        assert!(cases[2].value.is_none());
    }

    #[test]
    fn test_nested_block() {
        let body = body_of("函数 f() { { 变量 a = 1; } }");
        assert!(matches!(body.stmts[0].kind, StmtKind::Block(_)));
    }

    #[test]
    fn test_return_void() {
        let body = body_of("函数 f() { 返回; }");
        assert!(matches!(body.stmts[0].kind, StmtKind::Return(None)));
    }
}
