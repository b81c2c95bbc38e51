//! Top-level item parsing: functions, interrupt handlers, structs,
//! enums, modules and imports.

use crate::ast::*;
use crate::Parser;
use hanc_lex::TokenKind;
use hanc_util::diagnostic::codes;
use hanc_util::Span;

impl<'a> Parser<'a> {
    /// `函数 name(params?) (-> type)? block`
    ///
    /// The function name may be any identifier, including `主程序`.
    pub(crate) fn parse_function(&mut self) -> Option<FunctionDecl> {
        let start = self.current().span;
        self.expect(TokenKind::KwFn);

        if !self.at(TokenKind::Ident) {
            self.error(codes::PARSE_INVALID_DECL_NAME, "语法错误：函数名无效，期望标识符");
            return None;
        }
        let name = self.symbol();
        self.advance();

        self.expect(TokenKind::LParen);
        let params = self.parse_params();
        self.expect(TokenKind::RParen);

        let ret = if self.eat(TokenKind::Arrow) {
            self.parse_type()
        } else {
            None
        };

        let body = self.parse_block()?;

        Some(FunctionDecl {
            name,
            params,
            ret,
            body,
            visibility: Visibility::default(),
            is_interrupt_handler: false,
            interrupt_vector: 0,
            span: start.merge(self.current().span),
        })
    }

    /// `param := 常量? type ident`, comma-separated
    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.at(TokenKind::RParen) {
            return params;
        }
        loop {
            let is_const = self.eat(TokenKind::KwConst);
            let Some(ty) = self.parse_type() else {
                break;
            };
            if !self.at(TokenKind::Ident) {
                self.error(codes::PARSE_EXPECTED_TOKEN, "语法错误：参数缺少名称");
                break;
            }
            let name = self.symbol();
            self.advance();

            params.push(Param {
                name,
                ty,
                is_const,
                binding: None,
            });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        params
    }

    /// `中断处理 vector () block`
    ///
    /// The vector must be an integer literal in `[0, 256)`; the handler
    /// takes no parameters. The resulting declaration is named
    /// `__isr_<vector>` and flagged as an interrupt handler.
    pub(crate) fn parse_interrupt_handler(&mut self) -> Option<FunctionDecl> {
        let start = self.current().span;
        self.expect(TokenKind::KwInterruptHandler);

        if !self.at(TokenKind::Integer) {
            self.error(
                codes::PARSE_INVALID_INTERRUPT_VECTOR,
                "语法错误：中断处理需要整数向量号",
            );
            return None;
        }
        let vector = self.integer_lexeme_value();
        if !(0..256).contains(&vector) {
            self.error(
                codes::PARSE_INVALID_INTERRUPT_VECTOR,
                format!("语法错误：中断向量号 {vector} 超出范围 [0, 256)"),
            );
            self.advance();
            return None;
        }
        self.advance();

        self.expect(TokenKind::LParen);
        if !self.at(TokenKind::RParen) {
            self.error(
                codes::PARSE_EXPECTED_TOKEN,
                "语法错误：中断处理函数不允许有参数",
            );
            while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
                self.advance();
            }
        }
        self.expect(TokenKind::RParen);

        let body = self.parse_block()?;

        Some(FunctionDecl {
            name: hanc_util::Symbol::intern(&format!("__isr_{vector}")),
            params: Vec::new(),
            ret: None,
            body,
            visibility: Visibility::default(),
            is_interrupt_handler: true,
            interrupt_vector: vector as u32,
            span: start.merge(self.current().span),
        })
    }

    /// `结构体 name { (常量? type ident ;)* }`
    pub(crate) fn parse_struct(&mut self) -> Option<StructDecl> {
        let start = self.current().span;
        self.expect(TokenKind::KwStruct);

        if !self.at(TokenKind::Ident) {
            self.error(codes::PARSE_INVALID_DECL_NAME, "语法错误：结构体名称无效");
            return None;
        }
        let name = self.symbol();
        self.advance();

        self.expect(TokenKind::LBrace);
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let is_const = self.eat(TokenKind::KwConst);
            let Some(ty) = self.parse_type() else {
                self.synchronize_statement();
                continue;
            };
            if !self.at(TokenKind::Ident) {
                self.error(codes::PARSE_EXPECTED_TOKEN, "语法错误：字段缺少名称");
                self.synchronize_statement();
                continue;
            }
            let field_name = self.symbol();
            self.advance();
            self.expect(TokenKind::Semicolon);
            fields.push(FieldDecl {
                name: field_name,
                ty,
                is_const,
            });
        }
        self.expect(TokenKind::RBrace);

        Some(StructDecl {
            name,
            fields,
            span: start.merge(self.current().span),
        })
    }

    /// `枚举 name { member (, member)* ,? }` where
    /// `member := ident (= integer)?`
    ///
    /// Auto-values: a member without an explicit value receives the
    /// previous value + 1, starting from 0.
    pub(crate) fn parse_enum(&mut self) -> Option<EnumDecl> {
        let start = self.current().span;
        self.expect(TokenKind::KwEnum);

        if !self.at(TokenKind::Ident) {
            self.error(codes::PARSE_INVALID_DECL_NAME, "语法错误：枚举名称无效");
            return None;
        }
        let name = self.symbol();
        self.advance();

        self.expect(TokenKind::LBrace);
        let mut members = Vec::new();
        let mut next_value: i64 = 0;
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if !self.at(TokenKind::Ident) {
                self.error(codes::PARSE_EXPECTED_TOKEN, "语法错误：枚举成员缺少名称");
                break;
            }
            let member_name = self.symbol();
            self.advance();

            let value = if self.eat(TokenKind::Eq) {
                let negative = self.eat(TokenKind::Minus);
                if self.at(TokenKind::Integer) {
                    let mut v = self.integer_lexeme_value();
                    if negative {
                        v = -v;
                    }
                    self.advance();
                    v
                } else {
                    self.error(codes::PARSE_EXPECTED_TOKEN, "语法错误：枚举成员值必须是整数字面量");
                    next_value
                }
            } else {
                next_value
            };
            next_value = value + 1;

            members.push(EnumMemberDecl {
                name: member_name,
                value,
            });

            // Trailing comma before '}' is allowed.
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace);

        Some(EnumDecl {
            name,
            members,
            span: start.merge(self.current().span),
        })
    }

    /// `模块 name { (公开: | 私有: | 函数 ... | var-decl)* }`
    ///
    /// `公开:` / `私有:` toggle the visibility applied to all subsequent
    /// members; the initial state is private.
    pub(crate) fn parse_module(&mut self) -> Option<ModuleDecl> {
        let start = self.current().span;
        self.expect(TokenKind::KwModule);

        if !self.at(TokenKind::Ident) {
            self.error(codes::PARSE_INVALID_DECL_NAME, "语法错误：模块名称无效");
            return None;
        }
        let name = self.symbol();
        self.advance();

        self.expect(TokenKind::LBrace);

        let mut vars = Vec::new();
        let mut functions = Vec::new();
        let mut visibility = Visibility::Private;

        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.current().kind {
                TokenKind::KwPublic => {
                    self.advance();
                    self.expect(TokenKind::Colon);
                    visibility = Visibility::Public;
                }
                TokenKind::KwPrivate => {
                    self.advance();
                    self.expect(TokenKind::Colon);
                    visibility = Visibility::Private;
                }
                TokenKind::KwFn => {
                    if let Some(mut func) = self.parse_function() {
                        func.visibility = visibility;
                        functions.push(func);
                    } else {
                        self.synchronize_statement();
                    }
                }
                TokenKind::KwVar
                | TokenKind::KwConst
                | TokenKind::KwInt
                | TokenKind::KwFloat
                | TokenKind::KwBool
                | TokenKind::KwString
                | TokenKind::KwArray
                | TokenKind::KwMemoryAddress => {
                    if let Some(mut decl) = self.parse_var_decl() {
                        decl.visibility = visibility;
                        vars.push(decl);
                    } else {
                        self.synchronize_statement();
                    }
                }
                _ => {
                    self.error(
                        codes::PARSE_EXPECTED_TOKEN,
                        "语法错误：模块内不支持此类型的声明",
                    );
                    self.advance();
                }
            }
        }
        self.expect(TokenKind::RBrace);

        Some(ModuleDecl {
            name,
            vars,
            functions,
            span: start.merge(self.current().span),
        })
    }

    /// `导入 M;` / `导入 M 为 N;` / `导入 M { a, b };`
    pub(crate) fn parse_import(&mut self) -> Option<ImportStmt> {
        let start: Span = self.current().span;
        self.expect(TokenKind::KwImport);

        if !self.at(TokenKind::Ident) {
            self.error(codes::PARSE_INVALID_DECL_NAME, "语法错误：缺少模块名称");
            return None;
        }
        let module = self.symbol();
        self.advance();

        let alias = if self.eat(TokenKind::KwAs) {
            if !self.at(TokenKind::Ident) {
                self.error(codes::PARSE_INVALID_DECL_NAME, "语法错误：缺少别名");
                return None;
            }
            let alias = self.symbol();
            self.advance();
            Some(alias)
        } else {
            None
        };

        let mut members = Vec::new();
        if self.eat(TokenKind::LBrace) {
            while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
                if !self.at(TokenKind::Ident) {
                    self.error(codes::PARSE_EXPECTED_TOKEN, "语法错误：缺少成员名称");
                    break;
                }
                members.push(self.symbol());
                self.advance();
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace);
        }

        self.expect(TokenKind::Semicolon);

        Some(ImportStmt {
            module,
            alias,
            members,
            span: start.merge(self.current().span),
        })
    }
}
