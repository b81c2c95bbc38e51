//! Expression parsing.
//!
//! Precedence, low to high, left-associative unless noted:
//! assignment (right) → ternary → logical-or → logical-and → equality →
//! relational → shift → additive → term (multiplicative and bitwise
//! and/or/xor) → unary prefix → postfix → primary.

use crate::ast::*;
use crate::Parser;
use hanc_lex::{NumberSuffix, TokenKind};
use hanc_util::diagnostic::codes;
use hanc_util::{Span, Symbol};

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    /// Right-associative `target = value`
    fn parse_assignment(&mut self) -> Option<Expr> {
        let target = self.parse_ternary()?;
        if self.eat(TokenKind::Eq) {
            let value = self.parse_assignment()?;
            let span = target.span.merge(value.span);
            return Some(Expr::new(
                ExprKind::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ));
        }
        Some(target)
    }

    /// `cond ? a : b`
    fn parse_ternary(&mut self) -> Option<Expr> {
        let cond = self.parse_logical_or()?;
        if self.eat(TokenKind::Question) {
            let then_value = self.parse_expression()?;
            self.expect(TokenKind::Colon);
            let else_value = self.parse_ternary()?;
            let span = cond.span.merge(else_value.span);
            return Some(Expr::new(
                ExprKind::Ternary {
                    cond: Box::new(cond),
                    then_value: Box::new(then_value),
                    else_value: Box::new(else_value),
                },
                span,
            ));
        }
        Some(cond)
    }

    fn parse_logical_or(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_logical_and()?;
        while self.eat(TokenKind::OrOr) {
            let rhs = self.parse_logical_and()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    fn parse_logical_and(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.eat(TokenKind::AndAnd) {
            let rhs = self.parse_equality()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    fn parse_relational(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_shift()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_shift()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    fn parse_shift(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    /// Multiplicative operators share a level with the binary bitwise
    /// and/or/xor operators
    fn parse_term(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                TokenKind::Amp => BinaryOp::BitAnd,
                TokenKind::Pipe => BinaryOp::BitOr,
                TokenKind::Caret => BinaryOp::BitXor,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current().span;
        let op = match self.current().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Amp => UnaryOp::AddrOf,
            TokenKind::Star => UnaryOp::Deref,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// Postfix: call, index, member access, `++`, `--`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current().kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.at(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.current().span;
                    self.expect(TokenKind::RParen);
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end = self.current().span;
                    self.expect(TokenKind::RBracket);
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = self.at(TokenKind::Arrow);
                    self.advance();
                    if !self.at(TokenKind::Ident) {
                        self.error(codes::PARSE_EXPECTED_TOKEN, "语法错误：成员访问缺少成员名");
                        return None;
                    }
                    let member = self.symbol();
                    let end = self.current().span;
                    self.advance();
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            member,
                            arrow,
                        },
                        span,
                    );
                }
                TokenKind::PlusPlus => {
                    let end = self.current().span;
                    self.advance();
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Unary {
                            op: UnaryOp::PostInc,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                TokenKind::MinusMinus => {
                    let end = self.current().span;
                    self.advance();
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Unary {
                            op: UnaryOp::PostDec,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.current().span;
        match self.current().kind {
            TokenKind::Integer => {
                let value = self.integer_lexeme_value();
                // A float suffix upgrades the literal.
                let kind = if self.current().suffix == NumberSuffix::Float {
                    ExprKind::FloatLit(value as f64)
                } else {
                    ExprKind::IntLit(value)
                };
                self.advance();
                Some(Expr::new(kind, span))
            }
            TokenKind::Float => {
                let value = self.float_lexeme_value();
                self.advance();
                Some(Expr::new(ExprKind::FloatLit(value), span))
            }
            TokenKind::Str => {
                let payload = unescape_string(self.lexeme());
                self.advance();
                Some(Expr::new(
                    ExprKind::StrLit(Symbol::intern(&payload)),
                    span,
                ))
            }
            TokenKind::KwTrue => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(true), span))
            }
            TokenKind::KwFalse => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(false), span))
            }
            TokenKind::KwNull => {
                self.advance();
                Some(Expr::new(ExprKind::Null, span))
            }
            TokenKind::Ident => {
                let name = self.symbol();
                self.advance();
                // `名称 { 字段: 值, ... }` is a struct literal.
                if self.at(TokenKind::LBrace) {
                    return self.parse_struct_literal(name, span);
                }
                Some(Expr::new(
                    ExprKind::Ident {
                        name,
                        binding: None,
                    },
                    span,
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen);
                Some(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(span, TokenKind::RBracket),
            TokenKind::LBrace => self.parse_array_literal(span, TokenKind::RBrace),
            TokenKind::KwReadMemory
            | TokenKind::KwWriteMemory
            | TokenKind::KwMemoryCopy
            | TokenKind::KwMemorySet
            | TokenKind::KwMapMemory
            | TokenKind::KwUnmapMemory => self.parse_memory_intrinsic(span),
            TokenKind::KwInlineAsm => self.parse_inline_asm(span),
            _ => {
                self.error(
                    codes::PARSE_INVALID_EXPR,
                    format!("语法错误：无效的表达式，遇到 '{}'", self.current().kind.name()),
                );
                None
            }
        }
    }

    /// `[e, e, ...]` or the C-style `{e, e, ...}` initializer list
    fn parse_array_literal(&mut self, start: Span, close: TokenKind) -> Option<Expr> {
        self.advance(); // opening bracket
        let mut elements = Vec::new();
        if !self.at(close) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.current().span;
        self.expect(close);
        Some(Expr::new(
            ExprKind::ArrayLit(elements),
            start.merge(end),
        ))
    }

    /// `名称 { 字段: 值, ... }` (the name token is already consumed)
    fn parse_struct_literal(&mut self, name: Symbol, start: Span) -> Option<Expr> {
        self.expect(TokenKind::LBrace);
        let mut fields = Vec::new();
        if !self.at(TokenKind::RBrace) {
            loop {
                if !self.at(TokenKind::Ident) {
                    self.error(
                        codes::PARSE_EXPECTED_TOKEN,
                        "语法错误：结构体字面量中缺少字段名",
                    );
                    return None;
                }
                let field_name = self.symbol();
                self.advance();
                self.expect(TokenKind::Colon);
                let value = self.parse_expression()?;
                fields.push(FieldInit {
                    name: field_name,
                    value,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.current().span;
        self.expect(TokenKind::RBrace);
        Some(Expr::new(
            ExprKind::StructLit { name, fields },
            start.merge(end),
        ))
    }

    /// The memory intrinsics have fixed argument shapes:
    /// `读取内存(地址)`, `写入内存(地址, 值)`, `内存复制(目标, 源, 大小)`,
    /// `内存设置(地址, 值, 大小)`, `映射内存(地址, 大小, 保护, 标志)`,
    /// `解除映射(地址, 大小)`.
    fn parse_memory_intrinsic(&mut self, start: Span) -> Option<Expr> {
        let keyword = self.current().kind;
        self.advance();
        self.expect(TokenKind::LParen);

        let kind = match keyword {
            TokenKind::KwReadMemory => {
                let addr = Box::new(self.parse_expression()?);
                ExprKind::MemoryRead { addr }
            }
            TokenKind::KwWriteMemory => {
                let addr = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let value = Box::new(self.parse_expression()?);
                ExprKind::MemoryWrite { addr, value }
            }
            TokenKind::KwMemoryCopy => {
                let dest = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let src = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let size = Box::new(self.parse_expression()?);
                ExprKind::MemoryCopy { dest, src, size }
            }
            TokenKind::KwMemorySet => {
                let addr = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let value = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let size = Box::new(self.parse_expression()?);
                ExprKind::MemorySet { addr, value, size }
            }
            TokenKind::KwMapMemory => {
                let addr = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let size = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let prot = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let flags = Box::new(self.parse_expression()?);
                ExprKind::MemoryMap {
                    addr,
                    size,
                    prot,
                    flags,
                }
            }
            _ => {
                let addr = Box::new(self.parse_expression()?);
                self.expect(TokenKind::Comma);
                let size = Box::new(self.parse_expression()?);
                ExprKind::MemoryUnmap { addr, size }
            }
        };

        let end = self.current().span;
        self.expect(TokenKind::RParen);
        Some(Expr::new(kind, start.merge(end)))
    }

    /// `内联汇编(code (, [outputs])? (, [inputs])? (, [clobbers])?)`
    ///
    /// Each operand group is a bracketed expression list so the groups
    /// cannot bleed into one another.
    fn parse_inline_asm(&mut self, start: Span) -> Option<Expr> {
        self.advance();
        self.expect(TokenKind::LParen);

        let code = Box::new(self.parse_expression()?);
        let mut groups: [Vec<Expr>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for group in groups.iter_mut() {
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.expect(TokenKind::LBracket);
            if !self.at(TokenKind::RBracket) {
                loop {
                    group.push(self.parse_expression()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBracket);
        }
        let [outputs, inputs, clobbers] = groups;

        let end = self.current().span;
        self.expect(TokenKind::RParen);
        Some(Expr::new(
            ExprKind::InlineAsm {
                code,
                outputs,
                inputs,
                clobbers,
            },
            start.merge(end),
        ))
    }

    // ---------------------------------------------------------------
    // Literal lexeme decoding
    // ---------------------------------------------------------------

    /// Decode the current integer token's lexeme, honoring base prefixes
    /// and ignoring any trailing suffix letters
    pub(crate) fn integer_lexeme_value(&self) -> i64 {
        let lexeme = self.lexeme();
        let bytes = lexeme.as_bytes();
        let (radix, digits) = if bytes.len() > 2 && bytes[0] == b'0' {
            match bytes[1] {
                b'x' | b'X' => (16, &lexeme[2..]),
                b'b' | b'B' => (2, &lexeme[2..]),
                b'o' | b'O' => (8, &lexeme[2..]),
                _ => (10, lexeme),
            }
        } else {
            (10, lexeme)
        };

        let end = digits
            .bytes()
            .position(|b| !(b as char).is_digit(radix))
            .unwrap_or(digits.len());
        i64::from_str_radix(&digits[..end], radix).unwrap_or(0)
    }

    /// Decode the current float token's lexeme, ignoring a trailing
    /// `f`/`F` suffix
    pub(crate) fn float_lexeme_value(&self) -> f64 {
        let lexeme = self.lexeme();
        let digits = lexeme.trim_end_matches(['f', 'F']);
        digits.parse().unwrap_or(0.0)
    }
}

/// Convert a quote-delimited string lexeme to its unescaped payload
///
/// Recognizes `\n`, `\r`, `\t`, `\\`, `\"`, `\0`; an unknown escape keeps
/// the backslash.
pub fn unescape_string(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
