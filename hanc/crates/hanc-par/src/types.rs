//! Type expression parsing.
//!
//! `type := (整数|小数|布尔|字符串|无|内存地址|数组 element?|ident) '*'*`
//!
//! Trailing stars layer pointer wrappers from the inside out. The `数组`
//! keyword takes an optional primitive element type and always yields a
//! length-unknown array; C-style `[N]` declarator brackets are handled at
//! the declaration sites (see `stmt.rs`), wrapping from the innermost
//! dimension outward.

use crate::ty::Type;
use crate::Parser;
use hanc_lex::TokenKind;
use hanc_util::diagnostic::codes;

impl<'a> Parser<'a> {
    /// Whether the current token can start a type expression
    pub(crate) fn at_type_start(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::KwInt
                | TokenKind::KwFloat
                | TokenKind::KwBool
                | TokenKind::KwString
                | TokenKind::KwVoid
                | TokenKind::KwMemoryAddress
                | TokenKind::KwArray
                | TokenKind::Ident
        )
    }

    /// Parse a type expression, or report `parse_expected_token`
    pub(crate) fn parse_type(&mut self) -> Option<Type> {
        let mut ty = match self.current().kind {
            TokenKind::KwInt => {
                self.advance();
                Type::Int
            }
            TokenKind::KwFloat => {
                self.advance();
                Type::Float
            }
            TokenKind::KwBool => {
                self.advance();
                Type::Bool
            }
            TokenKind::KwString => {
                self.advance();
                Type::Str
            }
            TokenKind::KwVoid => {
                self.advance();
                Type::Void
            }
            TokenKind::KwMemoryAddress => {
                self.advance();
                Type::address()
            }
            TokenKind::KwArray => {
                self.advance();
                // Optional element type; defaults to int.
                let elem = match self.current().kind {
                    TokenKind::KwInt => {
                        self.advance();
                        Type::Int
                    }
                    TokenKind::KwFloat => {
                        self.advance();
                        Type::Float
                    }
                    TokenKind::KwString => {
                        self.advance();
                        Type::Str
                    }
                    TokenKind::KwBool => {
                        self.advance();
                        Type::Bool
                    }
                    _ => Type::Int,
                };
                Type::Array {
                    elem: Box::new(elem),
                    len: 0,
                }
            }
            TokenKind::Ident => {
                // A struct or enum name; classified during analysis.
                let name = self.symbol();
                self.advance();
                Type::Named(name)
            }
            _ => {
                self.error(codes::PARSE_EXPECTED_TOKEN, "语法错误：期望类型名称");
                return None;
            }
        };

        while self.eat(TokenKind::Star) {
            ty = Type::Pointer(Box::new(ty));
        }

        Some(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanc_lex::Lexer;
    use hanc_util::{FileId, Symbol};

    fn parse_type_of(source: &str) -> Option<Type> {
        let lexer = Lexer::new(source, FileId(0));
        let mut parser = Parser::new(lexer);
        parser.parse_type()
    }

    #[test]
    fn test_primitives() {
        assert_eq!(parse_type_of("整数"), Some(Type::Int));
        assert_eq!(parse_type_of("小数"), Some(Type::Float));
        assert_eq!(parse_type_of("布尔"), Some(Type::Bool));
        assert_eq!(parse_type_of("字符串"), Some(Type::Str));
        assert_eq!(parse_type_of("无"), Some(Type::Void));
    }

    #[test]
    fn test_pointer_layers() {
        assert_eq!(
            parse_type_of("整数*"),
            Some(Type::Pointer(Box::new(Type::Int)))
        );
        assert_eq!(
            parse_type_of("整数**"),
            Some(Type::Pointer(Box::new(Type::Pointer(Box::new(Type::Int)))))
        );
    }

    #[test]
    fn test_memory_address_is_untyped_pointer() {
        assert_eq!(parse_type_of("内存地址"), Some(Type::address()));
    }

    #[test]
    fn test_array_keyword() {
        assert_eq!(
            parse_type_of("数组 整数"),
            Some(Type::Array {
                elem: Box::new(Type::Int),
                len: 0
            })
        );
        assert_eq!(
            parse_type_of("数组 小数"),
            Some(Type::Array {
                elem: Box::new(Type::Float),
                len: 0
            })
        );
        // Element type defaults to int.
        assert_eq!(
            parse_type_of("数组"),
            Some(Type::Array {
                elem: Box::new(Type::Int),
                len: 0
            })
        );
    }

    #[test]
    fn test_named_type() {
        assert_eq!(
            parse_type_of("点"),
            Some(Type::Named(Symbol::intern("点")))
        );
        assert_eq!(
            parse_type_of("点*"),
            Some(Type::Pointer(Box::new(Type::Named(Symbol::intern("点")))))
        );
    }

    #[test]
    fn test_not_a_type() {
        assert_eq!(parse_type_of("+"), None);
    }
}
