//! hanc-lex - Lexical Analyzer
//!
//! Transforms a UTF-8 source buffer into a stream of tokens on demand.
//! The lexer is pull-based and restartable: the same byte range always
//! yields the same token sequence, and no call allocates — every lexeme is
//! a byte span into the immutable input.
//!
//! Scanning rules:
//!
//! - ASCII whitespace and `//` line comments are skipped.
//! - A byte ≥ 0x80 starts or continues an identifier, as do ASCII letters
//!   and `_`; ASCII digits continue identifiers. Keywords are selected by
//!   exact UTF-8 byte comparison of the identifier lexeme against the
//!   keyword table, which is the authoritative catalog.
//! - Integer literals support `0x`/`0b`/`0o` base prefixes with required
//!   digit classes; a decimal sequence followed by `.digits` is a float,
//!   and a scientific exponent upgrades an integer lexeme to a float.
//!   Numeric suffixes (`f`, `L`, `LL`, `U` and combinations) are consumed
//!   greedily and recorded on the token.
//! - Strings run from `"` to `"` with `\` escaping the next byte; the raw
//!   lexeme keeps escapes (the parser decodes them once).
//! - Punctuation is maximal-munch: `==`, `<=`, `<<`, `&&`, `->`, `++` and
//!   friends win over their single-byte prefixes.
//!
//! Errors never stop the scan: a diagnostic is pushed, the offending byte
//! is consumed, and the token kind is [`TokenKind::Invalid`].

pub mod cursor;
mod edge_cases;
pub mod token;

pub use token::{NumberSuffix, Token, TokenKind};

use cursor::Cursor;
use hanc_util::diagnostic::codes;
use hanc_util::{DiagCode, DiagnosticSink, FileId, Span};

/// Select the keyword kind for an identifier lexeme
///
/// Returns `None` for ordinary identifiers. Comparison is by exact UTF-8
/// bytes; this table is the single source of truth for the keyword
/// catalog.
pub fn keyword_kind(lexeme: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match lexeme {
        "如果" => KwIf,
        "否则" => KwElse,
        "函数" => KwFn,
        "返回" => KwReturn,
        "变量" => KwVar,
        "常量" => KwConst,
        "整数" => KwInt,
        "小数" => KwFloat,
        "布尔" => KwBool,
        "字符串" => KwString,
        "数组" => KwArray,
        "结构体" => KwStruct,
        "枚举" => KwEnum,
        "当" => KwWhile,
        "循环" => KwFor,
        "中断" => KwBreak,
        "继续" => KwContinue,
        "选择" => KwSwitch,
        "情况" => KwCase,
        "默认" => KwDefault,
        "真" => KwTrue,
        "假" => KwFalse,
        "空" => KwNull,
        "无" => KwVoid,
        "模块" => KwModule,
        "导入" => KwImport,
        "为" => KwAs,
        "命名空间" => KwNamespace,
        "接口" => KwInterface,
        "类" => KwClass,
        "模板" => KwTemplate,
        "静态" => KwStatic,
        "公开" => KwPublic,
        "私有" => KwPrivate,
        "保护" => KwProtected,
        "虚拟" => KwVirtual,
        "重写" => KwOverride,
        "抽象" => KwAbstract,
        "内存地址" => KwMemoryAddress,
        "读取内存" => KwReadMemory,
        "写入内存" => KwWriteMemory,
        "内存复制" => KwMemoryCopy,
        "内存设置" => KwMemorySet,
        "映射内存" => KwMapMemory,
        "解除映射" => KwUnmapMemory,
        "内联汇编" => KwInlineAsm,
        "中断处理" => KwInterruptHandler,
        _ => return None,
    };
    Some(kind)
}

#[inline]
fn is_identifier_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic() || b >= 0x80
}

#[inline]
fn is_identifier_continue(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric() || b >= 0x80
}

/// The pull-based lexer
///
/// # Examples
///
/// ```
/// use hanc_lex::{Lexer, TokenKind};
/// use hanc_util::FileId;
///
/// let mut lexer = Lexer::new("函数 主程序() { 返回 0; }", FileId(0));
/// assert_eq!(lexer.next_token().kind, TokenKind::KwFn);
/// assert_eq!(lexer.next_token().kind, TokenKind::Ident);
/// ```
pub struct Lexer<'a> {
    source: &'a str,
    cursor: Cursor<'a>,
    file: FileId,
    diagnostics: Option<&'a DiagnosticSink>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over a source buffer
    pub fn new(source: &'a str, file: FileId) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
            file,
            diagnostics: None,
        }
    }

    /// Attach a diagnostics sink
    ///
    /// Without a sink, lexical errors still produce `Invalid` tokens but
    /// are not recorded anywhere.
    pub fn set_diagnostics(&mut self, sink: &'a DiagnosticSink) {
        self.diagnostics = Some(sink);
    }

    /// The source buffer this lexer reads from
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The file id stamped on every token span
    pub fn file(&self) -> FileId {
        self.file
    }

    /// Slice the lexeme of a token out of the source buffer
    pub fn lexeme(&self, token: &Token) -> &'a str {
        &self.source[token.span.start..token.span.end]
    }

    fn report(&self, code: DiagCode, message: String) {
        if let Some(sink) = self.diagnostics {
            sink.error(code, self.file, self.cursor.line(), self.cursor.column(), message);
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.cursor
                .advance_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'));
            if self.cursor.current() == b'/' && self.cursor.peek(1) == b'/' {
                self.cursor.advance_while(|b| b != b'\n');
                continue;
            }
            break;
        }
    }

    /// Produce the next token
    ///
    /// Returns an [`TokenKind::Eof`] token (with an empty span) once the
    /// input is exhausted, and keeps returning it thereafter.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.cursor.pos();
        let line = self.cursor.line();
        let column = self.cursor.column();

        let mut suffix = NumberSuffix::None;
        let kind = if self.cursor.is_eof() {
            TokenKind::Eof
        } else {
            let b = self.cursor.current();
            if b == b'"' {
                self.scan_string()
            } else if b.is_ascii_digit() {
                self.scan_number(&mut suffix)
            } else if is_identifier_start(b) {
                self.scan_identifier(start)
            } else {
                self.scan_operator(b)
            }
        };

        let span = Span::with_file(start, self.cursor.pos(), self.file, line, column);
        Token { kind, span, suffix }
    }

    fn scan_string(&mut self) -> TokenKind {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.current() {
                0 if self.cursor.is_eof() => {
                    self.report(
                        codes::LEX_UNTERMINATED_STRING,
                        "未终止的字符串字面量".to_string(),
                    );
                    return TokenKind::Invalid;
                }
                b'"' => {
                    self.cursor.advance();
                    return TokenKind::Str;
                }
                b'\\' => {
                    // Escape: the backslash protects the next byte, even a
                    // quote. A trailing backslash runs into EOF above.
                    self.cursor.advance();
                    if !self.cursor.is_eof() {
                        self.cursor.advance();
                    }
                }
                _ => self.cursor.advance(),
            }
        }
    }

    fn scan_number(&mut self, suffix: &mut NumberSuffix) -> TokenKind {
        if self.cursor.current() == b'0' {
            match self.cursor.peek(1) {
                b'x' | b'X' => return self.scan_radix_digits(16, suffix),
                b'b' | b'B' => return self.scan_radix_digits(2, suffix),
                b'o' | b'O' => return self.scan_radix_digits(8, suffix),
                _ => {}
            }
        }
        self.scan_decimal(suffix)
    }

    /// Scan `0x`/`0b`/`0o` literals: the prefix, then at least one digit of
    /// the base's class, then an optional integer suffix. A digit-class
    /// violation (`0b2`, `0o8`, bare `0x`) is a specific per-base error.
    fn scan_radix_digits(&mut self, radix: u32, suffix: &mut NumberSuffix) -> TokenKind {
        self.cursor.advance(); // '0'
        self.cursor.advance(); // base letter

        let (code, in_class): (DiagCode, fn(u8) -> bool) = match radix {
            16 => (codes::LEX_INVALID_HEX, |b| b.is_ascii_hexdigit()),
            8 => (codes::LEX_INVALID_OCTAL, |b| (b'0'..=b'7').contains(&b)),
            _ => (codes::LEX_INVALID_BINARY, |b| b == b'0' || b == b'1'),
        };

        if !in_class(self.cursor.current()) {
            self.report(code, format!("进制为 {radix} 的字面量至少需要一个有效数字"));
            return TokenKind::Invalid;
        }
        self.cursor.advance_while(in_class);

        // A decimal digit after the run means the digit class was violated
        // mid-literal (e.g. 0b102, 0o78).
        if self.cursor.current().is_ascii_digit() {
            self.report(code, format!("进制为 {radix} 的字面量包含无效数字"));
            return TokenKind::Invalid;
        }

        *suffix = self.scan_suffix();
        TokenKind::Integer
    }

    fn scan_decimal(&mut self, suffix: &mut NumberSuffix) -> TokenKind {
        self.cursor.advance_while(|b| b.is_ascii_digit());

        let mut is_float = false;
        if self.cursor.current() == b'.' && self.cursor.peek(1).is_ascii_digit() {
            self.cursor.advance(); // '.'
            self.cursor.advance_while(|b| b.is_ascii_digit());
            is_float = true;
        }

        match self.scan_exponent() {
            Exponent::Present => is_float = true,
            Exponent::MissingDigits => {
                self.report(
                    codes::LEX_INVALID_EXPONENT,
                    "科学计数法的指数部分缺少数字".to_string(),
                );
                return TokenKind::Invalid;
            }
            Exponent::Absent => {}
        }

        *suffix = self.scan_suffix();
        if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        }
    }

    /// Scan `[eE][+-]?digits`
    fn scan_exponent(&mut self) -> Exponent {
        if !matches!(self.cursor.current(), b'e' | b'E') {
            return Exponent::Absent;
        }
        self.cursor.advance();
        if matches!(self.cursor.current(), b'+' | b'-') {
            self.cursor.advance();
        }
        if !self.cursor.current().is_ascii_digit() {
            return Exponent::MissingDigits;
        }
        self.cursor.advance_while(|b| b.is_ascii_digit());
        Exponent::Present
    }

    /// Scan at most one numeric suffix sequence
    ///
    /// `f`/`F` wins immediately; otherwise up to one `U` and up to two `L`
    /// in any order (`UL`, `LU`, `ULL`, `LLU`, ...).
    fn scan_suffix(&mut self) -> NumberSuffix {
        if matches!(self.cursor.current(), b'f' | b'F') {
            self.cursor.advance();
            return NumberSuffix::Float;
        }

        let mut unsigned = false;
        let mut longs = 0u8;
        for _ in 0..3 {
            match self.cursor.current() {
                b'u' | b'U' if !unsigned => {
                    unsigned = true;
                    self.cursor.advance();
                }
                b'l' | b'L' if longs < 2 => {
                    longs += 1;
                    self.cursor.advance();
                }
                _ => break,
            }
        }

        match (unsigned, longs) {
            (true, 2) => NumberSuffix::UnsignedLongLong,
            (true, 1) => NumberSuffix::UnsignedLong,
            (true, 0) => NumberSuffix::Unsigned,
            (false, 2) => NumberSuffix::LongLong,
            (false, 1) => NumberSuffix::Long,
            _ => NumberSuffix::None,
        }
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        self.cursor.advance_while(is_identifier_continue);
        let lexeme = &self.source[start..self.cursor.pos()];
        keyword_kind(lexeme).unwrap_or(TokenKind::Ident)
    }

    fn scan_operator(&mut self, b: u8) -> TokenKind {
        use TokenKind::*;
        self.cursor.advance();
        match b {
            b'+' => {
                if self.cursor.current() == b'+' {
                    self.cursor.advance();
                    PlusPlus
                } else {
                    Plus
                }
            }
            b'-' => match self.cursor.current() {
                b'>' => {
                    self.cursor.advance();
                    Arrow
                }
                b'-' => {
                    self.cursor.advance();
                    MinusMinus
                }
                _ => Minus,
            },
            b'*' => Star,
            b'/' => Slash,
            b'%' => Percent,
            b'=' => {
                if self.cursor.current() == b'=' {
                    self.cursor.advance();
                    EqEq
                } else {
                    Eq
                }
            }
            b'!' => {
                if self.cursor.current() == b'=' {
                    self.cursor.advance();
                    BangEq
                } else {
                    Bang
                }
            }
            b'<' => match self.cursor.current() {
                b'<' => {
                    self.cursor.advance();
                    Shl
                }
                b'=' => {
                    self.cursor.advance();
                    LtEq
                }
                _ => Lt,
            },
            b'>' => match self.cursor.current() {
                b'>' => {
                    self.cursor.advance();
                    Shr
                }
                b'=' => {
                    self.cursor.advance();
                    GtEq
                }
                _ => Gt,
            },
            b'&' => {
                if self.cursor.current() == b'&' {
                    self.cursor.advance();
                    AndAnd
                } else {
                    Amp
                }
            }
            b'|' => {
                if self.cursor.current() == b'|' {
                    self.cursor.advance();
                    OrOr
                } else {
                    Pipe
                }
            }
            b'^' => Caret,
            b'~' => Tilde,
            b'(' => LParen,
            b')' => RParen,
            b'{' => LBrace,
            b'}' => RBrace,
            b'[' => LBracket,
            b']' => RBracket,
            b';' => Semicolon,
            b',' => Comma,
            b'.' => Dot,
            b':' => Colon,
            b'?' => Question,
            _ => {
                let message = if (32..127).contains(&b) {
                    format!("非法字符 '{}' (ASCII: {})", b as char, b)
                } else {
                    format!("非法字符 0x{b:02X}")
                };
                self.report(codes::LEX_INVALID_CHAR, message);
                Invalid
            }
        }
    }
}

#[derive(PartialEq)]
enum Exponent {
    Absent,
    Present,
    MissingDigits,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source, FileId(0));
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            kinds.push(token.kind);
        }
        kinds
    }

    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source, FileId(0));
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_keywords() {
        use TokenKind::*;
        assert_eq!(
            lex_kinds("如果 否则 函数 返回 变量 常量"),
            vec![KwIf, KwElse, KwFn, KwReturn, KwVar, KwConst]
        );
        assert_eq!(
            lex_kinds("整数 小数 布尔 字符串 数组 无 空"),
            vec![KwInt, KwFloat, KwBool, KwString, KwArray, KwVoid, KwNull]
        );
        assert_eq!(
            lex_kinds("当 循环 中断 继续 选择 情况 默认"),
            vec![KwWhile, KwFor, KwBreak, KwContinue, KwSwitch, KwCase, KwDefault]
        );
        assert_eq!(
            lex_kinds("模块 导入 为 公开 私有"),
            vec![KwModule, KwImport, KwAs, KwPublic, KwPrivate]
        );
    }

    #[test]
    fn test_intrinsic_keywords() {
        use TokenKind::*;
        assert_eq!(
            lex_kinds("读取内存 写入内存 内存复制 内存设置 映射内存 解除映射 内联汇编 中断处理 内存地址"),
            vec![
                KwReadMemory,
                KwWriteMemory,
                KwMemoryCopy,
                KwMemorySet,
                KwMapMemory,
                KwUnmapMemory,
                KwInlineAsm,
                KwInterruptHandler,
                KwMemoryAddress,
            ]
        );
    }

    #[test]
    fn test_reserved_keywords_tokenize() {
        use TokenKind::*;
        assert_eq!(
            lex_kinds("类 接口 模板 命名空间 静态 保护 虚拟 重写 抽象"),
            vec![
                KwClass, KwInterface, KwTemplate, KwNamespace, KwStatic, KwProtected, KwVirtual,
                KwOverride, KwAbstract
            ]
        );
    }

    #[test]
    fn test_chinese_identifier_is_not_keyword() {
        let tokens = lex_all("主程序 变量名x");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        let lexer = Lexer::new("主程序 变量名x", FileId(0));
        assert_eq!(lexer.lexeme(&tokens[0]), "主程序");
        assert_eq!(lexer.lexeme(&tokens[1]), "变量名x");
    }

    #[test]
    fn test_keyword_prefix_stays_identifier() {
        // 变量x continues past the keyword bytes, so it is one identifier.
        let tokens = lex_all("变量x");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
    }

    #[test]
    fn test_integers_and_bases() {
        use TokenKind::*;
        assert_eq!(lex_kinds("0 42 0x1F 0b1010 0o777"), vec![Integer; 5]);
    }

    #[test]
    fn test_floats() {
        use TokenKind::*;
        assert_eq!(lex_kinds("3.14 0.5 1e10 2.5e-3 1E+2"), vec![Float; 5]);
    }

    #[test]
    fn test_number_suffixes() {
        let tokens = lex_all("1f 2L 3ll 4u 5ul 6ULL 7LU 1.5f");
        let suffixes: Vec<_> = tokens.iter().map(|t| t.suffix).collect();
        assert_eq!(
            suffixes,
            vec![
                NumberSuffix::Float,
                NumberSuffix::Long,
                NumberSuffix::LongLong,
                NumberSuffix::Unsigned,
                NumberSuffix::UnsignedLong,
                NumberSuffix::UnsignedLongLong,
                NumberSuffix::UnsignedLong,
                NumberSuffix::Float,
            ]
        );
        assert_eq!(tokens[7].kind, TokenKind::Float);
    }

    #[test]
    fn test_invalid_binary_digit() {
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new("0b2", FileId(0));
        lexer.set_diagnostics(&sink);
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Invalid);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].code, codes::LEX_INVALID_BINARY);
    }

    #[test]
    fn test_invalid_hex_empty() {
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new("0x", FileId(0));
        lexer.set_diagnostics(&sink);
        assert_eq!(lexer.next_token().kind, TokenKind::Invalid);
        assert_eq!(sink.diagnostics()[0].code, codes::LEX_INVALID_HEX);
    }

    #[test]
    fn test_invalid_octal_digit_mid_literal() {
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new("0o78", FileId(0));
        lexer.set_diagnostics(&sink);
        assert_eq!(lexer.next_token().kind, TokenKind::Invalid);
        assert_eq!(sink.diagnostics()[0].code, codes::LEX_INVALID_OCTAL);
    }

    #[test]
    fn test_exponent_missing_digits() {
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new("1e+", FileId(0));
        lexer.set_diagnostics(&sink);
        assert_eq!(lexer.next_token().kind, TokenKind::Invalid);
        assert_eq!(sink.diagnostics()[0].code, codes::LEX_INVALID_EXPONENT);
    }

    #[test]
    fn test_string_literal() {
        let source = "\"你好\\\"世界\"";
        let tokens = lex_all(source);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        // The lexeme keeps the quotes and escapes.
        assert_eq!(tokens[0].span.start, 0);
        assert_eq!(tokens[0].span.end, source.len());
    }

    #[test]
    fn test_unterminated_string() {
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new("\"没有结束", FileId(0));
        lexer.set_diagnostics(&sink);
        assert_eq!(lexer.next_token().kind, TokenKind::Invalid);
        assert_eq!(sink.diagnostics()[0].code, codes::LEX_UNTERMINATED_STRING);
    }

    #[test]
    fn test_newline_in_string_is_legal() {
        let tokens = lex_all("\"第一行\n第二行\"");
        assert_eq!(tokens[0].kind, TokenKind::Str);
    }

    #[test]
    fn test_maximal_munch_operators() {
        use TokenKind::*;
        assert_eq!(
            lex_kinds("== != <= >= << >> && || ++ -- ->"),
            vec![EqEq, BangEq, LtEq, GtEq, Shl, Shr, AndAnd, OrOr, PlusPlus, MinusMinus, Arrow]
        );
        assert_eq!(lex_kinds("= ! < > & |"), vec![Eq, Bang, Lt, Gt, Amp, Pipe]);
    }

    #[test]
    fn test_single_char_operators() {
        use TokenKind::*;
        assert_eq!(
            lex_kinds("+ - * / % ^ ~ ( ) { } [ ] ; , . : ?"),
            vec![
                Plus, Minus, Star, Slash, Percent, Caret, Tilde, LParen, RParen, LBrace, RBrace,
                LBracket, RBracket, Semicolon, Comma, Dot, Colon, Question
            ]
        );
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(
            lex_kinds("1 // 注释 变量\n2"),
            vec![TokenKind::Integer, TokenKind::Integer]
        );
    }

    #[test]
    fn test_invalid_char_reported_and_consumed() {
        let sink = DiagnosticSink::new();
        let mut lexer = Lexer::new("@ 1", FileId(0));
        lexer.set_diagnostics(&sink);
        assert_eq!(lexer.next_token().kind, TokenKind::Invalid);
        assert_eq!(sink.diagnostics()[0].code, codes::LEX_INVALID_CHAR);
        // Scanning continues at the next byte.
        assert_eq!(lexer.next_token().kind, TokenKind::Integer);
    }

    #[test]
    fn test_position_tracking() {
        let tokens = lex_all("a\n  b");
        assert_eq!((tokens[0].span.line, tokens[0].span.column), (1, 1));
        assert_eq!((tokens[1].span.line, tokens[1].span.column), (2, 3));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("", FileId(0));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_restartable() {
        let source = "变量 x = 1;";
        let a: Vec<_> = {
            let mut lexer = Lexer::new(source, FileId(0));
            std::iter::from_fn(|| {
                let t = lexer.next_token();
                (t.kind != TokenKind::Eof).then_some((t.kind, t.span.start, t.span.end))
            })
            .collect()
        };
        let b: Vec<_> = {
            let mut lexer = Lexer::new(source, FileId(0));
            std::iter::from_fn(|| {
                let t = lexer.next_token();
                (t.kind != TokenKind::Eof).then_some((t.kind, t.span.start, t.span.end))
            })
            .collect()
        };
        assert_eq!(a, b);
    }
}
