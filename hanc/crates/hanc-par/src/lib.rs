//! hanc-par - Parser (Syntactic Analyzer)
//!
//! A recursive-descent parser with exactly one token of lookahead, split
//! across modules by grammar area:
//!
//! - `lib.rs` — the [`Parser`] state machine, token plumbing, the
//!   top-level program loop and the reserved-keyword policy
//! - `items.rs` — functions, interrupt handlers, structs, enums, modules
//!   and imports
//! - `stmt.rs` — statements, blocks and the variable-declaration forms
//! - `expr.rs` — the expression precedence chain, literals and intrinsics
//! - `types.rs` — type expressions and C-style declarators
//!
//! Error policy: on a missing token the parser pushes a
//! `parse_expected_token` diagnostic, bumps its internal error counter
//! and continues AT the current token (nothing is consumed); callers
//! synchronize at statement and declaration boundaries. A reserved
//! keyword (class/interface/template/...) at a top-level declaration
//! position produces one dedicated `parse_reserved_feature` error, and
//! the whole declaration is skipped. `parse_program` succeeds iff the
//! error counter is zero.

pub mod ast;
mod edge_cases;
mod expr;
mod items;
mod stmt;
pub mod ty;
mod types;

pub use ast::*;
pub use ty::{EnumMember, StructField, Type};

use hanc_lex::{Lexer, Token, TokenKind};
use hanc_util::diagnostic::codes;
use hanc_util::{DiagCode, DiagnosticSink, Symbol};

/// The recursive-descent parser
///
/// # Examples
///
/// ```
/// use hanc_lex::Lexer;
/// use hanc_par::Parser;
/// use hanc_util::FileId;
///
/// let lexer = Lexer::new("函数 主程序() { 返回 0; }", FileId(0));
/// let mut parser = Parser::new(lexer);
/// let (program, ok) = parser.parse_program();
/// assert!(ok);
/// assert_eq!(program.functions.len(), 1);
/// ```
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    diagnostics: Option<&'a DiagnosticSink>,
    errors: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser over a lexer, priming the one-token lookahead
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            diagnostics: None,
            errors: 0,
        }
    }

    /// Attach a diagnostics sink
    pub fn set_diagnostics(&mut self, sink: &'a DiagnosticSink) {
        self.diagnostics = Some(sink);
    }

    /// Number of parse errors reported so far
    pub fn error_count(&self) -> usize {
        self.errors
    }

    // ---------------------------------------------------------------
    // Token plumbing
    // ---------------------------------------------------------------

    pub(crate) fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    pub(crate) fn current(&self) -> &Token {
        &self.current
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token if it has the given kind
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require the current token kind; on mismatch report and do NOT
    /// consume, so the caller can resynchronize
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(
            codes::PARSE_EXPECTED_TOKEN,
            format!(
                "语法错误：期望 '{}'，但遇到 '{}'",
                kind.name(),
                self.current.kind.name()
            ),
        );
        false
    }

    /// The current token's lexeme
    pub(crate) fn lexeme(&self) -> &'a str {
        let span = self.current.span;
        &self.lexer.source()[span.start..span.end]
    }

    /// Intern the current token's lexeme
    pub(crate) fn symbol(&self) -> Symbol {
        Symbol::intern(self.lexeme())
    }

    pub(crate) fn error(&mut self, code: DiagCode, message: impl Into<String>) {
        self.errors += 1;
        if let Some(sink) = self.diagnostics {
            sink.error(
                code,
                self.lexer.file(),
                self.current.span.line,
                self.current.span.column,
                message,
            );
        }
    }

    // ---------------------------------------------------------------
    // Program
    // ---------------------------------------------------------------

    /// Parse a whole source file
    ///
    /// Always returns a program (possibly partial); `ok` is true iff no
    /// parse error was reported.
    pub fn parse_program(&mut self) -> (Program, bool) {
        let mut program = Program::default();

        while !self.at(TokenKind::Eof) {
            match self.current.kind {
                TokenKind::KwImport => {
                    if let Some(import) = self.parse_import() {
                        program.imports.push(import);
                    } else {
                        self.synchronize_top_level();
                    }
                }
                TokenKind::KwModule => {
                    if let Some(module) = self.parse_module() {
                        program.modules.push(module);
                    } else {
                        self.synchronize_top_level();
                    }
                }
                TokenKind::KwStruct => {
                    if let Some(decl) = self.parse_struct() {
                        program.structs.push(decl);
                    } else {
                        self.synchronize_top_level();
                    }
                }
                TokenKind::KwEnum => {
                    if let Some(decl) = self.parse_enum() {
                        program.enums.push(decl);
                    } else {
                        self.synchronize_top_level();
                    }
                }
                TokenKind::KwFn => {
                    if let Some(func) = self.parse_function() {
                        program.functions.push(func);
                    } else {
                        self.synchronize_top_level();
                    }
                }
                TokenKind::KwInterruptHandler => {
                    if let Some(func) = self.parse_interrupt_handler() {
                        program.functions.push(func);
                    } else {
                        self.synchronize_top_level();
                    }
                }
                kind if kind.is_reserved_feature() => self.skip_reserved_declaration(),
                TokenKind::KwVar
                | TokenKind::KwConst
                | TokenKind::KwInt
                | TokenKind::KwFloat
                | TokenKind::KwBool
                | TokenKind::KwString
                | TokenKind::KwArray
                | TokenKind::KwMemoryAddress
                | TokenKind::Ident => {
                    if let Some(decl) = self.parse_var_decl() {
                        program.globals.push(decl);
                    } else {
                        self.synchronize_top_level();
                    }
                }
                _ => {
                    self.error(
                        codes::PARSE_EXPECTED_TOKEN,
                        format!("语法错误：期望顶层声明，但遇到 '{}'", self.current.kind.name()),
                    );
                    self.advance();
                }
            }
        }

        (program, self.errors == 0)
    }

    /// Report a reserved (unimplemented) feature keyword and skip the
    /// whole declaration so exactly one diagnostic is produced
    fn skip_reserved_declaration(&mut self) {
        let keyword = self.current.kind.name();
        self.error(
            codes::PARSE_RESERVED_FEATURE,
            format!("'{keyword}' 是保留功能，尚未实现"),
        );
        self.advance();

        // Name and body, when present, belong to the skipped feature.
        if self.at(TokenKind::Ident) {
            self.advance();
        }
        if self.at(TokenKind::LBrace) {
            self.skip_balanced_braces();
        }
        self.eat(TokenKind::Semicolon);
    }

    /// Consume a balanced `{ ... }` group
    pub(crate) fn skip_balanced_braces(&mut self) {
        debug_assert!(self.at(TokenKind::LBrace));
        let mut depth = 0usize;
        loop {
            match self.current.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the next plausible top-level declaration start
    fn synchronize_top_level(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Eof
                | TokenKind::KwFn
                | TokenKind::KwStruct
                | TokenKind::KwEnum
                | TokenKind::KwModule
                | TokenKind::KwImport
                | TokenKind::KwInterruptHandler => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                _ => self.advance(),
            }
        }
    }

    /// Skip to the end of the current statement
    pub(crate) fn synchronize_statement(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Eof | TokenKind::RBrace => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                _ => self.advance(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanc_util::FileId;

    fn parse(source: &str) -> (Program, bool) {
        let lexer = Lexer::new(source, FileId(0));
        let mut parser = Parser::new(lexer);
        parser.parse_program()
    }

    fn parse_with_sink(source: &str, sink: &DiagnosticSink) -> (Program, bool) {
        let lexer = Lexer::new(source, FileId(0));
        let mut parser = Parser::new(lexer);
        parser.set_diagnostics(sink);
        parser.parse_program()
    }

    #[test]
    fn test_minimal_program() {
        let (program, ok) = parse("函数 主程序() { 返回 0; }");
        assert!(ok);
        assert_eq!(program.functions.len(), 1);
        let f = &program.functions[0];
        assert_eq!(f.name.as_str(), "主程序");
        assert_eq!(f.body.stmts.len(), 1);
        assert!(matches!(f.body.stmts[0].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn test_function_with_params_and_return_type() {
        let (program, ok) = parse("函数 加(整数 a, 整数 b) -> 整数 { 返回 a + b; }");
        assert!(ok);
        let f = &program.functions[0];
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].name.as_str(), "a");
        assert_eq!(f.ret, Some(Type::Int));
    }

    #[test]
    fn test_empty_program() {
        let (program, ok) = parse("");
        assert!(ok);
        assert!(program.functions.is_empty());
    }

    #[test]
    fn test_reserved_keyword_single_diagnostic() {
        let sink = DiagnosticSink::new();
        let (program, ok) = parse_with_sink("类 C { }", &sink);
        assert!(!ok);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].code, codes::PARSE_RESERVED_FEATURE);
        assert!(program.structs.is_empty());
        assert!(program.functions.is_empty());
    }

    #[test]
    fn test_reserved_keyword_then_valid_decl() {
        let sink = DiagnosticSink::new();
        let (program, ok) = parse_with_sink("接口 I { } 函数 f() { }", &sink);
        assert!(!ok);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(program.functions.len(), 1);
    }

    #[test]
    fn test_missing_token_does_not_consume() {
        let sink = DiagnosticSink::new();
        // Missing ')' after the condition: the parser reports and carries
        // on at the '{'.
        let (program, ok) = parse_with_sink("函数 f() { 如果 (1 { 返回 0; } }", &sink);
        assert!(!ok);
        assert!(sink.error_count() >= 1);
        assert_eq!(program.functions.len(), 1);
    }

    #[test]
    fn test_global_var_decl() {
        let (program, ok) = parse("整数 全局 = 42;");
        assert!(ok);
        assert_eq!(program.globals.len(), 1);
        assert_eq!(program.globals[0].declared_type, Some(Type::Int));
    }

    #[test]
    fn test_ok_requires_zero_errors() {
        let sink = DiagnosticSink::new();
        let (_, ok) = parse_with_sink("函数 f( { }", &sink);
        assert!(!ok);
    }

    #[test]
    fn test_progress_on_garbage() {
        // Must terminate and report, never loop (position monotonicity).
        let sink = DiagnosticSink::new();
        let (_, ok) = parse_with_sink("; ; -> ??", &sink);
        assert!(!ok);
        assert!(sink.error_count() >= 1);
    }
}
