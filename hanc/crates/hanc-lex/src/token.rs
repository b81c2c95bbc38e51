//! Token model.
//!
//! A token is (kind, byte span into the source, start line/column, numeric
//! suffix tag). The lexeme itself is never copied; callers slice the source
//! buffer through the span. Keyword kinds exist for exactly the lexemes the
//! lexer recognizes — the keyword table in `lib.rs` is the single source of
//! truth for the catalog.

use hanc_util::Span;

/// Numeric literal suffix tag
///
/// One of `f/F`, `L/l`, `LL/ll`, `U/u` and the U/L combinations, scanned
/// greedily after a numeric lexeme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NumberSuffix {
    #[default]
    None,
    /// `f` / `F` → 32-bit float
    Float,
    /// `L` / `l`
    Long,
    /// `LL` / `ll`
    LongLong,
    /// `U` / `u`
    Unsigned,
    /// `UL` / `LU`
    UnsignedLong,
    /// `ULL` / `LLU` / `LUL`
    UnsignedLongLong,
}

/// Lexical token kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Lexically invalid input; a diagnostic was pushed
    Invalid,
    /// End of input
    Eof,
    /// Identifier (any non-keyword name, including multi-byte ones)
    Ident,
    /// Integer literal (decimal, 0x, 0b or 0o)
    Integer,
    /// Float literal (decimal point and/or scientific exponent)
    Float,
    /// String literal, including the surrounding quotes
    Str,

    // Keywords (exact UTF-8 lexeme in parentheses)
    /// 如果
    KwIf,
    /// 否则
    KwElse,
    /// 函数
    KwFn,
    /// 返回
    KwReturn,
    /// 变量
    KwVar,
    /// 常量
    KwConst,
    /// 整数
    KwInt,
    /// 小数
    KwFloat,
    /// 布尔
    KwBool,
    /// 字符串
    KwString,
    /// 数组
    KwArray,
    /// 结构体
    KwStruct,
    /// 枚举
    KwEnum,
    /// 当
    KwWhile,
    /// 循环
    KwFor,
    /// 中断
    KwBreak,
    /// 继续
    KwContinue,
    /// 选择
    KwSwitch,
    /// 情况
    KwCase,
    /// 默认
    KwDefault,
    /// 真
    KwTrue,
    /// 假
    KwFalse,
    /// 空
    KwNull,
    /// 无
    KwVoid,
    /// 模块
    KwModule,
    /// 导入
    KwImport,
    /// 为
    KwAs,
    /// 命名空间 (reserved)
    KwNamespace,
    /// 接口 (reserved)
    KwInterface,
    /// 类 (reserved)
    KwClass,
    /// 模板 (reserved)
    KwTemplate,
    /// 静态 (reserved)
    KwStatic,
    /// 公开
    KwPublic,
    /// 私有
    KwPrivate,
    /// 保护 (reserved)
    KwProtected,
    /// 虚拟 (reserved)
    KwVirtual,
    /// 重写 (reserved)
    KwOverride,
    /// 抽象 (reserved)
    KwAbstract,
    /// 内存地址
    KwMemoryAddress,
    /// 读取内存
    KwReadMemory,
    /// 写入内存
    KwWriteMemory,
    /// 内存复制
    KwMemoryCopy,
    /// 内存设置
    KwMemorySet,
    /// 映射内存
    KwMapMemory,
    /// 解除映射
    KwUnmapMemory,
    /// 内联汇编
    KwInlineAsm,
    /// 中断处理
    KwInterruptHandler,

    // Operators and punctuation
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!`
    Bang,
    /// `!=`
    BangEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `->`
    Arrow,
}

impl TokenKind {
    /// Whether this kind is a keyword
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            KwIf | KwElse
                | KwFn
                | KwReturn
                | KwVar
                | KwConst
                | KwInt
                | KwFloat
                | KwBool
                | KwString
                | KwArray
                | KwStruct
                | KwEnum
                | KwWhile
                | KwFor
                | KwBreak
                | KwContinue
                | KwSwitch
                | KwCase
                | KwDefault
                | KwTrue
                | KwFalse
                | KwNull
                | KwVoid
                | KwModule
                | KwImport
                | KwAs
                | KwNamespace
                | KwInterface
                | KwClass
                | KwTemplate
                | KwStatic
                | KwPublic
                | KwPrivate
                | KwProtected
                | KwVirtual
                | KwOverride
                | KwAbstract
                | KwMemoryAddress
                | KwReadMemory
                | KwWriteMemory
                | KwMemoryCopy
                | KwMemorySet
                | KwMapMemory
                | KwUnmapMemory
                | KwInlineAsm
                | KwInterruptHandler
        )
    }

    /// Whether this keyword names a syntactically-accepted but
    /// unimplemented feature
    ///
    /// Encountering one of these at a top-level declaration position is a
    /// dedicated parse error; the token is consumed and parsing continues.
    pub fn is_reserved_feature(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            KwClass
                | KwInterface
                | KwTemplate
                | KwNamespace
                | KwStatic
                | KwPublic
                | KwPrivate
                | KwProtected
                | KwVirtual
                | KwOverride
                | KwAbstract
        )
    }

    /// Short human-readable name for diagnostics
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Invalid => "invalid",
            Eof => "end of input",
            Ident => "identifier",
            Integer => "integer literal",
            Float => "float literal",
            Str => "string literal",
            KwIf => "如果",
            KwElse => "否则",
            KwFn => "函数",
            KwReturn => "返回",
            KwVar => "变量",
            KwConst => "常量",
            KwInt => "整数",
            KwFloat => "小数",
            KwBool => "布尔",
            KwString => "字符串",
            KwArray => "数组",
            KwStruct => "结构体",
            KwEnum => "枚举",
            KwWhile => "当",
            KwFor => "循环",
            KwBreak => "中断",
            KwContinue => "继续",
            KwSwitch => "选择",
            KwCase => "情况",
            KwDefault => "默认",
            KwTrue => "真",
            KwFalse => "假",
            KwNull => "空",
            KwVoid => "无",
            KwModule => "模块",
            KwImport => "导入",
            KwAs => "为",
            KwNamespace => "命名空间",
            KwInterface => "接口",
            KwClass => "类",
            KwTemplate => "模板",
            KwStatic => "静态",
            KwPublic => "公开",
            KwPrivate => "私有",
            KwProtected => "保护",
            KwVirtual => "虚拟",
            KwOverride => "重写",
            KwAbstract => "抽象",
            KwMemoryAddress => "内存地址",
            KwReadMemory => "读取内存",
            KwWriteMemory => "写入内存",
            KwMemoryCopy => "内存复制",
            KwMemorySet => "内存设置",
            KwMapMemory => "映射内存",
            KwUnmapMemory => "解除映射",
            KwInlineAsm => "内联汇编",
            KwInterruptHandler => "中断处理",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Eq => "=",
            EqEq => "==",
            Bang => "!",
            BangEq => "!=",
            Lt => "<",
            LtEq => "<=",
            Gt => ">",
            GtEq => ">=",
            Shl => "<<",
            Shr => ">>",
            AndAnd => "&&",
            OrOr => "||",
            Amp => "&",
            Pipe => "|",
            Caret => "^",
            Tilde => "~",
            PlusPlus => "++",
            MinusMinus => "--",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Semicolon => ";",
            Comma => ",",
            Dot => ".",
            Colon => ":",
            Question => "?",
            Arrow => "->",
        }
    }
}

/// A lexical token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,
    /// Byte span of the lexeme, with the start line/column
    pub span: Span,
    /// Numeric suffix tag; `None` for non-numeric tokens
    pub suffix: NumberSuffix,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            suffix: NumberSuffix::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_feature_set() {
        assert!(TokenKind::KwClass.is_reserved_feature());
        assert!(TokenKind::KwVirtual.is_reserved_feature());
        assert!(!TokenKind::KwFn.is_reserved_feature());
        assert!(!TokenKind::KwModule.is_reserved_feature());
    }

    #[test]
    fn test_keyword_predicate() {
        assert!(TokenKind::KwInterruptHandler.is_keyword());
        assert!(!TokenKind::Ident.is_keyword());
        assert!(!TokenKind::Plus.is_keyword());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TokenKind::KwFn.name(), "函数");
        assert_eq!(TokenKind::Arrow.name(), "->");
    }
}
