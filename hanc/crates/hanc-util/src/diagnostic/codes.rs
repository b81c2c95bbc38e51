//! Diagnostic code catalog.
//!
//! Codes are grouped by subsystem range:
//!
//! | Range     | Subsystem |
//! |-----------|-----------|
//! | 1000–1099 | lexer     |
//! | 1100–1999 | parser    |
//! | 2000–2999 | semantic analysis |
//! | 3000–3999 | static / freestanding checks |

/// A numeric diagnostic code with a stable name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DiagCode {
    /// Numeric code within the subsystem range
    pub number: u32,
    /// Stable machine-readable name
    pub name: &'static str,
}

impl DiagCode {
    pub const fn new(number: u32, name: &'static str) -> Self {
        Self { number, name }
    }

    /// The subsystem this code belongs to, derived from its range
    pub fn subsystem(&self) -> Subsystem {
        match self.number {
            1000..=1099 => Subsystem::Lex,
            1100..=1999 => Subsystem::Parse,
            2000..=2999 => Subsystem::Sem,
            3000..=3999 => Subsystem::Check,
            _ => Subsystem::Unknown,
        }
    }
}

impl std::fmt::Display for DiagCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}({})", self.number, self.name)
    }
}

/// Compiler subsystem that owns a diagnostic code range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subsystem {
    Lex,
    Parse,
    Sem,
    Check,
    Unknown,
}

// Lexer: 1000–1099
pub const LEX_INVALID_CHAR: DiagCode = DiagCode::new(1001, "lex_invalid_char");
pub const LEX_UNTERMINATED_STRING: DiagCode = DiagCode::new(1002, "lex_unterminated_string");
pub const LEX_INVALID_HEX: DiagCode = DiagCode::new(1003, "lex_invalid_hex");
pub const LEX_INVALID_BINARY: DiagCode = DiagCode::new(1004, "lex_invalid_binary");
pub const LEX_INVALID_OCTAL: DiagCode = DiagCode::new(1005, "lex_invalid_octal");
pub const LEX_INVALID_EXPONENT: DiagCode = DiagCode::new(1006, "lex_invalid_exponent");

// Parser: 1100–1999
pub const PARSE_EXPECTED_TOKEN: DiagCode = DiagCode::new(1101, "parse_expected_token");
pub const PARSE_INVALID_EXPR: DiagCode = DiagCode::new(1102, "parse_invalid_expr");
pub const PARSE_RESERVED_FEATURE: DiagCode = DiagCode::new(1103, "parse_reserved_feature");
pub const PARSE_INVALID_VAR_DECL: DiagCode = DiagCode::new(1104, "parse_invalid_var_decl");
pub const PARSE_INVALID_DECL_NAME: DiagCode = DiagCode::new(1105, "parse_invalid_decl_name");
pub const PARSE_INVALID_INTERRUPT_VECTOR: DiagCode =
    DiagCode::new(1106, "parse_invalid_interrupt_vector");

// Semantic analysis: 2000–2999
pub const SEM_DUPLICATE_SYMBOL: DiagCode = DiagCode::new(2001, "sem_duplicate_symbol");
pub const SEM_UNDEFINED_IDENTIFIER: DiagCode = DiagCode::new(2002, "sem_undefined_identifier");
pub const SEM_TYPE_MISMATCH: DiagCode = DiagCode::new(2003, "sem_type_mismatch");
pub const SEM_ARGUMENT_COUNT_MISMATCH: DiagCode =
    DiagCode::new(2004, "sem_argument_count_mismatch");
pub const SEM_BREAK_CONTINUE_OUTSIDE_LOOP: DiagCode =
    DiagCode::new(2005, "sem_break_continue_outside_loop");
pub const SEM_PRIVATE_ACCESS: DiagCode = DiagCode::new(2006, "sem_private_access");
pub const SEM_NOT_CALLABLE: DiagCode = DiagCode::new(2007, "sem_not_callable");
pub const SEM_INVALID_ASSIGNMENT_TARGET: DiagCode =
    DiagCode::new(2008, "sem_invalid_assignment_target");
pub const SEM_CONST_ASSIGNMENT: DiagCode = DiagCode::new(2009, "sem_const_assignment");
pub const SEM_UNKNOWN_FIELD: DiagCode = DiagCode::new(2010, "sem_unknown_field");
pub const SEM_UNKNOWN_MEMBER: DiagCode = DiagCode::new(2011, "sem_unknown_member");
pub const SEM_NOT_A_MODULE: DiagCode = DiagCode::new(2012, "sem_not_a_module");
pub const SEM_INVALID_OPERAND: DiagCode = DiagCode::new(2013, "sem_invalid_operand");
pub const SEM_DUPLICATE_CASE: DiagCode = DiagCode::new(2014, "sem_duplicate_case");
pub const SEM_MULTIPLE_DEFAULTS: DiagCode = DiagCode::new(2015, "sem_multiple_defaults");

// Static / freestanding checks: 3000–3999
pub const CHECK_FREESTANDING_FORBIDDEN: DiagCode =
    DiagCode::new(3001, "check_freestanding_forbidden");
pub const CHECK_UNUSED_VAR: DiagCode = DiagCode::new(3010, "check_unused_var");
pub const CHECK_UNUSED_PARAM: DiagCode = DiagCode::new(3011, "check_unused_param");
pub const CHECK_COMPLEXITY: DiagCode = DiagCode::new(3012, "check_complexity");
