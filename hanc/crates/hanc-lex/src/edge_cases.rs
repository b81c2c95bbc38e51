//! Edge case tests for hanc-lex
