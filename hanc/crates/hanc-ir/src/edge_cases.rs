//! Edge case tests for IR generation.
