//! Edge case tests for hanc-par
