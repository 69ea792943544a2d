//! Property-based tests for commit chains and HEAD state

mod chain;
