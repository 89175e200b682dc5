//! Unit tests for the CLI runtime.

mod support;

mod run_tests;
