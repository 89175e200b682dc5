//! Unit tests for `sempai_core` types.

mod source_tests;

mod behaviour;
