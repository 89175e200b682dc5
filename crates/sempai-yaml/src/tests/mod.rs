//! Unit tests for `sempai_yaml`.

mod convert_tests;
mod parser_tests;
