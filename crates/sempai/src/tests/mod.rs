//! Unit tests for `sempai`.

mod support;


mod behaviour;
