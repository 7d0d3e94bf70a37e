//! Unit test runner for async_runtime
//! This file makes cargo test discover the unit test modules

mod resolution_test;
