//! Shared test utilities for snmp-dispatch integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod fixtures;
mod recorder;

pub use fixtures::*;
pub use recorder::Recorder;
