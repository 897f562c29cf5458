// Common test utilities
//
// Each test binary compiles its own copy and uses only part of it.
#![allow(dead_code)]

pub mod cache;
pub mod fixtures;
pub mod harness;

pub use cache::*;
pub use fixtures::*;
pub use harness::*;
