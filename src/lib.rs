// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod error;
pub mod generator;
pub mod parser;
pub mod schema;
pub mod writer;

pub use error::GenerateError;
