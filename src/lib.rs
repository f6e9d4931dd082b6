//! Inspect and lightly transform cs files: structured NumPy arrays of
//! fixed-width, named columns sharing one row count.
//!
//! The binary front end lives in `main.rs`; everything it runs is here so
//! the operations can be driven and tested without a process.

pub mod cli;
pub mod color;
pub mod commands;
pub mod data;
pub mod error;
pub mod plot;
pub mod stats;

pub use data::model::StructuredArray;
pub use error::CsError;
