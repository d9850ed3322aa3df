//! Textual MIR fixtures for the optimizer test harness.
//!
//! A fixture file is a sequence of attributed function definitions whose
//! bodies are written directly as basic blocks. The main compiler never
//! reads this format; only optimizer tests do.

pub mod mir;
pub mod parser;

pub use self::parser::{Test, TestFile};
