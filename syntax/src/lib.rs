//! The core Cacti syntax implementation.
//!
//! The provided parser turns source code into an abstract syntax tree, which
//! the runtime evaluates directly.

pub mod ast;
pub mod error;
mod grammar;
mod parser;
pub mod source;

pub use parser::parse;
