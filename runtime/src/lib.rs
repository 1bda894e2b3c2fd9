//! The Cacti language runtime.
//!
//! Programs are parsed by `cacti-syntax` and evaluated directly from the
//! syntax tree. Every value is an object built from the same shape, and all
//! evaluation state lives in a single [`Runtime`].

mod builtins;
pub mod callable;
pub mod class;
mod controlflow;
mod eval;
pub mod exceptions;
mod foreign;
pub mod frame;
pub mod holder;
pub mod modules;
pub mod runtime;
pub mod table;
pub mod value;

// Re-export syntax crate.
pub mod syntax {
    pub use cacti_syntax::*;
}

pub mod prelude {
    pub use crate::exceptions::Exception;
    pub use crate::runtime::Runtime;
    pub use crate::value::Value;
}

pub use crate::builtins::Types;
pub use crate::exceptions::Exception;
pub use crate::foreign::ForeignFn;
pub use crate::runtime::Runtime;
pub use crate::value::Value;
