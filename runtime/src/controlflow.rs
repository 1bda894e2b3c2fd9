//! Helpers for navigating control flow within the interpreter.
//!
//! This is not exposed in the runtime API, as manipulating control flow is a
//! privileged operation.

use crate::Value;

/// Control flow is handled in the interpreter entirely using return values.
/// Errors travel separately through `Result`.
pub(crate) type ControlFlow<T = Value> = std::ops::ControlFlow<BreakAction, T>;

/// When performing an early exit of normal control flow, this is the action being
/// performed.
pub(crate) enum BreakAction {
    /// Break out of the closest function boundary with the given return value.
    /// This bubbles up through the stack until the nearest function invocation
    /// is reached.
    Return(Value),
}
