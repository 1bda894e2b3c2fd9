//! Runtime error taxonomy.
use crate::syntax::error::ParseError;
use std::fmt;
use thiserror::Error;

/// An exception raised while evaluating a program.
///
/// Exceptions are raised synchronously and propagate with `?`. When an
/// exception escapes a statement it is wrapped exactly once into
/// [`Exception::Fatal`], which records the source of the failing statement.
#[derive(Debug, Error)]
pub enum Exception {
    /// A name was rejected by a symbol table's validator.
    #[error("{0}")]
    Symbol(String),

    #[error("Unknown symbol '{0}'")]
    SymbolUnknown(String),

    /// A name was declared twice in the same table.
    #[error("Symbol '{0}' is already defined")]
    SymbolContent(String),

    #[error("Cannot assign to a constant value")]
    ConstantValue,

    #[error("{caller}: '{name}' expects {expected} argument(s), received {actual}")]
    Arity {
        caller: String,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Operation '{operation}' not supported for '{type_name}'")]
    OperationNotSupported {
        type_name: String,
        operation: String,
    },

    #[error("{0}")]
    InvalidType(String),

    #[error("{0}")]
    Arithmetic(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error(transparent)]
    Fatal(Box<FatalError>),
}

impl Exception {
    /// The class name of this exception, as shown in fatal error reports.
    pub fn class_name(&self) -> &'static str {
        match self {
            Exception::Symbol(_) => "SymbolError",
            Exception::SymbolUnknown(_) => "SymbolUnknownError",
            Exception::SymbolContent(_) => "SymbolContentError",
            Exception::ConstantValue => "ConstantValueError",
            Exception::Arity { .. } => "ArityError",
            Exception::OperationNotSupported { .. } => "OperationNotSupportedError",
            Exception::InvalidType(_) => "InvalidTypeError",
            Exception::Arithmetic(_) => "ArithmeticError",
            Exception::Io(_) => "IOError",
            Exception::Syntax(_) => "SyntaxError",
            Exception::Fatal(_) => "FatalError",
        }
    }

    /// Whether this is a symbol error or one of its subclasses.
    pub fn is_symbol_error(&self) -> bool {
        matches!(self, Exception::Symbol(_) | Exception::SymbolUnknown(_) | Exception::SymbolContent(_))
    }

    /// The innermost exception, looking through any fatal wrapper.
    pub fn root_cause(&self) -> &Exception {
        match self {
            Exception::Fatal(fatal) => fatal.cause.root_cause(),
            other => other,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Exception::Fatal(_))
    }

    /// Wrap into a fatal error raised by the given statement source, unless
    /// this exception is already fatal.
    pub(crate) fn at(self, excerpt: &str) -> Exception {
        match self {
            Exception::Fatal(_) => self,
            cause => Exception::Fatal(Box::new(FatalError {
                cause,
                excerpt: excerpt.to_owned(),
            })),
        }
    }
}

/// An unrecoverable error that aborts the program.
#[derive(Debug)]
pub struct FatalError {
    pub cause: Exception,

    /// Source text of the statement that raised the error.
    pub excerpt: String,
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = self.cause.to_string();

        if message.is_empty() {
            write!(f, "{} at: {}", self.cause.class_name(), self.excerpt)
        } else {
            write!(f, "{}({}) at: {}", self.cause.class_name(), message, self.excerpt)
        }
    }
}

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
