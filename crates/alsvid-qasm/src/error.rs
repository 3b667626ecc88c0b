//! Error types for the QASM frontend.

use alsvid_ir::{IrError, Qubit};
use thiserror::Error;

/// Errors that can occur while parsing or emitting `OpenQASM` 2.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The lexer rejected a piece of input.
    #[error("l:{line} c:{col} msg: invalid token '{text}'")]
    Lexer {
        /// Line of the offending input.
        line: u32,
        /// Column of the offending input.
        col: u32,
        /// The rejected text.
        text: String,
    },

    /// Scanner or parser failure at a known position.
    #[error("l:{line} c:{col} msg: {message}")]
    Syntax {
        /// Line of the offending token.
        line: u32,
        /// Column of the offending token.
        col: u32,
        /// What went wrong.
        message: String,
    },

    /// Input ended while more tokens were expected.
    #[error("unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    /// Gate identifier neither defined nor inferrable.
    #[error("undefined gate '{0}'")]
    UndefinedGate(String),

    /// Wrong number of arguments or parameters for a gate.
    #[error("argument count mismatch: expected {expected}, got {got}")]
    ArgumentCountMismatch {
        /// Expected count.
        expected: usize,
        /// Provided count.
        got: usize,
    },

    /// Register-valued arguments of incompatible lengths.
    #[error("register sizes do not match")]
    RegisterSizeMismatch,

    /// Controlled operations cannot broadcast over whole registers.
    #[error("controlled operations over whole qubit registers are not supported")]
    CtrlRegisterUnsupported,

    /// A qubit occurs both as control and as target.
    #[error("qubit {0} cannot be control and target at the same time")]
    DuplicateQubit(Qubit),

    /// Unknown quantum or classical register.
    #[error("unknown register '{0}'")]
    UnknownRegister(String),

    /// Register index outside the register block.
    #[error("index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        /// Register name.
        register: String,
        /// Offending index.
        index: u64,
        /// Register size.
        size: u16,
    },

    /// An include path is already on the include stack.
    #[error("include cycle detected for '{0}'")]
    IncludeCycle(String),

    /// A gate parameter did not fold to a numeric constant.
    #[error("gate parameter does not evaluate to a constant")]
    NonConstantParameter,

    /// Error raised by a circuit edit.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// Failure reading an included file.
    #[error("failed to read include '{path}': {source}")]
    Include {
        /// The include path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
