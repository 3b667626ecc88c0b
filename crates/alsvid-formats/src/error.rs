//! Error types for the auxiliary format importers.

use alsvid_ir::IrError;
use alsvid_qasm::ParseError;
use thiserror::Error;

/// Errors raised while importing REAL, TFC or GRCS files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// Structurally invalid file header.
    #[error("l:{line} msg: {message}")]
    BadHeader {
        /// Line of the offending input.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Header command not part of the format.
    #[error("l:{line} msg: unknown command '{command}'")]
    UnknownCommand {
        /// Line of the offending input.
        line: usize,
        /// The rejected command.
        command: String,
    },

    /// Gate identifier not part of the format.
    #[error("unknown gate identifier '{0}'")]
    UndefinedGate(String),

    /// Variable label not declared in the header.
    #[error("label '{0}' not found")]
    UnknownRegister(String),

    /// A gate line carries the wrong number of qubit operands.
    #[error("argument count mismatch: expected {expected}, got {got}")]
    ArgumentCountMismatch {
        /// Expected operand count.
        expected: usize,
        /// Provided operand count.
        got: usize,
    },

    /// Any other malformed line.
    #[error("l:{line} msg: {message}")]
    Syntax {
        /// Line of the offending input.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Import dispatch got an extension it does not know.
    #[error("extension '{0}' not recognized")]
    UnsupportedExtension(String),

    /// Failure reading the input file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error from the OpenQASM frontend.
    #[error(transparent)]
    Qasm(#[from] ParseError),

    /// Error from a circuit edit.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for importer operations.
pub type FormatResult<T> = Result<T, FormatError>;
