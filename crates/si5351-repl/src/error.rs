//! Error types for the menu

use thiserror::Error;

/// Errors that can occur in the menu
#[derive(Error, Debug)]
pub enum ReplError {
    /// I/O error (reading/writing stdin/stdout)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line editor failure
    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// Command line could not be parsed
    #[error("{0}")]
    InvalidCommand(String),
}
