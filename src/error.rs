//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Every variant renders with the `[ERROR]: ` prefix users see on stderr.
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[ERROR]: [line {line}] {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[ERROR]: [line {line}] {message}")]
    Parse { message: String, line: usize },

    /// Static‑analysis failure found by the resolver.
    #[error("[ERROR]: [line {line}] {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error.
    #[error("[ERROR]: {0}")]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error`.  Enables `?` on I/O ops.
    #[error("[ERROR]: {0}")]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error("[ERROR]: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Process exit status for a script run that failed with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => 65,
            LoxError::Runtime(_) => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
        }
    }
}

/// Dynamic failures raised while evaluating a program.
///
/// Each aborts the current top‑level input; global state mutated before the
/// failure is kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'. [line {line}]")]
    UndefinedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'. [line {line}]")]
    UndefinedProperty { name: String, line: usize },

    /// An operator or declaration received a value of the wrong type.
    #[error("{message} [line {line}]")]
    TypeMismatch { message: String, line: usize },

    #[error("Can only call functions and classes. [line {line}]")]
    NotCallable { line: usize },

    #[error("Expected {expected} arguments but got {got}. [line {line}]")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("Only instances have properties. [line {line}]")]
    NotAnInstance { line: usize },

    /// Failure reported by a host‑implemented function.
    #[error("{message} [line {line}]")]
    Native { message: String, line: usize },
}

impl RuntimeError {
    pub fn type_mismatch<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::TypeMismatch {
            message: msg.into(),
            line,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
