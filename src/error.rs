//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The module **does not** print diagnostics itself; that is the job of an
//! [`ErrorSink`].

use std::io;
use std::io::Write;
use thiserror::Error;

use log::debug;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is ` at 'lexeme'` or ` at end`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis failure (scope misuse found by the resolver).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error, carrying the line of the offending token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: token.location(),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: token.location(),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime { .. })
    }

    /// Source line the error points at.  `None` for I/O failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. }
            | LoxError::Runtime { line, .. } => Some(*line),
            LoxError::Io(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Destination for diagnostics produced by every phase of the pipeline.
pub trait ErrorSink {
    /// Report a single diagnostic.  `location` is the positional context
    /// (` at 'x'`, ` at end`, or empty).
    fn report(&mut self, line: usize, location: &str, message: &str);

    /// Report a runtime error.  Runtime errors print the message first and
    /// the line underneath it.
    fn report_runtime(&mut self, line: usize, message: &str);

    /// Route a [`LoxError`] to the matching report method.
    fn report_error(&mut self, error: &LoxError) {
        match error {
            LoxError::Lex { message, line } => self.report(*line, "", message),
            LoxError::Parse {
                message,
                location,
                line,
            }
            | LoxError::Resolve {
                message,
                location,
                line,
            } => self.report(*line, location, message),
            LoxError::Runtime { message, line } => self.report_runtime(*line, message),
            LoxError::Io(e) => self.report(0, "", &e.to_string()),
        }
    }
}

/// Writes diagnostics to standard error.
#[derive(Debug, Default)]
pub struct StderrSink;

impl ErrorSink for StderrSink {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        let _ = writeln!(io::stderr(), "[line {}] Error{}: {}", line, location, message);
    }

    fn report_runtime(&mut self, line: usize, message: &str) {
        let _ = writeln!(io::stderr(), "{}\n[line {}]", message, line);
    }
}

/// Keeps rendered diagnostics in memory, for embedders and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub lines: Vec<String>,
}

impl ErrorSink for CollectingSink {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        self.lines
            .push(format!("[line {}] Error{}: {}", line, location, message));
    }

    fn report_runtime(&mut self, line: usize, message: &str) {
        self.lines.push(format!("{}\n[line {}]", message, line));
    }
}
