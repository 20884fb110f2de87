//! One interpreter session: scan → parse → resolve → interpret.
//!
//! A [`Lox`] keeps a single [`Interpreter`] alive across calls to
//! [`Lox::run`], so globals defined by one chunk of source are visible to
//! the next.  This is what the REPL relies on.
//!
//! Each phase only runs if the phases before it reported nothing.  Static
//! errors (lex, parse, resolve) are all reported; a runtime error stops the
//! rest of the chunk.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::error::{ErrorSink, LoxError, StderrSink};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Outcome of one [`Lox::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// A lex, syntax or resolution error; nothing was executed.
    StaticError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

impl RunStatus {
    /// Conventional process exit code (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::StaticError => 65,
            RunStatus::RuntimeError => 70,
        }
    }
}

pub struct Lox<S: ErrorSink = StderrSink> {
    interpreter: Interpreter,
    sink: S,
    had_error: bool,
    had_runtime_error: bool,
}

impl Default for Lox<StderrSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox<StderrSink> {
    /// Print to stdout, report to stderr.
    pub fn new() -> Self {
        Self::with_sink(StderrSink)
    }
}

impl<S: ErrorSink> Lox<S> {
    pub fn with_sink(sink: S) -> Self {
        info!("Lox session created");

        Lox {
            interpreter: Interpreter::new(),
            sink,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Send `print` output to `output` instead of stdout.
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.interpreter.set_output(output);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear both flags.  The REPL calls this between lines.
    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn run(&mut self, source: &str) -> RunStatus {
        debug!("Running {} byte(s) of source", source.len());

        let (tokens, lex_errors) = scan_tokens(source);
        self.report_static(&lex_errors);

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        self.report_static(&parser.take_errors());

        if self.had_error {
            info!("Static errors found, skipping resolution");
            return RunStatus::StaticError;
        }

        let resolve_errors = {
            let mut resolver = Resolver::new(&mut self.interpreter);
            resolver.resolve(&statements);
            if resolver.had_error() {
                resolver.discard();
            }
            resolver.take_errors()
        };
        self.report_static(&resolve_errors);

        if self.had_error {
            info!("Resolution errors found, skipping execution");
            return RunStatus::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                debug!("Runtime error: {}", e);
                self.sink.report_error(&e);
                self.had_runtime_error = true;
                RunStatus::RuntimeError
            }
        }
    }

    fn report_static(&mut self, errors: &[LoxError]) {
        for error in errors {
            self.sink.report_error(error);
            self.had_error = true;
        }
    }
}

/// An in-memory `print` target whose contents stay readable after it has
/// been handed to the interpreter.  Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Output split into lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
