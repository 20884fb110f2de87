//! The capability shared by everything a call expression can invoke:
//! host functions, user functions, and classes acting as constructors.

use std::fmt;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use gc::{Finalize, Trace};
use log::debug;

use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    /// Run the callee.  Arguments have already been checked against
    /// [`arity`](Callable::arity).
    fn call_unchecked(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value>;

    /// Check the argument count, then run the callee.  A mismatch is raised
    /// before any parameter is bound.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        if arguments.len() != self.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    self.arity(),
                    arguments.len()
                ),
            ));
        }

        self.call_unchecked(interpreter, arguments, paren)
    }
}

/// Signature of a host function body.  Errors are plain messages; the
/// caller attaches the line of the call site.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// A function provided by the host rather than written in Lox.
#[derive(Clone, Finalize, Trace)]
pub struct NativeFunction {
    #[unsafe_ignore_trace]
    name: &'static str,
    arity: usize,
    #[unsafe_ignore_trace]
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: usize, func: NativeFn) -> Self {
        Self { name, arity, func }
    }

    /// `clock()`: wall‑clock seconds since the Unix epoch.
    pub fn clock() -> Self {
        Self::new("clock", 0, |_args: &[Value]| {
            let timestamp: f64 = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                .as_secs_f64();
            Ok(Value::Number(timestamp))
        })
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn name(&self) -> &str {
        self.name
    }

    fn call_unchecked(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|message| LoxError::runtime(paren, message))
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}
