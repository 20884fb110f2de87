use std::fmt;
use std::rc::Rc;

use gc::{Finalize, Gc, Trace};
use log::debug;

use crate::ast::FunctionDecl;
use crate::callable::Callable;
use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::Result;
use crate::interpreter::{InterpretError, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// A user function or method: its declaration plus the environment it
/// closed over.
#[derive(Clone, Finalize, Trace)]
pub struct LoxFunction(Gc<FunctionImpl>);

#[derive(Finalize, Trace)]
struct FunctionImpl {
    #[unsafe_ignore_trace]
    declaration: Rc<FunctionDecl>,
    closure: Environment,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Environment, is_initializer: bool) -> Self {
        LoxFunction(Gc::new(FunctionImpl {
            declaration,
            closure,
            is_initializer,
        }))
    }

    /// A copy of this method whose closure has `this` bound to `instance`.
    /// Made fresh on every property access; nothing is cached.
    pub fn bind(&self, instance: LoxInstance) -> LoxFunction {
        let environment = Environment::with_enclosing(&self.0.closure);
        environment.define("this", Value::Instance(instance));

        LoxFunction::new(
            Rc::clone(&self.0.declaration),
            environment,
            self.0.is_initializer,
        )
    }

    /// The instance an initializer returns: `this` from the binding frame.
    fn bound_this(&self) -> Value {
        self.0.closure.get_at_str(0, "this").unwrap_or(Value::Nil)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.0.declaration.params.len()
    }

    fn name(&self) -> &str {
        &self.0.declaration.name.lexeme
    }

    fn call_unchecked(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _paren: &Token,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        // Chain to the closure, not to the caller's environment.
        let environment = Environment::with_enclosing(&self.0.closure);
        for (param, argument) in self.0.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let returned: Value = match interpreter.execute_block(&self.0.declaration.body, environment)
        {
            Ok(()) => Value::Nil,
            Err(InterpretError::Return(value, _)) => value,
            Err(InterpretError::Runtime(e)) => return Err(e),
        };

        if self.0.is_initializer {
            return Ok(self.bound_this());
        }

        Ok(returned)
    }
}

impl PartialEq for LoxFunction {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.0.is_initializer)
            .finish()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
