//! Classes and their instances.

use std::collections::HashMap;
use std::fmt;

use gc::{Finalize, Gc, GcCell, Trace};
use log::debug;

use crate::callable::Callable;
use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Name of the method run when a class is called.
pub const INITIALIZER: &str = "init";

#[derive(Clone, Finalize, Trace)]
pub struct LoxClass(Gc<ClassImpl>);

#[derive(Finalize, Trace)]
struct ClassImpl {
    name: String,
    superclass: Option<LoxClass>,
    methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<LoxClass>,
        methods: HashMap<String, LoxFunction>,
    ) -> Self {
        LoxClass(Gc::new(ClassImpl {
            name: name.into(),
            superclass,
            methods,
        }))
    }

    /// Look `name` up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<LoxFunction> {
        if let Some(method) = self.0.methods.get(name) {
            return Some(method.clone());
        }

        self.0
            .superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

impl Callable for LoxClass {
    /// Arity of the initializer, or 0 without one.
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |initializer| initializer.arity())
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn call_unchecked(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", self.0.name);

        let instance = LoxInstance::new(self);

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(instance.clone())
                .call_unchecked(interpreter, arguments, paren)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl PartialEq for LoxClass {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass")
            .field("name", &self.0.name)
            .field("superclass", &self.0.superclass)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// One object created by calling a class.  Fields live on the instance;
/// methods stay on the class and are bound on access.
#[derive(Clone, Finalize, Trace)]
pub struct LoxInstance(Gc<GcCell<InstanceImpl>>);

#[derive(Finalize, Trace)]
struct InstanceImpl {
    class: LoxClass,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: &LoxClass) -> Self {
        LoxInstance(Gc::new(GcCell::new(InstanceImpl {
            class: class.clone(),
            fields: HashMap::new(),
        })))
    }

    pub fn class(&self) -> LoxClass {
        self.0.borrow().class.clone()
    }

    /// Fields shadow methods; a method is bound to this instance on each access.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.0.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match self.class().find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(method.bind(self.clone()))),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Always writes a field, even when a method has the same name.
    pub fn set(&self, name: &Token, value: Value) {
        self.0
            .borrow_mut()
            .fields
            .insert(name.lexeme.clone(), value);
    }
}

impl PartialEq for LoxInstance {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class().name().to_string())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class())
    }
}
