//! Variable storage: a chain of frames rooted at the global frame.
//!
//! Frames are traced `gc` handles rather than `Rc<RefCell<_>>`: closures
//! capture the frame they were defined in, and a method's captured frame
//! can (through the class stored in it) point back at the method itself.
//! Cloning an [`Environment`] clones the handle, so every holder observes
//! every mutation.

use std::collections::HashMap;

use gc::{Finalize, Gc, GcCell, Trace};
use log::{trace, warn};

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Default, Finalize, Trace)]
struct Frame {
    values: HashMap<String, Value>,
    enclosing: Option<Environment>,
}

#[derive(Debug, Clone, Finalize, Trace)]
pub struct Environment(Gc<GcCell<Frame>>);

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// A root frame (the globals).
    pub fn new() -> Self {
        Environment(Gc::new(GcCell::new(Frame::default())))
    }

    pub fn with_enclosing(enclosing: &Environment) -> Self {
        Environment(Gc::new(GcCell::new(Frame {
            values: HashMap::new(),
            enclosing: Some(enclosing.clone()),
        })))
    }

    pub fn enclosing(&self) -> Option<Environment> {
        self.0.borrow().enclosing.clone()
    }

    /// Insert or overwrite `name` in this frame.
    pub fn define(&self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);

        self.0.borrow_mut().values.insert(name.to_string(), value);
    }

    /// Search outward for `name`.
    pub fn get(&self, name: &Token) -> Result<Value> {
        let frame = self.0.borrow();

        if let Some(value) = frame.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match &frame.enclosing {
            Some(enclosing) => enclosing.get(name),
            None => Err(undefined(name)),
        }
    }

    /// Overwrite the nearest existing binding of `name`.
    pub fn assign(&self, name: &Token, value: Value) -> Result<()> {
        let mut frame = self.0.borrow_mut();

        if let Some(slot) = frame.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        match &frame.enclosing {
            Some(enclosing) => enclosing.assign(name, value),
            None => Err(undefined(name)),
        }
    }

    /// The frame exactly `distance` links out.  Distances come from the
    /// resolver, which guarantees the chain is at least that long.
    pub fn ancestor(&self, distance: usize) -> Environment {
        let mut environment = self.clone();

        for _ in 0..distance {
            let next = environment.enclosing();
            debug_assert!(
                next.is_some(),
                "resolved distance {} exceeds environment chain",
                distance
            );

            match next {
                Some(next) => environment = next,
                None => {
                    warn!("resolved distance {} exceeds environment chain", distance);
                    break;
                }
            }
        }

        environment
    }

    /// Read `name` from the frame `distance` links out, without searching.
    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Value> {
        self.get_at_str(distance, &name.lexeme)
            .ok_or_else(|| undefined(name))
    }

    /// Same as [`get_at`](Self::get_at) for the synthetic `this`/`super` names.
    pub fn get_at_str(&self, distance: usize, name: &str) -> Option<Value> {
        self.ancestor(distance).0.borrow().values.get(name).cloned()
    }

    pub fn assign_at(&self, distance: usize, name: &Token, value: Value) {
        self.ancestor(distance)
            .0
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().values.contains_key(name)
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
