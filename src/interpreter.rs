use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error; // for custom errors

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::NativeFunction;
use crate::class::{LoxClass, INITIALIZER};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Ways evaluation can stop early.  `Return` is the non‑local exit of a
/// `return` statement (with its keyword, for locating a stray one) and is
/// caught only at the call boundary; anything
/// else that reaches the top level is a genuine runtime error.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Runtime(#[from] LoxError),

    #[error("Return signal with value: {0}")]
    Return(Value, Token),
}

/// Convenient alias for interpreter results.
pub type IResult<T> = std::result::Result<T, InterpretError>;

pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    /// Scope distance for every local reference, filled in by the resolver.
    /// Absent ids are globals, looked up by name at run time.
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter printing to stdout, with native functions
    /// such as `clock` already defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Like [`new`](Self::new), with `print` output sent to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new();

        debug!("Defining native function 'clock'");
        globals.define("clock", Value::Native(NativeFunction::clock()));

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Record that the reference `id` lives `depth` scopes out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Record that the reference `id` is global.
    pub fn note_global(&mut self, id: ExprId) {
        self.locals.remove(&id);
    }

    pub fn forget_local(&mut self, id: ExprId) {
        self.locals.remove(&id);
    }

    pub fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error stops the list; globals defined before it remain.
    pub fn interpret(&mut self, statements: &[Option<Stmt>]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements.iter().flatten() {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(InterpretError::Runtime(e)) => {
                    self.environment = self.globals.clone();
                    return Err(e);
                }
                Err(InterpretError::Return(_, keyword)) => {
                    self.environment = self.globals.clone();
                    return Err(LoxError::runtime(
                        &keyword,
                        "Can't return from top-level code.",
                    ));
                }
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value).map_err(LoxError::from)?;
                debug!("Printed value: {}", value);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.environment.define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)?;
                }
                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                // The current environment becomes the closure.
                let function =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);
                self.environment
                    .define(&declaration.name.lexeme, Value::Function(function));
                Ok(())
            }

            Stmt::Return { keyword, value } => {
                let value = match value {
                    Some(e) => self.evaluate(e)?,
                    None => Value::Nil,
                };
                Err(InterpretError::Return(value, keyword.clone()))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` inside `environment`, restoring the previous
    /// environment afterwards whether or not they complete normally.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Option<Stmt>],
        environment: Environment,
    ) -> IResult<()> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let result = statements
            .iter()
            .flatten()
            .try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<()> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass: Option<LoxClass> = match superclass {
            Some(expr) => match &self.evaluate(expr)? {
                Value::Class(class) => Some(class.clone()),
                _ => {
                    let token = match expr {
                        Expr::Variable { name: super_name, .. } => super_name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(token, "Superclass must be a class.").into());
                }
            },
            None => None,
        };

        self.environment.define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over one extra frame holding `super`.
        let method_env = match &superclass {
            Some(class) => {
                let environment = Environment::with_enclosing(&self.environment);
                environment.define("super", Value::Class(class.clone()));
                environment
            }
            None => self.environment.clone(),
        };

        let methods: HashMap<String, LoxFunction> = methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == INITIALIZER;
                let function = LoxFunction::new(method.clone(), method_env.clone(), is_initializer);
                (method.name.lexeme.clone(), function)
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);
        self.environment.assign(name, Value::Class(class))?;

        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                // Returns the deciding operand itself, not a coerced boolean.
                if operator.token_type == TokenType::OR {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                } else if !left.is_truthy() {
                    return Ok(left);
                }

                self.evaluate(right)
            }

            Expr::Variable { id, name } => Ok(self.look_up_variable(*id, name)?),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => self.environment.assign_at(distance, name, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Some(callable) = callee.as_callable() else {
                    return Err(
                        LoxError::runtime(paren, "Can only call functions and classes.").into(),
                    );
                };

                Ok(callable.call(self, values, paren)?)
            }

            Expr::Get { object, name } => match &self.evaluate(object)? {
                Value::Instance(instance) => Ok(instance.get(name)?),
                _ => Err(LoxError::runtime(name, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(ref instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields.").into());
                };

                let value = self.evaluate(value)?;
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => Ok(self.look_up_variable(*id, keyword)?),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// `super.method` binds the method found on the superclass captured when
    /// the enclosing class was declared, with `this` set to the current
    /// instance.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance = self.locals.get(&id).copied().ok_or_else(|| {
            LoxError::runtime(keyword, "Can't use 'super' outside of a class.")
        })?;

        let superclass = match &self.environment.get_at_str(distance, "super") {
            Some(Value::Class(class)) => class.clone(),
            _ => return Err(LoxError::runtime(keyword, "Superclass must be a class.").into()),
        };

        // `this` sits in the frame just inside the one holding `super`.
        let instance = match &self.environment.get_at_str(distance.saturating_sub(1), "this") {
            Some(Value::Instance(instance)) => instance.clone(),
            _ => {
                return Err(
                    LoxError::runtime(keyword, "Can't use 'super' outside of a class.").into(),
                )
            }
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(found.bind(instance))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> IResult<Value> {
        let right = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op, "Operand must be a number.").into()),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(LoxError::runtime(op, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        let value = match op.token_type {
            TokenType::PLUS => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => Value::String(format!("{}{}", a, b)),
                _ => {
                    return Err(LoxError::runtime(
                        op,
                        "Operands must be two numbers or two strings.",
                    )
                    .into())
                }
            },
            TokenType::MINUS => {
                let (a, b) = number_operands(op, &left, &right)?;
                Value::Number(a - b)
            }
            TokenType::STAR => {
                let (a, b) = number_operands(op, &left, &right)?;
                Value::Number(a * b)
            }
            TokenType::SLASH => {
                let (a, b) = number_operands(op, &left, &right)?;
                if b == 0.0 {
                    return Err(LoxError::runtime(op, "Cannot divide by zero.").into());
                }
                Value::Number(a / b)
            }
            TokenType::GREATER => {
                let (a, b) = number_operands(op, &left, &right)?;
                Value::Bool(a > b)
            }
            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(op, &left, &right)?;
                Value::Bool(a >= b)
            }
            TokenType::LESS => {
                let (a, b) = number_operands(op, &left, &right)?;
                Value::Bool(a < b)
            }
            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(op, &left, &right)?;
                Value::Bool(a <= b)
            }
            TokenType::EQUAL_EQUAL => Value::Bool(left == right),
            TokenType::BANG_EQUAL => Value::Bool(left != right),
            _ => return Err(LoxError::runtime(op, "Invalid binary operator.").into()),
        };

        Ok(value)
    }

    /// Resolved references read the exact frame the resolver chose;
    /// unresolved ones are globals, looked up by name.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => self.environment.get_at(distance, name),
            None => self.globals.get(name),
        }
    }
}

fn number_operands(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(op, "Operands must be numbers.")),
    }
}
