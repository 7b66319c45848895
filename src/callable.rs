//! The one capability shared by everything that can appear left of `(`:
//! user functions (closures), host functions, and classes.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::value::Value;

pub trait Callable {
    /// Number of arguments a call must supply.
    fn arity(&self) -> usize;

    /// Invoke with arguments already checked against [`Callable::arity`].
    /// `line` is the call site, for error reporting.
    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> IResult<Value>;
}

/// A function implemented by the host, such as `clock`.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        self: Rc<Self>,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);

        let result = (self.func)(&arguments)
            .map_err(|message| RuntimeError::Native { message, line })?;

        info!("Native function '{}' returned: {}", self.name, result);
        Ok(result)
    }
}

/// A user‑defined function or method together with the scope it closes over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.name
    }

    /// A copy of this method whose closure has one extra scope binding
    /// `this` to `instance`.  The declaration itself is shared, not cloned.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _line: usize,
    ) -> IResult<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        // Parameters live in a scope whose parent is the closure, not the
        // caller's environment.
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            debug!("Binding parameter '{}' to {}", param.name, argument);
            environment.define(&param.name, argument);
        }

        let result = interpreter.execute_block(&self.declaration.body, environment);

        match result {
            // An initializer hands back its instance however it finishes.
            Ok(()) | Err(InterpretError::ReturnSignal(_)) if self.is_initializer => {
                Ok(self.closure.borrow().get_at(0, "this"))
            }
            Ok(()) => Ok(Value::Nil),
            Err(InterpretError::ReturnSignal(value)) => {
                info!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }
}
