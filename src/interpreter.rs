use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};
use thiserror::Error;

use crate::ast::{BinaryOperator, Expr, ExprId, LiteralValue, LogicalOperator, Stmt, UnaryOperator};
use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::Environment;
use crate::error::{LoxError, RuntimeError};
use crate::resolver::Locals;
use crate::value::Value;

/// Ways a statement or expression can stop early.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// `print` could not write to the output sink.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Not an error: a `return` unwinding to the nearest call.  Caught by
    /// [`LoxFunction`]'s call and never seen above it.
    #[error("Return signal with value: {0}")]
    ReturnSignal(Value),
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

/// Tree‑walking evaluator.  Owns every piece of execution state, so
/// independent programs simply use independent interpreters.
pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: Locals,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` statements write to `out`, with
    /// native functions such as `clock` already defined.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let micros = Utc::now().timestamp_micros();
                    Ok(Value::Number(micros as f64 / 1_000_000.0))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Adds resolver output.  Maps from successive inputs accumulate, since
    /// closures from earlier inputs still refer to their own ids; the map is
    /// never pruned, so it grows with every input a session runs.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved reference(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program"), stopping at the first
    /// runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        debug!("Interpreting {} statements", statements.len());

        for (index, stmt) in statements.iter().enumerate() {
            debug!("Executing top-level statement {}", index);
            match self.execute(stmt) {
                Ok(()) => {}
                Err(InterpretError::Runtime(e)) => {
                    debug!("Runtime error: {}", e);
                    self.out.flush()?;
                    return Err(LoxError::Runtime(e));
                }
                Err(InterpretError::Io(e)) => return Err(LoxError::Io(e)),
                Err(InterpretError::ReturnSignal(_)) => {
                    unreachable!("'return' escaped to the top level; it must be rejected before execution")
                }
            }
        }

        self.out.flush()?;
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
                writeln!(self.out, "{}", value)?;
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.name, value);
                self.environment.borrow_mut().define(&name.name, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.name);
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.name, Value::Function(Rc::new(function)));
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(InterpretError::ReturnSignal(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.name);

                // Placeholder first, so methods can refer to the class.
                self.environment.borrow_mut().define(&name.name, Value::Nil);

                let superclass = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            return Err(RuntimeError::type_mismatch(
                                name.line,
                                "Superclass must be a class.",
                            )
                            .into())
                        }
                    },
                    None => None,
                };

                let enclosing = superclass.as_ref().map(|superclass| {
                    let mut environment =
                        Environment::with_enclosing(Rc::clone(&self.environment));
                    environment.define("super", Value::Class(Rc::clone(superclass)));
                    std::mem::replace(
                        &mut self.environment,
                        Rc::new(RefCell::new(environment)),
                    )
                });

                let methods = methods
                    .iter()
                    .map(|declaration| {
                        let function = LoxFunction::new(
                            Rc::clone(declaration),
                            Rc::clone(&self.environment),
                            declaration.name.name == INITIALIZER,
                        );
                        (declaration.name.name.clone(), Rc::new(function))
                    })
                    .collect();

                let class = LoxClass::new(name.name.clone(), superclass, methods);

                if let Some(enclosing) = enclosing {
                    self.environment = enclosing;
                }

                self.environment.borrow_mut().assign(
                    &name.name,
                    Value::Class(Rc::new(class)),
                    name.line,
                )?;
                Ok(())
            }
        }
    }

    /// Runs `statements` in `environment`, then puts the previous environment
    /// back whether they finished, returned or failed.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Environment) -> IResult<()> {
        let previous = std::mem::replace(
            &mut self.environment,
            Rc::new(RefCell::new(environment)),
        );

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        result
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

            Expr::Unary {
                operator,
                right,
                line,
            } => {
                let right = self.evaluate(right)?;
                Ok(evaluate_unary(*operator, right, *line)?)
            }

            Expr::Binary {
                left,
                operator,
                right,
                line,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(evaluate_binary(left, *operator, right, *line)?)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuits = match operator {
                    LogicalOperator::Or => left.is_truthy(),
                    LogicalOperator::And => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, &name.name, name.line),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => self.environment.borrow_mut().assign_at(
                        distance,
                        &name.name,
                        value.clone(),
                    ),
                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.name, value.clone(), name.line)?
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                line,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut argument_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                let Some(callable) = callee.as_callable() else {
                    return Err(RuntimeError::NotCallable { line: *line }.into());
                };

                if argument_values.len() != callable.arity() {
                    return Err(RuntimeError::ArityMismatch {
                        expected: callable.arity(),
                        got: argument_values.len(),
                        line: *line,
                    }
                    .into());
                }

                debug!("Calling {} with {} argument(s)", callee, argument_values.len());
                callable.call(self, argument_values, *line)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),
                _ => Err(RuntimeError::NotAnInstance { line: name.line }.into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::NotAnInstance { line: name.line }.into());
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(&name.name, value.clone());
                Ok(value)
            }

            Expr::This { id, line } => self.look_up_variable(*id, "this", *line),

            Expr::Super { id, line, method } => {
                let Some(&distance) = self.locals.get(id) else {
                    return Err(RuntimeError::UndefinedVariable {
                        name: "super".to_string(),
                        line: *line,
                    }
                    .into());
                };

                // `this` lives in the scope just inside the one holding `super`.
                let superclass = self.environment.borrow().get_at(distance, "super");
                let object = self.environment.borrow().get_at(distance - 1, "this");

                let (Value::Class(superclass), Value::Instance(instance)) = (superclass, object)
                else {
                    panic!(
                        "'super' at line {} resolved to slots that do not hold a class and an instance",
                        line
                    );
                };

                match superclass.find_method(&method.name) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
                    None => Err(RuntimeError::UndefinedProperty {
                        name: method.name.clone(),
                        line: method.line,
                    }
                    .into()),
                }
            }
        }
    }

    /// Resolved names are read from the exact scope the resolver chose;
    /// anything unresolved is a global.
    fn look_up_variable(&self, id: ExprId, name: &str, line: usize) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.borrow().get_at(distance, name)),
            None => Ok(self.globals.borrow().get(name, line)?),
        }
    }
}

fn evaluate_unary(operator: UnaryOperator, right: Value, line: usize) -> Result<Value, RuntimeError> {
    match (operator, right) {
        (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOperator::Plus, Value::Number(n)) => Ok(Value::Number(n)),
        (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOperator::Not, _) => Err(RuntimeError::type_mismatch(
            line,
            "Operand must be a boolean.",
        )),
        (_, _) => Err(RuntimeError::type_mismatch(line, "Operand must be a number.")),
    }
}

fn evaluate_binary(
    left: Value,
    operator: BinaryOperator,
    right: Value,
    line: usize,
) -> Result<Value, RuntimeError> {
    use BinaryOperator::*;

    match operator {
        Equal => return Ok(Value::Bool(left == right)),
        NotEqual => return Ok(Value::Bool(left != right)),
        Add => {
            return match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::type_mismatch(
                    line,
                    "Operands must be two numbers or two strings.",
                )),
            }
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(RuntimeError::type_mismatch(line, "Operands must be numbers."));
    };

    let value = match operator {
        Subtract => Value::Number(a - b),
        Multiply => Value::Number(a * b),
        Divide => Value::Number(a / b),
        Modulo => Value::Number(floored_modulo(a, b)),
        Less => Value::Bool(a < b),
        LessEqual => Value::Bool(a <= b),
        Greater => Value::Bool(a > b),
        GreaterEqual => Value::Bool(a >= b),
        Equal | NotEqual | Add => unreachable!("handled above"),
    };

    Ok(value)
}

/// Remainder with the sign of the divisor: `-7 % 3 == 2`, `7 % -3 == -2`.
fn floored_modulo(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}
