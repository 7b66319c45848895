//! Runtime scope chain.
//!
//! One `Environment` per executed block and per call, linked to its parent.
//! Scopes are shared (`Rc<RefCell<_>>`) because a closure keeps the scope it
//! was defined in alive after the block that created it has finished.

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Creates or overwrites `name` in this scope.  Never fails.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up here, then along the parent chain.
    pub fn get(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }

    /// Updates the nearest scope that already holds `name`.  Assignment never
    /// creates a binding.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }

    /// Reads `name` from the scope exactly `distance` hops up, without
    /// searching.
    ///
    /// # Panics
    ///
    /// If the chain is shorter than `distance` or the target scope lacks
    /// `name`.  Distances come from the resolver, so either case means the
    /// resolver and interpreter disagree about scope layout.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        if distance == 0 {
            match self.values.get(name) {
                Some(value) => value.clone(),
                None => panic!("resolved variable '{}' missing from its scope", name),
            }
        } else {
            self.parent(distance, name).borrow().get_at(distance - 1, name)
        }
    }

    /// Writes `name` in the scope exactly `distance` hops up.
    ///
    /// # Panics
    ///
    /// Under the same conditions as [`Environment::get_at`].
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) {
        if distance == 0 {
            match self.values.get_mut(name) {
                Some(slot) => *slot = value,
                None => panic!("resolved variable '{}' missing from its scope", name),
            }
        } else {
            self.parent(distance, name)
                .borrow_mut()
                .assign_at(distance - 1, name, value);
        }
    }

    fn parent(&self, distance: usize, name: &str) -> &Rc<RefCell<Environment>> {
        match &self.enclosing {
            Some(enclosing) => enclosing,
            None => panic!(
                "scope chain too short: '{}' resolved {} hop(s) beyond the globals",
                name, distance
            ),
        }
    }
}
