#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::LoxError;
use rox::Lox;

/// A `Write` sink whose contents the test can read after handing a clone to
/// the interpreter.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A fresh session plus a handle on everything it prints.
pub fn session() -> (Lox, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let lox = Lox::with_output(Box::new(buffer.clone()));
    (lox, buffer)
}

/// Runs `source` in a fresh session; returns printed output and the outcome.
pub fn run(source: &str) -> (String, Result<(), Vec<LoxError>>) {
    let (mut lox, buffer) = session();
    let result = lox.run(source);
    (buffer.contents(), result)
}

/// Runs `source`, which must succeed, and returns its printed lines.
pub fn output_of(source: &str) -> Vec<String> {
    let (output, result) = run(source);
    if let Err(errors) = result {
        panic!("program failed: {:?}\noutput so far:\n{}", errors, output);
    }
    output.lines().map(str::to_string).collect()
}

/// Runs `source`, which must fail, and returns its errors.
pub fn errors_of(source: &str) -> Vec<LoxError> {
    match run(source).1 {
        Ok(()) => panic!("program unexpectedly succeeded:\n{}", source),
        Err(errors) => errors,
    }
}
