//! Session driver: source text → tokens → AST → resolution → execution.
//!
//! A [`Lox`] keeps one interpreter alive across calls to [`Lox::run`], so a
//! REPL line can use the globals, functions and classes defined by earlier
//! lines.  Each failing input is reported on its own and leaves the session
//! usable.

use std::io::{self, BufRead, Write};

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Typed at the prompt to leave the REPL.
pub const QUIT_COMMAND: &str = ":q";

const PROMPT: &str = ">>> ";

pub struct Lox {
    interpreter: Interpreter,
    /// First expression id for the next input; ids must stay unique across
    /// inputs because the interpreter's distance map outlives each one.
    next_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to standard output.
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    /// A session whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self::with_interpreter(Interpreter::with_output(out))
    }

    fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            next_id: 0,
        }
    }

    /// Runs one complete input.
    ///
    /// Static errors (lex, parse, resolve) are all collected and nothing is
    /// executed; a runtime error stops execution at the failing top‑level
    /// statement and is returned alone.
    pub fn run(&mut self, source: &str) -> Result<(), Vec<LoxError>> {
        let tokens = scan(source)?;

        let mut parser = Parser::with_first_id(&tokens, self.next_id);
        let parsed = parser.parse();
        self.next_id = parser.next_id();
        let statements = parsed?;

        let locals = Resolver::new().resolve(&statements)?;
        self.interpreter.resolve(locals);

        self.interpreter
            .interpret(&statements)
            .map_err(|e| vec![e])
    }

    /// Interactive loop: prompt on `output`, read a line from `input`, run
    /// it, report errors on `diagnostics`.  Ends at end of input or on
    /// [`QUIT_COMMAND`].
    pub fn run_prompt<R: BufRead>(
        &mut self,
        input: R,
        output: &mut dyn Write,
        diagnostics: &mut dyn Write,
    ) -> io::Result<()> {
        info!("Starting REPL");

        write!(output, "{}", PROMPT)?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;

            if line.trim() == QUIT_COMMAND {
                break;
            }

            debug!("REPL input: {}", line);

            if let Err(errors) = self.run(&line) {
                for e in errors {
                    writeln!(diagnostics, "{}", e)?;
                }
            }

            write!(output, "{}", PROMPT)?;
            output.flush()?;
        }

        info!("REPL finished");
        Ok(())
    }
}

/// Lexes all of `source`, reporting every bad character rather than only the
/// first.
pub fn scan(source: &str) -> Result<Vec<Token<'_>>, Vec<LoxError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}
