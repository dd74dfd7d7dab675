use anyhow::Result;
use tracing::debug;

use crate::ast::{FunctionDeclaration, Program};
use crate::backend::{Backend, PreparedBackend};

pub mod console;
mod error;
mod runtime;
mod value;

pub use console::{BufferedConsole, Console, StdConsole};
pub use error::RuntimeError;
pub use runtime::Environment;
pub use value::Value;

use runtime::Runtime;

/// AST-walking backend that executes `main` directly without compilation.
///
/// Other top-level declarations are accepted but never executed.
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }

    /// Runs `main` against `console`, returning the final bindings.
    pub fn execute(
        &self,
        program: &Program,
        console: &mut dyn Console,
    ) -> std::result::Result<Environment, RuntimeError> {
        let main = program.function("main").ok_or(RuntimeError::MissingMain)?;
        execute_main(main, console)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepared executable program for the tree-walking interpreter.
pub struct PreparedInterpreter {
    main: FunctionDeclaration,
}

fn execute_main(
    main: &FunctionDeclaration,
    console: &mut dyn Console,
) -> std::result::Result<Environment, RuntimeError> {
    debug!(statements = main.body.len(), "interpreting main");
    let mut environment = Environment::default();
    // A `return` in main simply ends the run.
    Runtime::new(console).exec_block(&main.body, &mut environment)?;
    debug!(bindings = environment.len(), "interpretation finished");
    Ok(environment)
}

impl PreparedBackend for PreparedInterpreter {
    fn run(&self, input: &str) -> Result<String> {
        let mut console = BufferedConsole::new(input);
        execute_main(&self.main, &mut console)?;
        Ok(console.into_output())
    }
}

impl Backend for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        let main = program.function("main").ok_or(RuntimeError::MissingMain)?;
        Ok(Box::new(PreparedInterpreter { main: main.clone() }))
    }
}
