use anyhow::Result;

use crate::ast::Program;

pub use crate::interpreter;
pub use crate::transpiler;

/// Executable artifact produced by a backend `prepare` step.
///
/// This keeps translation and execution separated so benchmarks and tests can
/// measure/validate prepare-vs-run phases independently.
pub trait PreparedBackend {
    /// Runs the program once with `input` as its standard input and returns
    /// everything it wrote to standard output.
    fn run(&self, input: &str) -> Result<String>;
}

/// Common interface implemented by each execution backend.
///
/// `prepare` translates the AST into backend-owned executable state, while
/// `run` offers the convenience path for one-shot execution.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>>;

    fn run(&self, program: &Program, input: &str) -> Result<String> {
        self.prepare(program)?.run(input)
    }
}

pub fn backends() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(crate::interpreter::Interpreter::new()),
        Box::new(crate::transpiler::Transpiler::new()),
    ]
}
