use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vanction::ast::Program;
use vanction::config::Config;
use vanction::diagnostic::Diagnostic;
use vanction::interpreter::{Interpreter, StdConsole};
use vanction::parser;
use vanction::resolver::{SearchPathResolver, link};
use vanction::transpiler::Transpiler;

#[derive(Debug, Parser)]
#[command(name = "vanction", version, about = "Vanction language toolchain")]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML settings file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Extra root for resolving imports; searched before configured roots
    #[arg(short = 'I', long = "search-path", global = true, value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// Trace every token the lexer produces
    #[arg(long, global = true)]
    debug_lexer: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interpret a program's `main` using stdin and stdout
    Run { file: PathBuf },
    /// Print or write the generated C++
    Emit {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate C++ and compile it with the configured compiler
    Build {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse and link a program without running it
    Check { file: PathBuf },
}

impl Command {
    fn file(&self) -> &Path {
        match self {
            Command::Run { file }
            | Command::Emit { file, .. }
            | Command::Build { file, .. }
            | Command::Check { file } => file,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };
    let debug_lexer = cli.debug_lexer || config.as_ref().is_ok_and(|config| config.debug_lexer);
    let directive = default_directive(cli.verbose, debug_lexer);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    match config.and_then(|config| execute(&cli, &config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error, cli.command.file());
            ExitCode::FAILURE
        }
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "vanction=info",
        1 => "vanction=debug",
        _ => "vanction=trace",
    }
}

fn default_directive(verbose: u8, debug_lexer: bool) -> String {
    let directive = directive_for_verbosity(verbose);
    if debug_lexer {
        format!("{directive},vanction::lexer=trace")
    } else {
        directive.to_string()
    }
}

fn execute(cli: &Cli, config: &Config) -> Result<()> {
    let file = cli.command.file();
    let program = load_program(file, &search_roots(cli, config, file))?;

    match &cli.command {
        Command::Run { .. } => {
            Interpreter::new().execute(&program, &mut StdConsole)?;
        }
        Command::Emit { output, .. } => {
            let source = Transpiler::with_toolchain(config.toolchain()).generate(&program);
            match output {
                Some(path) => fs::write(path, source)
                    .with_context(|| format!("Writing {}", path.display()))?,
                None => io::stdout()
                    .lock()
                    .write_all(source.as_bytes())
                    .context("Writing generated C++ to stdout")?,
            }
        }
        Command::Build { output, .. } => {
            let binary_path = output.clone().unwrap_or_else(|| file.with_extension(""));
            let source_path = binary_path.with_extension("cpp");
            let transpiler = Transpiler::with_toolchain(config.toolchain());
            fs::write(&source_path, transpiler.generate(&program))
                .with_context(|| format!("Writing {}", source_path.display()))?;
            transpiler
                .toolchain()
                .compile_file(&source_path, &binary_path)?;
            info!(binary = %binary_path.display(), "build finished");
        }
        Command::Check { .. } => {
            println!("{}: ok", file.display());
        }
    }
    Ok(())
}

/// Command-line roots come first, then configured ones, then the directory
/// holding the program itself.
fn search_roots(cli: &Cli, config: &Config, file: &Path) -> Vec<PathBuf> {
    let mut roots = cli.search_paths.clone();
    roots.extend(config.search_paths.iter().cloned());
    let program_dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    roots.push(program_dir);
    roots
}

fn load_program(file: &Path, roots: &[PathBuf]) -> Result<Program> {
    let source =
        fs::read_to_string(file).with_context(|| format!("Reading {}", file.display()))?;
    let program = parser::parse(&source)?;
    let mut resolver = SearchPathResolver::new(roots.iter().cloned());
    Ok(link(&program, &mut resolver)?)
}

fn report(error: &anyhow::Error, file: &Path) {
    let mut diagnostic = Diagnostic::from_error(error);
    if diagnostic.file.is_none() && diagnostic.category != "error" {
        diagnostic = diagnostic.with_file(file);
    }
    let source = diagnostic
        .file
        .as_ref()
        .and_then(|path| fs::read_to_string(path).ok());
    eprint!("{}", diagnostic.render(source.as_deref()));
}
