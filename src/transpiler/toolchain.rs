use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

static NEXT_ARTIFACT: AtomicUsize = AtomicUsize::new(0);

/// External C++ compiler used to turn generated source into an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compiler: String,
    pub flags: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: "c++".to_string(),
            flags: vec!["-std=c++17".to_string(), "-O2".to_string()],
        }
    }
}

impl Toolchain {
    /// Writes `source` to a fresh temp file and compiles it next to it.
    /// Returns the source and binary paths; the caller owns both.
    pub fn compile_source(&self, source: &str) -> Result<(PathBuf, PathBuf)> {
        let (source_path, binary_path) = write_temp_file(source)?;
        if let Err(error) = self.compile_file(&source_path, &binary_path) {
            let _ = fs::remove_file(&source_path);
            return Err(error);
        }
        Ok((source_path, binary_path))
    }

    pub fn compile_file(&self, source_path: &Path, binary_path: &Path) -> Result<()> {
        debug!(
            compiler = %self.compiler,
            source = %source_path.display(),
            binary = %binary_path.display(),
            "compiling generated C++"
        );
        let compile = Command::new(&self.compiler)
            .arg(source_path)
            .args(&self.flags)
            .arg("-o")
            .arg(binary_path)
            .output()
            .with_context(|| format!("Running C++ compiler '{}'", self.compiler))?;
        if !compile.status.success() {
            let stderr = String::from_utf8_lossy(&compile.stderr);
            bail!("C++ compilation failed: {stderr}");
        }
        Ok(())
    }
}

fn write_temp_file(contents: &str) -> Result<(PathBuf, PathBuf)> {
    let mut dir = std::env::temp_dir();
    dir.push("vanction");
    fs::create_dir_all(&dir).context("Creating temp directory")?;

    let sequence = NEXT_ARTIFACT.fetch_add(1, Ordering::Relaxed);
    let file_stem = format!("program_{}_{sequence}", std::process::id());
    let source_path = dir.join(format!("{file_stem}.cpp"));
    let binary_path = dir.join(format!("{file_stem}{}", std::env::consts::EXE_SUFFIX));

    fs::write(&source_path, contents).context("Writing C++ source")?;
    Ok((source_path, binary_path))
}

/// Runs a compiled program, feeding `input` to its stdin, and returns its stdout.
pub fn run_compiled_binary(binary_path: &Path, input: &str) -> Result<String> {
    let mut child = Command::new(binary_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Running compiled program")?;
    // A program that never reads its input closes the pipe early.
    if let Some(mut stdin) = child.stdin.take()
        && let Err(error) = stdin.write_all(input.as_bytes())
        && error.kind() != io::ErrorKind::BrokenPipe
    {
        return Err(error).context("Writing program input");
    }
    let output = child
        .wait_with_output()
        .context("Waiting for compiled program")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Transpiled program failed: {stderr}");
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
