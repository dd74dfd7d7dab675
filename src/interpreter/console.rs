use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// The interpreter's only channel to the outside world.
pub trait Console {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
    /// Writes without a trailing newline and flushes.
    fn write_prompt(&mut self, prompt: &str) -> io::Result<()>;
    /// Reads one line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Process stdin/stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")
    }

    fn write_prompt(&mut self, prompt: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(trim_line_ending(line)))
    }
}

/// Scripted input and captured output, used by the backend harness.
#[derive(Debug, Default)]
pub struct BufferedConsole {
    input: VecDeque<String>,
    output: String,
}

impl BufferedConsole {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.lines().map(str::to_string).collect(),
            output: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl Console for BufferedConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.output.push_str(line);
        self.output.push('\n');
        Ok(())
    }

    fn write_prompt(&mut self, prompt: &str) -> io::Result<()> {
        self.output.push_str(prompt);
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.pop_front())
    }
}

fn trim_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_console_replays_lines_and_captures_output() {
        let mut console = BufferedConsole::new("first\r\nsecond\n");
        console.write_prompt("> ").expect("prompt");
        assert_eq!(console.read_line().expect("read"), Some("first".to_string()));
        console.write_line("ok").expect("write");
        assert_eq!(console.read_line().expect("read"), Some("second".to_string()));
        assert_eq!(console.read_line().expect("read"), None);
        assert_eq!(console.output(), "> ok\n");
    }

    #[test]
    fn trims_unix_and_windows_line_endings() {
        assert_eq!(trim_line_ending("a\n".to_string()), "a");
        assert_eq!(trim_line_ending("b\r\n".to_string()), "b");
        assert_eq!(trim_line_ending("c".to_string()), "c");
    }
}
