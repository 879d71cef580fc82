//! Operator interaction.
//!
//! All questions go through [`Prompter`] so the workflow can be driven by a
//! script in tests. Yes/no questions accept only an answer starting with
//! `y` or `Y`; everything else, including an empty line, means no.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::error::{AdminSwapError, Result};

/// True if `answer` counts as "yes".
pub fn is_affirmative(answer: &str) -> bool {
    answer.starts_with(['y', 'Y'])
}

pub trait Prompter {
    /// Show `question` and read one line of input, without the newline.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Print a line for the operator.
    fn say(&mut self, message: &str);

    /// Ask a y/N question. Defaults to no.
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]: "))?;
        Ok(is_affirmative(&answer))
    }
}

/// Reads answers from any `BufRead`, writes prompts to any `Write`.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    /// Console bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for Console<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(AdminSwapError::InputClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn say(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "{message}").and_then(|()| self.output.flush()) {
            debug!("Could not write to the operator: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_is_affirmative() {
        for yes in ["y", "Y", "yes", "Yes", "yep"] {
            assert!(is_affirmative(yes), "{yes:?} should be yes");
        }
        for no in ["", "n", "N", "no", " y", "sure", "1"] {
            assert!(!is_affirmative(no), "{no:?} should be no");
        }
    }

    #[test]
    fn test_console_reads_lines() {
        let mut out = Vec::new();
        let mut console = Console::new(Cursor::new("alice\r\ny\n"), &mut out);
        assert_eq!(console.ask("Username: ").unwrap(), "alice");
        assert!(console.confirm("Continue?").unwrap());
        drop(console);
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown, "Username: Continue? [y/N]: ");
    }

    #[test]
    fn test_console_empty_line_is_no() {
        let mut console = Console::new(Cursor::new("\n"), Vec::new());
        assert!(!console.confirm("Remove?").unwrap());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_say_survives_closed_stdout() {
        let mut console = Console::new(Cursor::new("y\n"), BrokenPipe);
        console.say("Removed user 'ubuntu'.");
        assert!(matches!(console.ask("Continue? "), Err(AdminSwapError::Io(_))));
    }

    #[test]
    fn test_console_eof_is_error() {
        let mut console = Console::new(Cursor::new(""), Vec::new());
        assert!(matches!(
            console.ask("Username: "),
            Err(AdminSwapError::InputClosed)
        ));
    }
}
