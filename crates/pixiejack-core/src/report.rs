//! Operator-facing status lines.
//!
//! These are the `[+]`/`[-]` lines the operator watches during an attack.
//! They are separate from tracing output, which goes to stderr and the log
//! files.

use std::io::{self, IsTerminal, Write};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const CYAN: &str = "\x1b[96m";
const BOLD: &str = "\x1b[1m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Ok,
    Error,
    Info,
    Ask,
    Warn,
    Progress,
}

impl Marker {
    pub fn tag(&self) -> &'static str {
        match self {
            Marker::Ok => "[+]",
            Marker::Error => "[-]",
            Marker::Info => "[i]",
            Marker::Ask => "[?]",
            Marker::Warn => "[!]",
            Marker::Progress => "[P]",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            Marker::Ok | Marker::Progress => GREEN,
            Marker::Error => RED,
            Marker::Info => BLUE,
            Marker::Ask => CYAN,
            Marker::Warn => YELLOW,
        }
    }
}

enum Sink {
    Stdout { color: bool },
    Memory(Vec<String>),
}

pub struct Reporter {
    sink: Sink,
}

impl Reporter {
    /// Print to stdout, colored when stdout is a terminal.
    pub fn stdout() -> Self {
        Self {
            sink: Sink::Stdout {
                color: io::stdout().is_terminal(),
            },
        }
    }

    /// Keep lines in memory, uncolored.
    pub fn memory() -> Self {
        Self {
            sink: Sink::Memory(Vec::new()),
        }
    }

    /// Lines collected by a memory reporter. Empty for stdout.
    pub fn transcript(&self) -> &[String] {
        match &self.sink {
            Sink::Memory(lines) => lines,
            Sink::Stdout { .. } => &[],
        }
    }

    fn colored(&self) -> bool {
        matches!(self.sink, Sink::Stdout { color: true })
    }

    /// Wrap `text` in bold when coloring is active.
    pub fn bold(&self, text: &str) -> String {
        if self.colored() {
            format!("{BOLD}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        match &mut self.sink {
            Sink::Stdout { .. } => {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{}", text);
            }
            Sink::Memory(lines) => lines.push(text),
        }
    }

    pub fn status(&mut self, marker: Marker, message: impl AsRef<str>) {
        let tag = if self.colored() {
            format!("{}{}{}", marker.color(), marker.tag(), RESET)
        } else {
            marker.tag().to_string()
        };
        self.line(format!("{} {}", tag, message.as_ref()));
    }

    pub fn ok(&mut self, message: impl AsRef<str>) {
        self.status(Marker::Ok, message);
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.status(Marker::Error, message);
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.status(Marker::Info, message);
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.status(Marker::Warn, message);
    }

    pub fn progress(&mut self, message: impl AsRef<str>) {
        self.status(Marker::Progress, message);
    }

    /// Show a `[?]` prompt and leave the cursor on the same line.
    pub fn prompt(&mut self, message: &str) {
        let text = self.prompt_text(message);
        match &mut self.sink {
            Sink::Stdout { .. } => {
                let mut out = io::stdout().lock();
                let _ = write!(out, "{}", text);
                let _ = out.flush();
            }
            Sink::Memory(lines) => lines.push(text),
        }
    }

    fn prompt_text(&self, message: &str) -> String {
        let tag = if self.colored() {
            format!("{}{}{}", CYAN, Marker::Ask.tag(), RESET)
        } else {
            Marker::Ask.tag().to_string()
        };
        format!("{} {}", tag, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transcript_is_plain() {
        let mut reporter = Reporter::memory();
        reporter.ok("Associated with AP");
        reporter.progress("PKE: AABB");
        reporter.error("WPS Failed");
        assert_eq!(
            reporter.transcript(),
            &["[+] Associated with AP", "[P] PKE: AABB", "[-] WPS Failed"]
        );
        assert_eq!(reporter.bold("x"), "x");
    }

    #[test]
    fn test_prompt_is_recorded() {
        let mut reporter = Reporter::memory();
        reporter.prompt("Select Target ID (r=refresh): ");
        assert_eq!(reporter.transcript(), &["[?] Select Target ID (r=refresh): "]);
    }
}
