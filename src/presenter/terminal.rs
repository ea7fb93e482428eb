//! Terminal implementations of [`Prompter`] and [`Screen`].

use super::render::{paint, render_markdown};
use super::reveal::{Chunk, RevealSink, CURSOR_MARKER};
use super::{Notice, Prompter, Screen};
use crate::providers::Role;
use crate::session::preamble::DISCLAIMER;
use crate::session::Turn;
use console::{measure_text_width, style, Term};
use dialoguer::{Input, Password};
use parking_lot::Mutex;
use std::io::{self, IsTerminal, StdinLock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Chat output on stdout.
///
/// The cursor marker and the thinking indicator need cursor movement, so they
/// are only drawn when stdout is a terminal.
pub struct TerminalScreen {
    term: Term,
    interactive: bool,
    cursor: MarkerCursor,
}

impl TerminalScreen {
    pub fn stdout() -> Self {
        let term = Term::stdout();
        let interactive = term.is_term();
        Self {
            term,
            interactive,
            cursor: MarkerCursor::default(),
        }
    }

    fn hide_marker(&mut self) -> io::Result<()> {
        if self.cursor.marker_shown {
            self.term.clear_chars(1)?;
            self.cursor.marker_shown = false;
        }
        Ok(())
    }

    fn show_marker(&mut self) -> io::Result<()> {
        if self.interactive && self.cursor.marker_fits() {
            self.term.write_str(CURSOR_MARKER)?;
            self.cursor.marker_shown = true;
        }
        Ok(())
    }

    fn role_header(&self, role: Role) -> io::Result<()> {
        let header = match role {
            Role::User => style("You").bold().blue(),
            Role::Assistant => style("Assistant").bold().green(),
        };
        self.term.write_line(&header.to_string())
    }

    fn write_chunks(&self, chunks: &[Chunk]) -> io::Result<()> {
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&chunk.style.paint(chunk.ch).to_string());
        }
        self.term.write_str(&out)
    }
}

impl RevealSink for TerminalScreen {
    fn start(&mut self) -> io::Result<()> {
        self.cursor = MarkerCursor::new(usize::from(self.term.size().1));
        self.show_marker()
    }

    fn chunk(&mut self, chunk: Chunk) -> io::Result<()> {
        self.hide_marker()?;
        self.term.write_str(&chunk.style.paint(chunk.ch).to_string())?;
        self.cursor.advance(chunk.ch);
        self.show_marker()
    }

    fn finish(&mut self, rest: &[Chunk]) -> io::Result<()> {
        self.hide_marker()?;
        self.write_chunks(rest)?;
        self.term.write_line("\n")?;
        self.term.flush()
    }
}

impl Screen for TerminalScreen {
    fn banner(&mut self) -> io::Result<()> {
        self.term
            .write_line(&style("🩺 AI Virtual Health Assistant").bold().to_string())?;
        self.term.write_line(&style(DISCLAIMER).dim().to_string())?;
        self.term.write_line(
            &style("Type /help for commands, /quit to leave.")
                .dim()
                .to_string(),
        )?;
        self.term.write_line("")
    }

    fn begin_reply(&mut self) -> io::Result<()> {
        self.role_header(Role::Assistant)
    }

    fn render_turn(&mut self, turn: &Turn) -> io::Result<()> {
        self.role_header(turn.role())?;
        match turn.role() {
            Role::User => self.term.write_line(turn.text())?,
            Role::Assistant => self.term.write_line(&paint(&render_markdown(turn.text())))?,
        }
        self.term.write_line("")
    }

    fn notice(&mut self, kind: Notice, message: &str) -> io::Result<()> {
        let line = match kind {
            Notice::Info => style(message).dim(),
            Notice::Success => style(message).green(),
            Notice::Warning => style(message).yellow(),
            Notice::Error => style(message).red().bold(),
        };
        self.term.write_line(&line.to_string())
    }

    fn thinking(&mut self) -> io::Result<()> {
        if self.interactive {
            self.term
                .write_str(&style("Thinking...").dim().italic().to_string())?;
        }
        Ok(())
    }

    fn clear_thinking(&mut self) -> io::Result<()> {
        if self.interactive {
            self.term.clear_line()?;
        }
        Ok(())
    }
}

/// Column tracking for the reveal marker.
///
/// Erasing the marker steps the cursor back one cell, which is unreliable
/// once a line is full and the terminal is waiting to wrap. The marker is
/// only drawn while it fits before the last column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct MarkerCursor {
    width: usize,
    column: usize,
    marker_shown: bool,
}

impl MarkerCursor {
    fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.column = 0;
            return;
        }
        let cells = measure_text_width(ch.encode_utf8(&mut [0; 4]));
        if self.column + cells > self.width {
            self.column = cells;
        } else {
            self.column += cells;
        }
    }

    fn marker_fits(&self) -> bool {
        self.column + 1 < self.width
    }
}

/// Where prompts are drawn, decided once from which streams are terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    /// dialoguer fields rendered on stderr.
    Stderr,
    /// dialoguer fields rendered on stdout (stderr is redirected).
    Stdout,
    /// Plain lines from a pipe or file.
    Lines,
}

impl InputMode {
    /// A terminal on stdin always gets a dialoguer field, so typed keys are
    /// never echoed. With no terminal to draw on, dialoguer refuses to prompt.
    fn select(stdin_tty: bool, stderr_tty: bool, stdout_tty: bool) -> Self {
        if !stdin_tty {
            Self::Lines
        } else if !stderr_tty && stdout_tty {
            Self::Stdout
        } else {
            Self::Stderr
        }
    }
}

/// Chat input from stdin: dialoguer fields on a terminal, plain lines otherwise.
pub struct TerminalPrompter {
    term: Term,
    lines: Option<io::Lines<StdinLock<'static>>>,
}

impl TerminalPrompter {
    pub fn stdin() -> Self {
        let mode = InputMode::select(
            io::stdin().is_terminal(),
            Term::stderr().is_term(),
            Term::stdout().is_term(),
        );
        tracing::debug!(?mode, "Prompt input mode");
        match mode {
            InputMode::Stderr => Self {
                term: Term::stderr(),
                lines: None,
            },
            InputMode::Stdout => Self {
                term: Term::stdout(),
                lines: None,
            },
            InputMode::Lines => Self {
                term: Term::stderr(),
                lines: Some(io::stdin().lines()),
            },
        }
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        match self.lines.as_mut().and_then(Iterator::next) {
            Some(line) => line.map(Some),
            None => Ok(None),
        }
    }
}

fn end_of_input(err: dialoguer::Error) -> io::Result<Option<String>> {
    let err: io::Error = err.into();
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Ok(None)
    } else {
        Err(err)
    }
}

impl Prompter for TerminalPrompter {
    fn read_credential(&mut self) -> io::Result<Option<String>> {
        if self.lines.is_some() {
            return self.next_line();
        }
        match Password::new()
            .with_prompt("API key")
            .allow_empty_password(true)
            .interact_on(&self.term)
        {
            Ok(key) => Ok(Some(key)),
            Err(e) => end_of_input(e).map_err(|e| {
                if e.kind() == io::ErrorKind::NotConnected {
                    io::Error::new(
                        e.kind(),
                        "no terminal to read the API key from; set VITALIS_API_KEY instead",
                    )
                } else {
                    e
                }
            }),
        }
    }

    fn read_message(&mut self) -> io::Result<Option<String>> {
        if self.lines.is_some() {
            return self.next_line();
        }
        match Input::<String>::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text_on(&self.term)
        {
            Ok(text) => Ok(Some(text)),
            Err(e) => end_of_input(e),
        }
    }
}

/// Routes Ctrl-C while the chat runs.
///
/// With a reveal armed, Ctrl-C skips it to the full text; otherwise the
/// process exits with status 130.
#[derive(Clone, Default)]
pub struct InterruptGate {
    armed: Arc<Mutex<Option<CancellationToken>>>,
}

impl InterruptGate {
    /// Spawn the signal listener. Needs a running tokio runtime.
    pub fn install() -> Self {
        let gate = Self::default();
        let listener = gate.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !listener.fire() {
                    let _ = Term::stdout().write_line("");
                    std::process::exit(130);
                }
            }
        });
        gate
    }

    /// Token that the next Ctrl-C cancels.
    pub fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.armed.lock() = Some(token.clone());
        token
    }

    pub fn disarm(&self) {
        self.armed.lock().take();
    }

    /// Cancel the armed token, if any. Returns whether one was armed.
    pub fn fire(&self) -> bool {
        match self.armed.lock().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}
