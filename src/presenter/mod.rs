pub mod render;
pub mod reveal;
pub mod terminal;

pub use reveal::{play, Chunk, Reveal, RevealOutcome, RevealSink};
pub use terminal::{InterruptGate, TerminalPrompter, TerminalScreen};

use crate::session::Turn;
use std::io;

/// Kind of inline message shown outside the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Warning,
    Error,
}

/// Input side of the chat surface.
///
/// `Ok(None)` means the input stream is closed and the loop should end.
pub trait Prompter {
    /// Secret credential field; never echoed.
    fn read_credential(&mut self) -> io::Result<Option<String>>;
    /// Free-text message field, re-entered each turn.
    fn read_message(&mut self) -> io::Result<Option<String>>;
}

/// Output side of the chat surface.
pub trait Screen: RevealSink {
    fn banner(&mut self) -> io::Result<()>;
    /// Role header for the reply about to be revealed.
    fn begin_reply(&mut self) -> io::Result<()>;
    /// Show a finished turn in full (no reveal).
    fn render_turn(&mut self, turn: &Turn) -> io::Result<()>;
    fn notice(&mut self, kind: Notice, message: &str) -> io::Result<()>;
    fn thinking(&mut self) -> io::Result<()>;
    fn clear_thinking(&mut self) -> io::Result<()>;
}
