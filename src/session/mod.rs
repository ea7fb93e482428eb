//! Session management — credential, hidden seed history, live chat session,
//! and the visible transcript.
//!
//! Nothing here touches disk: a session lives exactly as long as the
//! credential that opened it.

pub mod chat;
pub mod credential;
pub mod preamble;
pub mod types;

pub use chat::{initialize, ChatSession, ModelHandle, SessionOptions};
pub use credential::Credential;
pub use types::{Transcript, Turn};
