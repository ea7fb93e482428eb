pub mod assistant;
pub mod error;
pub mod loop_;

pub use assistant::{Assistant, Submission, CREDENTIAL_GUIDANCE};
pub use error::{AssistantError, ErrorKind};
pub use loop_::{drive, run, Command};
