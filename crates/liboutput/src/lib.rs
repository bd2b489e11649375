#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! User-facing output for the `cw` command line.
//!
//! Commands talk to an [`Output`] rather than to stdout directly. The
//! [`Terminal`] backend renders colored status lines and interactive prompts;
//! [`Quiet`] drops everything and refuses to prompt, which is what scripted
//! and test runs use. Long-running steps are wrapped in a [`Spinner`].

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Silent backend.
mod quiet;
/// Progress indicator for long-running steps.
mod spinner;
/// Color terminal backend.
mod terminal;

pub use quiet::Quiet;
pub use spinner::Spinner;
pub use terminal::Terminal;

/// Errors raised while writing output or prompting.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The backend cannot perform this operation.
    #[error("{0}")]
    Unsupported(&'static str),

    /// The caller passed arguments the prompt cannot work with.
    #[error("{0}")]
    InvalidInput(&'static str),

    /// Raw mode or key reading failed.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Writing to or reading from the terminal failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The user interrupted a prompt.
    #[error("Prompt cancelled")]
    Cancelled,
}

impl From<dialoguer::Error> for OutputError {
    fn from(err: dialoguer::Error) -> Self {
        let err = io::Error::from(err);
        match err.kind() {
            io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof => Self::Cancelled,
            _ => Self::Io(err),
        }
    }
}

/// Result alias for output operations.
pub type Result<T> = StdResult<T, OutputError>;

/// Destination for messages and source of user answers.
pub trait Output: Send + Sync {
    /// Plain line of text.
    fn message(&self, msg: &str) -> Result<()>;
    /// Emphasized header line.
    fn heading(&self, msg: &str) -> Result<()>;
    /// A step that completed.
    fn success(&self, msg: &str) -> Result<()>;
    /// Something the user should look at.
    fn warn(&self, msg: &str) -> Result<()>;
    /// An error. Terminal backends write this to stderr.
    fn fail(&self, msg: &str) -> Result<()>;
    /// Yes/no question, `false` unless the user agrees.
    fn confirm(&self, prompt: &str) -> Result<bool>;
    /// Single-key menu over `options`, returning the chosen index.
    fn select(&self, prompt: &str, options: &[String]) -> Result<usize>;
    /// Free-form line of text. May be empty.
    fn input(&self, prompt: &str) -> Result<String>;
    /// Start a progress indicator labelled `msg`.
    fn spinner(&self, msg: &str) -> Spinner;
    /// Child output whose lines are indented under `header`.
    fn section(&self, header: &str) -> Result<Box<dyn Output>>;
    /// Flush pending output.
    fn finish(&self) -> Result<()>;
}
