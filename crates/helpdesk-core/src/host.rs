use async_trait::async_trait;
use thiserror::Error;

/// Errors from the conversational turn host
#[derive(Debug, Error)]
pub enum HostError {
    /// The person left the conversation; the session is abandoned.
    #[error("session closed by the user")]
    Closed,

    #[error("I/O error talking to the user: {0}")]
    Io(#[from] std::io::Error),
}

/// The conversational turn host the flow talks through.
///
/// Each call suspends the session until exactly one answer arrives. The
/// host renders prompts however it likes; the flow only sees the raw
/// answer, so choice validation stays on this side of the seam.
#[async_trait]
pub trait PromptHost: Send + Sync {
    /// Offer an enumerated choice and return the raw answer.
    ///
    /// The answer is not guaranteed to name one of `options`.
    async fn choose(&self, prompt: &str, options: &[&str]) -> Result<String, HostError>;

    /// Ask for free text.
    async fn ask(&self, prompt: &str) -> Result<String, HostError>;

    /// Ask a yes/no question.
    async fn confirm(&self, prompt: &str) -> Result<bool, HostError>;

    /// Send a one-way message (acknowledgments, lookup results).
    async fn tell(&self, message: &str) -> Result<(), HostError>;
}
