use thiserror::Error;

/// Failures of the prompt-to-loading transition. These are the only errors
/// the coaching flow surfaces to the user; everything downstream of a
/// successful generation degrades silently.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("describe a dish or paste a recipe link first")]
    EmptyPrompt,
    #[error("that does not look like a valid recipe link: {0}")]
    InvalidUrl(String),
    #[error("a cooking session is already in progress")]
    SessionActive,
    #[error("recipe generation failed: {0}")]
    Generation(String),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis request failed: {0}")]
    Synthesis(String),
}
