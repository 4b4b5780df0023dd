use async_trait::async_trait;
use tokio::sync::mpsc;

/// Failures reported by the speech devices. The orchestrator never treats
/// these as fatal: output errors degrade to a silent skip, input errors
/// collapse to the empty-transcript path.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech device unavailable: {0}")]
    Unavailable(String),
    #[error("speech operation failed: {0}")]
    Failed(String),
}

/// Text-to-speech device. `speak` resolves once the utterance has been
/// fully delivered (or the device gave up).
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Cancels any utterance in flight. Must be safe to call at any time,
    /// including when nothing is speaking.
    async fn cancel_all(&self);
}

/// Speech-to-text device. Captures one utterance per `listen` call.
///
/// Partial transcripts are streamed on `partials` as recognition progresses;
/// the call resolves with the final transcript. An empty final transcript
/// means "no result", whether caused by a timeout, silence, or the driver;
/// callers must not distinguish. Locale is adapter configuration, never
/// negotiated per call.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    async fn listen(&self, partials: mpsc::Sender<String>) -> Result<String, SpeechError>;

    /// Cancels any capture in flight.
    async fn cancel_all(&self);
}
