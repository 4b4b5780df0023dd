//! Console stand-ins for the speech devices.
//!
//! Real speech hardware is an external collaborator; these adapters honor
//! the same port contracts over stdout/stdin so a session can run anywhere.
//! Questions are printed instead of spoken, and one typed line stands in
//! for the recognized transcript. An empty line, EOF, or the answer timeout
//! all resolve to an empty transcript, exactly like silence on a real mic.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Notify};
use viva_core::ports::{SpeechError, SpeechInput, SpeechOutput};

pub struct ConsoleSpeechOutput {
    cancelled: Notify,
}

impl ConsoleSpeechOutput {
    pub fn new() -> Self {
        Self {
            cancelled: Notify::new(),
        }
    }
}

impl Default for ConsoleSpeechOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechOutput for ConsoleSpeechOutput {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        println!(">> {text}");
        // Pace the "utterance" roughly like spoken delivery so the flow of
        // the session is observable; cancellation cuts it short.
        let pacing = Duration::from_millis(60 * text.split_whitespace().count() as u64);
        tokio::select! {
            _ = tokio::time::sleep(pacing) => {}
            _ = self.cancelled.notified() => {
                tracing::debug!("utterance cancelled");
            }
        }
        Ok(())
    }

    async fn cancel_all(&self) {
        self.cancelled.notify_waiters();
    }
}

pub struct ConsoleSpeechInput {
    timeout: Duration,
    cancelled: Notify,
}

impl ConsoleSpeechInput {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancelled: Notify::new(),
        }
    }
}

#[async_trait]
impl SpeechInput for ConsoleSpeechInput {
    async fn listen(&self, partials: mpsc::Sender<String>) -> Result<String, SpeechError> {
        eprintln!(
            "(type your answer and press Enter; {}s before the question is repeated)",
            self.timeout.as_secs()
        );
        let mut reader = BufReader::new(tokio::io::stdin());
        capture_line(&mut reader, self.timeout, &self.cancelled, &partials).await
    }

    async fn cancel_all(&self) {
        self.cancelled.notify_waiters();
    }
}

/// Reads one line as the final transcript. Timeout, EOF and cancellation
/// all yield the empty transcript rather than an error.
async fn capture_line<R>(
    reader: &mut R,
    timeout: Duration,
    cancelled: &Notify,
    partials: &mpsc::Sender<String>,
) -> Result<String, SpeechError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut line = String::new();
    tokio::select! {
        read = reader.read_line(&mut line) => match read {
            Ok(0) => Ok(String::new()),
            Ok(_) => {
                let text = line.trim().to_string();
                if !text.is_empty() {
                    let _ = partials.send(text.clone()).await;
                }
                Ok(text)
            }
            Err(e) => Err(SpeechError::Failed(e.to_string())),
        },
        _ = tokio::time::sleep(timeout) => Ok(String::new()),
        _ = cancelled.notified() => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn typed_line_becomes_the_final_transcript() {
        let (tx, mut rx) = channel();
        let mut reader = BufReader::new(&b"ownership and borrowing\n"[..]);
        let cancelled = Notify::new();
        let transcript = capture_line(&mut reader, Duration::from_secs(5), &cancelled, &tx)
            .await
            .unwrap();
        assert_eq!(transcript, "ownership and borrowing");
        assert_eq!(rx.recv().await.unwrap(), "ownership and borrowing");
    }

    #[tokio::test]
    async fn eof_yields_empty_transcript() {
        let (tx, _rx) = channel();
        let mut reader = BufReader::new(&b""[..]);
        let cancelled = Notify::new();
        let transcript = capture_line(&mut reader, Duration::from_secs(5), &cancelled, &tx)
            .await
            .unwrap();
        assert_eq!(transcript, "");
    }

    #[tokio::test]
    async fn timeout_yields_empty_transcript() {
        let (tx, _rx) = channel();
        // A reader that never completes.
        let (_keepalive, stream) = tokio::io::duplex(16);
        let mut reader = BufReader::new(stream);
        let cancelled = Notify::new();
        let transcript = capture_line(&mut reader, Duration::from_millis(20), &cancelled, &tx)
            .await
            .unwrap();
        assert_eq!(transcript, "");
    }

    #[tokio::test]
    async fn cancellation_ends_capture_with_empty_transcript() {
        let (tx, _rx) = channel();
        let (_keepalive, stream) = tokio::io::duplex(16);
        let mut reader = BufReader::new(stream);
        let cancelled = Notify::new();

        let capture = capture_line(&mut reader, Duration::from_secs(30), &cancelled, &tx);
        tokio::pin!(capture);

        // Poll the capture once so its waiter is registered, then cancel.
        tokio::select! {
            _ = &mut capture => panic!("capture ended before cancellation"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
        cancelled.notify_waiters();
        let transcript = capture.await.unwrap();
        assert_eq!(transcript, "");
    }
}
