use serde::Serialize;

use crate::session::{AnswerRecord, SessionState};

/// Notifications broadcast by the orchestrator to its observers (a UI or a
/// test harness). Every externally visible side effect of the session shows
/// up here or in the state snapshot, nowhere else.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    QuestionChanged {
        index: usize,
        question: String,
    },
    TranscriptUpdated {
        text: String,
    },
    ResultAppended {
        index: usize,
        record: AnswerRecord,
    },
    SessionFinished {
        answered: usize,
    },
    /// The question source failed; the session stays idle.
    FetchFailed {
        message: String,
    },
}
