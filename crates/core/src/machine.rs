//! The pure decision core of the interview session.
//!
//! `Machine` owns the authoritative `Session` record and turns incoming
//! events into `(state, effects)`: it mutates the session and returns the
//! port calls the async driver must issue. Nothing in here is async and
//! nothing touches hardware, so every transition is unit-testable with
//! plain function calls.

use crate::event::SessionEvent;
use crate::session::{AnswerRecord, Evaluation, Level, Session, SessionState};

/// Events fed into the machine. The driver normalizes port outcomes before
/// they get here: a speech-output failure arrives as a plain `SpeakEnded`,
/// and timeout/silence/driver-error all arrive as an empty `CaptureEnded`.
#[derive(Debug)]
pub(crate) enum MachineEvent {
    /// Questions are available; begin (or restart) the interview.
    QuestionsLoaded { questions: Vec<String> },
    /// The question source failed. Fatal to `start()` only.
    FetchFailed { message: String },
    /// The current question has been fully spoken (or speaking was skipped).
    SpeakEnded,
    /// Interim transcript while the candidate is speaking.
    Partial { text: String },
    /// Capture ended on its own with a final transcript ("" = no result).
    CaptureEnded { transcript: String },
    /// Capture could not run at all; submit an empty answer, no retry.
    CaptureFailed,
    /// The caller forced evaluation with whatever has been captured so far.
    StopRequested,
    /// The evaluator responded; failures are already mapped to
    /// `Evaluation::failed()` by the driver.
    EvaluationSettled { evaluation: Evaluation },
    ReplayRequested { index: usize },
    ResetRequested,
}

/// Side effects for the driver to execute, in order.
#[derive(Debug)]
pub(crate) enum Effect {
    /// Speak `text`; completion comes back as `SpeakEnded`.
    Speak { text: String },
    /// Start one capture; completion comes back as `CaptureEnded` /
    /// `CaptureFailed`, interim text as `Partial`.
    Listen,
    /// Score one answer; completion comes back as `EvaluationSettled`.
    Evaluate { question: String, answer: String },
    /// Cancel all in-flight speech operations and invalidate their
    /// eventual callbacks.
    CancelOps,
    /// Fire-and-forget speech whose completion is never waited on.
    Announce { text: String },
    Emit(SessionEvent),
}

pub(crate) struct Machine {
    session: Session,
    /// Set after the one automatic re-ask of the current question. A second
    /// empty result submits the empty answer instead of looping.
    reasked_current: bool,
    /// Answer text submitted to the evaluator, held until the record is
    /// appended so the record matches what was actually scored.
    pending_answer: String,
}

impl Machine {
    pub(crate) fn new(topic: impl Into<String>, level: Level) -> Self {
        Self {
            session: Session::new(topic, level),
            reasked_current: false,
            pending_answer: String::new(),
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn handle(&mut self, event: MachineEvent) -> Vec<Effect> {
        use SessionState::*;

        let mut effects = Vec::new();
        match event {
            MachineEvent::QuestionsLoaded { questions } => {
                // Mid-session starts are rejected by the driver; a terminal
                // session restarts over the same question set.
                if !matches!(self.session.state, Idle | Finished) {
                    return effects;
                }
                if questions.is_empty() {
                    effects.push(Effect::Emit(SessionEvent::FetchFailed {
                        message: "question source returned no questions".to_string(),
                    }));
                    return effects;
                }
                self.session.questions = questions;
                self.session.results.clear();
                self.session.current_index = 0;
                self.reasked_current = false;
                self.set_state(Asking, &mut effects);
                self.ask_current(&mut effects);
            }
            MachineEvent::FetchFailed { message } => {
                if self.session.state == Idle {
                    effects.push(Effect::Emit(SessionEvent::FetchFailed { message }));
                }
            }
            MachineEvent::SpeakEnded => {
                if self.session.state == Asking {
                    self.set_state(Listening, &mut effects);
                    effects.push(Effect::Listen);
                }
            }
            MachineEvent::Partial { text } => {
                if self.session.state == Listening {
                    self.session.current_transcript = text.clone();
                    effects.push(Effect::Emit(SessionEvent::TranscriptUpdated { text }));
                }
            }
            MachineEvent::CaptureEnded { transcript } => {
                if self.session.state != Listening {
                    return effects;
                }
                if transcript.is_empty() {
                    if self.reasked_current {
                        // Already re-asked once; never loop on a dead mic.
                        self.submit(String::new(), &mut effects);
                    } else {
                        self.reasked_current = true;
                        self.set_state(Asking, &mut effects);
                        self.ask_current(&mut effects);
                    }
                } else {
                    self.session.current_transcript = transcript.clone();
                    effects.push(Effect::Emit(SessionEvent::TranscriptUpdated {
                        text: transcript.clone(),
                    }));
                    self.submit(transcript, &mut effects);
                }
            }
            MachineEvent::CaptureFailed => {
                // Broken capability: submitting an empty answer beats an
                // infinite re-ask loop.
                if self.session.state == Listening {
                    self.submit(String::new(), &mut effects);
                }
            }
            MachineEvent::StopRequested => {
                if self.session.state == Listening {
                    effects.push(Effect::CancelOps);
                    let answer = self.session.current_transcript.clone();
                    self.submit(answer, &mut effects);
                }
            }
            MachineEvent::EvaluationSettled { evaluation } => {
                if self.session.state != Evaluating {
                    return effects;
                }
                let Some(question) = self.session.current_question().map(str::to_string) else {
                    return effects;
                };
                let record = AnswerRecord {
                    question,
                    answer: std::mem::take(&mut self.pending_answer),
                    evaluation,
                };
                self.session.results.push(record.clone());
                effects.push(Effect::Emit(SessionEvent::ResultAppended {
                    index: self.session.current_index,
                    record,
                }));
                self.session.current_index += 1;
                self.reasked_current = false;
                if self.session.current_index < self.session.questions.len() {
                    self.set_state(Asking, &mut effects);
                    self.ask_current(&mut effects);
                } else {
                    self.set_state(Finished, &mut effects);
                    effects.push(Effect::Emit(SessionEvent::SessionFinished {
                        answered: self.session.results.len(),
                    }));
                    effects.push(Effect::Announce {
                        text: "The interview is complete. Check your feedback.".to_string(),
                    });
                }
            }
            MachineEvent::ReplayRequested { index } => {
                if !matches!(self.session.state, Asking | Listening) {
                    return effects;
                }
                let Some(question) = self.session.questions.get(index).cloned() else {
                    return effects;
                };
                // Replay is a side channel: results, current_index and the
                // captured transcript all survive it.
                effects.push(Effect::CancelOps);
                self.set_state(Asking, &mut effects);
                effects.push(Effect::Speak { text: question });
            }
            MachineEvent::ResetRequested => {
                effects.push(Effect::CancelOps);
                self.set_state(Idle, &mut effects);
                self.session.questions.clear();
                self.session.results.clear();
                self.session.current_index = 0;
                self.session.current_transcript.clear();
                self.reasked_current = false;
                self.pending_answer.clear();
            }
        }
        effects
    }

    fn set_state(&mut self, to: SessionState, effects: &mut Vec<Effect>) {
        let from = self.session.state;
        if from == to {
            return;
        }
        self.session.state = to;
        effects.push(Effect::Emit(SessionEvent::StateChanged { from, to }));
    }

    /// Starts (or re-starts) the cycle for the current question: clears the
    /// scratch transcript and speaks the question.
    fn ask_current(&mut self, effects: &mut Vec<Effect>) {
        let Some(question) = self.session.current_question().map(str::to_string) else {
            return;
        };
        self.session.current_transcript.clear();
        effects.push(Effect::Emit(SessionEvent::QuestionChanged {
            index: self.session.current_index,
            question: question.clone(),
        }));
        effects.push(Effect::Emit(SessionEvent::TranscriptUpdated {
            text: String::new(),
        }));
        effects.push(Effect::Speak { text: question });
    }

    /// Enters `Evaluating` with `answer` as the submitted text.
    fn submit(&mut self, answer: String, effects: &mut Vec<Effect>) {
        let Some(question) = self.session.current_question().map(str::to_string) else {
            return;
        };
        self.pending_answer = answer.clone();
        self.set_state(SessionState::Evaluating, effects);
        effects.push(Effect::Evaluate { question, answer });
    }
}
