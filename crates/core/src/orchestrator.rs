//! Async driver around the pure transition machine.
//!
//! One tokio task owns the `Machine` and the four ports. Callers talk to it
//! through an `OrchestratorHandle`: commands go in over an mpsc channel,
//! observations come out as broadcast events and a watch snapshot of the
//! session. Port operations run in spawned tasks that report back over an
//! internal channel tagged with an operation token; a cancellation bumps the
//! token, so late completions from cancelled or superseded operations are
//! discarded instead of corrupting the state machine.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::{broadcast, mpsc, watch};

use crate::event::SessionEvent;
use crate::evaluator::{EvaluationClient, EvaluationRequest};
use crate::machine::{Effect, Machine, MachineEvent};
use crate::ports::{SpeechError, SpeechInput, SpeechOutput};
use crate::questions::{QuestionProvider, QuestionRequest};
use crate::session::{Evaluation, Level, Session, SessionState};

const COMMAND_CAPACITY: usize = 32;
const PORT_EVENT_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

/// Static parameters of one interview run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub topic: String,
    pub level: Level,
    pub question_count: usize,
}

/// The four collaborators the orchestrator drives.
pub struct Ports {
    pub speech_out: Arc<dyn SpeechOutput>,
    pub speech_in: Arc<dyn SpeechInput>,
    pub evaluator: Arc<dyn EvaluationClient>,
    pub questions: Arc<dyn QuestionProvider>,
}

#[derive(Debug)]
enum Command {
    Start,
    StopAndEvaluate,
    Replay { index: usize },
    Reset,
}

/// Completions reported by spawned port operations. Every variant carries
/// the token of the generation that issued it.
#[derive(Debug)]
enum PortEvent {
    QuestionsFetched {
        token: u64,
        result: Result<Vec<String>>,
    },
    SpeakFinished {
        token: u64,
        result: Result<(), SpeechError>,
    },
    Partial {
        token: u64,
        text: String,
    },
    CaptureFinished {
        token: u64,
        result: Result<String, SpeechError>,
    },
    Evaluated {
        token: u64,
        result: Result<Evaluation>,
    },
}

impl PortEvent {
    fn token(&self) -> u64 {
        match self {
            PortEvent::QuestionsFetched { token, .. }
            | PortEvent::SpeakFinished { token, .. }
            | PortEvent::Partial { token, .. }
            | PortEvent::CaptureFinished { token, .. }
            | PortEvent::Evaluated { token, .. } => *token,
        }
    }
}

/// Cloneable caller-side boundary: the five control operations plus the
/// observation channels.
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<SessionEvent>,
    snapshot: watch::Receiver<Session>,
}

impl OrchestratorHandle {
    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    /// Forces evaluation of the current question with whatever transcript
    /// has been captured so far. Only honored while listening.
    pub async fn stop_and_evaluate(&self) -> Result<()> {
        self.send(Command::StopAndEvaluate).await
    }

    pub async fn replay(&self, index: usize) -> Result<()> {
        self.send(Command::Replay { index }).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Read-only snapshot of the session as of the last transition.
    pub fn snapshot(&self) -> Session {
        self.snapshot.borrow().clone()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("orchestrator is not running"))
    }
}

pub struct InterviewOrchestrator {
    machine: Machine,
    config: SessionConfig,
    ports: Ports,
    /// Current operation generation. Bumped on every cancellation; port
    /// completions carrying an older token are stale and get dropped.
    token: u64,
    fetch_in_flight: bool,
    commands: mpsc::Receiver<Command>,
    port_tx: mpsc::Sender<PortEvent>,
    port_rx: mpsc::Receiver<PortEvent>,
    events: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<Session>,
    /// Debug bookkeeping for the one-outstanding-operation invariant.
    outstanding: Option<&'static str>,
}

impl InterviewOrchestrator {
    pub fn new(config: SessionConfig, ports: Ports) -> (Self, OrchestratorHandle) {
        let machine = Machine::new(config.topic.clone(), config.level);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (port_tx, port_rx) = mpsc::channel(PORT_EVENT_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.session().clone());

        let handle = OrchestratorHandle {
            commands: command_tx,
            events: events.clone(),
            snapshot: snapshot_rx,
        };
        let orchestrator = Self {
            machine,
            config,
            ports,
            token: 0,
            fetch_in_flight: false,
            commands: command_rx,
            port_tx,
            port_rx,
            events,
            snapshot_tx,
            outstanding: None,
        };
        (orchestrator, handle)
    }

    /// Drives the session until every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                Some(event) = self.port_rx.recv() => {
                    self.handle_port_event(event).await;
                }
            }
        }
        tracing::debug!("orchestrator shutting down");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => match self.machine.session().state {
                SessionState::Idle => {
                    if self.fetch_in_flight {
                        tracing::warn!("start ignored: question fetch already in flight");
                        return;
                    }
                    self.fetch_in_flight = true;
                    self.spawn_fetch();
                }
                SessionState::Finished => {
                    // Questions are already loaded; restart over the same set.
                    let questions = self.machine.session().questions.clone();
                    self.apply(MachineEvent::QuestionsLoaded { questions }).await;
                }
                state => {
                    tracing::warn!(?state, "start ignored: session already running");
                }
            },
            Command::StopAndEvaluate => {
                if self.machine.session().state != SessionState::Listening {
                    tracing::warn!("stop_and_evaluate ignored: not listening");
                    return;
                }
                self.apply(MachineEvent::StopRequested).await;
            }
            Command::Replay { index } => {
                self.apply(MachineEvent::ReplayRequested { index }).await;
            }
            Command::Reset => {
                self.fetch_in_flight = false;
                self.apply(MachineEvent::ResetRequested).await;
            }
        }
    }

    async fn handle_port_event(&mut self, event: PortEvent) {
        if event.token() != self.token {
            tracing::debug!(?event, "discarding stale port completion");
            return;
        }
        match event {
            PortEvent::QuestionsFetched { result, .. } => {
                self.fetch_in_flight = false;
                self.outstanding = None;
                match result {
                    Ok(questions) => {
                        self.apply(MachineEvent::QuestionsLoaded { questions }).await;
                    }
                    Err(e) => {
                        tracing::warn!("question fetch failed: {e:#}");
                        self.apply(MachineEvent::FetchFailed {
                            message: format!("{e:#}"),
                        })
                        .await;
                    }
                }
            }
            PortEvent::SpeakFinished { result, .. } => {
                self.outstanding = None;
                if let Err(e) = result {
                    // Degrade gracefully: proceed to listening without audio.
                    tracing::warn!("speech output failed, continuing silently: {e}");
                }
                self.apply(MachineEvent::SpeakEnded).await;
            }
            PortEvent::Partial { text, .. } => {
                self.apply(MachineEvent::Partial { text }).await;
            }
            PortEvent::CaptureFinished { result, .. } => {
                self.outstanding = None;
                match result {
                    Ok(transcript) => {
                        self.apply(MachineEvent::CaptureEnded {
                            transcript: transcript.trim().to_string(),
                        })
                        .await;
                    }
                    Err(e) => {
                        tracing::warn!("speech input failed: {e}");
                        self.apply(MachineEvent::CaptureFailed).await;
                    }
                }
            }
            PortEvent::Evaluated { result, .. } => {
                self.outstanding = None;
                let evaluation = match result {
                    Ok(evaluation) => evaluation,
                    Err(e) => {
                        // Local-recoverable: a synthetic zero-score record
                        // keeps the session moving.
                        tracing::warn!("evaluation failed: {e:#}");
                        Evaluation::failed()
                    }
                };
                self.apply(MachineEvent::EvaluationSettled { evaluation }).await;
            }
        }
    }

    /// Feeds one event through the machine and executes the returned
    /// effects in order, then publishes a fresh snapshot.
    async fn apply(&mut self, event: MachineEvent) {
        let effects = self.machine.handle(event);
        for effect in effects {
            match effect {
                Effect::Emit(event) => {
                    // No subscribers is fine.
                    let _ = self.events.send(event);
                }
                Effect::Speak { text } => self.spawn_speak(text),
                Effect::Listen => self.spawn_listen(),
                Effect::Evaluate { question, answer } => self.spawn_evaluate(question, answer),
                Effect::CancelOps => self.cancel_ops().await,
                Effect::Announce { text } => {
                    let port = Arc::clone(&self.ports.speech_out);
                    tokio::spawn(async move {
                        if let Err(e) = port.speak(&text).await {
                            tracing::debug!("announcement skipped: {e}");
                        }
                    });
                }
            }
        }
        let _ = self.snapshot_tx.send(self.machine.session().clone());
    }

    /// Invalidates every in-flight operation and cancels the speech devices.
    async fn cancel_ops(&mut self) {
        self.token = self.token.wrapping_add(1);
        self.outstanding = None;
        self.ports.speech_out.cancel_all().await;
        self.ports.speech_in.cancel_all().await;
    }

    fn track(&mut self, what: &'static str) {
        debug_assert!(
            self.outstanding.is_none(),
            "port operation `{what}` issued while `{}` is outstanding",
            self.outstanding.unwrap_or("?"),
        );
        self.outstanding = Some(what);
    }

    fn spawn_fetch(&mut self) {
        self.track("fetch");
        let token = self.token;
        let provider = Arc::clone(&self.ports.questions);
        let request = QuestionRequest {
            topic: self.config.topic.clone(),
            level: self.config.level,
            count: self.config.question_count,
        };
        let tx = self.port_tx.clone();
        tokio::spawn(async move {
            let result = provider.fetch(&request).await;
            let _ = tx.send(PortEvent::QuestionsFetched { token, result }).await;
        });
    }

    fn spawn_speak(&mut self, text: String) {
        self.track("speak");
        let token = self.token;
        let port = Arc::clone(&self.ports.speech_out);
        let tx = self.port_tx.clone();
        tokio::spawn(async move {
            let result = port.speak(&text).await;
            let _ = tx.send(PortEvent::SpeakFinished { token, result }).await;
        });
    }

    fn spawn_listen(&mut self) {
        self.track("listen");
        let token = self.token;
        let port = Arc::clone(&self.ports.speech_in);
        let tx = self.port_tx.clone();
        tokio::spawn(async move {
            let (partial_tx, mut partial_rx) = mpsc::channel::<String>(16);
            let forward_tx = tx.clone();
            let forward = tokio::spawn(async move {
                while let Some(text) = partial_rx.recv().await {
                    let _ = forward_tx.send(PortEvent::Partial { token, text }).await;
                }
            });
            let result = port.listen(partial_tx).await;
            // Drain interim transcripts before reporting the final one.
            let _ = forward.await;
            let _ = tx.send(PortEvent::CaptureFinished { token, result }).await;
        });
    }

    fn spawn_evaluate(&mut self, question: String, answer: String) {
        self.track("evaluate");
        let token = self.token;
        let evaluator = Arc::clone(&self.ports.evaluator);
        let request = EvaluationRequest {
            question,
            answer,
            topic: self.config.topic.clone(),
        };
        let tx = self.port_tx.clone();
        tokio::spawn(async move {
            let result = evaluator.evaluate(&request).await;
            let _ = tx.send(PortEvent::Evaluated { token, result }).await;
        });
    }
}
