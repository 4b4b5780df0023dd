mod config;
mod console;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::fmt::time::ChronoLocal;
use viva_core::evaluator::LlmEvaluator;
use viva_core::event::SessionEvent;
use viva_core::orchestrator::{InterviewOrchestrator, Ports, SessionConfig};
use viva_core::questions::LlmQuestionProvider;
use viva_core::report::SessionReport;
use viva_core::session::Level;

use crate::config::Config;
use crate::console::{ConsoleSpeechInput, ConsoleSpeechOutput};

#[derive(Parser)]
#[command(version, about = "Run a spoken mock interview from the console")]
struct Cli {
    /// The topic to be interviewed on
    topic: String,

    /// Candidate experience level (junior|mid|senior)
    #[arg(long, default_value = "junior")]
    level: Level,

    /// Number of questions to fetch, overrides VIVA_QUESTION_COUNT
    #[arg(long)]
    count: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    tracing::info!(topic = %args.topic, level = %args.level, "Starting viva session");

    // --- 4. Wire the Ports ---
    let ports = Ports {
        speech_out: Arc::new(ConsoleSpeechOutput::new()),
        speech_in: Arc::new(ConsoleSpeechInput::new(config.answer_timeout)),
        evaluator: Arc::new(LlmEvaluator::new(
            config.openai_api_key.clone(),
            config.chat_model.clone(),
        )),
        questions: Arc::new(LlmQuestionProvider::new(
            config.openai_api_key.clone(),
            config.chat_model.clone(),
        )),
    };

    let session_config = SessionConfig {
        topic: args.topic,
        level: args.level,
        question_count: args.count.unwrap_or(config.question_count),
    };
    let (orchestrator, handle) = InterviewOrchestrator::new(session_config, ports);
    let mut events = handle.subscribe();
    tokio::spawn(orchestrator.run());

    handle.start().await?;

    // --- 5. Follow the Session ---
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::TranscriptUpdated { text }) if !text.is_empty() => {
                    tracing::debug!("heard: {text}");
                }
                Ok(SessionEvent::ResultAppended { index, record }) => {
                    println!(
                        "[{}] scored {:.1}/10: {}",
                        index + 1,
                        record.evaluation.score,
                        record.evaluation.summary
                    );
                }
                Ok(SessionEvent::SessionFinished { answered }) => {
                    tracing::info!("Session finished with {answered} answers");
                    break;
                }
                Ok(SessionEvent::FetchFailed { message }) => {
                    anyhow::bail!("Could not fetch interview questions: {message}");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Event stream closed unexpectedly: {e}");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, ending the session early");
                break;
            }
        }
    }

    // --- 6. Print the Report ---
    let report = SessionReport::from_session(&handle.snapshot());
    println!("\n{report}");

    Ok(())
}
