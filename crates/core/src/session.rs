use serde::{Deserialize, Serialize};

/// The five phases of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Asking,
    Listening,
    Evaluating,
    Finished,
}

/// Candidate experience level, forwarded verbatim to the question source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Junior,
    Mid,
    Senior,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Junior => "junior",
            Level::Mid => "mid",
            Level::Senior => "senior",
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "junior" => Ok(Level::Junior),
            "mid" => Ok(Level::Mid),
            "senior" => Ok(Level::Senior),
            other => Err(format!("unknown level: {other} (expected junior|mid|senior)")),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored, qualitative feedback for a single question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f32,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

impl Evaluation {
    /// The synthetic record appended when the evaluator itself fails.
    /// Evaluation failures never abort the session.
    pub fn failed() -> Self {
        Self {
            score: 0.0,
            summary: "Evaluation failed".to_string(),
            strengths: Vec::new(),
            improvements: Vec::new(),
        }
    }
}

/// One completed question cycle. Immutable once created; `answer` may be
/// empty when no speech was detected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub evaluation: Evaluation,
}

/// The live interview run. Owned and mutated exclusively by the
/// orchestrator task; everything outside sees cloned snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub topic: String,
    pub level: Level,
    /// Immutable once fetched for the session.
    pub questions: Vec<String>,
    /// Invariant: `current_index <= questions.len()`.
    pub current_index: usize,
    pub state: SessionState,
    /// Scratch buffer for the answer in progress, cleared at the start of
    /// each question cycle.
    pub current_transcript: String,
    /// Append-only, one entry per completed question, in question order.
    pub results: Vec<AnswerRecord>,
}

impl Session {
    pub fn new(topic: impl Into<String>, level: Level) -> Self {
        Self {
            topic: topic.into(),
            level,
            questions: Vec::new(),
            current_index: 0,
            state: SessionState::Idle,
            current_transcript: String::new(),
            results: Vec::new(),
        }
    }

    /// The question currently being asked or answered, if any.
    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.current_index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trips_through_from_str() {
        for level in [Level::Junior, Level::Mid, Level::Senior] {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
        assert!("principal".parse::<Level>().is_err());
    }

    #[test]
    fn new_session_starts_idle_and_empty() {
        let session = Session::new("Rust", Level::Mid);
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.questions.is_empty());
        assert!(session.results.is_empty());
        assert_eq!(session.current_index, 0);
        assert_eq!(session.current_question(), None);
    }

    #[test]
    fn failed_evaluation_is_zero_scored() {
        let eval = Evaluation::failed();
        assert_eq!(eval.score, 0.0);
        assert_eq!(eval.summary, "Evaluation failed");
        assert!(eval.strengths.is_empty() && eval.improvements.is_empty());
    }
}
