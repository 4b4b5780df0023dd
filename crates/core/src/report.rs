//! Aggregated feedback for a completed (or stopped) session.

use serde::Serialize;

use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub index: usize,
    pub question: String,
    pub answer: String,
    pub score: f32,
    pub summary: String,
}

/// Read-only summary built from a session's results. Pure data, no I/O.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub topic: String,
    pub answered: usize,
    pub average_score: f32,
    pub entries: Vec<ReportEntry>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

impl SessionReport {
    pub fn from_session(session: &Session) -> Self {
        let answered = session.results.len();
        let average_score = if answered == 0 {
            0.0
        } else {
            session
                .results
                .iter()
                .map(|r| r.evaluation.score)
                .sum::<f32>()
                / answered as f32
        };

        let mut strengths: Vec<String> = Vec::new();
        let mut improvements: Vec<String> = Vec::new();
        for record in &session.results {
            for s in &record.evaluation.strengths {
                if !strengths.contains(s) {
                    strengths.push(s.clone());
                }
            }
            for s in &record.evaluation.improvements {
                if !improvements.contains(s) {
                    improvements.push(s.clone());
                }
            }
        }

        let entries = session
            .results
            .iter()
            .enumerate()
            .map(|(index, record)| ReportEntry {
                index,
                question: record.question.clone(),
                answer: record.answer.clone(),
                score: record.evaluation.score,
                summary: record.evaluation.summary.clone(),
            })
            .collect();

        Self {
            topic: session.topic.clone(),
            answered,
            average_score,
            entries,
            strengths,
            improvements,
        }
    }
}

impl std::fmt::Display for SessionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Interview report: {} ({} answered, average {:.1}/10)",
            self.topic, self.answered, self.average_score
        )?;
        for entry in &self.entries {
            writeln!(f, "{:>3}. [{:>4.1}] {}", entry.index + 1, entry.score, entry.question)?;
            if entry.answer.is_empty() {
                writeln!(f, "      A: (no answer)")?;
            } else {
                writeln!(f, "      A: {}", entry.answer)?;
            }
            writeln!(f, "      {}", entry.summary)?;
        }
        if !self.strengths.is_empty() {
            writeln!(f, "Strengths: {}", self.strengths.join("; "))?;
        }
        if !self.improvements.is_empty() {
            writeln!(f, "Improvements: {}", self.improvements.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AnswerRecord, Evaluation, Level};

    fn session_with_results() -> Session {
        let mut session = Session::new("Rust", Level::Senior);
        for (i, score) in [8.0f32, 4.0].iter().enumerate() {
            session.results.push(AnswerRecord {
                question: format!("Q{i}"),
                answer: format!("A{i}"),
                evaluation: Evaluation {
                    score: *score,
                    summary: format!("summary {i}"),
                    strengths: vec!["clear".to_string()],
                    improvements: vec![format!("improve {i}")],
                },
            });
        }
        session
    }

    #[test]
    fn averages_scores_and_dedups_strengths() {
        let report = SessionReport::from_session(&session_with_results());
        assert_eq!(report.answered, 2);
        assert!((report.average_score - 6.0).abs() < f32::EPSILON);
        assert_eq!(report.strengths, vec!["clear"]);
        assert_eq!(
            report.improvements,
            vec!["improve 0".to_string(), "improve 1".to_string()]
        );
    }

    #[test]
    fn empty_session_reports_zero() {
        let report = SessionReport::from_session(&Session::new("Rust", Level::Junior));
        assert_eq!(report.answered, 0);
        assert_eq!(report.average_score, 0.0);
        assert!(report.entries.is_empty());
    }

    #[test]
    fn display_renders_every_entry() {
        let text = SessionReport::from_session(&session_with_results()).to_string();
        assert!(text.contains("Rust"));
        assert!(text.contains("Q0"));
        assert!(text.contains("Q1"));
        assert!(text.contains("6.0"));
    }
}
