use crate::error::InterviewError;
use crate::message::Utterance;
use crate::stage::{InterviewStage, resolve_stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_CANDIDATE_NAME: &str = "Candidate";

/// The position the candidate is interviewing for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewRole {
    SoftwareEngineer,
    DataScientist,
    ProductManager,
    #[default]
    General,
}

impl InterviewRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewRole::SoftwareEngineer => "software_engineer",
            InterviewRole::DataScientist => "data_scientist",
            InterviewRole::ProductManager => "product_manager",
            InterviewRole::General => "general",
        }
    }

    /// Human readable form used inside prompts, e.g. "software engineer".
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for InterviewRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewRole {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "software_engineer" => Ok(InterviewRole::SoftwareEngineer),
            "data_scientist" => Ok(InterviewRole::DataScientist),
            "product_manager" => Ok(InterviewRole::ProductManager),
            "general" => Ok(InterviewRole::General),
            other => Err(InterviewError::invalid_input(format!(
                "unknown interview role '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    #[default]
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(ExperienceLevel::Junior),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            other => Err(InterviewError::invalid_input(format!(
                "unknown experience level '{other}'"
            ))),
        }
    }
}

/// One question/answer pair of the transcript handed to the feedback reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Monitoring view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub role: InterviewRole,
    pub experience_level: ExperienceLevel,
    pub candidate_name: String,
    pub stage: InterviewStage,
    pub question_number: u32,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ended: bool,
}

/// State of one interview instance.
///
/// History is append-only and the stage is always derived from the question
/// counter, so every mutation goes through the crate-private methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    session_id: String,
    role: InterviewRole,
    experience_level: ExperienceLevel,
    candidate_name: String,
    stage: InterviewStage,
    question_number: u32,
    history: Vec<Utterance>,
    questions_asked: Vec<String>,
    answers_given: Vec<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    last_activity_at: DateTime<Utc>,
    /// Set once the continuation policy signals the end of the interview.
    completed: bool,
}

impl Session {
    pub fn new(
        role: InterviewRole,
        experience_level: ExperienceLevel,
        candidate_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let candidate_name = candidate_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CANDIDATE_NAME.to_string());

        Self {
            session_id: Uuid::new_v4().to_string(),
            role,
            experience_level,
            candidate_name,
            stage: InterviewStage::Introduction,
            question_number: 0,
            history: Vec::new(),
            questions_asked: Vec::new(),
            answers_given: Vec::new(),
            started_at: now,
            ended_at: None,
            last_activity_at: now,
            completed: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn role(&self) -> InterviewRole {
        self.role
    }

    pub fn experience_level(&self) -> ExperienceLevel {
        self.experience_level
    }

    pub fn candidate_name(&self) -> &str {
        &self.candidate_name
    }

    pub fn stage(&self) -> InterviewStage {
        self.stage
    }

    pub fn question_number(&self) -> u32 {
        self.question_number
    }

    pub fn history(&self) -> &[Utterance] {
        &self.history
    }

    pub fn questions_asked(&self) -> &[String] {
        &self.questions_asked
    }

    pub fn answers_given(&self) -> &[String] {
        &self.answers_given
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    /// True once the question limit has been reached.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// A terminal session accepts no further turns.
    pub fn is_terminal(&self) -> bool {
        self.completed || self.ended_at.is_some()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            role: self.role,
            experience_level: self.experience_level,
            candidate_name: self.candidate_name.clone(),
            stage: self.stage,
            question_number: self.question_number,
            started_at: self.started_at,
            last_activity_at: self.last_activity_at,
            ended: self.is_terminal(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.last_activity_at).to_std() {
            Ok(idle) => idle > ttl,
            // last activity lies in the future
            Err(_) => false,
        }
    }

    pub(crate) fn record_candidate(&mut self, text: String) {
        self.history.push(Utterance::candidate(text.clone()));
        self.answers_given.push(text);
    }

    /// Appends an interviewer turn and returns whether it was classified as a question.
    pub(crate) fn record_interviewer(&mut self, text: String, min_question_len: usize) -> bool {
        let is_question = looks_like_question(&text, min_question_len);
        self.history.push(Utterance::interviewer(text.clone()));
        if is_question {
            self.questions_asked.push(text);
        }
        is_question
    }

    pub(crate) fn advance_question(&mut self) {
        self.question_number += 1;
    }

    pub(crate) fn sync_stage(&mut self) {
        self.stage = resolve_stage(self.question_number);
    }

    pub(crate) fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Sets `ended_at` the first time it is called and returns the stored value.
    pub(crate) fn end(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        *self.ended_at.get_or_insert(now)
    }
}

/// Pairs `questions[i]` with `answers[i]`, truncated to the shorter list.
///
/// Pairing is positional: an interviewer turn that was not classified as a
/// question does not consume an index, so a reply to such a turn shifts
/// every later answer one question forward.
pub fn pair_transcript(questions: &[String], answers: &[String]) -> Vec<QaPair> {
    questions
        .iter()
        .zip(answers)
        .map(|(question, answer)| QaPair {
            question: question.clone(),
            answer: answer.clone(),
        })
        .collect()
}

/// Heuristic used to decide whether an interviewer turn asks something.
pub fn looks_like_question(text: &str, min_len: usize) -> bool {
    text.contains('?') && text.chars().count() > min_len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            InterviewRole::SoftwareEngineer,
            ExperienceLevel::Mid,
            Some("Ana".to_string()),
        )
    }

    #[test]
    fn test_new_session_starts_in_introduction() {
        let session = session();
        assert_eq!(session.stage(), InterviewStage::Introduction);
        assert_eq!(session.question_number(), 0);
        assert!(session.history().is_empty());
        assert!(session.ended_at().is_none());
        assert!(!session.is_terminal());
        assert_eq!(session.candidate_name(), "Ana");
    }

    #[test]
    fn test_blank_name_defaults_to_candidate() {
        let session = Session::new(InterviewRole::General, ExperienceLevel::Junior, Some("  ".into()));
        assert_eq!(session.candidate_name(), DEFAULT_CANDIDATE_NAME);
        let session = Session::new(InterviewRole::General, ExperienceLevel::Junior, None);
        assert_eq!(session.candidate_name(), DEFAULT_CANDIDATE_NAME);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(session().session_id(), session().session_id());
    }

    #[test]
    fn test_question_classification() {
        assert!(looks_like_question("What is a mutex, exactly?", 10));
        assert!(!looks_like_question("Why?", 10));
        assert!(!looks_like_question("Thank you for sharing that with me.", 10));
    }

    #[test]
    fn test_record_interviewer_only_tracks_questions() {
        let mut session = session();
        assert!(session.record_interviewer("How do you approach debugging?".into(), 10));
        assert!(!session.record_interviewer("Great, thanks.".into(), 10));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.questions_asked().len(), 1);
    }

    #[test]
    fn test_transcript_pairs_by_position_and_truncates() {
        let mut session = session();
        session.record_interviewer("Could you introduce yourself?".into(), 10);
        session.record_candidate("I'm a backend engineer.".into());
        session.record_interviewer("Nice to meet you.".into(), 10);
        session.record_candidate("Thanks!".into());
        session.record_interviewer("What design patterns have you used?".into(), 10);

        let transcript = pair_transcript(session.questions_asked(), session.answers_given());
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].answer, "I'm a backend engineer.");
        // The reply to the non-question turn is paired with the next question.
        assert_eq!(transcript[1].question, "What design patterns have you used?");
        assert_eq!(transcript[1].answer, "Thanks!");
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut session = session();
        let first = session.end(Utc::now());
        let second = session.end(first + chrono::Duration::seconds(30));
        assert_eq!(first, second);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_expiry_uses_last_activity() {
        let mut session = session();
        let now = Utc::now();
        session.touch(now - chrono::Duration::seconds(1801));
        assert!(session.is_expired(now, Duration::from_secs(1800)));
        session.touch(now);
        assert!(!session.is_expired(now, Duration::from_secs(1800)));
    }

    #[test]
    fn test_role_and_level_parsing() {
        assert_eq!(
            "software-engineer".parse::<InterviewRole>().unwrap(),
            InterviewRole::SoftwareEngineer
        );
        assert_eq!("Senior".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Senior);
        assert!("wizard".parse::<InterviewRole>().is_err());
        assert!("principal".parse::<ExperienceLevel>().is_err());
        assert_eq!(InterviewRole::DataScientist.display_name(), "data scientist");
    }

    #[test]
    fn test_stage_serializes_lowercase_in_snapshot() {
        let json = serde_json::to_value(session()).unwrap();
        assert_eq!(json["stage"], "introduction");
        assert_eq!(json["role"], "software_engineer");
        assert_eq!(json["experience_level"], "mid");
    }
}
