//! Interviewer persona, question bank and prompt rendering.

use crate::session::{ExperienceLevel, InterviewRole, QaPair, Session};
use crate::stage::InterviewStage;
use std::collections::HashMap;

/// Heading that introduces the rendered transcript inside a feedback prompt.
pub const TRANSCRIPT_HEADING: &str = "Interview Transcript:";

/// At most this many bank questions are quoted in the framing prompt.
const MAX_SAMPLE_QUESTIONS: usize = 5;

pub const DEFAULT_PERSONA: &str = r#"You are a professional, friendly and encouraging mock interviewer. Your job is to:

1. Run a realistic interview for the candidate's role and experience level
2. Ask one clear question at a time and let the candidate answer fully
3. Give brief, constructive feedback after each answer
4. Ask follow-up questions when an answer is incomplete
5. Move the conversation through the interview stages naturally

Interview stages:
- Introduction: welcome the candidate and set expectations
- Technical: role-specific technical questions
- Behavioral: past experience, problem solving, teamwork
- Closing: wrap up and invite the candidate's own questions

Keep a professional but approachable tone and adapt the difficulty to the candidate's level."#;

pub const DEFAULT_FEEDBACK_INSTRUCTIONS: &str = r#"Analyze the candidate's interview performance and give constructive feedback.

Consider:
1. Clarity and structure of communication
2. Technical knowledge demonstrated
3. Problem-solving approach
4. Use of concrete examples and detail
5. Areas that need improvement

Be specific, actionable and encouraging."#;

/// Sample questions for a role and level.
///
/// `General` has no table of its own and borrows the software engineering one.
pub fn question_bank(role: InterviewRole, level: ExperienceLevel) -> &'static [&'static str] {
    use ExperienceLevel::*;
    use InterviewRole::*;

    match (role, level) {
        (SoftwareEngineer | General, Junior) => &[
            "What programming languages are you most comfortable with?",
            "Can you explain the difference between a list and an array?",
            "What is version control, and why is it important?",
            "Describe a project you've worked on. What was your role?",
        ],
        (SoftwareEngineer | General, Mid) => &[
            "Explain the difference between REST and GraphQL APIs.",
            "How do you approach debugging a complex issue?",
            "Describe a time you had to refactor legacy code.",
            "What design patterns have you used in your projects?",
        ],
        (SoftwareEngineer | General, Senior) => &[
            "How would you design a scalable microservices architecture?",
            "Describe your approach to code review and mentoring.",
            "How do you handle technical debt in a fast-moving team?",
            "Explain a challenging system design problem you solved.",
        ],
        (DataScientist, Junior) => &[
            "What is the difference between supervised and unsupervised learning?",
            "How do you handle missing data in a dataset?",
            "Explain what overfitting means.",
            "What tools and libraries do you use for data analysis?",
        ],
        (DataScientist, Mid) => &[
            "How would you evaluate a machine learning model?",
            "Explain cross-validation and why it's important.",
            "Describe a time you had to deal with imbalanced data.",
            "How do you approach feature engineering?",
        ],
        (DataScientist, Senior) => &[
            "How would you design an ML system for production?",
            "Explain your approach to A/B testing and experimentation.",
            "How do you ensure model fairness and bias mitigation?",
            "Describe a complex data pipeline you've designed.",
        ],
        (ProductManager, Junior) => &[
            "What is the role of a product manager?",
            "How do you prioritize features?",
            "Describe a product you use daily and what you'd improve.",
            "How do you gather user requirements?",
        ],
        (ProductManager, Mid) => &[
            "How do you balance user needs with business goals?",
            "Describe a time you had to say no to a feature request.",
            "How do you measure product success?",
            "Explain your approach to roadmap planning.",
        ],
        (ProductManager, Senior) => &[
            "How do you align product strategy with company vision?",
            "Describe a time you led a product pivot.",
            "How do you handle competing stakeholder interests?",
            "Explain your approach to building product teams.",
        ],
    }
}

/// The instruction texts used to frame completion calls.
///
/// Defaults are compiled in; individual entries can be replaced from a
/// directory of markdown files (see [`crate::prompt_loader`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub persona: String,
    pub feedback: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            feedback: DEFAULT_FEEDBACK_INSTRUCTIONS.to_string(),
        }
    }
}

impl PromptSet {
    /// Replaces the persona and feedback instructions with entries keyed
    /// `persona` and `feedback`; other keys are ignored.
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        if let Some(persona) = overrides.get("persona") {
            self.persona = persona.clone();
        }
        if let Some(feedback) = overrides.get("feedback") {
            self.feedback = feedback.clone();
        }
        self
    }

    /// The single framing prompt of the very first turn.
    pub fn opening_prompt(&self, session: &Session) -> String {
        let role = session.role();
        let level = session.experience_level();
        let samples = question_bank(role, level)
            .iter()
            .take(MAX_SAMPLE_QUESTIONS)
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"{persona}

You are conducting a {level} level interview for a {role} position.

Key focus areas:
- Technical competency appropriate for {level} level
- Problem-solving approach
- Communication skills
- Relevant experience

Sample questions you might ask:
{samples}

Candidate name: {name}

Start with a warm, professional greeting. Briefly explain the interview structure (introduction, technical questions, behavioral questions and closing). Then ask the candidate to introduce themselves and describe their background.

Keep your response concise and natural."#,
            persona = self.persona,
            role = role.display_name(),
            name = session.candidate_name(),
        )
    }

    /// The system context that precedes the trimmed history on later turns.
    pub fn stage_context(&self, session: &Session) -> String {
        let stage = session.stage();
        format!(
            r#"You are interviewing a {level} level candidate for a {role} position.
{marker} ({hint})
Questions asked so far: {count}

Continue the interview naturally. Ask one clear question at a time, give brief feedback on answers and guide the conversation through the interview stages."#,
            level = session.experience_level(),
            role = session.role().display_name(),
            marker = stage_marker(stage),
            hint = stage_hint(stage),
            count = session.question_number(),
        )
    }

    pub fn feedback_prompt(
        &self,
        transcript: &[QaPair],
        question_count: usize,
        role: InterviewRole,
        level: ExperienceLevel,
    ) -> String {
        format!(
            r#"{instructions}

Interview Details:
Role: {role}
Experience Level: {level}
Number of Questions: {question_count}

{TRANSCRIPT_HEADING}
{transcript}

Provide detailed, constructive feedback in the following format:

1. Overall Score (0-100): [number]
2. Key Strengths (2-3 points):
   - [strength 1]
   - [strength 2]
3. Areas for Improvement (2-3 points):
   - [area 1]
   - [area 2]
4. Detailed Analysis:
   [specific analysis of technical knowledge, communication and problem solving]
5. Recommendations (2-3 actionable items):
   - [recommendation 1]
   - [recommendation 2]"#,
            instructions = self.feedback,
            role = role.display_name(),
            transcript = render_transcript(transcript),
        )
    }
}

/// Renders `Q1: ...\nA1: ...` blocks separated by blank lines.
pub fn render_transcript(transcript: &[QaPair]) -> String {
    transcript
        .iter()
        .enumerate()
        .map(|(i, pair)| format!("Q{n}: {}\nA{n}: {}", pair.question, pair.answer, n = i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The line of the stage context that names the current stage.
pub fn stage_marker(stage: InterviewStage) -> String {
    format!("Current stage: {stage}")
}

fn stage_hint(stage: InterviewStage) -> &'static str {
    match stage {
        InterviewStage::Introduction => "get to know the candidate",
        InterviewStage::Technical => "role-specific technical questions",
        InterviewStage::Behavioral => "past experience, teamwork and problem solving",
        InterviewStage::Closing => "wrap up and invite the candidate's questions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_role_borrows_engineering_bank() {
        assert_eq!(
            question_bank(InterviewRole::General, ExperienceLevel::Senior),
            question_bank(InterviewRole::SoftwareEngineer, ExperienceLevel::Senior)
        );
    }

    #[test]
    fn test_opening_prompt_mentions_name_role_and_bank() {
        let session = Session::new(
            InterviewRole::DataScientist,
            ExperienceLevel::Junior,
            Some("Ana".into()),
        );
        let prompt = PromptSet::default().opening_prompt(&session);
        assert!(prompt.contains("Candidate name: Ana"));
        assert!(prompt.contains("data scientist"));
        assert!(prompt.contains("- Explain what overfitting means."));
        assert!(prompt.contains("introduce themselves"));
    }

    #[test]
    fn test_stage_context_reports_stage_and_count() {
        let session = Session::new(InterviewRole::ProductManager, ExperienceLevel::Mid, None);
        let context = PromptSet::default().stage_context(&session);
        assert!(context.contains("Current stage: introduction"));
        assert!(context.contains("Questions asked so far: 0"));
        assert!(context.contains("product manager"));
    }

    #[test]
    fn test_feedback_prompt_renders_transcript() {
        let transcript = vec![
            QaPair {
                question: "What is Rust?".into(),
                answer: "A systems language.".into(),
            },
            QaPair {
                question: "Why ownership?".into(),
                answer: "Memory safety.".into(),
            },
        ];
        let prompt = PromptSet::default().feedback_prompt(
            &transcript,
            2,
            InterviewRole::SoftwareEngineer,
            ExperienceLevel::Senior,
        );
        assert!(prompt.contains(TRANSCRIPT_HEADING));
        assert!(prompt.contains("Q1: What is Rust?\nA1: A systems language.\n\nQ2: Why ownership?"));
        assert!(prompt.contains("Overall Score (0-100)"));
    }

    #[test]
    fn test_overrides_replace_known_keys_only() {
        let mut overrides = HashMap::new();
        overrides.insert("persona".to_string(), "Be terse.".to_string());
        overrides.insert("unrelated".to_string(), "ignored".to_string());
        let prompts = PromptSet::default().with_overrides(&overrides);
        assert_eq!(prompts.persona, "Be terse.");
        assert_eq!(prompts.feedback, DEFAULT_FEEDBACK_INSTRUCTIONS);
    }
}
