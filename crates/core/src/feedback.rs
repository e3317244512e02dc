//! End-of-interview feedback.
//!
//! The reducer renders the question/answer transcript, asks the model for a
//! review in a fixed numbered format and then tries to read that format
//! back. When the reply cannot be read, the structured fields fall back to a
//! fixed skeleton and only the narrative summary carries model output.

use crate::completion::{CompletionModel, ModelError};
use crate::message::Utterance;
use crate::prompts::PromptSet;
use crate::session::{ExperienceLevel, InterviewRole, pair_transcript};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SKELETON_SCORE: u8 = 75;

const SKELETON_STRENGTHS: &[&str] = &[
    "Clear communication skills demonstrated",
    "Good understanding of fundamental concepts",
];

const SKELETON_IMPROVEMENTS: &[&str] = &[
    "Provide more specific examples from experience",
    "Elaborate on technical problem-solving approaches",
];

const SKELETON_RECOMMENDATIONS: &[&str] = &[
    "Practice using the STAR method (Situation, Task, Action, Result) for behavioral questions",
    "Review core technical concepts relevant to the role",
    "Prepare specific examples from past projects",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedFeedback {
    /// Model narrative, verbatim.
    pub summary: String,
    pub role: InterviewRole,
    pub experience_level: ExperienceLevel,
    pub questions_answered: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether score and lists were read from the model reply.
    pub structured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub overall_score: u8,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub detailed_feedback: DetailedFeedback,
    pub recommendations: Vec<String>,
}

/// Score and lists recovered from a model review.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFeedback {
    pub overall_score: u8,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}

pub struct FeedbackReducer {
    model: Arc<dyn CompletionModel>,
    prompts: Arc<PromptSet>,
    timeout: Duration,
}

impl FeedbackReducer {
    pub fn new(model: Arc<dyn CompletionModel>, prompts: Arc<PromptSet>, timeout: Duration) -> Self {
        Self {
            model,
            prompts,
            timeout,
        }
    }

    /// Reviews the interview. Never fails: empty input and model failures
    /// both produce a zero-score placeholder.
    pub async fn summarize(
        &self,
        questions: &[String],
        answers: &[String],
        role: InterviewRole,
        level: ExperienceLevel,
    ) -> FeedbackResult {
        if questions.is_empty() || answers.is_empty() {
            tracing::warn!("No answers or questions to review; returning placeholder feedback");
            return FeedbackResult {
                overall_score: 0,
                strengths: Vec::new(),
                areas_for_improvement: vec!["No answers provided during the interview".to_string()],
                detailed_feedback: DetailedFeedback {
                    summary: "Interview was not completed.".to_string(),
                    role,
                    experience_level: level,
                    questions_answered: answers.len(),
                    error: None,
                    structured: false,
                },
                recommendations: vec![
                    "Complete a full interview session to receive feedback".to_string(),
                ],
            };
        }

        let transcript = pair_transcript(questions, answers);
        let prompt = self
            .prompts
            .feedback_prompt(&transcript, questions.len(), role, level);
        tracing::debug!(
            "Requesting feedback for {} transcript pairs ({} prompt chars)",
            transcript.len(),
            prompt.len()
        );

        let reply = match tokio::time::timeout(
            self.timeout,
            self.model.complete(&[Utterance::system(prompt)]),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.timeout)),
        };

        match reply {
            Ok(text) => self.review_result(text, role, level, answers.len()),
            Err(e) => {
                tracing::error!("Error generating feedback: {}", e);
                FeedbackResult {
                    overall_score: 0,
                    strengths: Vec::new(),
                    areas_for_improvement: vec![
                        "Unable to generate feedback due to technical error".to_string(),
                    ],
                    detailed_feedback: DetailedFeedback {
                        summary: String::new(),
                        role,
                        experience_level: level,
                        questions_answered: answers.len(),
                        error: Some(e.to_string()),
                        structured: false,
                    },
                    recommendations: vec!["Please try again later".to_string()],
                }
            }
        }
    }

    fn review_result(
        &self,
        text: String,
        role: InterviewRole,
        level: ExperienceLevel,
        questions_answered: usize,
    ) -> FeedbackResult {
        let parsed = parse_feedback(&text);
        let structured = parsed.is_some();
        let parsed = parsed.unwrap_or_else(|| {
            tracing::debug!("Feedback reply did not follow the requested format; using skeleton");
            ParsedFeedback {
                overall_score: SKELETON_SCORE,
                strengths: to_strings(SKELETON_STRENGTHS),
                areas_for_improvement: to_strings(SKELETON_IMPROVEMENTS),
                recommendations: to_strings(SKELETON_RECOMMENDATIONS),
            }
        });

        let recommendations = if parsed.recommendations.is_empty() {
            to_strings(SKELETON_RECOMMENDATIONS)
        } else {
            parsed.recommendations
        };

        FeedbackResult {
            overall_score: parsed.overall_score,
            strengths: parsed.strengths,
            areas_for_improvement: parsed.areas_for_improvement,
            detailed_feedback: DetailedFeedback {
                summary: text,
                role,
                experience_level: level,
                questions_answered,
                error: None,
                structured,
            },
            recommendations,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Score,
    Strengths,
    Improvements,
    Analysis,
    Recommendations,
}

/// Reads the numbered review format requested by the feedback prompt.
///
/// Returns `None` unless a score in `0..=100`, at least one strength and at
/// least one area for improvement were found.
pub fn parse_feedback(text: &str) -> Option<ParsedFeedback> {
    let mut parsed = ParsedFeedback::default();
    let mut score = None;
    let mut section = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(item) = bullet_text(line) {
            match section {
                Some(Section::Strengths) => parsed.strengths.push(item),
                Some(Section::Improvements) => parsed.areas_for_improvement.push(item),
                Some(Section::Recommendations) => parsed.recommendations.push(item),
                _ => {}
            }
            continue;
        }

        if let Some(next) = heading_section(line) {
            section = Some(next);
            if next == Section::Score {
                // "Overall Score (0-100): 82" carries the value after the colon.
                if let Some((_, value)) = line.rsplit_once(':') {
                    score = score.or_else(|| score_in(value));
                }
            }
            continue;
        }

        // "1. Overall Score (0-100):" followed by the number on its own line.
        if section == Some(Section::Score) && score.is_none() {
            score = score_in(line);
        }
    }

    parsed.overall_score = score?;
    if parsed.strengths.is_empty() || parsed.areas_for_improvement.is_empty() {
        return None;
    }
    Some(parsed)
}

fn bullet_text(line: &str) -> Option<String> {
    let rest = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))?;
    let item = rest.trim().trim_matches('*').trim();
    (!item.is_empty()).then(|| item.to_string())
}

fn heading_section(line: &str) -> Option<Section> {
    let stripped = line.trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());
    let unnumbered = stripped.trim_start_matches(|c: char| c.is_ascii_digit());
    let unnumbered = unnumbered
        .strip_prefix('.')
        .or_else(|| unnumbered.strip_prefix(')'))
        .unwrap_or(unnumbered)
        .trim_start_matches(|c: char| c == '*' || c.is_whitespace())
        .to_lowercase();

    if unnumbered.starts_with("overall score") || unnumbered.starts_with("score") {
        Some(Section::Score)
    } else if unnumbered.starts_with("key strengths") || unnumbered.starts_with("strengths") {
        Some(Section::Strengths)
    } else if unnumbered.starts_with("areas for improvement")
        || unnumbered.starts_with("improvements")
    {
        Some(Section::Improvements)
    } else if unnumbered.starts_with("detailed analysis") {
        Some(Section::Analysis)
    } else if unnumbered.starts_with("recommendations") {
        Some(Section::Recommendations)
    } else {
        None
    }
}

fn score_in(text: &str) -> Option<u8> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u8>().ok().filter(|score| *score <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::MockCompletionModel;

    const WELL_FORMED: &str = r#"1. Overall Score (0-100): 82
2. Key Strengths (2-3 points):
   - Explained trade-offs clearly
   - **Solid grasp of HTTP semantics**
3. Areas for Improvement (2-3 points):
   - Quantify the impact of past work
4. Detailed Analysis:
   The candidate communicated well and reasoned about failure modes.
5. Recommendations (2-3 actionable items):
   - Practice system design whiteboarding
   - Prepare STAR stories"#;

    fn reducer(model: MockCompletionModel) -> FeedbackReducer {
        FeedbackReducer::new(
            Arc::new(model),
            Arc::new(PromptSet::default()),
            Duration::from_secs(30),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        to_strings(items)
    }

    #[test]
    fn test_parse_well_formed_review() {
        let parsed = parse_feedback(WELL_FORMED).unwrap();
        assert_eq!(parsed.overall_score, 82);
        assert_eq!(
            parsed.strengths,
            strings(&["Explained trade-offs clearly", "Solid grasp of HTTP semantics"])
        );
        assert_eq!(parsed.areas_for_improvement, strings(&["Quantify the impact of past work"]));
        assert_eq!(parsed.recommendations.len(), 2);
    }

    #[test]
    fn test_parse_score_on_following_line() {
        let text = "## Overall Score (0-100):\n**68**\n## Strengths\n- Calm\n## Areas for Improvement\n- Depth";
        let parsed = parse_feedback(text).unwrap();
        assert_eq!(parsed.overall_score, 68);
        assert!(parsed.recommendations.is_empty());
    }

    #[test]
    fn test_parse_rejects_free_text_and_out_of_range_scores() {
        assert!(parse_feedback("Great interview overall, well done!").is_none());
        let text = "1. Overall Score (0-100): 180\n2. Key Strengths:\n- a\n3. Areas for Improvement:\n- b";
        assert!(parse_feedback(text).is_none());
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_the_model() {
        // --- 1. Arrange ---
        let mut model = MockCompletionModel::new();
        model.expect_complete().never();
        let reducer = reducer(model);

        // --- 2. Act ---
        let result = reducer
            .summarize(&[], &[], InterviewRole::General, ExperienceLevel::Mid)
            .await;

        // --- 3. Assert ---
        assert_eq!(result.overall_score, 0);
        assert!(!result.areas_for_improvement.is_empty());
        assert!(result.strengths.is_empty());
    }

    #[tokio::test]
    async fn test_structured_reply_is_used() {
        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .withf(|messages| {
                messages.len() == 1 && messages[0].text.contains("Q1: What is Rust?\nA1: A language.")
            })
            .returning(|_| Ok(WELL_FORMED.to_string()))
            .once();
        let reducer = reducer(model);

        let result = reducer
            .summarize(
                &strings(&["What is Rust?", "Why ownership?"]),
                &strings(&["A language."]),
                InterviewRole::SoftwareEngineer,
                ExperienceLevel::Senior,
            )
            .await;

        assert_eq!(result.overall_score, 82);
        assert!(result.detailed_feedback.structured);
        assert_eq!(result.detailed_feedback.summary, WELL_FORMED);
        assert_eq!(result.detailed_feedback.questions_answered, 1);
    }

    #[tokio::test]
    async fn test_free_text_reply_keeps_skeleton() {
        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .returning(|_| Ok("You did fine. Keep practicing.".to_string()));
        let reducer = reducer(model);

        let result = reducer
            .summarize(
                &strings(&["Tell me about yourself?"]),
                &strings(&["I'm Ana."]),
                InterviewRole::ProductManager,
                ExperienceLevel::Junior,
            )
            .await;

        assert_eq!(result.overall_score, SKELETON_SCORE);
        assert_eq!(result.strengths.len(), 2);
        assert_eq!(result.areas_for_improvement.len(), 2);
        assert_eq!(result.recommendations.len(), 3);
        assert!(!result.detailed_feedback.structured);
        assert_eq!(result.detailed_feedback.summary, "You did fine. Keep practicing.");
    }

    #[tokio::test]
    async fn test_model_failure_yields_zero_score_with_cause() {
        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .returning(|_| Err(ModelError::EmptyResponse));
        let reducer = reducer(model);

        let result = reducer
            .summarize(
                &strings(&["Q?"]),
                &strings(&["A"]),
                InterviewRole::DataScientist,
                ExperienceLevel::Mid,
            )
            .await;

        assert_eq!(result.overall_score, 0);
        assert!(result.detailed_feedback.error.is_some());
        assert_eq!(
            result.areas_for_improvement,
            strings(&["Unable to generate feedback due to technical error"])
        );
    }
}
