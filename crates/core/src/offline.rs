use crate::completion::{CompletionModel, ModelError};
use crate::message::{Speaker, Utterance};
use crate::prompts::{TRANSCRIPT_HEADING, stage_marker};
use crate::stage::InterviewStage;
use async_trait::async_trait;

const OFFLINE_GREETING: &str = "Hello and welcome! This mock interview has four parts: an introduction, \
a few technical questions, some behavioral questions and a short closing. \
To get started, could you introduce yourself and tell me about your background?";

const OFFLINE_FOLLOW_UPS: &[&str] = &[
    "Thanks. Could you walk me through a recent project you are proud of?",
    "How did you decide on the technical approach for that work?",
    "What was the hardest problem you ran into, and how did you solve it?",
    "Tell me about a time you disagreed with a teammate. How did you handle it?",
    "How do you prioritize when several deadlines collide?",
    "What is something you learned from a mistake at work?",
];

const OFFLINE_CLOSING: &str = "Thank you, that brings us to the end of the interview. \
Do you have any questions for me?";

/// A simulated interviewer that never leaves the process.
///
/// This implementation makes no API calls. It greets the candidate, cycles a
/// fixed list of follow-ups until the context reports the closing stage, and
/// declines to analyze transcripts so feedback falls back to the
/// deterministic skeleton. Useful for demos and for running the services
/// without credentials.
pub struct OfflineInterviewer;

#[async_trait]
impl CompletionModel for OfflineInterviewer {
    async fn complete(&self, messages: &[Utterance]) -> Result<String, ModelError> {
        if messages.iter().any(|m| m.text.contains(TRANSCRIPT_HEADING)) {
            return Ok(
                "Offline mode: no model analysis is available for this transcript.".to_string(),
            );
        }

        let answers = messages
            .iter()
            .filter(|m| m.speaker == Speaker::Candidate)
            .count();
        let closing_marker = stage_marker(InterviewStage::Closing);
        let closing = messages
            .iter()
            .any(|m| m.speaker == Speaker::System && m.text.contains(&closing_marker));

        let reply = if closing {
            OFFLINE_CLOSING
        } else if answers == 0 {
            OFFLINE_GREETING
        } else {
            OFFLINE_FOLLOW_UPS[(answers - 1) % OFFLINE_FOLLOW_UPS.len()]
        };
        Ok(reply.to_string())
    }
}
