use crate::message::Utterance;
use crate::prompts::PromptSet;
use crate::session::Session;

/// Assembles the bounded message list sent to the completion model for one turn.
///
/// The window is a read-only projection: history that falls outside it is
/// left out of the prompt but stays in the session.
pub struct ContextBuilder<'a> {
    prompts: &'a PromptSet,
    history_window: usize,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(prompts: &'a PromptSet, history_window: usize) -> Self {
        Self {
            prompts,
            history_window,
        }
    }

    pub fn build(&self, session: &Session) -> Vec<Utterance> {
        let history = session.history();
        if history.is_empty() {
            return vec![Utterance::system(self.prompts.opening_prompt(session))];
        }

        let start = history.len().saturating_sub(self.history_window);
        let mut messages = Vec::with_capacity(history.len() - start + 1);
        messages.push(Utterance::system(self.prompts.stage_context(session)));
        messages.extend_from_slice(&history[start..]);

        tracing::debug!(
            "Built context for session {}: {} of {} history entries",
            session.session_id(),
            history.len() - start,
            history.len()
        );
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Speaker;
    use crate::session::{ExperienceLevel, InterviewRole};

    fn session_with_turns(turns: usize) -> Session {
        let mut session = Session::new(
            InterviewRole::SoftwareEngineer,
            ExperienceLevel::Mid,
            Some("Ana".into()),
        );
        for i in 0..turns {
            if i % 2 == 0 {
                session.record_interviewer(format!("Question number {i}?"), 10);
            } else {
                session.record_candidate(format!("Answer {i}"));
            }
        }
        session
    }

    #[test]
    fn test_empty_history_yields_single_framing_message() {
        let prompts = PromptSet::default();
        let session = session_with_turns(0);
        let messages = ContextBuilder::new(&prompts, 10).build(&session);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].speaker, Speaker::System);
        assert!(messages[0].text.contains("Candidate name: Ana"));
        assert!(messages[0].text.contains(&prompts.persona));
    }

    #[test]
    fn test_short_history_is_kept_whole() {
        let prompts = PromptSet::default();
        let session = session_with_turns(3);
        let messages = ContextBuilder::new(&prompts, 10).build(&session);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].speaker, Speaker::System);
        assert!(messages[0].text.contains("Current stage: introduction"));
        assert_eq!(&messages[1..], session.history());
    }

    #[test]
    fn test_long_history_keeps_most_recent_entries_in_order() {
        let prompts = PromptSet::default();
        let session = session_with_turns(25);
        let messages = ContextBuilder::new(&prompts, 10).build(&session);

        assert_eq!(messages.len(), 11);
        assert_eq!(&messages[1..], &session.history()[15..]);
        assert_eq!(messages.last().map(|m| m.text.as_str()), Some("Question number 24?"));
        // Projection only: the session still holds every turn.
        assert_eq!(session.history().len(), 25);
    }

    #[test]
    fn test_zero_window_sends_only_the_system_context() {
        let prompts = PromptSet::default();
        let session = session_with_turns(4);
        let messages = ContextBuilder::new(&prompts, 0).build(&session);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].speaker, Speaker::System);
    }
}
