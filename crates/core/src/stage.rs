use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse phase of the interview narrative.
///
/// Ordering follows the interview: a session's stage never moves backwards
/// because it is always derived from a non-decreasing question counter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStage {
    #[default]
    Introduction,
    Technical,
    Behavioral,
    Closing,
}

impl InterviewStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStage::Introduction => "introduction",
            InterviewStage::Technical => "technical",
            InterviewStage::Behavioral => "behavioral",
            InterviewStage::Closing => "closing",
        }
    }
}

impl fmt::Display for InterviewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a question counter onto the stage table.
///
/// `0` is the introduction, `1..=3` technical, `4..=6` behavioral and
/// everything from `7` onward is closing.
pub fn resolve_stage(question_number: u32) -> InterviewStage {
    match question_number {
        0 => InterviewStage::Introduction,
        1..=3 => InterviewStage::Technical,
        4..=6 => InterviewStage::Behavioral,
        _ => InterviewStage::Closing,
    }
}

/// Outcome of the continuation policy after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Continuation {
    Continue,
    End,
}

/// Ends the interview once enough questions have been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationPolicy {
    question_limit: u32,
}

impl ContinuationPolicy {
    /// 1 introduction + 3 technical + 3 behavioral + 1 closing.
    pub const DEFAULT_QUESTION_LIMIT: u32 = 8;

    pub fn new(question_limit: u32) -> Self {
        Self { question_limit }
    }

    pub fn should_continue(&self, question_number: u32) -> Continuation {
        if question_number >= self.question_limit {
            Continuation::End
        } else {
            Continuation::Continue
        }
    }
}

impl Default for ContinuationPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUESTION_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_table_boundaries() {
        assert_eq!(resolve_stage(0), InterviewStage::Introduction);
        assert_eq!(resolve_stage(1), InterviewStage::Technical);
        assert_eq!(resolve_stage(3), InterviewStage::Technical);
        assert_eq!(resolve_stage(4), InterviewStage::Behavioral);
        assert_eq!(resolve_stage(6), InterviewStage::Behavioral);
        assert_eq!(resolve_stage(7), InterviewStage::Closing);
        assert_eq!(resolve_stage(u32::MAX), InterviewStage::Closing);
    }

    #[test]
    fn test_stage_never_regresses() {
        let stages: Vec<InterviewStage> = (0..50).map(resolve_stage).collect();
        assert!(stages.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_policy_ends_at_limit() {
        let policy = ContinuationPolicy::default();
        for q in 0..8 {
            assert_eq!(policy.should_continue(q), Continuation::Continue, "q={q}");
        }
        assert_eq!(policy.should_continue(8), Continuation::End);
        assert_eq!(policy.should_continue(42), Continuation::End);
    }

    #[test]
    fn test_policy_respects_custom_limit() {
        let policy = ContinuationPolicy::new(3);
        assert_eq!(policy.should_continue(2), Continuation::Continue);
        assert_eq!(policy.should_continue(3), Continuation::End);
    }
}
