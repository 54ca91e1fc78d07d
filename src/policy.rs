// Advancement policy: does a submission move its question into the
// session's completed set?
//
// The rule is configuration data keyed on (game category, question type),
// not a branch on game titles. Observer-judged games advance on every
// submission; self-judged games advance only on a correct answer.

use crate::{GameCategory, QuestionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancementPolicy {
    /// Add to the completed set only when the answer is correct. Wrong
    /// answers leave the question pending and retryable.
    OnCorrect,
    /// Add to the completed set on every submission, correct or not.
    /// Used where judgment is informational (read-aloud) or deferred to a
    /// human observer (the letter-detective pedagogy).
    AlwaysAdvance,
}

/// Policy table. `None` in the question-type slot matches every type in the
/// category. First match wins; no entry means `OnCorrect`.
const POLICY_TABLE: &[(GameCategory, Option<QuestionType>, AdvancementPolicy)] = &[
    (
        GameCategory::LetterDetective,
        None,
        AdvancementPolicy::AlwaysAdvance,
    ),
    (
        GameCategory::Spelling,
        Some(QuestionType::ReadSentence),
        AdvancementPolicy::AlwaysAdvance,
    ),
];

pub fn advancement_policy(
    category: &GameCategory,
    question_type: &QuestionType,
) -> AdvancementPolicy {
    POLICY_TABLE
        .iter()
        .find(|(cat, qt, _)| cat == category && qt.as_ref().map_or(true, |t| t == question_type))
        .map(|(_, _, policy)| *policy)
        .unwrap_or(AdvancementPolicy::OnCorrect)
}

/// Whether this submission moves the question into the completed set.
pub fn should_advance(policy: AdvancementPolicy, is_correct: bool) -> bool {
    match policy {
        AdvancementPolicy::OnCorrect => is_correct,
        AdvancementPolicy::AlwaysAdvance => true,
    }
}

/// Whether the client should offer another try at this question.
/// Observer-judged questions can always be replayed for practice; read-aloud
/// questions are one-way; everything else retries until correct.
pub fn can_retry(
    policy: AdvancementPolicy,
    question_type: &QuestionType,
    is_correct: bool,
) -> bool {
    match policy {
        AdvancementPolicy::OnCorrect => !is_correct,
        AdvancementPolicy::AlwaysAdvance => *question_type != QuestionType::ReadSentence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detective_always_advances_for_every_type() {
        for qt in [
            QuestionType::FindDifference,
            QuestionType::DragMatch,
            QuestionType::FillBlank,
        ] {
            assert_eq!(
                advancement_policy(&GameCategory::LetterDetective, &qt),
                AdvancementPolicy::AlwaysAdvance
            );
        }
    }

    #[test]
    fn spelling_advances_on_read_sentence_only() {
        assert_eq!(
            advancement_policy(&GameCategory::Spelling, &QuestionType::ReadSentence),
            AdvancementPolicy::AlwaysAdvance
        );
        assert_eq!(
            advancement_policy(&GameCategory::Spelling, &QuestionType::CompleteWord),
            AdvancementPolicy::OnCorrect
        );
        assert_eq!(
            advancement_policy(&GameCategory::Spelling, &QuestionType::ArrangeSyllables),
            AdvancementPolicy::OnCorrect
        );
    }

    #[test]
    fn default_policy_is_on_correct() {
        assert_eq!(
            advancement_policy(&GameCategory::VowelSounds, &QuestionType::VocalFill),
            AdvancementPolicy::OnCorrect
        );
        assert_eq!(
            advancement_policy(&GameCategory::General, &QuestionType::FillBlank),
            AdvancementPolicy::OnCorrect
        );
    }

    #[test]
    fn should_advance_follows_policy() {
        assert!(should_advance(AdvancementPolicy::OnCorrect, true));
        assert!(!should_advance(AdvancementPolicy::OnCorrect, false));
        assert!(should_advance(AdvancementPolicy::AlwaysAdvance, true));
        assert!(should_advance(AdvancementPolicy::AlwaysAdvance, false));
    }

    #[test]
    fn retry_rules() {
        // Wrong answers retry under the default policy.
        assert!(can_retry(
            AdvancementPolicy::OnCorrect,
            &QuestionType::CompleteWord,
            false
        ));
        assert!(!can_retry(
            AdvancementPolicy::OnCorrect,
            &QuestionType::CompleteWord,
            true
        ));
        // Observer-judged questions can be replayed even when "correct".
        assert!(can_retry(
            AdvancementPolicy::AlwaysAdvance,
            &QuestionType::DragMatch,
            true
        ));
        // Reading acknowledgment is one-way.
        assert!(!can_retry(
            AdvancementPolicy::AlwaysAdvance,
            &QuestionType::ReadSentence,
            true
        ));
    }
}
