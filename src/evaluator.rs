// Answer evaluation, dispatched over the question type.
//
// Each question type maps to exactly one evaluation rule through the
// registry below. The dispatch key is the stored `question_type`, never the
// shape of the submission, so a crafted payload cannot borrow another
// type's leniency. Adding a question type means adding a registry entry;
// a type without an entry fails with `UnsupportedQuestionType` instead of
// silently recording a result.

use crate::errors::GameError;
use crate::{QuestionType, Submission};

/// Delimiter for sequence answers as stored in `expected_answer` and as
/// written back into `selected_answer` (e.g. "sa,pu,bi,ru").
pub const SEQUENCE_DELIMITER: char = ',';

/// Sentinel recorded as the normalized answer when a read-aloud question is
/// acknowledged. There is no answer to store, only the fact of reading.
pub const READ_ACKNOWLEDGED: &str = "read_completed";

/// How a submission is judged against the expected answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvaluationRule {
    /// Case-insensitive, whitespace-trimmed equality of a single string.
    TextMatch,
    /// Element-wise equality of an ordered sequence; order matters.
    SequenceMatch,
    /// No judgment: the advance signal itself is the correct "answer".
    Acknowledge,
}

/// The evaluation registry. Every `QuestionType` that the engine can score
/// must appear here exactly once.
const RULES: &[(QuestionType, EvaluationRule)] = &[
    (QuestionType::VocalFill, EvaluationRule::TextMatch),
    (QuestionType::FillBlank, EvaluationRule::TextMatch),
    (QuestionType::FindDifference, EvaluationRule::TextMatch),
    (QuestionType::DragMatch, EvaluationRule::TextMatch),
    (QuestionType::CompleteWord, EvaluationRule::TextMatch),
    (QuestionType::ArrangeSyllables, EvaluationRule::SequenceMatch),
    (QuestionType::ReadSentence, EvaluationRule::Acknowledge),
];

fn rule_for(question_type: &QuestionType) -> Option<EvaluationRule> {
    RULES
        .iter()
        .find(|(qt, _)| qt == question_type)
        .map(|(_, rule)| *rule)
}

/// Outcome of judging one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub is_correct: bool,
    /// What gets persisted as `selected_answer`: trimmed lowercase text,
    /// a delimiter-joined sequence, or the read-acknowledged sentinel.
    pub normalized_answer: String,
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Parse a stored sequence answer ("sa,pu,bi,ru") into normalized elements.
pub fn split_sequence(encoded: &str) -> Vec<String> {
    encoded
        .split(SEQUENCE_DELIMITER)
        .map(normalize)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Judge `submission` against `expected_answer` for a question of
/// `question_type`. Pure and deterministic; identical inputs always produce
/// the identical outcome.
pub fn evaluate(
    question_type: &QuestionType,
    expected_answer: &str,
    submission: &Submission,
) -> Result<Evaluation, GameError> {
    let rule = rule_for(question_type).ok_or_else(|| {
        GameError::UnsupportedQuestionType(format!("{:?} has no evaluation rule", question_type))
    })?;

    match (rule, submission) {
        (EvaluationRule::TextMatch, Submission::Answer(text)) => {
            let normalized = normalize(text);
            Ok(Evaluation {
                is_correct: normalized == normalize(expected_answer),
                normalized_answer: normalized,
            })
        }
        (EvaluationRule::SequenceMatch, Submission::Sequence(parts)) => {
            let submitted: Vec<String> = parts.iter().map(|p| normalize(p)).collect();
            let expected = split_sequence(expected_answer);
            let normalized_answer = submitted.join(",");
            Ok(Evaluation {
                is_correct: submitted == expected,
                normalized_answer,
            })
        }
        (EvaluationRule::Acknowledge, Submission::Advance) => Ok(Evaluation {
            is_correct: true,
            normalized_answer: READ_ACKNOWLEDGED.to_string(),
        }),
        (EvaluationRule::TextMatch, other) => Err(GameError::InvalidSubmissionShape(format!(
            "{:?} takes a single answer string, got {}",
            question_type,
            other.shape_name()
        ))),
        (EvaluationRule::SequenceMatch, other) => Err(GameError::InvalidSubmissionShape(format!(
            "{:?} takes an ordered sequence, got {}",
            question_type,
            other.shape_name()
        ))),
        (EvaluationRule::Acknowledge, other) => Err(GameError::InvalidSubmissionShape(format!(
            "{:?} takes the advance signal, got {}",
            question_type,
            other.shape_name()
        ))),
    }
}

/// Feedback line for the client, matching the original app's per-type voice.
pub fn feedback_message(question_type: &QuestionType, is_correct: bool) -> &'static str {
    if is_correct {
        match question_type {
            QuestionType::CompleteWord => "Hebat! Jawabanmu benar!",
            QuestionType::ArrangeSyllables => "Bagus! Urutan suku katanya benar!",
            QuestionType::ReadSentence => "Bagus! Lanjut ke kalimat berikutnya!",
            QuestionType::FindDifference | QuestionType::DragMatch => "Bagus sekali!",
            _ => "Bagus!",
        }
    } else {
        match question_type {
            QuestionType::ArrangeSyllables => "Urutan belum tepat, coba lagi!",
            QuestionType::FindDifference | QuestionType::DragMatch => "Coba perhatikan lagi ya!",
            _ => "Coba lagi ya!",
        }
    }
}

/// Audio cue that accompanies the feedback line.
pub fn feedback_audio(is_correct: bool) -> &'static str {
    if is_correct {
        "assets/audio/success.mp3"
    } else {
        "assets/audio/try_again.mp3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> Submission {
        Submission::Answer(text.to_string())
    }

    fn sequence(parts: &[&str]) -> Submission {
        Submission::Sequence(parts.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn text_match_is_case_insensitive_and_trimmed() {
        let eval = evaluate(&QuestionType::VocalFill, "A", &answer("  a ")).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.normalized_answer, "a");

        let eval = evaluate(&QuestionType::CompleteWord, "sa", &answer("SA")).unwrap();
        assert!(eval.is_correct);

        let eval = evaluate(&QuestionType::FillBlank, "b", &answer("d")).unwrap();
        assert!(!eval.is_correct);
        assert_eq!(eval.normalized_answer, "d");
    }

    #[test]
    fn sequence_match_is_order_sensitive() {
        let expected = "sa,pu,bi,ru";
        let wrong = evaluate(
            &QuestionType::ArrangeSyllables,
            expected,
            &sequence(&["pu", "sa", "bi", "ru"]),
        )
        .unwrap();
        assert!(!wrong.is_correct);
        assert_eq!(wrong.normalized_answer, "pu,sa,bi,ru");

        let right = evaluate(
            &QuestionType::ArrangeSyllables,
            expected,
            &sequence(&["sa", "pu", "bi", "ru"]),
        )
        .unwrap();
        assert!(right.is_correct);
        assert_eq!(right.normalized_answer, "sa,pu,bi,ru");
    }

    #[test]
    fn sequence_elements_are_normalized_before_comparison() {
        let eval = evaluate(
            &QuestionType::ArrangeSyllables,
            "ba,ca,bu,ku",
            &sequence(&[" BA", "ca ", "bu", "KU"]),
        )
        .unwrap();
        assert!(eval.is_correct);
    }

    #[test]
    fn read_sentence_advance_is_always_correct() {
        let eval = evaluate(&QuestionType::ReadSentence, "next", &Submission::Advance).unwrap();
        assert!(eval.is_correct);
        assert_eq!(eval.normalized_answer, READ_ACKNOWLEDGED);
    }

    #[test]
    fn shape_mismatch_is_rejected_not_coerced() {
        // A sequence against a single-answer question.
        let err = evaluate(
            &QuestionType::CompleteWord,
            "sa",
            &sequence(&["sa", "pu"]),
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_submission_shape");

        // A single answer against a sequence question.
        let err = evaluate(&QuestionType::ArrangeSyllables, "sa,pu", &answer("sapu")).unwrap_err();
        assert_eq!(err.code(), "invalid_submission_shape");

        // A plain answer against a read-aloud question: no evaluation occurs.
        let err = evaluate(&QuestionType::ReadSentence, "next", &answer("next")).unwrap_err();
        assert_eq!(err.code(), "invalid_submission_shape");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let first = evaluate(&QuestionType::DragMatch, "b", &answer("B")).unwrap();
        let second = evaluate(&QuestionType::DragMatch, "b", &answer("B")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn every_question_type_has_a_rule() {
        for qt in [
            QuestionType::VocalFill,
            QuestionType::FillBlank,
            QuestionType::FindDifference,
            QuestionType::DragMatch,
            QuestionType::CompleteWord,
            QuestionType::ArrangeSyllables,
            QuestionType::ReadSentence,
        ] {
            assert!(rule_for(&qt).is_some(), "{:?} missing from registry", qt);
        }
    }

    #[test]
    fn split_sequence_trims_and_drops_empties() {
        assert_eq!(split_sequence("sa, pu ,bi,ru"), vec!["sa", "pu", "bi", "ru"]);
        assert_eq!(split_sequence(""), Vec::<String>::new());
    }
}
