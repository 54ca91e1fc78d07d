// Domain error taxonomy for the progression engine.
//
// Reducers surface these to callers as `Err(String)`; the `Display` output
// starts with a stable machine-readable code so clients can decide whether
// to retry, show a "try again" prompt, or treat the failure as fatal.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Missing rows AND ownership violations. Reporting foreign sessions as
    /// not-found avoids leaking their existence to other students.
    #[error("not_found: {0}")]
    NotFound(String),

    /// Mutation attempted on a session that is no longer in progress.
    #[error("session_terminated: session {0} no longer accepts answers")]
    SessionTerminated(u64),

    /// Submission payload does not match the question type's contract.
    #[error("invalid_submission_shape: {0}")]
    InvalidSubmissionShape(String),

    /// Catalog references a question type the evaluator has no rule for.
    /// A catalog/engine version mismatch, not a student mistake.
    #[error("unsupported_question_type: {0}")]
    UnsupportedQuestionType(String),

    /// Persistence-layer fault. Safe to retry the identical request.
    #[error("storage_failure: {0}")]
    StorageFailure(String),
}

impl GameError {
    /// Stable code clients can switch on.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "not_found",
            GameError::SessionTerminated(_) => "session_terminated",
            GameError::InvalidSubmissionShape(_) => "invalid_submission_shape",
            GameError::UnsupportedQuestionType(_) => "unsupported_question_type",
            GameError::StorageFailure(_) => "storage_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_starts_with_stable_code() {
        let cases = [
            GameError::NotFound("session 3".into()),
            GameError::SessionTerminated(3),
            GameError::InvalidSubmissionShape("expected a sequence".into()),
            GameError::UnsupportedQuestionType("mystery_type".into()),
            GameError::StorageFailure("insert failed".into()),
        ];
        for err in cases {
            assert!(err.to_string().starts_with(err.code()), "{err}");
        }
    }
}
