// Progression engine: session lifecycle, attempt recording, completion,
// and badge awards.
//
// Every public function takes the acting student's id explicitly; the
// reducer layer resolves it from the verified connection session once and
// passes it down. Nothing in here reaches for an ambient "current user".
//
// Each reducer call runs in one SpacetimeDB transaction, so the
// read-modify-write of `questions_completed`, the attempt upsert, and the
// completion transition commit together or not at all. Resubmitting the
// identical request after a failure is always safe.

use spacetimedb::{ReducerContext, Table};

use crate::catalog;
use crate::errors::GameError;
use crate::evaluator;
use crate::policy;
use crate::selector::{self, Selection};
use crate::{
    game, game_question, play_session, question_attempt, student_badge, short_id, Game,
    GameQuestion, PlaySession, QuestionAttempt, SessionStatus, StudentBadge, Submission,
};

/// Returned by `record_attempt`; the reducer layer materializes this for
/// the client.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub is_correct: bool,
    pub attempt: QuestionAttempt,
    pub session_completed: bool,
    pub can_retry: bool,
    pub feedback: &'static str,
    pub feedback_audio: &'static str,
}

/// Aggregated numbers for the results screen.
#[derive(Debug, Clone, Copy)]
pub struct SessionStatistics {
    pub total_questions: u32,
    pub completed_questions: u32,
    pub correct_answers: u32,
    pub accuracy_percent: f64,
}

/// Find the student's in-progress session for this game, or create one.
///
/// Runs inside one transaction, so two near-simultaneous start calls
/// cannot both take the create path. `total_questions` is re-synced
/// against the actual question count here, at session-creation time.
pub fn start_or_resume(
    ctx: &ReducerContext,
    student_id: &str,
    game_id: u64,
) -> Result<PlaySession, GameError> {
    let mut game = ctx
        .db
        .game()
        .id()
        .find(&game_id)
        .filter(|g| g.is_active)
        .ok_or_else(|| GameError::NotFound(format!("game {game_id} not found or inactive")))?;

    if let Some(existing) = ctx
        .db
        .play_session()
        .student_id()
        .filter(&student_id.to_string())
        .find(|s| s.game_id == game_id && s.status == SessionStatus::InProgress)
    {
        log::info!(
            "[SESSION] resumed session:{} student:{} game:{}",
            existing.id,
            short_id(student_id),
            game_id
        );
        return Ok(existing);
    }

    let actual = ctx.db.game_question().game_id().filter(&game_id).count() as u32;
    if game.total_questions != actual {
        log::warn!(
            "[CATALOG] total_questions resync game:{} {} -> {}",
            game_id,
            game.total_questions,
            actual
        );
        game.total_questions = actual;
        ctx.db.game().id().update(game);
    }

    let session = ctx.db.play_session().insert(PlaySession {
        id: 0, // auto_inc
        student_id: student_id.to_string(),
        game_id,
        status: SessionStatus::InProgress,
        questions_completed: vec![],
        started_at: ctx.timestamp,
        completed_at: None,
        video_watched: false,
        video_completed_at: None,
    });

    log::info!(
        "[SESSION] started session:{} student:{} game:{}",
        session.id,
        short_id(student_id),
        game_id
    );
    Ok(session)
}

/// Load a session and verify it belongs to `student_id`. A foreign or
/// missing session is the same not-found error either way.
pub fn owned_session(
    ctx: &ReducerContext,
    student_id: &str,
    session_id: u64,
) -> Result<PlaySession, GameError> {
    ctx.db
        .play_session()
        .id()
        .find(&session_id)
        .filter(|s| s.student_id == student_id)
        .ok_or_else(|| GameError::NotFound(format!("session {session_id} not found")))
}

fn game_for_session(ctx: &ReducerContext, session: &PlaySession) -> Result<Game, GameError> {
    ctx.db.game().id().find(&session.game_id).ok_or_else(|| {
        GameError::NotFound(format!("game {} missing from catalog", session.game_id))
    })
}

/// The next pending question for a session, in catalog order.
/// `None` means every question is completed.
pub fn current_question(
    ctx: &ReducerContext,
    student_id: &str,
    session_id: u64,
) -> Result<(PlaySession, Game, Option<GameQuestion>), GameError> {
    let session = owned_session(ctx, student_id, session_id)?;
    let game = game_for_session(ctx, &session)?;

    let mut questions: Vec<GameQuestion> = ctx
        .db
        .game_question()
        .game_id()
        .filter(&session.game_id)
        .collect();
    selector::catalog_order(&mut questions);

    let next = match selector::next_pending(&questions, &session.questions_completed) {
        Selection::Next(q) => Some(q.clone()),
        Selection::AllCompleted => None,
    };
    Ok((session, game, next))
}

/// Record one submission for one question of an in-progress session.
///
/// Order matters: precondition checks, then evaluation, then the attempt
/// upsert, then the advancement decision and completion re-check. An
/// evaluator failure returns before any store mutation.
pub fn record_attempt(
    ctx: &ReducerContext,
    student_id: &str,
    session_id: u64,
    question_id: u64,
    submission: &Submission,
    observation: Option<String>,
) -> Result<AttemptOutcome, GameError> {
    let mut session = owned_session(ctx, student_id, session_id)?;
    if session.status != SessionStatus::InProgress {
        return Err(GameError::SessionTerminated(session_id));
    }

    let question = ctx
        .db
        .game_question()
        .id()
        .find(&question_id)
        .ok_or_else(|| GameError::NotFound(format!("question {question_id} does not exist")))?;
    if question.game_id != session.game_id {
        return Err(GameError::NotFound(format!(
            "question {question_id} is not part of game {}",
            session.game_id
        )));
    }
    let game = game_for_session(ctx, &session)?;

    let evaluation = match evaluator::evaluate(
        &question.question_type,
        &question.expected_answer,
        submission,
    ) {
        Ok(e) => e,
        Err(err) => {
            if matches!(err, GameError::UnsupportedQuestionType(_)) {
                // Catalog/engine version mismatch, not a student mistake.
                log::warn!("[ATTEMPT] question:{} {}", question_id, err);
            }
            return Err(err);
        }
    };

    // One attempt row per (session, question): resubmission updates in
    // place and bumps the counter.
    let existing = ctx
        .db
        .question_attempt()
        .session_id()
        .filter(&session_id)
        .find(|a| a.question_id == question_id);

    let attempt = match existing {
        Some(mut a) => {
            a.attempt_count = a.attempt_count.saturating_add(1);
            a.completed = evaluation.is_correct;
            a.selected_answer = evaluation.normalized_answer.clone();
            a.observation = observation;
            a.attempted_at = ctx.timestamp;
            ctx.db.question_attempt().id().update(a)
        }
        None => ctx.db.question_attempt().insert(QuestionAttempt {
            id: 0, // auto_inc
            session_id,
            question_id,
            completed: evaluation.is_correct,
            selected_answer: evaluation.normalized_answer.clone(),
            observation,
            attempt_count: 1,
            attempted_at: ctx.timestamp,
        }),
    };

    let adv = policy::advancement_policy(&game.category, &question.question_type);
    let mut session_completed_now = false;
    if policy::should_advance(adv, evaluation.is_correct) {
        insert_completed(&mut session.questions_completed, question_id);
        // Re-check the completion invariant after every completed-set
        // mutation; total_questions was read fresh this transaction.
        if session_complete(session.questions_completed.len(), game.total_questions) {
            session.status = SessionStatus::Completed;
            if session.completed_at.is_none() {
                session.completed_at = Some(ctx.timestamp);
            }
            session_completed_now = true;
        }
    }
    ctx.db.play_session().id().update(session.clone());

    if session_completed_now {
        log::info!(
            "[SESSION] completed session:{} student:{} game:{}",
            session_id,
            short_id(student_id),
            session.game_id
        );
        maybe_award_badge(ctx, &session, &game);
    }

    Ok(AttemptOutcome {
        is_correct: evaluation.is_correct,
        attempt,
        session_completed: session.status == SessionStatus::Completed,
        can_retry: policy::can_retry(adv, &question.question_type, evaluation.is_correct),
        feedback: evaluator::feedback_message(&question.question_type, evaluation.is_correct),
        feedback_audio: evaluator::feedback_audio(evaluation.is_correct),
    })
}

/// Award the one-per-(student, game) badge for a freshly completed session.
/// The unique index on `award_key` makes concurrent or repeated completion
/// a silent no-op rather than a duplicate row.
fn maybe_award_badge(ctx: &ReducerContext, session: &PlaySession, game: &Game) {
    let content = catalog::badge_for_category(&game.category);
    let badge = StudentBadge {
        id: 0, // auto_inc
        award_key: award_key(&session.student_id, session.game_id),
        student_id: session.student_id.clone(),
        game_id: session.game_id,
        badge_name: content.name.to_string(),
        description: content.description.to_string(),
        badge_image_path: content.image_path.to_string(),
        earned_at: ctx.timestamp,
    };
    match ctx.db.student_badge().try_insert(badge) {
        Ok(b) => log::info!(
            "[BADGE] awarded student:{} game:{} badge:{}",
            short_id(&session.student_id),
            session.game_id,
            b.badge_name
        ),
        Err(_) => log::debug!(
            "[BADGE] already awarded student:{} game:{}",
            short_id(&session.student_id),
            session.game_id
        ),
    }
}

/// The badge a student holds for a game, if any.
pub fn badge_for(ctx: &ReducerContext, student_id: &str, game_id: u64) -> Option<StudentBadge> {
    ctx.db
        .student_badge()
        .award_key()
        .find(&award_key(student_id, game_id))
}

/// Set the video-watched flag. Independent of question progression.
pub fn mark_video_watched(
    ctx: &ReducerContext,
    student_id: &str,
    session_id: u64,
) -> Result<PlaySession, GameError> {
    let mut session = owned_session(ctx, student_id, session_id)?;
    if session.status == SessionStatus::Abandoned {
        return Err(GameError::SessionTerminated(session_id));
    }
    session.video_watched = true;
    session.video_completed_at = Some(ctx.timestamp);
    Ok(ctx.db.play_session().id().update(session))
}

/// Read-only aggregation for the results screen.
pub fn session_statistics(
    ctx: &ReducerContext,
    session: &PlaySession,
    game: &Game,
) -> SessionStatistics {
    let correct = ctx
        .db
        .question_attempt()
        .session_id()
        .filter(&session.id)
        .filter(|a| a.completed)
        .count() as u32;
    let completed = session.questions_completed.len() as u32;
    SessionStatistics {
        total_questions: game.total_questions,
        completed_questions: completed,
        correct_answers: correct,
        accuracy_percent: accuracy_percent(correct, completed),
    }
}

/// Administrative terminal transition. Only in-progress sessions can be
/// abandoned; repeating the call is a no-op.
pub fn abandon(ctx: &ReducerContext, session_id: u64) -> Result<(), GameError> {
    let mut session = ctx
        .db
        .play_session()
        .id()
        .find(&session_id)
        .ok_or_else(|| GameError::NotFound(format!("session {session_id} not found")))?;
    match session.status {
        SessionStatus::Abandoned => Ok(()),
        SessionStatus::Completed => Err(GameError::SessionTerminated(session_id)),
        SessionStatus::InProgress => {
            session.status = SessionStatus::Abandoned;
            ctx.db.play_session().id().update(session);
            log::info!("[SESSION] abandoned session:{}", session_id);
            Ok(())
        }
    }
}

// -------------------- Pure helpers --------------------

/// Add a question id to the completed set. Returns false (and leaves the
/// set untouched) when the id is already present.
pub(crate) fn insert_completed(completed: &mut Vec<u64>, question_id: u64) -> bool {
    if completed.contains(&question_id) {
        return false;
    }
    completed.push(question_id);
    true
}

/// Completion threshold. A catalog with zero questions never completes.
pub(crate) fn session_complete(completed_count: usize, total_questions: u32) -> bool {
    total_questions > 0 && completed_count >= total_questions as usize
}

/// round(correct / completed * 100, 2); zero when nothing is completed.
pub(crate) fn accuracy_percent(correct: u32, completed: u32) -> f64 {
    if completed == 0 {
        return 0.0;
    }
    let raw = correct as f64 / completed as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Progress through a game as a percentage, two decimals.
pub(crate) fn progress_percent(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = completed as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Storage key carrying the (student, game) uniqueness constraint.
pub(crate) fn award_key(student_id: &str, game_id: u64) -> String {
    format!("{student_id}:{game_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_set_only_grows_and_dedupes() {
        let mut completed = vec![1, 2];
        assert!(insert_completed(&mut completed, 3));
        assert_eq!(completed, vec![1, 2, 3]);

        // Adding a present id is a no-op: same length, same content.
        let before = completed.len();
        assert!(!insert_completed(&mut completed, 2));
        assert_eq!(completed.len(), before);
        assert_eq!(completed, vec![1, 2, 3]);
    }

    #[test]
    fn completion_threshold() {
        assert!(!session_complete(4, 5));
        assert!(session_complete(5, 5));
        // Stale completed ids can push the count past the total.
        assert!(session_complete(6, 5));
        // An empty catalog never completes.
        assert!(!session_complete(0, 0));
    }

    #[test]
    fn accuracy_rounds_to_two_decimals() {
        assert_eq!(accuracy_percent(1, 3), 33.33);
        assert_eq!(accuracy_percent(2, 3), 66.67);
        assert_eq!(accuracy_percent(5, 5), 100.0);
        assert_eq!(accuracy_percent(0, 4), 0.0);
        // No attempts completed yet.
        assert_eq!(accuracy_percent(0, 0), 0.0);
    }

    #[test]
    fn progress_percent_rounds_to_two_decimals() {
        assert_eq!(progress_percent(4, 5), 80.0);
        assert_eq!(progress_percent(1, 17), 5.88);
        assert_eq!(progress_percent(0, 0), 0.0);
    }

    #[test]
    fn award_key_is_one_per_student_game_pair() {
        assert_eq!(award_key("student-a", 2), "student-a:2");
        assert_ne!(award_key("student-a", 2), award_key("student-a", 3));
        assert_ne!(award_key("student-a", 2), award_key("student-b", 2));
    }
}
