use spacetimedb::{
    client_visibility_filter, reducer, table, view, Filter, Identity, ReducerContext,
    SpacetimeType, Table, Timestamp,
};

mod catalog;
mod engine;
mod errors;
mod evaluator;
mod policy;
mod restore;
mod selector;

// ==================== HELPER FUNCTIONS ====================

/// Short student id for logs. Student ids are ASCII (UUIDs or device ids).
pub(crate) fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

/// Resolve the acting student from the verified connection session.
/// Every student-facing reducer starts here; nothing downstream trusts
/// the connection identity directly.
fn student_for_sender(ctx: &ReducerContext) -> Result<String, String> {
    ctx.db
        .student_session()
        .connection_id()
        .find(&ctx.sender)
        .map(|s| s.student_id)
        .ok_or("No session found - verify with gateway first".to_string())
}

/// Authorization check for gateway/admin reducers.
fn require_worker(ctx: &ReducerContext) -> Result<(), String> {
    if ctx.db.authorized_worker().identity().find(&ctx.sender).is_none() {
        return Err("Unauthorized: worker identity required".to_string());
    }
    Ok(())
}

// ==================== TYPES ====================

/// Question types across the three games. The evaluator registry maps each
/// of these to exactly one evaluation rule.
#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub enum QuestionType {
    VocalFill,
    FillBlank,
    FindDifference,
    DragMatch,
    CompleteWord,
    ArrangeSyllables,
    ReadSentence,
}

/// Game category drives advancement policy and badge content.
#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub enum GameCategory {
    VowelSounds,
    LetterDetective,
    Spelling,
    General,
}

#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

/// What a student submits for one question. The shape must match the
/// question type's contract; the evaluator rejects mismatches instead of
/// coercing them.
#[derive(SpacetimeType, Debug, Clone, PartialEq)]
pub enum Submission {
    /// Single answer string (letter, syllable, or word).
    Answer(String),
    /// Ordered sequence of parts (arrange-syllables).
    Sequence(Vec<String>),
    /// Advance signal for read-aloud questions; carries no answer.
    Advance,
}

impl Submission {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Submission::Answer(_) => "a single answer",
            Submission::Sequence(_) => "an ordered sequence",
            Submission::Advance => "the advance signal",
        }
    }
}

// ==================== TABLES ====================

/// Links ephemeral connection identity to stable student id.
/// PRIVATE: created only by the gateway after it verifies the login token.
#[table(name = student_session)]
pub struct StudentSession {
    #[primary_key]
    pub connection_id: Identity,

    /// Stable student id, verified by the gateway
    pub student_id: String,

    pub connected_at: Timestamp,
}

/// Identities allowed to call gateway/admin reducers and see protected rows.
#[table(name = authorized_worker)]
pub struct AuthorizedWorker {
    #[primary_key]
    pub identity: Identity,
}

/// A game in the catalog. Public: the catalog is the same for everyone.
#[table(name = game, public)]
#[derive(Clone)]
pub struct Game {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    pub title: String,

    pub description: String,

    /// Target age group label (e.g. "PlayGroup", "TK A", "TK B")
    pub target_age: String,

    pub skill_focus: String,

    pub learning_outcomes: Vec<String>,

    pub theme: String,

    pub category: GameCategory,

    /// Intro video asset, when the game has one
    pub video_path: Option<String>,

    /// Cached question count; re-synced against the question table at
    /// session creation
    pub total_questions: u32,

    /// Inactive games reject new sessions but keep their history
    pub is_active: bool,
}

/// One question in a game's bank. Public alongside the game catalog.
#[table(name = game_question, public)]
#[derive(Clone, Debug, PartialEq)]
pub struct GameQuestion {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    #[index(btree)]
    pub game_id: u64,

    /// Position within the game, assigned at seeding in list order
    pub question_number: u32,

    /// Difficulty level; catalog order is (level, question_number)
    pub level: u8,

    pub question_type: QuestionType,

    /// For sequence questions this is the comma-joined correct order
    pub expected_answer: String,

    /// The word, letter cards, or sentence this question is about
    pub word: Option<String>,

    /// Display pattern (e.g. "bi + ..." or the sentence to read)
    pub word_pattern: Option<String>,

    pub image_path: Option<String>,

    pub audio_letter_path: Option<String>,

    pub audio_word_path: Option<String>,

    pub instruction: String,

    /// Answer choices as seeded; presentation order is decided per request
    pub options: Vec<String>,
}

/// One student's run through one game.
/// Public with RLS: students see only their own sessions.
#[table(name = play_session, public)]
#[derive(Clone)]
pub struct PlaySession {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    #[index(btree)]
    pub student_id: String,

    #[index(btree)]
    pub game_id: u64,

    pub status: SessionStatus,

    /// Completed question ids. Grows monotonically; set semantics are
    /// enforced on insert. Survives catalog edits (ids may go stale).
    pub questions_completed: Vec<u64>,

    pub started_at: Timestamp,

    /// Set exactly once, on the submission that completes the session
    pub completed_at: Option<Timestamp>,

    pub video_watched: bool,

    pub video_completed_at: Option<Timestamp>,
}

/// One row per (session, question); resubmission updates in place.
/// PRIVATE: results reach clients through attempt_result / session_result.
#[table(name = question_attempt)]
#[derive(Clone, Debug)]
pub struct QuestionAttempt {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    #[index(btree)]
    pub session_id: u64,

    #[index(btree)]
    pub question_id: u64,

    /// Whether the latest submission was correct
    pub completed: bool,

    /// Normalized latest answer (trimmed lowercase, comma-joined sequence,
    /// or the read-acknowledged sentinel)
    pub selected_answer: String,

    /// Free-text observer note, overwritten on resubmission
    pub observation: Option<String>,

    /// Total submissions for this question in this session
    pub attempt_count: u32,

    pub attempted_at: Timestamp,
}

/// One badge per (student, game), enforced by the unique award_key.
/// PRIVATE: clients read their own badges through the my_badges view.
#[table(name = student_badge)]
#[derive(Clone)]
pub struct StudentBadge {
    #[primary_key]
    #[auto_inc]
    pub id: u64,

    /// "{student_id}:{game_id}" - carries the one-per-pair constraint
    #[unique]
    pub award_key: String,

    #[index(btree)]
    pub student_id: String,

    pub game_id: u64,

    pub badge_name: String,

    pub description: String,

    pub badge_image_path: String,

    pub earned_at: Timestamp,
}

/// Materialized "what should this session show next" row, refreshed by
/// start_game, get_current_question, and submit_answer.
/// Public with RLS: one row per session, owner-visible only.
#[table(name = current_question, public)]
#[derive(Clone)]
pub struct CurrentQuestion {
    #[primary_key]
    pub session_id: u64,

    #[index(btree)]
    pub student_id: String,

    pub game_id: u64,

    /// None once every question is completed
    pub question_id: Option<u64>,

    /// 1-based display position within the game
    pub question_number: u32,

    pub total_questions: u32,

    /// round(completed / total * 100, 2)
    pub progress_percent: f64,

    /// Answer choices in presentation order (shuffled where the type
    /// allows it); fixed for types where on-screen order is meaningful
    pub options: Vec<String>,

    pub all_completed: bool,

    pub updated_at: Timestamp,
}

/// Materialized outcome of the latest submission in a session.
/// Public with RLS: owner-visible only.
#[table(name = attempt_result, public)]
#[derive(Clone)]
pub struct AttemptResult {
    #[primary_key]
    pub session_id: u64,

    #[index(btree)]
    pub student_id: String,

    pub question_id: u64,

    pub is_correct: bool,

    /// Whether the client should offer another try at this question
    pub can_retry: bool,

    pub session_completed: bool,

    pub attempt_count: u32,

    pub feedback: String,

    pub feedback_audio: String,

    pub updated_at: Timestamp,
}

/// Materialized results screen for a session, refreshed on demand.
/// Public with RLS: owner-visible only.
#[table(name = session_result, public)]
#[derive(Clone)]
pub struct SessionResult {
    #[primary_key]
    pub session_id: u64,

    #[index(btree)]
    pub student_id: String,

    pub game_id: u64,

    pub status: SessionStatus,

    pub total_questions: u32,

    pub completed_questions: u32,

    pub correct_answers: u32,

    /// round(correct / completed * 100, 2)
    pub accuracy_percent: f64,

    pub video_watched: bool,

    /// Badge earned for this game, when the session completed it
    pub badge_name: Option<String>,

    pub generated_at: Timestamp,
}

// ==================== ROW LEVEL SECURITY ====================

/// Students see only their own sessions.
#[client_visibility_filter]
const PLAY_SESSION_VISIBILITY: Filter = Filter::Sql(
    "SELECT ps.* FROM play_session ps
     JOIN student_session ss WHERE ps.student_id = ss.student_id AND ss.connection_id = :sender",
);

#[client_visibility_filter]
const CURRENT_QUESTION_VISIBILITY: Filter = Filter::Sql(
    "SELECT cq.* FROM current_question cq
     JOIN student_session ss WHERE cq.student_id = ss.student_id AND ss.connection_id = :sender",
);

#[client_visibility_filter]
const ATTEMPT_RESULT_VISIBILITY: Filter = Filter::Sql(
    "SELECT ar.* FROM attempt_result ar
     JOIN student_session ss WHERE ar.student_id = ss.student_id AND ss.connection_id = :sender",
);

#[client_visibility_filter]
const SESSION_RESULT_VISIBILITY: Filter = Filter::Sql(
    "SELECT sr.* FROM session_result sr
     JOIN student_session ss WHERE sr.student_id = ss.student_id AND ss.connection_id = :sender",
);

// ==================== VIEWS ====================

/// The caller's badges, newest first. Empty for unverified connections.
#[view(name = my_badges, public)]
fn my_badges(ctx: &spacetimedb::ViewContext) -> Vec<StudentBadge> {
    let Some(session) = ctx.db.student_session().connection_id().find(ctx.sender) else {
        return Vec::new();
    };
    let mut badges: Vec<StudentBadge> = ctx
        .db
        .student_badge()
        .student_id()
        .filter(&session.student_id)
        .collect();
    badges.sort_by_key(|b| std::cmp::Reverse(b.earned_at));
    badges
}

// ==================== REDUCERS ====================

/// Seed catalog and authorize the module owner.
#[reducer(init)]
pub fn init(ctx: &ReducerContext) {
    // In init, ctx.sender is the module owner identity
    if ctx.db.authorized_worker().identity().find(&ctx.sender).is_none() {
        ctx.db.authorized_worker().insert(AuthorizedWorker {
            identity: ctx.sender,
        });
    }

    // Idempotent on hot-reload: only seed an empty catalog
    if ctx.db.game().iter().count() == 0 {
        seed_catalog(ctx);
    }

    log::info!("Literacy module initialized");
}

/// Create a verified session for a client identity.
/// Called by the gateway AFTER verifying the student's login token.
#[reducer]
pub fn create_student_session(
    ctx: &ReducerContext,
    client_identity: String,
    student_id: String,
) -> Result<(), String> {
    require_worker(ctx)?;

    let identity = Identity::from_hex(&client_identity)
        .map_err(|e| format!("Invalid identity hex string: {e}"))?;

    // Delete stale sessions: same student (unclean reconnect) OR same
    // connection_id (prevents PK conflict)
    let stale: Vec<Identity> = ctx
        .db
        .student_session()
        .iter()
        .filter(|s| s.student_id == student_id || s.connection_id == identity)
        .map(|s| s.connection_id)
        .collect();
    for conn_id in stale {
        ctx.db.student_session().connection_id().delete(&conn_id);
    }

    ctx.db.student_session().insert(StudentSession {
        connection_id: identity,
        student_id: student_id.clone(),
        connected_at: ctx.timestamp,
    });

    log::info!(
        "[SESSION] verified student:{} ws:{}",
        short_id(&student_id),
        short_id(&client_identity)
    );
    Ok(())
}

/// Drop the verified session on disconnect. Play sessions stay in place
/// and resume on the next start_game for the same game.
#[reducer(client_disconnected)]
pub fn on_disconnect(ctx: &ReducerContext) {
    if ctx.db.student_session().connection_id().find(&ctx.sender).is_some() {
        ctx.db.student_session().connection_id().delete(&ctx.sender);
    }
}

/// Start playing a game: resumes the in-progress session for this
/// (student, game) pair or creates a fresh one, then publishes the
/// session's current question.
#[reducer]
pub fn start_game(ctx: &ReducerContext, game_id: u64) -> Result<(), String> {
    let student_id = student_for_sender(ctx)?;
    let session = engine::start_or_resume(ctx, &student_id, game_id).map_err(|e| e.to_string())?;
    refresh_current_question(ctx, &student_id, session.id).map_err(|e| e.to_string())
}

/// Re-publish the next pending question for a session (e.g. after the
/// client reloads). Options are reshuffled on every call.
#[reducer]
pub fn get_current_question(ctx: &ReducerContext, session_id: u64) -> Result<(), String> {
    let student_id = student_for_sender(ctx)?;
    refresh_current_question(ctx, &student_id, session_id).map_err(|e| e.to_string())
}

/// Submit an answer for one question of an in-progress session.
/// Publishes the outcome to attempt_result and advances current_question.
#[reducer]
pub fn submit_answer(
    ctx: &ReducerContext,
    session_id: u64,
    question_id: u64,
    submission: Submission,
    observation: Option<String>,
) -> Result<(), String> {
    let student_id = student_for_sender(ctx)?;

    let outcome = engine::record_attempt(
        ctx,
        &student_id,
        session_id,
        question_id,
        &submission,
        observation,
    )
    .map_err(|e| e.to_string())?;

    log::info!(
        "[ATTEMPT] session:{} question:{} student:{} correct:{} attempts:{}",
        session_id,
        question_id,
        short_id(&student_id),
        outcome.is_correct,
        outcome.attempt.attempt_count
    );

    let result = AttemptResult {
        session_id,
        student_id: student_id.clone(),
        question_id,
        is_correct: outcome.is_correct,
        can_retry: outcome.can_retry,
        session_completed: outcome.session_completed,
        attempt_count: outcome.attempt.attempt_count,
        feedback: outcome.feedback.to_string(),
        feedback_audio: outcome.feedback_audio.to_string(),
        updated_at: ctx.timestamp,
    };
    if ctx.db.attempt_result().session_id().find(&session_id).is_some() {
        ctx.db.attempt_result().session_id().update(result);
    } else {
        ctx.db.attempt_result().insert(result);
    }

    refresh_current_question(ctx, &student_id, session_id).map_err(|e| e.to_string())
}

/// Record that the student watched the game's intro video.
#[reducer]
pub fn mark_video_watched(ctx: &ReducerContext, session_id: u64) -> Result<(), String> {
    let student_id = student_for_sender(ctx)?;
    engine::mark_video_watched(ctx, &student_id, session_id).map_err(|e| e.to_string())?;
    log::info!(
        "[SESSION] video watched session:{} student:{}",
        session_id,
        short_id(&student_id)
    );
    Ok(())
}

/// Publish the results screen for a session: progress, accuracy, and the
/// badge if one was earned. Valid for any session the student owns,
/// whatever its status.
#[reducer]
pub fn get_session_results(ctx: &ReducerContext, session_id: u64) -> Result<(), String> {
    let student_id = student_for_sender(ctx)?;
    let session =
        engine::owned_session(ctx, &student_id, session_id).map_err(|e| e.to_string())?;
    let game = ctx
        .db
        .game()
        .id()
        .find(&session.game_id)
        .ok_or_else(|| format!("not_found: game {} missing from catalog", session.game_id))?;

    let stats = engine::session_statistics(ctx, &session, &game);
    let badge_name = engine::badge_for(ctx, &student_id, session.game_id).map(|b| b.badge_name);

    let result = SessionResult {
        session_id,
        student_id,
        game_id: session.game_id,
        status: session.status,
        total_questions: stats.total_questions,
        completed_questions: stats.completed_questions,
        correct_answers: stats.correct_answers,
        accuracy_percent: stats.accuracy_percent,
        video_watched: session.video_watched,
        badge_name,
        generated_at: ctx.timestamp,
    };
    if ctx.db.session_result().session_id().find(&session_id).is_some() {
        ctx.db.session_result().session_id().update(result);
    } else {
        ctx.db.session_result().insert(result);
    }
    Ok(())
}

/// Admin: mark an in-progress session abandoned. Terminal; the session
/// rejects further answers but keeps its history.
#[reducer]
pub fn abandon_session(ctx: &ReducerContext, session_id: u64) -> Result<(), String> {
    require_worker(ctx)?;
    engine::abandon(ctx, session_id).map_err(|e| e.to_string())
}

/// Admin: wipe and re-seed the game catalog. Sessions and attempts are
/// untouched; completed ids referencing removed questions go stale, which
/// selection and completion both tolerate.
#[reducer]
pub fn reseed_catalog(ctx: &ReducerContext) -> Result<(), String> {
    require_worker(ctx)?;

    let games: Vec<u64> = ctx.db.game().iter().map(|g| g.id).collect();
    let questions: Vec<u64> = ctx.db.game_question().iter().map(|q| q.id).collect();
    for id in &questions {
        ctx.db.game_question().id().delete(id);
    }
    for id in &games {
        ctx.db.game().id().delete(id);
    }
    log::warn!(
        "[CATALOG] wiped games:{} questions:{}",
        games.len(),
        questions.len()
    );

    seed_catalog(ctx);
    Ok(())
}

// ==================== SEEDING ====================

fn seed_catalog(ctx: &ReducerContext) {
    for seed in catalog::seed_games() {
        let total = seed.questions.len() as u32;
        let game = ctx.db.game().insert(Game {
            id: 0, // auto_inc
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            target_age: seed.target_age.to_string(),
            skill_focus: seed.skill_focus.to_string(),
            learning_outcomes: seed.learning_outcomes,
            theme: seed.theme.to_string(),
            category: seed.category,
            video_path: seed.video_path.map(str::to_string),
            total_questions: total,
            is_active: true,
        });

        for (index, q) in seed.questions.into_iter().enumerate() {
            ctx.db.game_question().insert(GameQuestion {
                id: 0, // auto_inc
                game_id: game.id,
                question_number: index as u32 + 1,
                level: q.level,
                question_type: q.question_type,
                expected_answer: q.expected_answer,
                word: q.word,
                word_pattern: q.word_pattern,
                image_path: q.image_path,
                audio_letter_path: q.audio_letter_path,
                audio_word_path: q.audio_word_path,
                instruction: q.instruction,
                options: q.options,
            });
        }

        log::info!(
            "[CATALOG] seeded game:{} \"{}\" questions:{}",
            game.id,
            game.title,
            total
        );
    }
}

// ==================== QUESTION PRESENTATION ====================

/// Options in presentation order. Shuffled for pick-one types; kept as
/// seeded where on-screen order is meaningful (find-difference cards show
/// the seeded triple, arrange-syllables tiles are pre-scrambled).
fn presentation_options(ctx: &ReducerContext, question: &GameQuestion) -> Vec<String> {
    use spacetimedb::rand::Rng;

    let mut options = question.options.clone();
    match question.question_type {
        QuestionType::FindDifference
        | QuestionType::ArrangeSyllables
        | QuestionType::ReadSentence => options,
        _ => {
            // Fisher-Yates
            let mut rng = ctx.rng();
            for i in (1..options.len()).rev() {
                let j = rng.gen_range(0..=i);
                options.swap(i, j);
            }
            options
        }
    }
}

/// Recompute and publish the current_question row for a session.
fn refresh_current_question(
    ctx: &ReducerContext,
    student_id: &str,
    session_id: u64,
) -> Result<(), errors::GameError> {
    let (session, game, next) = engine::current_question(ctx, student_id, session_id)?;

    let completed = session.questions_completed.len() as u32;
    let row = match next {
        Some(question) => CurrentQuestion {
            session_id,
            student_id: student_id.to_string(),
            game_id: session.game_id,
            question_id: Some(question.id),
            question_number: question.question_number,
            total_questions: game.total_questions,
            progress_percent: engine::progress_percent(completed, game.total_questions),
            options: presentation_options(ctx, &question),
            all_completed: false,
            updated_at: ctx.timestamp,
        },
        None => CurrentQuestion {
            session_id,
            student_id: student_id.to_string(),
            game_id: session.game_id,
            question_id: None,
            question_number: game.total_questions,
            total_questions: game.total_questions,
            progress_percent: engine::progress_percent(completed, game.total_questions),
            options: Vec::new(),
            all_completed: true,
            updated_at: ctx.timestamp,
        },
    };

    if ctx.db.current_question().session_id().find(&session_id).is_some() {
        ctx.db.current_question().session_id().update(row);
    } else {
        ctx.db.current_question().insert(row);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates_long_ids_only() {
        assert_eq!(short_id("abcdefghij"), "abcdefgh");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn submission_shape_names() {
        assert_eq!(
            Submission::Answer("a".to_string()).shape_name(),
            "a single answer"
        );
        assert_eq!(
            Submission::Sequence(vec!["sa".to_string()]).shape_name(),
            "an ordered sequence"
        );
        assert_eq!(Submission::Advance.shape_name(), "the advance signal");
    }
}
