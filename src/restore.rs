// Bulk restore reducers for disaster recovery
// Accept JSON arrays exported from the admin panel (TypeScript SDK format)

use spacetimedb::{log, reducer, ReducerContext, Table, Timestamp};

use crate::{authorized_worker, play_session, question_attempt, student_badge};
use crate::{engine, PlaySession, QuestionAttempt, SessionStatus, StudentBadge};
use serde_json::Value;

/// Parse Timestamp from SDK JSON format:
/// {"__timestamp_micros_since_unix_epoch__": "123456"}
/// Older exports carry plain RFC 3339 strings; accept those too.
fn parse_timestamp_json(val: &Value) -> Result<Timestamp, String> {
    if let Some(micros_str) = val
        .get("__timestamp_micros_since_unix_epoch__")
        .and_then(|v| v.as_str())
    {
        let micros: i64 = micros_str
            .parse()
            .map_err(|e| format!("Invalid timestamp micros: {}", e))?;
        return Ok(Timestamp::from_micros_since_unix_epoch(micros));
    }

    if let Some(text) = val.as_str() {
        let parsed = chrono::DateTime::parse_from_rfc3339(text)
            .map_err(|e| format!("Invalid RFC 3339 timestamp '{}': {}", text, e))?;
        return Ok(Timestamp::from_micros_since_unix_epoch(
            parsed.timestamp_micros(),
        ));
    }

    Err("Missing or invalid timestamp field".to_string())
}

fn parse_status(text: &str) -> Result<SessionStatus, String> {
    match text {
        "in_progress" => Ok(SessionStatus::InProgress),
        "completed" => Ok(SessionStatus::Completed),
        "abandoned" => Ok(SessionStatus::Abandoned),
        other => Err(format!("Unknown session status '{}'", other)),
    }
}

fn require_worker(ctx: &ReducerContext, reducer_name: &str) -> Result<(), String> {
    if ctx.db.authorized_worker().identity().find(&ctx.sender).is_none() {
        log::warn!("Unauthorized {} attempt by {}", reducer_name, ctx.sender);
        return Err("Unauthorized".to_string());
    }
    Ok(())
}

/// Bulk restore play_session table from JSON array
/// Protected by authorization check - only authorized workers can call this
#[reducer]
pub fn bulk_restore_play_session(ctx: &ReducerContext, json_data: String) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_play_session")?;

    let data: Value =
        serde_json::from_str(&json_data).map_err(|e| format!("Invalid JSON: {}", e))?;
    let sessions = data.as_array().ok_or("Expected JSON array of play_session records")?;

    let mut count = 0;
    for (i, s) in sessions.iter().enumerate() {
        let questions_completed: Vec<u64> = s
            .get("questionsCompleted")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|q| q.as_u64()).collect())
            .unwrap_or_default();

        let session = PlaySession {
            id: 0, // auto_inc
            student_id: s.get("studentId").and_then(|v| v.as_str()).ok_or(format!("Session {}: missing studentId", i))?.to_string(),
            game_id: s.get("gameId").and_then(|v| v.as_u64()).ok_or(format!("Session {}: missing gameId", i))?,
            status: parse_status(s.get("status").and_then(|v| v.as_str()).ok_or(format!("Session {}: missing status", i))?)?,
            questions_completed,
            started_at: parse_timestamp_json(s.get("startedAt").ok_or(format!("Session {}: missing startedAt", i))?)?,
            completed_at: s.get("completedAt").and_then(|v| parse_timestamp_json(v).ok()),
            video_watched: s.get("videoWatched").and_then(|v| v.as_bool()).unwrap_or(false),
            video_completed_at: s.get("videoCompletedAt").and_then(|v| parse_timestamp_json(v).ok()),
        };

        ctx.db.play_session().insert(session);
        count += 1;
    }

    log::info!("✅ Restored {} play_session records", count);
    Ok(())
}

/// Bulk restore question_attempt table from JSON array
/// Protected by authorization check - only authorized workers can call this
#[reducer]
pub fn bulk_restore_question_attempt(
    ctx: &ReducerContext,
    json_data: String,
) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_question_attempt")?;

    let data: Value =
        serde_json::from_str(&json_data).map_err(|e| format!("Invalid JSON: {}", e))?;
    let attempts = data.as_array().ok_or("Expected JSON array of question_attempt records")?;

    let mut count = 0;
    for (i, a) in attempts.iter().enumerate() {
        let attempt = QuestionAttempt {
            id: 0, // auto_inc
            session_id: a.get("sessionId").and_then(|v| v.as_u64()).ok_or(format!("Attempt {}: missing sessionId", i))?,
            question_id: a.get("questionId").and_then(|v| v.as_u64()).ok_or(format!("Attempt {}: missing questionId", i))?,
            completed: a.get("completed").and_then(|v| v.as_bool()).ok_or(format!("Attempt {}: missing completed", i))?,
            selected_answer: a.get("selectedAnswer").and_then(|v| v.as_str()).ok_or(format!("Attempt {}: missing selectedAnswer", i))?.to_string(),
            observation: a.get("observation").and_then(|v| v.as_str()).map(|s| s.to_string()),
            attempt_count: a.get("attemptCount").and_then(|v| v.as_u64()).unwrap_or(1) as u32,
            attempted_at: parse_timestamp_json(a.get("attemptedAt").ok_or(format!("Attempt {}: missing attemptedAt", i))?)?,
        };

        ctx.db.question_attempt().insert(attempt);
        count += 1;
    }

    log::info!("✅ Restored {} question_attempt records", count);
    Ok(())
}

/// Bulk restore student_badge table from JSON array
/// Protected by authorization check - only authorized workers can call this
/// award_key is rebuilt from studentId/gameId; duplicate rows in the export
/// fail the unique constraint and are skipped with a warning.
#[reducer]
pub fn bulk_restore_student_badge(ctx: &ReducerContext, json_data: String) -> Result<(), String> {
    require_worker(ctx, "bulk_restore_student_badge")?;

    let data: Value =
        serde_json::from_str(&json_data).map_err(|e| format!("Invalid JSON: {}", e))?;
    let badges = data.as_array().ok_or("Expected JSON array of student_badge records")?;

    let mut count = 0;
    let mut skipped = 0;
    for (i, b) in badges.iter().enumerate() {
        let student_id = b.get("studentId").and_then(|v| v.as_str()).ok_or(format!("Badge {}: missing studentId", i))?.to_string();
        let game_id = b.get("gameId").and_then(|v| v.as_u64()).ok_or(format!("Badge {}: missing gameId", i))?;

        let badge = StudentBadge {
            id: 0, // auto_inc
            award_key: engine::award_key(&student_id, game_id),
            student_id,
            game_id,
            badge_name: b.get("badgeName").and_then(|v| v.as_str()).ok_or(format!("Badge {}: missing badgeName", i))?.to_string(),
            description: b.get("description").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            badge_image_path: b.get("badgeImagePath").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            earned_at: parse_timestamp_json(b.get("earnedAt").ok_or(format!("Badge {}: missing earnedAt", i))?)?,
        };

        match ctx.db.student_badge().try_insert(badge) {
            Ok(_) => count += 1,
            Err(_) => {
                log::warn!("Badge {}: duplicate (student, game) pair, skipped", i);
                skipped += 1;
            }
        }
    }

    log::info!("✅ Restored {} student_badge records ({} skipped)", count, skipped);
    Ok(())
}
