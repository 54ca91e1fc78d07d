// Next-question selection.
//
// Pure scan over the catalog-ordered question list: the next pending
// question is the first whose id the session has not completed yet.

use crate::GameQuestion;

/// Result of scanning for the next pending question.
#[derive(Debug, PartialEq)]
pub enum Selection<'a> {
    Next(&'a GameQuestion),
    AllCompleted,
}

/// Sort questions into catalog order: by level, then by question number.
pub fn catalog_order(questions: &mut [GameQuestion]) {
    questions.sort_by_key(|q| (q.level, q.question_number));
}

/// First question in `ordered` whose id is not in `completed`, or
/// `AllCompleted` when none remains (including the empty-catalog case).
///
/// Completed ids that no longer exist in `ordered` (catalog changed after
/// play started) are ignored here; they still count toward the session's
/// completion total, which is checked elsewhere.
pub fn next_pending<'a>(ordered: &'a [GameQuestion], completed: &[u64]) -> Selection<'a> {
    ordered
        .iter()
        .find(|q| !completed.contains(&q.id))
        .map_or(Selection::AllCompleted, Selection::Next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuestionType;

    fn question(id: u64, level: u8, number: u32) -> GameQuestion {
        GameQuestion {
            id,
            game_id: 1,
            question_number: number,
            level,
            question_type: QuestionType::VocalFill,
            expected_answer: "a".to_string(),
            word: Some("ayam".to_string()),
            word_pattern: None,
            image_path: None,
            audio_letter_path: None,
            audio_word_path: None,
            instruction: String::new(),
            options: vec![],
        }
    }

    #[test]
    fn picks_first_uncompleted_in_catalog_order() {
        let questions = vec![question(10, 1, 1), question(11, 1, 2), question(12, 2, 1)];
        match next_pending(&questions, &[10]) {
            Selection::Next(q) => assert_eq!(q.id, 11),
            Selection::AllCompleted => panic!("expected a pending question"),
        }
    }

    #[test]
    fn all_completed_when_every_id_is_done() {
        let questions = vec![question(10, 1, 1), question(11, 1, 2)];
        assert_eq!(next_pending(&questions, &[11, 10]), Selection::AllCompleted);
    }

    #[test]
    fn empty_catalog_is_all_completed() {
        assert_eq!(next_pending(&[], &[]), Selection::AllCompleted);
    }

    #[test]
    fn stale_completed_ids_are_ignored_for_selection() {
        // 99 was removed from the catalog after the student completed it.
        let questions = vec![question(10, 1, 1), question(11, 1, 2)];
        match next_pending(&questions, &[99, 10]) {
            Selection::Next(q) => assert_eq!(q.id, 11),
            Selection::AllCompleted => panic!("expected a pending question"),
        }
    }

    #[test]
    fn catalog_order_sorts_by_level_then_number() {
        let mut questions = vec![question(3, 2, 1), question(1, 1, 2), question(2, 1, 1)];
        catalog_order(&mut questions);
        let ids: Vec<u64> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
