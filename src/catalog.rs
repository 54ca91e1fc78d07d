// Catalog seed data and badge content.
//
// The three games and their question banks mirror the production seed set.
// Question numbers are assigned per game in list order; catalog order for
// play is (level, question_number). The seeding reducers in lib.rs consume
// this data; nothing here touches the stores.

use crate::{GameCategory, QuestionType};

pub struct QuestionSeed {
    pub level: u8,
    pub question_type: QuestionType,
    pub expected_answer: String,
    pub word: Option<String>,
    pub word_pattern: Option<String>,
    pub image_path: Option<String>,
    pub audio_letter_path: Option<String>,
    pub audio_word_path: Option<String>,
    pub instruction: String,
    pub options: Vec<String>,
}

pub struct GameSeed {
    pub title: &'static str,
    pub description: &'static str,
    pub target_age: &'static str,
    pub skill_focus: &'static str,
    pub learning_outcomes: Vec<String>,
    pub theme: &'static str,
    pub category: GameCategory,
    pub video_path: Option<&'static str>,
    pub questions: Vec<QuestionSeed>,
}

/// All games in the catalog, in seeding order.
pub fn seed_games() -> Vec<GameSeed> {
    vec![vowel_game(), detective_game(), spelling_game()]
}

// -------------------- Badge content --------------------

pub struct BadgeContent {
    pub name: &'static str,
    pub description: &'static str,
    pub image_path: &'static str,
}

/// Badge awarded on completing a game of the given category.
pub fn badge_for_category(category: &GameCategory) -> BadgeContent {
    match category {
        GameCategory::VowelSounds => BadgeContent {
            name: "Ahli Huruf Vokal",
            description: "Selamat! Kamu sudah mahir mengenali dan mengucapkan huruf vokal!",
            image_path: "assets/badges/vowel_master.png",
        },
        GameCategory::LetterDetective => BadgeContent {
            name: "Detektif Handal",
            description: "Selamat! Kamu adalah detektif huruf yang sangat handal!",
            image_path: "assets/badges/detective_master.png",
        },
        GameCategory::Spelling => BadgeContent {
            name: "Ahli Mengeja",
            description: "Selamat! Kamu sudah mahir mengeja dan membaca kalimat sederhana!",
            image_path: "assets/badges/spelling_master.png",
        },
        GameCategory::General => BadgeContent {
            name: "Pencapai Hebat",
            description: "Kamu telah menyelesaikan sebuah game!",
            image_path: "assets/badges/default_badge.png",
        },
    }
}

// -------------------- Permainan Huruf Vokal --------------------

fn vowel_game() -> GameSeed {
    let words: [(&str, &str); 5] = [
        ("A", "Ayam"),
        ("I", "Ikan"),
        ("U", "Ular"),
        ("E", "Ember"),
        ("O", "Obat"),
    ];

    let questions = words
        .iter()
        .map(|(letter, word)| {
            let lower = word.to_lowercase();
            QuestionSeed {
                level: 1,
                question_type: QuestionType::VocalFill,
                expected_answer: letter.to_string(),
                word: Some(word.to_string()),
                word_pattern: None,
                image_path: Some(format!("assets/games/vowels/images/{lower}.png")),
                audio_letter_path: Some(format!(
                    "assets/games/vowels/audio/letters/{}.mp3",
                    letter.to_lowercase()
                )),
                audio_word_path: Some(format!("assets/games/vowels/audio/words/{lower}.mp3")),
                instruction: format!(
                    "Dengarkan suara, lalu pilih huruf awal yang tepat untuk gambar {word}."
                ),
                options: str_vec(&["A", "I", "U", "E", "O"]),
            }
        })
        .collect();

    GameSeed {
        title: "Permainan Huruf Vokal",
        description: "Belajar mengenali dan mengartikulasikan huruf vokal A, I, U, E, O.",
        target_age: "PlayGroup",
        skill_focus: "Mengenal Artikulasi Huruf Vokal",
        learning_outcomes: str_vec(&[
            "Anak dapat mengartikulasikan huruf vokal",
            "Anak dapat mengenali huruf vokal",
            "Anak dapat mencocokkan huruf vokal dengan kata benda",
        ]),
        theme: "Taman Bermain",
        category: GameCategory::VowelSounds,
        video_path: Some("assets/games/vowels/video/intro_vowels.mp4"),
        questions,
    }
}

// -------------------- Detektif Huruf --------------------

/// Letters commonly confused with each other by early readers. Used to
/// build the drag-match distractor sets.
fn similar_letters(letter: char) -> &'static [char] {
    match letter {
        'b' => &['d', 'p', 'q'],
        'd' => &['b', 'p', 'q'],
        'p' => &['q', 'b', 'd'],
        'q' => &['p', 'b', 'd'],
        'i' => &['j'],
        'j' => &['i'],
        'g' => &['a'],
        'a' => &['g'],
        't' => &['f'],
        'f' => &['t'],
        'u' => &['v', 'w'],
        'v' => &['u', 'w'],
        'w' => &['u', 'v'],
        'h' => &['m', 'n'],
        'm' => &['h', 'n'],
        'n' => &['h', 'm'],
        _ => &[],
    }
}

fn detective_game() -> GameSeed {
    let mut questions = Vec::new();

    // Level 1: spot the odd letter among three cards.
    let find_difference: [([&str; 3], &str); 8] = [
        (["b", "b", "d"], "d"),
        (["q", "p", "p"], "q"),
        (["n", "m", "n"], "m"),
        (["h", "n", "h"], "n"),
        (["i", "i", "j"], "j"),
        (["u", "v", "u"], "v"),
        (["a", "a", "g"], "g"),
        (["t", "f", "t"], "f"),
    ];
    for (cards, correct) in find_difference {
        questions.push(QuestionSeed {
            level: 1,
            question_type: QuestionType::FindDifference,
            expected_answer: correct.to_string(),
            word: Some(cards.join("-")),
            word_pattern: None,
            image_path: None,
            audio_letter_path: None,
            audio_word_path: None,
            instruction: "Pilih huruf yang berbeda dari tiga kartu berikut:".to_string(),
            options: cards.iter().map(|c| c.to_string()).collect(),
        });
    }

    // Level 2: drag a letter to its match; distractors come from the
    // confusion map, two per target.
    let drag_letters = [
        'b', 'd', 'p', 'q', 'i', 'j', 'g', 'a', 't', 'f', 'u', 'v', 'w', 'h', 'm', 'n',
    ];
    for letter in drag_letters {
        let mut options = vec![letter.to_string()];
        options.extend(
            similar_letters(letter)
                .iter()
                .take(2)
                .map(|c| c.to_string()),
        );
        questions.push(QuestionSeed {
            level: 2,
            question_type: QuestionType::DragMatch,
            expected_answer: letter.to_string(),
            word: Some(letter.to_string()),
            word_pattern: None,
            image_path: None,
            audio_letter_path: Some(format!("assets/games/vowels/audio/letters/{letter}.mp3")),
            audio_word_path: None,
            instruction: format!(
                "Seret huruf '{}' ke pasangannya yang benar.",
                letter.to_uppercase()
            ),
            options,
        });
    }

    // Level 3: complete the word with its missing first letter.
    let fill_blank: [(&str, &str, [&str; 3]); 7] = [
        ("bintang", "b", ["b", "d", "p"]),
        ("pisang", "p", ["p", "q", "b"]),
        ("monyet", "m", ["n", "m", "w"]),
        ("jeruk", "j", ["i", "j", "l"]),
        ("unta", "u", ["u", "v", "w"]),
        ("apel", "a", ["a", "g", "o"]),
        ("tikus", "t", ["t", "f", "r"]),
    ];
    for (word, correct, options) in fill_blank {
        questions.push(QuestionSeed {
            level: 3,
            question_type: QuestionType::FillBlank,
            expected_answer: correct.to_string(),
            word: Some(word.to_string()),
            word_pattern: None,
            image_path: Some(format!("assets/games/detektif/images/{word}.png")),
            audio_letter_path: None,
            audio_word_path: Some(format!("assets/games/detektif/audio/words/{word}.mp3")),
            instruction: "Lengkapi kata ini dengan huruf yang tepat:".to_string(),
            options: options.iter().map(|c| c.to_string()).collect(),
        });
    }

    GameSeed {
        title: "Detektif Huruf",
        description:
            "Asah mata detektifmu! Temukan perbedaan huruf yang mirip, pasangkan, dan lengkapi kata.",
        target_age: "TK A",
        skill_focus: "Mengenali Perbedaan Huruf, Pencocokan, Melengkapi Kata",
        learning_outcomes: str_vec(&[
            "Anak dapat membedakan huruf yang mirip (b-d, p-q, dll.)",
            "Anak dapat mencocokkan huruf yang sama",
            "Anak dapat melengkapi kata dengan huruf yang sesuai",
        ]),
        theme: "Petualangan Detektif",
        category: GameCategory::LetterDetective,
        video_path: None,
        questions,
    }
}

// -------------------- Belajar Mengeja --------------------

fn spelling_game() -> GameSeed {
    let mut questions = Vec::new();

    // Level 1: complete the word with the missing syllable.
    let complete_word: [(&str, &str, &str, [&str; 3]); 5] = [
        ("sa", "sapu", "... + pu", ["sa", "si", "so"]),
        ("ru", "biru", "bi + ...", ["ra", "ri", "ru"]),
        ("ro", "roti", "... + ti", ["ro", "ra", "ri"]),
        ("ta", "pita", "pi + ...", ["ta", "ti", "to"]),
        ("ku", "buku", "bu + ...", ["ku", "ki", "ko"]),
    ];
    for (syllable, word, pattern, options) in complete_word {
        questions.push(QuestionSeed {
            level: 1,
            question_type: QuestionType::CompleteWord,
            expected_answer: syllable.to_string(),
            word: Some(word.to_string()),
            word_pattern: Some(pattern.to_string()),
            image_path: Some(format!("assets/games/spelling/images/{word}.png")),
            audio_letter_path: Some(format!(
                "assets/games/spelling/audio/syllables/{syllable}.mp3"
            )),
            audio_word_path: Some(format!("assets/games/spelling/audio/words/{word}.mp3")),
            instruction: "Lengkapi kata di bawah ini dengan memilih suku kata yang tepat!"
                .to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
        });
    }

    // Level 2: arrange syllables into the full phrase. The expected answer
    // is the comma-joined correct order; options hold the scrambled set.
    let arrange: [(&str, &str, [&str; 4]); 5] = [
        ("sa,pu,bi,ru", "sapu biru", ["bi", "sa", "pu", "ru"]),
        ("ba,ca,bu,ku", "baca buku", ["ca", "ba", "ku", "bu"]),
        ("ba,ju,ba,ru", "baju baru", ["ju", "ba", "ru", "ba"]),
        ("la,ri,pa,gi", "lari pagi", ["pa", "la", "ri", "gi"]),
        ("i,bu,gu,ru", "ibu guru", ["i", "bu", "ru", "gu"]),
    ];
    for (sequence, word, options) in arrange {
        questions.push(QuestionSeed {
            level: 2,
            question_type: QuestionType::ArrangeSyllables,
            expected_answer: sequence.to_string(),
            word: Some(word.to_string()),
            word_pattern: Some("[ ] [ ] [ ] [ ]".to_string()),
            image_path: None,
            audio_letter_path: None,
            audio_word_path: None,
            instruction: "Susun suku kata menjadi kata yang benar!".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
        });
    }

    // Level 3: read the sentence aloud; advancing past it is the answer.
    let sentences = [
        "ibu beli sapu biru",
        "aku suka baca buku",
        "papa beli baju baru",
        "risa suka lagu baru",
        "mama minum susu sapi",
        "rusa lari di hutan",
        "makan telur mata sapi",
    ];
    for sentence in sentences {
        questions.push(QuestionSeed {
            level: 3,
            question_type: QuestionType::ReadSentence,
            expected_answer: "next".to_string(),
            word: Some(sentence.to_string()),
            word_pattern: Some(sentence.to_string()),
            image_path: None,
            audio_letter_path: None,
            audio_word_path: None,
            instruction: "Bacalah kalimat di bawah ini dengan lantang!".to_string(),
            options: vec![],
        });
    }

    GameSeed {
        title: "Belajar Mengeja",
        description:
            "Belajar mengeja kata dengan menyusun suku kata dan membaca kalimat sederhana untuk anak TK B",
        target_age: "TK B",
        skill_focus: "Mengeja dan Membaca",
        learning_outcomes: str_vec(&[
            "Mampu melengkapi kata yang hilang",
            "Mampu menyusun suku kata menjadi kata utuh",
            "Mampu membaca kalimat sederhana",
            "Meningkatkan kemampuan fonetik dan literasi",
        ]),
        theme: "Mengeja",
        category: GameCategory::Spelling,
        video_path: Some("assets/games/spelling/intro_video.mp4"),
        questions,
    }
}

fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::split_sequence;

    #[test]
    fn seed_question_counts_match_production() {
        let games = seed_games();
        assert_eq!(games.len(), 3);
        assert_eq!(games[0].questions.len(), 5); // vowels
        assert_eq!(games[1].questions.len(), 31); // detective: 8 + 16 + 7
        assert_eq!(games[2].questions.len(), 17); // spelling: 5 + 5 + 7
    }

    #[test]
    fn arrange_syllable_answers_parse_to_option_count() {
        let spelling = spelling_game();
        for q in spelling
            .questions
            .iter()
            .filter(|q| q.question_type == QuestionType::ArrangeSyllables)
        {
            let expected = split_sequence(&q.expected_answer);
            assert_eq!(expected.len(), q.options.len(), "{:?}", q.word);
            // Every syllable in the answer must be offered as an option.
            for part in &expected {
                assert!(q.options.contains(part), "{part} missing from options");
            }
        }
    }

    #[test]
    fn drag_match_options_contain_target_plus_distractors() {
        let detective = detective_game();
        for q in detective
            .questions
            .iter()
            .filter(|q| q.question_type == QuestionType::DragMatch)
        {
            assert!(q.options.contains(&q.expected_answer));
            assert!(q.options.len() >= 2, "{} needs distractors", q.expected_answer);
        }
    }

    #[test]
    fn read_sentence_questions_have_no_options() {
        let spelling = spelling_game();
        for q in spelling
            .questions
            .iter()
            .filter(|q| q.question_type == QuestionType::ReadSentence)
        {
            assert!(q.options.is_empty());
        }
    }

    #[test]
    fn badge_content_is_distinct_per_category() {
        let names: Vec<&str> = [
            GameCategory::VowelSounds,
            GameCategory::LetterDetective,
            GameCategory::Spelling,
            GameCategory::General,
        ]
        .iter()
        .map(|c| badge_for_category(c).name)
        .collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
    }
}
