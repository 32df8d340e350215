//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use uuid::Uuid;

use vocab_quiz_backend::models::ItemRequest;

pub fn item_request(english: &str, japanese: &str, grade: i32) -> ItemRequest {
    ItemRequest {
        english: english.to_string(),
        japanese: japanese.to_string(),
        grade,
    }
}

/// Create an item request body.
pub fn item_body(english: &str, japanese: &str, grade: i32) -> serde_json::Value {
    json!({ "english": english, "japanese": japanese, "grade": grade })
}

/// Create a register request body.
pub fn register_request(user_name: &str, password: &str) -> serde_json::Value {
    json!({
        "user_name": user_name,
        "email": format!("{}@example.com", user_name),
        "password": password,
    })
}

/// Create a quiz request body.
pub fn create_quiz_request(
    deck_id: Option<i64>,
    grade: Option<i32>,
    question_count: Option<usize>,
    options_per_question: Option<usize>,
) -> serde_json::Value {
    json!({
        "deck_id": deck_id,
        "grade": grade,
        "question_count": question_count,
        "options_per_question": options_per_question,
    })
}

/// Create one entry of a quiz submission body.
pub fn answer(question_number: usize, user_answer: usize, answer_time: u32) -> serde_json::Value {
    json!({
        "question_number": question_number,
        "user_answer": user_answer,
        "answer_time": answer_time,
    })
}

/// Sample import file with `count` blocks.
pub fn sample_import_content(count: usize, grade: Option<i32>) -> String {
    (1..=count)
        .map(|i| match grade {
            Some(g) => format!("EN: import{}\nJA: 輸入{}\nGRADE: {}\n", i, i, g),
            None => format!("EN: import{}\nJA: 輸入{}\n", i, i),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate a unique name to avoid collisions between test runs.
pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// Grade value unlikely to be shared with other tests.
pub fn unique_grade() -> i32 {
    1_000 + (Uuid::new_v4().as_u128() % 1_000_000) as i32
}
