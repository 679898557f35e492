use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_body, RawId};
use crate::db::TriviaStore;
use crate::error::{CoreError, EntityKind, FieldError, Result};
use crate::models::{Question, QuestionDraft};
use crate::query::{paginate, search_by_name, EmptyTermPolicy};
use crate::quiz::{select_question, CategoryFilter, ALL_CATEGORIES};

const DIFFICULTY_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: BTreeMap<i64, String>,
    pub total_categories: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionsPage {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub categories: BTreeMap<i64, String>,
    pub current_category: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionList {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub current_category: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deleted {
    pub success: bool,
    pub deleted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    pub success: bool,
    pub created: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub question: Option<Question>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewQuestion {
    question: String,
    answer: String,
    category: RawId,
    difficulty: RawId,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(rename = "searchTerm", alias = "search_term", default)]
    search_term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuizRequest {
    #[serde(default)]
    previous_questions: Vec<i64>,
    quiz_category: QuizCategory,
}

/// The client also sends a `type` label here; only the id is used.
#[derive(Debug, Deserialize)]
struct QuizCategory {
    id: RawId,
}

pub fn categories(store: &TriviaStore) -> Result<CategoriesResponse> {
    let categories = category_map(store)?;
    Ok(CategoriesResponse {
        success: true,
        total_categories: categories.len(),
        categories,
    })
}

/// One page of questions. `total_questions` counts the whole bank, not the page.
pub fn questions_page(store: &TriviaStore, page: usize, page_size: usize) -> Result<QuestionsPage> {
    let questions = store.list_questions()?;
    let selection = paginate(&questions, page, page_size);
    if selection.is_empty() {
        return Err(CoreError::not_found(
            EntityKind::QuestionPage,
            i64::try_from(page).unwrap_or(i64::MAX),
        ));
    }

    Ok(QuestionsPage {
        success: true,
        questions: selection.to_vec(),
        total_questions: questions.len(),
        categories: category_map(store)?,
        current_category: None,
    })
}

pub fn delete_question(store: &TriviaStore, id: i64) -> Result<Deleted> {
    let question = store.delete_question(id)?;
    Ok(Deleted {
        success: true,
        deleted: question.id,
    })
}

pub fn create_question(store: &TriviaStore, body: &Value) -> Result<Created> {
    let request: NewQuestion = decode_body(body)?;
    let draft = validate_question(request)?;
    let question = store.insert_question(&draft)?;
    Ok(Created {
        success: true,
        created: question.id,
    })
}

pub fn questions_in_category(store: &TriviaStore, category: i64) -> Result<QuestionList> {
    store.get_category(category)?;
    let questions = store.questions_in_category(category)?;
    Ok(QuestionList {
        success: true,
        total_questions: questions.len(),
        questions,
        current_category: Some(category),
    })
}

pub fn search_questions(
    store: &TriviaStore,
    body: &Value,
    policy: EmptyTermPolicy,
) -> Result<QuestionList> {
    let request: SearchRequest = decode_body(body)?;
    let term = request.search_term.unwrap_or_default();
    let questions = store.list_questions()?;
    let hits = search_by_name(&questions, &term, policy)?;

    Ok(QuestionList {
        success: true,
        total_questions: hits.count,
        questions: hits.data.into_iter().cloned().collect(),
        current_category: None,
    })
}

/// Picks the next quiz question, or `question: null` once the category is used up.
pub fn next_quiz_question<R>(store: &TriviaStore, body: &Value, rng: &mut R) -> Result<QuizResponse>
where
    R: Rng + ?Sized,
{
    let request: QuizRequest = decode_body(body)?;
    let category = request
        .quiz_category
        .id
        .parse("quiz_category.id")
        .map_err(|field| CoreError::ValidationFailed(vec![field]))?;

    let questions = if category == ALL_CATEGORIES {
        store.list_questions()?
    } else {
        store.get_category(category)?;
        store.questions_in_category(category)?
    };
    let previous: HashSet<i64> = request.previous_questions.into_iter().collect();
    let draw = select_question(
        &questions,
        CategoryFilter::from_id(category),
        &previous,
        rng,
    );
    if draw.is_exhausted() {
        tracing::debug!(category, seen = previous.len(), "quiz exhausted");
    }

    Ok(QuizResponse {
        success: true,
        question: draw.into_option().cloned(),
    })
}

fn category_map(store: &TriviaStore) -> Result<BTreeMap<i64, String>> {
    Ok(store
        .list_categories()?
        .into_iter()
        .map(|category| (category.id, category.kind))
        .collect())
}

fn validate_question(request: NewQuestion) -> Result<QuestionDraft> {
    let mut errors = Vec::new();
    let question = request.question.trim().to_string();
    if question.is_empty() {
        errors.push(FieldError::new("question", "is required"));
    }
    let answer = request.answer.trim().to_string();
    if answer.is_empty() {
        errors.push(FieldError::new("answer", "is required"));
    }
    let category = request.category.parse("category").unwrap_or_else(|field| {
        errors.push(field);
        0
    });
    let difficulty = match request.difficulty.parse("difficulty") {
        Ok(level) if DIFFICULTY_RANGE.contains(&level) => level as u8,
        Ok(_) => {
            errors.push(FieldError::new("difficulty", "must be between 1 and 5"));
            0
        }
        Err(field) => {
            errors.push(field);
            0
        }
    };

    if errors.is_empty() {
        Ok(QuestionDraft {
            question,
            answer,
            category,
            difficulty,
        })
    } else {
        Err(CoreError::ValidationFailed(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn seeded() -> TriviaStore {
        let store = TriviaStore::open_in_memory().expect("open store");
        let bank = [
            ("Who was born Cassius Clay?", "Muhammad Ali", 4, 1),
            ("Who wrote the Caged Bird memoir?", "Maya Angelou", 4, 2),
            ("What is the largest lake in Africa?", "Lake Victoria", 3, 2),
            ("What artist drew impossible objects?", "Escher", 2, 1),
            ("What is the heaviest human organ?", "The Liver", 1, 4),
        ];
        for (question, answer, category, difficulty) in bank {
            store
                .insert_question(&QuestionDraft {
                    question: question.to_string(),
                    answer: answer.to_string(),
                    category,
                    difficulty,
                })
                .expect("seed question");
        }
        store
    }

    #[test]
    fn categories_are_keyed_by_id() {
        let store = seeded();
        let response = categories(&store).expect("categories");
        assert_eq!(response.total_categories, 6);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["categories"]["1"], "Science");
        assert_eq!(json["success"], true);
    }

    #[test]
    fn page_reports_whole_bank_total() {
        let store = seeded();
        let page = questions_page(&store, 1, 2).expect("page one");
        assert_eq!(page.questions.len(), 2);
        assert_eq!(page.total_questions, 5);
        assert_eq!(page.current_category, None);
        assert_eq!(page.categories.len(), 6);

        let err = questions_page(&store, 4, 2).expect_err("past the end");
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn create_validates_each_field() {
        let store = seeded();
        let dune = json!({
            "question": "Who wrote Dune?",
            "answer": "Frank Herbert",
            "category": "5",
            "difficulty": 3
        });
        let created = create_question(&store, &dune).expect("create");
        let stored = store.get_question(created.created).expect("stored");
        assert_eq!(stored.category, 5);

        let err = create_question(
            &store,
            &json!({"question": " ", "answer": "x", "category": 1, "difficulty": 9}),
        )
        .expect_err("invalid");
        match err {
            CoreError::ValidationFailed(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["question", "difficulty"]);
            }
            other => panic!("expected validation failure, got {other}"),
        }

        let err = create_question(
            &store,
            &json!({"question": "q", "answer": "a", "category": 42, "difficulty": 1}),
        )
        .expect_err("unknown category");
        assert_eq!(err.status(), 422);
        assert_eq!(store.count_questions().expect("count"), 6);
    }

    #[test]
    fn category_listing_filters_by_category() {
        let store = seeded();
        let history = questions_in_category(&store, 4).expect("history");
        assert_eq!(history.total_questions, 2);
        assert!(history.questions.iter().all(|q| q.category == 4));
        assert_eq!(history.current_category, Some(4));

        let sports = questions_in_category(&store, 6).expect("sports");
        assert!(sports.questions.is_empty());
        assert_eq!(
            questions_in_category(&store, 99)
                .expect_err("unknown")
                .status(),
            404
        );
    }

    #[test]
    fn search_accepts_both_key_spellings() {
        let store = seeded();
        let body = json!({"searchTerm": "LAKE"});
        let hits = search_questions(&store, &body, EmptyTermPolicy::MatchAll).expect("search");
        assert_eq!(hits.total_questions, 1);
        assert_eq!(hits.questions[0].answer, "Lake Victoria");

        let body = json!({"search_term": "what"});
        let hits = search_questions(&store, &body, EmptyTermPolicy::MatchAll).expect("search");
        assert_eq!(hits.total_questions, 3);

        let err = search_questions(&store, &json!({}), EmptyTermPolicy::Reject).expect_err("blank");
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn quiz_walks_a_category_then_ends() {
        let store = seeded();
        let mut rng = StdRng::seed_from_u64(11);
        let mut previous: Vec<i64> = Vec::new();

        for _ in 0..2 {
            let body = json!({
                "previous_questions": previous,
                "quiz_category": {"type": "History", "id": "4"}
            });
            let question = next_quiz_question(&store, &body, &mut rng)
                .expect("draw")
                .question
                .expect("a question remains");
            assert_eq!(question.category, 4);
            assert!(!previous.contains(&question.id));
            previous.push(question.id);
        }

        let body = json!({
            "previous_questions": previous,
            "quiz_category": {"type": "History", "id": 4}
        });
        let response = next_quiz_question(&store, &body, &mut rng).expect("draw");
        assert_eq!(response.question, None);
        assert!(response.success);
    }

    #[test]
    fn quiz_over_all_categories_and_unknown_category() {
        let store = seeded();
        let mut rng = StdRng::seed_from_u64(3);
        let body = json!({
            "previous_questions": [1, 2, 3, 4],
            "quiz_category": {"type": "click", "id": 0}
        });
        let response = next_quiz_question(&store, &body, &mut rng).expect("draw");
        assert_eq!(response.question.map(|q| q.id), Some(5));

        let body = json!({"previous_questions": [], "quiz_category": {"id": 77}});
        let err = next_quiz_question(&store, &body, &mut rng).expect_err("unknown");
        assert_eq!(err.status(), 404);

        let err = next_quiz_question(&store, &json!({"previous_questions": []}), &mut rng)
            .expect_err("missing category");
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn delete_reports_id_then_missing() {
        let store = seeded();
        assert_eq!(delete_question(&store, 2).expect("delete").deleted, 2);
        assert_eq!(delete_question(&store, 2).expect_err("gone").status(), 404);
    }
}
