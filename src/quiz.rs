use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::Question;

/// Category id `0` on the wire means "all categories".
pub const ALL_CATEGORIES: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    All,
    Category(i64),
}

impl CategoryFilter {
    pub fn from_id(id: i64) -> Self {
        if id == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Category(id)
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        match self {
            Self::All => true,
            Self::Category(id) => question.category == *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizDraw<T> {
    Question(T),
    /// Every question matching the filter has already been served.
    Exhausted,
}

impl<T> QuizDraw<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Question(question) => Some(question),
            Self::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Questions that match `filter` and have not been served yet.
pub fn candidates<'a>(
    questions: &'a [Question],
    filter: CategoryFilter,
    previous: &HashSet<i64>,
) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|question| filter.matches(question))
        .filter(|question| !previous.contains(&question.id))
        .collect()
}

/// Draws one unseen question uniformly at random from the candidate set.
pub fn select_question<'a, R>(
    questions: &'a [Question],
    filter: CategoryFilter,
    previous: &HashSet<i64>,
    rng: &mut R,
) -> QuizDraw<&'a Question>
where
    R: Rng + ?Sized,
{
    let pool = candidates(questions, filter, previous);
    tracing::debug!(?filter, remaining = pool.len(), "quiz draw");
    match pool.choose(rng) {
        Some(question) => QuizDraw::Question(*question),
        None => QuizDraw::Exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(id: i64, category: i64) -> Question {
        Question {
            id,
            question: format!("Question {id}?"),
            answer: format!("Answer {id}"),
            category,
            difficulty: 2,
        }
    }

    fn bank() -> Vec<Question> {
        let mut questions: Vec<Question> = (1..=5).map(|id| question(id, 4)).collect();
        questions.push(question(6, 1));
        questions.push(question(7, 1));
        questions
    }

    #[test]
    fn only_remaining_question_is_returned() {
        let questions = bank();
        let previous: HashSet<i64> = [1, 2, 3, 5].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let draw =
                select_question(&questions, CategoryFilter::Category(4), &previous, &mut rng);
            assert_eq!(draw.into_option().map(|q| q.id), Some(4));
        }
    }

    #[test]
    fn all_seen_is_exhausted() {
        let questions = bank();
        let previous: HashSet<i64> = (1..=5).collect();
        let mut rng = StdRng::seed_from_u64(1);

        let draw = select_question(&questions, CategoryFilter::Category(4), &previous, &mut rng);
        assert!(draw.is_exhausted());
    }

    #[test]
    fn all_filter_spans_categories() {
        let questions = bank();
        let previous: HashSet<i64> = (1..=6).collect();
        let mut rng = StdRng::seed_from_u64(3);

        let draw = select_question(&questions, CategoryFilter::from_id(0), &previous, &mut rng);
        assert_eq!(draw.into_option().map(|q| q.id), Some(7));
    }

    #[test]
    fn draws_never_repeat_previous() {
        let questions = bank();
        let mut previous = HashSet::new();
        let mut rng = StdRng::seed_from_u64(42);

        while let QuizDraw::Question(next) =
            select_question(&questions, CategoryFilter::All, &previous, &mut rng)
        {
            assert!(
                previous.insert(next.id),
                "question {} served twice",
                next.id
            );
        }
        assert_eq!(previous.len(), questions.len());
    }

    #[test]
    fn unknown_category_has_no_candidates() {
        let questions = bank();
        let pool = candidates(&questions, CategoryFilter::Category(99), &HashSet::new());
        assert!(pool.is_empty());
    }
}
