use rand::seq::SliceRandom;
use rand::Rng;

use crate::database::quiz::{Book, QuizQuestion};

/// At most this many questions are asked per quiz.
pub const MAX_QUESTIONS: usize = 10;
pub const OPTION_LABELS: [&str; 3] = ["A", "B", "C"];
pub const POINTS_PER_ANSWER: i64 = 10;

/// One user's run through a book quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    // user who started the quiz; group chats share one dialogue
    owner: i64,
    book_id: i64,
    book_title: String,
    questions: Vec<QuizQuestion>,
    index: usize,
    score: usize,
    // correct option of the question currently on screen
    pending: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedQuestion {
    pub index: usize,
    pub text: String,
    pub options: Vec<String>,
    pub correct: usize,
}

impl QuizSession {
    /// Starts a session over the book's questions in random order. `None` when the book has no quiz.
    pub fn start<R: Rng + ?Sized>(book: Book, owner: i64, rng: &mut R) -> Option<Self> {
        if book.questions().is_empty() {
            return None;
        }

        let book_id = book.id();
        let book_title = book.title().to_owned();
        let mut questions = book.into_questions();
        questions.shuffle(rng);

        Some(Self {
            owner,
            book_id,
            book_title,
            questions,
            index: 0,
            score: 0,
            pending: None,
        })
    }

    pub fn owner(&self) -> i64 {
        self.owner
    }

    pub fn book_id(&self) -> i64 {
        self.book_id
    }

    pub fn book_title(&self) -> &str {
        &self.book_title
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len().min(MAX_QUESTIONS)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.total()
    }

    pub fn points(&self) -> i64 {
        self.score as i64 * POINTS_PER_ANSWER
    }

    /// Half of the answers right, rounding in the user's favour.
    pub fn passed(&self) -> bool {
        self.score * 2 >= self.total()
    }

    /// Shuffles the current question's options, keeping the right one among the shown labels.
    pub fn next_question<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PresentedQuestion> {
        if self.is_finished() {
            return None;
        }

        let question = &self.questions[self.index];

        let mut distractors: Vec<&String> = Vec::new();
        for opt in question.opts.iter().filter(|opt| **opt != question.ans) {
            if !distractors.contains(&opt) {
                distractors.push(opt);
            }
        }
        distractors.shuffle(rng);
        distractors.truncate(OPTION_LABELS.len() - 1);

        let mut options: Vec<String> = distractors.into_iter().cloned().collect();
        let correct = rng.gen_range(0..=options.len());
        options.insert(correct, question.ans.clone());

        self.pending = Some(correct);

        Some(PresentedQuestion {
            index: self.index,
            text: question.q.clone(),
            options,
            correct,
        })
    }

    /// Scores `user_id`'s `choice` for the question at `question_index`.
    ///
    /// Returns `None` when the user does not own the session, nothing is
    /// pending, or the answer belongs to an earlier question, so a question
    /// is never scored twice.
    pub fn answer(&mut self, user_id: i64, question_index: usize, choice: usize) -> Option<bool> {
        if user_id != self.owner || question_index != self.index {
            return None;
        }
        let correct = self.pending.take()?;
        let is_correct = choice == correct;
        if is_correct {
            self.score += 1;
        }
        self.index += 1;
        Some(is_correct)
    }
}
