use std::fmt;

use serde::{Deserialize, Serialize};

use crate::messages::escape;

/// A single multiple-choice question as it is stored in the `books.questions` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub q: String,
    pub opts: Vec<String>,
    pub ans: String,
}

#[derive(Debug, Clone)]
pub struct Book {
    id: i64,
    title: String,
    author: String,
    description: String,
    category: String,
    questions: Vec<QuizQuestion>,
}

/// Short listing row used by the test picker and search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    pub id: i64,
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    pub title: String,
    pub author: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFile {
    pub id: i64,
    pub title: String,
    pub file_id: String,
}

impl QuizQuestion {
    pub fn new(q: impl Into<String>, opts: Vec<String>, ans: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            opts,
            ans: ans.into(),
        }
    }
}

impl Book {
    pub fn retreive(
        id: i64,
        title: String,
        author: String,
        description: String,
        category: String,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        Self {
            id,
            title,
            author,
            description,
            category,
            questions,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn into_questions(self) -> Vec<QuizQuestion> {
        self.questions
    }
}

impl fmt::Display for BookSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "📘 {}\n✍️ {}\n\n{}",
            escape(&self.title),
            escape(&self.author),
            escape(&self.description)
        )
    }
}
