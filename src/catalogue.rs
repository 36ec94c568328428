use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::database::quiz::QuizQuestion;

pub const DEFAULT_CATEGORY: &str = "Badiiy";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read catalogue: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("question #{index}: {reason}")]
    InvalidQuestion { index: usize, reason: &'static str },
    #[error("catalogue must be a list of books or an object of books")]
    NotACatalogue,
}

/// A book with its quiz, as uploaded by an admin or listed in the seed catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookImport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quiz: Vec<QuizQuestion>,
    #[serde(default = "default_category", deserialize_with = "null_as_category")]
    pub category: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

// `null` is treated the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_category))
}

impl BookImport {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ImportError> {
        let book: BookImport = serde_json::from_slice(bytes)?;
        book.validate()?;
        Ok(book)
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if self.title.trim().is_empty() {
            return Err(ImportError::MissingField("title"));
        }
        if self.author.trim().is_empty() {
            return Err(ImportError::MissingField("author"));
        }
        if self.quiz.is_empty() {
            return Err(ImportError::MissingField("quiz"));
        }

        for (i, question) in self.quiz.iter().enumerate() {
            let index = i + 1;
            if question.q.trim().is_empty() {
                return Err(ImportError::InvalidQuestion {
                    index,
                    reason: "empty question text",
                });
            }
            if question.opts.len() < 2 {
                return Err(ImportError::InvalidQuestion {
                    index,
                    reason: "fewer than two options",
                });
            }
            if !question.opts.contains(&question.ans) {
                return Err(ImportError::InvalidQuestion {
                    index,
                    reason: "answer is not one of the options",
                });
            }
        }

        Ok(())
    }
}

/// Parses a seed catalogue in file order, dropping books that are malformed or fail validation.
pub fn parse_seed(bytes: &[u8]) -> Result<Vec<BookImport>, ImportError> {
    let entries: Vec<(String, Value)> = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (format!("#{}", i + 1), item))
            .collect(),
        Value::Object(items) => items.into_iter().collect(),
        _ => return Err(ImportError::NotACatalogue),
    };

    let books = entries
        .into_iter()
        .filter_map(|(key, entry)| {
            let book = serde_json::from_value::<BookImport>(entry)
                .map_err(ImportError::from)
                .and_then(|book| book.validate().map(|()| book));
            match book {
                Ok(book) => Some(book),
                Err(e) => {
                    log::error!("Skipping catalogue entry {}: {}", key, e);
                    None
                }
            }
        })
        .collect();

    Ok(books)
}

pub async fn load_seed(path: &Path) -> Result<Vec<BookImport>, ImportError> {
    let bytes = tokio::fs::read(path).await?;
    parse_seed(&bytes)
}

/// Library title for an uploaded PDF: extension dropped, underscores as spaces.
pub fn pdf_title(file_name: &str) -> String {
    let stem = file_name
        .len()
        .checked_sub(".pdf".len())
        .filter(|&cut| file_name.is_char_boundary(cut))
        .filter(|&cut| file_name[cut..].eq_ignore_ascii_case(".pdf"))
        .map_or(file_name, |cut| &file_name[..cut]);
    stem.replace('_', " ")
}
