use std::fmt;

use sqlx::{QueryBuilder, Row, Sqlite};

use super::connection::{Connection, DbResult};
use super::quiz::BookSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// Unread book from the category the user reads most.
    Personal(BookSummary),
    Random(BookSummary),
    /// Nothing left that the user has not read.
    Exhausted,
}

pub trait Recommend {
    async fn get_recommendation(&self, user_id: i64) -> DbResult<Recommendation>;
}

impl Recommend for Connection {
    async fn get_recommendation(&self, user_id: i64) -> DbResult<Recommendation> {
        let read: Vec<String> =
            sqlx::query_scalar("SELECT book_name FROM read_books WHERE user_id = ?1 AND book_name IS NOT NULL")
                .bind(user_id)
                .fetch_all(self.pool())
                .await?;

        if let Some(category) = self.favourite_category(&read).await? {
            log::debug!("User {user_id} mostly reads '{category}'");
            if let Some(book) = self.random_unread(Some(&category), &read).await? {
                return Ok(Recommendation::Personal(book));
            }
        }

        Ok(match self.random_unread(None, &read).await? {
            Some(book) => Recommendation::Random(book),
            None => Recommendation::Exhausted,
        })
    }
}

impl Connection {
    async fn favourite_category(&self, read: &[String]) -> DbResult<Option<String>> {
        if read.is_empty() {
            return Ok(None);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT category, COUNT(*) AS cnt FROM books WHERE category IS NOT NULL AND title IN (",
        );
        let mut titles = query.separated(", ");
        for title in read {
            titles.push_bind(title.clone());
        }
        titles.push_unseparated(") GROUP BY category ORDER BY cnt DESC, category ASC LIMIT 1");

        let row = query.build().fetch_optional(self.pool()).await?;
        Ok(row.map(|row| row.try_get("category")).transpose()?)
    }

    async fn random_unread(
        &self,
        category: Option<&str>,
        read: &[String],
    ) -> DbResult<Option<BookSummary>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(r#"SELECT title, author, "desc" FROM books WHERE 1 = 1"#);
        if let Some(category) = category {
            query.push(" AND category = ").push_bind(category.to_owned());
        }
        if !read.is_empty() {
            query.push(" AND title NOT IN (");
            let mut titles = query.separated(", ");
            for title in read {
                titles.push_bind(title.clone());
            }
            titles.push_unseparated(")");
        }
        query.push(" ORDER BY RANDOM() LIMIT 1");

        let Some(row) = query.build().fetch_optional(self.pool()).await? else {
            return Ok(None);
        };

        Ok(Some(BookSummary {
            title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
            author: row.try_get::<Option<String>, _>("author")?.unwrap_or_default(),
            description: row.try_get::<Option<String>, _>("desc")?.unwrap_or_default(),
        }))
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Personal(book) => write!(f, "🎯 <b>Siz uchun maxsus:</b>\n\n{book}"),
            Recommendation::Random(book) => write!(f, "🎲 <b>Tasodifiy tavsiya:</b>\n\n{book}"),
            Recommendation::Exhausted => {
                write!(f, "📭 Hozircha barcha kitoblarni o'qib bo'ldingiz!")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> BookSummary {
        BookSummary {
            title: "O'tkan kunlar".to_owned(),
            author: "Abdulla Qodiriy".to_owned(),
            description: "Roman".to_owned(),
        }
    }

    #[test]
    fn personal_recommendation_is_labelled() {
        let text = Recommendation::Personal(summary()).to_string();
        assert!(text.starts_with("🎯"));
        assert!(text.contains("📘 O'tkan kunlar\n✍️ Abdulla Qodiriy\n\nRoman"));
    }

    #[test]
    fn random_recommendation_is_labelled() {
        assert!(Recommendation::Random(summary()).to_string().starts_with("🎲"));
    }

    #[test]
    fn exhausted_has_no_book() {
        assert!(!Recommendation::Exhausted.to_string().contains("📘"));
    }
}
