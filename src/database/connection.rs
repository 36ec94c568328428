use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;

use super::quiz::{Book, BookEntry, LibraryFile, QuizQuestion};
use super::user::{next_streak, LeaderboardEntry, ReadBook, UserStats};
use crate::catalogue::BookImport;

const LEADERBOARD_SIZE: i64 = 10;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("quiz data of book {book_id} is corrupt: {source}")]
    Questions {
        book_id: i64,
        source: serde_json::Error,
    },
    #[error("failed to encode quiz of '{title}': {source}")]
    Encode {
        title: String,
        source: serde_json::Error,
    },
}

pub type DbResult<T> = Result<T, DbError>;

pub struct Connection {
    pool: SqlitePool,
}

impl Connection {
    /// Opens a pool on `database_url`, creating the database file if it is missing.
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates missing tables and brings older databases up to the current columns.
    pub async fn perform_migration_if_needed(&self) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    user_id INTEGER PRIMARY KEY,
                    fullname TEXT,
                    quiz_points INTEGER DEFAULT 0,
                    streak INTEGER DEFAULT 0,
                    last_active DATE,
                    clan TEXT
                )
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
                CREATE TABLE IF NOT EXISTS books (
                    id INTEGER PRIMARY KEY,
                    title TEXT,
                    author TEXT,
                    "desc" TEXT,
                    questions TEXT,
                    category TEXT
                )
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS read_books (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER,
                    book_name TEXT,
                    date TEXT
                )
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS library_files (
                    id INTEGER PRIMARY KEY,
                    title TEXT,
                    file_id TEXT
                )
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS tracker (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER,
                    pages INTEGER,
                    date DATE
                )
            ",
        )
        .execute(&mut *tx)
        .await?;

        let has_category: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('books') WHERE name = 'category'",
        )
        .fetch_one(&mut *tx)
        .await?;
        if has_category == 0 {
            log::info!("Adding missing books.category column");
            sqlx::query("ALTER TABLE books ADD COLUMN category TEXT")
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

pub trait RegisterUser {
    async fn add_user(&self, user_id: i64, fullname: &str, today: NaiveDate) -> DbResult<()>;

    async fn get_user_stats(&self, user_id: i64) -> DbResult<Option<UserStats>>;

    async fn get_all_users(&self) -> DbResult<Vec<i64>>;
}

pub trait EditUser {
    async fn update_points(&self, user_id: i64, points: i64) -> DbResult<()>;

    /// Marks the user active on `today` and returns the new streak, or `None` for unknown users.
    async fn record_activity(&self, user_id: i64, today: NaiveDate) -> DbResult<Option<i64>>;
}

pub trait RetreiveBook {
    async fn get_all_books(&self) -> DbResult<Vec<BookEntry>>;

    async fn get_book_details(&self, book_id: i64) -> DbResult<Option<Book>>;

    async fn get_books_count(&self) -> DbResult<i64>;

    async fn search_books(&self, query: &str) -> DbResult<Vec<BookEntry>>;
}

pub trait CreateBook {
    async fn add_book_with_quiz(&self, book: &BookImport) -> DbResult<i64>;

    /// Drops the whole catalogue and inserts `books` in its place.
    async fn replace_catalogue(&self, books: &[BookImport]) -> DbResult<usize>;
}

pub trait LibraryFiles {
    async fn add_pdf(&self, title: &str, file_id: &str) -> DbResult<i64>;

    async fn get_all_pdfs(&self) -> DbResult<Vec<LibraryFile>>;

    async fn get_pdf_by_id(&self, id: i64) -> DbResult<Option<LibraryFile>>;

    async fn clear_library(&self) -> DbResult<u64>;
}

pub trait ReadingLog {
    async fn add_read_book(&self, user_id: i64, book_name: &str, today: NaiveDate)
        -> DbResult<()>;

    async fn get_user_books_list(&self, user_id: i64) -> DbResult<Vec<ReadBook>>;

    async fn add_tracker_log(&self, user_id: i64, pages: i64, today: NaiveDate) -> DbResult<()>;

    async fn get_today_pages(&self, user_id: i64, today: NaiveDate) -> DbResult<i64>;
}

pub trait Leaderboard {
    async fn get_leaderboard(&self) -> DbResult<Vec<LeaderboardEntry>>;
}

fn map_book_entry(row: &SqliteRow) -> DbResult<BookEntry> {
    Ok(BookEntry {
        id: row.try_get("id")?,
        title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        author: row.try_get::<Option<String>, _>("author")?.unwrap_or_default(),
    })
}

fn map_library_file(row: &SqliteRow) -> DbResult<LibraryFile> {
    Ok(LibraryFile {
        id: row.try_get("id")?,
        title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        file_id: row.try_get::<Option<String>, _>("file_id")?.unwrap_or_default(),
    })
}

fn encode_questions(book: &BookImport) -> DbResult<String> {
    serde_json::to_string(&book.quiz).map_err(|source| DbError::Encode {
        title: book.title.clone(),
        source,
    })
}

impl RegisterUser for Connection {
    async fn add_user(&self, user_id: i64, fullname: &str, today: NaiveDate) -> DbResult<()> {
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO users (user_id, fullname, quiz_points, streak, last_active) VALUES (?1, ?2, 0, 0, ?3)",
        )
        .bind(user_id)
        .bind(fullname)
        .bind(today)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            log::info!("Registered new user {user_id}");
        }
        Ok(())
    }

    async fn get_user_stats(&self, user_id: i64) -> DbResult<Option<UserStats>> {
        let row = sqlx::query(
            "SELECT user_id, fullname, quiz_points, streak, last_active FROM users WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> DbResult<UserStats> {
            Ok(UserStats {
                user_id: row.try_get("user_id")?,
                fullname: row.try_get::<Option<String>, _>("fullname")?.unwrap_or_default(),
                quiz_points: row.try_get::<Option<i64>, _>("quiz_points")?.unwrap_or(0),
                streak: row.try_get::<Option<i64>, _>("streak")?.unwrap_or(0),
                last_active: row.try_get("last_active")?,
            })
        })
        .transpose()
    }

    async fn get_all_users(&self) -> DbResult<Vec<i64>> {
        let ids = sqlx::query_scalar("SELECT user_id FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

impl EditUser for Connection {
    async fn update_points(&self, user_id: i64, points: i64) -> DbResult<()> {
        sqlx::query("UPDATE users SET quiz_points = COALESCE(quiz_points, 0) + ?1 WHERE user_id = ?2")
            .bind(points)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_activity(&self, user_id: i64, today: NaiveDate) -> DbResult<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query("SELECT streak, last_active FROM users WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let streak = row.try_get::<Option<i64>, _>("streak")?.unwrap_or(0);
        let last_active: Option<NaiveDate> = row.try_get("last_active")?;
        let streak = next_streak(last_active, streak, today);

        sqlx::query("UPDATE users SET streak = ?1, last_active = ?2 WHERE user_id = ?3")
            .bind(streak)
            .bind(today)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(streak))
    }
}

impl RetreiveBook for Connection {
    async fn get_all_books(&self) -> DbResult<Vec<BookEntry>> {
        let rows = sqlx::query("SELECT id, title, author FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_book_entry).collect()
    }

    async fn get_book_details(&self, book_id: i64) -> DbResult<Option<Book>> {
        let row = sqlx::query(
            r#"SELECT id, title, author, "desc", questions, category FROM books WHERE id = ?1"#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw = row.try_get::<Option<String>, _>("questions")?;
        let questions: Vec<QuizQuestion> = match raw.as_deref() {
            None | Some("") => Vec::new(),
            Some(json) => serde_json::from_str(json)
                .map_err(|source| DbError::Questions { book_id, source })?,
        };

        Ok(Some(Book::retreive(
            row.try_get("id")?,
            row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
            row.try_get::<Option<String>, _>("author")?.unwrap_or_default(),
            row.try_get::<Option<String>, _>("desc")?.unwrap_or_default(),
            row.try_get::<Option<String>, _>("category")?.unwrap_or_default(),
            questions,
        )))
    }

    async fn get_books_count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn search_books(&self, query: &str) -> DbResult<Vec<BookEntry>> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query(
            "SELECT id, title, author FROM books WHERE title LIKE ?1 OR author LIKE ?1 ORDER BY id",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_book_entry).collect()
    }
}

impl CreateBook for Connection {
    async fn add_book_with_quiz(&self, book: &BookImport) -> DbResult<i64> {
        let questions = encode_questions(book)?;
        let res = sqlx::query(
            r#"INSERT INTO books (title, author, "desc", questions, category) VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.desc)
        .bind(questions)
        .bind(&book.category)
        .execute(&self.pool)
        .await?;

        Ok(res.last_insert_rowid())
    }

    async fn replace_catalogue(&self, books: &[BookImport]) -> DbResult<usize> {
        log::debug!("Creating transaction");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM books").execute(&mut *tx).await?;

        for book in books {
            log::debug!("Adding book '{}'", book.title);
            let questions = encode_questions(book)?;
            sqlx::query(
                r#"INSERT INTO books (title, author, "desc", questions, category) VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.desc)
            .bind(questions)
            .bind(&book.category)
            .execute(&mut *tx)
            .await?;
        }

        log::debug!("Closing transaction");
        tx.commit().await?;

        Ok(books.len())
    }
}

impl LibraryFiles for Connection {
    async fn add_pdf(&self, title: &str, file_id: &str) -> DbResult<i64> {
        let res = sqlx::query("INSERT INTO library_files (title, file_id) VALUES (?1, ?2)")
            .bind(title)
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    async fn get_all_pdfs(&self) -> DbResult<Vec<LibraryFile>> {
        let rows = sqlx::query("SELECT id, title, file_id FROM library_files ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_library_file).collect()
    }

    async fn get_pdf_by_id(&self, id: i64) -> DbResult<Option<LibraryFile>> {
        let row = sqlx::query("SELECT id, title, file_id FROM library_files WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_library_file).transpose()
    }

    async fn clear_library(&self) -> DbResult<u64> {
        let res = sqlx::query("DELETE FROM library_files")
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

impl ReadingLog for Connection {
    async fn add_read_book(
        &self,
        user_id: i64,
        book_name: &str,
        today: NaiveDate,
    ) -> DbResult<()> {
        sqlx::query("INSERT INTO read_books (user_id, book_name, date) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(book_name)
            .bind(today)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_user_books_list(&self, user_id: i64) -> DbResult<Vec<ReadBook>> {
        let rows = sqlx::query(
            "SELECT book_name, date FROM read_books WHERE user_id = ?1 ORDER BY date DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DbResult<ReadBook> {
                Ok(ReadBook {
                    name: row.try_get::<Option<String>, _>("book_name")?.unwrap_or_default(),
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }

    async fn add_tracker_log(&self, user_id: i64, pages: i64, today: NaiveDate) -> DbResult<()> {
        sqlx::query("INSERT INTO tracker (user_id, pages, date) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(pages)
            .bind(today)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_today_pages(&self, user_id: i64, today: NaiveDate) -> DbResult<i64> {
        let pages: Option<i64> =
            sqlx::query_scalar("SELECT SUM(pages) FROM tracker WHERE user_id = ?1 AND date = ?2")
                .bind(user_id)
                .bind(today)
                .fetch_one(&self.pool)
                .await?;
        Ok(pages.unwrap_or(0))
    }
}

impl Leaderboard for Connection {
    async fn get_leaderboard(&self) -> DbResult<Vec<LeaderboardEntry>> {
        let rows = sqlx::query(
            r"
                SELECT
                    fullname, quiz_points, streak,
                    (SELECT COUNT(*) FROM read_books WHERE read_books.user_id = users.user_id) AS book_count
                FROM users
                ORDER BY quiz_points DESC, user_id ASC
                LIMIT ?1
            ",
        )
        .bind(LEADERBOARD_SIZE)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DbResult<LeaderboardEntry> {
                Ok(LeaderboardEntry {
                    fullname: row.try_get::<Option<String>, _>("fullname")?.unwrap_or_default(),
                    quiz_points: row.try_get::<Option<i64>, _>("quiz_points")?.unwrap_or(0),
                    streak: row.try_get::<Option<i64>, _>("streak")?.unwrap_or(0),
                    books_read: row.try_get("book_count")?,
                })
            })
            .collect()
    }
}
