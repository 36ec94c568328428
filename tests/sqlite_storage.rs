use chrono::NaiveDate;
use kitobxonbot::catalogue::BookImport;
use kitobxonbot::database::connection::{
    Connection, CreateBook, DbError, EditUser, Leaderboard, LibraryFiles, ReadingLog,
    RegisterUser, RetreiveBook,
};
use kitobxonbot::database::quiz::QuizQuestion;

async fn connect(name: &str) -> Connection {
    let conn = Connection::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    conn.perform_migration_if_needed().await.expect("migrate");
    conn
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn book(title: &str, author: &str, category: &str) -> BookImport {
    BookImport {
        title: title.to_owned(),
        author: author.to_owned(),
        desc: format!("{title} haqida"),
        quiz: vec![QuizQuestion::new(
            format!("{title}?"),
            vec!["ha".to_owned(), "yo'q".to_owned()],
            "ha",
        )],
        category: category.to_owned(),
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let conn = connect("memdb_migrate_twice").await;
    conn.perform_migration_if_needed().await.expect("second migrate");
    assert_eq!(conn.get_books_count().await.unwrap(), 0);
}

#[tokio::test]
async fn legacy_books_table_gains_category() {
    let conn = Connection::connect("sqlite:file:memdb_legacy?mode=memory&cache=shared")
        .await
        .expect("connect");
    sqlx::query(
        r#"CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT, author TEXT, "desc" TEXT, questions TEXT)"#,
    )
    .execute(conn.pool())
    .await
    .unwrap();

    conn.perform_migration_if_needed().await.expect("migrate");

    let id = conn
        .add_book_with_quiz(&book("Navoiy", "Oybek", "Tarixiy"))
        .await
        .unwrap();
    let stored = conn.get_book_details(id).await.unwrap().unwrap();
    assert_eq!(stored.category(), "Tarixiy");
}

#[tokio::test]
async fn users_register_once_and_collect_points() {
    let conn = connect("memdb_users").await;

    conn.add_user(1, "Ali Valiyev", day(1)).await.unwrap();
    conn.add_user(1, "Renamed", day(2)).await.unwrap();

    let stats = conn.get_user_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.fullname, "Ali Valiyev");
    assert_eq!(stats.quiz_points, 0);
    assert_eq!(stats.streak, 0);
    assert_eq!(stats.last_active, Some(day(1)));

    conn.update_points(1, 30).await.unwrap();
    conn.update_points(1, 20).await.unwrap();
    assert_eq!(conn.get_user_stats(1).await.unwrap().unwrap().quiz_points, 50);

    assert!(conn.get_user_stats(2).await.unwrap().is_none());
    assert_eq!(conn.get_all_users().await.unwrap(), vec![1]);
}

#[tokio::test]
async fn streak_follows_consecutive_days() {
    let conn = connect("memdb_streak").await;
    conn.add_user(7, "Laylo", day(1)).await.unwrap();

    assert_eq!(conn.record_activity(7, day(1)).await.unwrap(), Some(1));
    assert_eq!(conn.record_activity(7, day(2)).await.unwrap(), Some(2));
    assert_eq!(conn.record_activity(7, day(2)).await.unwrap(), Some(2));
    assert_eq!(conn.record_activity(7, day(3)).await.unwrap(), Some(3));
    assert_eq!(conn.record_activity(7, day(6)).await.unwrap(), Some(1));

    let stats = conn.get_user_stats(7).await.unwrap().unwrap();
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.last_active, Some(day(6)));

    assert_eq!(conn.record_activity(99, day(6)).await.unwrap(), None);
}

#[tokio::test]
async fn books_are_listed_searched_and_loaded() {
    let conn = connect("memdb_books").await;

    let first = conn
        .add_book_with_quiz(&book("O'tkan kunlar", "Abdulla Qodiriy", "Badiiy"))
        .await
        .unwrap();
    conn.add_book_with_quiz(&book("Mehrobdan chayon", "Abdulla Qodiriy", "Badiiy"))
        .await
        .unwrap();
    conn.add_book_with_quiz(&book("Kecha va kunduz", "Cho'lpon", "Badiiy"))
        .await
        .unwrap();

    let all = conn.get_all_books().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, first);
    assert_eq!(all[0].author, "Abdulla Qodiriy");
    assert_eq!(conn.get_books_count().await.unwrap(), 3);

    assert_eq!(conn.search_books("qodiriy").await.unwrap().len(), 2);
    assert_eq!(conn.search_books("kunduz").await.unwrap()[0].title, "Kecha va kunduz");
    assert!(conn.search_books("Navoiy").await.unwrap().is_empty());

    let details = conn.get_book_details(first).await.unwrap().unwrap();
    assert_eq!(details.title(), "O'tkan kunlar");
    assert_eq!(details.description(), "O'tkan kunlar haqida");
    assert_eq!(details.questions().len(), 1);
    assert_eq!(details.questions()[0].ans, "ha");

    assert!(conn.get_book_details(12345).await.unwrap().is_none());
}

#[tokio::test]
async fn catalogue_is_replaced_wholesale() {
    let conn = connect("memdb_catalogue").await;
    conn.add_book_with_quiz(&book("Eski", "Muallif", "Badiiy"))
        .await
        .unwrap();

    let seed = vec![book("Yangi 1", "A", "Badiiy"), book("Yangi 2", "B", "Ilmiy")];
    assert_eq!(conn.replace_catalogue(&seed).await.unwrap(), 2);

    let titles: Vec<String> = conn
        .get_all_books()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["Yangi 1", "Yangi 2"]);
}

#[tokio::test]
async fn corrupt_quiz_json_is_reported() {
    let conn = connect("memdb_corrupt").await;
    let id = sqlx::query("INSERT INTO books (title, author, questions) VALUES ('X', 'Y', 'not json')")
        .execute(conn.pool())
        .await
        .unwrap()
        .last_insert_rowid();

    let err = conn.get_book_details(id).await.unwrap_err();
    assert!(matches!(err, DbError::Questions { book_id, .. } if book_id == id));
}

#[tokio::test]
async fn library_files_store_references() {
    let conn = connect("memdb_library").await;

    let id = conn.add_pdf("Otkan kunlar", "BQACAgIAAxkBAAIB").await.unwrap();
    conn.add_pdf("Ufq", "BQACAgIAAxkBAAIC").await.unwrap();

    let pdfs = conn.get_all_pdfs().await.unwrap();
    assert_eq!(pdfs.len(), 2);

    let pdf = conn.get_pdf_by_id(id).await.unwrap().unwrap();
    assert_eq!(pdf.title, "Otkan kunlar");
    assert_eq!(pdf.file_id, "BQACAgIAAxkBAAIB");

    assert_eq!(conn.clear_library().await.unwrap(), 2);
    assert!(conn.get_all_pdfs().await.unwrap().is_empty());
    assert!(conn.get_pdf_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn reading_history_and_tracker() {
    let conn = connect("memdb_reading").await;

    conn.add_read_book(3, "Birinchi", day(1)).await.unwrap();
    conn.add_read_book(3, "Ikkinchi", day(4)).await.unwrap();
    conn.add_read_book(4, "Boshqa", day(4)).await.unwrap();

    let books = conn.get_user_books_list(3).await.unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].name, "Ikkinchi");
    assert_eq!(books[0].date, day(4));

    assert_eq!(conn.get_today_pages(3, day(4)).await.unwrap(), 0);
    conn.add_tracker_log(3, 20, day(4)).await.unwrap();
    conn.add_tracker_log(3, 15, day(4)).await.unwrap();
    conn.add_tracker_log(3, 50, day(3)).await.unwrap();
    conn.add_tracker_log(4, 99, day(4)).await.unwrap();
    assert_eq!(conn.get_today_pages(3, day(4)).await.unwrap(), 35);
}

#[tokio::test]
async fn leaderboard_ranks_by_points() {
    let conn = connect("memdb_leaderboard").await;

    for id in 1..=12 {
        conn.add_user(id, &format!("User {id}"), day(1)).await.unwrap();
        conn.update_points(id, id * 10).await.unwrap();
    }
    conn.add_read_book(12, "A", day(1)).await.unwrap();
    conn.add_read_book(12, "B", day(2)).await.unwrap();

    let leaders = conn.get_leaderboard().await.unwrap();
    assert_eq!(leaders.len(), 10);
    assert_eq!(leaders[0].fullname, "User 12");
    assert_eq!(leaders[0].quiz_points, 120);
    assert_eq!(leaders[0].books_read, 2);
    assert_eq!(leaders[1].books_read, 0);
    assert_eq!(leaders[9].fullname, "User 3");
}
