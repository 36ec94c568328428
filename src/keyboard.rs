use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::callback::{CallbackAction, Direction, Picker};
use crate::database::quiz::{BookEntry, LibraryFile};
use crate::session::{PresentedQuestion, OPTION_LABELS};

pub const TESTS_BUTTON: &str = "🏛 Ziyo Maskani (Test)";
pub const ADD_BOOK_BUTTON: &str = "✍️ Kitob Qo'shish";
pub const DIARY_BUTTON: &str = "📅 Kundalik";
pub const LEADERBOARD_BUTTON: &str = "🏆 Peshiqadamlar";
pub const PROFILE_BUTTON: &str = "👤 Mening Profilim";
pub const LIBRARY_BUTTON: &str = "📥 Elektron Kutubxona";
pub const READ_BOOKS_BUTTON: &str = "📚 O'qilgan Kitoblar";
pub const RANDOM_BOOK_BUTTON: &str = "🎲 Tasodifiy Kitob";

pub const ITEMS_PER_PAGE: usize = 10;
/// Search hits shown at once; results are a one-off list without navigation.
pub const MAX_SEARCH_RESULTS: usize = 20;
const MAX_TITLE_CHARS: usize = 34;

pub(crate) fn main_menu() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(TESTS_BUTTON), KeyboardButton::new(ADD_BOOK_BUTTON)],
        vec![KeyboardButton::new(DIARY_BUTTON), KeyboardButton::new(LEADERBOARD_BUTTON)],
        vec![KeyboardButton::new(PROFILE_BUTTON), KeyboardButton::new(LIBRARY_BUTTON)],
        vec![KeyboardButton::new(READ_BOOKS_BUTTON), KeyboardButton::new(RANDOM_BOOK_BUTTON)],
    ];

    KeyboardMarkup::new(keyboard).resize_keyboard()
}

pub(crate) fn total_pages(items: usize) -> usize {
    items.div_ceil(ITEMS_PER_PAGE)
}

fn display_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        title.to_owned()
    } else {
        let head: String = title.chars().take(MAX_TITLE_CHARS - 1).collect();
        format!("{head}...")
    }
}

fn pagination_row(picker: Picker, page: usize, total: usize) -> Vec<InlineKeyboardButton> {
    let mut row = Vec::with_capacity(3);

    if page > 1 {
        let prev = CallbackAction::Page {
            picker,
            direction: Direction::Prev,
            from: page,
        };
        row.push(InlineKeyboardButton::callback("⬅️", prev.to_string()));
    }

    row.push(InlineKeyboardButton::callback(
        format!("📄 {page}/{total}"),
        CallbackAction::Noop.to_string(),
    ));

    if page < total {
        let next = CallbackAction::Page {
            picker,
            direction: Direction::Next,
            from: page,
        };
        row.push(InlineKeyboardButton::callback("➡️", next.to_string()));
    }

    row
}

fn paged<T>(
    items: &[T],
    page: usize,
    picker: Picker,
    button: impl Fn(&T) -> InlineKeyboardButton,
) -> InlineKeyboardMarkup {
    let total = total_pages(items.len());
    let page = page.clamp(1, total.max(1));

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = items
        .iter()
        .skip((page - 1) * ITEMS_PER_PAGE)
        .take(ITEMS_PER_PAGE)
        .map(|item| vec![button(item)])
        .collect();

    if total > 1 {
        keyboard.push(pagination_row(picker, page, total));
    }

    InlineKeyboardMarkup::new(keyboard)
}

fn book_button(book: &BookEntry) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(
        format!("📘 {}", display_title(&book.title)),
        CallbackAction::StartQuiz(book.id).to_string(),
    )
}

pub(crate) fn tests_keyboard(books: &[BookEntry], page: usize) -> InlineKeyboardMarkup {
    paged(books, page, Picker::Tests, book_button)
}

pub(crate) fn search_keyboard(books: &[BookEntry]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        books
            .iter()
            .take(MAX_SEARCH_RESULTS)
            .map(|book| vec![book_button(book)]),
    )
}

pub(crate) fn library_keyboard(pdfs: &[LibraryFile], page: usize) -> InlineKeyboardMarkup {
    paged(pdfs, page, Picker::Library, |pdf| {
        InlineKeyboardButton::callback(
            format!("📥 {}", display_title(&pdf.title)),
            CallbackAction::GetPdf(pdf.id).to_string(),
        )
    })
}

pub(crate) fn answers_keyboard(question: &PresentedQuestion) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = OPTION_LABELS
        .iter()
        .zip(0..question.options.len())
        .map(|(label, option)| {
            let action = CallbackAction::Answer {
                question: question.index,
                option,
            };
            InlineKeyboardButton::callback(format!("[ {label} ]"), action.to_string())
        })
        .collect();

    InlineKeyboardMarkup::new(vec![row])
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;

    fn callback_data(keyboard: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        keyboard
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|btn| match &btn.kind {
                        InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    fn books(n: i64) -> Vec<BookEntry> {
        (1..=n)
            .map(|id| BookEntry {
                id,
                title: format!("Kitob {id}"),
                author: "Muallif".to_owned(),
            })
            .collect()
    }

    #[test]
    fn main_menu_has_eight_buttons_two_per_row() {
        let menu = main_menu();
        assert_eq!(menu.keyboard.len(), 4);
        assert!(menu.keyboard.iter().all(|row| row.len() == 2));
        assert_eq!(menu.keyboard[0][0].text, TESTS_BUTTON);
    }

    #[test]
    fn single_page_has_no_navigation() {
        let kb = tests_keyboard(&books(3), 1);
        assert_eq!(callback_data(&kb), vec![vec!["startquiz_1"], vec!["startquiz_2"], vec!["startquiz_3"]]);
    }

    #[test]
    fn first_page_has_only_next() {
        let kb = tests_keyboard(&books(25), 1);
        let data = callback_data(&kb);
        assert_eq!(data.len(), ITEMS_PER_PAGE + 1);
        assert_eq!(data[0], vec!["startquiz_1"]);
        assert_eq!(data[ITEMS_PER_PAGE], vec!["noop", "test_next_1"]);
        assert_eq!(kb.inline_keyboard[ITEMS_PER_PAGE][0].text, "📄 1/3");
    }

    #[test]
    fn middle_and_last_pages() {
        let data = callback_data(&tests_keyboard(&books(25), 2));
        assert_eq!(data[0], vec!["startquiz_11"]);
        assert_eq!(data.last().unwrap(), &vec!["test_prev_2", "noop", "test_next_2"]);

        let data = callback_data(&tests_keyboard(&books(25), 3));
        assert_eq!(data.len(), 5 + 1);
        assert_eq!(data.last().unwrap(), &vec!["test_prev_3", "noop"]);
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let data = callback_data(&tests_keyboard(&books(25), 9));
        assert_eq!(data[0], vec!["startquiz_21"]);
    }

    #[test]
    fn long_titles_are_truncated() {
        let pdfs = vec![
            LibraryFile {
                id: 1,
                title: "a".repeat(34),
                file_id: "f1".to_owned(),
            },
            LibraryFile {
                id: 2,
                title: "b".repeat(35),
                file_id: "f2".to_owned(),
            },
        ];
        let kb = library_keyboard(&pdfs, 1);
        assert_eq!(kb.inline_keyboard[0][0].text, format!("📥 {}", "a".repeat(34)));
        assert_eq!(kb.inline_keyboard[1][0].text, format!("📥 {}...", "b".repeat(33)));
        assert_eq!(callback_data(&kb)[1], vec!["getpdf_2"]);
    }

    #[test]
    fn answer_buttons_carry_question_index() {
        let question = PresentedQuestion {
            index: 3,
            text: "?".to_owned(),
            options: vec!["x".to_owned(), "y".to_owned(), "z".to_owned()],
            correct: 1,
        };
        let kb = answers_keyboard(&question);
        assert_eq!(callback_data(&kb), vec![vec!["ans_3_0", "ans_3_1", "ans_3_2"]]);
        assert_eq!(kb.inline_keyboard[0][2].text, "[ C ]");
    }

    #[test]
    fn search_results_have_no_catalogue_navigation() {
        let data = callback_data(&search_keyboard(&books(25)));
        assert_eq!(data.len(), MAX_SEARCH_RESULTS);
        assert_eq!(data[0], vec!["startquiz_1"]);
        assert!(data.iter().flatten().all(|d| d.starts_with("startquiz_")));
    }

    #[test]
    fn page_count() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
    }
}
