use std::fmt::Write;

use crate::database::user::{LeaderboardEntry, ReadBook, UserStats};
use crate::session::{PresentedQuestion, QuizSession, OPTION_LABELS};

pub const TESTS_PROMPT: &str = "📚 <b>Qaysi asar bo'yicha bilimingizni sinamoqchisiz?</b>";
pub const LIBRARY_PROMPT: &str =
    "📚 <b>Elektron Kutubxona:</b>\nMarhamat, o'qish uchun kitob tanlang:";

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

pub fn welcome(fullname: &str) -> String {
    format!(
        "👋 Assalomu alaykum, {}!\n\n🧠 <b>Kitobxon Pro</b> botiga xush kelibsiz.\nBu yerda siz kitoblar asosida bilimingizni sinashingiz, yangi asarlar o'qishingiz va sovg'alar yutishingiz mumkin!",
        escape(fullname)
    )
}

pub fn question(presented: &PresentedQuestion) -> String {
    let mut text = format!(
        "❓ <b>{}-savol:</b>\n\n{}\n\n",
        presented.index + 1,
        escape(&presented.text)
    );
    for (label, option) in OPTION_LABELS.iter().zip(&presented.options) {
        let _ = writeln!(text, "<b>{label})</b> {}", escape(option));
    }
    text
}

pub fn quiz_result(session: &QuizSession) -> String {
    format!(
        "🏁 <b>Test yakunlandi!</b>\n\n✅ Natija: {}/{}\n⭐️ Ballar: +{}",
        session.score(),
        session.total(),
        session.points()
    )
}

pub fn leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut text = String::from("🏆 <b>Eng faol kitobxonlar</b>\n\n");

    for (idx, entry) in entries.iter().enumerate() {
        let rank = match MEDALS.get(idx) {
            Some(medal) => (*medal).to_owned(),
            None => format!("<b>{}.</b>", idx + 1),
        };
        let _ = writeln!(text, "{rank} {}", escape(&entry.fullname));
        let _ = writeln!(
            text,
            "   └ ⭐️ {} | 📚 {} | 🔥 {}",
            entry.quiz_points, entry.books_read, entry.streak
        );

        if idx == 2 {
            text.push_str("➖➖➖➖➖➖➖➖➖➖\n");
        }
    }

    text
}

pub fn read_books(books: &[ReadBook]) -> String {
    let mut text = String::from("📚 <b>Siz o'qigan kitoblar:</b>\n\n");
    for book in books {
        let _ = writeln!(text, "✅ {} ({})", escape(&book.name), book.date.format("%Y-%m-%d"));
    }
    text
}

/// Title shown on the profile for a given amount of quiz points.
pub fn rank_title(points: i64) -> &'static str {
    match points {
        p if p >= 1000 => "Donishmand",
        p if p >= 500 => "Kitobsevar",
        p if p >= 100 => "Kitobxon",
        _ => "Yangi kitobxon",
    }
}

pub fn profile(stats: &UserStats) -> String {
    format!(
        "👤 <b>Foydalanuvchi:</b> {}\n🏅 <b>Unvon:</b> {}\n⭐️ <b>Ballar:</b> {}\n🔥 <b>Davomiylik:</b> {} kun",
        escape(&stats.fullname),
        rank_title(stats.quiz_points),
        stats.quiz_points,
        stats.streak
    )
}

pub fn admin_guide(books_count: i64) -> String {
    format!(
        "👨‍💻 <b>Admin panel:</b>\n\n1. <b>Test yuklash:</b> .json fayl yuboring.\n2. <b>PDF Kitob yuklash:</b> .pdf fayl yuboring.\n3. <b>Tozalash:</b> /clear_library\n\n📊 Bazadagi testlar: {books_count}"
    )
}

pub fn diary_saved(today_pages: i64, streak: Option<i64>) -> String {
    let mut text = format!("✅ Yozib qo'yildi!\n\n📖 Bugun jami: {today_pages} bet");
    if let Some(streak) = streak {
        let _ = write!(text, "\n🔥 Davomiylik: {streak} kun");
    }
    text
}

pub fn search_results(found: usize, shown: usize) -> String {
    if found > shown {
        format!("🔍 <b>{found} ta kitob topildi.</b> Birinchi {shown} tasi ko'rsatilmoqda, so'rovni aniqlashtiring:")
    } else {
        format!("🔍 <b>{found} ta kitob topildi:</b>")
    }
}

/// Escapes text for Telegram's HTML parse mode.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry(n: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            fullname: format!("User {n}"),
            quiz_points: 100 - n,
            streak: n,
            books_read: 2,
        }
    }

    #[test]
    fn search_header_mentions_truncation() {
        assert_eq!(search_results(3, 20), "🔍 <b>3 ta kitob topildi:</b>");
        assert!(search_results(25, 20).contains("Birinchi 20 tasi"));
    }

    #[test]
    fn leaderboard_uses_medals_then_numbers() {
        let entries: Vec<_> = (0..5).map(entry).collect();
        let text = leaderboard(&entries);
        assert!(text.contains("🥇 User 0\n   └ ⭐️ 100 | 📚 2 | 🔥 0\n"));
        assert!(text.contains("🥉 User 2\n"));
        assert!(text.contains("<b>4.</b> User 3\n"));
        assert_eq!(text.matches("➖➖➖➖➖➖➖➖➖➖").count(), 1);
        let separator = text.find('➖').unwrap();
        assert!(text.find("🥉").unwrap() < separator);
        assert!(separator < text.find("<b>4.</b>").unwrap());
    }

    #[test]
    fn short_leaderboard_has_no_separator() {
        let text = leaderboard(&[entry(1), entry(2)]);
        assert!(!text.contains('➖'));
    }

    #[test]
    fn question_lists_labelled_options() {
        let presented = PresentedQuestion {
            index: 0,
            text: "Muallif kim?".to_owned(),
            options: vec!["Cho'lpon".to_owned(), "Oybek".to_owned()],
            correct: 0,
        };
        assert_eq!(
            question(&presented),
            "❓ <b>1-savol:</b>\n\nMuallif kim?\n\n<b>A)</b> Cho'lpon\n<b>B)</b> Oybek\n"
        );
    }

    #[test]
    fn read_books_show_dates() {
        let books = vec![ReadBook {
            name: "Ufq".to_owned(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }];
        assert!(read_books(&books).ends_with("✅ Ufq (2024-05-01)\n"));
    }

    #[test]
    fn names_are_escaped() {
        assert_eq!(escape("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
        assert!(welcome("<script>").contains("&lt;script&gt;"));
    }

    #[test]
    fn rank_grows_with_points() {
        assert_eq!(rank_title(0), "Yangi kitobxon");
        assert_eq!(rank_title(100), "Kitobxon");
        assert_eq!(rank_title(750), "Kitobsevar");
        assert_eq!(rank_title(5000), "Donishmand");
    }

    #[test]
    fn diary_reply_mentions_streak_when_known() {
        assert!(diary_saved(30, Some(4)).contains("4 kun"));
        assert!(!diary_saved(30, None).contains("kun"));
    }
}
