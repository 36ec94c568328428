use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ParseMode, ReplyMarkup},
    Bot,
};
use tracing::instrument;

use crate::{
    config::Config,
    database::{
        connection::{Leaderboard, LibraryFiles, ReadingLog, RegisterUser, RetreiveBook},
        recommend::Recommend,
    },
    keyboard::{self, library_keyboard, main_menu, tests_keyboard},
    messages, sender_id,
    state::BotState,
    HandlerResult, UserDialogue,
};

/// A main menu button, recognised by its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Tests,
    AddBook,
    Diary,
    Leaderboard,
    Profile,
    Library,
    ReadBooks,
    RandomBook,
}

impl MenuAction {
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim() {
            keyboard::TESTS_BUTTON => Some(Self::Tests),
            keyboard::ADD_BOOK_BUTTON => Some(Self::AddBook),
            keyboard::DIARY_BUTTON => Some(Self::Diary),
            keyboard::LEADERBOARD_BUTTON => Some(Self::Leaderboard),
            keyboard::PROFILE_BUTTON => Some(Self::Profile),
            keyboard::LIBRARY_BUTTON => Some(Self::Library),
            keyboard::READ_BOOKS_BUTTON => Some(Self::ReadBooks),
            keyboard::RANDOM_BOOK_BUTTON => Some(Self::RandomBook),
            _ => None,
        }
    }
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
pub(crate) async fn choose_what_to_do<Db>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Db>,
    config: Arc<Config>,
) -> HandlerResult
where
    Db: RetreiveBook + LibraryFiles + Leaderboard + RegisterUser + ReadingLog + Recommend,
{
    match msg.text().and_then(MenuAction::from_text) {
        Some(action) => perform(action, bot, msg, dialogue, connection, config).await,
        None => {
            log::info!("{:?}: invalid input '{:?}'", sender_id(&msg), msg.text());
            bot.send_message(
                msg.chat.id,
                "Iltimos, menyudan tanlang. Yordam uchun /help.",
            )
            .reply_markup(main_menu())
            .await?;
            Ok(())
        }
    }
}

pub(crate) async fn perform<Db>(
    action: MenuAction,
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Db>,
    config: Arc<Config>,
) -> HandlerResult
where
    Db: RetreiveBook + LibraryFiles + Leaderboard + RegisterUser + ReadingLog + Recommend,
{
    log::info!("{:?} chooses {:?}", sender_id(&msg), action);

    match action {
        MenuAction::Tests => {
            let books = connection.get_all_books().await?;
            if books.is_empty() {
                bot.send_message(msg.chat.id, "Hozircha testlar yo'q.").await?;
            } else {
                bot.send_message(msg.chat.id, messages::TESTS_PROMPT)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(tests_keyboard(&books, 1))
                    .await?;
            }
        }
        MenuAction::AddBook => {
            let is_admin = msg.from.as_ref().is_some_and(|user| config.is_admin(user.id));
            if is_admin {
                let count = connection.get_books_count().await?;
                bot.send_message(msg.chat.id, messages::admin_guide(count))
                    .parse_mode(ParseMode::Html)
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "Bu bo'lim faqat adminlar uchun!")
                    .await?;
            }
        }
        MenuAction::Diary => {
            let Some(user_id) = sender_id(&msg) else {
                return Ok(());
            };
            if !dialogue.get().await?.unwrap_or_default().is_free_for(user_id) {
                bot.send_message(msg.chat.id, "Bu chatda boshqa foydalanuvchi band. Biroz kuting.")
                    .await?;
                return Ok(());
            }
            bot.send_message(
                msg.chat.id,
                "📅 Bugun necha bet o'qidingiz? Raqam yuboring (bekor qilish: /cancel).",
            )
            .reply_markup(ReplyMarkup::kb_remove())
            .await?;
            dialogue.update(BotState::ReceivePages { user_id }).await?;
        }
        MenuAction::Leaderboard => {
            let leaders = connection.get_leaderboard().await?;
            bot.send_message(msg.chat.id, messages::leaderboard(&leaders))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        MenuAction::Profile => {
            let stats = match sender_id(&msg) {
                Some(user_id) => connection.get_user_stats(user_id).await?,
                None => None,
            };
            match stats {
                Some(stats) => {
                    bot.send_message(msg.chat.id, messages::profile(&stats))
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
                None => {
                    bot.send_message(msg.chat.id, "Ma'lumot topilmadi. /start bosing.")
                        .await?;
                }
            }
        }
        MenuAction::Library => {
            let pdfs = connection.get_all_pdfs().await?;
            if pdfs.is_empty() {
                bot.send_message(msg.chat.id, "📭 Kutubxona hozircha bo'sh.")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, messages::LIBRARY_PROMPT)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(library_keyboard(&pdfs, 1))
                    .await?;
            }
        }
        MenuAction::ReadBooks => {
            let books = match sender_id(&msg) {
                Some(user_id) => connection.get_user_books_list(user_id).await?,
                None => Vec::new(),
            };
            if books.is_empty() {
                bot.send_message(msg.chat.id, "Siz hali hech qanday kitob o'qimadingiz.")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, messages::read_books(&books))
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        }
        MenuAction::RandomBook => {
            let Some(user_id) = sender_id(&msg) else {
                return Ok(());
            };
            let recommendation = connection.get_recommendation(user_id).await?;
            bot.send_message(msg.chat.id, recommendation.to_string())
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_menu_button_is_recognised() {
        let labels: Vec<String> = main_menu()
            .keyboard
            .into_iter()
            .flatten()
            .map(|button| button.text)
            .collect();
        assert_eq!(labels.len(), 8);
        for label in labels {
            assert!(MenuAction::from_text(&label).is_some(), "{label}");
        }
    }

    #[test]
    fn free_text_is_not_a_menu_action() {
        assert_eq!(MenuAction::from_text("salom"), None);
        assert_eq!(MenuAction::from_text(keyboard::DIARY_BUTTON), Some(MenuAction::Diary));
    }
}
