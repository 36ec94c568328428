use chrono::NaiveDate;
use state::BotState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue, types::Message};

pub mod callback;
pub mod catalogue;
pub mod commands;
pub mod config;
pub mod database;
pub mod diary;
pub mod keyboard;
pub mod library;
pub mod menu;
pub mod messages;
pub mod runner;
pub mod schema;
pub mod session;
pub mod state;

type UserDialogue = Dialogue<BotState, InMemStorage<BotState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Telegram id of the message author as stored in the `users` table.
pub(crate) fn sender_id(msg: &Message) -> Option<i64> {
    msg.from
        .as_ref()
        .and_then(|user| i64::try_from(user.id.0).ok())
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
