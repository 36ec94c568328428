use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::Message,
    Bot,
};
use tracing::instrument;

use crate::{
    config::Config,
    database::{
        connection::{EditUser, Leaderboard, LibraryFiles, ReadingLog, RegisterUser, RetreiveBook},
        recommend::Recommend,
    },
    keyboard::main_menu,
    menu::{self, MenuAction},
    messages, sender_id,
    state::BotState,
    today, HandlerResult, UserDialogue,
};

/// Upper bound on pages accepted for a single diary entry.
pub const MAX_PAGES_PER_ENTRY: i64 = 2000;

pub fn parse_pages(text: &str) -> Option<i64> {
    text.trim()
        .parse::<i64>()
        .ok()
        .filter(|pages| (1..=MAX_PAGES_PER_ENTRY).contains(pages))
}

#[instrument(level = "info", skip(bot, dialogue, connection, config))]
pub(crate) async fn receive_pages<Db>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    owner: i64,
    connection: Arc<Db>,
    config: Arc<Config>,
) -> HandlerResult
where
    Db: EditUser + RetreiveBook + LibraryFiles + Leaderboard + RegisterUser + ReadingLog + Recommend,
{
    let Some(user_id) = sender_id(&msg).filter(|&sender| sender == owner) else {
        return menu::choose_what_to_do(bot, msg, dialogue, connection, config).await;
    };
    let text = msg.text().unwrap_or_default();

    if let Some(action) = MenuAction::from_text(text) {
        dialogue.update(BotState::Start).await?;
        return menu::perform(action, bot, msg, dialogue, connection, config).await;
    }

    let Some(pages) = parse_pages(text) else {
        bot.send_message(
            msg.chat.id,
            format!("Iltimos, 1 dan {MAX_PAGES_PER_ENTRY} gacha son yuboring."),
        )
        .await?;
        return Ok(());
    };

    let today = today();
    connection.add_tracker_log(user_id, pages, today).await?;
    let streak = connection.record_activity(user_id, today).await?;
    let total = connection.get_today_pages(user_id, today).await?;
    log::info!("User {user_id} read {pages} pages, {total} today");

    bot.send_message(msg.chat.id, messages::diary_saved(total, streak))
        .reply_markup(main_menu())
        .await?;
    dialogue.update(BotState::Start).await?;
    Ok(())
}
