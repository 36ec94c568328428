use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ParseMode},
    utils::command::BotCommands,
    Bot,
};
use tracing::instrument;

use crate::{
    config::Config,
    database::connection::{LibraryFiles, RegisterUser, RetreiveBook},
    keyboard::{main_menu, search_keyboard, MAX_SEARCH_RESULTS},
    messages, sender_id, state::BotState, today, HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot")]
    Start,
    #[command(description = "stop the current quiz or diary entry")]
    Cancel,
    #[command(description = "search books by title or author")]
    Search(String),
    #[command(rename = "clear_library", description = "remove all PDF files (admin only)")]
    ClearLibrary,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

pub(crate) async fn cancel(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Bekor qilindi.")
        .reply_markup(main_menu())
        .await?;
    dialogue.update(BotState::Start).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn start<Db: RegisterUser>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    connection: Arc<Db>,
) -> HandlerResult {
    let fullname = msg
        .from
        .as_ref()
        .map(|user| user.full_name())
        .unwrap_or_default();

    if let Some(user_id) = sender_id(&msg) {
        connection.add_user(user_id, &fullname, today()).await?;
    }

    bot.send_message(msg.chat.id, messages::welcome(&fullname))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu())
        .await?;
    dialogue.update(BotState::Start).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, connection))]
pub(crate) async fn search<Db: RetreiveBook>(
    bot: Bot,
    msg: Message,
    query: String,
    connection: Arc<Db>,
) -> HandlerResult {
    let query = query.trim();
    if query.is_empty() {
        bot.send_message(msg.chat.id, "Qidiruv uchun so'z kiriting: /search Qodiriy")
            .await?;
        return Ok(());
    }

    let books = connection.search_books(query).await?;
    log::info!("Search '{}' found {} books", query, books.len());

    if books.is_empty() {
        bot.send_message(msg.chat.id, "🔍 Hech narsa topilmadi.").await?;
    } else {
        bot.send_message(msg.chat.id, messages::search_results(books.len(), MAX_SEARCH_RESULTS))
            .parse_mode(ParseMode::Html)
            .reply_markup(search_keyboard(&books))
            .await?;
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, connection, config))]
pub(crate) async fn clear_library<Db: LibraryFiles>(
    bot: Bot,
    msg: Message,
    connection: Arc<Db>,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if !config.is_admin(user.id) {
        log::warn!("User {} tried to clear the library", user.id);
        return Ok(());
    }

    let removed = connection.clear_library().await?;
    log::info!("Admin cleared {removed} library files");
    bot.send_message(
        msg.chat.id,
        "🗑 <b>Kutubxona tozalandi!</b>\nBarcha PDF fayllar bazadan o'chirildi.",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}
