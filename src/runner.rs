use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{AnswerCallbackQuerySetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, ParseMode},
    Bot,
};
use tracing::instrument;

use crate::{
    database::connection::{EditUser, ReadingLog, RetreiveBook},
    keyboard::{answers_keyboard, main_menu},
    messages,
    session::QuizSession,
    state::BotState,
    today, HandlerResult, UserDialogue,
};

fn callback_user_id(q: &CallbackQuery) -> Option<i64> {
    i64::try_from(q.from.id.0).ok()
}

async fn delete_callback_message(bot: &Bot, q: &CallbackQuery) -> HandlerResult {
    if let (Some(chat_id), Some(message)) = (q.chat_id(), &q.message) {
        if let Err(e) = bot.delete_message(chat_id, message.id()).await {
            log::warn!("Failed to delete message: {}", e);
        }
    }
    Ok(())
}

/// Sends the session's next question, or wraps the quiz up when none are left.
async fn ask_next<Db: EditUser + ReadingLog>(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    dialogue: &UserDialogue,
    mut session: QuizSession,
    connection: &Db,
) -> HandlerResult {
    let presented = session.next_question(&mut rand::thread_rng());

    match presented {
        Some(presented) => {
            log::info!(
                "{}: asking question #{} of '{}'",
                user_id,
                presented.index + 1,
                session.book_title()
            );
            bot.send_message(chat_id, messages::question(&presented))
                .parse_mode(ParseMode::Html)
                .reply_markup(answers_keyboard(&presented))
                .await?;
            dialogue.update(BotState::Quiz { session }).await?;
        }
        None => finish_quiz(bot, chat_id, user_id, dialogue, session, connection).await?,
    }

    Ok(())
}

async fn finish_quiz<Db: EditUser + ReadingLog>(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    dialogue: &UserDialogue,
    session: QuizSession,
    connection: &Db,
) -> HandlerResult {
    log::info!(
        "{} completed '{}' with {}/{}",
        user_id,
        session.book_title(),
        session.score(),
        session.total()
    );

    let today = today();
    connection.update_points(user_id, session.points()).await?;
    if session.passed() {
        connection
            .add_read_book(user_id, session.book_title(), today)
            .await?;
    }
    connection.record_activity(user_id, today).await?;

    dialogue.update(BotState::Start).await?;
    bot.send_message(chat_id, messages::quiz_result(&session))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn start_quiz<Db: RetreiveBook + EditUser + ReadingLog>(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    book_id: i64,
    connection: &Db,
) -> HandlerResult {
    let (Some(chat_id), Some(user_id)) = (q.chat_id(), callback_user_id(q)) else {
        return Ok(());
    };

    let Some(book) = connection.get_book_details(book_id).await? else {
        bot.answer_callback_query(&q.id)
            .text("Kitob topilmadi!")
            .show_alert(true)
            .await?;
        return Ok(());
    };

    let current = dialogue.get().await?.unwrap_or_default();
    if !current.is_free_for(user_id) {
        bot.answer_callback_query(&q.id)
            .text("Bu chatda boshqa foydalanuvchining testi davom etmoqda.")
            .show_alert(true)
            .await?;
        return Ok(());
    }

    log::info!("{} starts quiz '{}' by {}", user_id, book.title(), book.author());
    let session = QuizSession::start(book, user_id, &mut rand::thread_rng());
    let Some(session) = session else {
        bot.answer_callback_query(&q.id)
            .text("Bu kitob uchun savollar yo'q.")
            .show_alert(true)
            .await?;
        return Ok(());
    };

    bot.answer_callback_query(&q.id).await?;
    delete_callback_message(bot, q).await?;
    ask_next(bot, chat_id, user_id, dialogue, session, connection).await
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
pub(crate) async fn take_answer<Db: EditUser + ReadingLog>(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    (question, option): (usize, usize),
    connection: &Db,
) -> HandlerResult {
    let (Some(chat_id), Some(user_id)) = (q.chat_id(), callback_user_id(q)) else {
        return Ok(());
    };

    let Some(BotState::Quiz { mut session }) = dialogue.get().await? else {
        bot.answer_callback_query(&q.id)
            .text("Sessiya tugagan.")
            .show_alert(true)
            .await?;
        return Ok(());
    };

    if session.owner() != user_id {
        bot.answer_callback_query(&q.id)
            .text("Bu sizning testingiz emas.")
            .await?;
        return Ok(());
    }

    let Some(is_correct) = session.answer(user_id, question, option) else {
        log::info!("{} sent a stale answer for question #{}", user_id, question + 1);
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    log::info!(
        "{} answers question #{} of '{}'. Correctness: {}",
        user_id,
        question + 1,
        session.book_title(),
        is_correct
    );
    bot.answer_callback_query(&q.id)
        .text(if is_correct { "✅ To'g'ri!" } else { "❌ Xato!" })
        .await?;

    delete_callback_message(bot, q).await?;
    ask_next(bot, chat_id, user_id, dialogue, session, connection).await
}
