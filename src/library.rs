use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    net::Download,
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendDocumentSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, Document, InputFile, Message, ParseMode},
    Bot,
};
use tracing::instrument;

use crate::{
    callback::Picker,
    catalogue::{pdf_title, BookImport},
    config::Config,
    database::connection::{CreateBook, LibraryFiles, RetreiveBook},
    keyboard::{library_keyboard, tests_keyboard},
    messages::{self, escape},
    HandlerResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Quiz,
    Unsupported,
}

/// Decides what an uploaded document is from its MIME type, falling back to the extension.
pub fn classify_upload(mime: Option<&str>, file_name: Option<&str>) -> UploadKind {
    match mime {
        Some("application/pdf") => UploadKind::Pdf,
        Some("application/json") => UploadKind::Quiz,
        _ => {
            let name = file_name.unwrap_or_default().to_lowercase();
            if name.ends_with(".pdf") {
                UploadKind::Pdf
            } else if name.ends_with(".json") {
                UploadKind::Quiz
            } else {
                UploadKind::Unsupported
            }
        }
    }
}

#[instrument(level = "info", skip(bot, msg, connection, config))]
pub(crate) async fn receive_document<Db: LibraryFiles + CreateBook>(
    bot: Bot,
    msg: Message,
    doc: Document,
    connection: Arc<Db>,
    config: Arc<Config>,
) -> HandlerResult {
    let is_admin = msg.from.as_ref().is_some_and(|user| config.is_admin(user.id));
    if !is_admin {
        log::info!("Ignoring document from non-admin chat {}", msg.chat.id);
        return Ok(());
    }

    let mime = doc.mime_type.as_ref().map(|mime| mime.essence_str());
    match classify_upload(mime, doc.file_name.as_deref()) {
        UploadKind::Pdf => {
            let title = pdf_title(doc.file_name.as_deref().unwrap_or("Nomsiz kitob"));
            let id = connection.add_pdf(&title, &doc.file.id).await?;
            log::info!("Stored PDF '{}' as library file {}", title, id);
            bot.send_message(
                msg.chat.id,
                format!("✅ <b>Kitob bazaga qo'shildi!</b>\n\nNomi: {}", escape(&title)),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        UploadKind::Quiz => {
            let file = bot.get_file(doc.file.id.clone()).await?;
            let mut content = Vec::new();
            bot.download_file(&file.path, &mut content).await?;

            match BookImport::from_json(&content) {
                Ok(book) => {
                    let id = connection.add_book_with_quiz(&book).await?;
                    log::info!("Imported book '{}' with {} questions as {}", book.title, book.quiz.len(), id);
                    bot.send_message(
                        msg.chat.id,
                        format!("✅ <b>\"{}\"</b> muvaffaqiyatli qo'shildi!", escape(&book.title)),
                    )
                    .parse_mode(ParseMode::Html)
                    .await?;
                }
                Err(e) => {
                    log::warn!("Rejected quiz upload: {}", e);
                    bot.send_message(
                        msg.chat.id,
                        format!("❌ JSON fayl tuzilishi noto'g'ri: {e}"),
                    )
                    .await?;
                }
            }
        }
        UploadKind::Unsupported => {
            bot.send_message(
                msg.chat.id,
                "⚠️ Iltimos, faqat PDF yoki JSON (test) fayl yuklang.",
            )
            .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, connection))]
pub(crate) async fn send_pdf<Db: LibraryFiles>(
    bot: &Bot,
    q: &CallbackQuery,
    id: i64,
    connection: &Db,
) -> HandlerResult {
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    match connection.get_pdf_by_id(id).await? {
        Some(pdf) => {
            bot.send_document(chat_id, InputFile::file_id(pdf.file_id.clone()))
                .caption(format!("📕 <b>{}</b>", escape(&pdf.title)))
                .parse_mode(ParseMode::Html)
                .await?;
            bot.answer_callback_query(&q.id).await?;
        }
        None => {
            bot.answer_callback_query(&q.id)
                .text("❌ Fayl topilmadi.")
                .show_alert(true)
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "debug", skip(bot, connection))]
pub(crate) async fn turn_page<Db: RetreiveBook + LibraryFiles>(
    bot: &Bot,
    q: &CallbackQuery,
    picker: Picker,
    page: usize,
    connection: &Db,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let (Some(chat_id), Some(message)) = (q.chat_id(), &q.message) else {
        return Ok(());
    };

    let (text, keyboard) = match picker {
        Picker::Tests => {
            let books = connection.get_all_books().await?;
            (messages::TESTS_PROMPT, tests_keyboard(&books, page))
        }
        Picker::Library => {
            let pdfs = connection.get_all_pdfs().await?;
            (messages::LIBRARY_PROMPT, library_keyboard(&pdfs, page))
        }
    };

    bot.edit_message_text(chat_id, message.id(), text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}
