use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, MessageFilterExt, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    prelude::{DependencyMap, Requester},
    types::{CallbackQuery, Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    callback::CallbackAction,
    commands::{cancel, clear_library, help, search, start, Command},
    database::connection::{Connection, EditUser, LibraryFiles, ReadingLog, RetreiveBook},
    diary, library, menu, runner,
    state::BotState,
    HandlerResult, UserDialogue,
};

pub fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start::<Connection>))
        .branch(case![Command::Cancel].endpoint(cancel))
        .branch(case![Command::Search(query)].endpoint(search::<Connection>))
        .branch(case![Command::ClearLibrary].endpoint(clear_library::<Connection>));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(
            Message::filter_document().endpoint(library::receive_document::<Connection>),
        )
        .branch(case![BotState::ReceivePages { user_id }].endpoint(diary::receive_pages::<Connection>))
        .branch(dptree::endpoint(menu::choose_what_to_do::<Connection>));

    dialogue::enter::<Update, InMemStorage<BotState>, BotState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

#[instrument(level = "debug")]
fn callback_query_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<dyn Error + Send + Sync + 'static>>,
    DpHandlerDescription,
> {
    log::debug!("Building a dispatching tree for callback query");
    Update::filter_callback_query().endpoint(route_callback::<Connection>)
}

#[instrument(level = "info", skip(bot, dialogue, connection))]
async fn route_callback<Db>(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    connection: Arc<Db>,
) -> HandlerResult
where
    Db: RetreiveBook + LibraryFiles + EditUser + ReadingLog,
{
    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        log::warn!("Unknown callback data {:?} from {}", q.data, q.from.id);
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    match action {
        CallbackAction::StartQuiz(book_id) => {
            runner::start_quiz(&bot, &dialogue, &q, book_id, &*connection).await
        }
        CallbackAction::Answer { question, option } => {
            runner::take_answer(&bot, &dialogue, &q, (question, option), &*connection).await
        }
        CallbackAction::GetPdf(id) => library::send_pdf(&bot, &q, id, &*connection).await,
        CallbackAction::Page { picker, .. } => {
            let page = action.target_page().unwrap_or(1);
            library::turn_page(&bot, &q, picker, page, &*connection).await
        }
        CallbackAction::Noop => {
            bot.answer_callback_query(&q.id).await?;
            Ok(())
        }
    }
}
