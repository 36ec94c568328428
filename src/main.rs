use std::error::Error;
use std::sync::Arc;

use kitobxonbot::catalogue;
use kitobxonbot::config::Config;
use kitobxonbot::database::connection::{Connection, CreateBook};
use kitobxonbot::schema::schema;
use kitobxonbot::state::BotState;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

type MainResult = Result<(), Box<dyn Error + Send + Sync + 'static>>;

#[tokio::main]
async fn main() -> MainResult {
    let config = Config::from_env()?;
    init_tracing(&config.log_level)?;

    let connection = Arc::new(Connection::connect(&config.database_url).await?);
    connection.perform_migration_if_needed().await?;

    if let Some(path) = &config.library_seed {
        log::info!("Aligning catalogue with {}", path.display());
        let books = catalogue::load_seed(path).await?;
        let count = connection.replace_catalogue(&books).await?;
        log::info!("Catalogue migration complete: {count} books");
    }

    let bot = Bot::new(&config.token);
    log::info!("Starting bot...");

    let webhook = config.webhook.clone();
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![
            InMemStorage::<BotState>::new(),
            connection,
            Arc::new(config)
        ])
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook) = webhook {
        log::info!("Listening for webhooks on {}", webhook.addr);
        let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await
    } else {
        dispatcher.dispatch().await
    }

    Ok(())
}

fn init_tracing(level: &str) -> MainResult {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level)?)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}
