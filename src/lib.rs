use std::{borrow::Cow, error::Error, sync::Arc};

use teloxide::{
    dispatching::dialogue::InMemStorage,
    error_handlers::IgnoringErrorHandlerSafe,
    prelude::*,
    update_listeners::webhooks::{self, Options},
};

use config::{BankSource, Config};
use database::{connection::Connection, files::FileBank, QuestionBank};
use services::{NoopCertificates, NoopStats};
use state::QuizState;
use store::SessionStore;

mod action;
mod callbacks;
mod catalog;
mod commands;
pub mod config;
mod database;
mod intake;
mod keyboard;
mod menu;
mod runner;
mod schema;
mod screens;
mod services;
mod session;
mod state;
mod store;
mod timer;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

async fn open_bank(source: BankSource) -> Result<QuestionBank, Box<dyn Error + Send + Sync>> {
    match source {
        BankSource::Files(dir) => {
            log::info!("Serving questions from {}", dir.display());
            let bank = FileBank::new(dir);
            let missing = bank.missing_pools().await;
            if !missing.is_empty() {
                let slugs: Vec<&str> = missing.iter().map(|spec| spec.slug()).collect();
                log::warn!("No question files for: {}", slugs.join(", "));
            }
            Ok(QuestionBank::Files(bank))
        }
        BankSource::Postgres(url) => {
            let connection = Connection::connect(Cow::Owned(url)).await?;
            connection.perform_migrations_if_needed().await?;
            log::info!("Serving questions from the database");
            Ok(QuestionBank::Postgres(connection))
        }
    }
}

/// Runs the bot until Ctrl+C, via webhook when one is configured and long
/// polling otherwise.
pub async fn launch(config: Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let bank = Arc::new(open_bank(config.bank).await?);
    let bot = Bot::new(config.token);
    log::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema::schema())
        .dependencies(dptree::deps![
            InMemStorage::<QuizState>::new(),
            Arc::new(SessionStore::new()),
            bank,
            Arc::new(NoopCertificates),
            Arc::new(NoopStats)
        ])
        .enable_ctrlc_handler()
        .build();

    match config.webhook {
        Some(webhook) => {
            log::info!("Listening for webhook updates on {}", webhook.addr);
            let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
            dispatcher
                .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
                .await;
        }
        None => dispatcher.dispatch().await,
    }
    Ok(())
}
