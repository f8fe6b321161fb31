use std::error::Error;

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    prelude::{DependencyMap, Requester},
    types::{CallbackQuery, Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    action::Action,
    callbacks,
    commands::{cancel, help, start, Command},
    database::QuestionBank,
    intake,
    services::{NoopCertificates, NoopStats},
    state::QuizState,
    HandlerResult,
};

pub(crate) fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Cancel].endpoint(cancel));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(intake_scheme())
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

#[instrument(level = "debug")]
fn intake_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<dyn Error + Send + Sync + 'static>>,
    DpHandlerDescription,
> {
    use dptree::case;
    log::debug!("Building dispatching tree for participant intake");
    Update::filter_message()
        .branch(
            case![QuizState::ReceiveFullName { specialization }]
                .endpoint(intake::receive_full_name),
        )
        .branch(
            case![QuizState::ReceivePosition {
                specialization,
                full_name
            }]
            .endpoint(intake::receive_position),
        )
        .branch(
            case![QuizState::ReceiveDepartment {
                specialization,
                full_name,
                position
            }]
            .endpoint(intake::receive_department),
        )
}

/// Callback tokens are decoded here, once; handlers only see `Action`s.
#[instrument(level = "debug")]
fn callback_query_scheme() -> Handler<
    'static,
    DependencyMap,
    Result<(), Box<dyn Error + Send + Sync + 'static>>,
    DpHandlerDescription,
> {
    log::debug!("Building dispatching tree for callback queries");
    Update::filter_callback_query()
        .filter_map(|q: CallbackQuery| {
            q.data.as_deref().map(str::parse::<Action>)
        })
        .endpoint(callbacks::dispatch::<QuestionBank, NoopCertificates, NoopStats>)
}

#[instrument(level = "info", skip(bot, msg))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    log::info!("{}: unexpected message {:?}", msg.chat.id.0, msg.text());
    bot.send_message(
        msg.chat.id,
        "Не удалось обработать сообщение. Используйте кнопки меню или /help.",
    )
    .await?;
    Ok(())
}
