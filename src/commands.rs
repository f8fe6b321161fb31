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
    keyboard::main_menu_keyboard,
    screens::{help_text, welcome_text},
    state::QuizState,
    store::SessionStore,
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "показать помощь.")]
    Help,
    #[command(description = "прервать текущий тест.")]
    Cancel,
    #[command(description = "главное меню.")]
    Start,
}

#[instrument(level = "info", skip(bot, msg))]
pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        format!("{}\n\n{}", help_text(), Command::descriptions()),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg, sessions))]
pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    sessions: Arc<SessionStore>,
) -> HandlerResult {
    let text = match sessions.remove(msg.chat.id) {
        Some(session) => {
            log::info!("{}: session {} cancelled", msg.chat.id.0, session.id());
            "Тест прерван."
        }
        None => "Отменено.",
    };
    bot.send_message(msg.chat.id, text)
        .reply_markup(main_menu_keyboard())
        .await?;
    dialogue.update(QuizState::Idle).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg, sessions))]
pub(crate) async fn start(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    sessions: Arc<SessionStore>,
) -> HandlerResult {
    sessions.remove(msg.chat.id);
    bot.send_message(msg.chat.id, welcome_text())
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard())
        .await?;
    dialogue.update(QuizState::Idle).await?;
    Ok(())
}
