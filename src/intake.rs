use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, Message, ParseMode},
    Bot,
};
use tracing::instrument;

use crate::{
    catalog::Specialization,
    keyboard::difficulty_keyboard,
    screens::name_prompt,
    state::{Participant, QuizState},
    store::SessionStore,
    HandlerResult, UserDialogue,
};

/// Trimmed text of a message, `None` for non-text or blank messages.
fn text_field(msg: &Message) -> Option<String> {
    msg.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

#[instrument(level = "info", skip(bot, dialogue, q, sessions))]
pub(crate) async fn select_specialization(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
    specialization: Specialization,
) -> HandlerResult {
    if let Some(previous) = sessions.remove(dialogue.chat_id()) {
        log::info!(
            "{}: dropping session {} to start '{}'",
            q.from.id.0,
            previous.id(),
            specialization.slug()
        );
    }

    match &q.message {
        Some(message) => {
            bot.edit_message_text(dialogue.chat_id(), message.id(), name_prompt(specialization))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        None => {
            bot.send_message(dialogue.chat_id(), name_prompt(specialization))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    dialogue
        .update(QuizState::ReceiveFullName { specialization })
        .await?;
    bot.answer_callback_query(&q.id).await?;

    log::info!("{} selects '{}'", q.from.id.0, specialization.slug());
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg))]
pub(crate) async fn receive_full_name(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    specialization: Specialization,
) -> HandlerResult {
    match text_field(&msg) {
        Some(full_name) => {
            bot.send_message(msg.chat.id, "Введите вашу должность:").await?;
            dialogue
                .update(QuizState::ReceivePosition {
                    specialization,
                    full_name,
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Пожалуйста, введите ваше ФИО текстом.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg))]
pub(crate) async fn receive_position(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (specialization, full_name): (Specialization, String),
) -> HandlerResult {
    match text_field(&msg) {
        Some(position) => {
            bot.send_message(msg.chat.id, "Введите ваше подразделение:").await?;
            dialogue
                .update(QuizState::ReceiveDepartment {
                    specialization,
                    full_name,
                    position,
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Пожалуйста, введите вашу должность текстом.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg))]
pub(crate) async fn receive_department(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    (specialization, full_name, position): (Specialization, String, String),
) -> HandlerResult {
    match text_field(&msg) {
        Some(department) => {
            bot.send_message(msg.chat.id, "Выберите уровень сложности:")
                .reply_markup(difficulty_keyboard())
                .await?;
            dialogue
                .update(QuizState::ChooseDifficulty {
                    specialization,
                    participant: Participant {
                        full_name,
                        position,
                        department,
                    },
                })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Пожалуйста, введите подразделение текстом.")
                .await?;
        }
    }

    Ok(())
}
