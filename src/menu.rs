use teloxide::{
    payloads::{
        AnswerCallbackQuerySetters, EditMessageTextSetters, SendDocumentSetters,
        SendMessageSetters,
    },
    prelude::Requester,
    types::{CallbackQuery, InputFile, ParseMode},
    Bot,
};
use tracing::instrument;

use crate::{
    intake::select_specialization,
    keyboard::main_menu_keyboard,
    runner::unchanged_is_ok,
    screens::{help_text, welcome_text},
    services::{IssueCertificate, RecordStats},
    state::QuizState,
    store::SessionStore,
    HandlerResult, UserDialogue,
};

/// Replaces the pressed message with `text` and the main menu, or sends a new
/// message when the pressed one is no longer accessible.
async fn show_with_main_menu(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    text: String,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;
    match &q.message {
        Some(message) => {
            unchanged_is_ok(
                bot.edit_message_text(dialogue.chat_id(), message.id(), text)
                    .parse_mode(ParseMode::Html)
                    .reply_markup(main_menu_keyboard())
                    .await,
            )?;
        }
        None => {
            bot.send_message(dialogue.chat_id(), text)
                .parse_mode(ParseMode::Html)
                .reply_markup(main_menu_keyboard())
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, q, sessions))]
pub(crate) async fn main_menu(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
) -> HandlerResult {
    if let Some(session) = sessions.remove(dialogue.chat_id()) {
        log::info!("{} leaves session {} for the main menu", q.from.id.0, session.id());
    }
    dialogue.update(QuizState::Idle).await?;
    show_with_main_menu(bot, dialogue, q, welcome_text()).await
}

#[instrument(level = "info", skip(bot, dialogue, q))]
pub(crate) async fn help(bot: &Bot, dialogue: &UserDialogue, q: &CallbackQuery) -> HandlerResult {
    show_with_main_menu(bot, dialogue, q, help_text()).await
}

/// Drops the finished attempt and walks the user through the same
/// specialization again, starting from the name prompt.
#[instrument(level = "info", skip(bot, dialogue, q, sessions))]
pub(crate) async fn repeat_test(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
) -> HandlerResult {
    let specialization = sessions.with(dialogue.chat_id(), |session| {
        session.is_finished().then(|| session.specialization())
    });

    match specialization.flatten() {
        Some(specialization) => {
            sessions.remove(dialogue.chat_id());
            dialogue.update(QuizState::Idle).await?;
            select_specialization(bot, dialogue, q, sessions, specialization).await
        }
        None => {
            bot.answer_callback_query(&q.id)
                .text("❌ Данные теста не найдены")
                .await?;
            Ok(())
        }
    }
}

#[instrument(level = "info", skip(bot, dialogue, q, sessions, certificates))]
pub(crate) async fn generate_certificate<Certificates: IssueCertificate>(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
    certificates: &Certificates,
) -> HandlerResult {
    let outcome = sessions
        .with(dialogue.chat_id(), |session| {
            session.is_finished().then(|| session.outcome())
        })
        .flatten();

    let Some(outcome) = outcome else {
        bot.answer_callback_query(&q.id)
            .text("❌ Данные теста не найдены")
            .await?;
        return Ok(());
    };

    match certificates.issue(&outcome).await {
        Ok(pdf) => {
            log::info!("{}: certificate of {} bytes issued", outcome.user_id, pdf.len());
            bot.answer_callback_query(&q.id).await?;
            bot.send_document(
                dialogue.chat_id(),
                InputFile::memory(pdf).file_name("certificate.pdf"),
            )
            .caption("🏆 Ваш сертификат")
            .await?;
        }
        Err(e) => {
            log::info!("{}: certificate not issued: {}", outcome.user_id, e);
            bot.answer_callback_query(&q.id)
                .text("📄 Генерация сертификата... (в разработке)")
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip(bot, q, stats))]
pub(crate) async fn my_stats<Stats: RecordStats>(
    bot: &Bot,
    q: &CallbackQuery,
    stats: &Stats,
) -> HandlerResult {
    let text = match stats.summary(q.from.id.0).await {
        Ok(summary) => format!(
            "📊 Попыток: {}, лучший результат: {}%",
            summary.attempts, summary.best_percent
        ),
        Err(e) => {
            log::info!("{}: statistics unavailable: {}", q.from.id.0, e);
            "📊 Статистика (в разработке)".to_owned()
        }
    };

    bot.answer_callback_query(&q.id).text(text).show_alert(true).await?;
    Ok(())
}
