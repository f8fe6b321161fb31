use std::sync::Arc;

use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, InlineKeyboardMarkup, ParseMode},
    ApiError, Bot, RequestError,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    catalog::{Difficulty, Specialization},
    database::{self, RetreiveQuestions},
    keyboard::{finish_keyboard, main_menu_keyboard},
    screens::{answers_report, question_screen, result_text},
    services::RecordStats,
    session::{Progress, SessionError, TestSession},
    state::{Participant, QuizState},
    store::SessionStore,
    timer::TestTimer,
    HandlerResult, UserDialogue,
};

const MISSING_SESSION: &str = "❌ Данные теста не найдены";

/// Telegram refuses edits that leave a message as it was, which happens on
/// repeated presses of the same button. That refusal is not a failure here.
pub(crate) fn unchanged_is_ok<T>(result: Result<T, RequestError>) -> Result<(), RequestError> {
    match result {
        Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Redraws a question screen unless the session finished meanwhile, so a
/// late redraw never puts live buttons back over the result.
async fn redraw_question(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
    session_id: Uuid,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    if !sessions.is_running(chat_id, session_id) {
        log::debug!("{}: session {} finished before redraw", chat_id.0, session_id);
        return Ok(());
    }
    if let Some(message) = &q.message {
        unchanged_is_ok(
            bot.edit_message_text(chat_id, message.id(), text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await,
        )?;
    }
    Ok(())
}

/// Loads the questions, arms the countdown and shows the first question in
/// place of the difficulty menu.
#[allow(clippy::too_many_arguments)]
#[instrument(level = "info", skip(bot, dialogue, q, sessions, bank, stats, participant))]
pub(crate) async fn start_test<Bank: RetreiveQuestions, Stats: RecordStats>(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &Arc<SessionStore>,
    bank: &Bank,
    stats: &Arc<Stats>,
    specialization: Specialization,
    participant: Participant,
    difficulty: Difficulty,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let user_id = q.from.id.0;
    let questions = database::load(bank, specialization, difficulty, user_id).await;

    if questions.is_empty() {
        log::error!(
            "{}: no questions for '{}' at {} level",
            user_id,
            specialization.slug(),
            difficulty.slug()
        );
        bot.send_message(chat_id, "❌ Не удалось загрузить вопросы. Попробуйте позже.")
            .reply_markup(main_menu_keyboard())
            .await?;
        bot.answer_callback_query(&q.id).await?;
        dialogue.update(QuizState::Idle).await?;
        return Ok(());
    }

    let mut session = TestSession::new(user_id, specialization, difficulty, participant, questions);
    let session_id = session.id();
    session.attach_timer(TestTimer::start(
        difficulty.time_limit(),
        expire_test(
            bot.clone(),
            dialogue.clone(),
            Arc::clone(sessions),
            Arc::clone(stats),
            session_id,
        ),
    ));

    let (text, keyboard) = question_screen(&session);
    let screen = match &q.message {
        Some(message) => {
            bot.edit_message_text(chat_id, message.id(), text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?
                .id
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?
                .id
        }
    };
    session.set_screen(screen);

    sessions.begin(chat_id, session);
    dialogue.update(QuizState::Answering).await?;
    bot.answer_callback_query(&q.id).await?;

    log::info!(
        "▶️ {} started '{}' at {} level, session {}",
        user_id,
        specialization.slug(),
        difficulty.slug(),
        session_id
    );
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, q, sessions))]
pub(crate) async fn toggle_answer(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
    option: usize,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let rendered = sessions.with(chat_id, |session| {
        session.toggle(option)?;
        let (text, keyboard) = question_screen(session);
        Ok::<_, SessionError>((session.id(), text, keyboard))
    });

    match rendered {
        Some(Ok((session_id, text, keyboard))) => {
            bot.answer_callback_query(&q.id).await?;
            redraw_question(bot, dialogue, q, sessions, session_id, text, keyboard).await?;
        }
        Some(Err(e)) => {
            log::info!("{}: toggle of option {} rejected: {}", q.from.id.0, option, e);
            bot.answer_callback_query(&q.id)
                .text(rejection_text(e))
                .await?;
        }
        None => {
            bot.answer_callback_query(&q.id).text(MISSING_SESSION).await?;
        }
    }

    Ok(())
}

enum Step {
    Render(Uuid, String, InlineKeyboardMarkup),
    Finish(Uuid),
}

#[instrument(level = "info", skip(bot, dialogue, q, sessions, stats))]
pub(crate) async fn next_question<Stats: RecordStats>(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
    stats: &Stats,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let step = sessions.with(chat_id, |session| {
        session.advance().map(|progress| match progress {
            Progress::Question(_) => {
                let (text, keyboard) = question_screen(session);
                Step::Render(session.id(), text, keyboard)
            }
            Progress::Exhausted => Step::Finish(session.id()),
        })
    });

    match step {
        Some(Ok(Step::Render(session_id, text, keyboard))) => {
            bot.answer_callback_query(&q.id).await?;
            redraw_question(bot, dialogue, q, sessions, session_id, text, keyboard).await?;
        }
        Some(Ok(Step::Finish(session_id))) => {
            bot.answer_callback_query(&q.id).await?;
            finish_test(bot, dialogue, sessions, stats, session_id, false).await?;
        }
        Some(Err(e)) => {
            bot.answer_callback_query(&q.id)
                .text(rejection_text(e))
                .await?;
        }
        None => {
            bot.answer_callback_query(&q.id).text(MISSING_SESSION).await?;
        }
    }

    Ok(())
}

fn rejection_text(e: SessionError) -> &'static str {
    match e {
        SessionError::Finished => "⏰ Тест уже завершён",
        SessionError::NoSuchOption(_) => "❌ Такого варианта нет",
    }
}

/// Ends the test and shows the result. Whichever of "Next" on the last
/// question and the countdown gets here first renders the result; the other
/// returns without doing anything.
pub(crate) async fn finish_test<Stats: RecordStats>(
    bot: &Bot,
    dialogue: &UserDialogue,
    sessions: &SessionStore,
    stats: &Stats,
    session_id: Uuid,
    timed_out: bool,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let Some(finished) = sessions.finish(chat_id, session_id, timed_out) else {
        log::debug!("{}: session {} already finished", chat_id.0, session_id);
        return Ok(());
    };
    dialogue.update(QuizState::Finished).await?;

    let outcome = &finished.outcome;
    log::info!(
        "🏁 {} finished '{}' with {}/{}{}",
        outcome.user_id,
        outcome.specialization.slug(),
        outcome.correct,
        outcome.total,
        if timed_out { " (timed out)" } else { "" }
    );
    if let Err(e) = stats.record(outcome).await {
        log::warn!("{}: failed to record result: {}", outcome.user_id, e);
    }

    let text = result_text(outcome);
    match finished.screen {
        Some(screen) if !timed_out => {
            bot.edit_message_text(chat_id, screen, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(finish_keyboard())
                .await?;
        }
        screen => {
            // the question screen loses its buttons, the result arrives as a
            // new message so the user gets notified
            if let Some(screen) = screen {
                bot.edit_message_text(chat_id, screen, "⏰ Время вышло! Тест завершён.")
                    .await?;
            }
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(finish_keyboard())
                .await?;
        }
    }

    Ok(())
}

async fn expire_test<Stats: RecordStats>(
    bot: Bot,
    dialogue: UserDialogue,
    sessions: Arc<SessionStore>,
    stats: Arc<Stats>,
    session_id: Uuid,
) {
    log::info!("{}: time is up for session {}", dialogue.chat_id().0, session_id);
    if let Err(e) = finish_test(&bot, &dialogue, &sessions, stats.as_ref(), session_id, true).await {
        log::error!("{}: failed to finish expired test: {}", dialogue.chat_id().0, e);
    }
}

#[instrument(level = "info", skip(bot, dialogue, q, sessions))]
pub(crate) async fn show_answers(
    bot: &Bot,
    dialogue: &UserDialogue,
    q: &CallbackQuery,
    sessions: &SessionStore,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let report = sessions
        .with(chat_id, |session| {
            session
                .is_finished()
                .then(|| answers_report(&session.graded_answers()))
        })
        .flatten();

    let Some(report) = report else {
        bot.answer_callback_query(&q.id).text(MISSING_SESSION).await?;
        return Ok(());
    };

    bot.answer_callback_query(&q.id).await?;
    if let Some(message) = &q.message {
        unchanged_is_ok(
            bot.edit_message_text(chat_id, message.id(), report)
                .parse_mode(ParseMode::Html)
                .reply_markup(finish_keyboard())
                .await,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_edit_is_ok() {
        assert!(unchanged_is_ok(Err::<(), _>(RequestError::Api(ApiError::MessageNotModified))).is_ok());
        assert!(unchanged_is_ok(Ok::<_, RequestError>(())).is_ok());
    }

    #[test]
    fn test_other_edit_failures_propagate() {
        let result = unchanged_is_ok(Err::<(), _>(RequestError::Api(ApiError::MessageToEditNotFound)));
        assert!(matches!(
            result,
            Err(RequestError::Api(ApiError::MessageToEditNotFound))
        ));
    }
}
