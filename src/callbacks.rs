use std::sync::Arc;

use teloxide::{
    payloads::AnswerCallbackQuerySetters, prelude::Requester, types::CallbackQuery, Bot,
};
use tracing::instrument;

use crate::{
    action::{Action, ActionError},
    catalog::{Difficulty, Specialization},
    database::RetreiveQuestions,
    intake, menu, runner,
    services::{IssueCertificate, RecordStats},
    state::{Participant, QuizState},
    store::SessionStore,
    HandlerResult, UserDialogue,
};

const STALE_BUTTON: &str = "Эта кнопка больше не активна";
const TEST_RUNNING: &str = "Сначала завершите текущий тест";

/// What a button press does in the chat's current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    Help,
    MainMenu,
    SelectSpecialization(Specialization),
    StartTest {
        specialization: Specialization,
        participant: Participant,
        difficulty: Difficulty,
    },
    ToggleAnswer(usize),
    Next,
    ShowAnswers,
    RepeatTest,
    GenerateCertificate,
    MyStats,
    /// Answered with an alert, the conversation step stays as it is.
    Reject(&'static str),
}

fn decode_error_text(e: &ActionError) -> &'static str {
    match e {
        ActionError::UnknownDifficulty(_) => "❌ Неверный уровень сложности",
        ActionError::UnknownSpecialization(_) => "❌ Неизвестная специализация",
        ActionError::InvalidAnswer(_) | ActionError::Unknown(_) => "❌ Неизвестная команда",
    }
}

/// Matches a decoded press against the conversation step. `has_session`
/// tells whether the chat still holds a test in the session store.
pub(crate) fn route(
    state: QuizState,
    action: Result<Action, &ActionError>,
    has_session: bool,
) -> Route {
    let action = match action {
        Ok(action) => action,
        Err(e) => return Route::Reject(decode_error_text(e)),
    };

    match (state, action) {
        (_, Action::Help) => Route::Help,
        (_, Action::MainMenu) => Route::MainMenu,

        (QuizState::Answering, Action::SelectSpecialization(_)) if has_session => {
            Route::Reject(TEST_RUNNING)
        }
        (_, Action::SelectSpecialization(specialization)) => {
            Route::SelectSpecialization(specialization)
        }

        (
            QuizState::ChooseDifficulty {
                specialization,
                participant,
            },
            Action::SelectDifficulty(difficulty),
        ) => Route::StartTest {
            specialization,
            participant,
            difficulty,
        },

        (QuizState::Answering, Action::ToggleAnswer(option)) => Route::ToggleAnswer(option),
        (QuizState::Answering, Action::Next) => Route::Next,

        (_, Action::ShowAnswers) => Route::ShowAnswers,
        (_, Action::RepeatTest) => Route::RepeatTest,
        (_, Action::GenerateCertificate) => Route::GenerateCertificate,
        (_, Action::MyStats) => Route::MyStats,

        (
            QuizState::Idle
            | QuizState::ReceiveFullName { .. }
            | QuizState::ReceivePosition { .. }
            | QuizState::ReceiveDepartment { .. }
            | QuizState::Answering
            | QuizState::Finished,
            Action::SelectDifficulty(_),
        )
        | (
            QuizState::Idle
            | QuizState::ReceiveFullName { .. }
            | QuizState::ReceivePosition { .. }
            | QuizState::ReceiveDepartment { .. }
            | QuizState::ChooseDifficulty { .. }
            | QuizState::Finished,
            Action::ToggleAnswer(_) | Action::Next,
        ) => Route::Reject(STALE_BUTTON),
    }
}

/// Every button press ends up here, already decoded, and is matched against
/// the chat's conversation step.
#[allow(clippy::too_many_arguments)]
#[instrument(level = "info", skip(bot, q, dialogue, sessions, bank, certificates, stats))]
pub(crate) async fn dispatch<Bank, Certificates, Stats>(
    bot: Bot,
    q: CallbackQuery,
    dialogue: UserDialogue,
    action: Result<Action, ActionError>,
    sessions: Arc<SessionStore>,
    bank: Arc<Bank>,
    certificates: Arc<Certificates>,
    stats: Arc<Stats>,
) -> HandlerResult
where
    Bank: RetreiveQuestions + 'static,
    Certificates: IssueCertificate,
    Stats: RecordStats,
{
    let state = dialogue.get_or_default().await?;
    let has_session = sessions.contains(dialogue.chat_id());
    log::info!("{} presses {:?} in {:?}", q.from.id.0, action, state);

    match route(state, action.as_ref().copied(), has_session) {
        Route::Help => menu::help(&bot, &dialogue, &q).await,
        Route::MainMenu => menu::main_menu(&bot, &dialogue, &q, &sessions).await,
        Route::SelectSpecialization(specialization) => {
            intake::select_specialization(&bot, &dialogue, &q, &sessions, specialization).await
        }
        Route::StartTest {
            specialization,
            participant,
            difficulty,
        } => {
            runner::start_test(
                &bot,
                &dialogue,
                &q,
                &sessions,
                bank.as_ref(),
                &stats,
                specialization,
                participant,
                difficulty,
            )
            .await
        }
        Route::ToggleAnswer(option) => {
            runner::toggle_answer(&bot, &dialogue, &q, &sessions, option).await
        }
        Route::Next => runner::next_question(&bot, &dialogue, &q, &sessions, stats.as_ref()).await,
        Route::ShowAnswers => runner::show_answers(&bot, &dialogue, &q, &sessions).await,
        Route::RepeatTest => menu::repeat_test(&bot, &dialogue, &q, &sessions).await,
        Route::GenerateCertificate => {
            menu::generate_certificate(&bot, &dialogue, &q, &sessions, certificates.as_ref())
                .await
        }
        Route::MyStats => menu::my_stats(&bot, &q, stats.as_ref()).await,
        Route::Reject(text) => {
            log::info!("{}: press rejected: {}", q.from.id.0, text);
            bot.answer_callback_query(&q.id).text(text).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::tests::participant;

    fn choosing() -> QuizState {
        QuizState::ChooseDifficulty {
            specialization: Specialization::Oko,
            participant: participant(),
        }
    }

    fn decoded(token: &str) -> Result<Action, ActionError> {
        token.parse::<Action>()
    }

    fn route_token(state: QuizState, token: &str, has_session: bool) -> Route {
        route(state, decoded(token).as_ref().copied(), has_session)
    }

    #[test]
    fn test_difficulty_starts_test_from_choose_difficulty() {
        assert_eq!(
            route_token(choosing(), "diff_базовый", false),
            Route::StartTest {
                specialization: Specialization::Oko,
                participant: participant(),
                difficulty: Difficulty::Basic,
            }
        );
    }

    #[test]
    fn test_malformed_difficulty_is_rejected() {
        assert_eq!(
            route_token(choosing(), "diff_легкий", false),
            Route::Reject("❌ Неверный уровень сложности")
        );
        assert_eq!(
            route_token(choosing(), "bogus", false),
            Route::Reject("❌ Неизвестная команда")
        );
    }

    #[test]
    fn test_specialization_refused_while_test_runs() {
        assert_eq!(
            route_token(QuizState::Answering, "spec_oko", true),
            Route::Reject(TEST_RUNNING)
        );
        // dialogue says answering but the test is gone
        assert_eq!(
            route_token(QuizState::Answering, "spec_oko", false),
            Route::SelectSpecialization(Specialization::Oko)
        );
        assert_eq!(
            route_token(QuizState::Finished, "spec_kadry", true),
            Route::SelectSpecialization(Specialization::Kadry)
        );
    }

    #[test]
    fn test_answer_buttons_only_work_while_answering() {
        assert_eq!(route_token(QuizState::Answering, "ans_2", true), Route::ToggleAnswer(2));
        assert_eq!(route_token(QuizState::Answering, "next", true), Route::Next);

        for state in [QuizState::Finished, QuizState::Idle, choosing()] {
            assert_eq!(route_token(state.clone(), "next", true), Route::Reject(STALE_BUTTON));
            assert_eq!(route_token(state, "ans_1", true), Route::Reject(STALE_BUTTON));
        }
    }

    #[test]
    fn test_stale_difficulty_outside_choose_difficulty() {
        for state in [QuizState::Idle, QuizState::Answering, QuizState::Finished] {
            assert_eq!(
                route_token(state, "diff_продвинутый", false),
                Route::Reject(STALE_BUTTON)
            );
        }
    }

    #[test]
    fn test_menu_actions_available_everywhere() {
        for state in [QuizState::Idle, QuizState::Answering, QuizState::Finished, choosing()] {
            assert_eq!(route_token(state.clone(), "help", true), Route::Help);
            assert_eq!(route_token(state.clone(), "main_menu", true), Route::MainMenu);
            assert_eq!(route_token(state, "show_answers", true), Route::ShowAnswers);
        }
    }
}
