use std::{fmt::Write, time::Duration};

use teloxide::{types::InlineKeyboardMarkup, utils::html};

use crate::{
    catalog::Specialization,
    keyboard::{number_emoji, question_keyboard},
    session::{GradedAnswer, TestOutcome, TestSession},
};

pub(crate) fn welcome_text() -> String {
    "🧪 <b>ФССП Тест-бот</b>\n\nВыберите специализацию:".to_owned()
}

pub(crate) fn help_text() -> String {
    [
        "❓ <b>Помощь по боту</b>",
        "",
        "1. Выберите специализацию",
        "2. Введите свои данные",
        "3. Выберите уровень сложности",
        "4. Отвечайте на вопросы",
        "5. Получите результат и сертификат",
        "",
        "Кнопки с числами 1️⃣2️⃣3️⃣ - выбор вариантов ответа",
        "✅ - выбранный вариант",
        "➡️ Далее - переход к следующему вопросу",
        "",
        "/start - главное меню, /cancel - прервать тест",
    ]
    .join("\n")
}

pub(crate) fn name_prompt(specialization: Specialization) -> String {
    format!(
        "{} <b>{}</b>\n\nВведите ваше ФИО:",
        specialization.emoji(),
        specialization.title()
    )
}

fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Text and keyboard for the session's current question.
pub(crate) fn question_screen(session: &TestSession) -> (String, InlineKeyboardMarkup) {
    let index = session.current_index();
    let Some(question) = session.current_question() else {
        return ("Вопросы закончились.".to_owned(), InlineKeyboardMarkup::default());
    };

    let mut text = format!(
        "<b>Вопрос {} из {}</b>\n\n{}\n",
        index + 1,
        session.questions().len(),
        html::escape(question.text())
    );
    for (i, option) in question.options().iter().enumerate() {
        let _ = write!(text, "\n{} {}", number_emoji(i + 1), html::escape(option));
    }
    if let Some(remaining) = session.remaining() {
        let _ = write!(text, "\n\n⏱ Осталось: {}", format_remaining(remaining));
    }

    let keyboard = question_keyboard(question.options(), &session.selected(index));
    (text, keyboard)
}

pub(crate) fn result_text(outcome: &TestOutcome) -> String {
    let mut text = String::from("🏁 <b>Тест завершён</b>\n");
    if outcome.timed_out {
        text.push_str("⏰ Время вышло\n");
    }
    let _ = write!(
        text,
        "\n👤 {}\n💼 {}\n🏢 {}\n\n{} {}\n{} {}\n\nПравильных ответов: <b>{} из {}</b> ({}%)",
        html::escape(&outcome.participant.full_name),
        html::escape(&outcome.participant.position),
        html::escape(&outcome.participant.department),
        outcome.specialization.emoji(),
        outcome.specialization.title(),
        outcome.difficulty.medal(),
        outcome.difficulty.title(),
        outcome.correct,
        outcome.total,
        outcome.percent()
    );
    text
}

pub(crate) fn answers_report(graded: &[GradedAnswer]) -> String {
    let mut text = String::from("📋 <b>Правильные ответы:</b>\n");
    for row in graded {
        let mark = if row.is_correct { "✅" } else { "❌" };
        let expected = row
            .expected
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(text, "\n{} <b>Вопрос {}:</b> {}", mark, row.number, expected);
    }
    text
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        catalog::Difficulty,
        database::question::{Question, Selection},
        session::tests::{oko_basic, participant},
    };

    #[test]
    fn test_question_screen_escapes_and_marks() {
        let mut session = TestSession::new(
            1,
            Specialization::Kadry,
            Difficulty::Reserve,
            participant(),
            vec![Question::new(
                "Что значит <b>?",
                vec!["A & B".into(), "C".into()],
                [2],
            )],
        );
        session.toggle(2).unwrap();

        let (text, keyboard) = question_screen(&session);
        assert_eq!(
            text,
            "<b>Вопрос 1 из 1</b>\n\nЧто значит &lt;b&gt;?\n\n1️⃣ A &amp; B\n2️⃣ C"
        );
        assert_eq!(keyboard.inline_keyboard[0][1].text, "✅ 2️⃣ C");
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(25 * 60)), "25:00");
        assert_eq!(format_remaining(Duration::from_secs(61)), "01:01");
    }

    #[test]
    fn test_result_text_mentions_timeout() {
        let mut session = oko_basic();
        session.toggle(1).unwrap();
        session.finish(true);

        let text = result_text(&session.outcome());
        assert!(text.contains("⏰ Время вышло"));
        assert!(text.contains("Иванов Иван Иванович"));
        assert!(text.contains("<b>1 из 30</b> (3%)"));
    }

    #[test]
    fn test_answers_report_lists_every_question() {
        let mut session = oko_basic();
        session.toggle(1).unwrap();
        session.finish(false);

        let report = answers_report(&session.graded_answers());
        let rows: Vec<&str> = report.lines().skip(2).collect();
        assert_eq!(rows.len(), 30);
        assert_eq!(rows[0], "✅ <b>Вопрос 1:</b> 1");
        assert_eq!(rows[1], "❌ <b>Вопрос 2:</b> 1");
    }

    #[test]
    fn test_answers_report_multi_answer() {
        let graded = [GradedAnswer {
            number: 4,
            is_correct: false,
            expected: Selection::from([3, 1]),
        }];
        assert!(answers_report(&graded).ends_with("❌ <b>Вопрос 4:</b> 1, 3"));
    }
}
