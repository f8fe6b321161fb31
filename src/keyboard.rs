use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::{
    action::Action,
    catalog::{Difficulty, Specialization},
    database::question::Selection,
};

const OPTION_TEXT_LIMIT: usize = 30;

fn button(text: impl Into<String>, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

pub(crate) fn number_emoji(n: usize) -> String {
    match n {
        1 => "1️⃣".to_owned(),
        2 => "2️⃣".to_owned(),
        3 => "3️⃣".to_owned(),
        4 => "4️⃣".to_owned(),
        5 => "5️⃣".to_owned(),
        6 => "6️⃣".to_owned(),
        n => n.to_string(),
    }
}

fn shorten(text: &str) -> String {
    match text.char_indices().nth(OPTION_TEXT_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

pub(crate) fn main_menu_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = Specialization::ALL
        .into_iter()
        .map(|spec| button(spec.to_string(), Action::SelectSpecialization(spec)))
        .chain(std::iter::once(button("❓ Помощь", Action::Help)))
        .collect();

    InlineKeyboardMarkup::new(buttons.chunks(2).map(<[_]>::to_vec))
}

pub(crate) fn difficulty_keyboard() -> InlineKeyboardMarkup {
    let keyboard = Difficulty::ALL.into_iter().map(|diff| {
        vec![button(
            format!("{} {}", diff.medal(), diff),
            Action::SelectDifficulty(diff),
        )]
    });

    InlineKeyboardMarkup::new(keyboard)
}

/// Option buttons two per row, then a full-width "Next" row.
pub(crate) fn question_keyboard(options: &[String], selected: &Selection) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = options
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let number = i + 1;
            let check = if selected.contains(&number) { "✅ " } else { "" };
            button(
                format!("{}{} {}", check, number_emoji(number), shorten(text)),
                Action::ToggleAnswer(number),
            )
        })
        .collect();

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> =
        buttons.chunks(2).map(<[_]>::to_vec).collect();
    keyboard.push(vec![button("➡️ Далее", Action::Next)]);

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn finish_keyboard() -> InlineKeyboardMarkup {
    let keyboard = vec![
        vec![button("📋 Показать правильные ответы", Action::ShowAnswers)],
        vec![button("🏆 Сертификат PDF", Action::GenerateCertificate)],
        vec![button("🔄 Повторить тест", Action::RepeatTest)],
        vec![button("📊 Моя статистика", Action::MyStats)],
        vec![button("🏠 Главное меню", Action::MainMenu)],
    ];

    InlineKeyboardMarkup::new(keyboard)
}
