use std::{fmt, time::Duration};

/// Test categories offered on the main menu, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specialization {
    Oupds,
    Ispolniteli,
    Aliment,
    Doznanie,
    Rozyisk,
    Prof,
    Oko,
    Informatika,
    Kadry,
    Bezopasnost,
    Upravlenie,
}

impl Specialization {
    pub const ALL: [Specialization; 11] = [
        Specialization::Oupds,
        Specialization::Ispolniteli,
        Specialization::Aliment,
        Specialization::Doznanie,
        Specialization::Rozyisk,
        Specialization::Prof,
        Specialization::Oko,
        Specialization::Informatika,
        Specialization::Kadry,
        Specialization::Bezopasnost,
        Specialization::Upravlenie,
    ];

    /// Identifier used in callback tokens and question bank file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Specialization::Oupds => "oupds",
            Specialization::Ispolniteli => "ispolniteli",
            Specialization::Aliment => "aliment",
            Specialization::Doznanie => "doznanie",
            Specialization::Rozyisk => "rozyisk",
            Specialization::Prof => "prof",
            Specialization::Oko => "oko",
            Specialization::Informatika => "informatika",
            Specialization::Kadry => "kadry",
            Specialization::Bezopasnost => "bezopasnost",
            Specialization::Upravlenie => "upravlenie",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Specialization::Oupds => "ООУПДС",
            Specialization::Ispolniteli => "Исполнители",
            Specialization::Aliment => "Алименты",
            Specialization::Doznanie => "Дознание",
            Specialization::Rozyisk => "Розыск",
            Specialization::Prof => "Профподготовка",
            Specialization::Oko => "ОКО",
            Specialization::Informatika => "Информатизация",
            Specialization::Kadry => "Кадры",
            Specialization::Bezopasnost => "Безопасность",
            Specialization::Upravlenie => "Управление",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Specialization::Oupds => "🚨",
            Specialization::Ispolniteli => "📊",
            Specialization::Aliment => "🧑‍🧑‍🧒",
            Specialization::Doznanie => "🎯",
            Specialization::Rozyisk => "⏳",
            Specialization::Prof => "📈",
            Specialization::Oko => "📡",
            Specialization::Informatika => "💻",
            Specialization::Kadry => "👥",
            Specialization::Bezopasnost => "🔒",
            Specialization::Upravlenie => "💼",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|spec| spec.slug() == slug)
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.emoji(), self.title())
    }
}

/// Difficulty tiers. Each tier fixes how many questions are served and how
/// long the user has to answer them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Reserve,
    Basic,
    Standard,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Reserve,
        Difficulty::Basic,
        Difficulty::Standard,
        Difficulty::Advanced,
    ];

    /// Value carried after the `diff_` prefix of a callback token.
    pub fn slug(&self) -> &'static str {
        match self {
            Difficulty::Reserve => "резерв",
            Difficulty::Basic => "базовый",
            Difficulty::Standard => "стандартный",
            Difficulty::Advanced => "продвинутый",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Difficulty::Reserve => "Резерв",
            Difficulty::Basic => "Базовый",
            Difficulty::Standard => "Стандартный",
            Difficulty::Advanced => "Продвинутый",
        }
    }

    pub fn medal(&self) -> &'static str {
        match self {
            Difficulty::Reserve => "🥉",
            Difficulty::Basic => "🥈",
            Difficulty::Standard => "🥇",
            Difficulty::Advanced => "💎",
        }
    }

    pub fn question_count(&self) -> usize {
        match self {
            Difficulty::Reserve => 20,
            Difficulty::Basic => 30,
            Difficulty::Standard => 40,
            Difficulty::Advanced => 50,
        }
    }

    pub fn time_limit(&self) -> Duration {
        let minutes = match self {
            Difficulty::Reserve => 35,
            Difficulty::Basic => 25,
            Difficulty::Standard | Difficulty::Advanced => 20,
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|diff| diff.slug() == slug)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} вопросов, {} мин)",
            self.title(),
            self.question_count(),
            self.time_limit().as_secs() / 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialization_slugs_are_unique() {
        for spec in Specialization::ALL {
            assert_eq!(Specialization::from_slug(spec.slug()), Some(spec));
        }
        assert_eq!(Specialization::from_slug("unknown"), None);
    }

    #[test]
    fn test_difficulty_tiers() {
        assert_eq!(Difficulty::Reserve.question_count(), 20);
        assert_eq!(Difficulty::Reserve.time_limit(), Duration::from_secs(35 * 60));
        assert_eq!(Difficulty::Basic.question_count(), 30);
        assert_eq!(Difficulty::Basic.time_limit(), Duration::from_secs(25 * 60));
        assert_eq!(Difficulty::Standard.question_count(), 40);
        assert_eq!(Difficulty::Advanced.question_count(), 50);
        assert_eq!(Difficulty::Advanced.time_limit(), Duration::from_secs(20 * 60));
    }

    #[test]
    fn test_difficulty_label() {
        assert_eq!(Difficulty::Basic.to_string(), "Базовый (30 вопросов, 25 мин)");
        assert_eq!(Difficulty::from_slug("базовый"), Some(Difficulty::Basic));
        assert_eq!(Difficulty::from_slug("Базовый"), None);
    }
}
