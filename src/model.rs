use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type CourseId = i64;
pub type UnitId = i64;
pub type WordId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    #[default]
    Words,
    Sentences,
}

impl StudyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Sentences => "sentences",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "words" => Some(Self::Words),
            "sentences" => Some(Self::Sentences),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Words => Self::Sentences,
            Self::Sentences => Self::Words,
        }
    }
}

/// Identifies a card within a batch. Word cards carry the backend's word id;
/// sentence cards only get a local position-based id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardId {
    Word(WordId),
    Sentence(usize),
}

impl CardId {
    pub fn word_id(&self) -> Option<WordId> {
        match self {
            Self::Word(id) => Some(*id),
            Self::Sentence(_) => None,
        }
    }
}

/// A card as normalized at the API boundary. Immutable once fetched; the
/// reveal flag lives on the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub front_text: String,
    pub back_text: String,
    pub front_audio_url: Option<String>,
    pub back_audio_url: Option<String>,
    pub image_url: Option<String>,
}

impl Card {
    pub fn visible_image(&self, show_images: bool) -> Option<&str> {
        if show_images {
            self.image_url.as_deref()
        } else {
            None
        }
    }
}

/// Backend-authoritative unit counters; never derived from card data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitProgress {
    pub new_words_in_unit: u32,
    pub total_words_in_unit: u32,
}

impl UnitProgress {
    pub fn percent(&self) -> Option<u32> {
        if self.total_words_in_unit == 0 {
            return None;
        }
        let ratio = f64::from(self.new_words_in_unit) / f64::from(self.total_words_in_unit);
        Some((ratio * 100.0).round() as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyGoalState {
    /// 0 means no goal; celebration is disabled.
    pub daily_goal_target: u32,
    pub daily_new_words_today: u32,
    pub last_celebrated_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_handles_empty_units() {
        let progress = UnitProgress {
            new_words_in_unit: 1,
            total_words_in_unit: 3,
        };
        assert_eq!(progress.percent(), Some(33));
        assert_eq!(UnitProgress::default().percent(), None);
    }

    #[test]
    fn study_mode_parses_persisted_values() {
        assert_eq!(StudyMode::parse("sentences"), Some(StudyMode::Sentences));
        assert_eq!(StudyMode::parse(" Words "), Some(StudyMode::Words));
        assert_eq!(StudyMode::parse("grammar"), None);
        assert_eq!(StudyMode::Words.toggled(), StudyMode::Sentences);
    }

    #[test]
    fn image_hidden_when_disabled() {
        let card = Card {
            id: CardId::Word(1),
            front_text: "apple".into(),
            back_text: "elma".into(),
            front_audio_url: None,
            back_audio_url: None,
            image_url: Some("http://x/apple.png".into()),
        };
        assert_eq!(card.visible_image(true), Some("http://x/apple.png"));
        assert_eq!(card.visible_image(false), None);
    }
}
