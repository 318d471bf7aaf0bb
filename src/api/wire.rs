//! Backend JSON shapes and their one-time normalization into [`Card`].
//!
//! Older and newer backends disagree on field names (`english`/`target`,
//! `turkish`/`native`, `audio_url`/`audio_en_url`); serde aliases absorb the
//! difference here so nothing past this module branches on it.

use serde::{Deserialize, Serialize};

use crate::api::assets::resolve_asset_url;
use crate::model::{Card, CardId, CourseId, UnitId, UnitProgress, UserId, WordId};

pub(crate) const INSUFFICIENT_VOCABULARY: &str = "insufficient_vocabulary";
const MISSING_TRANSLATION: &str = "(translation unavailable)";

#[derive(Debug, Serialize)]
pub(crate) struct StartSessionBody {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub unit_id: Option<UnitId>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompleteSessionBody<'a> {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub completed_word_ids: &'a [WordId],
}

#[derive(Debug, Serialize)]
pub(crate) struct ResetProgressBody<'a> {
    pub course_id: CourseId,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub account_type: &'a str,
    pub teacher_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepetitionStatsResponse {
    #[serde(default)]
    pub new_seen: u32,
    #[serde(default)]
    pub mid_level: u32,
    #[serde(default)]
    pub mastered: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUnitProgress {
    #[serde(default)]
    pub new_words: u32,
    #[serde(default)]
    pub total: u32,
}

impl From<WireUnitProgress> for UnitProgress {
    fn from(wire: WireUnitProgress) -> Self {
        Self {
            new_words_in_unit: wire.new_words,
            total_words_in_unit: wire.total,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WordItem {
    pub word_id: WordId,
    #[serde(alias = "target")]
    pub english: String,
    #[serde(default, alias = "native")]
    pub turkish: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, alias = "audio_url")]
    pub audio_en_url: Option<String>,
    #[serde(default)]
    pub audio_tr_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StartSessionResponse {
    #[serde(default)]
    pub items: Vec<WordItem>,
    #[serde(default)]
    pub current_step: Option<u32>,
    #[serde(default)]
    pub active_unit_id: Option<UnitId>,
    #[serde(default)]
    pub unit_progress: Option<WireUnitProgress>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompleteSessionResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub unit_progress: Option<WireUnitProgress>,
    #[serde(default)]
    pub daily_new_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SentenceItem {
    Text(String),
    Full {
        #[serde(alias = "target")]
        english: String,
        #[serde(default, alias = "native")]
        turkish: Option<String>,
        #[serde(default)]
        image_url: Option<String>,
        #[serde(default, alias = "audio_url")]
        audio_en_url: Option<String>,
        #[serde(default)]
        audio_tr_url: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SentencesResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sentences: Vec<SentenceItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CoursesResponse {
    #[serde(default)]
    pub courses: Vec<WireCourse>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireCourse {
    pub id: CourseId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UnitsStatusResponse {
    #[serde(default)]
    pub units: Vec<WireUnitStatus>,
    #[serde(default)]
    pub daily_new_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUnitStatus {
    pub unit_id: UnitId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: Option<WireUnitStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUnitStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub seen_percentage: f64,
}

fn media(base_url: &str, raw: Option<String>) -> Option<String> {
    raw.and_then(|value| resolve_asset_url(base_url, &value))
}

pub(crate) fn word_card(base_url: &str, item: WordItem) -> Card {
    Card {
        id: CardId::Word(item.word_id),
        front_text: item.english,
        back_text: item.turkish.unwrap_or_default(),
        front_audio_url: media(base_url, item.audio_en_url),
        back_audio_url: media(base_url, item.audio_tr_url),
        image_url: media(base_url, item.image_url),
    }
}

pub(crate) fn sentence_card(base_url: &str, index: usize, item: SentenceItem) -> Card {
    match item {
        SentenceItem::Text(text) => Card {
            id: CardId::Sentence(index),
            front_text: text,
            back_text: MISSING_TRANSLATION.to_string(),
            front_audio_url: None,
            back_audio_url: None,
            image_url: None,
        },
        SentenceItem::Full {
            english,
            turkish,
            image_url,
            audio_en_url,
            audio_tr_url,
        } => Card {
            id: CardId::Sentence(index),
            front_text: english,
            back_text: turkish.unwrap_or_else(|| MISSING_TRANSLATION.to_string()),
            front_audio_url: media(base_url, audio_en_url),
            back_audio_url: media(base_url, audio_tr_url),
            image_url: media(base_url, image_url),
        },
    }
}
