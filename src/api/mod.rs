pub mod assets;
pub mod client;
pub(crate) mod wire;

pub use client::HttpGateway;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ApiResult;
use crate::model::{Card, CourseId, UnitId, UnitProgress, UserId, WordId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBatchRequest {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub unit_id: Option<UnitId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteBatchRequest {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub completed_word_ids: Vec<WordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceBatchRequest {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WordBatch {
    pub cards: Vec<Card>,
    pub current_step: Option<u32>,
    pub active_unit_id: Option<UnitId>,
    pub unit_progress: Option<UnitProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchCompletion {
    pub unit_progress: Option<UnitProgress>,
    pub daily_new_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SentenceBatch {
    Ready(Vec<Card>),
    /// The learner does not know enough words yet. Advisory, not an error.
    InsufficientVocabulary { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub user_id: UserId,
    pub username: String,
    pub account_type: Option<String>,
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Student,
    Teacher,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }
}

/// New account. Only students are linked to a teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub account_type: AccountType,
    pub teacher_id: Option<String>,
}

/// How many of the course's words sit at each repetition level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RepetitionStats {
    pub new_seen: u32,
    pub mid_level: u32,
    pub mastered: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitLock {
    Locked,
    Open,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitStatus {
    pub unit_id: UnitId,
    pub name: String,
    pub lock: UnitLock,
    pub total_words: u32,
    pub seen_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnitsOverview {
    pub units: Vec<UnitStatus>,
    pub daily_new_count: u32,
}

/// Backend operations the study engine depends on.
pub trait StudyApi: Send + Sync {
    fn start_word_batch(
        &self,
        request: &WordBatchRequest,
    ) -> impl Future<Output = ApiResult<WordBatch>> + Send;

    fn complete_word_batch(
        &self,
        request: &CompleteBatchRequest,
    ) -> impl Future<Output = ApiResult<BatchCompletion>> + Send;

    fn start_sentence_batch(
        &self,
        request: &SentenceBatchRequest,
    ) -> impl Future<Output = ApiResult<SentenceBatch>> + Send;
}

impl<T: StudyApi> StudyApi for Arc<T> {
    fn start_word_batch(
        &self,
        request: &WordBatchRequest,
    ) -> impl Future<Output = ApiResult<WordBatch>> + Send {
        (**self).start_word_batch(request)
    }

    fn complete_word_batch(
        &self,
        request: &CompleteBatchRequest,
    ) -> impl Future<Output = ApiResult<BatchCompletion>> + Send {
        (**self).complete_word_batch(request)
    }

    fn start_sentence_batch(
        &self,
        request: &SentenceBatchRequest,
    ) -> impl Future<Output = ApiResult<SentenceBatch>> + Send {
        (**self).start_sentence_batch(request)
    }
}

/// Account and dashboard operations outside the study loop.
pub trait AccountApi: Send + Sync {
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<LoginGrant>> + Send;

    /// Returns the backend's confirmation message.
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = ApiResult<String>> + Send;

    fn reset_progress(
        &self,
        course_id: CourseId,
        password: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn list_courses(&self) -> impl Future<Output = ApiResult<Vec<Course>>> + Send;

    fn units_status(
        &self,
        course_id: CourseId,
        user_id: UserId,
    ) -> impl Future<Output = ApiResult<UnitsOverview>> + Send;

    fn repetition_stats(
        &self,
        course_id: CourseId,
        user_id: UserId,
    ) -> impl Future<Output = ApiResult<RepetitionStats>> + Send;
}
