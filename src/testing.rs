//! In-memory doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::{
    AccountApi, BatchCompletion, CompleteBatchRequest, Course, LoginGrant, RegisterRequest,
    RepetitionStats, SentenceBatch, SentenceBatchRequest, StudyApi, UnitsOverview, WordBatch,
    WordBatchRequest,
};
use crate::audio::{Playback, PlaybackOutcome, PlaybackRequest};
use crate::error::{ApiError, ApiResult, StoreError, StoreResult};
use crate::model::{Card, CardId, CourseId, UserId, WordId};
use crate::store::{KeyValueStore, MemoryStore};

pub fn word_card(id: WordId) -> Card {
    Card {
        id: CardId::Word(id),
        front_text: format!("word-{id}"),
        back_text: format!("kelime-{id}"),
        front_audio_url: Some(format!("http://api/assets/audio/{id}.mp3")),
        back_audio_url: None,
        image_url: None,
    }
}

pub fn word_batch(ids: &[WordId]) -> WordBatch {
    WordBatch {
        cards: ids.iter().copied().map(word_card).collect(),
        ..WordBatch::default()
    }
}

/// Scripted backend. Each call pops the next queued response; an empty queue
/// answers with an empty batch or an empty completion.
#[derive(Default)]
pub struct FakeApi {
    word_batches: Mutex<VecDeque<ApiResult<WordBatch>>>,
    sentence_batches: Mutex<VecDeque<ApiResult<SentenceBatch>>>,
    completions: Mutex<VecDeque<ApiResult<BatchCompletion>>>,
    word_requests: Mutex<Vec<WordBatchRequest>>,
    sentence_requests: Mutex<Vec<SentenceBatchRequest>>,
    submissions: Mutex<Vec<CompleteBatchRequest>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// From now on every call waits for one `notify_one` on the returned gate.
    pub fn hold_responses(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    async fn respond(&self) {
        let gate = self.gate.lock().clone();
        match gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }
    }

    pub fn queue_words(&self, response: ApiResult<WordBatch>) {
        self.word_batches.lock().push_back(response);
    }

    pub fn queue_sentences(&self, response: ApiResult<SentenceBatch>) {
        self.sentence_batches.lock().push_back(response);
    }

    pub fn queue_completion(&self, response: ApiResult<BatchCompletion>) {
        self.completions.lock().push_back(response);
    }

    pub fn word_requests(&self) -> Vec<WordBatchRequest> {
        self.word_requests.lock().clone()
    }

    pub fn sentence_requests(&self) -> Vec<SentenceBatchRequest> {
        self.sentence_requests.lock().clone()
    }

    pub fn submitted_ids(&self) -> Vec<Vec<WordId>> {
        self.submissions
            .lock()
            .iter()
            .map(|request| request.completed_word_ids.clone())
            .collect()
    }
}

impl StudyApi for FakeApi {
    async fn start_word_batch(&self, request: &WordBatchRequest) -> ApiResult<WordBatch> {
        self.word_requests.lock().push(request.clone());
        self.respond().await;
        self.word_batches
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(WordBatch::default()))
    }

    async fn complete_word_batch(
        &self,
        request: &CompleteBatchRequest,
    ) -> ApiResult<BatchCompletion> {
        self.submissions.lock().push(request.clone());
        self.respond().await;
        self.completions
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(BatchCompletion::default()))
    }

    async fn start_sentence_batch(
        &self,
        request: &SentenceBatchRequest,
    ) -> ApiResult<SentenceBatch> {
        self.sentence_requests.lock().push(request.clone());
        self.respond().await;
        self.sentence_batches
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(SentenceBatch::Ready(Vec::new())))
    }
}

#[derive(Default)]
pub struct RecordingPlayback {
    requests: Mutex<Vec<PlaybackRequest>>,
    cancels: AtomicUsize,
}

impl RecordingPlayback {
    pub fn requests(&self) -> Vec<PlaybackRequest> {
        self.requests.lock().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl Playback for RecordingPlayback {
    async fn play(&self, request: PlaybackRequest) -> PlaybackOutcome {
        self.requests.lock().push(request);
        PlaybackOutcome::Synthesized
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripted account backend for the auth and dashboard tests.
#[derive(Default)]
pub struct FakeAccount {
    pub grant: Mutex<Option<ApiResult<LoginGrant>>>,
    pub courses: Mutex<Vec<Course>>,
    pub overview: Mutex<UnitsOverview>,
    pub reset_error: Mutex<Option<ApiError>>,
    pub repetition: Mutex<RepetitionStats>,
    pub registrations: Mutex<Vec<RegisterRequest>>,
    pub units_requests: Mutex<Vec<(CourseId, UserId)>>,
    pub course_list_calls: AtomicUsize,
}

impl AccountApi for FakeAccount {
    async fn login(&self, username: &str, _password: &str) -> ApiResult<LoginGrant> {
        self.grant.lock().take().unwrap_or_else(|| {
            Ok(LoginGrant {
                user_id: 1,
                username: username.to_string(),
                account_type: None,
                access_token: "token-1".to_string(),
            })
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<String> {
        self.registrations.lock().push(request.clone());
        Ok("registered".to_string())
    }

    async fn reset_progress(&self, _course_id: CourseId, _password: &str) -> ApiResult<()> {
        match self.reset_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_courses(&self) -> ApiResult<Vec<Course>> {
        self.course_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.courses.lock().clone())
    }

    async fn units_status(&self, course_id: CourseId, user_id: UserId) -> ApiResult<UnitsOverview> {
        self.units_requests.lock().push((course_id, user_id));
        Ok(self.overview.lock().clone())
    }

    async fn repetition_stats(
        &self,
        _course_id: CourseId,
        _user_id: UserId,
    ) -> ApiResult<RepetitionStats> {
        Ok(*self.repetition.lock())
    }
}

/// Memory store whose writes to one key always fail.
pub struct ReadOnlyKey {
    inner: MemoryStore,
    key: &'static str,
}

impl ReadOnlyKey {
    pub fn new(key: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            key,
        }
    }

    fn check(&self, key: &str) -> StoreResult<()> {
        if key == self.key {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        Ok(())
    }
}

impl KeyValueStore for ReadOnlyKey {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.check(key)?;
        self.inner.remove(key)
    }
}
