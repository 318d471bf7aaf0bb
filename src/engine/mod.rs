//! Study session engine
//!
//! Drives one batch at a time: fetch, reveal and complete each card, submit
//! the completions, then fetch again until the learner leaves. All state
//! changes go out as [`EngineEvent`]s; nothing here renders.

mod celebration;
mod events;
mod session;

pub use celebration::should_celebrate;
pub use events::{
    AdvanceOutcome, CompleteOutcome, EngineEvent, EngineState, Notice, StartOutcome,
    SubmitOutcome,
};
pub use session::Session;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{
    BatchCompletion, CompleteBatchRequest, SentenceBatch, SentenceBatchRequest, StudyApi,
    WordBatch, WordBatchRequest,
};
use crate::audio::{Playback, PlaybackRequest};
use crate::config::StudySettings;
use crate::error::ApiError;
use crate::model::{
    Card, CourseId, DailyGoalState, StudyMode, UnitId, UnitProgress, UserId, WordId,
};
use crate::router::{Screen, ScreenRouter};
use crate::store::ClientStore;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Completions recorded locally but not yet accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingBatch {
    user_id: UserId,
    course_id: CourseId,
    word_ids: Vec<WordId>,
}

impl PendingBatch {
    fn from_session(session: &Session) -> Option<Self> {
        if session.mode() != StudyMode::Words {
            return None;
        }
        let word_ids = session.completed_word_ids();
        if word_ids.is_empty() {
            return None;
        }
        Some(Self {
            user_id: session.user_id(),
            course_id: session.course_id(),
            word_ids,
        })
    }

    fn request(&self) -> CompleteBatchRequest {
        CompleteBatchRequest {
            user_id: self.user_id,
            course_id: self.course_id,
            completed_word_ids: self.word_ids.clone(),
        }
    }
}

enum Fetched {
    Words(WordBatch),
    Sentences(SentenceBatch),
}

#[derive(Clone, Copy)]
enum Side {
    Prompt,
    Answer,
}

fn side_request(settings: &StudySettings, card: &Card, side: Side) -> PlaybackRequest {
    match side {
        Side::Prompt => PlaybackRequest {
            text: card.front_text.clone(),
            language: settings.prompt_language.clone(),
            remote_url: card.front_audio_url.clone(),
            rate: settings.audio_speed,
        },
        Side::Answer => PlaybackRequest {
            text: card.back_text.clone(),
            language: settings.answer_language.clone(),
            remote_url: card.back_audio_url.clone(),
            rate: settings.audio_speed,
        },
    }
}

pub struct StudyEngine<A, P> {
    api: A,
    playback: Arc<P>,
    store: ClientStore,
    router: Arc<ScreenRouter>,
    settings: StudySettings,
    state: EngineState,
    mode: StudyMode,
    unit_id: Option<UnitId>,
    session: Option<Session>,
    pending: Option<PendingBatch>,
    last_failure: Option<ApiError>,
    unit_progress: Option<UnitProgress>,
    daily_goal: DailyGoalState,
    /// Last celebration this engine made, in case the store could not keep it.
    celebrated: Option<(NaiveDate, u32)>,
    events: broadcast::Sender<EngineEvent>,
    audio_task: Option<JoinHandle<()>>,
}

impl<A, P> StudyEngine<A, P>
where
    A: StudyApi,
    P: Playback + 'static,
{
    pub fn new(
        api: A,
        playback: Arc<P>,
        store: ClientStore,
        router: Arc<ScreenRouter>,
        settings: StudySettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mode = store.study_mode();
        let daily_goal = DailyGoalState {
            daily_goal_target: store.daily_goal(),
            daily_new_words_today: 0,
            last_celebrated_count: store.last_celebrated_count(Local::now().date_naive()),
        };

        Self {
            api,
            playback,
            store,
            router,
            settings,
            state: EngineState::Idle,
            mode,
            unit_id: None,
            session: None,
            pending: None,
            last_failure: None,
            unit_progress: None,
            daily_goal,
            celebrated: None,
            events,
            audio_task: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn unit_id(&self) -> Option<UnitId> {
        self.unit_id
    }

    pub fn unit_progress(&self) -> Option<UnitProgress> {
        self.unit_progress
    }

    pub fn daily_goal(&self) -> DailyGoalState {
        self.daily_goal
    }

    pub fn settings(&self) -> &StudySettings {
        &self.settings
    }

    pub fn last_failure(&self) -> Option<&ApiError> {
        self.last_failure.as_ref()
    }

    /// Word ids recorded but not yet accepted by the backend.
    pub fn pending_word_ids(&self) -> Option<&[WordId]> {
        self.pending.as_ref().map(|batch| batch.word_ids.as_slice())
    }

    /// Only allowed between sessions. The choice is persisted.
    pub fn set_mode(&mut self, mode: StudyMode) -> bool {
        if self.state != EngineState::Idle {
            return false;
        }
        self.mode = mode;
        if let Err(err) = self.store.set_study_mode(mode) {
            warn!(error = %err, "failed to persist study mode");
        }
        true
    }

    pub async fn start(&mut self, unit_id: Option<UnitId>) -> StartOutcome {
        if self.state != EngineState::Idle {
            debug!(state = ?self.state, "start ignored");
            return StartOutcome::Ignored;
        }

        let Some(user) = self.store.user() else {
            self.notify(Notice::AuthenticationRequired);
            self.router.show(Screen::Landing);
            return StartOutcome::AuthenticationRequired;
        };
        let Some(course_id) = self.store.course_id() else {
            self.notify(Notice::NoActiveCourse);
            self.router.show(Screen::Dashboard);
            return StartOutcome::NoActiveCourse;
        };

        self.unit_id = unit_id;
        self.router.show(Screen::Loading);

        // Leftovers from an interrupted batch go out before anything new is fetched.
        if let Some(pending) = self.pending.take() {
            if pending.user_id == user.id {
                self.set_state(EngineState::BatchSubmitting);
                if let Err(err) = self.send_batch(pending).await {
                    self.submit_failed(&err);
                    return StartOutcome::PendingSubmitFailed(err);
                }
                if !self.screen_accepts_results() {
                    info!("learner left study while earlier completions were sent");
                    self.set_state(EngineState::Idle);
                    return StartOutcome::Discarded;
                }
            } else {
                warn!(
                    pending_user = pending.user_id,
                    user_id = user.id,
                    "dropping completions recorded for another user"
                );
            }
        }

        self.fetch(user.id, course_id).await
    }

    /// Shows the answer side. Its audio starts after the settle delay.
    pub fn reveal(&mut self) -> bool {
        if self.state != EngineState::CardFront {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.reveal() {
            return false;
        }
        let index = session.current_index();
        let request = session
            .current_card()
            .map(|card| side_request(&self.settings, card, Side::Answer));

        self.set_state(EngineState::CardBack);
        self.emit(EngineEvent::CardRevealed { index });
        if let Some(request) = request {
            self.schedule_audio(request, self.settings.reveal_settle_delay);
        }
        true
    }

    pub async fn complete(&mut self) -> CompleteOutcome {
        if self.state != EngineState::CardBack {
            return CompleteOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return CompleteOutcome::Ignored;
        };
        let Some(card_id) = session.complete_current() else {
            return CompleteOutcome::Ignored;
        };
        let completed = session.completed().len();
        let advanced = session.advance();
        let next = session.current_card().cloned().filter(|_| advanced);
        let (index, total) = session.position();

        self.emit(EngineEvent::CardCompleted { card_id, completed });

        match next {
            Some(card) => {
                self.set_state(EngineState::CardFront);
                self.show_card(index, total, card);
                CompleteOutcome::Advanced { index }
            }
            None => {
                self.set_state(EngineState::BatchSubmitting);
                CompleteOutcome::BatchFinished(self.submit_batch().await)
            }
        }
    }

    /// Reveal on the prompt side, complete on the answer side.
    pub async fn advance(&mut self) -> AdvanceOutcome {
        match self.state() {
            EngineState::CardFront if self.reveal() => AdvanceOutcome::Revealed,
            EngineState::CardBack => AdvanceOutcome::Completed(self.complete().await),
            _ => AdvanceOutcome::Ignored,
        }
    }

    /// Sends the batch's completions once, then fetches the next batch. An
    /// empty batch skips the write. On failure the completions are kept and
    /// calling this again re-sends exactly the same ids.
    pub async fn submit_batch(&mut self) -> SubmitOutcome {
        if !matches!(
            self.state,
            EngineState::CardFront | EngineState::CardBack | EngineState::BatchSubmitting
        ) {
            return SubmitOutcome::Ignored;
        }

        let (user_id, course_id) = if let Some(session) = self.session.take() {
            self.pending = PendingBatch::from_session(&session);
            (session.user_id(), session.course_id())
        } else if let Some(pending) = &self.pending {
            (pending.user_id, pending.course_id)
        } else {
            return SubmitOutcome::Ignored;
        };

        self.cancel_audio();
        self.last_failure = None;
        self.set_state(EngineState::BatchSubmitting);

        let Some(batch) = self.pending.take() else {
            debug!(course_id, "no completions to submit");
            let next = self.restart(user_id, course_id).await;
            return SubmitOutcome::Skipped { next };
        };

        match self.send_batch(batch).await {
            Ok(count) => {
                let next = self.restart(user_id, course_id).await;
                SubmitOutcome::Submitted { count, next }
            }
            Err(err) => {
                self.submit_failed(&err);
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Dismisses a submission failure. The completions stay pending and are
    /// sent first on the next `start`.
    pub fn acknowledge_failure(&mut self) -> bool {
        if self.state != EngineState::BatchSubmitting || self.last_failure.is_none() {
            return false;
        }
        self.last_failure = None;
        self.set_state(EngineState::Idle);
        self.router.show(Screen::Dashboard);
        true
    }

    /// Leaves the study screen. Completions not yet sent are kept pending.
    pub fn exit(&mut self) {
        self.cancel_audio();
        match self.state {
            EngineState::CardFront | EngineState::CardBack | EngineState::BatchSubmitting => {
                if let Some(batch) = self.session.take().as_ref().and_then(PendingBatch::from_session)
                {
                    info!(words = batch.word_ids.len(), "keeping unsubmitted completions");
                    self.pending = Some(batch);
                }
                self.last_failure = None;
                self.set_state(EngineState::Idle);
            }
            EngineState::Idle | EngineState::Loading => {}
        }
        self.router.show(Screen::Dashboard);
    }

    /// Replays the side currently showing.
    pub fn replay_audio(&mut self) -> bool {
        let side = match self.state {
            EngineState::CardFront => Side::Prompt,
            EngineState::CardBack => Side::Answer,
            _ => return false,
        };
        let Some(request) = self
            .session
            .as_ref()
            .and_then(Session::current_card)
            .map(|card| side_request(&self.settings, card, side))
        else {
            return false;
        };
        self.schedule_audio(request, Duration::ZERO);
        true
    }

    /// Waits for the most recently scheduled clip to finish.
    pub async fn settle_audio(&mut self) {
        if let Some(task) = self.audio_task.take() {
            let _ = task.await;
        }
    }

    async fn fetch(&mut self, user_id: UserId, course_id: CourseId) -> StartOutcome {
        self.set_state(EngineState::Loading);
        self.router.show(Screen::Loading);

        let fetched = match self.mode {
            StudyMode::Words => {
                let request = WordBatchRequest {
                    user_id,
                    course_id,
                    unit_id: self.unit_id,
                };
                info!(user_id, course_id, unit_id = ?self.unit_id, "fetching word batch");
                self.api
                    .start_word_batch(&request)
                    .await
                    .map(Fetched::Words)
            }
            StudyMode::Sentences => {
                let request = SentenceBatchRequest {
                    user_id,
                    course_id,
                    limit: self.settings.sentence_batch_limit,
                };
                info!(user_id, course_id, limit = request.limit, "fetching sentence batch");
                self.api
                    .start_sentence_batch(&request)
                    .await
                    .map(Fetched::Sentences)
            }
        };

        if !self.screen_accepts_results() {
            info!(screen = ?self.router.current(), "discarding batch fetched after leaving study");
            self.set_state(EngineState::Idle);
            return StartOutcome::Discarded;
        }

        match fetched {
            Err(err) => self.fetch_failed(err),
            Ok(Fetched::Words(batch)) => {
                if let Some(active) = batch.active_unit_id {
                    if self.unit_id != Some(active) {
                        info!(requested = ?self.unit_id, active, "backend switched active unit");
                    }
                    self.unit_id = Some(active);
                }
                if let Some(progress) = batch.unit_progress {
                    self.set_unit_progress(progress);
                }
                self.begin_batch(user_id, course_id, batch.cards, batch.current_step)
            }
            Ok(Fetched::Sentences(SentenceBatch::InsufficientVocabulary { message })) => {
                self.advisory(Notice::InsufficientVocabulary {
                    message: message.clone(),
                });
                StartOutcome::InsufficientVocabulary { message }
            }
            Ok(Fetched::Sentences(SentenceBatch::Ready(cards))) => {
                self.begin_batch(user_id, course_id, cards, None)
            }
        }
    }

    fn begin_batch(
        &mut self,
        user_id: UserId,
        course_id: CourseId,
        cards: Vec<Card>,
        step: Option<u32>,
    ) -> StartOutcome {
        if cards.is_empty() {
            self.advisory(Notice::NothingToStudy { mode: self.mode });
            return StartOutcome::NothingToStudy;
        }

        let unit_id = match self.mode {
            StudyMode::Words => self.unit_id,
            StudyMode::Sentences => None,
        };
        let total = cards.len();
        let first = cards[0].clone();
        info!(mode = self.mode.as_str(), cards = total, ?unit_id, "batch started");

        self.session = Some(Session::new(
            self.mode, unit_id, user_id, course_id, cards, step,
        ));
        self.set_state(EngineState::CardFront);
        self.router.show(Screen::Study);
        self.show_card(0, total, first);

        StartOutcome::Started { cards: total }
    }

    fn show_card(&mut self, index: usize, total: usize, card: Card) {
        let prompt = self
            .settings
            .auto_play
            .then(|| side_request(&self.settings, &card, Side::Prompt));
        if prompt.is_none() {
            self.cancel_audio();
        }
        self.emit(EngineEvent::CardShown { index, total, card });
        if let Some(request) = prompt {
            self.schedule_audio(request, Duration::ZERO);
        }
    }

    async fn send_batch(&mut self, batch: PendingBatch) -> Result<usize, ApiError> {
        let request = batch.request();
        let count = request.completed_word_ids.len();
        info!(course_id = batch.course_id, words = count, "submitting batch");

        match self.api.complete_word_batch(&request).await {
            Ok(completion) => {
                self.emit(EngineEvent::BatchSubmitted {
                    word_ids: batch.word_ids,
                });
                self.apply_completion(completion);
                Ok(count)
            }
            Err(err) => {
                warn!(course_id = batch.course_id, words = count, error = %err, "batch submission failed");
                self.pending = Some(batch);
                Err(err)
            }
        }
    }

    async fn restart(&mut self, user_id: UserId, course_id: CourseId) -> Option<Box<StartOutcome>> {
        if !self.screen_accepts_results() {
            info!("learner left study; not starting another batch");
            self.set_state(EngineState::Idle);
            return None;
        }
        Some(Box::new(self.fetch(user_id, course_id).await))
    }

    fn apply_completion(&mut self, completion: BatchCompletion) {
        if let Some(progress) = completion.unit_progress {
            self.set_unit_progress(progress);
        }

        let Some(count) = completion.daily_new_count else {
            return;
        };
        let today = Local::now().date_naive();
        let target = self.store.daily_goal();
        let remembered = self
            .celebrated
            .filter(|(date, _)| *date == today)
            .map_or(0, |(_, count)| count);
        let last = self.store.last_celebrated_count(today).max(remembered);
        self.daily_goal = DailyGoalState {
            daily_goal_target: target,
            daily_new_words_today: count,
            last_celebrated_count: last,
        };

        let celebrate = should_celebrate(target, count, last);
        if celebrate {
            if let Err(err) = self.store.set_last_celebrated_count(count, today) {
                warn!(error = %err, "failed to persist celebration mark");
            }
            self.celebrated = Some((today, count));
            self.daily_goal.last_celebrated_count = count;
        }
        self.emit(EngineEvent::DailyGoalUpdated(self.daily_goal));
        if celebrate {
            self.notify(Notice::DailyGoalReached { count, target });
        }
    }

    fn set_unit_progress(&mut self, progress: UnitProgress) {
        self.unit_progress = Some(progress);
        self.emit(EngineEvent::ProgressUpdated(progress));
    }

    fn submit_failed(&mut self, err: &ApiError) {
        if err.is_unauthorized() {
            self.set_state(EngineState::Idle);
            self.notify(Notice::AuthenticationRequired);
            self.router.show(Screen::Landing);
        } else if !self.screen_accepts_results() {
            self.set_state(EngineState::Idle);
        } else {
            self.last_failure = Some(err.clone());
            self.notify(Notice::SubmitFailed {
                message: err.to_string(),
            });
        }
    }

    fn fetch_failed(&mut self, err: ApiError) -> StartOutcome {
        warn!(mode = self.mode.as_str(), error = %err, "batch fetch failed");
        self.set_state(EngineState::Idle);
        if err.is_unauthorized() {
            self.notify(Notice::AuthenticationRequired);
            self.router.show(Screen::Landing);
            return StartOutcome::AuthenticationRequired;
        }
        self.notify(Notice::FetchFailed {
            message: err.to_string(),
        });
        self.router.show(Screen::Dashboard);
        StartOutcome::Failed(err)
    }

    fn advisory(&mut self, notice: Notice) {
        self.set_state(EngineState::Idle);
        self.notify(notice);
        self.router.show(Screen::Dashboard);
    }

    fn screen_accepts_results(&self) -> bool {
        matches!(self.router.current(), Screen::Study | Screen::Loading)
    }

    fn schedule_audio(&mut self, request: PlaybackRequest, delay: Duration) {
        self.cancel_audio();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime; skipping audio");
            return;
        };
        let playback = Arc::clone(&self.playback);
        self.audio_task = Some(runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let outcome = playback.play(request).await;
            debug!(?outcome, "card audio finished");
        }));
    }

    fn cancel_audio(&mut self) {
        if let Some(task) = self.audio_task.take() {
            task.abort();
        }
        self.playback.cancel();
    }

    fn set_state(&mut self, to: EngineState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(?from, ?to, "engine state");
        self.emit(EngineEvent::StateChanged { from, to });
    }

    fn notify(&self, notice: Notice) {
        info!(?notice, "notice");
        self.emit(EngineEvent::Notice(notice));
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}
