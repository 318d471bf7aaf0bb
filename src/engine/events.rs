use serde::Serialize;

use crate::error::ApiError;
use crate::model::{Card, CardId, DailyGoalState, StudyMode, UnitProgress, WordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EngineState {
    Idle,
    Loading,
    CardFront,
    CardBack,
    BatchSubmitting,
}

/// Something the learner has to be told about. Failures block until
/// acknowledged; advisories are guidance, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum Notice {
    #[serde(rename = "AUTHENTICATION_REQUIRED")]
    AuthenticationRequired,

    #[serde(rename = "NO_ACTIVE_COURSE")]
    NoActiveCourse,

    #[serde(rename = "NOTHING_TO_STUDY")]
    NothingToStudy { mode: StudyMode },

    #[serde(rename = "INSUFFICIENT_VOCABULARY")]
    InsufficientVocabulary { message: String },

    #[serde(rename = "FETCH_FAILED")]
    FetchFailed { message: String },

    #[serde(rename = "SUBMIT_FAILED")]
    SubmitFailed { message: String },

    #[serde(rename = "DAILY_GOAL_REACHED")]
    DailyGoalReached { count: u32, target: u32 },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::SubmitFailed { .. })
    }

    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Self::NothingToStudy { .. } | Self::InsufficientVocabulary { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    #[serde(rename = "STATE_CHANGED")]
    StateChanged { from: EngineState, to: EngineState },

    #[serde(rename = "CARD_SHOWN")]
    CardShown { index: usize, total: usize, card: Card },

    #[serde(rename = "CARD_REVEALED")]
    CardRevealed { index: usize },

    #[serde(rename = "CARD_COMPLETED")]
    CardCompleted { card_id: CardId, completed: usize },

    #[serde(rename = "BATCH_SUBMITTED")]
    BatchSubmitted { word_ids: Vec<WordId> },

    #[serde(rename = "PROGRESS_UPDATED")]
    ProgressUpdated(UnitProgress),

    #[serde(rename = "DAILY_GOAL_UPDATED")]
    DailyGoalUpdated(DailyGoalState),

    #[serde(rename = "NOTICE")]
    Notice(Notice),
}

#[derive(Debug, Clone)]
pub enum StartOutcome {
    Started { cards: usize },
    AuthenticationRequired,
    NoActiveCourse,
    NothingToStudy,
    InsufficientVocabulary { message: String },
    Failed(ApiError),
    /// Completions left over from an earlier batch could not be sent; the
    /// engine waits in `BatchSubmitting` for a retry.
    PendingSubmitFailed(ApiError),
    /// The learner left the study screen while a fetch or a re-send of
    /// earlier completions was in flight.
    Discarded,
    Ignored,
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// `next` is `None` when the learner already left the study screen.
    Submitted {
        count: usize,
        next: Option<Box<StartOutcome>>,
    },
    /// Nothing to send; went straight to the next fetch.
    Skipped { next: Option<Box<StartOutcome>> },
    Failed(ApiError),
    Ignored,
}

#[derive(Debug, Clone)]
pub enum CompleteOutcome {
    Advanced { index: usize },
    BatchFinished(SubmitOutcome),
    Ignored,
}

#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    Revealed,
    Completed(CompleteOutcome),
    Ignored,
}
