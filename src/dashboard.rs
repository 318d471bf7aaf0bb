//! Dashboard view model. Reads backend progress and the engine's derived
//! counters; never touches session internals.

use tracing::{info, warn};

use crate::api::{AccountApi, Course, RepetitionStats, UnitLock, UnitStatus};
use crate::engine::EngineEvent;
use crate::error::{ApiError, ApiResult};
use crate::model::{CourseId, UnitId, UnitProgress};
use crate::router::ScreenTransition;
use crate::store::ClientStore;

#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    courses: Vec<Course>,
    course_id: Option<CourseId>,
    units: Vec<UnitStatus>,
    repetition: RepetitionStats,
    daily_new_count: u32,
    last_progress: Option<UnitProgress>,
    stale: bool,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_engine_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::ProgressUpdated(progress) => self.last_progress = Some(*progress),
            EngineEvent::DailyGoalUpdated(goal) => {
                self.daily_new_count = goal.daily_new_words_today;
            }
            EngineEvent::BatchSubmitted { .. } => self.stale = true,
            _ => {}
        }
    }

    pub fn wants_refresh(&self, transition: &ScreenTransition) -> bool {
        transition.refresh_dashboard
    }

    /// Reloads courses and unit progress. Picks the first course when the
    /// learner has none selected yet and remembers it.
    pub async fn refresh<A: AccountApi>(&mut self, api: &A, store: &ClientStore) -> ApiResult<()> {
        let user = store
            .user()
            .ok_or_else(|| ApiError::unauthorized("sign in to see your progress"))?;

        if self.courses.is_empty() {
            self.courses = api.list_courses().await?;
        }

        let course_id = match store.course_id() {
            Some(course_id) => course_id,
            None => {
                let first = self
                    .courses
                    .first()
                    .ok_or_else(|| ApiError::validation("no courses available"))?;
                if let Err(err) = store.set_course_id(first.id) {
                    warn!(error = %err, "failed to persist active course");
                }
                first.id
            }
        };

        let (overview, repetition) = tokio::join!(
            api.units_status(course_id, user.id),
            api.repetition_stats(course_id, user.id)
        );
        let (overview, repetition) = (overview?, repetition?);
        self.course_id = Some(course_id);
        self.repetition = repetition;
        self.units = overview.units;
        self.daily_new_count = overview.daily_new_count;
        self.stale = false;
        info!(course_id, units = self.units.len(), "dashboard refreshed");

        Ok(())
    }

    /// First unlocked unit, else the first unit.
    pub fn next_unit(&self) -> Option<UnitId> {
        self.units
            .iter()
            .find(|unit| unit.lock == UnitLock::Open)
            .or_else(|| self.units.first())
            .map(|unit| unit.unit_id)
    }

    pub fn total_words(&self) -> u32 {
        self.units.iter().map(|unit| unit.total_words).sum()
    }

    pub fn average_progress(&self) -> f64 {
        if self.units.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.units.iter().map(|unit| unit.seen_percentage).sum();
        sum / self.units.len() as f64
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course_id(&self) -> Option<CourseId> {
        self.course_id
    }

    pub fn course_name(&self) -> Option<&str> {
        let course_id = self.course_id?;
        self.courses
            .iter()
            .find(|course| course.id == course_id)
            .map(|course| course.name.as_str())
    }

    pub fn units(&self) -> &[UnitStatus] {
        &self.units
    }

    pub fn repetition(&self) -> RepetitionStats {
        self.repetition
    }

    pub fn daily_new_count(&self) -> u32 {
        self.daily_new_count
    }

    pub fn last_progress(&self) -> Option<UnitProgress> {
        self.last_progress
    }

    /// A batch was submitted since the last refresh.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UnitsOverview;
    use crate::model::{DailyGoalState, UserIdentity};
    use crate::router::{Screen, ScreenRouter};
    use crate::testing::FakeAccount;

    fn unit(unit_id: UnitId, lock: UnitLock, total_words: u32, seen: f64) -> UnitStatus {
        UnitStatus {
            unit_id,
            name: format!("Unit {unit_id}"),
            lock,
            total_words,
            seen_percentage: seen,
        }
    }

    fn signed_in() -> ClientStore {
        let store = ClientStore::in_memory();
        store
            .set_user(&UserIdentity {
                id: 7,
                username: "ayse".into(),
                account_type: None,
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn first_course_becomes_active() {
        let api = FakeAccount::default();
        *api.courses.lock() = vec![
            Course {
                id: 3,
                name: "English A1".into(),
            },
            Course {
                id: 4,
                name: "English A2".into(),
            },
        ];
        *api.repetition.lock() = RepetitionStats {
            new_seen: 12,
            mid_level: 5,
            mastered: 2,
        };
        *api.overview.lock() = UnitsOverview {
            units: vec![
                unit(10, UnitLock::Locked, 20, 0.0),
                unit(11, UnitLock::Open, 30, 50.0),
            ],
            daily_new_count: 4,
        };
        let store = signed_in();
        let mut view = DashboardView::new();

        view.refresh(&api, &store).await.unwrap();

        assert_eq!(store.course_id(), Some(3));
        assert_eq!(view.course_name(), Some("English A1"));
        assert_eq!(*api.units_requests.lock(), vec![(3, 7)]);
        assert_eq!(view.next_unit(), Some(11));
        assert_eq!(view.total_words(), 50);
        assert_eq!(view.average_progress(), 25.0);
        assert_eq!(view.daily_new_count(), 4);
        assert_eq!(view.repetition().mastered, 2);
        assert_eq!(view.repetition().new_seen, 12);
    }

    #[tokio::test]
    async fn courses_are_listed_once() {
        let api = FakeAccount::default();
        *api.courses.lock() = vec![Course {
            id: 3,
            name: "English A1".into(),
        }];
        let store = signed_in();
        let mut view = DashboardView::new();

        view.refresh(&api, &store).await.unwrap();
        view.refresh(&api, &store).await.unwrap();

        assert_eq!(
            api.course_list_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn refresh_requires_identity() {
        let api = FakeAccount::default();
        let mut view = DashboardView::new();

        let err = view
            .refresh(&api, &ClientStore::in_memory())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn all_locked_falls_back_to_first_unit() {
        let view = DashboardView {
            units: vec![
                unit(1, UnitLock::Locked, 5, 0.0),
                unit(2, UnitLock::Locked, 5, 0.0),
            ],
            ..DashboardView::default()
        };
        assert_eq!(view.next_unit(), Some(1));
        assert_eq!(DashboardView::new().next_unit(), None);
    }

    #[test]
    fn engine_events_update_counters() {
        let mut view = DashboardView::new();
        let progress = UnitProgress {
            new_words_in_unit: 3,
            total_words_in_unit: 12,
        };

        view.apply_engine_event(&EngineEvent::ProgressUpdated(progress));
        view.apply_engine_event(&EngineEvent::DailyGoalUpdated(DailyGoalState {
            daily_goal_target: 5,
            daily_new_words_today: 8,
            last_celebrated_count: 5,
        }));
        view.apply_engine_event(&EngineEvent::BatchSubmitted {
            word_ids: vec![1, 2],
        });

        assert_eq!(view.last_progress(), Some(progress));
        assert_eq!(view.daily_new_count(), 8);
        assert!(view.is_stale());
    }

    #[test]
    fn refresh_follows_router_transitions() {
        let router = ScreenRouter::new(Screen::Study);
        let view = DashboardView::new();

        let back = router.show(Screen::Dashboard).unwrap();
        assert!(view.wants_refresh(&back));
        let into_study = router.show(Screen::Study).unwrap();
        assert!(!view.wants_refresh(&into_study));
    }
}
