use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const TRANSITION_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Screen {
    Landing,
    Dashboard,
    Study,
    /// Overlay while a batch is fetched.
    Loading,
}

impl Screen {
    fn is_study(&self) -> bool {
        matches!(self, Self::Study | Self::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenTransition {
    pub from: Screen,
    pub to: Screen,
    pub refresh_dashboard: bool,
}

/// Top-level view switch. Showing a screen never does I/O; listeners get a
/// [`ScreenTransition`] and decide what to reload.
pub struct ScreenRouter {
    current: Mutex<Screen>,
    transitions: broadcast::Sender<ScreenTransition>,
}

impl ScreenRouter {
    pub fn new(initial: Screen) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            current: Mutex::new(initial),
            transitions,
        }
    }

    pub fn current(&self) -> Screen {
        *self.current.lock()
    }

    /// Returns the transition, or `None` when `to` is already showing.
    pub fn show(&self, to: Screen) -> Option<ScreenTransition> {
        let transition = {
            let mut current = self.current.lock();
            if *current == to {
                return None;
            }
            let from = std::mem::replace(&mut *current, to);
            ScreenTransition {
                from,
                to,
                refresh_dashboard: to == Screen::Dashboard,
            }
        };

        debug!(from = ?transition.from, to = ?transition.to, "screen transition");
        let _ = self.transitions.send(transition);
        Some(transition)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScreenTransition> {
        self.transitions.subscribe()
    }

    /// Dashboard data is not reloaded while the learner is studying.
    pub fn dashboard_refresh_suspended(&self) -> bool {
        self.current().is_study()
    }
}

impl Default for ScreenRouter {
    fn default() -> Self {
        Self::new(Screen::Landing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_screen_is_not_a_transition() {
        let router = ScreenRouter::new(Screen::Dashboard);
        assert_eq!(router.show(Screen::Dashboard), None);
    }

    #[tokio::test]
    async fn leaving_study_requests_a_refresh() {
        let router = ScreenRouter::new(Screen::Dashboard);
        let mut rx = router.subscribe();

        router.show(Screen::Loading);
        router.show(Screen::Study);
        assert!(router.dashboard_refresh_suspended());
        router.show(Screen::Dashboard);

        let seen: Vec<_> = (0..3).map(|_| rx.try_recv().unwrap()).collect();
        assert_eq!(seen[0].to, Screen::Loading);
        assert!(!seen[0].refresh_dashboard);
        assert!(!seen[1].refresh_dashboard);
        assert_eq!(seen[2].from, Screen::Study);
        assert!(seen[2].refresh_dashboard);
        assert!(!router.dashboard_refresh_suspended());
    }
}
