use crate::router::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Enter,
    Space,
    Escape,
    Retry,
}

impl Shortcut {
    /// One line typed in the terminal. An empty line is Enter, a lone space is Space.
    pub fn from_terminal_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == " " {
            return Some(Self::Space);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Some(Self::Enter),
            "a" => Some(Self::Space),
            "q" | "esc" | "\u{1b}" => Some(Self::Escape),
            "r" => Some(Self::Retry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyAction {
    /// Reveal, or complete once revealed.
    Advance,
    ReplayAudio,
    Exit,
    RetrySubmit,
}

/// Shortcuts act on the study screen. The loading overlay only lets the learner leave.
pub fn action_for(screen: Screen, shortcut: Shortcut) -> Option<StudyAction> {
    match (screen, shortcut) {
        (Screen::Study, Shortcut::Enter) => Some(StudyAction::Advance),
        (Screen::Study, Shortcut::Space) => Some(StudyAction::ReplayAudio),
        (Screen::Study, Shortcut::Retry) => Some(StudyAction::RetrySubmit),
        (Screen::Study | Screen::Loading, Shortcut::Escape) => Some(StudyAction::Exit),
        _ => None,
    }
}

pub fn parse_terminal_input(screen: Screen, line: &str) -> Option<StudyAction> {
    Shortcut::from_terminal_line(line).and_then(|shortcut| action_for(screen, shortcut))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_only_on_study_screen() {
        assert_eq!(
            action_for(Screen::Study, Shortcut::Enter),
            Some(StudyAction::Advance)
        );
        assert_eq!(
            action_for(Screen::Study, Shortcut::Space),
            Some(StudyAction::ReplayAudio)
        );
        assert_eq!(action_for(Screen::Dashboard, Shortcut::Escape), None);
        assert_eq!(action_for(Screen::Landing, Shortcut::Enter), None);
        assert_eq!(action_for(Screen::Dashboard, Shortcut::Retry), None);
    }

    #[test]
    fn loading_overlay_only_allows_leaving() {
        assert_eq!(action_for(Screen::Loading, Shortcut::Enter), None);
        assert_eq!(action_for(Screen::Loading, Shortcut::Space), None);
        assert_eq!(
            action_for(Screen::Loading, Shortcut::Escape),
            Some(StudyAction::Exit)
        );
    }

    #[test]
    fn terminal_lines() {
        let study = Screen::Study;
        assert_eq!(parse_terminal_input(study, "\n"), Some(StudyAction::Advance));
        assert_eq!(parse_terminal_input(study, " \n"), Some(StudyAction::ReplayAudio));
        assert_eq!(parse_terminal_input(study, "A"), Some(StudyAction::ReplayAudio));
        assert_eq!(parse_terminal_input(study, "q\r\n"), Some(StudyAction::Exit));
        assert_eq!(parse_terminal_input(study, "r"), Some(StudyAction::RetrySubmit));
        assert_eq!(parse_terminal_input(study, "hello"), None);
    }

    #[test]
    fn terminal_lines_are_ignored_off_the_study_screen() {
        assert_eq!(parse_terminal_input(Screen::Dashboard, ""), None);
        assert_eq!(parse_terminal_input(Screen::Dashboard, "q"), None);
        assert_eq!(parse_terminal_input(Screen::Loading, ""), None);
        assert_eq!(parse_terminal_input(Screen::Loading, "esc"), Some(StudyAction::Exit));
    }
}
