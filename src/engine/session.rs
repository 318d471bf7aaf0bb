use crate::model::{Card, CardId, CourseId, StudyMode, UnitId, UserId, WordId};

/// In-memory state of one batch. Cards are fixed for the batch; the cursor
/// only moves forward.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    mode: StudyMode,
    unit_id: Option<UnitId>,
    user_id: UserId,
    course_id: CourseId,
    cards: Vec<Card>,
    current_index: usize,
    revealed: bool,
    completed: Vec<CardId>,
    step: Option<u32>,
}

impl Session {
    pub fn new(
        mode: StudyMode,
        unit_id: Option<UnitId>,
        user_id: UserId,
        course_id: CourseId,
        cards: Vec<Card>,
        step: Option<u32>,
    ) -> Self {
        Self {
            mode,
            unit_id,
            user_id,
            course_id,
            cards,
            current_index: 0,
            revealed: false,
            completed: Vec::new(),
            step,
        }
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    pub fn unit_id(&self) -> Option<UnitId> {
        self.unit_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn step(&self) -> Option<u32> {
        self.step
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.current_index)
    }

    /// `(index, total)` for the position dots.
    pub fn position(&self) -> (usize, usize) {
        (self.current_index, self.cards.len())
    }

    pub fn is_last_card(&self) -> bool {
        self.current_index + 1 >= self.cards.len()
    }

    pub fn reveal(&mut self) -> bool {
        if self.revealed || self.current_card().is_none() {
            return false;
        }
        self.revealed = true;
        true
    }

    /// Records the current card. Only a revealed card can be completed, and a
    /// card id is recorded once per batch.
    pub fn complete_current(&mut self) -> Option<CardId> {
        if !self.revealed {
            return None;
        }
        let id = self.current_card()?.id;
        if !self.completed.contains(&id) {
            self.completed.push(id);
        }
        Some(id)
    }

    /// Moves to the next card. Returns `false` on the last card.
    pub fn advance(&mut self) -> bool {
        if self.is_last_card() {
            return false;
        }
        self.current_index += 1;
        self.revealed = false;
        true
    }

    pub fn completed(&self) -> &[CardId] {
        &self.completed
    }

    pub fn completed_word_ids(&self) -> Vec<WordId> {
        self.completed.iter().filter_map(CardId::word_id).collect()
    }
}
