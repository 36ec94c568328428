use crate::session::QuizSession;

#[derive(Debug, Clone, Default)]
pub enum BotState {
    #[default]
    Start,
    // PART FOR --- RUNNING QUIZ ---
    Quiz {
        session: QuizSession,
    },
    // PART FOR --- READING DIARY ---
    ReceivePages {
        user_id: i64,
    },
}

impl BotState {
    /// User the chat's pending flow belongs to, if any.
    pub fn owner(&self) -> Option<i64> {
        match self {
            BotState::Start => None,
            BotState::Quiz { session } => Some(session.owner()),
            BotState::ReceivePages { user_id } => Some(*user_id),
        }
    }

    /// Whether `user_id` may start a new flow without interrupting someone else's.
    pub fn is_free_for(&self, user_id: i64) -> bool {
        self.owner().map_or(true, |owner| owner == user_id)
    }
}
