use crate::chat::ChatSession;
use crate::models::Message;

/// What the renderer has to draw to stay on the tail of the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailUpdate {
    pub appended: Vec<Message>,
    /// The "awaiting answer" indicator just became visible.
    pub show_pending: bool,
}

impl TailUpdate {
    pub fn is_empty(&self) -> bool {
        self.appended.is_empty() && !self.show_pending
    }
}

/// Follows the end of an append-only message list.
#[derive(Debug, Default)]
pub struct TailFollower {
    shown: usize,
    pending_shown: bool,
}

impl TailFollower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything appended since the previous call.
    pub fn advance(&mut self, session: &ChatSession) -> TailUpdate {
        let start = self.shown.min(session.messages.len());
        let appended = session.messages[start..].to_vec();
        self.shown = session.messages.len();

        if !appended.is_empty() {
            self.pending_shown = false;
        }
        let show_pending = session.pending && !self.pending_shown;
        self.pending_shown = session.pending;

        TailUpdate { appended, show_pending }
    }
}
