use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info};

use crate::api::QueryService;
use crate::errors::AppError;
use crate::models::{Message, QueryRequest};

/// Assistant reply used whenever an exchange fails. The cause is only logged.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

/// How a call to [`ChatController::submit_question`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// Blank question, or another exchange still in flight. Nothing changed.
    Ignored,
    /// The service's answer was appended.
    Answered,
    /// The fallback reply was appended.
    Failed,
}

/// Ordered history plus the in-flight flag, always read together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    pub messages: Vec<Message>,
    pub pending: bool,
}

#[derive(Default)]
struct ChatState {
    session: ChatSession,
    input: String,
}

/// Chat-screen controller: one question/answer exchange at a time.
pub struct ChatController<Q> {
    service: Q,
    state: Mutex<ChatState>,
}

impl<Q: QueryService> ChatController<Q> {
    pub fn new(service: Q) -> Self {
        Self { service, state: Mutex::new(ChatState::default()) }
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().session.pending
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().session.messages.clone()
    }

    /// History and pending flag from the same instant.
    pub fn snapshot(&self) -> ChatSession {
        self.lock().session.clone()
    }

    /// Submits whatever is currently in the input buffer.
    pub async fn submit_input(&self) -> Exchange {
        let text = self.input();
        self.submit_question(&text).await
    }

    /// Appends the trimmed question, asks the service, then appends the reply.
    ///
    /// A blank question or a call made while an exchange is in flight is a
    /// no-op: the input buffer is left as it was.
    pub async fn submit_question(&self, text: &str) -> Exchange {
        let question = text.trim();
        {
            let mut state = self.lock();
            if question.is_empty() {
                return Exchange::Ignored;
            }
            if state.session.pending {
                debug!("Exchange already in flight, dropping question");
                return Exchange::Ignored;
            }
            state.session.messages.push(Message::user(question));
            state.input.clear();
            state.session.pending = true;
        }

        let request = QueryRequest::new(question);
        let (reply, exchange) = match self.ask(&request).await {
            Ok(answer) => (Message::assistant(answer), Exchange::Answered),
            Err(e) => {
                error!("Query failed: {e}");
                (Message::assistant(FALLBACK_REPLY), Exchange::Failed)
            }
        };

        let mut state = self.lock();
        state.session.messages.push(reply);
        state.session.pending = false;
        exchange
    }

    async fn ask(&self, request: &QueryRequest) -> Result<String, AppError> {
        let response = self.service.query(request).await?;
        if !response.success {
            return Err(AppError::Unexpected(
                response.message.unwrap_or_else(|| "query reported failure".to_string()),
            ));
        }
        info!(sources = response.sources.len(), "Answer received");
        Ok(response.answer)
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
