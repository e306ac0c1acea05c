use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use log::{info, warn};
use thiserror::Error;

use crate::{
    inference::{InferenceGateway, CHAT_FALLBACK},
    models::{ChatMessage, MessageSender},
    settings::ChatSettings,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("a reply to the previous message is still pending")]
    ReplyPending,

    #[error("message is empty")]
    EmptyMessage,
}

struct ChatInner {
    log: Mutex<Vec<ChatMessage>>,
    awaiting_reply: AtomicBool,
    settings: ChatSettings,
}

impl ChatInner {
    fn lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append_reply(&self, text: &str) -> ChatMessage {
        let reply = ChatMessage::new(MessageSender::Ai, &self.settings.assistant_role, text);
        self.lock().push(reply.clone());
        reply
    }
}

/// Holds the pending-reply marker for one turn. If the turn is abandoned
/// before a reply lands, dropping it answers with the fallback text so the log
/// never ends on an unanswered message.
struct PendingTurn<'a> {
    inner: &'a ChatInner,
    settled: bool,
}

impl PendingTurn<'_> {
    fn settle(mut self, text: &str) -> ChatMessage {
        self.settled = true;
        self.inner.append_reply(text)
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Chat turn abandoned before a reply arrived");
            self.inner.append_reply(CHAT_FALLBACK);
        }
        self.inner.awaiting_reply.store(false, Ordering::SeqCst);
    }
}

/// Operator chat with the central assistant; one request in flight at a time.
#[derive(Clone)]
pub struct ChatCoordinator {
    gateway: InferenceGateway,
    inner: Arc<ChatInner>,
}

impl ChatCoordinator {
    pub fn new(gateway: InferenceGateway, settings: ChatSettings) -> Self {
        Self {
            gateway,
            inner: Arc::new(ChatInner {
                log: Mutex::new(Vec::new()),
                awaiting_reply: AtomicBool::new(false),
                settings,
            }),
        }
    }

    /// Appends `text` and waits for the assistant's reply, which is returned
    /// and appended right after it. A send while another reply is pending is
    /// rejected without touching the log.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        if self
            .inner
            .awaiting_reply
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChatError::ReplyPending);
        }
        let turn = PendingTurn {
            inner: &self.inner,
            settled: false,
        };

        let history = {
            let mut log = self.inner.lock();
            let history = log.clone();
            log.push(ChatMessage::new(
                MessageSender::User,
                &self.inner.settings.operator_role,
                text,
            ));
            history
        };

        let reply = self.gateway.chat_turn(&history, text).await;
        if reply.is_fallback() {
            info!("Chat reply replaced with fallback text");
        }
        Ok(turn.settle(&reply.into_inner()))
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().clone()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.inner.awaiting_reply.load(Ordering::SeqCst)
    }
}
