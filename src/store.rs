use dashmap::DashMap;
use teloxide::types::{ChatId, MessageId};
use uuid::Uuid;

use crate::session::{TestOutcome, TestSession};

/// Test sessions keyed by chat. A chat holds at most one session; every
/// mutation runs under the map's per-key lock, which is what serializes a
/// timeout against a user finishing the same test.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<ChatId, TestSession>,
}

/// What the caller needs to render the end of a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub outcome: TestOutcome,
    pub screen: Option<MessageId>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a fresh session, discarding (and cancelling) whatever the
    /// chat had before.
    pub fn begin(&self, chat_id: ChatId, session: TestSession) {
        if let Some(previous) = self.sessions.insert(chat_id, session) {
            log::debug!("{}: replacing session {}", chat_id.0, previous.id());
        }
    }

    pub fn with<R>(&self, chat_id: ChatId, f: impl FnOnce(&mut TestSession) -> R) -> Option<R> {
        self.sessions.get_mut(&chat_id).map(|mut session| f(&mut session))
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.sessions.contains_key(&chat_id)
    }

    /// Whether `session_id` is the chat's session and has not finished yet.
    pub fn is_running(&self, chat_id: ChatId, session_id: Uuid) -> bool {
        self.sessions
            .get(&chat_id)
            .is_some_and(|session| session.id() == session_id && !session.is_finished())
    }

    /// Finishes session `session_id` if it is still the chat's session and
    /// still running. Returns `None` to everyone but the first caller.
    pub fn finish(&self, chat_id: ChatId, session_id: Uuid, timed_out: bool) -> Option<Finished> {
        let mut session = self.sessions.get_mut(&chat_id)?;
        if session.id() != session_id || !session.finish(timed_out) {
            return None;
        }
        Some(Finished {
            outcome: session.outcome(),
            screen: session.screen(),
        })
    }

    /// Drops the chat's session. Its timer is cancelled on drop.
    pub fn remove(&self, chat_id: ChatId) -> Option<TestSession> {
        self.sessions.remove(&chat_id).map(|(_, session)| session)
    }
}
