//! Admin fan-out channel.
//!
//! A standing logical group holding every live admin connection,
//! populated at session registration. Draft-lifecycle notifications are
//! pushed to current members only; connections that enroll later receive
//! no backlog.

use std::sync::Arc;

use tracing::info;

use crate::session::SessionManager;
use crate::types::{Draft, ServerMessage};

#[derive(Clone)]
pub struct AdminChannel {
    sessions: Arc<SessionManager>,
}

impl AdminChannel {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    /// Push a freshly saved draft to every live admin connection.
    pub fn notify_draft_saved(&self, draft: &Draft) {
        let reached = self.sessions.notify_admins(&ServerMessage::DraftSaved {
            draft: draft.clone(),
        });
        info!(draft_id = draft.id, admins = reached, "draft-saved fan-out");
    }

    /// Push a draft deletion to every live admin connection.
    pub fn notify_draft_deleted(&self, id: i64) {
        let reached = self
            .sessions
            .notify_admins(&ServerMessage::DraftDeleted { id });
        info!(draft_id = id, admins = reached, "draft-deleted fan-out");
    }
}
