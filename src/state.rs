//! Shared server state — the wired-together realtime core.

use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::broadcast::BroadcastRouter;
use crate::config::Config;
use crate::fanout::AdminChannel;
use crate::rooms::RoomRegistry;
use crate::session::SessionManager;
use crate::store::{DraftStore, RoomStore};

/// Shared state accessible from all handlers. Stores are injected so
/// tests run against in-memory implementations.
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub registry: RoomRegistry,
    pub router: BroadcastRouter,
    pub admin_channel: AdminChannel,
    pub drafts: Arc<dyn DraftStore>,
    pub verifier: IdentityVerifier,
    pub config: Config,
}

impl AppState {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        drafts: Arc<dyn DraftStore>,
        verifier: IdentityVerifier,
        config: Config,
    ) -> Arc<Self> {
        let sessions = Arc::new(SessionManager::new());
        let registry = RoomRegistry::new(rooms);
        let router = BroadcastRouter::new(Arc::clone(&sessions), registry.clone());
        let admin_channel = AdminChannel::new(Arc::clone(&sessions));

        Arc::new(Self {
            sessions,
            registry,
            router,
            admin_channel,
            drafts,
            verifier,
            config,
        })
    }
}
