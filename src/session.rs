//! Session manager — live connection registry.
//!
//! Tracks, per connection: the bound identity, the outbound message
//! channel, current room membership (at most one room), and admin-channel
//! enrollment. This is the only state mutated by multiple concurrent
//! connection handlers; everything lives in sharded maps, no globals.

use std::collections::HashSet;

use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::types::{Identity, Role, ServerMessage};

pub type ConnectionId = Uuid;

#[derive(Debug)]
struct Session {
    identity: Identity,
    tx: mpsc::UnboundedSender<ServerMessage>,
    room: Option<String>,
}

#[derive(Default)]
pub struct SessionManager {
    /// Live connections keyed by connection id.
    sessions: DashMap<ConnectionId, Session>,
    /// Room membership sets keyed by room id.
    rooms: DashMap<String, HashSet<ConnectionId>>,
    /// Connections enrolled in the admin fan-out channel.
    admins: DashSet<ConnectionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an identity and outbound channel to a new connection.
    /// Admin identities are enrolled in the admin channel for the
    /// connection's lifetime.
    pub fn register(
        &self,
        conn_id: ConnectionId,
        identity: Identity,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        if identity.role == Role::Admin {
            self.admins.insert(conn_id);
            info!(conn_id = %conn_id, user = %identity.email, "admin joined fan-out channel");
        }
        self.sessions.insert(
            conn_id,
            Session {
                identity,
                tx,
                room: None,
            },
        );
    }

    pub fn identity(&self, conn_id: ConnectionId) -> Option<Identity> {
        self.sessions.get(&conn_id).map(|s| s.identity.clone())
    }

    /// Record the connection as a member of `room_id`, replacing any prior
    /// membership. Call only after the room registry validated the id.
    pub fn join_room(&self, conn_id: ConnectionId, room_id: &str) {
        let prev = match self.sessions.get_mut(&conn_id) {
            Some(mut session) => session.room.replace(room_id.to_string()),
            // Connection unregistered while the join was in flight.
            None => return,
        };
        if let Some(prev) = prev {
            if prev != room_id {
                self.leave_room(&prev, conn_id);
            }
        }
        self.rooms.entry(room_id.to_string()).or_default().insert(conn_id);
        // A disconnect may have unregistered the session between the
        // room-slot update above and this insert; membership must never
        // outlive the session entry.
        if !self.sessions.contains_key(&conn_id) {
            self.leave_room(room_id, conn_id);
        }
    }

    pub fn is_member(&self, conn_id: ConnectionId, room_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .map(|members| members.contains(&conn_id))
            .unwrap_or(false)
    }

    pub fn current_room(&self, conn_id: ConnectionId) -> Option<String> {
        self.sessions.get(&conn_id).and_then(|s| s.room.clone())
    }

    /// Queue a message on one connection's outbound stream.
    /// Returns false when the connection is gone.
    pub fn send_to(&self, conn_id: ConnectionId, msg: ServerMessage) -> bool {
        match self.sessions.get(&conn_id) {
            Some(session) => session.tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Deliver a message to every room member except `sender`.
    /// Returns the number of peers reached.
    pub fn relay_to_peers(
        &self,
        room_id: &str,
        sender: ConnectionId,
        msg: &ServerMessage,
    ) -> usize {
        let Some(members) = self.rooms.get(room_id) else {
            return 0;
        };
        let mut delivered = 0;
        for &peer in members.iter() {
            if peer == sender {
                continue;
            }
            if let Some(session) = self.sessions.get(&peer) {
                if session.tx.send(msg.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Deliver a message to every enrolled admin connection.
    /// Returns the number of admins reached.
    pub fn notify_admins(&self, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        for entry in self.admins.iter() {
            let conn_id = *entry.key();
            if let Some(session) = self.sessions.get(&conn_id) {
                if session.tx.send(msg.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Remove the connection from its room and the admin channel.
    /// Safe to call for connections that never registered.
    pub fn unregister(&self, conn_id: ConnectionId) {
        self.admins.remove(&conn_id);
        if let Some((_, session)) = self.sessions.remove(&conn_id) {
            if let Some(room) = session.room {
                self.leave_room(&room, conn_id);
            }
        }
    }

    fn leave_room(&self, room_id: &str, conn_id: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room_id) {
            members.remove(&conn_id);
        }
        // Drop empty membership sets so the map doesn't grow unbounded.
        self.rooms.remove_if(room_id, |_, members| members.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> Identity {
        Identity {
            id,
            email: format!("user{id}@example.com"),
            role: Role::User,
        }
    }

    fn admin(id: i64) -> Identity {
        Identity {
            id,
            email: format!("admin{id}@example.com"),
            role: Role::Admin,
        }
    }

    fn connect(
        manager: &SessionManager,
        identity: Identity,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        manager.register(conn_id, identity, tx);
        (conn_id, rx)
    }

    #[test]
    fn a_connection_holds_one_room_at_a_time() {
        let manager = SessionManager::new();
        let (conn, _rx) = connect(&manager, user(1));

        manager.join_room(conn, "room-a");
        assert!(manager.is_member(conn, "room-a"));

        manager.join_room(conn, "room-b");
        assert!(!manager.is_member(conn, "room-a"));
        assert!(manager.is_member(conn, "room-b"));
        assert_eq!(manager.current_room(conn).as_deref(), Some("room-b"));
    }

    #[test]
    fn rejoining_the_same_room_keeps_membership() {
        let manager = SessionManager::new();
        let (conn, _rx) = connect(&manager, user(1));

        manager.join_room(conn, "room-a");
        manager.join_room(conn, "room-a");
        assert!(manager.is_member(conn, "room-a"));
    }

    #[test]
    fn unregister_clears_room_and_admin_membership() {
        let manager = SessionManager::new();
        let (conn, _rx) = connect(&manager, admin(1));
        manager.join_room(conn, "room-a");

        manager.unregister(conn);
        assert!(!manager.is_member(conn, "room-a"));
        assert!(manager.identity(conn).is_none());
        assert_eq!(manager.notify_admins(&ServerMessage::DraftDeleted { id: 1 }), 0);
    }

    #[test]
    fn unregister_before_register_is_a_no_op() {
        let manager = SessionManager::new();
        manager.unregister(Uuid::new_v4());
    }

    #[test]
    fn join_after_unregister_leaves_no_membership() {
        let manager = SessionManager::new();
        let (conn, _rx) = connect(&manager, user(1));
        manager.unregister(conn);

        manager.join_room(conn, "room-a");
        assert!(!manager.is_member(conn, "room-a"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn racing_disconnect_never_leaks_membership() {
        for _ in 0..100 {
            let manager = std::sync::Arc::new(SessionManager::new());
            let (conn, _rx) = connect(&manager, user(1));

            let joiner = {
                let manager = std::sync::Arc::clone(&manager);
                tokio::spawn(async move { manager.join_room(conn, "room-x") })
            };
            let leaver = {
                let manager = std::sync::Arc::clone(&manager);
                tokio::spawn(async move { manager.unregister(conn) })
            };
            joiner.await.unwrap();
            leaver.await.unwrap();

            // Whichever side lost the race, a dead connection id must not
            // linger in the membership set.
            assert!(!manager.is_member(conn, "room-x"));
        }
    }

    #[test]
    fn only_admins_are_enrolled_in_the_fanout_channel() {
        let manager = SessionManager::new();
        let (_user_conn, mut user_rx) = connect(&manager, user(1));
        let (_admin_conn, mut admin_rx) = connect(&manager, admin(2));

        let reached = manager.notify_admins(&ServerMessage::DraftDeleted { id: 9 });
        assert_eq!(reached, 1);
        assert!(admin_rx.try_recv().is_ok());
        assert!(user_rx.try_recv().is_err());
    }
}
