// src/live/hub.rs

//! Process-local table of live room sessions.
//!
//! Three maps, all mutated without awaiting:
//! * room id -> session entry (explicit host plus ordered players),
//! * room id -> broadcast group (every connection that joined the room),
//! * connection id -> rooms it joined, so disconnect is a direct lookup.
//!
//! Groups are keyed by room id rather than code: codes are reused once a
//! room ends, and a stale socket must not hear the next room's events.
//!
//! Nothing here survives a restart.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::events::ServerEvent;

pub type ConnectionId = Uuid;
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Handle used to push events to one connected client.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    tx: EventSender,
}

impl ConnectionHandle {
    pub fn new(tx: EventSender) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    /// Queues an event. Returns false if the client's writer is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// A connection registered in a room, with the user behind it.
#[derive(Debug, Clone)]
pub struct SessionMember {
    pub connection: ConnectionHandle,
    pub user_id: i64,
}

#[derive(Debug)]
struct RoomSession {
    host: Option<SessionMember>,
    players: Vec<SessionMember>,
}

impl RoomSession {
    fn is_empty(&self) -> bool {
        self.host.is_none() && self.players.is_empty()
    }
}

/// Outcome of registering a connection in a room.
#[derive(Debug, Clone)]
pub enum Registration {
    Host,
    /// Registered as a player; carries the host connection if one is present.
    Player { host: Option<ConnectionHandle> },
}

/// Read-only view of a room's session entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub host_user: Option<i64>,
    pub host_connection: Option<ConnectionId>,
    pub player_users: Vec<i64>,
}

#[derive(Default)]
pub struct SessionHub {
    sessions: DashMap<i64, RoomSession>,
    groups: DashMap<i64, Vec<ConnectionHandle>>,
    memberships: DashMap<ConnectionId, Vec<i64>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `connection` for `user_id` in the room.
    ///
    /// `is_host` must come from the room's owner, not from connection order.
    /// Finding the host and appending happen under the room's entry lock, so
    /// two simultaneous first connections cannot both become host.
    pub fn register(
        &self,
        connection: &ConnectionHandle,
        user_id: i64,
        room_id: i64,
        is_host: bool,
    ) -> Registration {
        {
            let mut group = self.groups.entry(room_id).or_default();
            if !group.iter().any(|c| c.id == connection.id) {
                group.push(connection.clone());
            }
        }

        {
            let mut rooms = self.memberships.entry(connection.id).or_default();
            if !rooms.contains(&room_id) {
                rooms.push(room_id);
            }
        }

        let member = SessionMember {
            connection: connection.clone(),
            user_id,
        };

        let mut session = self.sessions.entry(room_id).or_insert_with(|| RoomSession {
            host: None,
            players: Vec::new(),
        });

        if is_host {
            session.host = Some(member);
            Registration::Host
        } else {
            if !session.players.iter().any(|m| m.connection.id == connection.id) {
                session.players.push(member);
            }
            Registration::Player {
                host: session.host.as_ref().map(|h| h.connection.clone()),
            }
        }
    }

    /// The host connection of a room, if the host is connected.
    pub fn host_of(&self, room_id: i64) -> Option<ConnectionHandle> {
        self.sessions
            .get(&room_id)
            .and_then(|s| s.host.as_ref().map(|h| h.connection.clone()))
    }

    /// Sends `event` to every connection in the room's group except
    /// `sender`. Returns how many connections it was queued for.
    pub fn broadcast(&self, room_id: i64, sender: ConnectionId, event: &ServerEvent) -> usize {
        let targets: Vec<ConnectionHandle> = match self.groups.get(&room_id) {
            Some(group) => group.iter().filter(|c| c.id != sender).cloned().collect(),
            None => return 0,
        };

        targets
            .iter()
            .filter(|c| {
                let queued = c.send(event.clone());
                if !queued {
                    debug!(connection = %c.id, "skipping closed connection");
                }
                queued
            })
            .count()
    }

    /// Forgets a connection everywhere.
    ///
    /// Rooms left without connections are dropped. If the connection was a
    /// room's host, that room's session entry is dropped as well; players
    /// stay in the broadcast group until they disconnect.
    pub fn remove_connection(&self, connection_id: ConnectionId) {
        let Some((_, rooms)) = self.memberships.remove(&connection_id) else {
            return;
        };

        for room_id in rooms {
            if let Some(mut group) = self.groups.get_mut(&room_id) {
                group.retain(|c| c.id != connection_id);
            }
            self.groups.remove_if(&room_id, |_, group| group.is_empty());

            let mut drop_session = false;
            if let Some(mut session) = self.sessions.get_mut(&room_id) {
                let was_host = session
                    .host
                    .as_ref()
                    .is_some_and(|h| h.connection.id == connection_id);
                if was_host {
                    drop_session = true;
                } else {
                    session.players.retain(|m| m.connection.id != connection_id);
                }
            }

            if drop_session {
                self.sessions.remove(&room_id);
                debug!(room_id, "host left, session entry dropped");
            } else {
                self.sessions.remove_if(&room_id, |_, session| session.is_empty());
            }
        }
    }

    /// Forgets an ended room: its session entry and broadcast group.
    /// Connections stay open and may join another room.
    pub fn close_room(&self, room_id: i64) {
        self.sessions.remove(&room_id);
        self.groups.remove(&room_id);
        for mut rooms in self.memberships.iter_mut() {
            rooms.retain(|id| *id != room_id);
        }
        debug!(room_id, "room closed, live state dropped");
    }

    /// Diagnostics: a copy of the room's session entry.
    pub fn snapshot(&self, room_id: i64) -> Option<SessionSnapshot> {
        self.sessions.get(&room_id).map(|s| SessionSnapshot {
            host_user: s.host.as_ref().map(|h| h.user_id),
            host_connection: s.host.as_ref().map(|h| h.connection.id),
            player_users: s.players.iter().map(|m| m.user_id).collect(),
        })
    }

    /// Diagnostics: how many connections hear the room's broadcasts.
    pub fn group_size(&self, room_id: i64) -> usize {
        self.groups.get(&room_id).map_or(0, |g| g.len())
    }

    /// Diagnostics: rooms with a live session entry.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> (ConnectionHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    #[test]
    fn test_host_then_player() {
        let hub = SessionHub::new();
        let (host, _host_rx) = connection();
        let (player, _player_rx) = connection();

        assert!(matches!(hub.register(&host, 1, 10, true), Registration::Host));

        match hub.register(&player, 2, 10, false) {
            Registration::Player { host: Some(h) } => assert_eq!(h.id, host.id),
            other => panic!("unexpected registration: {other:?}"),
        }

        let snap = hub.snapshot(10).unwrap();
        assert_eq!(snap.host_user, Some(1));
        assert_eq!(snap.player_users, vec![2]);
        assert_eq!(hub.group_size(10), 2);
    }

    #[test]
    fn test_player_before_host_has_no_host() {
        let hub = SessionHub::new();
        let (player, _rx) = connection();

        assert!(matches!(
            hub.register(&player, 2, 10, false),
            Registration::Player { host: None }
        ));
        assert_eq!(hub.snapshot(10).unwrap().host_user, None);
    }

    #[test]
    fn test_reconnecting_host_replaces_host_entry() {
        let hub = SessionHub::new();
        let (first, _rx1) = connection();
        let (second, _rx2) = connection();

        hub.register(&first, 1, 10, true);
        hub.register(&second, 1, 10, true);

        assert_eq!(hub.host_of(10).unwrap().id, second.id);
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let hub = SessionHub::new();
        let (host, mut host_rx) = connection();
        let (a, mut a_rx) = connection();
        let (b, mut b_rx) = connection();
        hub.register(&host, 1, 10, true);
        hub.register(&a, 2, 10, false);
        hub.register(&b, 3, 10, false);

        let sent = hub.broadcast(10, host.id, &ServerEvent::EndQuestion);
        assert_eq!(sent, 2);
        assert!(host_rx.try_recv().is_err());
        assert_eq!(a_rx.try_recv().unwrap(), ServerEvent::EndQuestion);
        assert_eq!(b_rx.try_recv().unwrap(), ServerEvent::EndQuestion);
    }

    #[test]
    fn test_broadcast_is_scoped_to_room() {
        let hub = SessionHub::new();
        let (host, _host_rx) = connection();
        let (other, mut other_rx) = connection();
        hub.register(&host, 1, 10, true);
        hub.register(&other, 5, 11, false);

        assert_eq!(hub.broadcast(10, host.id, &ServerEvent::EndQuiz), 0);
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn test_player_disconnect_keeps_room() {
        let hub = SessionHub::new();
        let (host, _host_rx) = connection();
        let (player, _rx) = connection();
        hub.register(&host, 1, 10, true);
        hub.register(&player, 2, 10, false);

        hub.remove_connection(player.id);

        let snap = hub.snapshot(10).unwrap();
        assert_eq!(snap.host_user, Some(1));
        assert!(snap.player_users.is_empty());
        assert_eq!(hub.group_size(10), 1);
    }

    #[test]
    fn test_host_disconnect_drops_session_entry() {
        let hub = SessionHub::new();
        let (host, _host_rx) = connection();
        let (player, mut player_rx) = connection();
        hub.register(&host, 1, 10, true);
        hub.register(&player, 2, 10, false);

        hub.remove_connection(host.id);

        assert!(hub.snapshot(10).is_none());
        assert!(hub.host_of(10).is_none());
        // The player still hears room broadcasts.
        assert_eq!(hub.group_size(10), 1);
        hub.broadcast(10, Uuid::new_v4(), &ServerEvent::EndQuiz);
        assert_eq!(player_rx.try_recv().unwrap(), ServerEvent::EndQuiz);
    }

    #[test]
    fn test_last_disconnect_clears_everything() {
        let hub = SessionHub::new();
        let (player, _rx) = connection();
        hub.register(&player, 2, 10, false);

        hub.remove_connection(player.id);

        assert_eq!(hub.session_count(), 0);
        assert_eq!(hub.group_size(10), 0);
        // Unknown connections are a no-op.
        hub.remove_connection(player.id);
    }

    #[test]
    fn test_duplicate_register_is_idempotent() {
        let hub = SessionHub::new();
        let (player, _rx) = connection();
        hub.register(&player, 2, 10, false);
        hub.register(&player, 2, 10, false);

        assert_eq!(hub.snapshot(10).unwrap().player_users, vec![2]);
        assert_eq!(hub.group_size(10), 1);
    }

    #[test]
    fn test_close_room_forgets_session_and_group() {
        let hub = SessionHub::new();
        let (host, _host_rx) = connection();
        let (player, mut player_rx) = connection();
        hub.register(&host, 1, 10, true);
        hub.register(&player, 2, 10, false);

        hub.close_room(10);

        assert!(hub.snapshot(10).is_none());
        assert_eq!(hub.group_size(10), 0);
        assert_eq!(hub.broadcast(10, host.id, &ServerEvent::EndQuiz), 0);
        assert!(player_rx.try_recv().is_err());

        // A later room reusing the connection works normally.
        hub.register(&player, 2, 11, false);
        assert_eq!(hub.group_size(11), 1);
        hub.remove_connection(player.id);
        assert_eq!(hub.session_count(), 0);
    }
}
