// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Notification Hub - Pub/Sub with per-agent rooms
//
// One tokio broadcast channel carries every addressed delivery. Room
// recipients are resolved from the client registry when an event is
// published, so joins and leaves only affect later events. Delivery is
// at-most-once: nothing is stored, a client that is not connected misses the
// event, and a subscriber that falls behind the channel capacity loses the
// overflow.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::events::{
    agent_room, payload_agent_id, ClientEvent, ClientId, FanoutScope, ServerEvent,
};

/// Clients an event was addressed to, fixed at publish time
#[derive(Debug, Clone)]
pub enum Recipients {
    All,
    Only(Arc<HashSet<ClientId>>),
}

impl Recipients {
    pub fn contains(&self, client_id: &ClientId) -> bool {
        match self {
            Recipients::All => true,
            Recipients::Only(ids) => ids.contains(client_id),
        }
    }
}

/// A server event together with who should receive it
#[derive(Debug, Clone)]
pub struct Delivery {
    pub scope: FanoutScope,
    pub recipients: Recipients,
    pub event: ServerEvent,
}

/// Rooms a client has joined. Shared between the socket's read half and the
/// hub's registry so joins take effect for the next publish.
#[derive(Debug, Clone, Default)]
pub struct Membership(Arc<RwLock<HashSet<String>>>);

impl Membership {
    pub fn join(&self, room: String) -> bool {
        self.0.write().insert(room)
    }

    pub fn leave(&self, room: &str) -> bool {
        self.0.write().remove(room)
    }

    pub fn contains(&self, room: &str) -> bool {
        self.0.read().contains(room)
    }

    pub fn rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.0.read().iter().cloned().collect();
        rooms.sort();
        rooms
    }
}

/// Identity and room membership of one connected client
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub client_id: ClientId,
    pub membership: Membership,
}

type Registry = Arc<RwLock<HashMap<ClientId, Membership>>>;

/// Hub for relaying canvas events between connected clients
#[derive(Clone)]
pub struct NotificationHub {
    sender: Arc<broadcast::Sender<Delivery>>,
    clients: Registry,
}

impl NotificationHub {
    /// Create a hub buffering at most `capacity` undelivered events
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
            clients: Arc::default(),
        }
    }

    /// Create hub with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Register a new client with no rooms joined
    pub fn subscribe(&self) -> Subscription {
        let session = ClientSession {
            client_id: ClientId::new(),
            membership: Membership::default(),
        };
        let receiver = self.sender.subscribe();
        self.clients
            .write()
            .insert(session.client_id, session.membership.clone());
        debug!(client_id = %session.client_id, "Client subscribed");
        Subscription {
            session,
            receiver,
            clients: self.clients.clone(),
        }
    }

    /// Handle one event sent by a client.
    ///
    /// Join/leave only touch the sender's membership. Everything else is
    /// relayed with the scope fixed for its event type. Returns the scope
    /// used, or `None` when nothing was published.
    pub fn dispatch(&self, session: &ClientSession, event: ClientEvent) -> Option<FanoutScope> {
        let client_id = session.client_id;
        match event {
            ClientEvent::JoinAgent(agent_id) => {
                let room = agent_room(&agent_id.to_string());
                info!(%client_id, room = %room, "Client joined room");
                session.membership.join(room);
                None
            }
            ClientEvent::LeaveAgent(agent_id) => {
                let room = agent_room(&agent_id.to_string());
                info!(%client_id, room = %room, "Client left room");
                session.membership.leave(&room);
                None
            }
            ClientEvent::AgentUpdated(payload) => {
                let Some(agent_id) = payload_agent_id(&payload) else {
                    warn!(%client_id, "agent-updated without agentId dropped");
                    return None;
                };
                info!(%client_id, agent_id = %agent_id, "Agent updated");
                Some(self.publish(
                    FanoutScope::Room(agent_room(&agent_id)),
                    ServerEvent::AgentChanged(payload),
                ))
            }
            ClientEvent::AgentCreated(payload) => {
                info!(%client_id, "Agent created");
                Some(self.publish(FanoutScope::Everyone, ServerEvent::AgentCreated(payload)))
            }
            ClientEvent::AgentDeleted(payload) => {
                info!(%client_id, "Agent deleted");
                Some(self.publish(FanoutScope::Everyone, ServerEvent::AgentDeleted(payload)))
            }
            ClientEvent::PersonaChanged(payload) => {
                info!(%client_id, "Persona changed");
                Some(self.publish(FanoutScope::Everyone, ServerEvent::PersonaChanged(payload)))
            }
            ClientEvent::VoiceChunk(payload) => {
                let Some(agent_id) = payload_agent_id(&payload) else {
                    warn!(%client_id, "voice-chunk without agentId dropped");
                    return None;
                };
                Some(self.publish(
                    FanoutScope::RoomExcept {
                        room: agent_room(&agent_id),
                        sender: client_id,
                    },
                    ServerEvent::VoiceResponse(payload),
                ))
            }
        }
    }

    /// Publish an event to the given scope. Room scopes address the
    /// clients that are members at this moment.
    pub fn publish(&self, scope: FanoutScope, event: ServerEvent) -> FanoutScope {
        let recipients = self.resolve(&scope);
        debug!(event = event.name(), ?scope, "Publishing event");

        if let Recipients::Only(ids) = &recipients {
            if ids.is_empty() {
                debug!("No room members for event");
                return scope;
            }
        }

        let receiver_count = self
            .sender
            .send(Delivery {
                scope: scope.clone(),
                recipients,
                event,
            })
            .unwrap_or(0);

        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
        scope
    }

    fn resolve(&self, scope: &FanoutScope) -> Recipients {
        let (room, skip) = match scope {
            FanoutScope::Everyone => return Recipients::All,
            FanoutScope::Room(room) => (room, None),
            FanoutScope::RoomExcept { room, sender } => (room, Some(*sender)),
        };

        let ids = self
            .clients
            .read()
            .iter()
            .filter(|(id, membership)| Some(**id) != skip && membership.contains(room))
            .map(|(id, _)| *id)
            .collect();
        Recipients::Only(Arc::new(ids))
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiving end for one client. Leaves the registry when dropped.
pub struct Subscription {
    session: ClientSession,
    receiver: broadcast::Receiver<Delivery>,
    clients: Registry,
}

impl Subscription {
    pub fn client_id(&self) -> ClientId {
        self.session.client_id
    }

    /// Handle for dispatching this client's own events
    pub fn session(&self) -> ClientSession {
        self.session.clone()
    }

    /// Wait for the next event addressed to this client
    pub async fn recv(&mut self) -> Result<ServerEvent, EventBusError> {
        loop {
            let delivery = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => EventBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!(client_id = %self.session.client_id, "Subscriber lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if delivery.recipients.contains(&self.session.client_id) {
                return Ok(delivery.event);
            }
        }
    }

    /// Take the next addressed event without waiting
    pub fn try_recv(&mut self) -> Result<ServerEvent, EventBusError> {
        loop {
            let delivery = self.receiver.try_recv().map_err(|e| match e {
                broadcast::error::TryRecvError::Empty => EventBusError::Empty,
                broadcast::error::TryRecvError::Closed => EventBusError::Closed,
                broadcast::error::TryRecvError::Lagged(n) => {
                    warn!(client_id = %self.session.client_id, "Subscriber lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if delivery.recipients.contains(&self.session.client_id) {
                return Ok(delivery.event);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.clients.write().remove(&self.session.client_id);
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Notification hub is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::RoomKey;
    use serde_json::json;

    fn join(hub: &NotificationHub, sub: &Subscription, agent_id: &str) {
        hub.dispatch(
            &sub.session(),
            ClientEvent::JoinAgent(RoomKey::Text(agent_id.to_string())),
        );
    }

    #[tokio::test]
    async fn test_agent_updated_reaches_only_joined_room() {
        let hub = NotificationHub::new(16);
        let sender = hub.subscribe();
        let mut in_room = hub.subscribe();
        let mut other_room = hub.subscribe();
        join(&hub, &in_room, "42");
        join(&hub, &other_room, "7");

        let scope = hub.dispatch(
            &sender.session(),
            ClientEvent::AgentUpdated(json!({"agentId": "42", "name": "Tutor"})),
        );
        assert_eq!(scope, Some(FanoutScope::Room("agent-42".to_string())));

        let received = in_room.recv().await.unwrap();
        assert_eq!(
            received,
            ServerEvent::AgentChanged(json!({"agentId": "42", "name": "Tutor"}))
        );
        assert_eq!(other_room.try_recv(), Err(EventBusError::Empty));
    }

    #[tokio::test]
    async fn test_broadcast_events_reach_everyone() {
        let hub = NotificationHub::new(16);
        let sender = hub.subscribe();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 3);

        hub.dispatch(&sender.session(), ClientEvent::AgentCreated(json!({"id": "a1"})));
        hub.dispatch(
            &sender.session(),
            ClientEvent::PersonaChanged(json!({"agentId": "a1", "persona": "calm"})),
        );
        hub.dispatch(&sender.session(), ClientEvent::AgentDeleted(json!({"agentId": "a1"})));

        for sub in [&mut first, &mut second] {
            assert_eq!(sub.recv().await.unwrap().name(), "agent-created");
            assert_eq!(sub.recv().await.unwrap().name(), "persona-changed");
            assert_eq!(sub.recv().await.unwrap().name(), "agent-deleted");
        }
    }

    #[tokio::test]
    async fn test_voice_chunk_excludes_sender() {
        let hub = NotificationHub::new(16);
        let mut speaker = hub.subscribe();
        let mut listener = hub.subscribe();
        join(&hub, &speaker, "9");
        join(&hub, &listener, "9");

        hub.dispatch(
            &speaker.session(),
            ClientEvent::VoiceChunk(json!({"agentId": "9", "chunk": "AAAA"})),
        );

        assert_eq!(
            listener.recv().await.unwrap(),
            ServerEvent::VoiceResponse(json!({"agentId": "9", "chunk": "AAAA"}))
        );
        assert_eq!(speaker.try_recv(), Err(EventBusError::Empty));
    }

    #[tokio::test]
    async fn test_leave_stops_room_delivery() {
        let hub = NotificationHub::new(16);
        let sender = hub.subscribe();
        let mut sub = hub.subscribe();
        join(&hub, &sub, "42");
        hub.dispatch(
            &sub.session(),
            ClientEvent::LeaveAgent(RoomKey::Text("42".to_string())),
        );
        assert!(sub.session().membership.rooms().is_empty());

        hub.dispatch(&sender.session(), ClientEvent::AgentUpdated(json!({"agentId": "42"})));
        assert_eq!(sub.try_recv(), Err(EventBusError::Empty));
    }

    #[test]
    fn test_room_members_fixed_at_publish() {
        let hub = NotificationHub::new(16);
        let sender = hub.subscribe();
        let mut early = hub.subscribe();
        let mut late = hub.subscribe();
        join(&hub, &early, "42");

        hub.dispatch(&sender.session(), ClientEvent::AgentUpdated(json!({"agentId": "42"})));
        join(&hub, &late, "42");
        hub.dispatch(
            &early.session(),
            ClientEvent::LeaveAgent(RoomKey::Text("42".to_string())),
        );

        assert_eq!(
            early.try_recv(),
            Ok(ServerEvent::AgentChanged(json!({"agentId": "42"})))
        );
        assert_eq!(late.try_recv(), Err(EventBusError::Empty));
    }

    #[test]
    fn test_dropped_subscription_leaves_registry() {
        let hub = NotificationHub::new(16);
        let sub = hub.subscribe();
        join(&hub, &sub, "1");
        assert_eq!(hub.clients.read().len(), 1);
        drop(sub);
        assert!(hub.clients.read().is_empty());
    }

    #[test]
    fn test_missing_agent_id_is_dropped() {
        let hub = NotificationHub::new(16);
        let sender = hub.subscribe();
        assert_eq!(
            hub.dispatch(&sender.session(), ClientEvent::AgentUpdated(json!({"name": "x"}))),
            None
        );
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let hub = NotificationHub::new(16);
        let sender = hub.subscribe();
        hub.dispatch(&sender.session(), ClientEvent::AgentCreated(json!({"id": "a"})));

        let mut late = hub.subscribe();
        assert_eq!(late.try_recv(), Err(EventBusError::Empty));
    }

    #[test]
    fn test_lagged_subscriber_reports_loss() {
        let hub = NotificationHub::new(2);
        let sender = hub.subscribe();
        let mut slow = hub.subscribe();
        for i in 0..5 {
            hub.dispatch(&sender.session(), ClientEvent::AgentCreated(json!({"n": i})));
        }
        assert_eq!(slow.try_recv(), Err(EventBusError::Lagged(3)));
        assert_eq!(slow.try_recv().unwrap(), ServerEvent::AgentCreated(json!({"n": 3})));
    }
}
