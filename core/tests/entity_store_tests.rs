// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Behavioural tests for the in-memory entity store.
//!
//! Covers identity generation, creation defaults, patch semantics, the
//! absence of cascading deletes, and the conversation context window.

use flowone_core::domain::agent::{AgentId, AgentPatch, AgentStatus, NewAgent};
use flowone_core::domain::connection::{ConnectionType, NewConnection};
use flowone_core::domain::conversation::{ConversationId, ConversationMessage, MessageRole};
use flowone_core::domain::repository::EntityStore;
use flowone_core::infrastructure::repositories::InMemoryEntityStore;
use std::collections::HashSet;

fn tutor() -> NewAgent {
    NewAgent::new("Tutor", "patient", "You teach algebra.")
}

#[test]
fn test_created_agents_get_distinct_ids() {
    let store = InMemoryEntityStore::new();
    let ids: HashSet<AgentId> = (0..50).map(|_| store.create_agent(tutor()).id).collect();
    assert_eq!(ids.len(), 50);
    assert_eq!(store.get_all_agents().len(), 50);
}

#[test]
fn test_created_agent_has_documented_defaults() {
    let store = InMemoryEntityStore::new();
    let agent = store.create_agent(tutor());

    assert_eq!(agent.voice, "neutral");
    assert!(agent.tools.is_empty());
    assert!(agent.tags.is_empty());
    assert_eq!(agent.status, AgentStatus::Configured);
    assert_eq!(agent.created_at, agent.updated_at);
}

#[test]
fn test_update_unknown_agent_creates_nothing() {
    let store = InMemoryEntityStore::new();
    let patch = AgentPatch {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };

    assert!(store.update_agent(AgentId::new(), patch).is_none());
    assert!(store.get_all_agents().is_empty());
}

#[test]
fn test_update_preserves_identity_and_creation_time() {
    let store = InMemoryEntityStore::new();
    let agent = store.create_agent(tutor());

    // Identity keys in the JSON have no slot in the patch.
    let patch: AgentPatch = serde_json::from_value(serde_json::json!({
        "id": AgentId::new().to_string(),
        "createdAt": "2001-01-01T00:00:00Z",
        "voice": "bright",
        "status": "testing"
    }))
    .unwrap();

    let updated = store.update_agent(agent.id, patch).unwrap();
    assert_eq!(updated.id, agent.id);
    assert_eq!(updated.created_at, agent.created_at);
    assert_eq!(updated.voice, "bright");
    assert_eq!(updated.status, AgentStatus::Testing);
    assert_eq!(updated.name, "Tutor");
    assert!(updated.updated_at >= agent.updated_at);
}

#[test]
fn test_delete_twice_reports_not_found_second_time() {
    let store = InMemoryEntityStore::new();
    let agent = store.create_agent(tutor());

    assert!(store.delete_agent(agent.id));
    assert!(!store.delete_agent(agent.id));
    assert!(store.get_agent(agent.id).is_none());
}

#[test]
fn test_agent_delete_does_not_cascade() {
    let store = InMemoryEntityStore::new();
    let a = store.create_agent(tutor());
    let b = store.create_agent(NewAgent::new("Grader", "strict", "Grade answers."));
    let connection = store.create_connection(NewConnection {
        source: a.id.to_string(),
        target: b.id.to_string(),
        connection_type: ConnectionType::Conditional,
    });
    let conversation = store.create_conversation(&a.id.to_string());

    assert!(store.delete_agent(a.id));

    assert_eq!(store.get_connections(), vec![connection]);
    assert!(store.get_conversation(conversation.id).is_some());
}

#[test]
fn test_agents_listed_in_insertion_order() {
    let store = InMemoryEntityStore::new();
    let names = ["first", "second", "third"];
    for name in names {
        store.create_agent(NewAgent::new(name, "p", "s"));
    }

    let listed: Vec<String> = store.get_all_agents().into_iter().map(|a| a.name).collect();
    assert_eq!(listed, names);
}

#[test]
fn test_add_message_to_unknown_conversation_is_noop() {
    let store = InMemoryEntityStore::new();
    let conversation = store.create_conversation("agent-1");
    store.add_message(conversation.id, ConversationMessage::user("hello"));

    store.add_message(ConversationId::new(), ConversationMessage::user("lost"));

    assert_eq!(store.get_agent_conversations("agent-1").len(), 1);
    let stored = store.get_conversation(conversation.id).unwrap();
    assert_eq!(stored.messages.len(), 1);
    assert_eq!(stored.messages[0].content, "hello");
}

#[test]
fn test_context_window_is_last_ten_in_order() {
    let store = InMemoryEntityStore::new();
    let conversation = store.create_conversation("agent-1");
    for i in 0..15 {
        let message = if i % 2 == 0 {
            ConversationMessage::user(format!("m{}", i))
        } else {
            ConversationMessage::assistant(format!("m{}", i))
        };
        store.add_message(conversation.id, message);
    }

    let window = store.get_conversation(conversation.id).unwrap().context_window();
    let contents: Vec<&str> = window.iter().map(|turn| turn.content.as_str()).collect();
    assert_eq!(
        contents,
        ["m5", "m6", "m7", "m8", "m9", "m10", "m11", "m12", "m13", "m14"]
    );
    assert_eq!(window[0].role, MessageRole::Assistant);
}

#[test]
fn test_conversations_filtered_by_agent() {
    let store = InMemoryEntityStore::new();
    store.create_conversation("a");
    store.create_conversation("b");
    store.create_conversation("a");

    assert_eq!(store.get_agent_conversations("a").len(), 2);
    assert_eq!(store.get_agent_conversations("b").len(), 1);
    assert!(store.get_agent_conversations("c").is_empty());
}
