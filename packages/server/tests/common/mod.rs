//! Shared harness for the integration tests.
//!
//! Wires the whole hub with in-memory adapters and a manual clock, the same way the
//! server binary wires it with real ones.

#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use coachlive_server::{
    domain::{UserId, UserRecord},
    infrastructure::{
        auth::{InMemoryUserDirectory, JwtTokenVerifier},
        dto::websocket::OutboundMessage,
        message_pusher::WebSocketMessagePusher,
        post_owner::InMemoryPostOwnerResolver,
        repository::{InMemoryEphemeralStore, InMemoryRoomDirectory},
        scoring::HeuristicFormScorer,
    },
    ui::Server,
    usecase::{
        AuthenticateConnectionUseCase, ConnectParticipantUseCase, GetChatHistoryUseCase,
        GetHeartRateHistoryUseCase, GetRoomMembersUseCase, RouteHandlers, SessionHub,
    },
};
use coachlive_shared::time::ManualClock;
use jsonwebtoken::{EncodingKey, Header, encode};
use tokio::sync::mpsc;

pub const SECRET: &str = "integration-secret";
pub const START: i64 = 1_700_000_000_000;
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub directory: Arc<InMemoryRoomDirectory>,
    pub store: Arc<InMemoryEphemeralStore>,
    pub hub: Arc<SessionHub>,
    pub room_members: Arc<GetRoomMembersUseCase>,
    pub chat_history: Arc<GetChatHistoryUseCase>,
    pub heart_rate_history: Arc<GetHeartRateHistoryUseCase>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let store = Arc::new(InMemoryEphemeralStore::new(clock.clone()));
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let directory = Arc::new(InMemoryRoomDirectory::new(pusher.clone()));

        let users = InMemoryUserDirectory::from_records([
            user("alice", "Alice", true),
            user("bob", "Bob", true),
            user("coach", "Coach Kim", true),
            user("owner", "Post Owner", true),
            user("retired", "Retired", false),
        ]);
        let owners = HashMap::from([(
            "post-1".to_string(),
            UserId::new("owner".to_string()).unwrap(),
        )]);

        let authenticate = Arc::new(AuthenticateConnectionUseCase::new(
            Arc::new(JwtTokenVerifier::new(SECRET)),
            Arc::new(users),
            Duration::from_secs(5),
        ));
        let connect = Arc::new(ConnectParticipantUseCase::new(
            directory.clone(),
            pusher.clone(),
            clock.clone(),
        ));
        let handlers = RouteHandlers::new(
            directory.clone(),
            pusher,
            store.clone(),
            Arc::new(HeuristicFormScorer::new(clock.clone())),
            Arc::new(InMemoryPostOwnerResolver::new(owners)),
            clock.clone(),
        );

        Self {
            clock,
            hub: Arc::new(SessionHub::new(authenticate, connect, handlers)),
            room_members: Arc::new(GetRoomMembersUseCase::new(directory.clone())),
            chat_history: Arc::new(GetChatHistoryUseCase::new(
                directory.clone(),
                store.clone(),
            )),
            heart_rate_history: Arc::new(GetHeartRateHistoryUseCase::new(store.clone())),
            directory,
            store,
        }
    }

    pub fn server(&self) -> Server {
        Server::new(
            self.hub.clone(),
            self.room_members.clone(),
            self.chat_history.clone(),
            self.heart_rate_history.clone(),
        )
    }
}

fn user(id: &str, name: &str, active: bool) -> UserRecord {
    UserRecord {
        id: UserId::new(id.to_string()).unwrap(),
        name: name.to_string(),
        avatar: None,
        active,
    }
}

/// Sign a token for `sub` that expires one hour from now
pub fn token_for(sub: &str) -> String {
    sign(sub, SECRET, Utc::now().timestamp() + 3600)
}

pub fn sign(sub: &str, secret: &str, exp: i64) -> String {
    encode(
        &Header::default(),
        &serde_json::json!({"sub": sub, "exp": exp}),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Take every frame queued on the channel
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<OutboundMessage> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(serde_json::from_str(&frame).unwrap());
    }
    frames
}
