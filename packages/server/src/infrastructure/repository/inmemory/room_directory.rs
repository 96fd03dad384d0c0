//! InMemory Room Directory 実装
//!
//! Room ID → 接続 ID の集合と、接続 ID → 所属 Room の集合を 1 つの Mutex で守ります。
//! 両者は常に双対で、どちらか片方だけが更新されることはありません。
//!
//! ## 配信
//!
//! `broadcast` はロックを保持したままメンバーのスナップショットを取り、MessagePusher に渡します。
//! MessagePusher の送信はブロックしないチャンネル送信なので、ロック保持時間は短く済みます。
//! ロックの順序は常に Directory → MessagePusher です。
//!
//! 個人 Room の定員は常に 1 です。同じユーザーの 2 本目の接続は個人 Room に参加できません。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, DirectoryError, MessagePusher, RoomDirectory, RoomId, RoomKind, ServerEvent,
    UserId, UserProfile,
};

/// セッション Room とチャレンジ Room の既定の定員
pub const DEFAULT_ROOM_CAPACITY: usize = 100;

struct Registration {
    user: UserProfile,
    rooms: HashSet<RoomId>,
}

#[derive(Default)]
struct DirectoryState {
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
    connections: HashMap<ConnectionId, Registration>,
}

impl DirectoryState {
    fn targets(&self, room_id: &RoomId, exclude: Option<&ConnectionId>) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| Some(*id) != exclude)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// インメモリ Room Directory 実装
pub struct InMemoryRoomDirectory {
    state: Mutex<DirectoryState>,
    message_pusher: Arc<dyn MessagePusher>,
    room_capacity: usize,
}

impl InMemoryRoomDirectory {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self::with_capacity(message_pusher, DEFAULT_ROOM_CAPACITY)
    }

    /// セッション Room とチャレンジ Room の定員を指定して作成
    pub fn with_capacity(message_pusher: Arc<dyn MessagePusher>, room_capacity: usize) -> Self {
        Self {
            state: Mutex::new(DirectoryState::default()),
            message_pusher,
            room_capacity,
        }
    }

    /// 現在存在する（メンバーが 1 人以上いる）Room の数
    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn register(
        &self,
        connection_id: ConnectionId,
        user: UserProfile,
    ) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().await;
        if state.connections.contains_key(&connection_id) {
            return Err(DirectoryError::AlreadyRegistered(connection_id.to_string()));
        }
        state.connections.insert(
            connection_id,
            Registration {
                user,
                rooms: HashSet::new(),
            },
        );
        Ok(())
    }

    async fn join(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<bool, DirectoryError> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let registration = state
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| DirectoryError::ConnectionNotRegistered(connection_id.to_string()))?;
        if registration.rooms.contains(room_id) {
            return Ok(false);
        }

        let members = state.rooms.get(room_id).map(HashSet::len).unwrap_or(0);
        let capacity = match room_id.kind() {
            RoomKind::Personal => 1,
            RoomKind::Session | RoomKind::Challenge => self.room_capacity,
        };
        if members >= capacity {
            return Err(DirectoryError::RoomCapacityExceeded(room_id.to_string()));
        }

        registration.rooms.insert(room_id.clone());
        state
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone());
        tracing::debug!("Connection '{}' joined room '{}'", connection_id, room_id);
        Ok(true)
    }

    async fn leave(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let registration = state
            .connections
            .get_mut(connection_id)
            .ok_or_else(|| DirectoryError::ConnectionNotRegistered(connection_id.to_string()))?;
        if !registration.rooms.remove(room_id) {
            return Err(DirectoryError::NotAMember(room_id.to_string()));
        }

        if let Some(members) = state.rooms.get_mut(room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                state.rooms.remove(room_id);
                tracing::debug!("Room '{}' is empty and was dropped", room_id);
            }
        }
        tracing::debug!("Connection '{}' left room '{}'", connection_id, room_id);
        Ok(())
    }

    async fn leave_all(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut state = self.state.lock().await;

        let Some(registration) = state.connections.remove(connection_id) else {
            return Vec::new();
        };

        let mut left: Vec<RoomId> = registration.rooms.into_iter().collect();
        left.sort();
        for room_id in &left {
            if let Some(members) = state.rooms.get_mut(room_id) {
                members.remove(connection_id);
                if members.is_empty() {
                    state.rooms.remove(room_id);
                }
            }
        }
        tracing::debug!(
            "Connection '{}' released {} room membership(s)",
            connection_id,
            left.len()
        );
        left
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        event: &ServerEvent,
        exclude: Option<&ConnectionId>,
    ) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        let targets = state.targets(room_id, exclude);
        if targets.is_empty() {
            return targets;
        }
        self.message_pusher.broadcast(&targets, event).await
    }

    /// 全接続への配信中はロックを保持するため、接続数が多いほど他の join/leave を待たせる
    async fn broadcast_all(
        &self,
        event: &ServerEvent,
        exclude: Option<&ConnectionId>,
    ) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        let targets: Vec<ConnectionId> = state
            .connections
            .keys()
            .filter(|id| Some(*id) != exclude)
            .cloned()
            .collect();
        if targets.is_empty() {
            return targets;
        }
        self.message_pusher.broadcast(&targets, event).await
    }

    async fn members_of(&self, room_id: &RoomId) -> HashSet<ConnectionId> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).cloned().unwrap_or_default()
    }

    async fn member_profiles(&self, room_id: &RoomId) -> Vec<UserProfile> {
        let state = self.state.lock().await;
        let mut profiles: Vec<UserProfile> = state
            .rooms
            .get(room_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.connections.get(id))
            .map(|registration| registration.user.clone())
            .collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles
    }

    async fn rooms_of(&self, connection_id: &ConnectionId) -> HashSet<RoomId> {
        let state = self.state.lock().await;
        state
            .connections
            .get(connection_id)
            .map(|registration| registration.rooms.clone())
            .unwrap_or_default()
    }

    async fn is_user_connected(&self, user_id: &UserId) -> bool {
        let state = self.state.lock().await;
        state
            .rooms
            .get(&RoomId::Personal(user_id.clone()))
            .is_some_and(|members| !members.is_empty())
    }
}
