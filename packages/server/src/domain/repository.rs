//! 共有状態へのアクセスを抽象化する trait 定義
//!
//! ドメイン層が必要とするインターフェースをドメイン層自身が定義し、
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;

use super::{
    entity::UserProfile,
    error::{DirectoryError, StoreError},
    event::ServerEvent,
    value_object::{ConnectionId, RoomId, SessionId, UserId},
};

/// チャット履歴の保持期間（最後の追記から 30 日）
pub const CHAT_HISTORY_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// ユーザーごとに保持する心拍サンプル数の上限
pub const HEART_RATE_BUFFER_LEN: usize = 100;

/// セッションのチャット履歴キー
pub fn chat_history_key(session_id: &SessionId) -> String {
    format!("chat:session:{}", session_id)
}

/// ユーザーの心拍リングバッファキー
pub fn heart_rate_key(user_id: &UserId) -> String {
    format!("heart-rate:{}", user_id)
}

/// Room Directory
///
/// Room ごとのメンバー集合と、接続ごとの所属 Room 集合を双対に保つ。
/// メンバーが 0 になった Room は消え、未参加の Room への問い合わせは空集合を返す。
///
/// ## 契約
///
/// - `register` 済みの接続だけが `join` できる
/// - `broadcast` の配信先スナップショットは join/leave に対してアトミックに取られる
/// - `leave_all` は冪等で、未登録の接続に対しても安全に呼べる
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// 接続を登録（どの Room にも属さない状態で作られる）
    async fn register(
        &self,
        connection_id: ConnectionId,
        user: UserProfile,
    ) -> Result<(), DirectoryError>;

    /// Room に参加。存在しない Room は暗黙的に作られる
    ///
    /// 新規に参加した場合は `true`、既に参加済みなら `false`
    async fn join(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<bool, DirectoryError>;

    /// Room から退出。空になった Room は削除される
    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId)
    -> Result<(), DirectoryError>;

    /// 全ての Room から退出し、接続の登録を解除する。退出した Room を返す
    async fn leave_all(&self, connection_id: &ConnectionId) -> Vec<RoomId>;

    /// Room のメンバー（除外指定があればそれ以外）に配信し、配信先を返す
    async fn broadcast(
        &self,
        room_id: &RoomId,
        event: &ServerEvent,
        exclude: Option<&ConnectionId>,
    ) -> Vec<ConnectionId>;

    /// 登録済みの全接続（除外指定があればそれ以外）に配信し、配信先を返す
    ///
    /// 全接続を走査するため、コストは Room の大きさではなく接続総数に比例する
    async fn broadcast_all(
        &self,
        event: &ServerEvent,
        exclude: Option<&ConnectionId>,
    ) -> Vec<ConnectionId>;

    /// Room のメンバー。存在しない Room は空集合
    async fn members_of(&self, room_id: &RoomId) -> HashSet<ConnectionId>;

    /// Room のメンバーのプロフィール（ユーザー ID 順）
    async fn member_profiles(&self, room_id: &RoomId) -> Vec<UserProfile>;

    /// 接続が所属している Room。未登録の接続は空集合
    async fn rooms_of(&self, connection_id: &ConnectionId) -> HashSet<RoomId>;

    /// ユーザーが接続中かどうか
    async fn is_user_connected(&self, user_id: &UserId) -> bool;
}

/// Ephemeral Store（外部 KVS のリスト操作 + キー単位の TTL）
///
/// `StoreUnavailable` は配信を止める理由にはならないが、呼び出し側は必ずログに残すこと。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// リスト末尾に追記（TTL なし）。追記後の長さを返す
    async fn append(&self, key: &str, value: String) -> Result<usize, StoreError>;

    /// リスト末尾に追記し、キーの TTL を `ttl` にリセットする。追記後の長さを返す
    async fn append_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<usize, StoreError>;

    /// 末尾 `n` 件だけを残す
    async fn trim_to_last(&self, key: &str, n: usize) -> Result<(), StoreError>;

    /// `start` 番目以降の要素を古い順に返す。存在しないキーは空
    async fn list_since(&self, key: &str, start: usize) -> Result<Vec<String>, StoreError>;

    /// キーの残り TTL。キーが存在しないか TTL がなければ `None`
    async fn expires_in(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}
