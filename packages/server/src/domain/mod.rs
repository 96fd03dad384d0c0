//! ドメイン層
//!
//! 値オブジェクト、エンティティ、イベント、異常検知と、
//! 外部コラボレーターへのインターフェース（trait）を定義します。

pub mod anomaly;
pub mod collaborator;
pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use anomaly::{AlertLevel, AnomalyDetector};
pub use collaborator::{
    FormScorer, PostOwnerResolver, TokenVerifier, UserDirectory, UserRecord, VerifiedToken,
};
pub use entity::{
    ChatMessage, Connection, ConnectionState, FormAnalysisResult, HeartRateSample, UserProfile,
};
pub use error::{
    AuthError, DirectoryError, MessagePushError, OwnerLookupError, ScoringError, StoreError,
    TokenError, UserLookupError, ValidationError,
};
pub use event::{ClientEvent, ErrorCode, ServerEvent};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{
    CHAT_HISTORY_TTL, EphemeralStore, HEART_RATE_BUFFER_LEN, RoomDirectory, chat_history_key,
    heart_rate_key,
};
pub use value_object::{
    Bpm, ChallengeId, ConnectionId, MessageBody, MessageKind, RoomId, RoomKind, SessionId,
    Timestamp, UserId,
};
