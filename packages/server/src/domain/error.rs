//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト生成時のバリデーションエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    #[error("{0} must be within {1}..={2}")]
    OutOfRange(&'static str, i64, i64),

    #[error("unknown room kind: {0}")]
    UnknownRoomKind(String),
}

/// 接続認証のエラー
///
/// どのエラーでも接続は拒否され、Room Directory に状態は作られない。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential was presented")]
    MissingCredential,

    #[error("credential verification failed")]
    InvalidCredential,

    #[error("user '{0}' was not found")]
    UserNotFound(String),

    #[error("user '{0}' is inactive")]
    UserInactive(String),
}

/// トークン検証器のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or has a bad signature: {0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,
}

/// ユーザーディレクトリ参照のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserLookupError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// Room Directory のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotRegistered(String),

    #[error("connection '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("room '{0}' is full")]
    RoomCapacityExceeded(String),

    #[error("connection is not a member of room '{0}'")]
    NotAMember(String),
}

/// Ephemeral Store のエラー
///
/// 配信を止める理由にはならないが、必ずログに残すこと。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("ephemeral store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
}

/// フォーム採点サービスのエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("form payload is not scorable: {0}")]
    InvalidPayload(String),

    #[error("form scoring service unavailable: {0}")]
    Unavailable(String),
}

/// 投稿オーナー解決のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OwnerLookupError {
    #[error("post '{0}' has no known owner")]
    NotFound(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
