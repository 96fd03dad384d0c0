//! 値オブジェクト
//!
//! 生成時にバリデーションを行い、不正な値がドメインに入り込まないようにします。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

const MAX_ID_LENGTH: usize = 128;
const MAX_MESSAGE_LENGTH: usize = 2000;
const MIN_BPM: u16 = 1;
const MAX_BPM: u16 = 300;

fn validate_id(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_ID_LENGTH));
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValidationError> {
                validate_id($field, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// ライブ接続 1 本ごとに払い出される ID
    ConnectionId,
    "connection_id"
);
string_id!(
    /// 外部ユーザーディレクトリ上のユーザー ID
    UserId,
    "user_id"
);
string_id!(
    /// トレーナーセッション ID
    SessionId,
    "session_id"
);
string_id!(
    /// チャレンジ ID
    ChallengeId,
    "challenge_id"
);

impl ConnectionId {
    /// サーバー側で新しい接続 ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Room の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKind {
    Personal,
    Session,
    Challenge,
}

/// ブロードキャストの単位となる Room の ID
///
/// 文字列表現は `user:<id>`, `trainer-session:<id>`, `challenge:<id>` のいずれか。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomId {
    Personal(UserId),
    Session(SessionId),
    Challenge(ChallengeId),
}

impl RoomId {
    const PERSONAL_PREFIX: &'static str = "user:";
    const SESSION_PREFIX: &'static str = "trainer-session:";
    const CHALLENGE_PREFIX: &'static str = "challenge:";

    pub fn kind(&self) -> RoomKind {
        match self {
            RoomId::Personal(_) => RoomKind::Personal,
            RoomId::Session(_) => RoomKind::Session,
            RoomId::Challenge(_) => RoomKind::Challenge,
        }
    }

    pub fn is_session(&self) -> bool {
        self.kind() == RoomKind::Session
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            RoomId::Session(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Personal(id) => write!(f, "{}{}", Self::PERSONAL_PREFIX, id),
            RoomId::Session(id) => write!(f, "{}{}", Self::SESSION_PREFIX, id),
            RoomId::Challenge(id) => write!(f, "{}{}", Self::CHALLENGE_PREFIX, id),
        }
    }
}

impl FromStr for RoomId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(Self::PERSONAL_PREFIX) {
            Ok(RoomId::Personal(UserId::new(rest.to_string())?))
        } else if let Some(rest) = s.strip_prefix(Self::SESSION_PREFIX) {
            Ok(RoomId::Session(SessionId::new(rest.to_string())?))
        } else if let Some(rest) = s.strip_prefix(Self::CHALLENGE_PREFIX) {
            Ok(RoomId::Challenge(ChallengeId::new(rest.to_string())?))
        } else {
            Err(ValidationError::UnknownRoomKind(s.to_string()))
        }
    }
}

/// チャットメッセージ本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::Empty("body"));
        }
        if value.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ValidationError::TooLong("body", MAX_MESSAGE_LENGTH));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

/// 心拍数（beats per minute）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Bpm(u16);

impl Bpm {
    pub fn new(value: u16) -> Result<Self, ValidationError> {
        if !(MIN_BPM..=MAX_BPM).contains(&value) {
            return Err(ValidationError::OutOfRange("bpm", MIN_BPM as i64, MAX_BPM as i64));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Bpm {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Bpm> for u16 {
    fn from(value: Bpm) -> Self {
        value.0
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// チャットメッセージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Voice,
    Image,
}
