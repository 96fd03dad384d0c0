//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{AuthError, DirectoryError, StoreError};

/// 参加者接続のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// 同じユーザーが既に接続している（個人 Room は常にメンバー 1 人）
    #[error("user '{0}' is already connected")]
    DuplicateConnection(String),

    #[error(transparent)]
    Directory(DirectoryError),
}

/// 接続確立（認証 + 参加）のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpenError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// 参照系ユースケースのエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// 要求したユーザーには読む権限がない
    #[error("user '{requester}' may not read {resource}")]
    Forbidden { requester: String, resource: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
