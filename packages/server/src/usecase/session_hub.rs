//! セッションハブ
//!
//! 認証、接続の登録、ルーターの生成をまとめた、トランスポート層から見た唯一の入口です。
//! ハブ自身は接続ごとの状態を持たず、共有状態は Room Directory と Ephemeral Store にあります。

use std::sync::Arc;

use crate::domain::{AuthError, Connection, PusherChannel, UserProfile};

use super::{
    authenticate::AuthenticateConnectionUseCase,
    connect_participant::ConnectParticipantUseCase,
    error::{ConnectError, OpenError},
    router::{MessageRouter, RouteHandlers},
};

pub struct SessionHub {
    authenticate: Arc<AuthenticateConnectionUseCase>,
    connect_participant: Arc<ConnectParticipantUseCase>,
    handlers: RouteHandlers,
}

impl SessionHub {
    pub fn new(
        authenticate: Arc<AuthenticateConnectionUseCase>,
        connect_participant: Arc<ConnectParticipantUseCase>,
        handlers: RouteHandlers,
    ) -> Self {
        Self {
            authenticate,
            connect_participant,
            handlers,
        }
    }

    /// 資格情報を検証する。失敗しても何の状態も作らない
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<UserProfile, AuthError> {
        self.authenticate.execute(credential).await
    }

    /// 認証済みユーザーの接続を登録し、その接続専用のルーターを返す
    pub async fn connect(
        &self,
        user: UserProfile,
        sender: PusherChannel,
    ) -> Result<MessageRouter, ConnectError> {
        let connection = self.connect_participant.execute(user, sender).await?;
        Ok(MessageRouter::new(connection, self.handlers.clone()))
    }

    /// 認証と接続をまとめて行う
    pub async fn open(
        &self,
        credential: Option<&str>,
        sender: PusherChannel,
    ) -> Result<MessageRouter, OpenError> {
        let user = self.authenticate(credential).await?;
        Ok(self.connect(user, sender).await?)
    }

    /// ルーターを使わずに接続を解放する（アップグレード失敗時など）
    pub async fn release(&self, connection: &Connection) {
        self.handlers
            .disconnect_participant
            .execute(connection)
            .await;
    }
}
