//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ClientEvent, ConnectionState, ErrorCode},
    infrastructure::dto::websocket::InboundMessage,
    ui::state::AppState,
    usecase::{ConnectError, MessageRouter},
};

use super::credential::{CredentialQuery, credential};

/// 切断後に書き込みタスクが残りのフレームを送り切るまでの猶予
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    // 1. アップグレード前に認証（失敗しても何の状態も作らない）
    let token = credential(query, &headers);
    let user = match state.session_hub.authenticate(token.as_deref()).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Rejected WebSocket connection: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 2. 送信チャンネルを作って接続を登録
    let (tx, rx) = mpsc::unbounded_channel();
    let router = match state.session_hub.connect(user, tx).await {
        Ok(router) => router,
        Err(ConnectError::DuplicateConnection(user_id)) => {
            tracing::warn!(
                "User '{}' is already connected. Rejecting connection.",
                user_id
            );
            return Err(StatusCode::CONFLICT);
        }
        Err(ConnectError::Directory(e)) => {
            tracing::error!("Failed to register connection: {}", e);
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    };

    // 3. アップグレードに失敗したら登録を取り消す
    let connection = router.connection().clone();
    let hub = state.session_hub.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for '{}' failed: {}", connection.id, e);
            tokio::spawn(async move { hub.release(&connection).await });
        })
        .on_upgrade(move |socket| handle_socket(socket, router, rx)))
}

/// Spawns a task that drains the outbound channel into the WebSocket sink.
///
/// The task ends when every sender of the channel is dropped (the connection was
/// unregistered from the MessagePusher) or when the peer stops accepting frames.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

/// テキストフレームをイベントに変換する
fn parse_frame(text: &str) -> Result<ClientEvent, String> {
    let inbound: InboundMessage = serde_json::from_str(text).map_err(|e| e.to_string())?;
    ClientEvent::try_from(inbound).map_err(|e| e.to_string())
}

async fn handle_socket(
    socket: WebSocket,
    mut router: MessageRouter,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let connection_id = router.connection().id.clone();
    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);
    let mut writer_done = false;

    // 受信フレームは 1 本のループで順番に処理する（送信元ごとの FIFO）
    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => match parse_frame(text.as_str()) {
                        Ok(event) => {
                            if router.dispatch(event).await == ConnectionState::Disconnected {
                                break;
                            }
                        }
                        Err(reason) => {
                            tracing::debug!("Invalid frame from '{}': {}", connection_id, reason);
                            router.reject(ErrorCode::InvalidMessage, reason).await;
                        }
                    },
                    Message::Binary(_) => {
                        router
                            .reject(ErrorCode::InvalidMessage, "binary frames are not supported")
                            .await;
                    }
                    Message::Close(_) => {
                        tracing::info!("Connection '{}' requested close", connection_id);
                        break;
                    }
                    // Ping/pong is handled automatically by the WebSocket protocol
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            _ = &mut send_task => {
                writer_done = true;
                break;
            }
        }
    }

    router.close().await;

    if !writer_done && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }
    tracing::info!("Connection '{}' closed", connection_id);
}
