//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{
    GetChatHistoryUseCase, GetHeartRateHistoryUseCase, GetRoomMembersUseCase, SessionHub,
};

use super::{
    handler::{
        get_chat_history, get_heart_rate_history, get_room_members, health_check,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Coaching session server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     session_hub,
///     get_room_members_usecase,
///     get_chat_history_usecase,
///     get_heart_rate_history_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// SessionHub（認証・接続・ルーティング）
    session_hub: Arc<SessionHub>,
    /// GetRoomMembersUseCase（Room メンバー取得のユースケース）
    get_room_members_usecase: Arc<GetRoomMembersUseCase>,
    /// GetChatHistoryUseCase（チャット履歴取得のユースケース）
    get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    /// GetHeartRateHistoryUseCase（心拍履歴取得のユースケース）
    get_heart_rate_history_usecase: Arc<GetHeartRateHistoryUseCase>,
}

impl Server {
    pub fn new(
        session_hub: Arc<SessionHub>,
        get_room_members_usecase: Arc<GetRoomMembersUseCase>,
        get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
        get_heart_rate_history_usecase: Arc<GetHeartRateHistoryUseCase>,
    ) -> Self {
        Self {
            session_hub,
            get_room_members_usecase,
            get_chat_history_usecase,
            get_heart_rate_history_usecase,
        }
    }

    /// ルーティングを組み立てる
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            session_hub: self.session_hub,
            get_room_members_usecase: self.get_room_members_usecase,
            get_chat_history_usecase: self.get_chat_history_usecase,
            get_heart_rate_history_usecase: self.get_heart_rate_history_usecase,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms/{room_id}/members", get(get_room_members))
            .route("/api/sessions/{session_id}/messages", get(get_chat_history))
            .route("/api/users/{user_id}/heart-rate", get(get_heart_rate_history))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the server on `host:port`
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}/ws?token=<jwt>", bind_addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal arrives
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        tracing::info!(
            "Coaching session server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
