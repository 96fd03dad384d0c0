//! Realtime coaching session server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin coachlive-server -- --jwt-secret dev-secret --users-file demos/users.json
//! COACHLIVE_REDIS_URL=redis://127.0.0.1/ cargo run --bin coachlive-server -- ...
//! ```

use std::{sync::Arc, time::Duration};

use clap::{ArgGroup, Parser};
use coachlive_server::{
    domain::{EphemeralStore, PostOwnerResolver, UserDirectory},
    infrastructure::{
        auth::{HttpUserDirectory, InMemoryUserDirectory, JwtTokenVerifier},
        message_pusher::WebSocketMessagePusher,
        post_owner::InMemoryPostOwnerResolver,
        repository::{InMemoryEphemeralStore, InMemoryRoomDirectory, RedisEphemeralStore},
        scoring::HeuristicFormScorer,
    },
    ui::Server,
    usecase::{
        AuthenticateConnectionUseCase, ConnectParticipantUseCase, GetChatHistoryUseCase,
        GetHeartRateHistoryUseCase, GetRoomMembersUseCase, RouteHandlers, SessionHub,
    },
};
use coachlive_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "coachlive-server")]
#[command(about = "Realtime coaching session hub over WebSocket", long_about = None)]
#[command(group(
    ArgGroup::new("users")
        .required(true)
        .args(["user_directory_url", "users_file"])
))]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "COACHLIVE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "COACHLIVE_PORT", default_value = "8080")]
    port: u16,

    /// HS256 secret used to verify connection tokens
    #[arg(long, env = "COACHLIVE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Timeout for token verification and user lookup (milliseconds)
    #[arg(long, env = "COACHLIVE_AUTH_TIMEOUT_MS", default_value = "5000")]
    auth_timeout_ms: u64,

    /// Maximum number of connections in a session or challenge room
    #[arg(long, env = "COACHLIVE_ROOM_CAPACITY", default_value = "100")]
    room_capacity: usize,

    /// Redis URL for chat and heart-rate history (in-memory when omitted)
    #[arg(long, env = "COACHLIVE_REDIS_URL")]
    redis_url: Option<String>,

    /// Base URL of the user directory service (`GET {url}/users/{id}`)
    #[arg(long, env = "COACHLIVE_USER_DIRECTORY_URL")]
    user_directory_url: Option<String>,

    /// JSON file with user records (`[{"id", "name", "avatar", "active"}]`)
    #[arg(long, env = "COACHLIVE_USERS_FILE")]
    users_file: Option<String>,

    /// JSON file mapping post IDs to owner user IDs
    #[arg(long, env = "COACHLIVE_POST_OWNERS_FILE")]
    post_owners_file: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize dependencies in order:
    // 1. Clock
    // 2. External collaborators (store, auth, scoring, post owners)
    // 3. MessagePusher
    // 4. Room Directory
    // 5. UseCases
    // 6. SessionHub
    // 7. Server

    // 1. Clock
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 2. External collaborators
    let store: Arc<dyn EphemeralStore> = match &args.redis_url {
        Some(url) => {
            tracing::info!("Using Redis ephemeral store at {}", url);
            Arc::new(RedisEphemeralStore::connect(url).await?)
        }
        None => {
            tracing::warn!("No Redis URL configured, history is kept in memory only");
            Arc::new(InMemoryEphemeralStore::new(clock.clone()))
        }
    };

    let auth_timeout = Duration::from_millis(args.auth_timeout_ms);
    let token_verifier = Arc::new(JwtTokenVerifier::new(&args.jwt_secret));
    let user_directory: Arc<dyn UserDirectory> =
        match (&args.user_directory_url, &args.users_file) {
            (Some(url), _) => {
                tracing::info!("Using user directory service at {}", url);
                Arc::new(HttpUserDirectory::new(url.clone(), auth_timeout))
            }
            (None, Some(path)) => {
                let directory = InMemoryUserDirectory::from_json_file(path)?;
                tracing::info!("Loaded {} user(s) from {}", directory.len(), path);
                Arc::new(directory)
            }
            (None, None) => {
                return Err("either --user-directory-url or --users-file is required".into());
            }
        };

    let scorer = Arc::new(HeuristicFormScorer::new(clock.clone()));
    let post_owner_resolver: Arc<dyn PostOwnerResolver> = match &args.post_owners_file {
        Some(path) => Arc::new(InMemoryPostOwnerResolver::from_json_file(path)?),
        None => Arc::new(InMemoryPostOwnerResolver::default()),
    };

    // 3. MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    // 4. Room Directory
    let room_directory = Arc::new(InMemoryRoomDirectory::with_capacity(
        message_pusher.clone(),
        args.room_capacity,
    ));

    // 5. UseCases
    let authenticate_usecase = Arc::new(AuthenticateConnectionUseCase::new(
        token_verifier,
        user_directory,
        auth_timeout,
    ));
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        room_directory.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let handlers = RouteHandlers::new(
        room_directory.clone(),
        message_pusher,
        store.clone(),
        scorer,
        post_owner_resolver,
        clock,
    );
    let get_room_members_usecase = Arc::new(GetRoomMembersUseCase::new(room_directory.clone()));
    let get_chat_history_usecase = Arc::new(GetChatHistoryUseCase::new(
        room_directory.clone(),
        store.clone(),
    ));
    let get_heart_rate_history_usecase = Arc::new(GetHeartRateHistoryUseCase::new(store));

    // 6. SessionHub
    let session_hub = Arc::new(SessionHub::new(
        authenticate_usecase,
        connect_participant_usecase,
        handlers,
    ));

    // 7. Create and run the server
    let server = Server::new(
        session_hub,
        get_room_members_usecase,
        get_chat_history_usecase,
        get_heart_rate_history_usecase,
    );
    server.run(args.host, args.port).await
}
