//! UseCase 層
//!
//! 1 つのユースケースを 1 つの構造体で表現し、依存は trait オブジェクトで受け取ります。

pub mod analyze_form;
pub mod authenticate;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod join_room;
pub mod query;
pub mod record_heart_rate;
pub mod relay;
pub mod router;
pub mod send_chat_message;
pub mod session_hub;

#[cfg(test)]
mod test_support;

pub use analyze_form::AnalyzeFormUseCase;
pub use authenticate::{AuthenticateConnectionUseCase, DEFAULT_AUTH_TIMEOUT};
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, OpenError, QueryError};
pub use join_room::JoinRoomUseCase;
pub use query::{GetChatHistoryUseCase, GetHeartRateHistoryUseCase, GetRoomMembersUseCase};
pub use record_heart_rate::{HeartRateOutcome, RecordHeartRateUseCase};
pub use relay::RelayUseCase;
pub use router::{MessageRouter, RouteHandlers};
pub use send_chat_message::{ChatDelivery, SendChatMessageUseCase};
pub use session_hub::SessionHub;
