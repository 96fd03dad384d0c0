//! Conversion logic between DTOs and domain types.

use crate::domain::{
    AlertLevel, Bpm, ChallengeId, ChatMessage, ClientEvent, FormAnalysisResult, HeartRateSample,
    MessageBody, MessageKind, ServerEvent, SessionId, UserProfile, ValidationError,
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain
// ========================================

impl From<dto::MessageKindDto> for MessageKind {
    fn from(kind: dto::MessageKindDto) -> Self {
        match kind {
            dto::MessageKindDto::Text => MessageKind::Text,
            dto::MessageKindDto::Voice => MessageKind::Voice,
            dto::MessageKindDto::Image => MessageKind::Image,
        }
    }
}

impl TryFrom<dto::InboundMessage> for ClientEvent {
    type Error = ValidationError;

    fn try_from(msg: dto::InboundMessage) -> Result<Self, Self::Error> {
        use dto::InboundMessage as In;

        let event = match msg {
            In::JoinSessionRoom { session_id } => ClientEvent::JoinSessionRoom {
                session_id: SessionId::new(session_id)?,
            },
            In::LeaveSessionRoom { session_id } => ClientEvent::LeaveSessionRoom {
                session_id: SessionId::new(session_id)?,
            },
            In::JoinChallengeRoom { challenge_id } => ClientEvent::JoinChallengeRoom {
                challenge_id: ChallengeId::new(challenge_id)?,
            },
            In::ChatMessage {
                session_id,
                body,
                kind,
            } => ClientEvent::ChatMessage {
                session_id: SessionId::new(session_id)?,
                body: MessageBody::new(body)?,
                kind: kind.into(),
            },
            In::HeartRateSample { bpm, exercise_id } => ClientEvent::HeartRateSample {
                bpm: Bpm::new(bpm)?,
                exercise_id,
            },
            In::FormAnalysis {
                exercise_id,
                form_payload,
            } => {
                if exercise_id.trim().is_empty() {
                    return Err(ValidationError::Empty("exercise_id"));
                }
                ClientEvent::FormAnalysis {
                    exercise_id,
                    form_payload,
                }
            }
            In::LiveWorkoutShare {
                workout_id,
                current_exercise,
                progress,
            } => ClientEvent::LiveWorkoutShare {
                workout_id,
                current_exercise,
                progress: validate_progress(progress)?,
            },
            In::ChallengeProgressUpdate {
                challenge_id,
                progress,
            } => ClientEvent::ChallengeProgressUpdate {
                challenge_id: ChallengeId::new(challenge_id)?,
                progress: validate_progress(progress)?,
            },
            In::TypingIndicator {
                session_id,
                is_typing,
            } => ClientEvent::TypingIndicator {
                session_id: SessionId::new(session_id)?,
                is_typing,
            },
            In::LikePost { post_id } => {
                if post_id.trim().is_empty() {
                    return Err(ValidationError::Empty("post_id"));
                }
                ClientEvent::LikePost { post_id }
            }
            In::Disconnect => ClientEvent::Disconnect,
        };
        Ok(event)
    }
}

fn validate_progress(progress: f64) -> Result<f64, ValidationError> {
    if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
        return Err(ValidationError::OutOfRange("progress", 0, 100));
    }
    Ok(progress)
}

// ========================================
// Domain → DTO
// ========================================

impl From<MessageKind> for dto::MessageKindDto {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Text => dto::MessageKindDto::Text,
            MessageKind::Voice => dto::MessageKindDto::Voice,
            MessageKind::Image => dto::MessageKindDto::Image,
        }
    }
}

impl From<&UserProfile> for dto::UserInfo {
    fn from(user: &UserProfile) -> Self {
        Self {
            user_id: user.id.to_string(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

impl From<&ChatMessage> for dto::ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.clone(),
            session_id: message.session_id.to_string(),
            sender_id: message.sender_id.to_string(),
            sender_name: message.sender_name.clone(),
            sender_avatar: message.sender_avatar.clone(),
            body: message.body.as_str().to_string(),
            kind: message.kind.into(),
            timestamp: message.timestamp.value(),
        }
    }
}

impl From<&HeartRateSample> for dto::HeartRateSampleDto {
    fn from(sample: &HeartRateSample) -> Self {
        Self {
            user_id: sample.user_id.to_string(),
            bpm: sample.bpm.value(),
            exercise_id: sample.exercise_id.clone(),
            timestamp: sample.timestamp.value(),
        }
    }
}

impl From<&FormAnalysisResult> for dto::FormAnalysisResultDto {
    fn from(result: &FormAnalysisResult) -> Self {
        Self {
            exercise_id: result.exercise_id.clone(),
            score: result.score(),
            feedback: result.feedback.clone(),
            suggestions: result.suggestions.clone(),
            timestamp: result.timestamp.value(),
        }
    }
}

fn alert_level_str(level: AlertLevel) -> String {
    match level {
        AlertLevel::None => "none",
        AlertLevel::Warning => "warning",
        AlertLevel::Critical => "critical",
    }
    .to_string()
}

impl From<&ServerEvent> for dto::OutboundMessage {
    fn from(event: &ServerEvent) -> Self {
        use dto::OutboundMessage as Out;

        match event {
            ServerEvent::Connected {
                connection_id,
                user,
                personal_room,
            } => Out::Connected {
                connection_id: connection_id.to_string(),
                user: user.into(),
                personal_room: personal_room.to_string(),
            },
            ServerEvent::RoomJoined {
                room_id,
                members,
                history,
            } => Out::RoomJoined {
                room_id: room_id.to_string(),
                members: members.iter().map(Into::into).collect(),
                history: history.iter().map(Into::into).collect(),
            },
            ServerEvent::RoomLeft { room_id } => Out::RoomLeft {
                room_id: room_id.to_string(),
            },
            ServerEvent::ParticipantJoined { room_id, user } => Out::ParticipantJoined {
                room_id: room_id.to_string(),
                user: user.into(),
            },
            ServerEvent::ParticipantLeft { room_id, user_id } => Out::ParticipantLeft {
                room_id: room_id.to_string(),
                user_id: user_id.to_string(),
            },
            ServerEvent::ChatMessage(message) => Out::ChatMessage(message.into()),
            ServerEvent::HeartRateRecorded { sample, level } => Out::HeartRateRecorded {
                sample: sample.into(),
                level: alert_level_str(*level),
            },
            ServerEvent::HeartRateAlert {
                room_id,
                user_name,
                level,
                sample,
            } => Out::HeartRateAlert {
                room_id: room_id.to_string(),
                user_name: user_name.clone(),
                level: alert_level_str(*level),
                sample: sample.into(),
            },
            ServerEvent::FormAnalysisResult(result) => Out::FormAnalysisResult(result.into()),
            ServerEvent::FormAnalysisShared {
                room_id,
                user,
                exercise_id,
                score,
                timestamp,
            } => Out::FormAnalysisShared {
                room_id: room_id.to_string(),
                user: user.into(),
                exercise_id: exercise_id.clone(),
                score: *score,
                timestamp: timestamp.value(),
            },
            ServerEvent::LiveWorkoutUpdate {
                user,
                workout_id,
                current_exercise,
                progress,
                timestamp,
            } => Out::LiveWorkoutUpdate {
                user: user.into(),
                workout_id: workout_id.clone(),
                current_exercise: current_exercise.clone(),
                progress: *progress,
                timestamp: timestamp.value(),
            },
            ServerEvent::ChallengeProgress {
                challenge_id,
                user,
                progress,
                timestamp,
            } => Out::ChallengeProgress {
                challenge_id: challenge_id.to_string(),
                user: user.into(),
                progress: *progress,
                timestamp: timestamp.value(),
            },
            ServerEvent::Typing {
                session_id,
                user,
                is_typing,
            } => Out::Typing {
                session_id: session_id.to_string(),
                user: user.into(),
                is_typing: *is_typing,
            },
            ServerEvent::PostLiked {
                post_id,
                liked_by,
                timestamp,
            } => Out::PostLiked {
                post_id: post_id.clone(),
                liked_by: liked_by.into(),
                timestamp: timestamp.value(),
            },
            ServerEvent::Error { code, message } => Out::Error {
                code: code.as_str().to_string(),
                message: message.clone(),
            },
        }
    }
}
