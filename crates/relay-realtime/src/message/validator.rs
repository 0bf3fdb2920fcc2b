//! Inbound event validation rules.

use validator::{Validate, ValidationError, ValidationErrors};

use relay_core::config::realtime::RealtimeConfig;
use relay_core::error::AppError;

use super::serializer::deserialize_inbound;
use super::types::InboundEvent;

/// Rejects blank opaque identifiers.
pub(crate) fn non_empty_key<T: AsRef<str>>(value: &T) -> Result<(), ValidationError> {
    if value.as_ref().trim().is_empty() {
        return Err(ValidationError::new("empty_id").with_message("must not be empty".into()));
    }
    Ok(())
}

/// Validates the raw frame before it is parsed.
pub fn validate_frame(raw: &str, max_frame_size: usize) -> Result<(), AppError> {
    if raw.len() > max_frame_size {
        return Err(AppError::validation(format!(
            "Frame exceeds maximum size of {} bytes",
            max_frame_size
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty frame"));
    }

    Ok(())
}

fn to_app_error(event: &str, errors: ValidationErrors) -> AppError {
    AppError::validation(format!("Invalid {event}: {errors}"))
}

/// Validates the payload of a decoded event.
pub fn validate_event(event: &InboundEvent, max_message_length: usize) -> Result<(), AppError> {
    let name = event.name();
    match event {
        InboundEvent::SendMessage(payload) => {
            payload.validate().map_err(|e| to_app_error(name, e))?;
            if payload.message.content.trim().is_empty() {
                return Err(AppError::validation("Message content must not be blank"));
            }
            let length = payload.message.content.chars().count();
            if length > max_message_length {
                return Err(AppError::validation(format!(
                    "Message content is {length} characters, maximum is {max_message_length}"
                )));
            }
        }
        InboundEvent::SendFriendRequest(payload) => {
            if payload.notification.receiver.is_empty() {
                return Err(AppError::validation("Friend request has no receiver"));
            }
        }
        InboundEvent::AcceptFriendRequest(payload) => {
            payload.validate().map_err(|e| to_app_error(name, e))?;
            if payload.notification.receiver.is_empty() {
                return Err(AppError::validation("Friend request has no receiver"));
            }
        }
        InboundEvent::QueryUserStatus(payload) => {
            payload.validate().map_err(|e| to_app_error(name, e))?;
        }
        InboundEvent::QueryFriendsStatus(payload) => {
            if let Some(friends) = &payload.friends {
                if friends.iter().any(|f| f.id().is_empty()) {
                    return Err(AppError::validation("Friend list contains an empty id"));
                }
            }
        }
        InboundEvent::StartTyping(payload) | InboundEvent::StopTyping(payload) => {
            payload.validate().map_err(|e| to_app_error(name, e))?;
        }
        InboundEvent::EnterConversation(payload) => {
            if payload.conversation_id.as_ref().is_some_and(|c| c.is_empty()) {
                return Err(AppError::validation("Conversation id must not be empty"));
            }
        }
        InboundEvent::PublishPost
        | InboundEvent::EnterMessagingSurface
        | InboundEvent::LeaveMessagingSurface
        | InboundEvent::Disconnect => {}
    }
    Ok(())
}

/// Decodes and validates one inbound frame.
///
/// Oversized or blank frames and payload rule violations are `VALIDATION`
/// errors; anything that is not a known event is `INVALID_EVENT`.
pub fn parse_inbound(raw: &str, config: &RealtimeConfig) -> Result<InboundEvent, AppError> {
    validate_frame(raw, config.max_frame_size)?;
    let event = deserialize_inbound(raw)
        .map_err(|e| AppError::invalid_event(format!("Unrecognized event: {e}")))?;
    validate_event(&event, config.max_message_length)?;
    Ok(event)
}
