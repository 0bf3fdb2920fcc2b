//! HTTP provider for the upstream messages/notifications API.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use relay_core::config::upstream::UpstreamConfig;
use relay_core::error::{AppError, ErrorKind};
use relay_core::result::AppResult;
use relay_core::traits::RelayBackend;
use relay_core::types::{
    ConversationId, Credential, Message, NotificationRecord, NotificationType, UserId, UserRef,
};

/// Talks to the upstream REST API with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateMessageBody<'a> {
    conversation_id: &'a ConversationId,
    sender: &'a UserId,
    content: &'a str,
    seen_by: &'a BTreeSet<UserId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateNotificationBody<'a> {
    receiver_id: &'a UserId,
    #[serde(rename = "type")]
    kind: NotificationType,
}

#[derive(Debug, serde::Deserialize)]
struct MessageEnvelope {
    message: Message,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExistingNotificationEnvelope {
    #[serde(default)]
    existing_notif: serde_json::Value,
}

#[derive(Debug, serde::Deserialize)]
struct NotificationEnvelope {
    notification: NotificationRecord,
}

#[derive(Debug, serde::Deserialize)]
struct FriendsEnvelope {
    #[serde(default)]
    friends: Vec<UserRef>,
}

impl HttpBackend {
    /// Create a new HTTP backend from configuration.
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build upstream HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a transport-level failure (connect, timeout, body read) into an `AppError`.
fn transport_error(operation: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::with_source(
            ErrorKind::Timeout,
            format!("{operation} timed out"),
            err,
        )
    } else {
        AppError::with_source(
            ErrorKind::ExternalService,
            format!("{operation} failed: {err}"),
            err,
        )
    }
}

/// Read a JSON response, turning non-2xx statuses into upstream errors that
/// carry the response body as details.
async fn read_json<T: DeserializeOwned>(operation: &str, response: Response) -> AppResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(operation, e))?;

    if !status.is_success() {
        let details = serde_json::from_str::<serde_json::Value>(&text)
            .unwrap_or_else(|_| serde_json::json!({ "status": status.as_u16(), "body": text }));
        return Err(AppError::external(format!(
            "{operation} returned {status}"
        ))
        .with_details(details));
    }

    serde_json::from_str(&text).map_err(|e| {
        AppError::with_source(
            ErrorKind::ExternalService,
            format!("{operation} returned an unreadable body: {e}"),
            e,
        )
    })
}

/// Truthiness of the upstream `existingNotif` field, which may be a
/// boolean or the notification document itself.
fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        _ => true,
    }
}

#[async_trait]
impl RelayBackend for HttpBackend {
    async fn create_message(
        &self,
        message: &Message,
        credential: &Credential,
    ) -> AppResult<Message> {
        let url = self.url(&format!(
            "/api/messenger/conversations/{}/messages",
            message.conversation_id
        ));
        debug!(url = %url, "Persisting message upstream");

        let body = CreateMessageBody {
            conversation_id: &message.conversation_id,
            sender: &message.sender,
            content: &message.content,
            seen_by: &message.seen_by,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("create message", e))?;

        let envelope: MessageEnvelope = read_json("create message", response).await?;
        Ok(envelope.message)
    }

    async fn has_unread_message_notification(
        &self,
        receiver: &UserId,
        credential: &Credential,
    ) -> AppResult<bool> {
        let url = Url::parse_with_params(
            &self.url("/api/notifications/existingMsgNotif"),
            &[("receiverId", receiver.as_str())],
        )
        .map_err(|e| AppError::configuration(format!("Invalid upstream base URL: {e}")))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| transport_error("check existing notification", e))?;

        let envelope: ExistingNotificationEnvelope =
            read_json("check existing notification", response).await?;
        Ok(is_present(&envelope.existing_notif))
    }

    async fn create_notification(
        &self,
        receiver: &UserId,
        kind: NotificationType,
        credential: &Credential,
    ) -> AppResult<NotificationRecord> {
        let body = CreateNotificationBody {
            receiver_id: receiver,
            kind,
        };

        let response = self
            .client
            .post(self.url("/api/notifications"))
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("create notification", e))?;

        let envelope: NotificationEnvelope = read_json("create notification", response).await?;
        Ok(envelope.notification)
    }

    async fn friends_of(&self, user: &UserId, credential: &Credential) -> AppResult<Vec<UserId>> {
        let response = self
            .client
            .get(self.url(&format!("/api/users/{user}/friends")))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| transport_error("fetch friends", e))?;

        let envelope: FriendsEnvelope = read_json("fetch friends", response).await?;
        Ok(envelope
            .friends
            .into_iter()
            .map(|friend| friend.id().clone())
            .collect())
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}
