//! Connection authentication: validates the handshake frame a client sends
//! before any event is processed.

use serde::Deserialize;

use relay_core::error::AppError;
use relay_core::types::{Credential, SenderSnapshot, UserId, UserRef};

/// Authenticated connection info extracted from the handshake.
#[derive(Debug, Clone)]
pub struct AuthenticatedConnection {
    /// User ID.
    pub user_id: UserId,
    /// Credential forwarded upstream.
    pub credential: Credential,
    /// Display profile.
    pub profile: SenderSnapshot,
    /// Friend list carried by the handshake, if any.
    pub friends: Option<Vec<UserId>>,
}

#[derive(Debug, Deserialize)]
struct HandshakeFrame {
    user: Option<HandshakeUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandshakeUser {
    user_info: Option<HandshakeProfile>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HandshakeProfile {
    #[serde(flatten)]
    profile: SenderSnapshot,
    #[serde(default)]
    friends: Option<Vec<UserRef>>,
}

/// Authenticates connections from their handshake frame.
///
/// The relay does not issue or verify tokens; it only requires that an
/// identity, a profile and a credential are all present. The credential is
/// checked by the upstream API on every call made on the connection's behalf.
#[derive(Debug, Clone, Default)]
pub struct ConnectionAuthenticator;

impl ConnectionAuthenticator {
    /// Creates a new authenticator.
    pub fn new() -> Self {
        Self
    }

    /// Authenticates a connection from the raw handshake text.
    pub fn authenticate(&self, raw: &str) -> Result<AuthenticatedConnection, AppError> {
        let frame: HandshakeFrame = serde_json::from_str(raw)
            .map_err(|e| AppError::authentication(format!("Malformed handshake: {e}")))?;

        let user = frame
            .user
            .ok_or_else(|| AppError::authentication("Handshake is missing the user"))?;
        let info = user
            .user_info
            .ok_or_else(|| AppError::authentication("Handshake is missing the user profile"))?;
        if info.profile.id.is_empty() {
            return Err(AppError::authentication("Handshake is missing the user id"));
        }

        let credential = user
            .token
            .map(Credential::new)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::authentication("Handshake is missing the token"))?;

        let friends = info
            .friends
            .map(|list| list.into_iter().map(|f| f.id().clone()).collect());

        Ok(AuthenticatedConnection {
            user_id: info.profile.id.clone(),
            credential,
            profile: info.profile,
            friends,
        })
    }
}

#[cfg(test)]
mod tests {
    use relay_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_valid_handshake() {
        let raw = r#"{"user":{"userInfo":{"_id":"u1","firstName":"Ada","lastName":"L","friends":["u2",{"_id":"u3"}]},"token":"t"}}"#;
        let auth = ConnectionAuthenticator::new().authenticate(raw).unwrap();
        assert_eq!(auth.user_id, UserId::from("u1"));
        assert_eq!(auth.credential.expose(), "t");
        assert_eq!(auth.profile.first_name, "Ada");
        assert_eq!(
            auth.friends,
            Some(vec![UserId::from("u2"), UserId::from("u3")])
        );
    }

    #[test]
    fn test_friends_are_optional() {
        let raw = r#"{"user":{"userInfo":{"_id":"u1"},"token":"t"}}"#;
        let auth = ConnectionAuthenticator::new().authenticate(raw).unwrap();
        assert!(auth.friends.is_none());
    }

    #[test]
    fn test_missing_pieces_are_rejected() {
        let auth = ConnectionAuthenticator::new();
        for raw in [
            r#"{}"#,
            r#"{"user":{"token":"t"}}"#,
            r#"{"user":{"userInfo":{"_id":""},"token":"t"}}"#,
            r#"{"user":{"userInfo":{"_id":"u1"}}}"#,
            r#"{"user":{"userInfo":{"_id":"u1"},"token":"  "}}"#,
            "not json",
        ] {
            let err = auth.authenticate(raw).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Authentication, "accepted {raw}");
        }
    }
}
