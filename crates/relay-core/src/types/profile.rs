//! Display-profile snapshots and credentials presented at connection time.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::id::UserId;

/// Minimal public profile of a user, attached to notifications and
/// friend requests so the receiving client can render them without a
/// round-trip to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSnapshot {
    /// User ID.
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
}

/// A reference to a user as it appears in upstream payloads: either a
/// bare ID or a populated profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    /// Populated profile.
    Profile(SenderSnapshot),
    /// Bare identifier.
    Id(UserId),
}

impl UserRef {
    /// The referenced user's ID.
    pub fn id(&self) -> &UserId {
        match self {
            Self::Profile(profile) => &profile.id,
            Self::Id(id) => id,
        }
    }
}

/// Deserialize a user ID that may be sent either as a string or as a
/// populated profile object.
pub fn deserialize_user_ref<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match UserRef::deserialize(deserializer)? {
        UserRef::Profile(profile) => profile.id,
        UserRef::Id(id) => id,
    })
}

/// Opaque bearer credential forwarded to the upstream API on a
/// connection's behalf. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
