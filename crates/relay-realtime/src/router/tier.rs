//! Delivery tier classification for chat messages.

use std::fmt;

use relay_core::types::{ConnectionId, ConversationId};

use crate::connection::record::ConnectionRecord;

/// Where a chat message goes, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTier {
    /// A receiver connection has the message's conversation open.
    SameConversation,
    /// A receiver connection is in the messaging UI, elsewhere.
    MessagingSurface,
    /// Offline, or online but outside the messaging UI.
    Unreachable,
}

impl fmt::Display for DeliveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameConversation => write!(f, "same_conversation"),
            Self::MessagingSurface => write!(f, "messaging_surface"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// A tier and the receiver connections it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierDecision {
    /// Chosen tier.
    pub tier: DeliveryTier,
    /// Connections to deliver to live; empty for [`DeliveryTier::Unreachable`].
    pub targets: Vec<ConnectionId>,
}

/// Classifies a snapshot of the receiver's connections.
pub fn classify(records: &[ConnectionRecord], conversation: &ConversationId) -> TierDecision {
    let same: Vec<ConnectionId> = records
        .iter()
        .filter(|r| r.is_on_messaging_surface() && r.is_in_conversation(conversation))
        .map(|r| r.id)
        .collect();
    if !same.is_empty() {
        return TierDecision {
            tier: DeliveryTier::SameConversation,
            targets: same,
        };
    }

    let surface: Vec<ConnectionId> = records
        .iter()
        .filter(|r| r.is_on_messaging_surface())
        .map(|r| r.id)
        .collect();
    if !surface.is_empty() {
        return TierDecision {
            tier: DeliveryTier::MessagingSurface,
            targets: surface,
        };
    }

    TierDecision {
        tier: DeliveryTier::Unreachable,
        targets: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::record::tests::record_for;

    fn conv(id: &str) -> ConversationId {
        ConversationId::from(id)
    }

    #[test]
    fn test_no_connections_is_unreachable() {
        let decision = classify(&[], &conv("x"));
        assert_eq!(decision.tier, DeliveryTier::Unreachable);
        assert!(decision.targets.is_empty());
    }

    #[test]
    fn test_same_conversation_takes_precedence() {
        let (mut in_x, _a) = record_for("bob", &[]);
        in_x.enter_conversation(Some(conv("x")));
        let (mut in_y, _b) = record_for("bob", &[]);
        in_y.enter_conversation(Some(conv("y")));
        let (idle, _c) = record_for("bob", &[]);

        let decision = classify(&[idle, in_y, in_x.clone()], &conv("x"));
        assert_eq!(decision.tier, DeliveryTier::SameConversation);
        assert_eq!(decision.targets, vec![in_x.id]);
    }

    #[test]
    fn test_surface_without_matching_conversation() {
        let (mut on_surface, _a) = record_for("bob", &[]);
        on_surface.enter_messaging_surface();
        let (mut in_y, _b) = record_for("bob", &[]);
        in_y.enter_conversation(Some(conv("y")));
        let (idle, _c) = record_for("bob", &[]);

        let decision = classify(&[on_surface.clone(), idle, in_y.clone()], &conv("x"));
        assert_eq!(decision.tier, DeliveryTier::MessagingSurface);
        assert_eq!(decision.targets, vec![on_surface.id, in_y.id]);
    }

    #[test]
    fn test_online_off_surface_is_unreachable() {
        let (idle, _a) = record_for("bob", &[]);
        let (mut left, _b) = record_for("bob", &[]);
        left.enter_conversation(Some(conv("x")));
        left.leave_messaging_surface();

        let decision = classify(&[idle, left], &conv("x"));
        assert_eq!(decision.tier, DeliveryTier::Unreachable);
    }
}
