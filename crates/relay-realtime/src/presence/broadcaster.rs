//! Presence broadcaster: fans a user's online/offline transition out to
//! their friends.

use relay_core::types::UserId;

use crate::fanout::FanOutReport;
use crate::message::types::OutboundEvent;
use crate::router::delivery::Delivery;

use super::status::PresenceStatus;

/// Announces first-connection and last-disconnection transitions.
#[derive(Debug, Clone)]
pub struct PresenceBroadcaster {
    delivery: Delivery,
}

impl PresenceBroadcaster {
    /// Create a broadcaster that delivers through `delivery`.
    pub fn new(delivery: Delivery) -> Self {
        Self { delivery }
    }

    /// Deliver `presenceChanged(status)` for `user` to every connection of
    /// every online friend. Offline friends are skipped; each friend is
    /// independent of the others.
    pub async fn broadcast(
        &self,
        user: &UserId,
        friends: &[UserId],
        status: PresenceStatus,
    ) -> FanOutReport {
        let event = OutboundEvent::PresenceChanged {
            user_id: user.clone(),
            status,
        };

        let report = FanOutReport::collect(friends.iter().map(|friend| {
            let event = &event;
            async move { (friend.clone(), Ok(self.delivery.to_user(friend, event))) }
        }))
        .await;

        for (friend, err) in &report.failed {
            tracing::warn!(
                user_id = %user,
                friend_id = %friend,
                status = %status,
                error = %err,
                "Presence change not delivered"
            );
        }
        tracing::debug!(
            user_id = %user,
            status = %status,
            friends = report.targets,
            delivered = report.delivered,
            skipped = report.skipped,
            "Presence change broadcast"
        );
        report
    }
}
