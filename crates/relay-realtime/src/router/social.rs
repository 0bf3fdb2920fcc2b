//! Posts and friend requests.

use tracing::{debug, info, warn};

use relay_core::types::NotificationType;

use crate::connection::record::ConnectionRecord;
use crate::fanout::FanOutReport;
use crate::message::types::{AcceptFriendRequestPayload, FriendRequestPayload, OutboundEvent};

use super::EventRouter;

impl EventRouter {
    /// Creates a post notification for each friend of the publisher and
    /// delivers it to those online. Each friend succeeds or fails alone.
    pub(super) async fn publish_post(&self, actor: &ConnectionRecord) -> FanOutReport {
        let report = FanOutReport::collect(actor.friends.iter().map(|friend| async move {
            let result = self
                .coordinator
                .create_notification(friend, &actor.credential, &actor.profile, NotificationType::Post)
                .await
                .map(|notification| {
                    self.delivery
                        .to_user(friend, &OutboundEvent::NotificationDelivered { notification })
                });
            (friend.clone(), result)
        }))
        .await;

        for (friend, err) in &report.failed {
            warn!(
                user_id = %actor.user_id,
                friend_id = %friend,
                error = %err,
                "Post notification failed for friend"
            );
            if err.is_upstream() {
                self.local_error(actor, err);
            }
        }
        info!(
            conn_id = %actor.id,
            user_id = %actor.user_id,
            friends = report.targets,
            delivered = report.delivered,
            offline = report.skipped,
            failed = report.failed.len(),
            "Post published"
        );
        report
    }

    /// Forwards a friend request, stamped with the requester's profile.
    pub(super) fn send_friend_request(&self, actor: &ConnectionRecord, payload: FriendRequestPayload) {
        let notification = payload.notification.attach_sender(actor.profile.clone());
        let receiver = notification.receiver.clone();
        let outcome = self
            .delivery
            .to_user(&receiver, &OutboundEvent::FriendRequestDelivered { notification });
        debug!(
            user_id = %actor.user_id,
            receiver_id = %receiver,
            outcome = ?outcome,
            "Friend request forwarded"
        );
    }

    /// Tells the requester their request was accepted and retires the
    /// accepting user's pending request on all their connections.
    pub(super) fn accept_friend_request(
        &self,
        actor: &ConnectionRecord,
        payload: AcceptFriendRequestPayload,
    ) {
        let notification = payload.notification.attach_sender(actor.profile.clone());
        let receiver = notification.receiver.clone();
        let outcome = self
            .delivery
            .to_user(&receiver, &OutboundEvent::FriendRequestDelivered { notification });

        self.delivery.to_user(
            &actor.user_id,
            &OutboundEvent::NotificationRetired {
                notification_id: payload.pending_notification_id.clone(),
            },
        );
        debug!(
            user_id = %actor.user_id,
            receiver_id = %receiver,
            retired = %payload.pending_notification_id,
            outcome = ?outcome,
            "Friend request accepted"
        );
    }
}
