//! Presence queries, answered from the registry without suspending.

use relay_core::types::UserId;

use crate::connection::record::ConnectionRecord;
use crate::message::types::{OutboundEvent, QueryFriendsStatusPayload, QueryUserStatusPayload};
use crate::presence::status::PresenceStatus;

use super::EventRouter;

impl EventRouter {
    pub(super) fn query_user_status(&self, actor: &ConnectionRecord, payload: QueryUserStatusPayload) {
        let status = PresenceStatus::from_online(self.registry.is_online(&payload.user_id));
        self.delivery.to_connection(
            &actor.user_id,
            actor.id,
            OutboundEvent::PresenceChanged {
                user_id: payload.user_id,
                status,
            },
        );
    }

    /// Splits the requested users (or the connection's own friend list)
    /// into online and offline, keeping request order.
    pub(super) fn query_friends_status(
        &self,
        actor: &ConnectionRecord,
        payload: QueryFriendsStatusPayload,
    ) {
        let friends: Vec<UserId> = match payload.friends {
            Some(list) => list.into_iter().map(|f| f.id().clone()).collect(),
            None => actor.friends.clone(),
        };

        let (online, offline): (Vec<UserId>, Vec<UserId>) = self
            .registry
            .read(|r| friends.into_iter().partition(|f| r.is_online(f)));

        self.delivery.to_connection(
            &actor.user_id,
            actor.id,
            OutboundEvent::FriendsStatusReport { online, offline },
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::tests::{Harness, drain};
    use crate::message::types::OutboundEvent;
    use crate::presence::status::PresenceStatus;

    #[tokio::test]
    async fn test_user_status() {
        let h = Harness::new();
        let (alice, mut rx) = h.connect("alice", &[]).await;
        let _bob = h.connect("bob", &[]).await;

        h.send("alice", alice, json!({ "event": "queryUserStatus", "userId": "bob" }))
            .await;
        h.send("alice", alice, json!({ "event": "queryUserStatus", "userId": "carol" }))
            .await;

        assert_eq!(
            drain(&mut rx),
            vec![
                OutboundEvent::PresenceChanged {
                    user_id: "bob".into(),
                    status: PresenceStatus::Online,
                },
                OutboundEvent::PresenceChanged {
                    user_id: "carol".into(),
                    status: PresenceStatus::Offline,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_friends_status_defaults_to_snapshot() {
        let h = Harness::new();
        let _f2 = h.connect("f2", &[]).await;
        let (alice, mut rx) = h.connect("alice", &["f1", "f2", "f3"]).await;

        h.send("alice", alice, json!({ "event": "queryFriendsStatus" })).await;

        assert_eq!(
            drain(&mut rx),
            vec![OutboundEvent::FriendsStatusReport {
                online: vec!["f2".into()],
                offline: vec!["f1".into(), "f3".into()],
            }]
        );
    }

    #[tokio::test]
    async fn test_friends_status_explicit_list_keeps_order() {
        let h = Harness::new();
        let _c = h.connect("c", &[]).await;
        let _a = h.connect("a", &[]).await;
        let (me, mut rx) = h.connect("me", &[]).await;

        h.send(
            "me",
            me,
            json!({ "event": "queryFriendsStatus", "friends": ["c", { "_id": "b" }, "a", "d"] }),
        )
        .await;

        assert_eq!(
            drain(&mut rx),
            vec![OutboundEvent::FriendsStatusReport {
                online: vec!["c".into(), "a".into()],
                offline: vec!["b".into(), "d".into()],
            }]
        );
    }
}
