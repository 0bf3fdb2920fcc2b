//! Messaging-surface transitions of the acting connection's own record.

use relay_core::types::ConversationId;
use tracing::debug;

use crate::connection::record::ConnectionRecord;

use super::EventRouter;

impl EventRouter {
    pub(super) fn enter_messaging_surface(&self, actor: &ConnectionRecord) {
        self.update_record(actor, "enterMessagingSurface", ConnectionRecord::enter_messaging_surface);
    }

    pub(super) fn leave_messaging_surface(&self, actor: &ConnectionRecord) {
        self.update_record(actor, "leaveMessagingSurface", ConnectionRecord::leave_messaging_surface);
    }

    pub(super) fn enter_conversation(
        &self,
        actor: &ConnectionRecord,
        conversation: Option<ConversationId>,
    ) {
        self.update_record(actor, "enterConversation", |record| {
            record.enter_conversation(conversation)
        });
    }

    fn update_record(
        &self,
        actor: &ConnectionRecord,
        transition: &str,
        apply: impl FnOnce(&mut ConnectionRecord),
    ) {
        let updated = self.registry.write(|r| {
            r.find_record(&actor.user_id, actor.id).map(|record| {
                apply(record);
                (
                    record.is_on_messaging_surface(),
                    record.current_conversation().cloned(),
                )
            })
        });

        if let Some((on_surface, conversation)) = updated {
            debug!(
                conn_id = %actor.id,
                user_id = %actor.user_id,
                transition,
                on_surface,
                conversation = ?conversation,
                "Surface state changed"
            );
        }
    }
}
