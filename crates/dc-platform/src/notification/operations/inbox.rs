//! Notification inbox: listing, read toggles and deletion
//!
//! Read state belongs to the recipient alone; these writes go straight to the
//! repository and produce no workflow events.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::notification::entity::{Notification, NotificationType, Priority};
use crate::notification::repository::NotificationQueries;
use crate::shared::authorization_service::{Action, AuthorizationGate, Target};
use crate::shared::error::Result;
use crate::store::EntityStore;
use crate::usecase::ExecutionContext;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub notification_type: Option<NotificationType>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl NotificationFilter {
    pub fn unread() -> Self {
        Self {
            unread_only: true,
            ..Self::default()
        }
    }

    fn accepts(&self, n: &Notification) -> bool {
        (!self.unread_only || !n.is_read)
            && self.notification_type.is_none_or(|t| n.notification_type == t)
            && self.priority.is_none_or(|p| n.priority == p)
    }
}

pub struct NotificationInboxUseCase {
    store: Arc<EntityStore>,
    gate: Arc<AuthorizationGate>,
}

impl NotificationInboxUseCase {
    pub fn new(store: Arc<EntityStore>, gate: Arc<AuthorizationGate>) -> Self {
        Self { store, gate }
    }

    /// The caller's own notifications, newest first.
    pub fn list(&self, filter: &NotificationFilter, ctx: &ExecutionContext) -> Result<Vec<Notification>> {
        self.gate.require(
            &ctx.actor,
            Action::ReadNotifications,
            &Target::owned_by(ctx.principal_id()),
        )?;

        Ok(self
            .store
            .notifications
            .find_for_recipient(ctx.principal_id())?
            .into_iter()
            .filter(|n| filter.accepts(n))
            .collect())
    }

    pub fn unread_count(&self, ctx: &ExecutionContext) -> Result<usize> {
        self.gate.require(
            &ctx.actor,
            Action::ReadNotifications,
            &Target::owned_by(ctx.principal_id()),
        )?;
        self.store.notifications.count_unread(ctx.principal_id())
    }

    pub fn mark_read(&self, notification_id: &str, ctx: &ExecutionContext) -> Result<Notification> {
        self.toggle(notification_id, true, ctx)
    }

    pub fn mark_unread(&self, notification_id: &str, ctx: &ExecutionContext) -> Result<Notification> {
        self.toggle(notification_id, false, ctx)
    }

    fn toggle(&self, notification_id: &str, read: bool, ctx: &ExecutionContext) -> Result<Notification> {
        let mut notification = self.store.notifications.require(notification_id)?;
        self.gate
            .require_on(&ctx.actor, Action::ManageNotifications, &notification)?;

        if read {
            notification.mark_read();
        } else {
            notification.mark_unread();
        }
        self.store.notifications.save(&notification)?;
        Ok(notification)
    }

    /// Mark every unread notification of the caller read. Returns how many
    /// changed.
    pub fn mark_all_read(&self, ctx: &ExecutionContext) -> Result<usize> {
        self.gate.require(
            &ctx.actor,
            Action::ManageNotifications,
            &Target::owned_by(ctx.principal_id()),
        )?;

        let mut changed = 0;
        for mut notification in self.list(&NotificationFilter::unread(), ctx)? {
            notification.mark_read();
            self.store.notifications.save(&notification)?;
            changed += 1;
        }

        debug!(recipient_id = ctx.principal_id(), changed, "Marked all notifications read");
        Ok(changed)
    }

    pub fn delete(&self, notification_id: &str, ctx: &ExecutionContext) -> Result<()> {
        let notification = self.store.notifications.require(notification_id)?;
        self.gate
            .require_on(&ctx.actor, Action::ManageNotifications, &notification)?;

        self.store.notifications.delete(&notification.id)?;
        Ok(())
    }
}
