//! Notification queries

use crate::notification::entity::Notification;
use crate::shared::error::Result;
use crate::store::Repository;

pub trait NotificationQueries {
    /// A recipient's notifications, newest first.
    fn find_for_recipient(&self, recipient_id: &str) -> Result<Vec<Notification>>;

    fn count_unread(&self, recipient_id: &str) -> Result<usize>;
}

impl<R: Repository<Notification> + ?Sized> NotificationQueries for R {
    fn find_for_recipient(&self, recipient_id: &str) -> Result<Vec<Notification>> {
        let mut found = self.find_where(&|n: &Notification| n.recipient_id == recipient_id)?;
        found.reverse();
        Ok(found)
    }

    fn count_unread(&self, recipient_id: &str) -> Result<usize> {
        Ok(self
            .find_where(&|n: &Notification| n.recipient_id == recipient_id && !n.is_read)?
            .len())
    }
}
