use serde::{Deserialize, Serialize};

use super::{ListId, UserId};

/// A user's subscription to a to-do list
///
/// Unique per (user, list). The streak counter is maintained by the task
/// tracking subsystem and only carried through here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Subscription {
    pub user_id: UserId,
    #[sqlx(rename = "to_do_list_id")]
    pub list_id: ListId,
    pub streak: i32,
}

impl Subscription {
    /// Creates a fresh subscription with no streak
    pub fn new(user_id: UserId, list_id: ListId) -> Self {
        Self {
            user_id,
            list_id,
            streak: 0,
        }
    }
}
