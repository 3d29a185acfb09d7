use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListId, UserId};

/// A to-do list as seen by the recommendation core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToDoList {
    pub id: ListId,
    pub author_id: UserId,
    /// Source text for the title index
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Number of users subscribed to the list, derived from subscriptions
    pub subscriber_count: i64,
}

impl ToDoList {
    /// Creates a list with no subscribers yet
    pub fn new(
        id: ListId,
        author_id: UserId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_id,
            title: title.into(),
            created_at,
            subscriber_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_list() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let list = ToDoList::new(1, 10, "Morning routine", created_at);

        assert_eq!(list.id, 1);
        assert_eq!(list.author_id, 10);
        assert_eq!(list.title, "Morning routine");
        assert_eq!(list.created_at, created_at);
        assert_eq!(list.subscriber_count, 0);
    }
}
