//! Data-access seams consumed by the recommendation core
//!
//! The core never owns the schema or writes subscriptions; it only reads
//! through these traits. Implementations must be shareable across request
//! handlers, and a dropped future must cancel the underlying query.

use crate::{
    error::AppResult,
    models::{ListId, Subscription, ToDoList, UserId},
};

/// Read access to the user↔list subscription graph
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// All subscriptions held by a single user
    async fn subscriptions_by_user(&self, user_id: UserId) -> AppResult<Vec<Subscription>>;

    /// Every subscription in the graph, used for neighbour scoring
    async fn all_subscriptions(&self) -> AppResult<Vec<Subscription>>;
}

/// Read access to to-do list metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ListRepository: Send + Sync {
    /// Lists ordered by subscriber count, descending, skipping the user's own subscriptions
    async fn most_popular_excluding(&self, user_id: UserId, limit: i64)
        -> AppResult<Vec<ListId>>;

    /// Lists ordered by creation time, newest first, skipping the user's own subscriptions
    async fn newest_excluding(&self, user_id: UserId, limit: i64) -> AppResult<Vec<ListId>>;

    /// Every list, oldest first
    async fn all_lists(&self) -> AppResult<Vec<ToDoList>>;
}
