use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    error::AppResult,
    models::{ListId, Subscription, ToDoList, UserId},
};

use super::repository::{ListRepository, SubscriptionRepository};

#[derive(Default)]
struct StoreInner {
    lists: BTreeMap<ListId, ToDoList>,
    subscriptions: Vec<Subscription>,
}

impl StoreInner {
    fn subscribed_lists(&self, user_id: UserId) -> HashSet<ListId> {
        self.subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.list_id)
            .collect()
    }

    fn subscriber_counts(&self) -> HashMap<ListId, i64> {
        let mut counts = HashMap::new();
        for subscription in &self.subscriptions {
            *counts.entry(subscription.list_id).or_insert(0) += 1;
        }
        counts
    }

    /// Every list with its derived subscriber count
    fn counted_lists(&self) -> Vec<ToDoList> {
        let counts = self.subscriber_counts();

        self.lists
            .values()
            .map(|list| ToDoList {
                subscriber_count: counts.get(&list.id).copied().unwrap_or(0),
                ..list.clone()
            })
            .collect()
    }

    fn lists_excluding(&self, user_id: UserId) -> Vec<ToDoList> {
        let own = self.subscribed_lists(user_id);
        self.counted_lists()
            .into_iter()
            .filter(|list| !own.contains(&list.id))
            .collect()
    }
}

/// Process-local repository backed by plain collections
///
/// Mirrors the relational store closely enough to drive the engine without a
/// database: subscriptions are unique per (user, list) and subscriber counts
/// are derived on read.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a list, replacing any list with the same id
    pub fn insert_list(&self, list: ToDoList) {
        self.inner.write().lists.insert(list.id, list);
    }

    /// Subscribes a user to a list
    ///
    /// Returns `false` when the subscription already exists.
    pub fn subscribe(&self, user_id: UserId, list_id: ListId) -> bool {
        let mut inner = self.inner.write();
        let exists = inner
            .subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.list_id == list_id);

        if exists {
            return false;
        }

        inner.subscriptions.push(Subscription::new(user_id, list_id));
        true
    }
}

fn clamp_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn subscriptions_by_user(&self, user_id: UserId) -> AppResult<Vec<Subscription>> {
        Ok(self
            .inner
            .read()
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .copied()
            .collect())
    }

    async fn all_subscriptions(&self) -> AppResult<Vec<Subscription>> {
        Ok(self.inner.read().subscriptions.clone())
    }
}

#[async_trait]
impl ListRepository for InMemoryStore {
    async fn most_popular_excluding(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<ListId>> {
        let mut lists = self.inner.read().lists_excluding(user_id);
        lists.sort_by(|a, b| {
            b.subscriber_count
                .cmp(&a.subscriber_count)
                .then(a.id.cmp(&b.id))
        });

        Ok(lists
            .into_iter()
            .take(clamp_limit(limit))
            .map(|list| list.id)
            .collect())
    }

    async fn newest_excluding(&self, user_id: UserId, limit: i64) -> AppResult<Vec<ListId>> {
        let mut lists = self.inner.read().lists_excluding(user_id);
        lists.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(lists
            .into_iter()
            .take(clamp_limit(limit))
            .map(|list| list.id)
            .collect())
    }

    async fn all_lists(&self) -> AppResult<Vec<ToDoList>> {
        let mut lists = self.inner.read().counted_lists();
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn store_with_lists(count: i64) -> InMemoryStore {
        let store = InMemoryStore::new();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for id in 1..=count {
            store.insert_list(ToDoList::new(
                id,
                100,
                format!("List {}", id),
                base + Duration::days(id),
            ));
        }
        store
    }

    #[test]
    fn test_subscribe_is_unique_per_user_and_list() {
        let store = store_with_lists(1);
        assert!(store.subscribe(1, 1));
        assert!(!store.subscribe(1, 1));
        assert!(store.subscribe(2, 1));
    }

    #[tokio::test]
    async fn test_most_popular_excludes_own_lists() {
        let store = store_with_lists(3);
        // list 3: two subscribers, list 2: one, list 1: none
        store.subscribe(10, 3);
        store.subscribe(11, 3);
        store.subscribe(11, 2);

        let popular = store.most_popular_excluding(12, 10).await.unwrap();
        assert_eq!(popular, vec![3, 2, 1]);

        let popular = store.most_popular_excluding(11, 10).await.unwrap();
        assert_eq!(popular, vec![1]);
    }

    #[tokio::test]
    async fn test_newest_orders_by_creation_and_respects_limit() {
        let store = store_with_lists(5);
        store.subscribe(1, 5);

        let newest = store.newest_excluding(1, 2).await.unwrap();
        assert_eq!(newest, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_negative_limit_yields_nothing() {
        let store = store_with_lists(2);
        assert!(store.newest_excluding(1, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_lists_derives_subscriber_counts() {
        let store = store_with_lists(2);
        store.subscribe(1, 2);
        store.subscribe(2, 2);

        let lists = store.all_lists().await.unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].id, 1);
        assert_eq!(lists[0].subscriber_count, 0);
        assert_eq!(lists[1].subscriber_count, 2);
    }

    #[tokio::test]
    async fn test_subscriptions_by_user() {
        let store = store_with_lists(3);
        store.subscribe(1, 1);
        store.subscribe(1, 3);
        store.subscribe(2, 2);

        let subscriptions = store.subscriptions_by_user(1).await.unwrap();
        let ids: Vec<ListId> = subscriptions.iter().map(|s| s.list_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.all_subscriptions().await.unwrap().len(), 3);
    }
}
