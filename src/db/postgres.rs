use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::AppResult,
    models::{ListId, Subscription, ToDoList, UserId},
};

use super::repository::{ListRepository, SubscriptionRepository};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const SUBSCRIPTIONS_BY_USER: &str = "\
    SELECT user_id, to_do_list_id, streak \
    FROM user_to_to_do_list \
    WHERE user_id = $1 \
    ORDER BY to_do_list_id";

const ALL_SUBSCRIPTIONS: &str = "\
    SELECT user_id, to_do_list_id, streak \
    FROM user_to_to_do_list \
    ORDER BY user_id, to_do_list_id";

const MOST_POPULAR_EXCLUDING: &str = "\
    SELECT l.id \
    FROM to_do_list l \
    LEFT JOIN user_to_to_do_list s ON s.to_do_list_id = l.id \
    WHERE NOT EXISTS ( \
        SELECT 1 FROM user_to_to_do_list own \
        WHERE own.to_do_list_id = l.id AND own.user_id = $1) \
    GROUP BY l.id \
    ORDER BY COUNT(s.id) DESC, l.id ASC \
    LIMIT $2";

const NEWEST_EXCLUDING: &str = "\
    SELECT l.id \
    FROM to_do_list l \
    WHERE NOT EXISTS ( \
        SELECT 1 FROM user_to_to_do_list own \
        WHERE own.to_do_list_id = l.id AND own.user_id = $1) \
    ORDER BY l.created_at DESC, l.id DESC \
    LIMIT $2";

const ALL_LISTS: &str = "\
    SELECT l.id, l.author_id, l.title, l.created_at, \
        (SELECT COUNT(*) FROM user_to_to_do_list s \
            WHERE s.to_do_list_id = l.id) AS subscriber_count \
    FROM to_do_list l \
    ORDER BY l.created_at ASC, l.id ASC";

/// Row shape of `to_do_list` joined with its subscriber count
#[derive(Debug, sqlx::FromRow)]
struct ListRow {
    id: ListId,
    author_id: UserId,
    title: String,
    created_at: DateTime<Utc>,
    subscriber_count: i64,
}

impl From<ListRow> for ToDoList {
    fn from(row: ListRow) -> Self {
        ToDoList {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            created_at: row.created_at,
            subscriber_count: row.subscriber_count,
        }
    }
}

/// Repository implementation over the application's PostgreSQL tables
///
/// Read-only: the schema and all writes belong to the list-authoring service.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgStore {
    async fn subscriptions_by_user(&self, user_id: UserId) -> AppResult<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(SUBSCRIPTIONS_BY_USER)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(user_id, count = subscriptions.len(), "Loaded user subscriptions");

        Ok(subscriptions)
    }

    async fn all_subscriptions(&self) -> AppResult<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(ALL_SUBSCRIPTIONS)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = subscriptions.len(), "Loaded subscription graph");

        Ok(subscriptions)
    }
}

#[async_trait]
impl ListRepository for PgStore {
    async fn most_popular_excluding(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> AppResult<Vec<ListId>> {
        let ids = sqlx::query_scalar::<_, ListId>(MOST_POPULAR_EXCLUDING)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn newest_excluding(&self, user_id: UserId, limit: i64) -> AppResult<Vec<ListId>> {
        let ids = sqlx::query_scalar::<_, ListId>(NEWEST_EXCLUDING)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn all_lists(&self) -> AppResult<Vec<ToDoList>> {
        let rows = sqlx::query_as::<_, ListRow>(ALL_LISTS)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ToDoList::from).collect())
    }
}
