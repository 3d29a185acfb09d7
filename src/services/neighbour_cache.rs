use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{error::AppResult, models::UserId};

use super::neighbours::NeighbourScorer;

/// Source of the current time for cache expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CachedNeighbours {
    cached_at: DateTime<Utc>,
    neighbours: Vec<UserId>,
}

impl CachedNeighbours {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // A clock that moved backwards yields a negative age; treat it as fresh.
        match (now - self.cached_at).to_std() {
            Ok(age) => age > ttl,
            Err(_) => false,
        }
    }
}

/// Per-user slot; the mutex serializes check, recompute and write for one key
type Slot = Arc<Mutex<Option<CachedNeighbours>>>;

/// Lazily refreshed, time-bounded memoization of nearest neighbours
///
/// Each user gets one entry. A lookup within the TTL returns the stored list
/// untouched; an expired entry is recomputed and fully replaced. Concurrent
/// callers for the same user wait on that user's slot, so only one of them
/// runs the scorer. Different users never contend beyond the map shard.
///
/// Entries live for the lifetime of the cache; there is no eviction.
pub struct NeighbourCache {
    scorer: NeighbourScorer,
    entries: DashMap<UserId, Slot>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl NeighbourCache {
    pub fn new(scorer: NeighbourScorer, ttl: Duration) -> Self {
        Self::with_clock(scorer, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(scorer: NeighbourScorer, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            scorer,
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    fn slot(&self, user_id: UserId) -> Slot {
        // The shard guard is released at the end of this statement, before any await.
        Arc::clone(&self.entries.entry(user_id).or_default())
    }

    /// Returns the user's nearest neighbours, recomputing only when absent or expired
    pub async fn get_nearest_neighbours(&self, user_id: UserId) -> AppResult<Vec<UserId>> {
        let slot = self.slot(user_id);
        let mut entry = slot.lock().await;

        match entry.as_ref() {
            Some(cached) if !cached.is_expired(self.clock.now(), self.ttl) => {
                tracing::debug!(user_id, "Neighbour cache hit");
                return Ok(cached.neighbours.clone());
            }
            Some(cached) => {
                tracing::debug!(
                    user_id,
                    cached_at = %cached.cached_at,
                    "Neighbour cache entry expired"
                );
            }
            None => {
                tracing::debug!(user_id, "Neighbour cache miss");
            }
        }

        let neighbours = self.scorer.compute_nearest_neighbours(user_id).await?;

        *entry = Some(CachedNeighbours {
            cached_at: self.clock.now(),
            neighbours: neighbours.clone(),
        });

        Ok(neighbours)
    }

    /// When the user's current entry was computed, if one exists
    pub async fn cached_at(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        let slot = self.entries.get(&user_id).map(|r| Arc::clone(r.value()))?;
        let entry = slot.lock().await;
        entry.as_ref().map(|cached| cached.cached_at)
    }

    /// Recomputes every cached user immediately, regardless of age
    ///
    /// Users whose first computation failed hold an empty slot and are skipped.
    /// Stops at the first failure; entries refreshed before it keep their new values.
    pub async fn refresh(&self) -> AppResult<()> {
        let slots: Vec<(UserId, Slot)> = self
            .entries
            .iter()
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();

        let mut refreshed = 0usize;
        for (user_id, slot) in &slots {
            let mut entry = slot.lock().await;
            if entry.is_none() {
                continue;
            }
            let neighbours = self.scorer.compute_nearest_neighbours(*user_id).await?;
            *entry = Some(CachedNeighbours {
                cached_at: self.clock.now(),
                neighbours,
            });
            refreshed += 1;
        }

        tracing::info!(users = refreshed, "Neighbour cache refreshed");

        Ok(())
    }
}
