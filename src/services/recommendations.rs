use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::{ListRepository, SubscriptionRepository},
    error::AppResult,
    models::{ListId, UserId},
};

use super::neighbour_cache::NeighbourCache;

/// Number of lists each recommendation source contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLimits {
    pub neighbour: usize,
    pub popular: i64,
    pub newest: i64,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            neighbour: 10,
            popular: 10,
            newest: 10,
        }
    }
}

/// Generates personalized list recommendations
///
/// Three sources are consulted in fixed precedence: lists held by the user's
/// nearest neighbours, the most subscribed lists, and the newest lists. None
/// of them returns a list the user already subscribes to. The merged result
/// keeps each list at its first position and is not capped; callers paginate.
pub struct RecommendationService {
    neighbours: Arc<NeighbourCache>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    lists: Arc<dyn ListRepository>,
    limits: SourceLimits,
}

impl RecommendationService {
    pub fn new(
        neighbours: Arc<NeighbourCache>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        lists: Arc<dyn ListRepository>,
        limits: SourceLimits,
    ) -> Self {
        Self {
            neighbours,
            subscriptions,
            lists,
            limits,
        }
    }

    /// Returns deduplicated list ids, neighbour picks first, then popular, then newest
    ///
    /// Any failing source fails the whole call.
    pub async fn get_recommendations(&self, user_id: UserId) -> AppResult<Vec<ListId>> {
        let by_neighbours = self.recommend_by_neighbours(user_id).await?;
        let most_popular = self
            .lists
            .most_popular_excluding(user_id, self.limits.popular)
            .await?;
        let newest = self
            .lists
            .newest_excluding(user_id, self.limits.newest)
            .await?;

        tracing::debug!(
            user_id,
            neighbours = by_neighbours.len(),
            popular = most_popular.len(),
            newest = newest.len(),
            "Collected recommendation candidates"
        );

        let recommendations = merge_sources([by_neighbours, most_popular, newest]);

        tracing::info!(
            user_id,
            count = recommendations.len(),
            "Recommendations generated"
        );

        Ok(recommendations)
    }

    /// Lists subscribed to by the user's nearest neighbours but not by the user
    ///
    /// Ranked by how many neighbours hold each list; ties keep the order in
    /// which the lists were first seen walking neighbours closest first.
    pub async fn recommend_by_neighbours(&self, user_id: UserId) -> AppResult<Vec<ListId>> {
        let neighbours = self.neighbours.get_nearest_neighbours(user_id).await?;
        if neighbours.is_empty() {
            return Ok(Vec::new());
        }

        // One read of the graph covers both the user's own lists and every neighbour's.
        let mut own: HashSet<ListId> = HashSet::new();
        let mut held: HashMap<UserId, Vec<ListId>> =
            neighbours.iter().map(|&n| (n, Vec::new())).collect();
        for subscription in self.subscriptions.all_subscriptions().await? {
            if subscription.user_id == user_id {
                own.insert(subscription.list_id);
            } else if let Some(lists) = held.get_mut(&subscription.user_id) {
                lists.push(subscription.list_id);
            }
        }

        let mut candidates: Vec<(ListId, usize)> = Vec::new();
        let mut positions: HashMap<ListId, usize> = HashMap::new();

        for neighbour in &neighbours {
            let lists = held.remove(neighbour).unwrap_or_default();
            for list_id in lists {
                if own.contains(&list_id) {
                    continue;
                }
                match positions.get(&list_id) {
                    Some(&position) => candidates[position].1 += 1,
                    None => {
                        positions.insert(list_id, candidates.len());
                        candidates.push((list_id, 1));
                    }
                }
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(candidates
            .into_iter()
            .take(self.limits.neighbour)
            .map(|(list_id, _)| list_id)
            .collect())
    }
}

/// Concatenates sources in order, keeping only the first occurrence of each id
fn merge_sources<const N: usize>(sources: [Vec<ListId>; N]) -> Vec<ListId> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .flatten()
        .filter(|list_id| seen.insert(*list_id))
        .collect()
}
