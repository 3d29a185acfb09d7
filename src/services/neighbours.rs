use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::{
    db::SubscriptionRepository,
    error::AppResult,
    models::{ListId, NeighbourScore, Subscription, UserId},
};

/// Weight applied to each of the target's lists a candidate does not share
const UNIQUE_DIFFERENCE_PENALTY: f64 = 0.5;

/// Scores every other user against the target's subscription set
///
/// `score = common - 0.5 * (|target| - common)`, unnormalized. Results are
/// sorted by descending score; ties keep ascending user id order.
pub fn score_neighbours(
    user_id: UserId,
    target_lists: &HashSet<ListId>,
    subscriptions: &[Subscription],
) -> Vec<NeighbourScore> {
    let mut common_by_user: BTreeMap<UserId, usize> = BTreeMap::new();

    for subscription in subscriptions {
        if subscription.user_id == user_id {
            continue;
        }
        let common = common_by_user.entry(subscription.user_id).or_insert(0);
        if target_lists.contains(&subscription.list_id) {
            *common += 1;
        }
    }

    let target_size = target_lists.len() as f64;
    let mut scores: Vec<NeighbourScore> = common_by_user
        .into_iter()
        .map(|(user_id, common)| {
            let common = common as f64;
            let unique_difference = target_size - common;
            NeighbourScore {
                user_id,
                score: common - UNIQUE_DIFFERENCE_PENALTY * unique_difference,
            }
        })
        .collect();

    // stable: equal scores stay in ascending user id order
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

/// Collaborative-filtering neighbour search over the subscription graph
pub struct NeighbourScorer {
    subscriptions: Arc<dyn SubscriptionRepository>,
    limit: usize,
}

impl NeighbourScorer {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, limit: usize) -> Self {
        Self {
            subscriptions,
            limit,
        }
    }

    /// Returns up to `limit` users whose subscriptions best overlap the user's
    ///
    /// A user without subscriptions has no basis for comparison and gets an
    /// empty result without the full graph being loaded.
    pub async fn compute_nearest_neighbours(&self, user_id: UserId) -> AppResult<Vec<UserId>> {
        let target_lists: HashSet<ListId> = self
            .subscriptions
            .subscriptions_by_user(user_id)
            .await?
            .into_iter()
            .map(|s| s.list_id)
            .collect();

        if target_lists.is_empty() {
            tracing::debug!(user_id, "User has no subscriptions, no neighbours");
            return Ok(Vec::new());
        }

        let graph = self.subscriptions.all_subscriptions().await?;
        let neighbours: Vec<UserId> = score_neighbours(user_id, &target_lists, &graph)
            .into_iter()
            .take(self.limit)
            .map(|s| s.user_id)
            .collect();

        tracing::debug!(
            user_id,
            subscriptions = target_lists.len(),
            neighbours = neighbours.len(),
            "Computed nearest neighbours"
        );

        Ok(neighbours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockSubscriptionRepository;
    use crate::error::AppError;

    fn subs(pairs: &[(UserId, ListId)]) -> Vec<Subscription> {
        pairs
            .iter()
            .map(|&(user_id, list_id)| Subscription::new(user_id, list_id))
            .collect()
    }

    fn set(ids: &[ListId]) -> HashSet<ListId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_score_matches_formula_exactly() {
        // U = {A, B, C}, V = {A, B}: common 2, unique difference 1
        let graph = subs(&[(1, 10), (1, 11), (1, 12), (2, 10), (2, 11)]);

        let scores = score_neighbours(1, &set(&[10, 11, 12]), &graph);

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].user_id, 2);
        assert_eq!(scores[0].score, 1.5);
    }

    #[test]
    fn test_disjoint_user_scores_negative() {
        let graph = subs(&[(1, 10), (1, 11), (2, 99)]);

        let scores = score_neighbours(1, &set(&[10, 11]), &graph);

        assert_eq!(scores[0].score, -1.0);
    }

    #[test]
    fn test_scores_sorted_descending_with_ascending_id_ties() {
        let graph = subs(&[
            (1, 10),
            (1, 11),
            (5, 10),
            (3, 10),
            (4, 10),
            (4, 11),
            (2, 42),
        ]);

        let scores = score_neighbours(1, &set(&[10, 11]), &graph);
        let ids: Vec<UserId> = scores.iter().map(|s| s.user_id).collect();

        assert_eq!(ids, vec![4, 3, 5, 2]);
        assert_eq!(scores[0].score, 2.0);
        assert_eq!(scores[1].score, 0.5);
        assert_eq!(scores[3].score, -1.0);
    }

    #[tokio::test]
    async fn test_empty_subscriptions_skip_graph_scan() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_subscriptions_by_user()
            .returning(|_| Ok(Vec::new()));
        repo.expect_all_subscriptions().never();

        let scorer = NeighbourScorer::new(Arc::new(repo), 10);
        let neighbours = scorer.compute_nearest_neighbours(1).await.unwrap();

        assert!(neighbours.is_empty());
    }

    #[tokio::test]
    async fn test_results_truncated_to_limit() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_subscriptions_by_user()
            .returning(|user_id| Ok(vec![Subscription::new(user_id, 1)]));
        repo.expect_all_subscriptions().returning(|| {
            let mut graph = vec![Subscription::new(0, 1)];
            graph.extend((1..=20).map(|user_id| Subscription::new(user_id, 1)));
            Ok(graph)
        });

        let scorer = NeighbourScorer::new(Arc::new(repo), 10);
        let neighbours = scorer.compute_nearest_neighbours(0).await.unwrap();

        assert_eq!(neighbours, (1..=10).collect::<Vec<UserId>>());
    }

    #[tokio::test]
    async fn test_data_access_failure_propagates() {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_subscriptions_by_user()
            .returning(|_| Err(AppError::DataAccess("timeout".to_string())));

        let scorer = NeighbourScorer::new(Arc::new(repo), 10);
        let result = scorer.compute_nearest_neighbours(1).await;

        assert!(matches!(result, Err(AppError::DataAccess(_))));
    }
}
