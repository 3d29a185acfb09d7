use std::sync::Arc;

use crate::{
    config::Config,
    db::{create_pool, ListRepository, PgStore, SubscriptionRepository},
    error::AppResult,
    models::{ListId, UserId},
    services::{
        tokenize_title, NeighbourCache, NeighbourScorer, RecommendationService, SourceLimits,
        TitleIndex,
    },
};

/// Shared recommendation components, wired from configuration
///
/// Cheap to clone; every clone shares the same neighbour cache and title index,
/// so one engine serves all request handlers of the host process.
#[derive(Clone)]
pub struct Engine {
    neighbours: Arc<NeighbourCache>,
    titles: Arc<TitleIndex>,
    recommendations: Arc<RecommendationService>,
    lists: Arc<dyn ListRepository>,
}

impl Engine {
    /// Builds the engine over the given repositories
    pub fn new(
        config: &Config,
        subscriptions: Arc<dyn SubscriptionRepository>,
        lists: Arc<dyn ListRepository>,
    ) -> Self {
        let scorer = NeighbourScorer::new(subscriptions.clone(), config.neighbour_limit);
        let neighbours = Arc::new(NeighbourCache::new(scorer, config.neighbour_cache_ttl()));

        let limits = SourceLimits {
            neighbour: config.neighbour_recommendation_limit,
            popular: config.popular_limit,
            newest: config.newest_limit,
        };
        let recommendations = Arc::new(RecommendationService::new(
            neighbours.clone(),
            subscriptions,
            lists.clone(),
            limits,
        ));

        Self {
            neighbours,
            titles: Arc::new(TitleIndex::new(config.title_match_limit)),
            recommendations,
            lists,
        }
    }

    /// Connects to PostgreSQL and builds the engine over it
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_url, config.database_max_connections).await?;
        let store = Arc::new(PgStore::new(pool));

        tracing::info!(
            ttl_secs = config.neighbour_cache_ttl_secs,
            "Recommendation engine connected"
        );

        Ok(Self::new(config, store.clone(), store))
    }

    pub async fn get_recommendations(&self, user_id: UserId) -> AppResult<Vec<ListId>> {
        self.recommendations.get_recommendations(user_id).await
    }

    pub async fn get_nearest_neighbours(&self, user_id: UserId) -> AppResult<Vec<UserId>> {
        self.neighbours.get_nearest_neighbours(user_id).await
    }

    /// Title-indexing trigger for the list-authoring service
    ///
    /// Call whenever a list's title is set or changed. A changed title is
    /// appended; the old words stay until the next rebuild.
    pub fn index_list_title(&self, list_id: ListId, title: &str) {
        self.titles.index_title(list_id, &tokenize_title(title));
    }

    pub fn match_titles<S: AsRef<str>>(&self, words: &[S]) -> Vec<ListId> {
        self.titles.match_titles(words)
    }

    pub fn search_titles(&self, query: &str) -> Vec<ListId> {
        self.titles.search(query)
    }

    /// Rebuilds the title index from every stored list
    ///
    /// Returns the number of lists indexed.
    pub async fn rebuild_title_index(&self) -> AppResult<usize> {
        let lists = self.lists.all_lists().await?;
        self.titles.rebuild(&lists);
        Ok(lists.len())
    }

    /// Recomputes every cached neighbour list now
    pub async fn refresh_neighbours(&self) -> AppResult<()> {
        self.neighbours.refresh().await
    }
}
