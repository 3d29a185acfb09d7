pub mod neighbour_cache;
pub mod neighbours;
pub mod recommendations;
pub mod title_index;

pub use neighbour_cache::{Clock, NeighbourCache, SystemClock};
pub use neighbours::{score_neighbours, NeighbourScorer};
pub use recommendations::{RecommendationService, SourceLimits};
pub use title_index::{tokenize_title, TitleIndex};
