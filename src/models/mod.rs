use serde::{Deserialize, Serialize};

pub mod subscription;
pub mod to_do_list;

pub use subscription::Subscription;
pub use to_do_list::ToDoList;

/// Identifier of a user, owned by the external auth subsystem
pub type UserId = i64;

/// Identifier of a to-do list
pub type ListId = i64;

/// Similarity of one candidate user to a target user
///
/// Produced by the neighbour scorer before truncation so callers can inspect
/// exact scores, not just the ranked ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NeighbourScore {
    pub user_id: UserId,
    pub score: f64,
}
