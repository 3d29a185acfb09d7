pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryStore;
pub use postgres::{create_pool, PgStore};
pub use repository::{ListRepository, SubscriptionRepository};

#[cfg(test)]
pub use repository::{MockListRepository, MockSubscriptionRepository};
