// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use memory::InMemoryStore;
pub use postgres::{CaseFilters, PostgresClient, PostgresError};
