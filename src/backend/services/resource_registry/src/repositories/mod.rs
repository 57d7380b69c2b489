pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryRepository;
pub use postgres::PostgresJsonRepository;
pub use traits::{Entity, EntityId, EntityRepository};
