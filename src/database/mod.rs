pub mod collection;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use collection::{Collection, Document, Page, PageRequest};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{DocumentStore, StoreError};
