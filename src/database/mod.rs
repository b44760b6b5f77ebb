pub mod access;
pub mod error;
pub mod ids;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod statement;
pub mod store;
pub mod value;

pub use access::{build_dynamic_update, delete_by_id, find_by_id, insert_record, update_record, UpdateOptions};
pub use error::{QueryIntent, StoreError};
pub use ids::{generate_next_id, insert_with_generated_id, IdFormat};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use schema::{TableDescriptor, TableId};
pub use statement::WriteOutcome;
pub use store::RecordStore;
pub use value::{FieldValue, RawExpr, Record, RecordData};
