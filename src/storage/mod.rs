mod history;
mod schema;
mod types;

pub use schema::History;
pub use types::StorageError;
