pub mod db;
pub mod memory;
pub mod models;
pub mod queries;
pub mod schema;
pub mod store;

mod error;

pub use error::Error;
pub use store::{BoxFuture, EntryMutation, Store, TimeField};

pub type Result<T, E = Error> = std::result::Result<T, E>;
