mod models;
mod store;

pub use models::{Message, Role, Thread, ThreadId};
pub use store::{ChatStore, StoreError};
