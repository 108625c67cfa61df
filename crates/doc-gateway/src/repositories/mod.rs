//! Store access layer.

mod users;

pub use users::{MemoryUserStore, PostgresUserStore, UserStore};
