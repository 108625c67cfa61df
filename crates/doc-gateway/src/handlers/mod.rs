//! HTTP request handlers.

mod health;
mod me;
mod users;

pub use health::health_check;
pub use me::get_me;
pub use users::{create_user, get_user, list_users, upsert_user};
