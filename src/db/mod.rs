pub mod history;
pub mod postgres;
pub mod users;

pub use history::{HistoryStore, PgHistoryStore};
pub use postgres::{create_pool, run_migrations};
pub use users::{PgUserStore, UserStore};
