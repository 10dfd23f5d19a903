//! Command implementations.

pub mod ask;
pub mod extract;
pub mod load;
pub mod stats;
pub mod summarize;
pub mod user;

pub use self::ask::execute_ask;
pub use self::extract::execute_extract;
pub use self::load::{execute_load, execute_save};
pub use self::stats::{execute_history, execute_stats};
pub use self::summarize::execute_summarize;
pub use self::user::execute_user;
