pub mod create;
pub mod news;
pub mod possessions;
pub mod stats;
pub mod store_items;
pub mod users;
pub mod utils;

pub use create::{create_tables, open_database};
pub use utils::*;
