pub mod equip;
pub mod ledger;
pub mod news;
pub mod stats;
pub mod store_items;
pub mod users;

pub use news::NewsService;
pub use stats::StatsService;
pub use store_items::StoreService;
pub use users::UsersService;
