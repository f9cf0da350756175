pub mod items;
pub mod news;
pub mod routes;
pub mod stats;
pub mod users;
pub mod utils;

pub use routes::{PathParams, Router, build_api_router};
