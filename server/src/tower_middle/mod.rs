/// Tower middleware wrapped around the API router in the connection loop.
pub mod tower_timeout_handler;

pub use tower_timeout_handler::{TimeoutLayer, TimeoutService};
