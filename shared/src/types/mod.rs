pub mod claims;
pub mod json_error;
pub mod login;
pub mod news;
pub mod server_config;
pub mod stats;
pub mod store;
pub mod users;

pub use self::claims::{GameClaims, SERVICE_AUDIENCE, TOKEN_ISSUER, USER_AUDIENCE};
pub use self::json_error::{ErrorResponse, SuccessResponse};
pub use self::login::{LoginData, LoginResponse};
pub use self::news::{CreateNewsRequest, NewsView, UpdateNewsRequest};
pub use self::server_config::{AppConfig, ConfigError};
pub use self::stats::{UpdateStatsRequest, UserStatsView};
pub use self::store::{
    CreateStoreItemRequest, StoreItemView, UpdateStoreItemRequest, UserItemInfo,
    UserItemsResponse,
};
pub use self::users::{Balances, CreateUserRequest, GrantCurrenciesRequest, UserView, VersionResponse};
