pub mod claims;
pub mod guard;
pub mod token;

pub use claims::{ClaimsDecoder, DecodeError};
pub use guard::{Denied, Operation, Policy, authorize, check_call};
pub use token::TokenIssuer;
