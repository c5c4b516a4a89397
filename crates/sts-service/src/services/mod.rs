pub mod admin_service;
pub mod rate_limiter;
pub mod token_issuer;
pub mod token_service;
pub mod token_validator;

pub use admin_service::AdminService;
pub use rate_limiter::RateLimiter;
pub use token_issuer::TokenIssuer;
pub use token_service::TokenService;
pub use token_validator::TokenValidator;
