pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, GoogleLoginResult, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod search_service;
pub mod search_service_impl;
pub use search_service::{SearchError, SearchService};
pub use search_service_impl::DefaultSearchService;

pub mod token_service;
pub use token_service::{TokenError, TokenService};
