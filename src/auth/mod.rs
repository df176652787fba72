//! Authentication: request validation, password hashing, the auth service,
//! token issuance and the session cookie.

pub mod cookie;
pub mod handlers;
pub mod password;
pub mod service;
pub mod token;
pub mod validation;

pub use service::AuthService;
pub use token::{Claims, TokenIssuer};
pub use validation::Role;
