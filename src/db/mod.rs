//! Data access layer for the `users` relation.

pub mod models;
pub mod operations;

pub use models::{PublicUser, User};
pub use operations::UserRepository;
