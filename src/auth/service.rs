use tracing::info;

use crate::auth::password;
use crate::auth::validation::{SignInData, SignUpData};
use crate::db::models::PublicUser;
use crate::db::UserRepository;
use crate::error::{AppError, AuthError, DatabaseError};

/// Business rules for registration and authentication. Owns the repository
/// and hashing orchestration; hands out public user views only.
#[derive(Clone)]
pub struct AuthService {
    repo: UserRepository,
}

impl AuthService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Registers a new user. The existence pre-check and the insert are not
    /// atomic; the database uniqueness constraint is the authoritative guard
    /// for the race and maps to the same outcome.
    pub async fn register(&self, data: SignUpData) -> Result<PublicUser, AppError> {
        if self.repo.find_by_email(&data.email).await?.is_some() {
            return Err(AuthError::EmailExists.into());
        }

        let password_hash = password::hash(&data.password)?;

        let user = match self
            .repo
            .insert(&data.name, &data.email, &password_hash, data.role.as_str())
            .await
        {
            Ok(user) => user,
            Err(AppError::Database(DatabaseError::Duplicate)) => {
                return Err(AuthError::EmailExists.into());
            }
            Err(e) => return Err(e),
        };

        info!("User created: {} ({})", user.name, user.email);
        Ok(user.public())
    }

    /// Authenticates by email and password. `UserNotFound` and
    /// `InvalidCredentials` render identically at the boundary; the split
    /// exists only for internal discrimination.
    pub async fn authenticate(&self, data: SignInData) -> Result<PublicUser, AppError> {
        let user = self
            .repo
            .find_by_email(&data.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !password::verify(&data.password, &user.password)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(user.public())
    }
}
