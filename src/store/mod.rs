//! Persistence layer.
//!
//! Handlers talk to the database through `ClientStore` and `UserStore` so that the
//! request flow can be exercised against in-memory implementations in tests.
//! `PgStore` is the PostgreSQL implementation used in production.

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::config::AdminSeed;
use crate::error::AppError;
use crate::models::{user::normalize_email, Client, ClientView, Page, PageRequest, Role, User};

pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Looks a user up by (normalized, lower-case) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Overwrites the stored user with `user`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user no longer exists.
    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    /// Removes the user, unassigning it from any clients, and returns the removed record.
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn list_users(&self, role: Role, page: &PageRequest) -> Result<Page<User>, AppError>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn insert_client(&self, client: &Client) -> Result<(), AppError>;

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError>;

    /// Like `find_client`, with the assigned user populated.
    async fn find_client_view(&self, id: Uuid) -> Result<Option<ClientView>, AppError>;

    /// Overwrites the stored client with `client`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the client no longer exists.
    async fn update_client(&self, client: &Client) -> Result<(), AppError>;

    async fn delete_client(&self, id: Uuid) -> Result<Option<Client>, AppError>;

    async fn list_clients(&self, page: &PageRequest) -> Result<Page<ClientView>, AppError>;
}

/// Creates the admin account named by `seed` unless a user with that email exists.
///
/// Returns `true` when an account was created.
pub async fn ensure_admin(
    users: &dyn UserStore,
    seed: &AdminSeed,
    bcrypt_cost: u32,
) -> Result<bool, AppError> {
    let email = normalize_email(&seed.email);
    if users.find_user_by_email(&email).await?.is_some() {
        return Ok(false);
    }
    let password_hash = hash_password(&seed.password, bcrypt_cost)?;
    let admin = User::new(&email, "Admin".to_string(), password_hash, Role::Admin);
    users.insert_user(&admin).await?;
    log::info!("seeded admin account {}", admin.email);
    Ok(true)
}
