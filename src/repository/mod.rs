use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Address, AddressFields, Contact, ContactFields, ContactFilter, User};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Store-level failures. Services never recover from these; they propagate to the HTTP
/// boundary as 500s (except `Conflict`, which the user service maps on registration).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure (connectivity, constraint, decoding).
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store is unreachable. Produced by the in-memory store's failure switch.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The store client contract. Every filter is a conjunction of exact-match equalities;
/// the contact search is the only substring match. Ownership is always part of the filter:
/// contacts by `username`, addresses by `contact_id`.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn count_users(&self, username: &str) -> RepoResult<i64>;
    async fn find_user(&self, username: &str) -> RepoResult<Option<User>>;
    // Fails with `Conflict` if the username is taken.
    async fn create_user(&self, user: User) -> RepoResult<User>;
    // Only `Some` values are written.
    async fn update_user(
        &self,
        username: &str,
        name: Option<String>,
        password_hash: Option<String>,
    ) -> RepoResult<Option<User>>;
    // Returns false if no such user.
    async fn set_user_token(&self, username: &str, token: Option<String>) -> RepoResult<bool>;

    // --- Contacts (scoped by owner username) ---
    async fn count_contacts(&self, username: &str, id: i64) -> RepoResult<i64>;
    async fn create_contact(&self, username: &str, fields: ContactFields) -> RepoResult<Contact>;
    async fn find_contact(&self, username: &str, id: i64) -> RepoResult<Option<Contact>>;
    async fn update_contact(
        &self,
        username: &str,
        id: i64,
        fields: ContactFields,
    ) -> RepoResult<Option<Contact>>;
    // Cascades to the contact's addresses.
    async fn delete_contact(&self, username: &str, id: i64) -> RepoResult<Option<Contact>>;
    // One page, ordered by id.
    async fn search_contacts(&self, username: &str, filter: &ContactFilter)
    -> RepoResult<Vec<Contact>>;
    // Total matches, ignoring paging.
    async fn count_search_contacts(&self, username: &str, filter: &ContactFilter)
    -> RepoResult<i64>;

    // --- Addresses (scoped by parent contact id) ---
    async fn count_addresses(&self, contact_id: i64, id: i64) -> RepoResult<i64>;
    async fn create_address(&self, contact_id: i64, fields: AddressFields) -> RepoResult<Address>;
    async fn find_address(&self, contact_id: i64, id: i64) -> RepoResult<Option<Address>>;
    // Overwrites every column; `None` stores NULL.
    async fn update_address(
        &self,
        contact_id: i64,
        id: i64,
        fields: AddressFields,
    ) -> RepoResult<Option<Address>>;
    async fn delete_address(&self, contact_id: i64, id: i64) -> RepoResult<Option<Address>>;
    // Ordered by id.
    async fn list_addresses(&self, contact_id: i64) -> RepoResult<Vec<Address>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

