//! crates/storefront_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the storefront's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or media hosts.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Brand, Cart, Category, ListQuery, Page, Product, ProductFilter, Role, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all port and manager operations.
/// Each variant corresponds to one class of failure the HTTP surface reports.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port
//=========================================================================================

/// Storage for every persisted entity.
///
/// Lookups by id fail with `PortError::NotFound`; `find_*` lookups return `None`.
/// Unique-key violations on insert/update surface as `PortError::Conflict`.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users & Auth ---
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_credentials(&self, user_id: Uuid) -> PortResult<UserCredentials>;

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()>;

    /// Replaces name and email; an email held by another user is a `Conflict`.
    async fn update_user_details(&self, user_id: Uuid, name: &str, email: &str)
        -> PortResult<User>;

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    /// Removes the user along with their sessions and cart.
    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves an unexpired session to its user, failing with `Unauthorized` otherwise.
    /// An expired session is removed on the way out.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    async fn delete_user_auth_sessions(&self, user_id: Uuid) -> PortResult<()>;

    /// Drops every session that expired at or before `now`; returns how many went.
    async fn delete_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64>;

    // --- Brands ---
    async fn insert_brand(&self, brand: &Brand) -> PortResult<Brand>;

    async fn get_brand(&self, brand_id: Uuid) -> PortResult<Brand>;

    async fn find_brand_by_name(&self, name: &str) -> PortResult<Option<Brand>>;

    async fn list_brands(&self, query: ListQuery) -> PortResult<Page<Brand>>;

    async fn update_brand(&self, brand: &Brand) -> PortResult<Brand>;

    async fn delete_brand(&self, brand_id: Uuid) -> PortResult<()>;

    // --- Categories ---
    async fn insert_category(&self, category: &Category) -> PortResult<Category>;

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category>;

    async fn find_category_by_name(&self, name: &str) -> PortResult<Option<Category>>;

    async fn list_categories(&self, query: ListQuery) -> PortResult<Page<Category>>;

    /// Categories without a parent, ordered by `(order, name)`.
    async fn root_categories(&self) -> PortResult<Vec<Category>>;

    /// Direct children of `parent_id`, ordered by `(order, name)`.
    async fn subcategories_of(&self, parent_id: Uuid) -> PortResult<Vec<Category>>;

    async fn update_category(&self, category: &Category) -> PortResult<Category>;

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()>;

    // --- Products ---
    async fn insert_product(&self, product: &Product) -> PortResult<Product>;

    async fn get_product(&self, product_id: Uuid) -> PortResult<Product>;

    /// Fetches whichever of `product_ids` still exist, in no particular order.
    async fn get_products(&self, product_ids: &[Uuid]) -> PortResult<Vec<Product>>;

    async fn find_product_by_sku(&self, sku: &str) -> PortResult<Option<Product>>;

    async fn list_products(
        &self,
        filter: &ProductFilter,
        query: ListQuery,
    ) -> PortResult<Page<Product>>;

    async fn products_by_brand(&self, brand_id: Uuid) -> PortResult<Vec<Product>>;

    /// Products whose category is any of `category_ids`.
    async fn products_in_categories(&self, category_ids: &[Uuid]) -> PortResult<Vec<Product>>;

    async fn count_products_by_brand(&self, brand_id: Uuid) -> PortResult<u64>;

    async fn count_products_by_category(&self, category_id: Uuid) -> PortResult<u64>;

    async fn update_product(&self, product: &Product) -> PortResult<Product>;

    async fn delete_product(&self, product_id: Uuid) -> PortResult<()>;

    // --- Carts ---
    async fn find_cart_by_user(&self, user_id: Uuid) -> PortResult<Option<Cart>>;

    async fn get_cart(&self, cart_id: Uuid) -> PortResult<Cart>;

    /// Inserts an empty cart; a second cart for the same user is a `Conflict`.
    async fn create_cart(&self, cart: &Cart) -> PortResult<Cart>;

    /// Replaces the cart's lines and timestamps with the given state.
    async fn save_cart(&self, cart: &Cart) -> PortResult<Cart>;
}

//=========================================================================================
// Asset Store Port
//=========================================================================================

/// Resize hint passed along with an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: u32,
}

/// A stored asset as reported by the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub external_id: String,
    pub url: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores `data` under `folder` and returns where it can be fetched from.
    async fn upload(
        &self,
        data: Bytes,
        content_type: &str,
        folder: &str,
        transform: ImageTransform,
    ) -> PortResult<StoredAsset>;

    /// Releases a previously uploaded asset.
    async fn destroy(&self, external_id: &str) -> PortResult<()>;

    /// Maps a URL this store handed out back to its external id.
    fn external_id_for_url(&self, url: &str) -> Option<String>;
}
