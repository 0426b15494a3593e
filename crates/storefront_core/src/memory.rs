//! crates/storefront_core/src/memory.rs
//!
//! In-process implementations of the `DatabaseService` and `AssetStore` ports.
//! They back the unit tests and the API's `STORAGE=memory` mode. Every call holds
//! the store lock for its whole duration, so a single call is atomic but a
//! sequence of calls is not.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::{
    AuthSession, Brand, Cart, Category, ListQuery, Page, Product, ProductFilter, Role, User,
    UserCredentials,
};
use crate::ports::{
    AssetStore, DatabaseService, ImageTransform, PortError, PortResult, StoredAsset,
};

//=========================================================================================
// Database
//=========================================================================================

#[derive(Default)]
struct Tables {
    users: Vec<(User, String)>,
    sessions: HashMap<String, AuthSession>,
    brands: Vec<Brand>,
    categories: Vec<Category>,
    products: Vec<Product>,
    carts: Vec<Cart>,
}

/// A `DatabaseService` that keeps every table in memory.
///
/// Lists come back newest first, matching the Postgres adapter.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(rows: Vec<&T>, query: ListQuery) -> Page<T> {
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .rev()
        .skip(query.offset() as usize)
        .take(query.limit as usize)
        .cloned()
        .collect();
    Page { items, total, query }
}

fn sort_by_order_and_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
}

fn not_found(kind: &str, id: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", kind, id))
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|(u, _)| u.email == email) {
            return Err(PortError::Conflict(format!(
                "A user with email {} already exists",
                email
            )));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
            last_login: None,
        };
        tables.users.push((user.clone(), hashed_password.to_string()));
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|(u, _)| u.user_id == user_id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                user_id: u.user_id,
                email: u.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| not_found("User", email))
    }

    async fn get_user_credentials(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|(u, _)| u.user_id == user_id)
            .map(|(u, hash)| UserCredentials {
                user_id: u.user_id,
                email: u.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let (user, _) = tables
            .users
            .iter_mut()
            .find(|(u, _)| u.user_id == user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn update_user_details(
        &self,
        user_id: Uuid,
        name: &str,
        email: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|(u, _)| u.email == email && u.user_id != user_id)
        {
            return Err(PortError::Conflict(format!(
                "A user with email {} already exists",
                email
            )));
        }
        let (user, _) = tables
            .users
            .iter_mut()
            .find(|(u, _)| u.user_id == user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        user.name = name.to_string();
        user.email = email.to_string();
        Ok(user.clone())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let (_, hash) = tables
            .users
            .iter_mut()
            .find(|(u, _)| u.user_id == user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        *hash = hashed_password.to_string();
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|(u, _)| u.user_id != user_id);
        if tables.users.len() == before {
            return Err(not_found("User", user_id));
        }
        tables.sessions.retain(|_, s| s.user_id != user_id);
        tables.carts.retain(|c| c.user_id != user_id);
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables.sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let mut tables = self.tables.write().await;
        let (user_id, expires_at) = match tables.sessions.get(session_id) {
            Some(session) => (session.user_id, session.expires_at),
            None => return Err(PortError::Unauthorized),
        };
        if expires_at <= Utc::now() {
            tables.sessions.remove(session_id);
            return Err(PortError::Unauthorized);
        }
        Ok(user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.sessions.remove(session_id);
        Ok(())
    }

    async fn delete_user_auth_sessions(&self, user_id: Uuid) -> PortResult<()> {
        self.tables
            .write()
            .await
            .sessions
            .retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn delete_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn insert_brand(&self, brand: &Brand) -> PortResult<Brand> {
        let mut tables = self.tables.write().await;
        if tables.brands.iter().any(|b| b.name == brand.name) {
            return Err(PortError::Conflict(format!(
                "A brand named {} already exists",
                brand.name
            )));
        }
        tables.brands.push(brand.clone());
        Ok(brand.clone())
    }

    async fn get_brand(&self, brand_id: Uuid) -> PortResult<Brand> {
        let tables = self.tables.read().await;
        tables
            .brands
            .iter()
            .find(|b| b.id == brand_id)
            .cloned()
            .ok_or_else(|| not_found("Brand", brand_id))
    }

    async fn find_brand_by_name(&self, name: &str) -> PortResult<Option<Brand>> {
        let tables = self.tables.read().await;
        Ok(tables.brands.iter().find(|b| b.name == name).cloned())
    }

    async fn list_brands(&self, query: ListQuery) -> PortResult<Page<Brand>> {
        let tables = self.tables.read().await;
        Ok(paginate(tables.brands.iter().collect(), query))
    }

    async fn update_brand(&self, brand: &Brand) -> PortResult<Brand> {
        let mut tables = self.tables.write().await;
        if tables
            .brands
            .iter()
            .any(|b| b.id != brand.id && b.name == brand.name)
        {
            return Err(PortError::Conflict(format!(
                "A brand named {} already exists",
                brand.name
            )));
        }
        let slot = tables
            .brands
            .iter_mut()
            .find(|b| b.id == brand.id)
            .ok_or_else(|| not_found("Brand", brand.id))?;
        *slot = brand.clone();
        Ok(brand.clone())
    }

    async fn delete_brand(&self, brand_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.brands.len();
        tables.brands.retain(|b| b.id != brand_id);
        if tables.brands.len() == before {
            return Err(not_found("Brand", brand_id));
        }
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> PortResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.name == category.name) {
            return Err(PortError::Conflict(format!(
                "A category named {} already exists",
                category.name
            )));
        }
        tables.categories.push(category.clone());
        Ok(category.clone())
    }

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category> {
        let tables = self.tables.read().await;
        tables
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or_else(|| not_found("Category", category_id))
    }

    async fn find_category_by_name(&self, name: &str) -> PortResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn list_categories(&self, query: ListQuery) -> PortResult<Page<Category>> {
        let tables = self.tables.read().await;
        Ok(paginate(tables.categories.iter().collect(), query))
    }

    async fn root_categories(&self) -> PortResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut roots: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| c.parent_category.is_none())
            .cloned()
            .collect();
        sort_by_order_and_name(&mut roots);
        Ok(roots)
    }

    async fn subcategories_of(&self, parent_id: Uuid) -> PortResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut children: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| c.parent_category == Some(parent_id))
            .cloned()
            .collect();
        sort_by_order_and_name(&mut children);
        Ok(children)
    }

    async fn update_category(&self, category: &Category) -> PortResult<Category> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .iter()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(PortError::Conflict(format!(
                "A category named {} already exists",
                category.name
            )));
        }
        let slot = tables
            .categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| not_found("Category", category.id))?;
        *slot = category.clone();
        Ok(category.clone())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != category_id);
        if tables.categories.len() == before {
            return Err(not_found("Category", category_id));
        }
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> PortResult<Product> {
        let mut tables = self.tables.write().await;
        if tables.products.iter().any(|p| p.sku == product.sku) {
            return Err(PortError::Conflict(format!(
                "A product with SKU {} already exists",
                product.sku
            )));
        }
        tables.products.push(product.clone());
        Ok(product.clone())
    }

    async fn get_product(&self, product_id: Uuid) -> PortResult<Product> {
        let tables = self.tables.read().await;
        tables
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| not_found("Product", product_id))
    }

    async fn get_products(&self, product_ids: &[Uuid]) -> PortResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| product_ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_product_by_sku(&self, sku: &str) -> PortResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.sku == sku).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        query: ListQuery,
    ) -> PortResult<Page<Product>> {
        let tables = self.tables.read().await;
        let rows = tables.products.iter().filter(|p| filter.matches(p)).collect();
        Ok(paginate(rows, query))
    }

    async fn products_by_brand(&self, brand_id: Uuid) -> PortResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| p.brand == brand_id)
            .cloned()
            .collect())
    }

    async fn products_in_categories(&self, category_ids: &[Uuid]) -> PortResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| category_ids.contains(&p.category))
            .cloned()
            .collect())
    }

    async fn count_products_by_brand(&self, brand_id: Uuid) -> PortResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().filter(|p| p.brand == brand_id).count() as u64)
    }

    async fn count_products_by_category(&self, category_id: Uuid) -> PortResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter(|p| p.category == category_id)
            .count() as u64)
    }

    async fn update_product(&self, product: &Product) -> PortResult<Product> {
        let mut tables = self.tables.write().await;
        if tables
            .products
            .iter()
            .any(|p| p.id != product.id && p.sku == product.sku)
        {
            return Err(PortError::Conflict(format!(
                "A product with SKU {} already exists",
                product.sku
            )));
        }
        let slot = tables
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| not_found("Product", product.id))?;
        *slot = product.clone();
        Ok(product.clone())
    }

    async fn delete_product(&self, product_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != product_id);
        if tables.products.len() == before {
            return Err(not_found("Product", product_id));
        }
        Ok(())
    }

    async fn find_cart_by_user(&self, user_id: Uuid) -> PortResult<Option<Cart>> {
        let tables = self.tables.read().await;
        Ok(tables.carts.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn get_cart(&self, cart_id: Uuid) -> PortResult<Cart> {
        let tables = self.tables.read().await;
        tables
            .carts
            .iter()
            .find(|c| c.id == cart_id)
            .cloned()
            .ok_or_else(|| not_found("Cart", cart_id))
    }

    async fn create_cart(&self, cart: &Cart) -> PortResult<Cart> {
        let mut tables = self.tables.write().await;
        if tables.carts.iter().any(|c| c.user_id == cart.user_id) {
            return Err(PortError::Conflict(format!(
                "User {} already has a cart",
                cart.user_id
            )));
        }
        tables.carts.push(cart.clone());
        Ok(cart.clone())
    }

    async fn save_cart(&self, cart: &Cart) -> PortResult<Cart> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .carts
            .iter_mut()
            .find(|c| c.id == cart.id)
            .ok_or_else(|| not_found("Cart", cart.id))?;
        *slot = cart.clone();
        Ok(cart.clone())
    }
}

//=========================================================================================
// Asset Store
//=========================================================================================

/// An `AssetStore` that keeps uploads in memory and records every release.
#[derive(Default)]
pub struct InMemoryAssetStore {
    assets: Mutex<HashMap<String, Bytes>>,
    destroyed: Mutex<Vec<String>>,
    counter: AtomicU64,
}

impl InMemoryAssetStore {
    pub const URL_PREFIX: &'static str = "memory://assets/";

    pub fn new() -> Self {
        Self::default()
    }

    /// External ids passed to `destroy`, in call order.
    pub async fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().await.clone()
    }

    pub async fn contains(&self, external_id: &str) -> bool {
        self.assets.lock().await.contains_key(external_id)
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn upload(
        &self,
        data: Bytes,
        _content_type: &str,
        folder: &str,
        _transform: ImageTransform,
    ) -> PortResult<StoredAsset> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let external_id = format!("{}/asset-{}", folder, n);
        self.assets.lock().await.insert(external_id.clone(), data);
        Ok(StoredAsset {
            url: format!("{}{}", Self::URL_PREFIX, external_id),
            external_id,
        })
    }

    async fn destroy(&self, external_id: &str) -> PortResult<()> {
        self.assets.lock().await.remove(external_id);
        self.destroyed.lock().await.push(external_id.to_string());
        Ok(())
    }

    fn external_id_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(Self::URL_PREFIX).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let db = InMemoryDatabase::new();
        let user = db
            .create_user("Ada", "ada@shop.com", "hash", Role::User)
            .await
            .unwrap();
        let now = Utc::now();
        db.create_auth_session("live", user.user_id, now + Duration::days(1))
            .await
            .unwrap();
        db.create_auth_session("stale", user.user_id, now - Duration::days(1))
            .await
            .unwrap();
        db.create_auth_session("older", user.user_id, now - Duration::days(2))
            .await
            .unwrap();

        let err = db.validate_auth_session("stale").await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));
        assert!(!db.tables.read().await.sessions.contains_key("stale"));

        assert_eq!(db.delete_expired_auth_sessions(now).await.unwrap(), 1);
        assert_eq!(db.validate_auth_session("live").await.unwrap(), user.user_id);
        assert_eq!(db.tables.read().await.sessions.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_user_takes_sessions_and_cart_along() {
        let db = InMemoryDatabase::new();
        let user = db
            .create_user("Ada", "ada@shop.com", "hash", Role::User)
            .await
            .unwrap();
        db.create_auth_session("s1", user.user_id, Utc::now() + Duration::days(1))
            .await
            .unwrap();
        db.create_cart(&Cart::empty(user.user_id)).await.unwrap();

        db.delete_user(user.user_id).await.unwrap();

        assert!(db.find_cart_by_user(user.user_id).await.unwrap().is_none());
        assert!(db.validate_auth_session("s1").await.is_err());
        assert!(matches!(
            db.delete_user(user.user_id).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn email_change_to_a_taken_address_conflicts() {
        let db = InMemoryDatabase::new();
        let ada = db
            .create_user("Ada", "ada@shop.com", "hash", Role::User)
            .await
            .unwrap();
        db.create_user("Bob", "bob@shop.com", "hash", Role::User)
            .await
            .unwrap();

        let err = db
            .update_user_details(ada.user_id, "Ada", "bob@shop.com")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let same = db
            .update_user_details(ada.user_id, "Ada L.", "ada@shop.com")
            .await
            .unwrap();
        assert_eq!(same.name, "Ada L.");
    }
}
