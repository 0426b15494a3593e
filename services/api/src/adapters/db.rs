//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use storefront_core::domain::{
    Brand, Cart, CartItem, Category, ListQuery, Page, Product, ProductFilter, ProductImage, Role,
    Specification, User, UserCredentials,
};
use storefront_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a driver error onto the port taxonomy.
fn map_err(e: sqlx::Error, what: &str) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(ref db)
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) =>
        {
            PortError::Conflict(format!("{} already exists", what))
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.id,
            name: self.name,
            email: self.email,
            role: Role::parse(&self.role).unwrap_or(Role::User),
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at, last_login";

#[derive(FromRow)]
struct BrandRecord {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    logo: String,
    website: Option<String>,
    founded_year: Option<i32>,
    featured: bool,
    created_at: DateTime<Utc>,
}
impl BrandRecord {
    fn to_domain(self) -> Brand {
        Brand {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            logo: self.logo,
            website: self.website,
            founded_year: self.founded_year,
            featured: self.featured,
            created_at: self.created_at,
        }
    }
}

const BRAND_COLUMNS: &str =
    "id, name, slug, description, logo, website, founded_year, featured, created_at";

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    icon: String,
    image: String,
    parent_category: Option<Uuid>,
    features: Vec<String>,
    featured: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
}
impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            icon: self.icon,
            image: self.image,
            parent_category: self.parent_category,
            features: self.features,
            featured: self.featured,
            order: self.sort_order,
            created_at: self.created_at,
        }
    }
}

const CATEGORY_COLUMNS: &str = "id, name, slug, description, icon, image, parent_category, \
     features, featured, sort_order, created_at";

/// JSONB shape of one product image.
#[derive(Serialize, Deserialize)]
struct ImageDoc {
    id: Uuid,
    url: String,
    external_id: Option<String>,
    is_main: bool,
}

/// JSONB shape of one product specification.
#[derive(Serialize, Deserialize)]
struct SpecDoc {
    name: String,
    value: String,
}

#[derive(FromRow)]
struct ProductRecord {
    id: Uuid,
    title: String,
    slug: String,
    description: String,
    short_description: Option<String>,
    price: f64,
    discount_percentage: f64,
    stock: i32,
    brand_id: Uuid,
    category_id: Uuid,
    images: Json<Vec<ImageDoc>>,
    specifications: Json<Vec<SpecDoc>>,
    sku: String,
    featured: bool,
    is_new: bool,
    is_sale: bool,
    rating: f64,
    total_reviews: i32,
    warranty: i32,
    created_at: DateTime<Utc>,
}
impl ProductRecord {
    fn to_domain(self) -> Product {
        Product {
            id: self.id,
            title: self.title,
            slug: self.slug,
            description: self.description,
            short_description: self.short_description,
            price: self.price,
            discount_percentage: self.discount_percentage,
            stock: to_u32(self.stock),
            brand: self.brand_id,
            category: self.category_id,
            images: self
                .images
                .0
                .into_iter()
                .map(|doc| ProductImage {
                    id: doc.id,
                    url: doc.url,
                    external_id: doc.external_id,
                    is_main: doc.is_main,
                })
                .collect(),
            specifications: self
                .specifications
                .0
                .into_iter()
                .map(|doc| Specification {
                    name: doc.name,
                    value: doc.value,
                })
                .collect(),
            sku: self.sku,
            featured: self.featured,
            is_new: self.is_new,
            is_sale: self.is_sale,
            rating: self.rating,
            total_reviews: to_u32(self.total_reviews),
            warranty: to_u32(self.warranty),
            created_at: self.created_at,
        }
    }
}

fn image_docs(product: &Product) -> Json<Vec<ImageDoc>> {
    Json(
        product
            .images
            .iter()
            .map(|image| ImageDoc {
                id: image.id,
                url: image.url.clone(),
                external_id: image.external_id.clone(),
                is_main: image.is_main,
            })
            .collect(),
    )
}

fn spec_docs(product: &Product) -> Json<Vec<SpecDoc>> {
    Json(
        product
            .specifications
            .iter()
            .map(|spec| SpecDoc {
                name: spec.name.clone(),
                value: spec.value.clone(),
            })
            .collect(),
    )
}

const PRODUCT_COLUMNS: &str = "id, title, slug, description, short_description, price, \
     discount_percentage, stock, brand_id, category_id, images, specifications, sku, featured, \
     is_new, is_sale, rating, total_reviews, warranty, created_at";

#[derive(FromRow)]
struct CartRecord {
    id: Uuid,
    user_id: Uuid,
    last_updated: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CartItemRecord {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: f64,
    name: String,
    image: Option<String>,
}
impl CartItemRecord {
    fn to_domain(self) -> CartItem {
        CartItem {
            id: self.id,
            product: self.product_id,
            quantity: to_u32(self.quantity),
            price: self.price,
            name: self.name,
            image: self.image,
        }
    }
}

impl DbAdapter {
    async fn load_cart(&self, record: CartRecord) -> PortResult<Cart> {
        let items = sqlx::query_as::<_, CartItemRecord>(
            "SELECT id, product_id, quantity, price, name, image FROM cart_items \
             WHERE cart_id = $1 ORDER BY position ASC",
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err(e, "Cart items"))?;

        Ok(Cart {
            id: record.id,
            user_id: record.user_id,
            items: items.into_iter().map(|r| r.to_domain()).collect(),
            last_updated: record.last_updated,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    async fn count(&self, sql: &str, id: Uuid, what: &str) -> PortResult<u64> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, what))?;
        Ok(count.max(0) as u64)
    }
}

fn push_product_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    builder.push(" WHERE TRUE");
    if let Some(brand) = filter.brand {
        builder.push(" AND brand_id = ").push_bind(brand);
    }
    if let Some(category) = filter.category {
        builder.push(" AND category_id = ").push_bind(category);
    }
    if let Some(featured) = filter.featured {
        builder.push(" AND featured = ").push_bind(featured);
    }
    if let Some(is_sale) = filter.is_sale {
        builder.push(" AND is_sale = ").push_bind(is_sale);
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users & Auth ---

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, role, password_hash) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .bind(role.as_str())
            .bind(hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("User {}", email)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("User {}", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("User {}", email)))?;
        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.password_hash,
        })
    }

    async fn get_user_credentials(&self, user_id: Uuid) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("User {}", user_id)))?;
        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.password_hash,
        })
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn update_user_details(
        &self,
        user_id: Uuid,
        name: &str,
        email: &str,
    ) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET name = $1, email = $2 WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(name)
            .bind(email)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("User {} not found", user_id))
                }
                other => map_err(other, &format!("A user with email {}", email)),
            })?;
        Ok(record.to_domain())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        // Sessions and the cart go with the row through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT user_id, expires_at FROM auth_sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        match row {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(user_id),
            Some(_) => {
                self.delete_auth_session(session_id).await?;
                Err(PortError::Unauthorized)
            }
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn delete_user_auth_sessions(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn delete_expired_auth_sessions(&self, now: DateTime<Utc>) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.rows_affected())
    }

    // --- Brands ---

    async fn insert_brand(&self, brand: &Brand) -> PortResult<Brand> {
        let sql = format!(
            "INSERT INTO brands ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {cols}",
            cols = BRAND_COLUMNS
        );
        let record = sqlx::query_as::<_, BrandRecord>(&sql)
            .bind(brand.id)
            .bind(&brand.name)
            .bind(&brand.slug)
            .bind(&brand.description)
            .bind(&brand.logo)
            .bind(&brand.website)
            .bind(brand.founded_year)
            .bind(brand.featured)
            .bind(brand.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Brand {}", brand.name)))?;
        Ok(record.to_domain())
    }

    async fn get_brand(&self, brand_id: Uuid) -> PortResult<Brand> {
        let sql = format!("SELECT {} FROM brands WHERE id = $1", BRAND_COLUMNS);
        let record = sqlx::query_as::<_, BrandRecord>(&sql)
            .bind(brand_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Brand {}", brand_id)))?;
        Ok(record.to_domain())
    }

    async fn find_brand_by_name(&self, name: &str) -> PortResult<Option<Brand>> {
        let sql = format!("SELECT {} FROM brands WHERE name = $1", BRAND_COLUMNS);
        let record = sqlx::query_as::<_, BrandRecord>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_brands(&self, query: ListQuery) -> PortResult<Page<Brand>> {
        let sql = format!(
            "SELECT {} FROM brands ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
            BRAND_COLUMNS
        );
        let records = sqlx::query_as::<_, BrandRecord>(&sql)
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brands")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Page {
            items: records.into_iter().map(|r| r.to_domain()).collect(),
            total: total.max(0) as u64,
            query,
        })
    }

    async fn update_brand(&self, brand: &Brand) -> PortResult<Brand> {
        let sql = format!(
            "UPDATE brands SET name = $2, slug = $3, description = $4, logo = $5, website = $6, \
             founded_year = $7, featured = $8 WHERE id = $1 RETURNING {}",
            BRAND_COLUMNS
        );
        let record = sqlx::query_as::<_, BrandRecord>(&sql)
            .bind(brand.id)
            .bind(&brand.name)
            .bind(&brand.slug)
            .bind(&brand.description)
            .bind(&brand.logo)
            .bind(&brand.website)
            .bind(brand.founded_year)
            .bind(brand.featured)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Brand {}", brand.name)))?;
        Ok(record.to_domain())
    }

    async fn delete_brand(&self, brand_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM brands WHERE id = $1")
            .bind(brand_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Brand {} not found", brand_id)));
        }
        Ok(())
    }

    // --- Categories ---

    async fn insert_category(&self, category: &Category) -> PortResult<Category> {
        let sql = format!(
            "INSERT INTO categories ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {cols}",
            cols = CATEGORY_COLUMNS
        );
        let record = sqlx::query_as::<_, CategoryRecord>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(&category.icon)
            .bind(&category.image)
            .bind(category.parent_category)
            .bind(&category.features)
            .bind(category.featured)
            .bind(category.order)
            .bind(category.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Category {}", category.name)))?;
        Ok(record.to_domain())
    }

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        let record = sqlx::query_as::<_, CategoryRecord>(&sql)
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Category {}", category_id)))?;
        Ok(record.to_domain())
    }

    async fn find_category_by_name(&self, name: &str) -> PortResult<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE name = $1", CATEGORY_COLUMNS);
        let record = sqlx::query_as::<_, CategoryRecord>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_categories(&self, query: ListQuery) -> PortResult<Page<Category>> {
        let sql = format!(
            "SELECT {} FROM categories ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
            CATEGORY_COLUMNS
        );
        let records = sqlx::query_as::<_, CategoryRecord>(&sql)
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Page {
            items: records.into_iter().map(|r| r.to_domain()).collect(),
            total: total.max(0) as u64,
            query,
        })
    }

    async fn root_categories(&self) -> PortResult<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE parent_category IS NULL ORDER BY sort_order ASC, name ASC",
            CATEGORY_COLUMNS
        );
        let records = sqlx::query_as::<_, CategoryRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn subcategories_of(&self, parent_id: Uuid) -> PortResult<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE parent_category = $1 ORDER BY sort_order ASC, name ASC",
            CATEGORY_COLUMNS
        );
        let records = sqlx::query_as::<_, CategoryRecord>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_category(&self, category: &Category) -> PortResult<Category> {
        let sql = format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4, icon = $5, image = $6, \
             parent_category = $7, features = $8, featured = $9, sort_order = $10 \
             WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        );
        let record = sqlx::query_as::<_, CategoryRecord>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(&category.icon)
            .bind(&category.image)
            .bind(category.parent_category)
            .bind(&category.features)
            .bind(category.featured)
            .bind(category.order)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Category {}", category.name)))?;
        Ok(record.to_domain())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }
        Ok(())
    }

    // --- Products ---

    async fn insert_product(&self, product: &Product) -> PortResult<Product> {
        let sql = format!(
            "INSERT INTO products ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, \
             $12, $13, $14, $15, $16, $17, $18, $19, $20) RETURNING {cols}",
            cols = PRODUCT_COLUMNS
        );
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product.id)
            .bind(&product.title)
            .bind(&product.slug)
            .bind(&product.description)
            .bind(&product.short_description)
            .bind(product.price)
            .bind(product.discount_percentage)
            .bind(to_i32(product.stock))
            .bind(product.brand)
            .bind(product.category)
            .bind(image_docs(product))
            .bind(spec_docs(product))
            .bind(&product.sku)
            .bind(product.featured)
            .bind(product.is_new)
            .bind(product.is_sale)
            .bind(product.rating)
            .bind(to_i32(product.total_reviews))
            .bind(to_i32(product.warranty))
            .bind(product.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Product with SKU {}", product.sku)))?;
        Ok(record.to_domain())
    }

    async fn get_product(&self, product_id: Uuid) -> PortResult<Product> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Product {}", product_id)))?;
        Ok(record.to_domain())
    }

    async fn get_products(&self, product_ids: &[Uuid]) -> PortResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS);
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_product_by_sku(&self, sku: &str) -> PortResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE sku = $1", PRODUCT_COLUMNS);
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        query: ListQuery,
    ) -> PortResult<Page<Product>> {
        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(PRODUCT_COLUMNS).push(" FROM products");
        push_product_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);
        let records = select
            .build_query_as::<ProductRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_product_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Page {
            items: records.into_iter().map(|r| r.to_domain()).collect(),
            total: total.max(0) as u64,
            query,
        })
    }

    async fn products_by_brand(&self, brand_id: Uuid) -> PortResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE brand_id = $1 ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        );
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(brand_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn products_in_categories(&self, category_ids: &[Uuid]) -> PortResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE category_id = ANY($1) ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        );
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(category_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_products_by_brand(&self, brand_id: Uuid) -> PortResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM products WHERE brand_id = $1",
            brand_id,
            "Products",
        )
        .await
    }

    async fn count_products_by_category(&self, category_id: Uuid) -> PortResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM products WHERE category_id = $1",
            category_id,
            "Products",
        )
        .await
    }

    async fn update_product(&self, product: &Product) -> PortResult<Product> {
        let sql = format!(
            "UPDATE products SET title = $2, slug = $3, description = $4, short_description = $5, \
             price = $6, discount_percentage = $7, stock = $8, brand_id = $9, category_id = $10, \
             images = $11, specifications = $12, sku = $13, featured = $14, is_new = $15, \
             is_sale = $16, rating = $17, total_reviews = $18, warranty = $19 \
             WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product.id)
            .bind(&product.title)
            .bind(&product.slug)
            .bind(&product.description)
            .bind(&product.short_description)
            .bind(product.price)
            .bind(product.discount_percentage)
            .bind(to_i32(product.stock))
            .bind(product.brand)
            .bind(product.category)
            .bind(image_docs(product))
            .bind(spec_docs(product))
            .bind(&product.sku)
            .bind(product.featured)
            .bind(product.is_new)
            .bind(product.is_sale)
            .bind(product.rating)
            .bind(to_i32(product.total_reviews))
            .bind(to_i32(product.warranty))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_err(e, &format!("Product {}", product.id)))?;
        Ok(record.to_domain())
    }

    async fn delete_product(&self, product_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }
        Ok(())
    }

    // --- Carts ---

    async fn find_cart_by_user(&self, user_id: Uuid) -> PortResult<Option<Cart>> {
        let record = sqlx::query_as::<_, CartRecord>(
            "SELECT id, user_id, last_updated, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        match record {
            Some(record) => Ok(Some(self.load_cart(record).await?)),
            None => Ok(None),
        }
    }

    async fn get_cart(&self, cart_id: Uuid) -> PortResult<Cart> {
        let record = sqlx::query_as::<_, CartRecord>(
            "SELECT id, user_id, last_updated, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(cart_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, &format!("Cart {}", cart_id)))?;
        self.load_cart(record).await
    }

    async fn create_cart(&self, cart: &Cart) -> PortResult<Cart> {
        let record = sqlx::query_as::<_, CartRecord>(
            "INSERT INTO carts (id, user_id, last_updated, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, last_updated, created_at, updated_at",
        )
        .bind(cart.id)
        .bind(cart.user_id)
        .bind(cart.last_updated)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_err(e, &format!("Cart for user {}", cart.user_id)))?;
        self.load_cart(record).await
    }

    async fn save_cart(&self, cart: &Cart) -> PortResult<Cart> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let updated = sqlx::query("UPDATE carts SET last_updated = $2, updated_at = $3 WHERE id = $1")
            .bind(cart.id)
            .bind(cart.last_updated)
            .bind(cart.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if updated.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Cart {} not found", cart.id)));
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, position, product_id, quantity, price, name, image) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(item.id)
            .bind(cart.id)
            .bind(position as i32)
            .bind(item.product)
            .bind(to_i32(item.quantity))
            .bind(item.price)
            .bind(&item.name)
            .bind(&item.image)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.get_cart(cart.id).await
    }
}
