//! crates/storefront_core/src/domain.rs
//!
//! Defines the pure, core data structures for the storefront.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Logo stored on a brand until a real one is uploaded.
pub const DEFAULT_BRAND_LOGO: &str = "no-logo.png";
/// Image stored on a category until a real one is uploaded.
pub const DEFAULT_CATEGORY_IMAGE: &str = "no-image.jpg";
pub const DEFAULT_CATEGORY_ICON: &str = "fa-folder";
/// Warranty in months applied when a product is created without one.
pub const DEFAULT_WARRANTY_MONTHS: u32 = 24;

//=========================================================================================
// Users & Auth
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// The resolved caller of a request, as established by the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub logo: String,
    pub website: Option<String>,
    pub founded_year: Option<i32>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub image: String,
    /// `None` marks a root category.
    pub parent_category: Option<Uuid>,
    pub features: Vec<String>,
    pub featured: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

/// The display fields of a category, as attached to parents and products.
#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub image: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon: category.icon.clone(),
            image: category.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductImage {
    pub id: Uuid,
    pub url: String,
    /// Identifier of the asset in the asset store; absent for externally hosted images.
    pub external_id: Option<String>,
    pub is_main: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: f64,
    pub discount_percentage: f64,
    pub stock: u32,
    pub brand: Uuid,
    pub category: Uuid,
    pub images: Vec<ProductImage>,
    pub specifications: Vec<Specification>,
    pub sku: String,
    pub featured: bool,
    pub is_new: bool,
    pub is_sale: bool,
    pub rating: f64,
    pub total_reviews: u32,
    pub warranty: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn discounted_price(&self) -> f64 {
        self.price * (1.0 - self.discount_percentage / 100.0)
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn main_image(&self) -> Option<&ProductImage> {
        self.images.iter().find(|image| image.is_main)
    }

    /// Appends images, marking the first one main when the product had none.
    pub fn push_images(&mut self, images: impl IntoIterator<Item = ProductImage>) {
        for mut image in images {
            image.is_main = self.main_image().is_none();
            self.images.push(image);
        }
    }

    /// Removes an image and promotes the first remaining one if the main image went away.
    pub fn remove_image(&mut self, image_id: Uuid) -> Option<ProductImage> {
        let index = self.images.iter().position(|image| image.id == image_id)?;
        let removed = self.images.remove(index);
        if removed.is_main {
            if let Some(first) = self.images.first_mut() {
                first.is_main = true;
            }
        }
        Some(removed)
    }

    /// Makes `image_id` the only main image. Returns `false` if the image is unknown.
    pub fn set_main_image(&mut self, image_id: Uuid) -> bool {
        if !self.images.iter().any(|image| image.id == image_id) {
            return false;
        }
        for image in &mut self.images {
            image.is_main = image.id == image_id;
        }
        true
    }
}

/// The fields a cart line shows for its product.
#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub images: Vec<ProductImage>,
    pub stock: u32,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            images: product.images.clone(),
            stock: product.stock,
        }
    }
}

//=========================================================================================
// Cart
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub product: Uuid,
    pub quantity: u32,
    /// Unit price supplied by the client when the line was last added to.
    pub price: f64,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn empty(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            items: Vec::new(),
            last_updated: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_price(&self) -> f64 {
        self.items
            .iter()
            .map(|item| f64::from(item.quantity) * item.price)
            .sum()
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn item(&self, item_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn item_for_product_mut(&mut self, product_id: Uuid) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.product == product_id)
    }
}

//=========================================================================================
// Listing
//=========================================================================================

/// Page request for list endpoints. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: u32 = 25;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(Self::DEFAULT_LIMIT)
                .min(Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub query: ListQuery,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.query.offset() + (self.items.len() as u64) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.query.page > 1
    }
}

/// Filters accepted by the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub brand: Option<Uuid>,
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub is_sale: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.brand.map_or(true, |b| product.brand == b)
            && self.category.map_or(true, |c| product.category == c)
            && self.featured.map_or(true, |f| product.featured == f)
            && self.is_sale.map_or(true, |s| product.is_sale == s)
            && self.min_price.map_or(true, |min| product.price >= min)
            && self.max_price.map_or(true, |max| product.price <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64, discount: f64, stock: u32) -> Product {
        Product {
            id: Uuid::new_v4(),
            title: "Kettle".into(),
            slug: "kettle".into(),
            description: "Boils water".into(),
            short_description: None,
            price,
            discount_percentage: discount,
            stock,
            brand: Uuid::new_v4(),
            category: Uuid::new_v4(),
            images: Vec::new(),
            specifications: Vec::new(),
            sku: "KT-1".into(),
            featured: false,
            is_new: true,
            is_sale: false,
            rating: 0.0,
            total_reviews: 0,
            warranty: DEFAULT_WARRANTY_MONTHS,
            created_at: Utc::now(),
        }
    }

    fn image(url: &str) -> ProductImage {
        ProductImage {
            id: Uuid::new_v4(),
            url: url.into(),
            external_id: Some(url.into()),
            is_main: false,
        }
    }

    #[test]
    fn derived_price_and_stock() {
        let p = product(200.0, 25.0, 0);
        assert_eq!(p.discounted_price(), 150.0);
        assert!(!p.in_stock());

        let p = product(80.0, 0.0, 3);
        assert_eq!(p.discounted_price(), 80.0);
        assert!(p.in_stock());
    }

    #[test]
    fn first_image_becomes_main_and_promotion_on_removal() {
        let mut p = product(10.0, 0.0, 1);
        p.push_images(vec![image("a"), image("b"), image("c")]);
        let mains: Vec<_> = p.images.iter().filter(|i| i.is_main).collect();
        assert_eq!(mains.len(), 1);
        assert_eq!(mains[0].url, "a");

        let main_id = p.images[0].id;
        p.remove_image(main_id).unwrap();
        assert_eq!(p.main_image().unwrap().url, "b");
        assert_eq!(p.images.iter().filter(|i| i.is_main).count(), 1);
    }

    #[test]
    fn set_main_image_is_exclusive() {
        let mut p = product(10.0, 0.0, 1);
        p.push_images(vec![image("a"), image("b")]);
        let b = p.images[1].id;
        assert!(p.set_main_image(b));
        assert_eq!(p.main_image().unwrap().url, "b");
        assert_eq!(p.images.iter().filter(|i| i.is_main).count(), 1);
        assert!(!p.set_main_image(Uuid::new_v4()));
    }

    #[test]
    fn cart_totals() {
        let mut cart = Cart::empty(Uuid::new_v4());
        cart.items.push(CartItem {
            id: Uuid::new_v4(),
            product: Uuid::new_v4(),
            quantity: 2,
            price: 100.0,
            name: "A".into(),
            image: None,
        });
        cart.items.push(CartItem {
            id: Uuid::new_v4(),
            product: Uuid::new_v4(),
            quantity: 3,
            price: 5.5,
            name: "B".into(),
            image: None,
        });
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), 216.5);
    }

    #[test]
    fn list_query_defaults_and_bounds() {
        let q = ListQuery::new(None, None);
        assert_eq!((q.page, q.limit), (1, ListQuery::DEFAULT_LIMIT));
        let q = ListQuery::new(Some(0), Some(1000));
        assert_eq!((q.page, q.limit), (1, ListQuery::MAX_LIMIT));
        assert_eq!(ListQuery::new(Some(3), Some(10)).offset(), 20);
    }
}
