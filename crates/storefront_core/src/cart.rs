//! crates/storefront_core/src/cart.rs
//!
//! One cart per user: a list of line items with name/price/image snapshots,
//! checked against the product's current stock whenever a quantity changes.
//!
//! Stock is checked, never reserved. Each call reads the product and the cart,
//! then writes the cart; nothing spans those steps, so two carts (or two
//! concurrent requests) can each hold the full stock of a product at once.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Cart, CartItem, ProductSummary};
use crate::ports::{DatabaseService, PortError, PortResult};

/// A request to put a product into the cart. Every field but `image` is required.
#[derive(Debug, Clone, Default)]
pub struct AddCartItem {
    pub product_id: Option<Uuid>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// A cart line with its product's live display fields.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    /// `None` once the product has been deleted.
    pub product: Option<ProductSummary>,
}

/// The cart as returned to callers after every operation.
#[derive(Debug, Clone)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

impl CartView {
    pub fn total_price(&self) -> f64 {
        self.cart.total_price()
    }

    pub fn total_items(&self) -> u32 {
        self.cart.total_items()
    }
}

fn insufficient_stock(title: &str, stock: u32) -> PortError {
    PortError::Conflict(format!(
        "Insufficient stock. Remaining stock for {}: {}",
        title, stock
    ))
}

#[derive(Clone)]
pub struct CartManager {
    db: Arc<dyn DatabaseService>,
}

impl CartManager {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Returns the user's cart, creating an empty one on first use.
    async fn load_or_create(&self, user_id: Uuid) -> PortResult<Cart> {
        if let Some(cart) = self.db.find_cart_by_user(user_id).await? {
            return Ok(cart);
        }
        match self.db.create_cart(&Cart::empty(user_id)).await {
            Ok(cart) => {
                info!(user_id = %user_id, cart_id = %cart.id, "Cart created.");
                Ok(cart)
            }
            // Another request created it first.
            Err(PortError::Conflict(_)) => self
                .db
                .find_cart_by_user(user_id)
                .await?
                .ok_or_else(|| PortError::Unexpected(format!("Cart for {} vanished", user_id))),
            Err(e) => Err(e),
        }
    }

    async fn load(&self, user_id: Uuid) -> PortResult<Cart> {
        self.db
            .find_cart_by_user(user_id)
            .await?
            .ok_or_else(|| PortError::NotFound("Cart not found".to_string()))
    }

    /// Persists the cart and returns a freshly read, populated view of it.
    async fn persist(&self, mut cart: Cart) -> PortResult<CartView> {
        let now = Utc::now();
        cart.last_updated = now;
        cart.updated_at = now;
        let saved = self.db.save_cart(&cart).await?;
        let fresh = self.db.get_cart(saved.id).await?;
        self.populate(fresh).await
    }

    async fn populate(&self, cart: Cart) -> PortResult<CartView> {
        let ids: Vec<Uuid> = cart.items.iter().map(|item| item.product).collect();
        let products: HashMap<Uuid, ProductSummary> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.db
                .get_products(&ids)
                .await?
                .iter()
                .map(|p| (p.id, ProductSummary::from(p)))
                .collect()
        };

        let lines = cart
            .items
            .iter()
            .map(|item| CartLine {
                item: item.clone(),
                product: products.get(&item.product).cloned(),
            })
            .collect();
        Ok(CartView { cart, lines })
    }

    pub async fn get_or_create_cart(&self, user_id: Uuid) -> PortResult<CartView> {
        let cart = self.load_or_create(user_id).await?;
        self.populate(cart).await
    }

    /// Adds a product to the cart.
    ///
    /// An existing line for the product has the quantity added to it and its
    /// price replaced by the supplied one; otherwise a new line is appended.
    pub async fn add_item(&self, user_id: Uuid, request: AddCartItem) -> PortResult<CartView> {
        let name = request.name.filter(|n| !n.trim().is_empty());
        let (product_id, quantity, price, name) =
            match (request.product_id, request.quantity, request.price, name) {
                (Some(product_id), Some(quantity), Some(price), Some(name)) => {
                    (product_id, quantity, price, name)
                }
                _ => {
                    return Err(PortError::Validation(
                        "Please provide product ID, quantity, price and name".to_string(),
                    ))
                }
            };
        if quantity < 1 {
            return Err(PortError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(PortError::Validation("Price cannot be negative".to_string()));
        }

        let product = self.db.get_product(product_id).await?;
        if product.stock < quantity {
            return Err(insufficient_stock(&product.title, product.stock));
        }

        let mut cart = self.load_or_create(user_id).await?;

        match cart.item_for_product_mut(product_id) {
            Some(line) => {
                let held = line.quantity;
                let wanted = held.saturating_add(quantity);
                if product.stock < wanted {
                    return Err(PortError::Conflict(format!(
                        "Insufficient stock. Remaining stock for {}: {}. You already have {} in your cart.",
                        product.title, product.stock, held
                    )));
                }
                line.quantity = wanted;
                line.price = price;
            }
            None => cart.items.push(CartItem {
                id: Uuid::new_v4(),
                product: product_id,
                quantity,
                price,
                name,
                image: request.image,
            }),
        }

        self.persist(cart).await
    }

    /// Sets a line's quantity to exactly `quantity`.
    pub async fn update_item_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: u32,
    ) -> PortResult<CartView> {
        if quantity < 1 {
            return Err(PortError::Validation(
                "Please enter a valid quantity (at least 1)".to_string(),
            ));
        }

        let mut cart = self.load(user_id).await?;
        let product_id = cart
            .item(item_id)
            .map(|item| item.product)
            .ok_or_else(|| PortError::NotFound(format!("Cart item {} not found", item_id)))?;

        let product = self.db.get_product(product_id).await?;
        if product.stock < quantity {
            return Err(insufficient_stock(&product.title, product.stock));
        }

        if let Some(line) = cart.items.iter_mut().find(|item| item.id == item_id) {
            line.quantity = quantity;
        }
        self.persist(cart).await
    }

    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> PortResult<CartView> {
        let mut cart = self.load(user_id).await?;
        let before = cart.items.len();
        cart.items.retain(|item| item.id != item_id);
        if cart.items.len() == before {
            return Err(PortError::NotFound(format!(
                "Cart item {} not found",
                item_id
            )));
        }
        self.persist(cart).await
    }

    /// Empties the cart, keeping the cart itself.
    pub async fn clear_cart(&self, user_id: Uuid) -> PortResult<CartView> {
        let mut cart = self.load(user_id).await?;
        cart.items.clear();
        self.persist(cart).await
    }
}
