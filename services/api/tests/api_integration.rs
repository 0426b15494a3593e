//! API integration tests.
//!
//! Tests the complete request flow: HTTP → router → managers → in-memory storage.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use api_lib::config::Config;
use api_lib::web::{app_router, AppState};
use storefront_core::memory::{InMemoryAssetStore, InMemoryDatabase};

const ADMIN_EMAIL: &str = "admin@shop.com";

fn test_router() -> (axum::Router, Arc<InMemoryAssetStore>) {
    let config = Config {
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        ..Config::default()
    };
    let assets = Arc::new(InMemoryAssetStore::new());
    let state = AppState::new(
        Arc::new(InMemoryDatabase::new()),
        assets.clone(),
        Arc::new(config),
    );
    (app_router(Arc::new(state)), assets)
}

mod helpers {
    use super::*;

    pub struct Reply {
        pub status: StatusCode,
        pub cookie: Option<String>,
        pub body: Value,
    }

    pub async fn send(
        router: &axum::Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Result<Reply> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_vec(&v).context("serialize request body")?),
            None => Body::empty(),
        };
        let request = builder.body(body).context("build request")?;
        read(router.clone().oneshot(request).await?).await
    }

    pub async fn upload(
        router: &axum::Router,
        method: Method,
        uri: &str,
        cookie: &str,
        content_type: &str,
    ) -> Result<Reply> {
        const BOUNDARY: &str = "storefront-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"pic\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"\x89PNG fake image bytes");
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .context("build request")?;
        read(router.clone().oneshot(request).await?).await
    }

    async fn read(response: axum::response::Response) -> Result<Reply> {
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .context("read response body")?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| {
                format!(
                    "parse JSON response (status={status}): {}",
                    String::from_utf8_lossy(&bytes)
                )
            })?
        };
        Ok(Reply {
            status,
            cookie,
            body,
        })
    }

    /// Registers an account and returns its `session=...` cookie.
    pub async fn register(router: &axum::Router, email: &str) -> Result<String> {
        let reply = send(
            router,
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": "Test User", "email": email, "password": "secret123" })),
        )
        .await?;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.cookie.context("register sets a session cookie")
    }

    pub fn id(body: &Value) -> String {
        body["data"]["id"].as_str().unwrap_or_default().to_string()
    }

    /// Creates a brand, a category and one product with the given stock; returns the product id.
    pub async fn seed_product(router: &axum::Router, admin: &str, stock: u32) -> Result<Seed> {
        let brand = send(
            router,
            Method::POST,
            "/api/v1/brands",
            Some(admin),
            Some(json!({ "name": "Arçelik", "description": "Home appliances" })),
        )
        .await?;
        assert_eq!(brand.status, StatusCode::CREATED, "{}", brand.body);

        let category = send(
            router,
            Method::POST,
            "/api/v1/categories",
            Some(admin),
            Some(json!({ "name": "Kitchen", "description": "Kitchen appliances" })),
        )
        .await?;
        assert_eq!(category.status, StatusCode::CREATED, "{}", category.body);

        let product = send(
            router,
            Method::POST,
            "/api/v1/products",
            Some(admin),
            Some(json!({
                "title": "Tea Maker",
                "description": "Brews tea",
                "price": 100.0,
                "discountPercentage": 10.0,
                "stock": stock,
                "brand": id(&brand.body),
                "category": id(&category.body),
                "sku": "TM-100",
                "specifications": [{ "name": "Power", "value": "1650 W" }]
            })),
        )
        .await?;
        assert_eq!(product.status, StatusCode::CREATED, "{}", product.body);

        Ok(Seed {
            brand: id(&brand.body),
            category: id(&category.body),
            product: id(&product.body),
        })
    }

    pub struct Seed {
        pub brand: String,
        pub category: String,
        pub product: String,
    }
}

use helpers::{register, seed_product, send, upload};

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn register_opens_a_session_that_me_resolves() -> Result<()> {
    let (router, _) = test_router();
    let cookie = register(&router, "Ayse@Example.com").await?;
    assert!(cookie.starts_with("session="));

    let me = send(&router, Method::GET, "/api/v1/auth/me", Some(&cookie), None).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["success"], true);
    assert_eq!(me.body["data"]["email"], "ayse@example.com");
    assert_eq!(me.body["data"]["role"], "user");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> Result<()> {
    let (router, _) = test_router();
    register(&router, "dup@example.com").await?;

    let again = send(
        &router,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "dup@example.com", "password": "secret123" })),
    )
    .await?;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["success"], false);
    Ok(())
}

#[tokio::test]
async fn login_checks_the_password_and_logout_ends_the_session() -> Result<()> {
    let (router, _) = test_router();
    register(&router, "login@example.com").await?;

    let wrong = send(
        &router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "login@example.com", "password": "nope-nope" })),
    )
    .await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "Invalid credentials");

    let ok = send(
        &router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "login@example.com", "password": "secret123" })),
    )
    .await?;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.body["data"]["lastLogin"].is_string());
    let cookie = ok.cookie.context("login sets a session cookie")?;

    let out = send(&router, Method::POST, "/api/v1/auth/logout", Some(&cookie), None).await?;
    assert_eq!(out.status, StatusCode::OK);

    let me = send(&router, Method::GET, "/api/v1/auth/me", Some(&cookie), None).await?;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn account_details_can_be_changed() -> Result<()> {
    let (router, _) = test_router();
    let cookie = register(&router, "first@example.com").await?;
    register(&router, "taken@example.com").await?;

    let updated = send(
        &router,
        Method::PUT,
        "/api/v1/auth/updatedetails",
        Some(&cookie),
        Some(json!({ "name": "  Renamed  ", "email": "Second@Example.com" })),
    )
    .await?;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["data"]["name"], "Renamed");
    assert_eq!(updated.body["data"]["email"], "second@example.com");

    let name_only = send(
        &router,
        Method::PUT,
        "/api/v1/auth/updatedetails",
        Some(&cookie),
        Some(json!({ "name": "Only Name" })),
    )
    .await?;
    assert_eq!(name_only.body["data"]["email"], "second@example.com");

    let taken = send(
        &router,
        Method::PUT,
        "/api/v1/auth/updatedetails",
        Some(&cookie),
        Some(json!({ "email": "taken@example.com" })),
    )
    .await?;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    let invalid = send(
        &router,
        Method::PUT,
        "/api/v1/auth/updatedetails",
        Some(&cookie),
        Some(json!({ "email": "not-an-email" })),
    )
    .await?;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn password_change_requires_the_current_password_and_rotates_sessions() -> Result<()> {
    let (router, _) = test_router();
    let old_cookie = register(&router, "rotate@example.com").await?;

    let wrong = send(
        &router,
        Method::PUT,
        "/api/v1/auth/updatepassword",
        Some(&old_cookie),
        Some(json!({ "currentPassword": "guess-again", "newPassword": "brand-new-1" })),
    )
    .await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let short = send(
        &router,
        Method::PUT,
        "/api/v1/auth/updatepassword",
        Some(&old_cookie),
        Some(json!({ "currentPassword": "secret123", "newPassword": "abc" })),
    )
    .await?;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let changed = send(
        &router,
        Method::PUT,
        "/api/v1/auth/updatepassword",
        Some(&old_cookie),
        Some(json!({ "currentPassword": "secret123", "newPassword": "brand-new-1" })),
    )
    .await?;
    assert_eq!(changed.status, StatusCode::OK, "{}", changed.body);
    let new_cookie = changed.cookie.context("password change sets a session cookie")?;

    let stale = send(&router, Method::GET, "/api/v1/auth/me", Some(&old_cookie), None).await?;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    let fresh = send(&router, Method::GET, "/api/v1/auth/me", Some(&new_cookie), None).await?;
    assert_eq!(fresh.status, StatusCode::OK);

    let old_login = send(
        &router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "rotate@example.com", "password": "secret123" })),
    )
    .await?;
    assert_eq!(old_login.status, StatusCode::UNAUTHORIZED);
    let new_login = send(
        &router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "rotate@example.com", "password": "brand-new-1" })),
    )
    .await?;
    assert_eq!(new_login.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn deleting_an_account_ends_its_session_and_frees_the_email() -> Result<()> {
    let (router, _) = test_router();
    let cookie = register(&router, "leaving@example.com").await?;
    let cart = send(&router, Method::GET, "/api/v1/cart", Some(&cookie), None).await?;
    assert_eq!(cart.status, StatusCode::OK);

    let deleted = send(
        &router,
        Method::DELETE,
        "/api/v1/auth/deleteaccount",
        Some(&cookie),
        None,
    )
    .await?;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["success"], true);

    let me = send(&router, Method::GET, "/api/v1/auth/me", Some(&cookie), None).await?;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let login = send(
        &router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "leaving@example.com", "password": "secret123" })),
    )
    .await?;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    register(&router, "leaving@example.com").await?;
    Ok(())
}

#[tokio::test]
async fn cart_requires_a_session() -> Result<()> {
    let (router, _) = test_router();
    let reply = send(&router, Method::GET, "/api/v1/cart", None, None).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);
    assert!(reply.body["error"].is_string());

    let forged = send(
        &router,
        Method::GET,
        "/api/v1/cart",
        Some("session=not-a-session"),
        None,
    )
    .await?;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn catalog_mutations_are_admin_only() -> Result<()> {
    let (router, _) = test_router();
    let user = register(&router, "shopper@example.com").await?;

    let reply = send(
        &router,
        Method::POST,
        "/api/v1/brands",
        Some(&user),
        Some(json!({ "name": "Nope", "description": "Should not exist" })),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["success"], false);

    let anonymous = send(
        &router,
        Method::POST,
        "/api/v1/brands",
        None,
        Some(json!({ "name": "Nope", "description": "Should not exist" })),
    )
    .await?;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let brands = send(&router, Method::GET, "/api/v1/brands", None, None).await?;
    assert_eq!(brands.status, StatusCode::OK);
    assert_eq!(brands.body["count"], 0);
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn product_listing_uses_the_list_envelope() -> Result<()> {
    let (router, _) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;
    let seed = seed_product(&router, &admin, 5).await?;

    let list = send(&router, Method::GET, "/api/v1/products?limit=1", None, None).await?;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["success"], true);
    assert_eq!(list.body["count"], 1);
    assert_eq!(list.body["total"], 1);
    assert!(list.body["pagination"].get("next").is_none());

    let product = &list.body["data"][0];
    assert_eq!(product["id"], seed.product.as_str());
    assert_eq!(product["slug"], "tea-maker");
    assert_eq!(product["discountedPrice"], 90.0);
    assert_eq!(product["inStock"], true);

    let detail = send(
        &router,
        Method::GET,
        &format!("/api/v1/products/{}", seed.product),
        None,
        None,
    )
    .await?;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["brandInfo"]["slug"], "arcelik");
    assert_eq!(detail.body["data"]["categoryInfo"]["name"], "Kitchen");

    let filtered = send(
        &router,
        Method::GET,
        &format!("/api/v1/products?brand={}&minPrice=150", seed.brand),
        None,
        None,
    )
    .await?;
    assert_eq!(filtered.body["count"], 0);
    Ok(())
}

#[tokio::test]
async fn deleting_a_referenced_brand_or_category_conflicts() -> Result<()> {
    let (router, _) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;
    let seed = seed_product(&router, &admin, 5).await?;

    let brand = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/brands/{}", seed.brand),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(brand.status, StatusCode::CONFLICT);
    assert_eq!(brand.body["success"], false);

    let category = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/categories/{}", seed.category),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(category.status, StatusCode::CONFLICT);

    let still_there = send(
        &router,
        Method::GET,
        &format!("/api/v1/brands/{}", seed.brand),
        None,
        None,
    )
    .await?;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["data"]["products"][0]["id"], seed.product.as_str());

    let product = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/products/{}", seed.product),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(product.status, StatusCode::OK);

    let brand = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/brands/{}", seed.brand),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(brand.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn category_tree_rejects_cycles() -> Result<()> {
    let (router, _) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;

    let parent = send(
        &router,
        Method::POST,
        "/api/v1/categories",
        Some(&admin),
        Some(json!({ "name": "Electronics", "description": "All electronics" })),
    )
    .await?;
    let parent_id = helpers::id(&parent.body);
    let child = send(
        &router,
        Method::POST,
        "/api/v1/categories",
        Some(&admin),
        Some(json!({
            "name": "Phones",
            "description": "Mobile phones",
            "parentCategory": parent_id
        })),
    )
    .await?;
    assert_eq!(child.status, StatusCode::CREATED);
    let child_id = helpers::id(&child.body);

    let roots = send(&router, Method::GET, "/api/v1/categories/root", None, None).await?;
    assert_eq!(roots.status, StatusCode::OK);
    assert_eq!(roots.body["count"], 1);
    assert_eq!(roots.body["data"][0]["subcategories"][0]["name"], "Phones");

    let cycle = send(
        &router,
        Method::PUT,
        &format!("/api/v1/categories/{}", parent_id),
        Some(&admin),
        Some(json!({ "parentCategory": child_id })),
    )
    .await?;
    assert_eq!(cycle.status, StatusCode::BAD_REQUEST);

    let detail = send(
        &router,
        Method::GET,
        &format!("/api/v1/categories/{}", child_id),
        None,
        None,
    )
    .await?;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["parent"]["name"], "Electronics");
    assert!(detail.body["products"].is_array());

    let to_root = send(
        &router,
        Method::PUT,
        &format!("/api/v1/categories/{}", child_id),
        Some(&admin),
        Some(json!({ "parentCategory": null })),
    )
    .await?;
    assert_eq!(to_root.status, StatusCode::OK);
    assert!(to_root.body["data"]["parentCategory"].is_null());
    Ok(())
}

#[tokio::test]
async fn product_images_upload_and_promote() -> Result<()> {
    let (router, assets) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;
    let seed = seed_product(&router, &admin, 5).await?;
    let uri = format!("/api/v1/products/{}/images", seed.product);

    let first = upload(&router, Method::POST, &uri, &admin, "image/png").await?;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);
    assert_eq!(first.body["data"][0]["isMain"], true);
    let first_id = first.body["data"][0]["id"].as_str().unwrap_or_default().to_string();

    let second = upload(&router, Method::POST, &uri, &admin, "image/png").await?;
    assert_eq!(second.body["data"][0]["isMain"], false);

    let removed = send(
        &router,
        Method::DELETE,
        &format!("{}/{}", uri, first_id),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(removed.body["data"][0]["isMain"], true);
    assert_eq!(assets.destroyed().await.len(), 1);

    let not_an_image = upload(&router, Method::POST, &uri, &admin, "text/plain").await?;
    assert_eq!(not_an_image.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn brand_logo_requires_a_file() -> Result<()> {
    let (router, _) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;
    let seed = seed_product(&router, &admin, 1).await?;

    let logo = upload(
        &router,
        Method::PUT,
        &format!("/api/v1/brands/{}/logo", seed.brand),
        &admin,
        "image/jpeg",
    )
    .await?;
    assert_eq!(logo.status, StatusCode::OK, "{}", logo.body);
    assert!(logo.body["data"]["url"]
        .as_str()
        .is_some_and(|url| url.starts_with(InMemoryAssetStore::URL_PREFIX)));
    Ok(())
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn cart_merges_lines_and_enforces_stock() -> Result<()> {
    let (router, _) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;
    let seed = seed_product(&router, &admin, 5).await?;
    let user = register(&router, "buyer@example.com").await?;

    let empty = send(&router, Method::GET, "/api/v1/cart", Some(&user), None).await?;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body["data"]["items"].as_array().map(Vec::len), Some(0));
    let cart_id = helpers::id(&empty.body);

    let add = |quantity: u32, price: f64| {
        json!({
            "productId": seed.product,
            "quantity": quantity,
            "price": price,
            "name": "Tea Maker"
        })
    };

    let first = send(&router, Method::POST, "/api/v1/cart", Some(&user), Some(add(2, 100.0))).await?;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);

    let merged = send(&router, Method::POST, "/api/v1/cart", Some(&user), Some(add(3, 90.0))).await?;
    assert_eq!(merged.status, StatusCode::OK);
    let data = &merged.body["data"];
    assert_eq!(data["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(data["items"][0]["quantity"], 5);
    assert_eq!(data["items"][0]["price"], 90.0);
    assert_eq!(data["totalPrice"], 450.0);
    assert_eq!(data["totalItems"], 5);
    assert_eq!(data["items"][0]["productDetails"]["title"], "Tea Maker");

    let over = send(&router, Method::POST, "/api/v1/cart", Some(&user), Some(add(1, 90.0))).await?;
    assert_eq!(over.status, StatusCode::CONFLICT);
    assert_eq!(over.body["success"], false);

    let item_id = data["items"][0]["id"].as_str().unwrap_or_default().to_string();
    let too_many = send(
        &router,
        Method::PUT,
        &format!("/api/v1/cart/{}", item_id),
        Some(&user),
        Some(json!({ "quantity": 6 })),
    )
    .await?;
    assert_eq!(too_many.status, StatusCode::CONFLICT);

    let updated = send(
        &router,
        Method::PUT,
        &format!("/api/v1/cart/{}", item_id),
        Some(&user),
        Some(json!({ "quantity": 1 })),
    )
    .await?;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["totalPrice"], 90.0);

    let cleared = send(&router, Method::DELETE, "/api/v1/cart", Some(&user), None).await?;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(helpers::id(&cleared.body), cart_id);
    assert_eq!(cleared.body["data"]["totalItems"], 0);
    Ok(())
}

#[tokio::test]
async fn cart_rejects_incomplete_items() -> Result<()> {
    let (router, _) = test_router();
    let user = register(&router, "partial@example.com").await?;

    let missing = send(
        &router,
        Method::POST,
        "/api/v1/cart",
        Some(&user),
        Some(json!({ "quantity": 1, "price": 10.0, "name": "Thing" })),
    )
    .await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let unknown = send(
        &router,
        Method::POST,
        "/api/v1/cart",
        Some(&user),
        Some(json!({
            "productId": uuid::Uuid::new_v4(),
            "quantity": 1,
            "price": 10.0,
            "name": "Thing"
        })),
    )
    .await?;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn cart_quantity_errors_use_the_error_envelope() -> Result<()> {
    let (router, _) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;
    let seed = seed_product(&router, &admin, 5).await?;
    let user = register(&router, "counter@example.com").await?;

    let added = send(
        &router,
        Method::POST,
        "/api/v1/cart",
        Some(&user),
        Some(json!({ "productId": seed.product, "quantity": 2, "price": 100.0, "name": "Tea Maker" })),
    )
    .await?;
    assert_eq!(added.status, StatusCode::OK, "{}", added.body);
    let item_uri = format!(
        "/api/v1/cart/{}",
        added.body["data"]["items"][0]["id"].as_str().unwrap_or_default()
    );

    for body in [json!({ "quantity": -1 }), json!({ "quantity": 0 }), json!({})] {
        let reply = send(&router, Method::PUT, &item_uri, Some(&user), Some(body.clone())).await?;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{body}: {}", reply.body);
        assert_eq!(reply.body["success"], false);
        assert_eq!(reply.body["error"], "Please enter a valid quantity (at least 1)");
    }

    let negative = send(
        &router,
        Method::POST,
        "/api/v1/cart",
        Some(&user),
        Some(json!({ "productId": seed.product, "quantity": -2, "price": 100.0, "name": "Tea Maker" })),
    )
    .await?;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert_eq!(negative.body["error"], "Quantity must be at least 1");

    let cart = send(&router, Method::GET, "/api/v1/cart", Some(&user), None).await?;
    assert_eq!(cart.body["data"]["totalItems"], 2);
    Ok(())
}

// ============================================================================
// Plumbing
// ============================================================================

#[tokio::test]
async fn malformed_input_uses_the_error_envelope() -> Result<()> {
    let (router, _) = test_router();
    let admin = register(&router, ADMIN_EMAIL).await?;
    let seed = seed_product(&router, &admin, 5).await?;

    let bad_id = send(&router, Method::GET, "/api/v1/categories/not-a-uuid", None, None).await?;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["success"], false);
    assert!(bad_id.body["error"].is_string());

    let negative_stock = send(
        &router,
        Method::PUT,
        &format!("/api/v1/products/{}", seed.product),
        Some(&admin),
        Some(json!({ "stock": -1 })),
    )
    .await?;
    assert_eq!(negative_stock.status, StatusCode::BAD_REQUEST);
    assert_eq!(negative_stock.body["success"], false);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .context("build request")?;
    let response = router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["success"], false);
    Ok(())
}


#[tokio::test]
async fn unknown_routes_use_the_error_envelope() -> Result<()> {
    let (router, _) = test_router();
    let reply = send(&router, Method::GET, "/api/v1/nothing-here", None, None).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["success"], false);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let (router, _) = test_router();
    let reply = send(&router, Method::GET, "/api-docs/openapi.json", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["paths"]["/api/v1/cart"].is_object());
    Ok(())
}
