//! services/api/src/web/router.rs
//!
//! Assembles the complete HTTP application: the `/api/v1` routes with their
//! auth layers, static uploads, Swagger UI, and the cross-cutting middleware.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use storefront_core::ports::PortError;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::error::ApiError;
use crate::web::middleware::{require_admin, require_auth};
use crate::web::rest::ApiDoc;
use crate::web::state::AppState;
use crate::web::{auth, brands, cart, categories, products};

/// Upper bound on the number of files a single multipart request may carry.
const MAX_FILES_PER_REQUEST: usize = 10;
/// Allowance for multipart framing and text fields on top of the file bytes.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    match HeaderValue::from_str(&config.client_url) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::error!(
                origin = %config.client_url,
                "Invalid CLIENT_URL; cross-origin requests will be refused"
            );
            cors
        }
    }
}

async fn route_not_found() -> impl IntoResponse {
    ApiError::from(PortError::NotFound("Route not found".to_string()))
}

/// Routes anyone may call.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/categories", get(categories::list_categories))
        .route("/categories/root", get(categories::root_categories))
        .route("/categories/{id}", get(categories::get_category))
        .route("/categories/{id}/products", get(categories::category_products))
        .route("/brands", get(brands::list_brands))
        .route("/brands/{id}", get(brands::get_brand))
        .route("/brands/{id}/products", get(brands::brand_products))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
}

/// Routes for any logged-in user.
fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/updatedetails", put(auth::update_details_handler))
        .route("/auth/updatepassword", put(auth::update_password_handler))
        .route("/auth/deleteaccount", delete(auth::delete_account_handler))
        .route(
            "/cart",
            get(cart::get_cart)
                .post(cart::add_item)
                .delete(cart::clear_cart),
        )
        .route(
            "/cart/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Catalog mutations.
fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/categories/{id}/image", put(categories::upload_category_image))
        .route("/brands", post(brands::create_brand))
        .route(
            "/brands/{id}",
            put(brands::update_brand).delete(brands::delete_brand),
        )
        .route("/brands/{id}/logo", put(brands::upload_brand_logo))
        .route("/products", post(products::create_product))
        .route(
            "/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/products/{id}/images", post(products::upload_product_images))
        .route(
            "/products/{id}/images/{image_id}",
            delete(products::delete_product_image),
        )
        .route(
            "/products/{id}/images/{image_id}/main",
            put(products::set_main_image),
        )
        .layer(axum_middleware::from_fn(require_admin))
}

/// Builds the full application router around the shared state.
pub fn app_router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    // `require_admin` reads the identity, so `require_auth` must wrap it.
    let protected = user_routes()
        .merge(admin_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let body_limit = config.max_file_upload * MAX_FILES_PER_REQUEST + FORM_OVERHEAD_BYTES;
    let api = Router::new()
        .merge(public_routes())
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit));

    let mut app = Router::new()
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Only a local path prefix can be served from the asset directory.
    if config.asset_public_url.starts_with('/') {
        app = app.nest_service(
            &config.asset_public_url,
            ServeDir::new(&config.asset_dir),
        );
    }

    app.layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
}
