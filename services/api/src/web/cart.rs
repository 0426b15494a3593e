//! services/api/src/web/cart.rs
//!
//! REST handlers for the caller's shopping cart. Every route sits behind
//! `require_auth`, so the cart is always the one of the logged-in user.

use axum::{extract::State, response::IntoResponse, Extension};
use std::sync::Arc;
use storefront_core::domain::Identity;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::dto::{AddCartItemRequest, ApiResponse, CartDto, UpdateCartItemRequest};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    tag = "Cart",
    responses(
        (status = 200, description = "The caller's cart, created on first access", body = ApiResponse<CartDto>),
        (status = 401, description = "Not logged in", body = ErrorBody)
    )
)]
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.carts.get_or_create_cart(identity.user_id).await?;
    Ok(ApiResponse::ok(CartDto::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart",
    tag = "Cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added or merged into an existing line", body = ApiResponse<CartDto>),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 404, description = "Unknown product", body = ErrorBody),
        (status = 409, description = "Not enough stock", body = ErrorBody)
    )
)]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(req): ApiJson<AddCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.carts.add_item(identity.user_id, req.into()).await?;
    Ok(ApiResponse::ok(CartDto::from(view)))
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/{item_id}",
    tag = "Cart",
    params(("item_id" = Uuid, Path, description = "Cart line id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity replaced", body = ApiResponse<CartDto>),
        (status = 400, description = "Quantity below one", body = ErrorBody),
        (status = 404, description = "No cart or no such line", body = ErrorBody),
        (status = 409, description = "Not enough stock", body = ErrorBody)
    )
)]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(item_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCartItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .carts
        .update_item_quantity(identity.user_id, item_id, req.quantity())
        .await?;
    Ok(ApiResponse::ok(CartDto::from(view)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/{item_id}",
    tag = "Cart",
    params(("item_id" = Uuid, Path, description = "Cart line id")),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartDto>),
        (status = 404, description = "No cart or no such line", body = ErrorBody)
    )
)]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(item_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.carts.remove_item(identity.user_id, item_id).await?;
    Ok(ApiResponse::ok(CartDto::from(view)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    tag = "Cart",
    responses(
        (status = 200, description = "Cart emptied; id and owner are kept", body = ApiResponse<CartDto>),
        (status = 404, description = "No cart yet", body = ErrorBody)
    )
)]
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.carts.clear_cart(identity.user_id).await?;
    Ok(ApiResponse::ok(CartDto::from(view)))
}
