//! services/api/src/web/categories.rs
//!
//! REST handlers for the category tree.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::dto::{
    ApiResponse, CategoryDetailResponse, CategoryDto, CategoryNodeDto, CreateCategoryRequest,
    Empty, ListParams, ListResponse, ProductDto, UpdateCategoryRequest, UploadedImage,
};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::state::AppState;
use crate::web::upload::read_image;

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    params(ListParams),
    responses((status = 200, description = "One page of categories", body = ListResponse<CategoryDto>))
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.categories.list_categories(params.query()).await?;
    Ok(ListResponse::page(page, CategoryDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/root",
    tag = "Categories",
    responses((status = 200, description = "Root categories with their children", body = ListResponse<CategoryNodeDto>))
)]
pub async fn root_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let roots = state.categories.root_categories().await?;
    Ok(ListResponse::all(roots, CategoryNodeDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category, its parent, children and products", body = CategoryDetailResponse),
        (status = 404, description = "Unknown category", body = ErrorBody)
    )
)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.categories.category_with_descendants(id).await?;
    Ok(CategoryDetailResponse::new(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}/products",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Products filed directly under the category", body = ListResponse<ProductDto>),
        (status = 404, description = "Unknown category", body = ErrorBody)
    )
)]
pub async fn category_products(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.catalog.products_for_category(id).await?;
    Ok(ListResponse::all(products, ProductDto::from))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryDto>),
        (status = 400, description = "Invalid category", body = ErrorBody),
        (status = 404, description = "Unknown parent", body = ErrorBody),
        (status = 409, description = "Name already taken", body = ErrorBody)
    )
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.categories.create_category(req.into()).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(CategoryDto::from(category))))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryDto>),
        (status = 400, description = "Invalid category or cyclic parent", body = ErrorBody),
        (status = 404, description = "Unknown category or parent", body = ErrorBody)
    )
)]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.categories.update_category(id, req.into()).await?;
    Ok(ApiResponse::ok(CategoryDto::from(category)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Unknown category", body = ErrorBody),
        (status = 409, description = "Products or subcategories still depend on it", body = ErrorBody)
    )
)]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.categories.delete_category(id).await?;
    Ok(ApiResponse::ok(Empty::default()))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}/image",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body(content_type = "multipart/form-data", description = "The category image."),
    responses(
        (status = 200, description = "Image replaced", body = ApiResponse<UploadedImage>),
        (status = 400, description = "Missing, oversized or non-image file", body = ErrorBody),
        (status = 404, description = "Unknown category", body = ErrorBody)
    )
)]
pub async fn upload_category_image(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_image(multipart).await?;
    let url = state.categories.set_category_image(id, upload).await?;
    Ok(ApiResponse::ok(UploadedImage { url }))
}
