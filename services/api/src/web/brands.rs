//! services/api/src/web/brands.rs
//!
//! REST handlers for brands.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::dto::{
    ApiResponse, BrandDetailDto, BrandDto, CreateBrandRequest, Empty, ListParams, ListResponse,
    ProductDto, UpdateBrandRequest, UploadedImage,
};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::state::AppState;
use crate::web::upload::read_image;

#[utoipa::path(
    get,
    path = "/api/v1/brands",
    tag = "Brands",
    params(ListParams),
    responses((status = 200, description = "One page of brands", body = ListResponse<BrandDto>))
)]
pub async fn list_brands(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.catalog.list_brands(params.query()).await?;
    Ok(ListResponse::page(page, BrandDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/brands/{id}",
    tag = "Brands",
    params(("id" = Uuid, Path, description = "Brand id")),
    responses(
        (status = 200, description = "The brand with its products", body = ApiResponse<BrandDetailDto>),
        (status = 404, description = "Unknown brand", body = ErrorBody)
    )
)]
pub async fn get_brand(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.catalog.get_brand(id).await?;
    Ok(ApiResponse::ok(BrandDetailDto::from(detail)))
}

#[utoipa::path(
    get,
    path = "/api/v1/brands/{id}/products",
    tag = "Brands",
    params(("id" = Uuid, Path, description = "Brand id")),
    responses(
        (status = 200, description = "Every product of the brand", body = ListResponse<ProductDto>),
        (status = 404, description = "Unknown brand", body = ErrorBody)
    )
)]
pub async fn brand_products(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.catalog.products_for_brand(id).await?;
    Ok(ListResponse::all(products, ProductDto::from))
}

#[utoipa::path(
    post,
    path = "/api/v1/brands",
    tag = "Brands",
    request_body = CreateBrandRequest,
    responses(
        (status = 201, description = "Brand created", body = ApiResponse<BrandDto>),
        (status = 400, description = "Invalid brand", body = ErrorBody),
        (status = 403, description = "Admin only", body = ErrorBody),
        (status = 409, description = "Name already taken", body = ErrorBody)
    )
)]
pub async fn create_brand(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateBrandRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let brand = state.catalog.create_brand(req.into()).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(BrandDto::from(brand))))
}

#[utoipa::path(
    put,
    path = "/api/v1/brands/{id}",
    tag = "Brands",
    params(("id" = Uuid, Path, description = "Brand id")),
    request_body = UpdateBrandRequest,
    responses(
        (status = 200, description = "Brand updated", body = ApiResponse<BrandDto>),
        (status = 400, description = "Invalid brand", body = ErrorBody),
        (status = 404, description = "Unknown brand", body = ErrorBody)
    )
)]
pub async fn update_brand(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateBrandRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let brand = state.catalog.update_brand(id, req.into()).await?;
    Ok(ApiResponse::ok(BrandDto::from(brand)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/brands/{id}",
    tag = "Brands",
    params(("id" = Uuid, Path, description = "Brand id")),
    responses(
        (status = 200, description = "Brand deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Unknown brand", body = ErrorBody),
        (status = 409, description = "Products still reference the brand", body = ErrorBody)
    )
)]
pub async fn delete_brand(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_brand(id).await?;
    Ok(ApiResponse::ok(Empty::default()))
}

#[utoipa::path(
    put,
    path = "/api/v1/brands/{id}/logo",
    tag = "Brands",
    params(("id" = Uuid, Path, description = "Brand id")),
    request_body(content_type = "multipart/form-data", description = "The logo image."),
    responses(
        (status = 200, description = "Logo replaced", body = ApiResponse<UploadedImage>),
        (status = 400, description = "Missing, oversized or non-image file", body = ErrorBody),
        (status = 404, description = "Unknown brand", body = ErrorBody)
    )
)]
pub async fn upload_brand_logo(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_image(multipart).await?;
    let url = state.catalog.set_brand_logo(id, upload).await?;
    Ok(ApiResponse::ok(UploadedImage { url }))
}
