//! services/api/src/web/products.rs
//!
//! REST handlers for products and their image galleries.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::dto::{
    ApiResponse, CreateProductRequest, Empty, ListResponse, ProductDetailDto, ProductDto,
    ProductImageDto, ProductListParams, UpdateProductRequest,
};
use crate::web::extract::{ApiJson, ApiPath, ApiQuery};
use crate::web::state::AppState;
use crate::web::upload::read_images;

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    params(ProductListParams),
    responses((status = 200, description = "One page of matching products", body = ListResponse<ProductDto>))
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .catalog
        .list_products(&params.filter(), params.query())
        .await?;
    Ok(ListResponse::page(page, ProductDto::from))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product with brand and category", body = ApiResponse<ProductDetailDto>),
        (status = 404, description = "Unknown product", body = ErrorBody)
    )
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.catalog.get_product(id).await?;
    Ok(ApiResponse::ok(ProductDetailDto::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductDto>),
        (status = 400, description = "Invalid product", body = ErrorBody),
        (status = 404, description = "Unknown brand or category", body = ErrorBody),
        (status = 409, description = "SKU already taken", body = ErrorBody)
    )
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.create_product(req.into()).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(ProductDto::from(product))))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductDto>),
        (status = 400, description = "Invalid product", body = ErrorBody),
        (status = 404, description = "Unknown product, brand or category", body = ErrorBody),
        (status = 409, description = "SKU already taken", body = ErrorBody)
    )
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.update_product(id, req.into()).await?;
    Ok(ApiResponse::ok(ProductDto::from(product)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product and its images deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Unknown product", body = ErrorBody)
    )
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_product(id).await?;
    Ok(ApiResponse::ok(Empty::default()))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/images",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body(content_type = "multipart/form-data", description = "One or more image files."),
    responses(
        (status = 200, description = "The images just added", body = ApiResponse<Vec<ProductImageDto>>),
        (status = 400, description = "Missing, oversized or non-image file", body = ErrorBody),
        (status = 404, description = "Unknown product", body = ErrorBody)
    )
)]
pub async fn upload_product_images(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let uploads = read_images(multipart).await?;
    let images = state.catalog.add_product_images(id, uploads).await?;
    Ok(ApiResponse::ok(
        images
            .into_iter()
            .map(ProductImageDto::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}/images/{image_id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("image_id" = Uuid, Path, description = "Image id")
    ),
    responses(
        (status = 200, description = "The remaining images", body = ApiResponse<Vec<ProductImageDto>>),
        (status = 404, description = "Unknown product or image", body = ErrorBody)
    )
)]
pub async fn delete_product_image(
    State(state): State<Arc<AppState>>,
    ApiPath((id, image_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let images = state.catalog.delete_product_image(id, image_id).await?;
    Ok(ApiResponse::ok(
        images
            .into_iter()
            .map(ProductImageDto::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/images/{image_id}/main",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product id"),
        ("image_id" = Uuid, Path, description = "Image id")
    ),
    responses(
        (status = 200, description = "All images, with the chosen one as main", body = ApiResponse<Vec<ProductImageDto>>),
        (status = 404, description = "Unknown product or image", body = ErrorBody)
    )
)]
pub async fn set_main_image(
    State(state): State<Arc<AppState>>,
    ApiPath((id, image_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let images = state.catalog.set_main_image(id, image_id).await?;
    Ok(ApiResponse::ok(
        images
            .into_iter()
            .map(ProductImageDto::from)
            .collect::<Vec<_>>(),
    ))
}
