//! services/api/src/web/dto.rs
//!
//! Wire representations of the domain types, the request payloads, and the
//! response envelopes shared by every REST handler.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use storefront_core::{
    AddCartItem, Brand, BrandDetail, BrandPatch, CartView, Category, CategoryDetail,
    CategoryNode, CategoryPatch, CategorySummary, ListQuery, NewBrand, NewCategory, NewProduct,
    Page, Product, ProductDetail, ProductFilter, ProductImage, ProductPatch, ProductSummary,
    Specification, User,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Envelopes
//=========================================================================================

/// `{ "success": true, "data": ... }`
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Empty payload returned by deletions.
#[derive(Serialize, ToSchema, Default)]
pub struct Empty {}

#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

#[derive(Serialize, ToSchema, Default, Debug, PartialEq, Eq)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

/// Envelope of every list endpoint.
#[derive(Serialize, ToSchema)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    /// Wraps one page of a paginated listing.
    pub fn page<D>(page: Page<D>, map: impl Fn(D) -> T) -> Json<Self> {
        let query = page.query;
        let pagination = Pagination {
            next: page.has_next().then(|| PageRef {
                page: query.page + 1,
                limit: query.limit,
            }),
            prev: page.has_prev().then(|| PageRef {
                page: query.page - 1,
                limit: query.limit,
            }),
        };
        let data: Vec<T> = page.items.into_iter().map(map).collect();
        Json(Self {
            success: true,
            count: data.len(),
            total: page.total,
            pagination,
            data,
        })
    }

    /// Wraps a complete, unpaginated collection.
    pub fn all<D>(items: Vec<D>, map: impl Fn(D) -> T) -> Json<Self> {
        let data: Vec<T> = items.into_iter().map(map).collect();
        Json(Self {
            success: true,
            count: data.len(),
            total: data.len() as u64,
            pagination: Pagination::default(),
            data,
        })
    }
}

/// The category detail carries the category's products next to `data`.
#[derive(Serialize, ToSchema)]
pub struct CategoryDetailResponse {
    pub success: bool,
    pub data: CategoryDetailDto,
    pub products: Vec<ProductDto>,
}

//=========================================================================================
// Query Parameters
//=========================================================================================

#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub limit: Option<u32>,
}

impl ListParams {
    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.page, self.limit)
    }
}

#[derive(Deserialize, IntoParams, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub brand: Option<Uuid>,
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub is_sale: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductListParams {
    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.page, self.limit)
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            brand: self.brand,
            category: self.category,
            featured: self.featured,
            is_sale: self.is_sale,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Fields left out keep their current value.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

//=========================================================================================
// Brands
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandDto {
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

impl From<Brand> for BrandDto {
    fn from(brand: Brand) -> Self {
        Self {
            id: brand.id,
            name: brand.name,
            slug: brand.slug,
            description: brand.description,
            logo: brand.logo,
            website: brand.website,
            founded_year: brand.founded_year,
            featured: brand.featured,
            created_at: brand.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BrandDetailDto {
    #[serde(flatten)]
    pub brand: BrandDto,
    pub products: Vec<ProductDto>,
}

impl From<BrandDetail> for BrandDetailDto {
    fn from(detail: BrandDetail) -> Self {
        Self {
            brand: detail.brand.into(),
            products: detail.products.into_iter().map(ProductDto::from).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrandRequest {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub founded_year: Option<i32>,
    pub featured: Option<bool>,
}

impl From<CreateBrandRequest> for NewBrand {
    fn from(req: CreateBrandRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            website: req.website,
            founded_year: req.founded_year,
            featured: req.featured,
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `null` clears the website.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub website: Option<Option<String>>,
    /// `null` clears the founding year.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub founded_year: Option<Option<i32>>,
    pub featured: Option<bool>,
}

impl From<UpdateBrandRequest> for BrandPatch {
    fn from(req: UpdateBrandRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            website: req.website,
            founded_year: req.founded_year,
            featured: req.featured,
        }
    }
}

//=========================================================================================
// Categories
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CategorySummaryDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub image: String,
}

impl From<CategorySummary> for CategorySummaryDto {
    fn from(summary: CategorySummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            slug: summary.slug,
            icon: summary.icon,
            image: summary.image,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub image: String,
    pub parent_category: Option<Uuid>,
    pub features: Vec<String>,
    pub featured: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            icon: category.icon,
            image: category.image,
            parent_category: category.parent_category,
            features: category.features,
            featured: category.featured,
            order: category.order,
            created_at: category.created_at,
        }
    }
}

/// A root category with its direct children.
#[derive(Serialize, ToSchema)]
pub struct CategoryNodeDto {
    #[serde(flatten)]
    pub category: CategoryDto,
    pub subcategories: Vec<CategorySummaryDto>,
}

impl From<CategoryNode> for CategoryNodeDto {
    fn from(node: CategoryNode) -> Self {
        Self {
            category: node.category.into(),
            subcategories: node
                .subcategories
                .into_iter()
                .map(CategorySummaryDto::from)
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CategoryDetailDto {
    #[serde(flatten)]
    pub category: CategoryDto,
    pub parent: Option<CategorySummaryDto>,
    pub subcategories: Vec<CategorySummaryDto>,
}

impl CategoryDetailResponse {
    pub fn new(detail: CategoryDetail) -> Json<Self> {
        Json(Self {
            success: true,
            data: CategoryDetailDto {
                category: detail.category.into(),
                parent: detail.parent.map(CategorySummaryDto::from),
                subcategories: detail
                    .subcategories
                    .into_iter()
                    .map(CategorySummaryDto::from)
                    .collect(),
            },
            products: detail.products.into_iter().map(ProductDto::from).collect(),
        })
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub parent_category: Option<Uuid>,
    #[serde(default)]
    pub features: Vec<String>,
    pub featured: Option<bool>,
    pub order: Option<i32>,
}

impl From<CreateCategoryRequest> for NewCategory {
    fn from(req: CreateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            icon: req.icon,
            parent_category: req.parent_category,
            features: req.features,
            featured: req.featured,
            order: req.order,
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// `null` moves the category to the root.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_category: Option<Option<Uuid>>,
    pub features: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub order: Option<i32>,
}

impl From<UpdateCategoryRequest> for CategoryPatch {
    fn from(req: UpdateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            icon: req.icon,
            parent_category: req.parent_category,
            features: req.features,
            featured: req.featured,
            order: req.order,
        }
    }
}

//=========================================================================================
// Products
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageDto {
    pub id: Uuid,
    pub url: String,
    pub is_main: bool,
}

impl From<ProductImage> for ProductImageDto {
    fn from(image: ProductImage) -> Self {
        Self {
            id: image.id,
            url: image.url,
            is_main: image.is_main,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SpecificationDto {
    pub name: String,
    pub value: String,
}

impl From<Specification> for SpecificationDto {
    fn from(spec: Specification) -> Self {
        Self {
            name: spec.name,
            value: spec.value,
        }
    }
}

impl From<SpecificationDto> for Specification {
    fn from(dto: SpecificationDto) -> Self {
        Self {
            name: dto.name,
            value: dto.value,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: f64,
    pub discount_percentage: f64,
    pub discounted_price: f64,
    pub stock: u32,
    pub in_stock: bool,
    pub brand: Uuid,
    pub category: Uuid,
    pub images: Vec<ProductImageDto>,
    pub specifications: Vec<SpecificationDto>,
    pub sku: String,
    pub featured: bool,
    pub is_new: bool,
    pub is_sale: bool,
    pub rating: f64,
    pub total_reviews: u32,
    pub warranty: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            discounted_price: product.discounted_price(),
            in_stock: product.in_stock(),
            id: product.id,
            title: product.title,
            slug: product.slug,
            description: product.description,
            short_description: product.short_description,
            price: product.price,
            discount_percentage: product.discount_percentage,
            stock: product.stock,
            brand: product.brand,
            category: product.category,
            images: product.images.into_iter().map(ProductImageDto::from).collect(),
            specifications: product
                .specifications
                .into_iter()
                .map(SpecificationDto::from)
                .collect(),
            sku: product.sku,
            featured: product.featured,
            is_new: product.is_new,
            is_sale: product.is_sale,
            rating: product.rating,
            total_reviews: product.total_reviews,
            warranty: product.warranty,
            created_at: product.created_at,
        }
    }
}

/// A product together with its resolved brand and category.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailDto {
    #[serde(flatten)]
    pub product: ProductDto,
    pub brand_info: Option<BrandDto>,
    pub category_info: Option<CategoryDto>,
    pub parent_category: Option<CategorySummaryDto>,
}

impl From<ProductDetail> for ProductDetailDto {
    fn from(detail: ProductDetail) -> Self {
        Self {
            product: detail.product.into(),
            brand_info: detail.brand.map(BrandDto::from),
            category_info: detail.category.map(CategoryDto::from),
            parent_category: detail.parent_category.map(CategorySummaryDto::from),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: f64,
    pub discount_percentage: Option<f64>,
    pub stock: Option<u32>,
    pub brand: Uuid,
    pub category: Uuid,
    #[serde(default)]
    pub specifications: Vec<SpecificationDto>,
    pub warranty: Option<u32>,
    pub featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    pub sku: String,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            short_description: req.short_description,
            price: req.price,
            discount_percentage: req.discount_percentage,
            stock: req.stock,
            brand: req.brand,
            category: req.category,
            specifications: req
                .specifications
                .into_iter()
                .map(Specification::from)
                .collect(),
            warranty: req.warranty,
            featured: req.featured,
            is_new: req.is_new,
            is_sale: req.is_sale,
            sku: req.sku,
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub stock: Option<u32>,
    pub brand: Option<Uuid>,
    pub category: Option<Uuid>,
    pub specifications: Option<Vec<SpecificationDto>>,
    pub warranty: Option<u32>,
    pub featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    pub sku: Option<String>,
    pub rating: Option<f64>,
    pub total_reviews: Option<u32>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            short_description: req.short_description,
            price: req.price,
            discount_percentage: req.discount_percentage,
            stock: req.stock,
            brand: req.brand,
            category: req.category,
            specifications: req
                .specifications
                .map(|specs| specs.into_iter().map(Specification::from).collect()),
            warranty: req.warranty,
            featured: req.featured,
            is_new: req.is_new,
            is_sale: req.is_sale,
            sku: req.sku,
            rating: req.rating,
            total_reviews: req.total_reviews,
        }
    }
}

/// Where an uploaded image can now be fetched from.
#[derive(Serialize, ToSchema)]
pub struct UploadedImage {
    pub url: String,
}

//=========================================================================================
// Cart
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ProductSummaryDto {
    pub id: Uuid,
    pub title: String,
    pub images: Vec<ProductImageDto>,
    pub stock: u32,
}

impl From<ProductSummary> for ProductSummaryDto {
    fn from(summary: ProductSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            images: summary.images.into_iter().map(ProductImageDto::from).collect(),
            stock: summary.stock,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    pub id: Uuid,
    pub product: Uuid,
    /// Current product fields; absent once the product has been deleted.
    pub product_details: Option<ProductSummaryDto>,
    pub quantity: u32,
    pub price: f64,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub id: Uuid,
    pub user: Uuid,
    pub items: Vec<CartItemDto>,
    pub total_price: f64,
    pub total_items: u32,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartView> for CartDto {
    fn from(view: CartView) -> Self {
        let total_price = view.total_price();
        let total_items = view.total_items();
        Self {
            id: view.cart.id,
            user: view.cart.user_id,
            items: view
                .lines
                .into_iter()
                .map(|line| CartItemDto {
                    id: line.item.id,
                    product: line.item.product,
                    product_details: line.product.map(ProductSummaryDto::from),
                    quantity: line.item.quantity,
                    price: line.item.price,
                    name: line.item.name,
                    image: line.item.image,
                })
                .collect(),
            total_price,
            total_items,
            last_updated: view.cart.last_updated,
            created_at: view.cart.created_at,
            updated_at: view.cart.updated_at,
        }
    }
}

/// Zero and below collapse to 0 so the cart rejects them with its own message.
fn cart_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<AddCartItemRequest> for AddCartItem {
    fn from(req: AddCartItemRequest) -> Self {
        Self {
            product_id: req.product_id,
            quantity: req.quantity.map(cart_quantity),
            price: req.price,
            name: req.name,
            image: req.image,
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateCartItemRequest {
    pub quantity: Option<i64>,
}

impl UpdateCartItemRequest {
    /// The requested quantity; a missing one reads as 0.
    pub fn quantity(&self) -> u32 {
        self.quantity.map(cart_quantity).unwrap_or(0)
    }
}
