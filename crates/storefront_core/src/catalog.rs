//! crates/storefront_core/src/catalog.rs
//!
//! Brand and product management: field validation, referential checks against
//! the other catalog entities, and the release of image assets when records or
//! images go away. Category management lives in `categories`.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Brand, Category, CategorySummary, ListQuery, Page, Product, ProductFilter, ProductImage,
    Specification, DEFAULT_BRAND_LOGO, DEFAULT_WARRANTY_MONTHS,
};
use crate::ports::{
    AssetStore, DatabaseService, ImageTransform, PortError, PortResult, StoredAsset,
};
use crate::slug::slugify;
use crate::validation::{validate_brand, validate_image_upload, validate_product};

/// Default upper bound for a single uploaded image.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1_000_000;

const BRAND_LOGO_WIDTH: u32 = 200;
const PRODUCT_IMAGE_WIDTH: u32 = 1000;

//=========================================================================================
// Inputs & Views
//=========================================================================================

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewBrand {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub founded_year: Option<i32>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct BrandPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the website.
    pub website: Option<Option<String>>,
    /// `Some(None)` clears the founding year.
    pub founded_year: Option<Option<i32>>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: f64,
    pub discount_percentage: Option<f64>,
    pub stock: Option<u32>,
    pub brand: Uuid,
    pub category: Uuid,
    pub specifications: Vec<Specification>,
    pub warranty: Option<u32>,
    pub featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    pub sku: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub stock: Option<u32>,
    pub brand: Option<Uuid>,
    pub category: Option<Uuid>,
    pub specifications: Option<Vec<Specification>>,
    pub warranty: Option<u32>,
    pub featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    pub sku: Option<String>,
    pub rating: Option<f64>,
    pub total_reviews: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct BrandDetail {
    pub brand: Brand,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub brand: Option<Brand>,
    pub category: Option<Category>,
    pub parent_category: Option<CategorySummary>,
}

//=========================================================================================
// Helpers shared with the other managers
//=========================================================================================

/// Turns a `NotFound` into `None`, leaving every other outcome untouched.
pub(crate) fn optional<T>(result: PortResult<T>) -> PortResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PortError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Releases the asset behind `url` unless it is the entity's placeholder.
pub(crate) async fn release_url(
    assets: &dyn AssetStore,
    url: &str,
    placeholder: &str,
) -> PortResult<()> {
    if url.is_empty() || url == placeholder {
        return Ok(());
    }
    if let Some(external_id) = assets.external_id_for_url(url) {
        assets.destroy(&external_id).await?;
    }
    Ok(())
}

pub(crate) async fn store_image(
    assets: &dyn AssetStore,
    upload: ImageUpload,
    folder: &str,
    width: u32,
) -> PortResult<StoredAsset> {
    assets
        .upload(
            upload.data,
            &upload.content_type,
            folder,
            ImageTransform { width },
        )
        .await
}

//=========================================================================================
// The Catalog Service
//=========================================================================================

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<dyn DatabaseService>,
    assets: Arc<dyn AssetStore>,
    max_upload_bytes: usize,
}

impl CatalogService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        assets: Arc<dyn AssetStore>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            assets,
            max_upload_bytes,
        }
    }

    // --- Brands ---

    pub async fn create_brand(&self, input: NewBrand) -> PortResult<Brand> {
        let mut brand = Brand {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            slug: String::new(),
            description: input.description,
            logo: DEFAULT_BRAND_LOGO.to_string(),
            website: input.website,
            founded_year: input.founded_year,
            featured: input.featured.unwrap_or(false),
            created_at: Utc::now(),
        };
        validate_brand(&brand)?;
        brand.slug = slugify(&brand.name);

        if self.db.find_brand_by_name(&brand.name).await?.is_some() {
            return Err(PortError::Conflict(format!(
                "A brand named {} already exists",
                brand.name
            )));
        }

        let brand = self.db.insert_brand(&brand).await?;
        info!(brand_id = %brand.id, "Brand created.");
        Ok(brand)
    }

    pub async fn get_brand(&self, brand_id: Uuid) -> PortResult<BrandDetail> {
        let brand = self.db.get_brand(brand_id).await?;
        let products = self.db.products_by_brand(brand_id).await?;
        Ok(BrandDetail { brand, products })
    }

    pub async fn list_brands(&self, query: ListQuery) -> PortResult<Page<Brand>> {
        self.db.list_brands(query).await
    }

    pub async fn update_brand(&self, brand_id: Uuid, patch: BrandPatch) -> PortResult<Brand> {
        let mut brand = self.db.get_brand(brand_id).await?;

        if let Some(name) = patch.name {
            brand.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            brand.description = description;
        }
        if let Some(website) = patch.website {
            brand.website = website;
        }
        if let Some(year) = patch.founded_year {
            brand.founded_year = year;
        }
        if let Some(featured) = patch.featured {
            brand.featured = featured;
        }

        validate_brand(&brand)?;
        brand.slug = slugify(&brand.name);
        self.db.update_brand(&brand).await
    }

    /// Deletes a brand that no product references, releasing its logo.
    pub async fn delete_brand(&self, brand_id: Uuid) -> PortResult<()> {
        let brand = self.db.get_brand(brand_id).await?;

        let dependents = self.db.count_products_by_brand(brand_id).await?;
        if dependents > 0 {
            return Err(PortError::Conflict(format!(
                "Dependent records exist: {} product(s) belong to this brand. Delete them first.",
                dependents
            )));
        }

        release_url(self.assets.as_ref(), &brand.logo, DEFAULT_BRAND_LOGO).await?;
        self.db.delete_brand(brand_id).await?;
        info!(brand_id = %brand_id, "Brand deleted.");
        Ok(())
    }

    /// Replaces the brand's logo, releasing the previous one. Returns the new URL.
    pub async fn set_brand_logo(&self, brand_id: Uuid, upload: ImageUpload) -> PortResult<String> {
        let mut brand = self.db.get_brand(brand_id).await?;
        validate_image_upload(&upload.content_type, upload.data.len(), self.max_upload_bytes)?;

        release_url(self.assets.as_ref(), &brand.logo, DEFAULT_BRAND_LOGO).await?;
        let stored = store_image(
            self.assets.as_ref(),
            upload,
            "brands",
            BRAND_LOGO_WIDTH,
        )
        .await?;

        brand.logo = stored.url.clone();
        brand.slug = slugify(&brand.name);
        self.db.update_brand(&brand).await?;
        Ok(stored.url)
    }

    // --- Products ---

    pub async fn create_product(&self, input: NewProduct) -> PortResult<Product> {
        let mut product = Product {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            slug: String::new(),
            description: input.description,
            short_description: input.short_description,
            price: input.price,
            discount_percentage: input.discount_percentage.unwrap_or(0.0),
            stock: input.stock.unwrap_or(0),
            brand: input.brand,
            category: input.category,
            images: Vec::new(),
            specifications: input.specifications,
            sku: input.sku.trim().to_string(),
            featured: input.featured.unwrap_or(false),
            is_new: input.is_new.unwrap_or(true),
            is_sale: input.is_sale.unwrap_or(false),
            rating: 0.0,
            total_reviews: 0,
            warranty: input.warranty.unwrap_or(DEFAULT_WARRANTY_MONTHS),
            created_at: Utc::now(),
        };

        self.db.get_brand(product.brand).await?;
        self.db.get_category(product.category).await?;
        if self.db.find_product_by_sku(&product.sku).await?.is_some() {
            return Err(PortError::Conflict(format!(
                "Another product with SKU {} already exists",
                product.sku
            )));
        }

        validate_product(&product)?;
        product.slug = slugify(&product.title);

        let product = self.db.insert_product(&product).await?;
        info!(product_id = %product.id, sku = %product.sku, "Product created.");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: Uuid) -> PortResult<ProductDetail> {
        let product = self.db.get_product(product_id).await?;
        let brand = optional(self.db.get_brand(product.brand).await)?;
        let category = optional(self.db.get_category(product.category).await)?;

        let parent_category = match category.as_ref().and_then(|c| c.parent_category) {
            Some(parent_id) => optional(self.db.get_category(parent_id).await)?
                .as_ref()
                .map(CategorySummary::from),
            None => None,
        };

        Ok(ProductDetail {
            product,
            brand,
            category,
            parent_category,
        })
    }

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        query: ListQuery,
    ) -> PortResult<Page<Product>> {
        self.db.list_products(filter, query).await
    }

    pub async fn products_for_brand(&self, brand_id: Uuid) -> PortResult<Vec<Product>> {
        self.db.get_brand(brand_id).await?;
        self.db.products_by_brand(brand_id).await
    }

    pub async fn products_for_category(&self, category_id: Uuid) -> PortResult<Vec<Product>> {
        self.db.get_category(category_id).await?;
        self.db.products_in_categories(&[category_id]).await
    }

    /// Applies a partial update. SKU, brand and category are only re-checked
    /// when supplied and different from the stored value.
    pub async fn update_product(
        &self,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> PortResult<Product> {
        let mut product = self.db.get_product(product_id).await?;

        if let Some(sku) = patch.sku.map(|s| s.trim().to_string()) {
            if sku != product.sku {
                if self.db.find_product_by_sku(&sku).await?.is_some() {
                    return Err(PortError::Conflict(format!(
                        "Another product with SKU {} already exists",
                        sku
                    )));
                }
                product.sku = sku;
            }
        }
        if let Some(brand) = patch.brand {
            if brand != product.brand {
                self.db.get_brand(brand).await?;
                product.brand = brand;
            }
        }
        if let Some(category) = patch.category {
            if category != product.category {
                self.db.get_category(category).await?;
                product.category = category;
            }
        }

        if let Some(title) = patch.title {
            product.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(short) = patch.short_description {
            product.short_description = Some(short);
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(discount) = patch.discount_percentage {
            product.discount_percentage = discount;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(specifications) = patch.specifications {
            product.specifications = specifications;
        }
        if let Some(warranty) = patch.warranty {
            product.warranty = warranty;
        }
        if let Some(featured) = patch.featured {
            product.featured = featured;
        }
        if let Some(is_new) = patch.is_new {
            product.is_new = is_new;
        }
        if let Some(is_sale) = patch.is_sale {
            product.is_sale = is_sale;
        }
        if let Some(rating) = patch.rating {
            product.rating = rating;
        }
        if let Some(total_reviews) = patch.total_reviews {
            product.total_reviews = total_reviews;
        }

        validate_product(&product)?;
        product.slug = slugify(&product.title);
        self.db.update_product(&product).await
    }

    /// Releases every stored image of the product, then removes it.
    pub async fn delete_product(&self, product_id: Uuid) -> PortResult<()> {
        let product = self.db.get_product(product_id).await?;

        for image in &product.images {
            if let Some(external_id) = &image.external_id {
                self.assets.destroy(external_id).await?;
            }
        }

        self.db.delete_product(product_id).await?;
        info!(product_id = %product_id, "Product deleted.");
        Ok(())
    }

    /// Uploads images and appends them; the first image of an image-less product becomes main.
    pub async fn add_product_images(
        &self,
        product_id: Uuid,
        uploads: Vec<ImageUpload>,
    ) -> PortResult<Vec<ProductImage>> {
        let mut product = self.db.get_product(product_id).await?;
        if uploads.is_empty() {
            return Err(PortError::Validation("Please upload a file".to_string()));
        }
        for upload in &uploads {
            validate_image_upload(&upload.content_type, upload.data.len(), self.max_upload_bytes)?;
        }

        let folder = format!("products/{}", product.id);
        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let asset = store_image(
                self.assets.as_ref(),
                upload,
                &folder,
                PRODUCT_IMAGE_WIDTH,
            )
            .await?;
            stored.push(ProductImage {
                id: Uuid::new_v4(),
                url: asset.url,
                external_id: Some(asset.external_id),
                is_main: false,
            });
        }

        let added = stored.len();
        product.push_images(stored);
        product.slug = slugify(&product.title);
        let product = self.db.update_product(&product).await?;

        let start = product.images.len() - added;
        Ok(product.images[start..].to_vec())
    }

    /// Removes one image, promoting another to main if needed. Returns the remaining images.
    pub async fn delete_product_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
    ) -> PortResult<Vec<ProductImage>> {
        let mut product = self.db.get_product(product_id).await?;
        let removed = product
            .remove_image(image_id)
            .ok_or_else(|| PortError::NotFound(format!("Image {} not found", image_id)))?;

        if let Some(external_id) = &removed.external_id {
            self.assets.destroy(external_id).await?;
        }

        product.slug = slugify(&product.title);
        let product = self.db.update_product(&product).await?;
        Ok(product.images)
    }

    pub async fn set_main_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
    ) -> PortResult<Vec<ProductImage>> {
        let mut product = self.db.get_product(product_id).await?;
        if !product.set_main_image(image_id) {
            return Err(PortError::NotFound(format!("Image {} not found", image_id)));
        }
        product.slug = slugify(&product.title);
        let product = self.db.update_product(&product).await?;
        Ok(product.images)
    }
}
