//! crates/storefront_core/src/categories.rs
//!
//! The category tree. Categories reference their parent; children are always
//! found by querying for that reference, never stored on the parent.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{optional, release_url, store_image, ImageUpload};
use crate::domain::{
    Category, CategorySummary, ListQuery, Page, Product, DEFAULT_CATEGORY_ICON,
    DEFAULT_CATEGORY_IMAGE,
};
use crate::ports::{AssetStore, DatabaseService, PortError, PortResult};
use crate::slug::slugify;
use crate::validation::{validate_category, validate_image_upload};

const CATEGORY_IMAGE_WIDTH: u32 = 600;

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub parent_category: Option<Uuid>,
    pub features: Vec<String>,
    pub featured: Option<bool>,
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// `Some(None)` moves the category to the root.
    pub parent_category: Option<Option<Uuid>>,
    pub features: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub order: Option<i32>,
}

/// A root category with its direct children's display fields.
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: Category,
    pub subcategories: Vec<CategorySummary>,
}

#[derive(Debug, Clone)]
pub struct CategoryDetail {
    pub category: Category,
    pub parent: Option<CategorySummary>,
    pub subcategories: Vec<CategorySummary>,
    /// Products of the category and of its direct subcategories.
    pub products: Vec<Product>,
}

#[derive(Clone)]
pub struct CategoryHierarchy {
    db: Arc<dyn DatabaseService>,
    assets: Arc<dyn AssetStore>,
    max_upload_bytes: usize,
}

impl CategoryHierarchy {
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

    pub async fn create_category(&self, input: NewCategory) -> PortResult<Category> {
        if let Some(parent_id) = input.parent_category {
            self.db.get_category(parent_id).await.map_err(|e| match e {
                PortError::NotFound(_) => {
                    PortError::NotFound(format!("Parent category {} not found", parent_id))
                }
                other => other,
            })?;
        }

        let mut category = Category {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            slug: String::new(),
            description: input.description,
            icon: input
                .icon
                .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
            image: DEFAULT_CATEGORY_IMAGE.to_string(),
            parent_category: input.parent_category,
            features: input.features,
            featured: input.featured.unwrap_or(false),
            order: input.order.unwrap_or(0),
            created_at: Utc::now(),
        };
        validate_category(&category)?;
        category.slug = slugify(&category.name);

        if self.db.find_category_by_name(&category.name).await?.is_some() {
            return Err(PortError::Conflict(format!(
                "A category named {} already exists",
                category.name
            )));
        }

        let category = self.db.insert_category(&category).await?;
        info!(category_id = %category.id, "Category created.");
        Ok(category)
    }

    pub async fn list_categories(&self, query: ListQuery) -> PortResult<Page<Category>> {
        self.db.list_categories(query).await
    }

    /// Root categories ordered by `(order, name)`, each with its direct children.
    pub async fn root_categories(&self) -> PortResult<Vec<CategoryNode>> {
        let roots = self.db.root_categories().await?;
        let mut nodes = Vec::with_capacity(roots.len());
        for category in roots {
            let subcategories = self
                .db
                .subcategories_of(category.id)
                .await?
                .iter()
                .map(CategorySummary::from)
                .collect();
            nodes.push(CategoryNode {
                category,
                subcategories,
            });
        }
        Ok(nodes)
    }

    /// The category, its direct children, and the products of both.
    /// Grandchildren's products are not included.
    pub async fn category_with_descendants(&self, category_id: Uuid) -> PortResult<CategoryDetail> {
        let category = self.db.get_category(category_id).await?;
        let children = self.db.subcategories_of(category_id).await?;

        let parent = match category.parent_category {
            Some(parent_id) => optional(self.db.get_category(parent_id).await)?
                .as_ref()
                .map(CategorySummary::from),
            None => None,
        };

        let mut ids = Vec::with_capacity(children.len() + 1);
        ids.push(category.id);
        ids.extend(children.iter().map(|c| c.id));
        let products = self.db.products_in_categories(&ids).await?;

        Ok(CategoryDetail {
            category,
            parent,
            subcategories: children.iter().map(CategorySummary::from).collect(),
            products,
        })
    }

    /// Whether `candidate` sits anywhere below `category_id`.
    async fn is_descendant(&self, category_id: Uuid, candidate: Uuid) -> PortResult<bool> {
        let mut stack = vec![category_id];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for child in self.db.subcategories_of(current).await? {
                if child.id == candidate {
                    return Ok(true);
                }
                stack.push(child.id);
            }
        }
        Ok(false)
    }

    /// Rejects a parent that would make the category its own ancestor.
    async fn ensure_valid_parent(&self, category_id: Uuid, new_parent: Uuid) -> PortResult<()> {
        if new_parent == category_id {
            return Err(PortError::Validation(
                "A category cannot be its own parent".to_string(),
            ));
        }
        if self.is_descendant(category_id, new_parent).await? {
            warn!(category_id = %category_id, parent_id = %new_parent, "Rejected cyclic category parent.");
            return Err(PortError::Validation(
                "A subcategory cannot be assigned as parent (cyclic reference)".to_string(),
            ));
        }
        self.db.get_category(new_parent).await.map_err(|e| match e {
            PortError::NotFound(_) => {
                PortError::NotFound(format!("Parent category {} not found", new_parent))
            }
            other => other,
        })?;
        Ok(())
    }

    /// Moves a category under `new_parent`, or to the root when `None`.
    pub async fn set_parent(
        &self,
        category_id: Uuid,
        new_parent: Option<Uuid>,
    ) -> PortResult<Category> {
        self.update_category(
            category_id,
            CategoryPatch {
                parent_category: Some(new_parent),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_category(
        &self,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> PortResult<Category> {
        let mut category = self.db.get_category(category_id).await?;

        if let Some(parent) = patch.parent_category {
            if let Some(parent_id) = parent {
                self.ensure_valid_parent(category_id, parent_id).await?;
            }
            category.parent_category = parent;
        }
        if let Some(name) = patch.name {
            category.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        if let Some(icon) = patch.icon {
            category.icon = icon;
        }
        if let Some(features) = patch.features {
            category.features = features;
        }
        if let Some(featured) = patch.featured {
            category.featured = featured;
        }
        if let Some(order) = patch.order {
            category.order = order;
        }

        validate_category(&category)?;
        category.slug = slugify(&category.name);
        self.db.update_category(&category).await
    }

    /// Deletes a category that has neither products nor subcategories.
    pub async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let category = self.db.get_category(category_id).await?;

        let products = self.db.count_products_by_category(category_id).await?;
        if products > 0 {
            return Err(PortError::Conflict(format!(
                "Dependent records exist: {} product(s) belong to this category. Delete them first.",
                products
            )));
        }

        let subcategories = self.db.subcategories_of(category_id).await?.len();
        if subcategories > 0 {
            return Err(PortError::Conflict(format!(
                "Dependent records exist: this category has {} subcategories. Delete them first.",
                subcategories
            )));
        }

        release_url(self.assets.as_ref(), &category.image, DEFAULT_CATEGORY_IMAGE).await?;
        self.db.delete_category(category_id).await?;
        info!(category_id = %category_id, "Category deleted.");
        Ok(())
    }

    /// Replaces the category image, releasing the previous one. Returns the new URL.
    pub async fn set_category_image(
        &self,
        category_id: Uuid,
        upload: ImageUpload,
    ) -> PortResult<String> {
        let mut category = self.db.get_category(category_id).await?;
        validate_image_upload(&upload.content_type, upload.data.len(), self.max_upload_bytes)?;

        release_url(self.assets.as_ref(), &category.image, DEFAULT_CATEGORY_IMAGE).await?;
        let stored = store_image(
            self.assets.as_ref(),
            upload,
            "categories",
            CATEGORY_IMAGE_WIDTH,
        )
        .await?;

        category.image = stored.url.clone();
        category.slug = slugify(&category.name);
        self.db.update_category(&category).await?;
        Ok(stored.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogService, NewBrand, NewProduct, DEFAULT_MAX_UPLOAD_BYTES};
    use crate::memory::{InMemoryAssetStore, InMemoryDatabase};
    use bytes::Bytes;

    fn hierarchy() -> (Arc<InMemoryDatabase>, Arc<InMemoryAssetStore>, CategoryHierarchy) {
        let db = Arc::new(InMemoryDatabase::new());
        let assets = Arc::new(InMemoryAssetStore::new());
        let hierarchy = CategoryHierarchy::new(db.clone(), assets.clone(), DEFAULT_MAX_UPLOAD_BYTES);
        (db, assets, hierarchy)
    }

    fn named(name: &str, parent: Option<Uuid>, order: i32) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: format!("{} description", name),
            parent_category: parent,
            order: Some(order),
            ..Default::default()
        }
    }

    async fn product_in(
        db: Arc<InMemoryDatabase>,
        assets: Arc<InMemoryAssetStore>,
        category: Uuid,
        sku: &str,
    ) -> Product {
        let catalog = CatalogService::new(db.clone(), assets, DEFAULT_MAX_UPLOAD_BYTES);
        let brand = match db.find_brand_by_name("Acme").await.unwrap() {
            Some(b) => b,
            None => catalog
                .create_brand(NewBrand {
                    name: "Acme".into(),
                    description: "Everything".into(),
                    ..Default::default()
                })
                .await
                .unwrap(),
        };
        catalog
            .create_product(NewProduct {
                title: format!("Product {}", sku),
                description: "A product".into(),
                price: 5.0,
                stock: Some(1),
                brand: brand.id,
                category,
                sku: sku.into(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_defaults_and_missing_parent() {
        let (_, _, h) = hierarchy();
        let c = h.create_category(named("Home Audio", None, 0)).await.unwrap();
        assert_eq!(c.slug, "home-audio");
        assert_eq!(c.icon, DEFAULT_CATEGORY_ICON);
        assert_eq!(c.image, DEFAULT_CATEGORY_IMAGE);
        assert!(c.parent_category.is_none());

        let err = h
            .create_category(named("Orphan", Some(Uuid::new_v4()), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let err = h.create_category(named("Home Audio", None, 0)).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn roots_are_ordered_and_carry_children() {
        let (_, _, h) = hierarchy();
        let phones = h.create_category(named("Phones", None, 1)).await.unwrap();
        h.create_category(named("Computers", None, 1)).await.unwrap();
        h.create_category(named("Zebra", None, 0)).await.unwrap();
        h.create_category(named("Cases", Some(phones.id), 0)).await.unwrap();

        let roots = h.root_categories().await.unwrap();
        let names: Vec<_> = roots.iter().map(|n| n.category.name.as_str()).collect();
        assert_eq!(names, vec!["Zebra", "Computers", "Phones"]);
        assert_eq!(roots[2].subcategories.len(), 1);
        assert_eq!(roots[2].subcategories[0].name, "Cases");
    }

    #[tokio::test]
    async fn cannot_parent_to_self_or_descendant() {
        let (_, _, h) = hierarchy();
        let a = h.create_category(named("A", None, 0)).await.unwrap();
        let b = h.create_category(named("B", Some(a.id), 0)).await.unwrap();
        let c = h.create_category(named("C", Some(b.id), 0)).await.unwrap();

        let err = h.set_parent(a.id, Some(a.id)).await.unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));

        let err = h.set_parent(a.id, Some(b.id)).await.unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));

        let err = h.set_parent(a.id, Some(c.id)).await.unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));

        // Moving a grandchild up is not a cycle.
        let moved = h.set_parent(c.id, Some(a.id)).await.unwrap();
        assert_eq!(moved.parent_category, Some(a.id));

        let root = h.set_parent(b.id, None).await.unwrap();
        assert!(root.parent_category.is_none());
    }

    #[tokio::test]
    async fn descendants_include_one_level_of_products() {
        let (db, assets, h) = hierarchy();
        let a = h.create_category(named("A", None, 0)).await.unwrap();
        let b = h.create_category(named("B", Some(a.id), 0)).await.unwrap();
        let c = h.create_category(named("C", Some(b.id), 0)).await.unwrap();
        let in_a = product_in(db.clone(), assets.clone(), a.id, "P-A").await;
        let in_b = product_in(db.clone(), assets.clone(), b.id, "P-B").await;
        product_in(db.clone(), assets.clone(), c.id, "P-C").await;

        let detail = h.category_with_descendants(a.id).await.unwrap();
        assert_eq!(detail.subcategories.len(), 1);
        assert!(detail.parent.is_none());
        let mut ids: Vec<_> = detail.products.iter().map(|p| p.id).collect();
        ids.sort();
        let mut expected = vec![in_a.id, in_b.id];
        expected.sort();
        assert_eq!(ids, expected);

        let detail = h.category_with_descendants(b.id).await.unwrap();
        assert_eq!(detail.parent.unwrap().id, a.id);

        let err = h.category_with_descendants(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_refused_while_dependents_exist() {
        let (db, assets, h) = hierarchy();
        let parent = h.create_category(named("Parent", None, 0)).await.unwrap();
        let child = h.create_category(named("Child", Some(parent.id), 0)).await.unwrap();
        let product = product_in(db.clone(), assets.clone(), child.id, "P-1").await;

        let err = h.delete_category(parent.id).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let err = h.delete_category(child.id).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
        assert!(db.get_category(child.id).await.is_ok());
        assert_eq!(db.get_product(product.id).await.unwrap().category, child.id);

        db.delete_product(product.id).await.unwrap();
        h.delete_category(child.id).await.unwrap();
        h.delete_category(parent.id).await.unwrap();
        assert!(db.root_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_image_is_released_on_delete() {
        let (_, assets, h) = hierarchy();
        let c = h.create_category(named("Cameras", None, 0)).await.unwrap();
        let url = h
            .set_category_image(
                c.id,
                ImageUpload {
                    data: Bytes::from_static(b"jpg"),
                    content_type: "image/jpeg".into(),
                },
            )
            .await
            .unwrap();

        h.delete_category(c.id).await.unwrap();
        assert_eq!(
            assets.destroyed().await,
            vec![assets.external_id_for_url(&url).unwrap()]
        );
    }
}
