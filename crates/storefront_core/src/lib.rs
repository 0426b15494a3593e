pub mod cart;
pub mod catalog;
pub mod categories;
pub mod domain;
pub mod memory;
pub mod ports;
pub mod slug;
pub mod validation;

pub use cart::{AddCartItem, CartLine, CartManager, CartView};
pub use catalog::{
    BrandDetail, BrandPatch, CatalogService, ImageUpload, NewBrand, NewProduct, ProductDetail,
    ProductPatch,
};
pub use categories::{CategoryDetail, CategoryHierarchy, CategoryNode, CategoryPatch, NewCategory};
pub use domain::{
    AuthSession, Brand, Cart, CartItem, Category, CategorySummary, Identity, ListQuery, Page,
    Product, ProductFilter, ProductImage, ProductSummary, Role, Specification, User,
    UserCredentials,
};
pub use ports::{
    AssetStore, DatabaseService, ImageTransform, PortError, PortResult, StoredAsset,
};
