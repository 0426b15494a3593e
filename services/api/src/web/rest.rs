//! services/api/src/web/rest.rs
//!
//! The master definition of the OpenAPI specification for the REST API.

use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::web::{auth, brands, cart, categories, products};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::update_details_handler,
        auth::update_password_handler,
        auth::delete_account_handler,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        categories::list_categories,
        categories::root_categories,
        categories::get_category,
        categories::category_products,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        categories::upload_category_image,
        brands::list_brands,
        brands::get_brand,
        brands::brand_products,
        brands::create_brand,
        brands::update_brand,
        brands::delete_brand,
        brands::upload_brand_logo,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_product_images,
        products::delete_product_image,
        products::set_main_image,
    ),
    components(schemas(ErrorBody)),
    tags(
        (name = "Auth", description = "Registration, cookie sessions and account management."),
        (name = "Cart", description = "The logged-in user's shopping cart."),
        (name = "Categories", description = "The category tree. Mutations are admin only."),
        (name = "Brands", description = "Brands. Mutations are admin only."),
        (name = "Products", description = "Products and their images. Mutations are admin only.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/register",
            "/api/v1/auth/updatepassword",
            "/api/v1/cart/{item_id}",
            "/api/v1/categories/root",
            "/api/v1/brands/{id}/logo",
            "/api/v1/products/{id}/images/{image_id}/main",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
