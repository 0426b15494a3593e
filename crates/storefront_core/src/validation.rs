//! Field rules for catalog entities and uploads.
//!
//! Every check runs against the complete, merged record so updates are held to
//! the same constraints as creates.

use std::sync::OnceLock;

use chrono::{Datelike, Utc};
use regex::Regex;

use crate::domain::{Brand, Category, Product};
use crate::ports::{PortError, PortResult};

pub const BRAND_NAME_MAX: usize = 50;
pub const CATEGORY_NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 500;
pub const PRODUCT_TITLE_MAX: usize = 100;
pub const PRODUCT_DESCRIPTION_MAX: usize = 2000;
pub const SHORT_DESCRIPTION_MAX: usize = 500;
pub const FOUNDED_YEAR_MIN: i32 = 1800;

fn website_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)$",
        )
        .expect("website pattern is valid")
    })
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern is valid")
    })
}

fn required(field: &str, value: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        return Err(PortError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> PortResult<()> {
    if value.chars().count() > max {
        return Err(PortError::Validation(format!(
            "{} cannot be longer than {} characters",
            field, max
        )));
    }
    Ok(())
}

fn in_range(field: &str, value: f64, min: f64, max: f64) -> PortResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(PortError::Validation(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(())
}

pub fn validate_brand(brand: &Brand) -> PortResult<()> {
    required("Brand name", &brand.name)?;
    max_len("Brand name", &brand.name, BRAND_NAME_MAX)?;
    required("Brand description", &brand.description)?;
    max_len("Brand description", &brand.description, DESCRIPTION_MAX)?;

    if let Some(website) = &brand.website {
        if !website_pattern().is_match(website) {
            return Err(PortError::Validation("Please enter a valid URL".to_string()));
        }
    }

    if let Some(year) = brand.founded_year {
        let current = Utc::now().year();
        if year < FOUNDED_YEAR_MIN || year > current {
            return Err(PortError::Validation(format!(
                "Founded year must be between {} and {}",
                FOUNDED_YEAR_MIN, current
            )));
        }
    }
    Ok(())
}

pub fn validate_category(category: &Category) -> PortResult<()> {
    required("Category name", &category.name)?;
    max_len("Category name", &category.name, CATEGORY_NAME_MAX)?;
    required("Category description", &category.description)?;
    max_len("Category description", &category.description, DESCRIPTION_MAX)
}

pub fn validate_product(product: &Product) -> PortResult<()> {
    required("Product title", &product.title)?;
    max_len("Product title", &product.title, PRODUCT_TITLE_MAX)?;
    required("Product description", &product.description)?;
    max_len("Product description", &product.description, PRODUCT_DESCRIPTION_MAX)?;
    if let Some(short) = &product.short_description {
        max_len("Short description", short, SHORT_DESCRIPTION_MAX)?;
    }
    required("SKU", &product.sku)?;
    in_range("Price", product.price, 0.0, f64::MAX)?;
    in_range("Discount percentage", product.discount_percentage, 0.0, 100.0)?;
    in_range("Rating", product.rating, 0.0, 5.0)?;

    for spec in &product.specifications {
        required("Specification name", &spec.name)?;
        required("Specification value", &spec.value)?;
    }

    if product.images.iter().filter(|image| image.is_main).count() > 1 {
        return Err(PortError::Validation(
            "A product can only have one main image".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> PortResult<()> {
    if !email_pattern().is_match(email) {
        return Err(PortError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// Rejects uploads that are not images or exceed `max_bytes`.
pub fn validate_image_upload(content_type: &str, size: usize, max_bytes: usize) -> PortResult<()> {
    if !content_type.starts_with("image") {
        return Err(PortError::Validation("Please upload an image file".to_string()));
    }
    if size > max_bytes {
        return Err(PortError::Validation(format!(
            "Please upload an image smaller than {} bytes",
            max_bytes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn brand() -> Brand {
        Brand {
            id: Uuid::new_v4(),
            name: "Arçelik".into(),
            slug: String::new(),
            description: "Home appliances".into(),
            logo: crate::domain::DEFAULT_BRAND_LOGO.into(),
            website: Some("https://www.arcelik.com.tr".into()),
            founded_year: Some(1955),
            featured: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn brand_constraints() {
        assert!(validate_brand(&brand()).is_ok());

        let mut b = brand();
        b.name = "x".repeat(51);
        assert!(matches!(validate_brand(&b), Err(PortError::Validation(_))));

        let mut b = brand();
        b.website = Some("not a url".into());
        assert!(matches!(validate_brand(&b), Err(PortError::Validation(_))));

        let mut b = brand();
        b.founded_year = Some(1799);
        assert!(validate_brand(&b).is_err());
        b.founded_year = Some(Utc::now().year() + 1);
        assert!(validate_brand(&b).is_err());
    }

    #[test]
    fn email_and_upload_rules() {
        assert!(validate_email("ayse.kaya@example.com").is_ok());
        assert!(validate_email("nope").is_err());

        assert!(validate_image_upload("image/png", 10, 100).is_ok());
        assert!(validate_image_upload("application/pdf", 10, 100).is_err());
        assert!(validate_image_upload("image/jpeg", 101, 100).is_err());
    }
}
