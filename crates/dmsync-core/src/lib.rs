pub mod app_config;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{
    bulk_create_payload, cms_key, event_create_payload, price_to_minor_units, slugify,
    update_payload, CmsProduct, CreateProductPayload, MappingError, MoneyAmount,
    ProductOptionInput, ProductStatus, ProductVariantInput, UpdateProductPayload,
    DEFAULT_DESCRIPTION,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
