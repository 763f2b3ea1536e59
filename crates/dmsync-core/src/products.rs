//! CMS product rows and the commerce payloads derived from them.
//!
//! Directus rows arrive as loosely typed JSON: keys may be integers or UUID
//! strings, and decimal fields are often serialised as strings. Everything is
//! normalised here before it reaches the Medusa client.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Description sent when the CMS row has none.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

const EVENT_VARIANT_TITLE: &str = "Default Variant";
const BULK_OPTION_TITLE: &str = "Default Option";
const BULK_OPTION_VALUE: &str = "Default Value";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid price {raw}: {reason}")]
    InvalidPrice { raw: String, reason: String },
}

/// A row of the Directus product collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CmsProduct {
    #[serde(default, deserialize_with = "deserialize_key")]
    pub id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw JSON value; Directus returns decimals as strings and floats as numbers.
    #[serde(default)]
    pub price: Option<Value>,
}

impl CmsProduct {
    /// Parses a row out of an arbitrary JSON value (webhook payload or list item).
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the value is not an object or a field
    /// has an unexpected type.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The trimmed product name, required for every commerce payload.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingField`] when the name is absent or blank.
    pub fn title(&self) -> Result<&str, MappingError> {
        self.product_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(MappingError::MissingField("product_name"))
    }

    #[must_use]
    pub fn description_or_default(&self) -> String {
        description_or_default(self.description.as_deref())
    }

    /// Price in integer minor units (cents for USD).
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the price is absent, unparsable, negative,
    /// or too large for an `i64` amount.
    pub fn price_minor_units(&self) -> Result<i64, MappingError> {
        let raw = self
            .price
            .as_ref()
            .filter(|v| !v.is_null())
            .ok_or(MappingError::MissingField("price"))?;
        price_to_minor_units(parse_price(raw)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoneyAmount {
    pub currency_code: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductOptionInput {
    pub title: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductVariantInput {
    pub title: String,
    pub manage_inventory: bool,
    pub allow_backorder: bool,
    pub prices: Vec<MoneyAmount>,
}

/// Body of `POST /admin/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateProductPayload {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub status: ProductStatus,
    pub is_giftcard: bool,
    pub options: Vec<ProductOptionInput>,
    pub variants: Vec<ProductVariantInput>,
}

impl CreateProductPayload {
    /// Amount of the first price of the first variant, if any.
    #[must_use]
    pub fn primary_amount(&self) -> Option<i64> {
        self.variants
            .first()
            .and_then(|v| v.prices.first())
            .map(|p| p.amount)
    }
}

/// Body of `PUT /admin/products/{id}`. Only fields present in the CMS change
/// set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateProductPayload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Payload for a product created from a CMS create event: no options and a
/// single `"Default Variant"`.
///
/// # Errors
///
/// Returns [`MappingError`] if the row has no name or no usable price.
pub fn event_create_payload(
    row: &CmsProduct,
    currency_code: &str,
) -> Result<CreateProductPayload, MappingError> {
    let title = row.title()?.to_owned();
    let amount = row.price_minor_units()?;

    Ok(CreateProductPayload {
        title,
        description: row.description_or_default(),
        handle: None,
        status: ProductStatus::Published,
        is_giftcard: false,
        options: Vec::new(),
        variants: vec![single_price_variant(
            EVENT_VARIANT_TITLE.to_owned(),
            currency_code,
            amount,
        )],
    })
}

/// Payload for a product created by the bulk sync: slug handle, one default
/// option, and a variant named after the product.
///
/// # Errors
///
/// Returns [`MappingError`] if the row has no name or no usable price.
pub fn bulk_create_payload(
    row: &CmsProduct,
    currency_code: &str,
) -> Result<CreateProductPayload, MappingError> {
    let title = row.title()?.to_owned();
    let amount = row.price_minor_units()?;

    Ok(CreateProductPayload {
        handle: Some(slugify(&title)),
        description: row.description_or_default(),
        status: ProductStatus::Published,
        is_giftcard: false,
        options: vec![ProductOptionInput {
            title: BULK_OPTION_TITLE.to_owned(),
            values: vec![BULK_OPTION_VALUE.to_owned()],
        }],
        variants: vec![single_price_variant(
            format!("{title} Variant"),
            currency_code,
            amount,
        )],
        title,
    })
}

/// Builds the partial update for a CMS update event.
///
/// Directus update payloads only carry the fields that changed. `title` is
/// sent when `product_name` changed; `description` when it changed, falling
/// back to [`DEFAULT_DESCRIPTION`] when cleared. Returns `Ok(None)` when
/// neither field is part of the change set.
///
/// # Errors
///
/// Returns [`MappingError::MissingField`] when `product_name` was cleared.
pub fn update_payload(
    changes: &Map<String, Value>,
) -> Result<Option<UpdateProductPayload>, MappingError> {
    let title = match changes.get("product_name") {
        None => None,
        Some(value) => Some(
            value
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(MappingError::MissingField("product_name"))?
                .to_owned(),
        ),
    };

    let description = changes
        .get("description")
        .map(|value| description_or_default(value.as_str()));

    let payload = UpdateProductPayload { title, description };
    Ok((!payload.is_empty()).then_some(payload))
}

/// Derive a URL-safe handle from a product name.
///
/// Lower-cases the name, collapses every run of characters outside
/// `[a-z0-9]` into a single `-`, and trims hyphens from both ends. Non-ASCII
/// letters count as separators, so `"Café Table #1"` becomes `"caf-table-1"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Convert a decimal currency amount to integer minor units, rounding half
/// away from zero (`19.999` → `2000`, `0.005` → `1`).
///
/// # Errors
///
/// Returns [`MappingError::InvalidPrice`] for negative prices or amounts that
/// overflow `i64`.
pub fn price_to_minor_units(price: Decimal) -> Result<i64, MappingError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(MappingError::InvalidPrice {
            raw: price.to_string(),
            reason: "price must not be negative".to_string(),
        });
    }

    price
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| MappingError::InvalidPrice {
            raw: price.to_string(),
            reason: "amount out of range".to_string(),
        })
}

/// Normalise a CMS key (`42` or `"a1b2..."`) to a string.
#[must_use]
pub fn cms_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_price(raw: &Value) -> Result<Decimal, MappingError> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        other => {
            return Err(MappingError::InvalidPrice {
                raw: other.to_string(),
                reason: "expected a number or numeric string".to_string(),
            })
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| MappingError::InvalidPrice {
            raw: text.clone(),
            reason: e.to_string(),
        })
}

fn description_or_default(description: Option<&str>) -> String {
    description
        .filter(|d| !d.trim().is_empty())
        .map_or_else(|| DEFAULT_DESCRIPTION.to_owned(), str::to_owned)
}

fn single_price_variant(title: String, currency_code: &str, amount: i64) -> ProductVariantInput {
    ProductVariantInput {
        title,
        manage_inventory: false,
        allow_backorder: false,
        prices: vec![MoneyAmount {
            currency_code: currency_code.to_owned(),
            amount,
        }],
    }
}

fn deserialize_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(cms_key))
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
