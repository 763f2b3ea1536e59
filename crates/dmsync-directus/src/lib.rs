//! Read client for the Directus REST items API.

pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::DirectusClient;
pub use error::DirectusError;
pub use types::{ItemsMeta, ItemsResponse};
