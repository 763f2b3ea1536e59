pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::MedusaClient;
pub use error::MedusaError;
pub use types::{CommerceProduct, DeleteResponse, ProductEnvelope, ProductsPage};
